//! Well-known state store keys and key validation.

use thiserror::Error;

/// Directory (relative to the working directory) holding persisted records.
pub const TEST_DATA_DIR: &str = ".test-data";

/// Key for the persisted [`crate::ProvisioningOptions`].
pub const TERRAFORM_OPTIONS: &str = "TerraformOptions";

/// Key for the persisted [`crate::KeyPair`].
pub const EC2_KEY_PAIR: &str = "Ec2KeyPair";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid state key '{0}': must be 1-64 characters of [A-Za-z0-9_-]")]
pub struct InvalidStateKey(pub String);

/// Keys become file names, so they are restricted to a safe alphabet.
pub fn validate_state_key(key: &str) -> Result<(), InvalidStateKey> {
    let ok = !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(InvalidStateKey(key.to_string()))
    }
}

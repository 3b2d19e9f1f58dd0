pub mod keypair;
pub mod options;
pub mod state_keys;
pub mod types;

pub use keypair::KeyPair;
pub use options::{ProvisioningOptions, default_retryable_errors};
pub use state_keys::{EC2_KEY_PAIR, TERRAFORM_OPTIONS, TEST_DATA_DIR, validate_state_key};
pub use types::*;

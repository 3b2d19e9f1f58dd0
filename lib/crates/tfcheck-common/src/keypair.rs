use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An SSH key pair registered with a cloud provider.
///
/// Persisted under `Ec2KeyPair` so teardown can deregister it from a
/// different process than the one that created it.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    /// Name the key pair is registered under.
    pub name: String,
    /// Region it was imported into.
    pub region: String,
    /// OpenSSH public key line.
    pub public_key: String,
    /// OpenSSH private key (PEM-like block).
    pub private_key: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("name", &self.name)
            .field("region", &self.region)
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

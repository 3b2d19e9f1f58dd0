//! Stage skip signals and run identifiers.

use std::collections::BTreeSet;

use tfcheck_common::Stage;

/// Stages that must not execute in this process.
///
/// Captured once before any stage starts; later environment changes are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSkips {
    skipped: BTreeSet<Stage>,
}

impl StageSkips {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs such as `std::env::vars()`.
    ///
    /// `SKIP_<stage>` with a non-empty value skips that stage.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut skips = Self::none();
        for (name, value) in vars {
            if value.as_ref().is_empty() {
                continue;
            }
            if let Some(stage) = Stage::ALL
                .into_iter()
                .find(|s| s.skip_env_var() == name.as_ref())
            {
                skips.skipped.insert(stage);
            }
        }
        skips
    }

    #[must_use]
    pub fn with(mut self, stage: Stage) -> Self {
        self.skipped.insert(stage);
        self
    }

    #[must_use]
    pub fn is_skipped(&self, stage: Stage) -> bool {
        self.skipped.contains(&stage)
    }

    /// Whether any stage is skipped. Used to keep state in the original
    /// Terraform folder across separate invocations.
    #[must_use]
    pub fn any(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Generate a unique run identifier: `tfcheck-` followed by 16 lowercase hex characters.
#[must_use]
pub fn generate_run_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u128(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    );
    hasher.write_u64(RandomState::new().build_hasher().finish());
    format!("tfcheck-{:016x}", hasher.finish())
}

/// Remote key pair name for a run: `<prefix>-<16 hex>`.
#[must_use]
pub fn key_pair_name(prefix: &str, run_id: &str) -> String {
    let suffix = run_id.strip_prefix("tfcheck-").unwrap_or(run_id);
    format!("{prefix}-{suffix}")
}

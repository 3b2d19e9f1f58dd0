use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named, independently skippable phase of a test run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Stage {
    Setup,
    Validate,
    Teardown,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 3] = [Stage::Setup, Stage::Validate, Stage::Teardown];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Validate => "validate",
            Stage::Teardown => "teardown",
        }
    }

    /// Environment variable that skips this stage when set, e.g. `SKIP_setup`.
    #[must_use]
    pub fn skip_env_var(self) -> String {
        format!("SKIP_{}", self.as_str())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stage '{0}' (expected setup, validate or teardown)")]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Stage::Setup),
            "validate" => Ok(Stage::Validate),
            "teardown" => Ok(Stage::Teardown),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

/// Lifecycle of a single stage: Pending → Running → {Completed, Failed}.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    /// Whether the stage has reached a terminal state.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, StageStatus::Completed | StageStatus::Failed)
    }
}

/// What happened to one stage of a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    /// Set when a skip signal short-circuited the stage.
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    #[must_use]
    pub fn pending(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            skipped: false,
            duration_ms: 0,
            error: None,
        }
    }
}

/// Which end-to-end scenario a report describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Http,
    Ssh,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScenarioKind::Http => "http",
            ScenarioKind::Ssh => "ssh",
        })
    }
}

/// Summary of one scenario run, rendered by `--json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioReport {
    pub scenario: ScenarioKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub stages: Vec<StageRecord>,
    pub succeeded: bool,
}

//! JSON output helpers.
//!
//! `--json` prints exactly one JSON document on stdout: a report, a version
//! object, or the error object produced by [`format_error`].

use anyhow::{Context, Result};
use tfcheck_common::ScenarioReport;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Renders domain types as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// `{"scenarios": [...], "succeeded": bool}`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_reports(&self, reports: &[ScenarioReport]) -> Result<()> {
        println!("{}", reports_json(reports)?);
        Ok(())
    }
}

/// The document printed by [`JsonRenderer::render_reports`].
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn reports_json(reports: &[ScenarioReport]) -> Result<String> {
    let obj = serde_json::json!({
        "succeeded": reports.iter().all(|r| r.succeeded),
        "scenarios": reports,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

//! Human-readable terminal renderer.

use owo_colors::OwoColorize as _;
use tfcheck_common::{ScenarioReport, StageRecord, StageStatus};

use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render a per-stage summary of one scenario.
    pub fn render_report(&self, report: &ScenarioReport) {
        if self.ctx.quiet {
            return;
        }
        println!();
        self.ctx.header(&format!("{} scenario", report.scenario));
        if let Some(run_id) = &report.run_id {
            self.ctx.kv("Run:", run_id);
        }
        for record in &report.stages {
            println!("  {}", self.stage_line(record));
            if let Some(error) = &record.error {
                for line in error.lines() {
                    println!("      {}", line.style(self.ctx.styles.dim));
                }
            }
        }
        if report.succeeded {
            self.ctx.success("Scenario passed");
        } else {
            self.ctx.error("Scenario failed");
        }
    }

    fn stage_line(&self, record: &StageRecord) -> String {
        let styles = &self.ctx.styles;
        let name = format!("{:<9}", record.stage.as_str());
        if record.skipped {
            return format!("{} {name} {}", "-".style(styles.skipped), "skipped".style(styles.skipped));
        }
        match record.status {
            StageStatus::Completed => format!(
                "{} {name} {}",
                "✓".style(styles.success),
                format_duration(record.duration_ms).style(styles.dim)
            ),
            StageStatus::Failed => format!(
                "{} {name} {}",
                "✗".style(styles.error),
                format_duration(record.duration_ms).style(styles.dim)
            ),
            StageStatus::Running => format!("{} {name} running", "…".style(styles.info)),
            StageStatus::Pending => {
                format!("{} {name} {}", "·".style(styles.dim), "not run".style(styles.dim))
            }
        }
    }
}

/// `850ms`, `12.4s`, `3m05s`.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{}.{}s", ms / 1_000, (ms % 1_000) / 100)
    } else {
        let secs = ms / 1_000;
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// With a TTY and a single scenario, each step gets a spinner that the next
/// `success()` or `warn()` finishes. Otherwise lines are printed, prefixed
/// with the scenario label when one is set.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    label: Option<&'static str>,
    spinner: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            label: None,
            spinner: RefCell::new(None),
        }
    }

    /// Plain-line reporter for scenarios that run side by side.
    #[must_use]
    pub fn labelled(ctx: &'a OutputContext, label: &'static str) -> Self {
        Self {
            ctx,
            label: Some(label),
            spinner: RefCell::new(None),
        }
    }

    fn use_spinner(&self) -> bool {
        self.label.is_none() && self.ctx.show_progress()
    }

    fn text(&self, message: &str) -> String {
        match self.label {
            Some(label) => format!("[{label}] {message}"),
            None => message.to_string(),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if self.use_spinner() {
            if let Some(previous) = self.spinner.borrow_mut().replace(progress::spinner(message)) {
                previous.finish_and_clear();
            }
        } else {
            println!("  {} {}", "→".style(self.ctx.styles.info), self.text(message));
        }
    }

    fn success(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if let Some(pb) = self.spinner.borrow_mut().take() {
            progress::finish_ok(&pb, message);
        } else {
            println!("  {} {}", "✓".style(self.ctx.styles.success), self.text(message));
        }
    }

    fn warn(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        if let Some(pb) = self.spinner.borrow_mut().take() {
            progress::finish_error(&pb, message);
        } else {
            println!("  {} {}", "⚠".style(self.ctx.styles.warning), self.text(message));
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.spinner.get_mut().take() {
            pb.finish_and_clear();
        }
    }
}

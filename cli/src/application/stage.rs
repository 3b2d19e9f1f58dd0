//! Stage runner: named, independently skippable phases with guaranteed teardown.
//!
//! Each stage moves Pending → Running → {Completed, Failed}. A skip signal
//! short-circuits Pending → Completed without running the block. Teardown is
//! held by the runner before setup starts and runs on every exit path,
//! including panics inside setup or validate.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use anyhow::Result;
use futures_util::FutureExt as _;
use tfcheck_common::{Stage, StageRecord, StageStatus};
use tracing::{error, info};

use crate::application::ports::ProgressReporter;
use crate::domain::error::FailedWithTeardown;
use crate::domain::stage::StageSkips;

type Panic = Box<dyn Any + Send + 'static>;

/// Outcome of one stage body: `Err` carries a caught panic.
type Caught<T> = std::result::Result<Result<Option<T>>, Panic>;

/// Read `SKIP_<stage>` signals from the process environment.
#[must_use]
pub fn skips_from_env() -> StageSkips {
    StageSkips::from_vars(std::env::vars())
}

/// Executes stages in order and records what happened to each.
pub struct StageRunner<'a> {
    skips: StageSkips,
    reporter: &'a dyn ProgressReporter,
    records: Vec<StageRecord>,
}

impl<'a> StageRunner<'a> {
    #[must_use]
    pub fn new(skips: StageSkips, reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            skips,
            reporter,
            records: Stage::ALL.into_iter().map(StageRecord::pending).collect(),
        }
    }

    /// Current status of `stage`.
    #[must_use]
    pub fn status(&self, stage: Stage) -> StageStatus {
        self.record(stage).map_or(StageStatus::Pending, |r| r.status)
    }

    /// Records for every stage, in execution order.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Run one stage. Returns `Ok(None)` when the stage was skipped.
    ///
    /// # Errors
    ///
    /// Returns the body's error after marking the stage failed.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from the body after marking the stage failed.
    pub async fn run_stage<T, F, Fut>(&mut self, stage: Stage, body: F) -> Result<Option<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.execute(stage, body).await {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Run setup, then validate if setup completed, then teardown regardless.
    ///
    /// Teardown failures after an earlier failure are logged and attached to
    /// the returned error behind the original cause.
    ///
    /// # Errors
    ///
    /// Returns the first setup/validate error, or the teardown error if only
    /// teardown failed.
    ///
    /// # Panics
    ///
    /// Re-raises a panic from any stage once teardown has run.
    pub async fn run_scenario<S, SF, V, VF, D, DF>(
        &mut self,
        setup: S,
        validate: V,
        teardown: D,
    ) -> Result<()>
    where
        S: FnOnce() -> SF,
        SF: Future<Output = Result<()>>,
        V: FnOnce() -> VF,
        VF: Future<Output = Result<()>>,
        D: FnOnce() -> DF,
        DF: Future<Output = Result<()>>,
    {
        let mut outcome = match self.execute(Stage::Setup, setup).await {
            Ok(Ok(_)) => self.execute(Stage::Validate, validate).await,
            other => other,
        };
        let teardown_result = match self.execute(Stage::Teardown, teardown).await {
            Ok(result) => result.map(|_| ()),
            Err(panic) => {
                if let Ok(Err(err)) = &outcome {
                    error!(
                        error = %format!("{err:#}"),
                        "teardown panicked after an earlier failure"
                    );
                }
                if outcome.is_ok() {
                    outcome = Err(panic);
                }
                Ok(())
            }
        };
        settle(outcome, teardown_result).map(|_| ())
    }

    async fn execute<T, F, Fut>(&mut self, stage: Stage, body: F) -> Caught<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.skips.is_skipped(stage) {
            info!(%stage, "stage skipped by {}", stage.skip_env_var());
            self.reporter.warn(&format!("Skipping stage '{stage}'"));
            self.update(stage, |r| {
                r.status = StageStatus::Completed;
                r.skipped = true;
            });
            return Ok(Ok(None));
        }

        info!(%stage, "stage starting");
        self.reporter.step(&format!("Running stage '{stage}'"));
        self.update(stage, |r| r.status = StageStatus::Running);
        let started = Instant::now();

        let caught = AssertUnwindSafe(async move { body().await })
            .catch_unwind()
            .await;

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match caught {
            Ok(Ok(value)) => {
                info!(%stage, elapsed_ms = elapsed, "stage completed");
                self.reporter.success(&format!("Stage '{stage}' completed"));
                self.update(stage, |r| {
                    r.status = StageStatus::Completed;
                    r.duration_ms = elapsed;
                });
                Ok(Ok(Some(value)))
            }
            Ok(Err(err)) => {
                error!(%stage, elapsed_ms = elapsed, error = %format!("{err:#}"), "stage failed");
                self.reporter.warn(&format!("Stage '{stage}' failed"));
                self.update(stage, |r| {
                    r.status = StageStatus::Failed;
                    r.duration_ms = elapsed;
                    r.error = Some(format!("{err:#}"));
                });
                Ok(Err(err))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%stage, elapsed_ms = elapsed, %message, "stage panicked");
                self.reporter.warn(&format!("Stage '{stage}' panicked"));
                self.update(stage, |r| {
                    r.status = StageStatus::Failed;
                    r.duration_ms = elapsed;
                    r.error = Some(format!("panicked: {message}"));
                });
                Err(panic)
            }
        }
    }

    fn record(&self, stage: Stage) -> Option<&StageRecord> {
        self.records.iter().find(|r| r.stage == stage)
    }

    fn update(&mut self, stage: Stage, f: impl FnOnce(&mut StageRecord)) {
        if let Some(record) = self.records.iter_mut().find(|r| r.stage == stage) {
            f(record);
        }
    }
}

fn settle<T>(outcome: std::result::Result<Result<T>, Panic>, teardown: Result<()>) -> Result<T> {
    let result = match outcome {
        Ok(result) => result,
        Err(panic) => {
            if let Err(err) = &teardown {
                error!(error = %format!("{err:#}"), "teardown failed while unwinding");
            }
            std::panic::resume_unwind(panic)
        }
    };
    match (result, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(teardown)) => Err(teardown),
        (Err(cause), Ok(())) => Err(cause),
        (Err(cause), Err(teardown)) => {
            error!(
                error = %format!("{teardown:#}"),
                "teardown failed after an earlier failure"
            );
            Err(FailedWithTeardown { cause, teardown }.into())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

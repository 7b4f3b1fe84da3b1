//! Interval scheduling, retries and run history
//!
//! The scheduler triggers the job on a fixed interval and never overlaps
//! runs: each run is awaited inside the loop, and ticks that fall due
//! while a run is in progress are skipped rather than queued. Retries are
//! applied uniformly around each step; the steps themselves never retry.

use crate::config::ScheduleConfig;
use crate::error::classify;
use crate::etl::Extractor;
use crate::index::DocumentIndex;
use crate::job::{Job, Step};
use crate::records::RecordSet;
use eyre::Result;
use std::collections::VecDeque;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

/// Number of run reports kept in memory
const HISTORY_LIMIT: usize = 50;

/// How often a failed step is retried, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts a step gets, the first one included
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl From<&ScheduleConfig> for RetryPolicy {
    fn from(config: &ScheduleConfig) -> Self {
        Self::new(config.retries, config.retry_delay())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded { records: usize },
    Failed { kind: Option<&'static str>, error: String },
    /// An upstream step failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub attempts: u32,
    pub outcome: StepOutcome,
}

/// The history entry for one run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: u64,
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.steps
            .iter()
            .all(|s| matches!(s.outcome, StepOutcome::Succeeded { .. }))
    }

    /// The step that failed the run, if any
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    /// The error message the run failed with, if any
    pub fn error(&self) -> Option<&str> {
        self.failed_step().and_then(|s| match &s.outcome {
            StepOutcome::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        })
    }

    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|s| s.step == step)
            .map(|s| &s.outcome)
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.succeeded() { "success" } else { "failed" };
        write!(f, "run {} {} in {:.1?}:", self.run, state, self.elapsed)?;
        for step in &self.steps {
            match &step.outcome {
                StepOutcome::Succeeded { records } => write!(
                    f,
                    " {}=ok({} records, {} attempt(s))",
                    step.step, records, step.attempts
                )?,
                StepOutcome::Failed { kind, .. } => write!(
                    f,
                    " {}=failed({}, {} attempt(s))",
                    step.step,
                    kind.unwrap_or("error"),
                    step.attempts
                )?,
                StepOutcome::Skipped => write!(f, " {}=skipped", step.step)?,
            }
        }
        Ok(())
    }
}

/// Drives a [`Job`] on an interval
pub struct Scheduler<S, I> {
    job: Job<S, I>,
    interval: Duration,
    retry: RetryPolicy,
    runs: u64,
    history: VecDeque<RunReport>,
}

impl<S, I> Scheduler<S, I>
where
    S: Extractor<Output = RecordSet> + Clone,
    I: DocumentIndex + Clone,
{
    pub fn new(job: Job<S, I>, interval: Duration, retry: RetryPolicy) -> Self {
        Self {
            job,
            interval,
            retry,
            runs: 0,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    pub fn from_config(job: Job<S, I>, config: &ScheduleConfig) -> Self {
        Self::new(job, config.interval(), RetryPolicy::from(config))
    }

    pub fn job(&self) -> &Job<S, I> {
        &self.job
    }

    /// Most recent runs, oldest first
    pub fn history(&self) -> impl Iterator<Item = &RunReport> {
        self.history.iter()
    }

    /// Run one step, retrying according to the policy
    async fn run_step_with_retries(&self, step: Step) -> StepReport {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.job.run_step(step).await {
                Ok(records) => {
                    return StepReport {
                        step,
                        attempts,
                        outcome: StepOutcome::Succeeded { records },
                    };
                }
                Err(e) if attempts <= self.retry.retries => {
                    log::warn!(
                        "Step {} failed (attempt {} of {}), retrying in {:?}: {}",
                        step,
                        attempts,
                        self.retry.max_attempts(),
                        self.retry.delay,
                        error_message(&e)
                    );
                    tokio::time::sleep(self.retry.delay).await;
                }
                Err(e) => {
                    log::error!("Step {} failed: {:?}", step, e);
                    return StepReport {
                        step,
                        attempts,
                        outcome: StepOutcome::Failed {
                            kind: classify(&e).map(|err| err.kind()),
                            error: error_message(&e),
                        },
                    };
                }
            }
        }
    }

    /// Trigger one run now
    ///
    /// Steps run in dependency order; once a step fails, the remaining
    /// steps are skipped. The report is appended to the history.
    pub async fn run_once(&mut self) -> RunReport {
        self.runs += 1;
        let run = self.runs;
        let started = Instant::now();
        log::info!("Starting run {}", run);

        let mut steps = Vec::with_capacity(Step::ALL.len());
        let mut failed = false;
        for step in Step::ALL {
            if failed {
                steps.push(StepReport {
                    step,
                    attempts: 0,
                    outcome: StepOutcome::Skipped,
                });
                continue;
            }
            let report = self.run_step_with_retries(step).await;
            failed = matches!(report.outcome, StepOutcome::Failed { .. });
            steps.push(report);
        }

        let report = RunReport {
            run,
            steps,
            elapsed: started.elapsed(),
        };
        if report.succeeded() {
            log::info!("{}", report);
        } else {
            log::error!("{}", report);
        }

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(report.clone());
        report
    }

    /// Run on the interval until Ctrl-C
    pub async fn serve(&mut self) -> Result<()> {
        self.serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run on the interval until `shutdown` completes
    ///
    /// The first run starts immediately. A run in progress is always
    /// finished before shutdown is observed.
    pub async fn serve_until(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        if self.interval.is_zero() {
            eyre::bail!("Schedule interval must be greater than zero");
        }

        log::info!(
            "Scheduling runs every {:?} ({} retr{} per step, {:?} apart)",
            self.interval,
            self.retry.retries,
            if self.retry.retries == 1 { "y" } else { "ies" },
            self.retry.delay
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutting down after {} run(s)", self.runs);
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }
}

/// Full error chain on one line
fn error_message(report: &eyre::Report) -> String {
    report
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

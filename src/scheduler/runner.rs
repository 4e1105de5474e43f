//! Polling loop
//!
//! Runs one cycle at a time, sleeps a jittered delay, and repeats until a
//! shutdown is signalled or, with `stop_on_found`, slots are found. Shutdown
//! interrupts the sleep immediately; a cycle already in flight is allowed to
//! finish.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use super::schedule::JitterSchedule;
use crate::models::{CycleReport, CycleStats};

/// Something that can run one poll cycle
#[async_trait]
pub trait CycleRunner: Send + Sync {
    /// Run a cycle to completion; failures are part of the report
    async fn run_cycle(&self) -> CycleReport;
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Slots found with `stop_on_found` set
    Found,
    /// Shutdown signal received
    Shutdown,
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub stats: CycleStats,
}

/// Drives a [`CycleRunner`] on a [`JitterSchedule`]
pub struct Scheduler {
    runner: Arc<dyn CycleRunner>,
    schedule: JitterSchedule,
    stop_on_found: bool,
}

impl Scheduler {
    pub fn new(runner: Arc<dyn CycleRunner>, schedule: JitterSchedule) -> Self {
        Self {
            runner,
            schedule,
            stop_on_found: true,
        }
    }

    /// Keep polling after slots are found when `false`
    pub fn with_stop_on_found(mut self, stop_on_found: bool) -> Self {
        self.stop_on_found = stop_on_found;
        self
    }

    pub fn schedule(&self) -> &JitterSchedule {
        &self.schedule
    }

    /// Run until shutdown or, if configured, until slots are found
    ///
    /// The first cycle starts immediately. Setting the watch value to `true`
    /// stops the loop; dropping the sender does not.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> RunSummary {
        let mut stats = CycleStats::default();

        tracing::info!(
            base_secs = self.schedule.base().as_secs(),
            jitter_secs = self.schedule.jitter().as_secs(),
            stop_on_found = self.stop_on_found,
            "Starting slot watcher"
        );

        let stop_reason = loop {
            if *shutdown.borrow_and_update() {
                break StopReason::Shutdown;
            }

            let report = self.runner.run_cycle().await;
            stats.record(&report);

            tracing::debug!(
                cycle = stats.cycles,
                outcome = report.outcome.as_str(),
                relogin = report.relogin_attempted,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Cycle finished"
            );

            if report.outcome.is_found() && self.stop_on_found {
                tracing::info!("Appointment found, stopping watcher");
                break StopReason::Found;
            }

            let delay = self.schedule.next_delay(&mut rand::thread_rng());
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Sleeping until next cycle");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_for_shutdown(&mut shutdown) => {
                    break StopReason::Shutdown;
                }
            }
        };

        if stop_reason == StopReason::Shutdown {
            tracing::info!("Watcher stopped by shutdown signal");
        }

        tracing::info!(
            cycles = stats.cycles,
            found = stats.found,
            not_found = stats.not_found,
            errors = stats.errors(),
            relogins = stats.relogins,
            degraded_bodies = stats.degraded_bodies,
            error_rate = stats.error_rate(),
            "Watcher statistics"
        );

        RunSummary { stop_reason, stats }
    }
}

/// Resolve once the watch value becomes `true`
///
/// A dropped sender can never signal, so this then stays pending forever.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

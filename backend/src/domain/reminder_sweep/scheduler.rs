//! Lifecycle for the recurring sweep.
//!
//! The scheduler owns a background task that ticks on a fixed cadence and
//! runs the sweep inside a fresh trace scope. Missed ticks are skipped, so a
//! slow run never causes a burst of catch-up runs. [`ReminderScheduler::stop`]
//! lets an in-flight run finish before returning.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::domain::{Error, TraceId};

use super::{ReminderSweep, SweepReport};

/// A unit of work the scheduler can run repeatedly.
#[async_trait]
pub trait ScheduledSweep: Send + Sync {
    async fn run(&self) -> Result<SweepReport, Error>;
}

#[async_trait]
impl ScheduledSweep for ReminderSweep {
    async fn run(&self) -> Result<SweepReport, Error> {
        self.run_once().await
    }
}

/// Handle to a running sweep schedule.
pub struct ReminderScheduler {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReminderScheduler {
    /// Spawn the schedule; the first run starts immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(sweep: Arc<dyn ScheduledSweep>, cadence: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticks = interval(cadence);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stopped.changed() => break,
                    _ = ticks.tick() => {
                        let trace_id = TraceId::generate();
                        let outcome = TraceId::scope(trace_id, sweep.run()).await;
                        if let Err(err) = outcome {
                            error!(%trace_id, error = %err, "reminder sweep run failed");
                        }
                    }
                }
            }
            info!("reminder scheduler stopped");
        });
        info!(cadence_secs = cadence.as_secs(), "reminder scheduler started");
        Self { stop, task }
    }

    /// Signal the schedule to stop and wait for the background task.
    pub async fn stop(self) {
        // A closed channel means the task already exited.
        let _ = self.stop.send(true);
        if let Err(err) = self.task.await {
            error!(error = %err, "reminder scheduler task ended abnormally");
        }
    }
}

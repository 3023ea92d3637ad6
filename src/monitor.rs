//! Continuous polling: one cycle, fixed sleep, repeat until stopped.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cycle::Pipeline;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("monitor is already running")]
    AlreadyRunning,
}

/// Supervises at most one polling loop at a time. A second `start` before the
/// first loop has stopped is rejected, so two pollers can never interleave
/// probes or snapshot writes.
pub struct Monitor {
    running: Arc<AtomicBool>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(
        &self,
        pipeline: Pipeline,
        interval: Duration,
    ) -> Result<MonitorHandle, MonitorError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MonitorError::AlreadyRunning);
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let running = Arc::clone(&self.running);
        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "monitor started");
            loop {
                match pipeline.run_once().await {
                    Ok(outcome) => info!(%outcome, "cycle finished"),
                    Err(err) => error!(error = %err, "cycle failed"),
                }
                // Stop requests are honored between cycles, never mid-cycle.
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.changed() => break,
                }
            }
            running.store(false, Ordering::SeqCst);
            info!("monitor stopped");
        });

        Ok(MonitorHandle { shutdown, task })
    }
}

pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the loop and wait for any in-flight cycle to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

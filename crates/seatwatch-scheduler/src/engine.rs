//! Run loop with explicit single-run-at-a-time discipline.
//!
//! The protected resources are the headless browser session and the
//! outbound sender identity: two concurrent runs would open two browser
//! sessions and risk duplicate notifications. `RunGate` makes the
//! exclusion a first-class, testable mechanism instead of a coincidence
//! of scheduling gaps.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use seatwatch_core::types::RunStatus;

use crate::cron::CronSchedule;

/// Mutual-exclusion gate over the pipeline. `try_acquire` never waits: a
/// tick that finds the gate held is skipped, not queued.
#[derive(Clone, Default)]
pub struct RunGate {
    inner: Arc<Mutex<()>>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate if no run is in progress.
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        self.inner.clone().try_lock_owned().ok()
    }
}

/// Drive the pipeline forever: one run immediately at startup, then one
/// per due cron tick. Each run's status is logged; a run still in
/// progress when a tick fires causes that tick to be skipped.
pub async fn run_monitor_loop<F, Fut>(schedule: CronSchedule, run_once: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = RunStatus>,
{
    let gate = RunGate::new();

    tracing::info!("starting monitor, initial run now");
    guarded_run(&gate, &run_once).await;

    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(now) else {
            tracing::error!("schedule produced no next tick, retrying in 60s");
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            continue;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!("next run at {next}");
        tokio::time::sleep(wait).await;

        guarded_run(&gate, &run_once).await;
    }
}

async fn guarded_run<F, Fut>(gate: &RunGate, run_once: &F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = RunStatus>,
{
    match gate.try_acquire() {
        Some(_guard) => {
            let started = Utc::now();
            let status = run_once().await;
            tracing::info!("[{}] run finished: {}", started.to_rfc3339(), status);
        }
        None => {
            tracing::warn!("previous run still in progress, skipping this tick");
        }
    }
}

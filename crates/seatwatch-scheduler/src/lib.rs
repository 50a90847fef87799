//! # Seatwatch Scheduler
//! A 5-field cron schedule and the serialized run loop that drives the
//! monitoring pipeline: one run at process start, then one per due tick,
//! with an explicit run-in-progress gate so runs never overlap.

pub mod cron;
pub mod engine;

pub use cron::CronSchedule;
pub use engine::{RunGate, run_monitor_loop};

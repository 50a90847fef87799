//! # Seatwatch Core
//! Shared foundation for the seatwatch monitor: the error type, the
//! configuration system, the chat/domain types, and the trait seams
//! (`Provider`, `Fetcher`, `Notifier`, `Tool`) that the other crates
//! implement or consume.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::SeatwatchConfig;
pub use error::{Result, SeatwatchError};

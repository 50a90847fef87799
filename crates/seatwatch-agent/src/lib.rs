//! # Seatwatch Agent
//! The availability classifier and the pipeline orchestrator.
//!
//! The classifier delegates the availability decision to an LLM chat call
//! that carries exactly one callable tool, `send_notification`. The tool
//! dispatch lives in our code, not in the model: a notification goes out
//! if and only if the model invokes the tool, and at most once per
//! classification. The terminal result is a typed verdict; the literal
//! `EMAIL_SENT:` / `NOT_AVAILABLE:` / `ERROR:` prefixes survive only at
//! the logging boundary.

pub mod classifier;
pub mod pipeline;

pub use classifier::AvailabilityClassifier;
pub use pipeline::Monitor;

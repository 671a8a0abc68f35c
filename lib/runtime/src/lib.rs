//! Background sweep driver for quiet-sentinel.
//!
//! The driver is the process-wide orchestration loop: on a fixed
//! interval it lists upcoming schedules and runs the escalation engine
//! and prep service against each. It starts at most once per process
//! and never overlaps its own cycles.

pub mod driver;
pub mod error;

pub use driver::{CycleStats, SweepConfig, SweepDriver};
pub use error::StartError;

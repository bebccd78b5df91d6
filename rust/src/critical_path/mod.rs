//! Critical path scheduling.
//!
//! Forward pass for earliest times, backward pass for latest times, and
//! zero-slack detection for critical-path membership.

mod calculation;
mod types;

pub use calculation::{compute_schedule, ScheduleError};
pub use types::{ScheduleResult, TaskTiming};

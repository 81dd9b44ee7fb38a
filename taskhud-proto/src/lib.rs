//! Shared record and patch definitions for the `TaskHUD` task API.

pub mod lenient;
pub mod patch;
pub mod record;

pub use patch::TimerPatch;
pub use record::{NOT_RUNNING, TaskId, TaskTimerRecord};

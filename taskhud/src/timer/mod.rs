//! Timer state machine for the active task.
//!
//! [`model`] holds the pure elapsed-time and target math plus the patch each
//! user action proposes; [`controller`] owns the recheck loop and routes
//! every transition through the task store.

pub mod controller;
pub mod model;

pub use controller::{ControllerConfig, HudEvent, TimerController};
pub use model::TimerAction;

use taskhud_proto::TaskId;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during a timer transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimerError {
    /// No task is attached, so there is no id to patch.
    #[error("no task is attached")]
    NotAttached,
    /// Start was requested while the timer is running.
    #[error("timer for task {0} is already running")]
    AlreadyRunning(TaskId),
    /// Pause was requested while the timer is not running.
    #[error("timer for task {0} is not running")]
    NotRunning(TaskId),
    /// Targets shorter than one whole minute can never be reached.
    #[error("target must be at least one minute (got {0} ms)")]
    InvalidTarget(u64),
    /// The task store did not acknowledge the patch.
    #[error("task update failed: {0}")]
    Persist(#[from] StoreError),
}

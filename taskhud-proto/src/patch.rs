//! Partial updates proposed to the task API.

use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::record::{TaskId, TaskTimerRecord};

/// A partial field update keyed by task id.
///
/// Fields left as `None` are omitted on the wire and left untouched by the
/// receiver. A patch carrying only an id is a valid no-op update, which the
/// task API answers with the current record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPatch {
    /// Task the patch applies to.
    pub id: TaskId,
    /// New start timestamp; `Some(0)` stops the running segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_last_start: Option<u64>,
    /// New pending time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_pending_ms: Option<u64>,
    /// New cumulative total.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_total_ms: Option<u64>,
    /// New target duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_target_ms: Option<u64>,
    /// New work-in-progress marker, sent as `0`/`1`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_flag",
        serialize_with = "lenient::opt_flag_as_int"
    )]
    pub wip: Option<bool>,
}

impl TimerPatch {
    /// Creates a patch that changes nothing.
    #[must_use]
    pub const fn new(id: TaskId) -> Self {
        Self {
            id,
            timer_last_start: None,
            timer_pending_ms: None,
            timer_total_ms: None,
            timer_target_ms: None,
            wip: None,
        }
    }

    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.timer_last_start.is_none()
            && self.timer_pending_ms.is_none()
            && self.timer_total_ms.is_none()
            && self.timer_target_ms.is_none()
            && self.wip.is_none()
    }

    /// Merges the present fields into `record`, the way the task API does.
    ///
    /// The id is not checked; callers route the patch to the right record.
    pub fn apply_to(&self, record: &mut TaskTimerRecord) {
        if let Some(v) = self.timer_last_start {
            record.timer_last_start = v;
        }
        if let Some(v) = self.timer_pending_ms {
            record.timer_pending_ms = v;
        }
        if let Some(v) = self.timer_total_ms {
            record.timer_total_ms = v;
        }
        if let Some(v) = self.timer_target_ms {
            record.timer_target_ms = v;
        }
        if let Some(v) = self.wip {
            record.wip = v;
        }
    }
}

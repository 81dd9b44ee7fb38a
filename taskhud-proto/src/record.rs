//! The externally owned task record and its identifier.
//!
//! A [`TaskTimerRecord`] is a read-only view of the task as last
//! acknowledged by the task API. Nothing in this workspace mutates one in
//! place except a store applying a [`TimerPatch`](crate::patch::TimerPatch).

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::lenient;

/// Sentinel for [`TaskTimerRecord::timer_last_start`] meaning "not running".
pub const NOT_RUNNING: u64 = 0;

/// Opaque task identifier.
///
/// The task API hands out integer keys for some deployments and string keys
/// for others; the identifier is echoed back exactly as it was received.
///
/// Any JSON number or string decodes. Integral numbers keep their numeric
/// form (`u64` keys above `i64::MAX` included); fractional numbers are kept
/// as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaskId(IdRepr);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    UInt(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TaskIdVisitor)
    }
}

struct TaskIdVisitor;

impl Visitor<'_> for TaskIdVisitor {
    type Value = TaskId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a task id number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TaskId, E> {
        Ok(TaskId::from_int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TaskId, E> {
        Ok(i64::try_from(v).map_or(TaskId(IdRepr::UInt(v)), TaskId::from_int))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<TaskId, E> {
        // `42.0` is the integer key 42.
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Ok(TaskId::from_int(v as i64))
        } else if v.is_finite() {
            Ok(TaskId::new(v.to_string()))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TaskId, E> {
        Ok(TaskId::new(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<TaskId, E> {
        Ok(TaskId::new(v))
    }
}

impl TaskId {
    /// Creates a string-keyed identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(IdRepr::Text(id.into()))
    }

    /// Creates an integer-keyed identifier.
    #[must_use]
    pub const fn from_int(id: i64) -> Self {
        Self(IdRepr::Int(id))
    }

    /// Parses a command-line style identifier, preferring the integer form.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            Self::from_int(n)
        } else if let Ok(n) = raw.parse::<u64>() {
            Self(IdRepr::UInt(n))
        } else {
            Self::new(raw)
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            IdRepr::Int(n) => write!(f, "{n}"),
            IdRepr::UInt(n) => write!(f, "{n}"),
            IdRepr::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self::from_int(id)
    }
}

/// Timer-bearing view of a task.
///
/// Only `id` is required on the wire; every other field decodes leniently
/// (see [`lenient`]) and unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTimerRecord {
    /// Identifier every patch is keyed by.
    pub id: TaskId,
    /// Display label.
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    /// Epoch milliseconds of the last start, or [`NOT_RUNNING`].
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timer_last_start: u64,
    /// Milliseconds logged since the last reset but not folded into the total.
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timer_pending_ms: u64,
    /// Milliseconds ever logged, folded in on stop.
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timer_total_ms: u64,
    /// Target duration in milliseconds; `0` means no target is armed.
    #[serde(default, deserialize_with = "lenient::millis")]
    pub timer_target_ms: u64,
    /// Task-level "work in progress" marker.
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        serialize_with = "lenient::flag_as_int"
    )]
    pub wip: bool,
}

impl TaskTimerRecord {
    /// Creates an idle record with no logged time and no target.
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            timer_last_start: NOT_RUNNING,
            timer_pending_ms: 0,
            timer_total_ms: 0,
            timer_target_ms: 0,
            wip: false,
        }
    }

    /// Returns the armed target, if any.
    #[must_use]
    pub const fn target_ms(&self) -> Option<u64> {
        if self.timer_target_ms > 0 {
            Some(self.timer_target_ms)
        } else {
            None
        }
    }
}

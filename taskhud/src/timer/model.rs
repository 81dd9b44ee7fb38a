//! Pure elapsed-time accounting over a [`TaskTimerRecord`].
//!
//! Elapsed time is never stored while the timer runs. It is derived on
//! demand from the persisted start timestamp plus pending time, so these
//! functions can be called at any rate without affecting anything.

use std::fmt;

use taskhud_proto::{NOT_RUNNING, TaskTimerRecord, TimerPatch};

use super::TimerError;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: u64 = 60_000;

/// Returns `true` if the timer is running.
#[must_use]
pub const fn is_running(record: &TaskTimerRecord) -> bool {
    record.timer_last_start > NOT_RUNNING
}

/// Milliseconds logged since the last reset, as of `now_ms`.
///
/// A start timestamp in the future (clock skew between hosts) contributes
/// nothing rather than wrapping.
#[must_use]
pub const fn elapsed_ms(record: &TaskTimerRecord, now_ms: u64) -> u64 {
    let running = if is_running(record) {
        now_ms.saturating_sub(record.timer_last_start)
    } else {
        0
    };
    running.saturating_add(record.timer_pending_ms)
}

/// Seconds logged since the last reset, as of `now_ms`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn elapsed_seconds(record: &TaskTimerRecord, now_ms: u64) -> f64 {
    elapsed_ms(record, now_ms) as f64 / 1000.0
}

/// Whole minutes logged since the last reset, truncated.
#[must_use]
pub const fn elapsed_minutes(record: &TaskTimerRecord, now_ms: u64) -> u64 {
    elapsed_ms(record, now_ms) / MS_PER_MINUTE
}

/// Returns `true` while elapsed time sits in the target's minute.
///
/// This is an equality test on whole minutes, not `>=`: it holds for the
/// one-minute window in which the target is crossed and is false before and
/// after. It stays true for every poll inside that window, so callers must
/// debounce. A target shorter than one minute is never reached.
#[must_use]
pub const fn target_reached(record: &TaskTimerRecord, now_ms: u64) -> bool {
    let target_minutes = record.timer_target_ms / MS_PER_MINUTE;
    target_minutes > 0 && elapsed_minutes(record, now_ms) == target_minutes
}

/// A user-triggered timer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Begin a running segment.
    Start,
    /// Freeze elapsed time into pending time.
    Pause,
    /// Fold elapsed time into the total and clear the session.
    Stop,
    /// Discard pending time without touching the total.
    Reset,
    /// Arm a target of the given duration in milliseconds.
    ArmTarget(u64),
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Pause => write!(f, "pause"),
            Self::Stop => write!(f, "stop"),
            Self::Reset => write!(f, "reset"),
            Self::ArmTarget(ms) => write!(f, "arm target ({ms} ms)"),
        }
    }
}

/// Builds the patch `action` proposes for `record` at `now_ms`.
///
/// # Errors
///
/// - [`TimerError::AlreadyRunning`] for `Start` on a running timer.
/// - [`TimerError::NotRunning`] for `Pause` on a stopped timer.
/// - [`TimerError::InvalidTarget`] for a target under one minute.
pub fn plan(
    action: TimerAction,
    record: &TaskTimerRecord,
    now_ms: u64,
) -> Result<TimerPatch, TimerError> {
    let mut patch = TimerPatch::new(record.id.clone());
    match action {
        TimerAction::Start => {
            if is_running(record) {
                return Err(TimerError::AlreadyRunning(record.id.clone()));
            }
            // 0 is the not-running sentinel.
            patch.timer_last_start = Some(now_ms.max(1));
        }
        TimerAction::Pause => {
            if !is_running(record) {
                return Err(TimerError::NotRunning(record.id.clone()));
            }
            patch.timer_last_start = Some(NOT_RUNNING);
            patch.timer_pending_ms = Some(elapsed_ms(record, now_ms));
        }
        TimerAction::Stop => {
            patch.timer_last_start = Some(NOT_RUNNING);
            patch.timer_total_ms = Some(
                record
                    .timer_total_ms
                    .saturating_add(elapsed_ms(record, now_ms)),
            );
            patch.timer_pending_ms = Some(0);
            patch.wip = Some(false);
        }
        TimerAction::Reset => {
            patch.timer_last_start = Some(NOT_RUNNING);
            patch.timer_pending_ms = Some(0);
        }
        TimerAction::ArmTarget(target_ms) => {
            if target_ms < MS_PER_MINUTE {
                return Err(TimerError::InvalidTarget(target_ms));
            }
            patch.timer_target_ms = Some(target_ms);
        }
    }
    Ok(patch)
}

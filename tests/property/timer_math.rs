//! Property tests for the timer model.
//!
//! Uses proptest to verify:
//! 1. A record is running exactly when its start timestamp is non-zero.
//! 2. Elapsed time of a stopped timer is its pending time at any instant.
//! 3. Elapsed time of a running timer is pending plus the running segment.
//! 4. A target under one minute is never reached.
//! 5. A target is reached for exactly one minute of elapsed time.
//! 6. Planned transitions leave the record in the expected state once applied.

use proptest::prelude::*;
use taskhud::timer::model::{
    self, MS_PER_MINUTE, TimerAction, elapsed_ms, elapsed_minutes, is_running, target_reached,
};
use taskhud::timer::TimerError;
use taskhud_proto::{TaskId, TaskTimerRecord};

/// Keeps sums well clear of `u64::MAX`.
const MAX_MS: u64 = 1 << 48;

fn record(last_start: u64, pending: u64, total: u64, target: u64) -> TaskTimerRecord {
    TaskTimerRecord {
        timer_last_start: last_start,
        timer_pending_ms: pending,
        timer_total_ms: total,
        timer_target_ms: target,
        ..TaskTimerRecord::new(TaskId::from_int(1), "Prop task")
    }
}

proptest! {
    #[test]
    fn running_iff_start_is_set(start in 0..MAX_MS, pending in 0..MAX_MS) {
        let r = record(start, pending, 0, 0);
        prop_assert_eq!(is_running(&r), start != 0);
    }

    #[test]
    fn stopped_elapsed_is_pending(pending in 0..MAX_MS, now in 0..MAX_MS) {
        let r = record(0, pending, 0, 0);
        prop_assert_eq!(elapsed_ms(&r, now), pending);
    }

    #[test]
    fn running_elapsed_adds_segment(
        start in 1..MAX_MS,
        segment in 0..MAX_MS,
        pending in 0..MAX_MS,
    ) {
        let r = record(start, pending, 0, 0);
        prop_assert_eq!(elapsed_ms(&r, start + segment), pending + segment);
    }

    #[test]
    fn short_target_never_reached(
        target in 0..MS_PER_MINUTE,
        pending in 0..MAX_MS,
    ) {
        let r = record(0, pending, 0, target);
        prop_assert!(!target_reached(&r, 0));
    }

    #[test]
    fn target_window_is_one_minute(
        target_minutes in 1u64..10_000,
        offset in 0..3 * MS_PER_MINUTE,
    ) {
        // Elapsed walks from one minute before the target to one minute after.
        let target = target_minutes * MS_PER_MINUTE;
        let elapsed = target - MS_PER_MINUTE + offset;
        let r = record(0, elapsed, 0, target);
        let inside = (MS_PER_MINUTE..2 * MS_PER_MINUTE).contains(&offset);
        prop_assert_eq!(target_reached(&r, 0), inside);
    }

    #[test]
    fn pause_then_start_preserves_elapsed(
        start in 1..MAX_MS,
        segment in 0..MAX_MS,
        pending in 0..MAX_MS,
    ) {
        let mut r = record(start, pending, 0, 0);
        let now = start + segment;
        let before = elapsed_ms(&r, now);

        model::plan(TimerAction::Pause, &r, now).unwrap().apply_to(&mut r);
        prop_assert!(!is_running(&r));
        prop_assert_eq!(elapsed_ms(&r, now + 5_000), before);

        model::plan(TimerAction::Start, &r, now).unwrap().apply_to(&mut r);
        prop_assert!(is_running(&r));
        prop_assert_eq!(elapsed_ms(&r, now), before);
    }

    #[test]
    fn stop_conserves_logged_time(
        start in 0..MAX_MS,
        segment in 0..MAX_MS,
        pending in 0..MAX_MS,
        total in 0..MAX_MS,
    ) {
        let mut r = record(start, pending, total, 0);
        let now = start + segment;
        let logged = elapsed_ms(&r, now);

        model::plan(TimerAction::Stop, &r, now).unwrap().apply_to(&mut r);
        prop_assert_eq!(r.timer_total_ms, total + logged);
        prop_assert_eq!(elapsed_ms(&r, now), 0);
        prop_assert_eq!(elapsed_minutes(&r, now), 0);
        prop_assert!(!r.wip);
    }

    #[test]
    fn arm_target_validates_length(target in 0..MAX_MS) {
        let r = record(0, 0, 0, 0);
        let result = model::plan(TimerAction::ArmTarget(target), &r, 0);
        if target < MS_PER_MINUTE {
            prop_assert_eq!(result, Err(TimerError::InvalidTarget(target)));
        } else {
            prop_assert_eq!(result.unwrap().timer_target_ms, Some(target));
        }
    }
}

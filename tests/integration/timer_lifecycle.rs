//! Integration tests for timer transitions through the task store.
//!
//! Verifies:
//! 1. Each transition sends the expected patch and adopts the acknowledged record.
//! 2. Invalid transitions are rejected before anything is sent.
//! 3. Store failures leave the attached record untouched.
//! 4. Overlapping transitions are applied in submission order.
//! 5. Host events mirror every acknowledgment and failure.

use std::time::Duration;

use taskhud::clock::ManualClock;
use taskhud::notify::RecordingNotifier;
use taskhud::store::{InMemoryTaskStore, StoreError, TaskStore};
use taskhud::timer::{ControllerConfig, HudEvent, TimerAction, TimerController, TimerError};
use taskhud_proto::{TaskId, TaskTimerRecord, TimerPatch};

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Controller = TimerController<InMemoryTaskStore, RecordingNotifier, ManualClock>;

struct Harness {
    controller: Controller,
    events: mpsc::Receiver<HudEvent>,
    store: InMemoryTaskStore,
    clock: ManualClock,
}

fn task_id() -> TaskId {
    TaskId::from_int(7)
}

fn idle_task() -> TaskTimerRecord {
    TaskTimerRecord::new(task_id(), "Quarterly report")
}

fn harness_with(record: TaskTimerRecord, store: InMemoryTaskStore, config: ControllerConfig) -> Harness {
    store.insert(record.clone());
    let clock = ManualClock::new(1_000);
    let (controller, events) =
        TimerController::new(store.clone(), RecordingNotifier::new(), clock.clone(), config);
    controller.attach(record);
    Harness {
        controller,
        events,
        store,
        clock,
    }
}

fn harness(record: TaskTimerRecord) -> Harness {
    harness_with(record, InMemoryTaskStore::new(), ControllerConfig::default())
}

fn drain(events: &mut mpsc::Receiver<HudEvent>) -> Vec<HudEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

// ---------------------------------------------------------------------------
// Patch shapes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_then_pause_logs_sixty_seconds() {
    let mut h = harness(idle_task());

    h.controller.start().await.unwrap();
    h.clock.set(61_000);
    let paused = h.controller.pause().await.unwrap();

    assert_eq!(
        h.store.accepted(),
        vec![
            TimerPatch {
                timer_last_start: Some(1_000),
                ..TimerPatch::new(task_id())
            },
            TimerPatch {
                timer_last_start: Some(0),
                timer_pending_ms: Some(60_000),
                ..TimerPatch::new(task_id())
            },
        ]
    );
    assert_eq!(paused.timer_pending_ms, 60_000);
    assert_eq!(paused.timer_last_start, 0);
    assert_eq!(h.controller.record(), Some(paused.clone()));

    let events = drain(&mut h.events);
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], HudEvent::RecordUpdated(paused));
}

#[tokio::test]
async fn stop_folds_pending_into_total_and_clears_wip() {
    let record = TaskTimerRecord {
        timer_pending_ms: 60_000,
        timer_total_ms: 0,
        wip: true,
        ..idle_task()
    };
    let h = harness(record);
    h.clock.set(9_999_999);

    let stopped = h.controller.stop().await.unwrap();

    let patch = h.store.accepted().pop().unwrap();
    assert_eq!(patch.timer_total_ms, Some(60_000));
    assert_eq!(patch.timer_pending_ms, Some(0));
    assert_eq!(patch.timer_last_start, Some(0));
    assert_eq!(patch.wip, Some(false));
    assert_eq!(stopped.timer_total_ms, 60_000);
    assert!(!stopped.wip);
}

#[tokio::test]
async fn stop_while_running_counts_running_segment() {
    let record = TaskTimerRecord {
        timer_last_start: 1_000,
        timer_pending_ms: 30_000,
        timer_total_ms: 100_000,
        ..idle_task()
    };
    let h = harness(record);
    h.clock.set(121_000);

    let stopped = h.controller.stop().await.unwrap();
    assert_eq!(stopped.timer_total_ms, 250_000);
    assert_eq!(stopped.timer_pending_ms, 0);
    assert!(!h.controller.is_running());
}

#[tokio::test]
async fn reset_discards_pending_without_touching_total() {
    let record = TaskTimerRecord {
        timer_pending_ms: 45_000,
        timer_total_ms: 600_000,
        ..idle_task()
    };
    let h = harness(record);

    let reset = h.controller.reset().await.unwrap();

    let patch = h.store.accepted().pop().unwrap();
    assert_eq!(patch.timer_last_start, Some(0));
    assert_eq!(patch.timer_pending_ms, Some(0));
    assert_eq!(patch.timer_total_ms, None);
    assert_eq!(reset.timer_total_ms, 600_000);
    assert_eq!(h.controller.elapsed_seconds(), Some(0.0));
}

#[tokio::test]
async fn arm_target_uses_configured_pomodoro() {
    let config = ControllerConfig {
        pomodoro: Duration::from_secs(2 * 60),
        ..ControllerConfig::default()
    };
    let h = harness_with(idle_task(), InMemoryTaskStore::new(), config);

    let armed = h.controller.arm_target().await.unwrap();
    assert_eq!(armed.timer_target_ms, 120_000);
    assert_eq!(
        h.store.accepted(),
        vec![TimerPatch {
            timer_target_ms: Some(120_000),
            ..TimerPatch::new(task_id())
        }]
    );
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_while_running_sends_nothing() {
    let record = TaskTimerRecord {
        timer_last_start: 500,
        ..idle_task()
    };
    let h = harness(record);

    let result = h.controller.start().await;
    assert_eq!(result, Err(TimerError::AlreadyRunning(task_id())));
    assert!(h.store.accepted().is_empty());
    assert_eq!(h.controller.record().unwrap().timer_last_start, 500);
}

#[tokio::test]
async fn pause_while_paused_sends_nothing() {
    let h = harness(idle_task());
    assert_eq!(
        h.controller.pause().await,
        Err(TimerError::NotRunning(task_id()))
    );
    assert!(h.store.accepted().is_empty());
}

#[tokio::test]
async fn sub_minute_target_is_rejected() {
    let h = harness(idle_task());
    assert_eq!(
        h.controller.arm_target_ms(30_000).await,
        Err(TimerError::InvalidTarget(30_000))
    );
    assert!(h.store.accepted().is_empty());
}

#[tokio::test]
async fn detached_controller_rejects_every_transition() {
    let h = harness(idle_task());
    h.controller.detach();

    assert_eq!(h.controller.start().await, Err(TimerError::NotAttached));
    assert_eq!(h.controller.stop().await, Err(TimerError::NotAttached));
    assert_eq!(h.controller.reset().await, Err(TimerError::NotAttached));
    assert_eq!(h.controller.arm_target().await, Err(TimerError::NotAttached));
    assert!(h.store.accepted().is_empty());
    assert!(h.controller.snapshot().is_none());
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_patch_keeps_last_good_record() {
    let mut h = harness(idle_task());
    h.store.fail_next(1);

    let result = h.controller.start().await;
    assert!(matches!(
        result,
        Err(TimerError::Persist(StoreError::Rejected(_)))
    ));
    assert_eq!(h.controller.record(), Some(idle_task()));
    assert!(!h.controller.is_running());

    let events = drain(&mut h.events);
    assert!(matches!(
        events.as_slice(),
        [HudEvent::PatchFailed {
            action: TimerAction::Start,
            ..
        }]
    ));

    // The user retries and the second attempt goes through.
    let started = h.controller.start().await.unwrap();
    assert!(h.controller.is_running());
    assert_eq!(started.timer_last_start, 1_000);
}

#[tokio::test]
async fn unreachable_store_reports_persist_error() {
    let h = harness(idle_task());
    h.store.set_offline(true);

    let err = h.controller.reset().await.unwrap_err();
    assert!(matches!(err, TimerError::Persist(StoreError::Unreachable(_))));
    assert!(err.to_string().contains("unreachable"));
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn overlapping_transitions_apply_in_order() {
    let store = InMemoryTaskStore::new().with_latency(Duration::from_millis(200));
    let h = harness_with(idle_task(), store, ControllerConfig::default());

    // Pause is planned only after start is acknowledged, so it sees a
    // running timer instead of failing with NotRunning.
    let (started, paused) = tokio::join!(h.controller.start(), h.controller.pause());

    let started = started.unwrap();
    let paused = paused.unwrap();
    assert_eq!(started.timer_last_start, 1_000);
    assert_eq!(paused.timer_last_start, 0);

    let accepted = h.store.accepted();
    assert_eq!(accepted.len(), 2);
    assert_eq!(accepted[0].timer_last_start, Some(1_000));
    assert_eq!(accepted[1].timer_last_start, Some(0));
    assert_eq!(h.controller.record(), Some(paused));
}

#[tokio::test(start_paused = true)]
async fn acknowledgment_after_detach_is_not_reattached() {
    let store = InMemoryTaskStore::new().with_latency(Duration::from_millis(200));
    let mut h = harness_with(idle_task(), store, ControllerConfig::default());

    let (started, ()) = tokio::join!(h.controller.start(), async { h.controller.detach() });

    let started = started.unwrap();
    assert!(!h.controller.is_attached());
    assert!(h.controller.record().is_none());
    // The host still learns about the acknowledged record.
    assert_eq!(
        drain(&mut h.events),
        vec![HudEvent::RecordUpdated(started)]
    );
}

// ---------------------------------------------------------------------------
// Host wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn host_attaches_fetched_record() {
    let store = InMemoryTaskStore::with_records([TaskTimerRecord {
        timer_pending_ms: 125_000,
        timer_target_ms: 25 * 60_000,
        ..idle_task()
    }]);
    let record = store.fetch(&task_id()).await.unwrap();

    let (controller, _events) = TimerController::new(
        store,
        RecordingNotifier::new(),
        ManualClock::new(0),
        ControllerConfig::default(),
    );
    controller.attach(record);

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.title, "Quarterly report");
    assert_eq!(snapshot.progress, "2 minutes");
    assert_eq!(snapshot.target.as_deref(), Some("Target: 25 minutes"));
    assert_eq!(
        snapshot.to_string(),
        "Quarterly report | Logging (paused) Target: 25 minutes | 2 minutes"
    );
}

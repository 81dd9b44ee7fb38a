//! Timer controller for the active task.
//!
//! [`TimerController`] holds the attached record, the `notified` debounce
//! flag, and the periodic recheck loop. It never edits the record itself:
//! every transition is planned by [`model::plan`], sent to the
//! [`TaskStore`], and the record the store returns replaces the attached one.
//!
//! # Lifecycle
//!
//! ```text
//! attach(record) ──► recheck loop running ──► detach() / drop
//!        ▲                    │
//!        └── attach(newer) ───┘   (same loop, record replaced)
//! ```
//!
//! # Ordering
//!
//! Transitions are serialized per controller. Each one is planned against
//! the latest acknowledged record and its response is applied before the
//! next transition is planned.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taskhud_proto::{TaskId, TaskTimerRecord, TimerPatch};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::TimerError;
use super::model::{self, MS_PER_MINUTE, TimerAction};
use crate::clock::Clock;
use crate::display::HudSnapshot;
use crate::notify::Notifier;
use crate::store::TaskStore;

/// Title of the target-reached notification.
pub const TARGET_REACHED_TITLE: &str = "Target Reached";

/// Shortest recheck period the loop will run at.
pub const MIN_RECHECK_INTERVAL: Duration = Duration::from_millis(10);

/// Longest recheck period the loop will run at. A target is only reached
/// for one minute of elapsed time, so every period must fit inside it.
pub const MAX_RECHECK_INTERVAL: Duration = Duration::from_secs(59);

/// Body of the target-reached notification.
#[must_use]
pub fn target_reached_body(minutes: u64, title: &str) -> String {
    format!("{minutes} minutes logged on \"{title}\"")
}

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Period of the recheck loop, clamped to
    /// [`MIN_RECHECK_INTERVAL`]..=[`MAX_RECHECK_INTERVAL`].
    pub recheck_interval: Duration,
    /// Target armed by [`TimerController::arm_target`].
    pub pomodoro: Duration,
    /// Capacity of the [`HudEvent`] channel.
    pub event_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            recheck_interval: Duration::from_secs(30),
            pomodoro: Duration::from_secs(25 * 60),
            event_buffer: 64,
        }
    }
}

/// Events delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HudEvent {
    /// The task store acknowledged a patch with this record. Hosts that keep
    /// their own copy of the task list should replace it.
    RecordUpdated(TaskTimerRecord),
    /// The armed target was reached and a notification was raised.
    TargetReached {
        /// Task the target belongs to.
        task_id: TaskId,
        /// Whole minutes logged when the notification fired.
        minutes: u64,
    },
    /// A transition was not acknowledged; the attached record is unchanged.
    PatchFailed {
        /// Transition that failed.
        action: TimerAction,
        /// Store error description.
        reason: String,
    },
}

#[derive(Debug, Default)]
struct HudState {
    record: Option<TaskTimerRecord>,
    notified: bool,
}

/// State shared with the recheck loop.
struct Shared<N, C> {
    state: Mutex<HudState>,
    notifier: N,
    clock: C,
    events: mpsc::Sender<HudEvent>,
}

impl<N: Notifier, C: Clock> Shared<N, C> {
    fn recheck(&self) -> bool {
        let (task_id, title, minutes) = {
            let mut state = self.state.lock();
            let Some(record) = state.record.as_ref() else {
                return false;
            };
            let now = self.clock.now_ms();
            if state.notified || !model::target_reached(record, now) {
                return false;
            }
            let fired = (
                record.id.clone(),
                record.title.clone(),
                model::elapsed_minutes(record, now),
            );
            state.notified = true;
            fired
        };

        tracing::info!(task_id = %task_id, minutes, "target reached");
        self.notifier
            .notify(TARGET_REACHED_TITLE, &target_reached_body(minutes, &title));
        self.emit(HudEvent::TargetReached { task_id, minutes });
        true
    }

    fn emit(&self, event: HudEvent) {
        if let Err(e) = self.events.try_send(event) {
            tracing::debug!(error = %e, "hud event dropped");
        }
    }
}

/// Handle to the running recheck loop.
struct RecheckLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RecheckLoop {
    fn spawn<N, C>(shared: Arc<Shared<N, C>>, period: Duration) -> Self
    where
        N: Notifier + 'static,
        C: Clock + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        shared.recheck();
                    }
                }
            }
            tracing::debug!("recheck loop stopped");
        });
        Self { cancel, task }
    }

    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Controller for a single active task's timer.
///
/// Generic over the task store `S`, notifier `N`, and clock `C` so that
/// tests can drive it without a network, an OS notification service, or
/// real time.
pub struct TimerController<S, N, C> {
    store: S,
    shared: Arc<Shared<N, C>>,
    recheck_loop: Mutex<Option<RecheckLoop>>,
    patch_gate: tokio::sync::Mutex<()>,
    config: ControllerConfig,
}

impl<S, N, C> TimerController<S, N, C>
where
    S: TaskStore,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    /// Creates a detached controller and the receiver for its [`HudEvent`]s.
    pub fn new(
        store: S,
        notifier: N,
        clock: C,
        config: ControllerConfig,
    ) -> (Self, mpsc::Receiver<HudEvent>) {
        let (events, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let shared = Arc::new(Shared {
            state: Mutex::new(HudState::default()),
            notifier,
            clock,
            events,
        });
        let controller = Self {
            store,
            shared,
            recheck_loop: Mutex::new(None),
            patch_gate: tokio::sync::Mutex::new(()),
            config,
        };
        (controller, event_rx)
    }

    /// Attaches `record`, starting the recheck loop if none is running.
    ///
    /// Attaching while attached replaces the record and keeps the existing
    /// loop. The `notified` flag is left as it is.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(&self, record: TaskTimerRecord) {
        tracing::debug!(task_id = %record.id, "attaching task");
        self.shared.state.lock().record = Some(record);

        let mut recheck_loop = self.recheck_loop.lock();
        if recheck_loop.is_none() {
            let period = self
                .config
                .recheck_interval
                .clamp(MIN_RECHECK_INTERVAL, MAX_RECHECK_INTERVAL);
            *recheck_loop = Some(RecheckLoop::spawn(Arc::clone(&self.shared), period));
            tracing::debug!(?period, "recheck loop started");
        }
    }

    /// Stops the recheck loop and drops the attached record.
    pub fn detach(&self) {
        if let Some(recheck_loop) = self.recheck_loop.lock().take() {
            recheck_loop.stop();
        }
        if let Some(record) = self.shared.state.lock().record.take() {
            tracing::debug!(task_id = %record.id, "detached task");
        }
    }

    /// Runs one target check now. Returns `true` if a notification fired.
    ///
    /// Safe to call at any rate; once the current target has notified,
    /// further calls do nothing until a new target is armed.
    pub fn recheck(&self) -> bool {
        self.shared.recheck()
    }

    /// Returns `true` if a task is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.shared.state.lock().record.is_some()
    }

    /// Returns `true` if the recheck loop is running.
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.recheck_loop
            .lock()
            .as_ref()
            .is_some_and(|l| !l.task.is_finished())
    }

    /// Returns `true` if the current target has already notified.
    #[must_use]
    pub fn notified(&self) -> bool {
        self.shared.state.lock().notified
    }

    /// Returns a copy of the attached record.
    #[must_use]
    pub fn record(&self) -> Option<TaskTimerRecord> {
        self.shared.state.lock().record.clone()
    }

    /// Seconds logged on the attached task, as of now.
    #[must_use]
    pub fn elapsed_seconds(&self) -> Option<f64> {
        let now = self.shared.clock.now_ms();
        self.shared
            .state
            .lock()
            .record
            .as_ref()
            .map(|r| model::elapsed_seconds(r, now))
    }

    /// Returns `true` if the attached task's timer is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared
            .state
            .lock()
            .record
            .as_ref()
            .is_some_and(model::is_running)
    }

    /// Captures a presentation snapshot of the attached task.
    #[must_use]
    pub fn snapshot(&self) -> Option<HudSnapshot> {
        let now = self.shared.clock.now_ms();
        let state = self.shared.state.lock();
        state
            .record
            .as_ref()
            .map(|r| HudSnapshot::capture(r, now, state.notified))
    }

    /// Starts the timer.
    ///
    /// # Errors
    ///
    /// [`TimerError::NotAttached`], [`TimerError::AlreadyRunning`], or
    /// [`TimerError::Persist`].
    pub async fn start(&self) -> Result<TaskTimerRecord, TimerError> {
        self.transition(TimerAction::Start).await
    }

    /// Pauses the timer, freezing elapsed time into pending time.
    ///
    /// # Errors
    ///
    /// [`TimerError::NotAttached`], [`TimerError::NotRunning`], or
    /// [`TimerError::Persist`].
    pub async fn pause(&self) -> Result<TaskTimerRecord, TimerError> {
        self.transition(TimerAction::Pause).await
    }

    /// Stops the timer, folding elapsed time into the task total and
    /// clearing the task's work-in-progress marker.
    ///
    /// # Errors
    ///
    /// [`TimerError::NotAttached`] or [`TimerError::Persist`].
    pub async fn stop(&self) -> Result<TaskTimerRecord, TimerError> {
        self.transition(TimerAction::Stop).await
    }

    /// Discards pending time without touching the total.
    ///
    /// # Errors
    ///
    /// [`TimerError::NotAttached`] or [`TimerError::Persist`].
    pub async fn reset(&self) -> Result<TaskTimerRecord, TimerError> {
        self.transition(TimerAction::Reset).await
    }

    /// Arms the configured pomodoro target.
    ///
    /// # Errors
    ///
    /// See [`arm_target_ms`](Self::arm_target_ms).
    pub async fn arm_target(&self) -> Result<TaskTimerRecord, TimerError> {
        let target_ms = u64::try_from(self.config.pomodoro.as_millis()).unwrap_or(u64::MAX);
        self.arm_target_ms(target_ms).await
    }

    /// Arms a target of `target_ms` milliseconds.
    ///
    /// The `notified` flag is cleared before the patch is sent, so the next
    /// recheck can fire for the new target even if the round-trip fails.
    ///
    /// # Errors
    ///
    /// [`TimerError::NotAttached`], [`TimerError::InvalidTarget`] for targets
    /// under one minute, or [`TimerError::Persist`].
    pub async fn arm_target_ms(&self, target_ms: u64) -> Result<TaskTimerRecord, TimerError> {
        self.transition(TimerAction::ArmTarget(target_ms)).await
    }

    async fn transition(&self, action: TimerAction) -> Result<TaskTimerRecord, TimerError> {
        let _gate = self.patch_gate.lock().await;

        let patch = {
            let mut state = self.shared.state.lock();
            let record = state.record.as_ref().ok_or(TimerError::NotAttached)?;
            let patch = model::plan(action, record, self.shared.clock.now_ms())?;
            if let TimerAction::ArmTarget(target_ms) = action {
                tracing::debug!(
                    task_id = %record.id,
                    target_minutes = target_ms / MS_PER_MINUTE,
                    "arming target"
                );
                state.notified = false;
            }
            patch
        };

        self.apply_patch(action, patch).await
    }

    /// Sends `patch` and, once acknowledged, replaces the attached record.
    async fn apply_patch(
        &self,
        action: TimerAction,
        patch: TimerPatch,
    ) -> Result<TaskTimerRecord, TimerError> {
        match self.store.update(&patch).await {
            Ok(record) => {
                {
                    let mut state = self.shared.state.lock();
                    match state.record.as_mut() {
                        Some(attached) if attached.id == record.id => {
                            *attached = record.clone();
                        }
                        _ => {
                            tracing::debug!(
                                task_id = %record.id,
                                "task no longer attached; acknowledgment not applied"
                            );
                        }
                    }
                }
                tracing::info!(task_id = %record.id, %action, "timer updated");
                self.shared.emit(HudEvent::RecordUpdated(record.clone()));
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(task_id = %patch.id, %action, error = %e, "timer update failed");
                self.shared.emit(HudEvent::PatchFailed {
                    action,
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}

impl<S, N, C> Drop for TimerController<S, N, C> {
    fn drop(&mut self) {
        if let Some(recheck_loop) = self.recheck_loop.get_mut().take() {
            recheck_loop.stop();
        }
    }
}

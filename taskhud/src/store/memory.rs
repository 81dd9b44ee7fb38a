//! In-memory task store.
//!
//! Applies patches the way the task API does and keeps a log of every patch
//! it accepted. Failures and latency can be injected to exercise the
//! controller's error and ordering paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taskhud_proto::{TaskId, TaskTimerRecord, TimerPatch};

use super::{StoreError, TaskStore};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<TaskId, TaskTimerRecord>,
    accepted: Vec<TimerPatch>,
    fail_next: u32,
    offline: bool,
}

/// Map-backed [`TaskStore`].
///
/// Clones share the same records, so a test can keep a handle after giving
/// the store to a controller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<MemoryState>>,
    latency: Option<Duration>,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `records`.
    #[must_use]
    pub fn with_records(records: impl IntoIterator<Item = TaskTimerRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    /// Delays every update by `latency` before it is applied.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, record: TaskTimerRecord) {
        self.state.lock().records.insert(record.id.clone(), record);
    }

    /// Returns the stored record for `id`.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<TaskTimerRecord> {
        self.state.lock().records.get(id).cloned()
    }

    /// Rejects the next `count` updates.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().fail_next = count;
    }

    /// Makes every update fail as unreachable until set back to `false`.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Returns every patch accepted so far, oldest first.
    #[must_use]
    pub fn accepted(&self) -> Vec<TimerPatch> {
        self.state.lock().accepted.clone()
    }
}

impl TaskStore for InMemoryTaskStore {
    async fn update(&self, patch: &TimerPatch) -> Result<TaskTimerRecord, StoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock();
        if state.offline {
            return Err(StoreError::Unreachable("store is offline".to_string()));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(StoreError::Rejected("injected failure".to_string()));
        }

        let record = state
            .records
            .get_mut(&patch.id)
            .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;
        patch.apply_to(record);
        let updated = record.clone();
        state.accepted.push(patch.clone());
        tracing::trace!(task_id = %patch.id, "patch applied in memory");
        Ok(updated)
    }
}

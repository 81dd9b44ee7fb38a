//! Persistence seam for task timer records.
//!
//! Defines the [`TaskStore`] trait that every task API client must satisfy.
//! Concrete implementations include:
//! - [`memory::InMemoryTaskStore`]: map-backed store with failure injection
//! - [`http::HttpTaskStore`]: JSON client for the remote `/api/task` endpoint
//!
//! The store is the sole writer of authoritative task state. A patch takes
//! effect only when the store answers with the full updated record.

pub mod http;
pub mod memory;

use taskhud_proto::{TaskId, TaskTimerRecord, TimerPatch};

pub use http::HttpTaskStore;
pub use memory::InMemoryTaskStore;

/// Errors that can occur while submitting a patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The task API refused the update.
    #[error("update rejected: {0}")]
    Rejected(String),

    /// The task API could not be reached.
    #[error("task API unreachable: {0}")]
    Unreachable(String),

    /// No task with the given id exists.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The response could not be decoded into a record.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Async client for the task API.
///
/// # Contract
///
/// [`update`](TaskStore::update) submits a partial update keyed by
/// `patch.id` and resolves to the full authoritative record after the
/// update, or to an error. On error nothing may be assumed about whether
/// the update was applied remotely.
pub trait TaskStore: Send + Sync {
    /// Submit a patch and return the updated record.
    fn update(
        &self,
        patch: &TimerPatch,
    ) -> impl std::future::Future<Output = Result<TaskTimerRecord, StoreError>> + Send;

    /// Fetch the current record by submitting a patch that changes nothing.
    fn fetch(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<TaskTimerRecord, StoreError>> + Send {
        let patch = TimerPatch::new(id.clone());
        async move { self.update(&patch).await }
    }
}

//! JSON client for the remote task API.
//!
//! Every update is a `POST {base_url}/api/task` carrying the patch as a JSON
//! object. The API answers `{"task": {...}}` on success; any other answer,
//! including a 2xx without a task, counts as a failed update.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use taskhud_proto::{TaskTimerRecord, TimerPatch};

use super::{StoreError, TaskStore};

/// Path of the task update endpoint, relative to the API base URL.
pub const TASK_ENDPOINT: &str = "/api/task";

#[derive(Debug, Deserialize)]
struct TaskResponse {
    #[serde(default)]
    task: Option<TaskTimerRecord>,
    #[serde(default)]
    message: Option<String>,
}

/// [`TaskStore`] backed by the remote task API.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    endpoint: String,
}

impl HttpTaskStore {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unreachable`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unreachable(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{TASK_ENDPOINT}", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL updates are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TaskStore for HttpTaskStore {
    async fn update(&self, patch: &TimerPatch) -> Result<TaskTimerRecord, StoreError> {
        tracing::debug!(task_id = %patch.id, endpoint = %self.endpoint, "posting task patch");

        let response = self
            .client
            .post(&self.endpoint)
            .json(patch)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(patch.id.clone()));
        }
        if !status.is_success() {
            return Err(StoreError::Rejected(format!("HTTP {status}")));
        }

        let body: TaskResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        body.task.ok_or_else(|| {
            StoreError::Rejected(
                body.message
                    .unwrap_or_else(|| "response carried no task".to_string()),
            )
        })
    }
}

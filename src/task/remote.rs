// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tasks executed by a remote backend.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::{PollSettings, TaskState, TaskStatus};
use crate::backend::RemoteBackend;
use crate::codegen::{ClusterResult, ParallelDecoder};
use crate::error::BackendError;
use crate::params::AssignmentMap;
use crate::submission::{TaskResult, TaskSpecification};

/// One discretized hardware task and its remote lifecycle.
pub struct RemoteTask {
    parameters: AssignmentMap,
    task_ir: TaskSpecification,
    parallel_decoder: Option<ParallelDecoder>,
    backend: Arc<dyn RemoteBackend>,
    task_id: Option<String>,
    state: TaskState,
}

impl fmt::Debug for RemoteTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTask")
            .field("parameters", &self.parameters)
            .field("backend", &self.backend.name())
            .field("task_id", &self.task_id)
            .field("state", &self.state.status())
            .finish()
    }
}

impl RemoteTask {
    pub fn new(
        parameters: AssignmentMap,
        task_ir: TaskSpecification,
        parallel_decoder: Option<ParallelDecoder>,
        backend: Arc<dyn RemoteBackend>,
    ) -> Self {
        Self {
            parameters,
            task_ir,
            parallel_decoder,
            backend,
            task_id: None,
            state: TaskState::Created,
        }
    }

    /// The assignment map this task was compiled with.
    pub fn parameters(&self) -> &AssignmentMap {
        &self.parameters
    }

    pub fn task_ir(&self) -> &TaskSpecification {
        &self.task_ir
    }

    pub fn parallel_decoder(&self) -> Option<&ParallelDecoder> {
        self.parallel_decoder.as_ref()
    }

    /// Remote id, once submitted.
    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn status(&self) -> TaskStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&TaskResult> {
        self.state.result()
    }

    /// Per-cluster results of a completed task on a parallel register.
    pub fn cluster_results(&self) -> Option<Vec<ClusterResult>> {
        let decoder = self.parallel_decoder.as_ref()?;
        Some(decoder.decode(self.result()?))
    }

    /// Dispatch the task to its backend.
    ///
    /// A rejected dispatch marks the task failed.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the task has already left the `Created` state,
    /// or the backend's dispatch error.
    pub async fn submit(&mut self) -> Result<&str, BackendError> {
        if !matches!(self.state, TaskState::Created) {
            return Err(BackendError::InvalidRequest(format!(
                "task is already {}",
                self.state.status()
            )));
        }

        match self.backend.submit_task(&self.task_ir).await {
            Ok(task_id) => {
                self.state = TaskState::Submitted;
                Ok(self.task_id.insert(task_id).as_str())
            }
            Err(e) => {
                self.state = TaskState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Check the remote status once, retrieving results if the task has
    /// finished.
    pub async fn fetch(&mut self) -> TaskStatus {
        let Some(task_id) = self.pending_id() else {
            return self.status();
        };
        match self.backend.task_status(&task_id).await {
            Ok(status) if status.is_terminal() => self.resolve(&task_id).await,
            Ok(status) => debug!(task_id = %task_id, %status, "Task not finished"),
            Err(e) => self.fail(&task_id, e),
        }
        self.status()
    }

    /// Poll until the task finishes or `poll.timeout` elapses.
    ///
    /// Tasks that were never submitted, or have already finished, are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// `Timeout` if the task is still running on the device when the
    /// deadline passes. The task stays submitted, so a later `pull` or
    /// `fetch` resumes polling it.
    pub async fn pull(&mut self, poll: &PollSettings) -> Result<TaskStatus, BackendError> {
        let Some(task_id) = self.pending_id() else {
            return Ok(self.status());
        };

        let start = Instant::now();
        loop {
            if start.elapsed() > poll.timeout {
                warn!(task_id = %task_id, timeout_secs = poll.timeout.as_secs_f64(), "Task still running after poll timeout");
                return Err(BackendError::Timeout(format!(
                    "task {task_id} still running after {}s",
                    poll.timeout.as_secs_f64()
                )));
            }

            match self.backend.task_status(&task_id).await {
                Ok(status) if status.is_terminal() => {
                    self.resolve(&task_id).await;
                    break;
                }
                Ok(status) => {
                    debug!(task_id = %task_id, %status, "Task running");
                    tokio::time::sleep(poll.interval).await;
                }
                Err(e) => {
                    self.fail(&task_id, e);
                    break;
                }
            }
        }
        Ok(self.status())
    }

    fn pending_id(&self) -> Option<String> {
        match self.state {
            TaskState::Submitted => self.task_id.clone(),
            _ => None,
        }
    }

    async fn resolve(&mut self, task_id: &str) {
        match self.backend.task_results(task_id).await {
            Ok(result) => {
                debug!(task_id = %task_id, shots = result.shot_outputs.len(), "Task completed");
                self.state = TaskState::Completed(result);
            }
            Err(e) => self.fail(task_id, e),
        }
    }

    fn fail(&mut self, task_id: &str, error: BackendError) {
        warn!(task_id = %task_id, error = %error, "Task failed");
        self.state = TaskState::Failed(error);
    }
}

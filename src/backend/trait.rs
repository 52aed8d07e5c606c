// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Backend trait definitions.

use async_trait::async_trait;

use crate::codegen::BraketTaskSpecification;
use crate::error::BackendError;
use crate::submission::{Capabilities, TaskResult, TaskSpecification};

/// Status of a task as reported by a remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteTaskStatus {
    /// Accepted and queued
    Created,
    /// Executing on the device
    Running,
    /// Finished with results
    Completed,
    /// Finished without results
    Failed,
    /// Cancelled before completion
    Cancelled,
}

impl RemoteTaskStatus {
    /// Whether the task will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RemoteTaskStatus::Completed | RemoteTaskStatus::Failed | RemoteTaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RemoteTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteTaskStatus::Created => write!(f, "created"),
            RemoteTaskStatus::Running => write!(f, "running"),
            RemoteTaskStatus::Completed => write!(f, "completed"),
            RemoteTaskStatus::Failed => write!(f, "failed"),
            RemoteTaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A remote device that accepts discretized tasks.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Device limits used to discretize tasks for this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Create a remote task and return its id.
    async fn submit_task(&self, task: &TaskSpecification) -> Result<String, BackendError>;

    /// Current status of a remote task.
    async fn task_status(&self, task_id: &str) -> Result<RemoteTaskStatus, BackendError>;

    /// Results of a completed remote task.
    async fn task_results(&self, task_id: &str) -> Result<TaskResult, BackendError>;
}

/// A local emulator of Braket AHS programs.
///
/// `run` blocks until the task finishes and may be called from several
/// worker threads at once.
pub trait Emulator: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self, task: &BraketTaskSpecification) -> Result<TaskResult, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RemoteTaskStatus::Created.is_terminal());
        assert!(!RemoteTaskStatus::Running.is_terminal());
        assert!(RemoteTaskStatus::Completed.is_terminal());
        assert!(RemoteTaskStatus::Failed.is_terminal());
        assert!(RemoteTaskStatus::Cancelled.is_terminal());
        assert_eq!(RemoteTaskStatus::Running.to_string(), "running");
    }
}

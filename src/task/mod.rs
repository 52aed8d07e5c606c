// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compiled tasks and the batches that own them.
//!
//! - [`remote`]: tasks dispatched to a [`RemoteBackend`](crate::backend::RemoteBackend)
//! - [`local`]: tasks run against an [`Emulator`](crate::backend::Emulator)
//! - [`batch`]: ordered task collections with submit, pull and run

pub mod batch;
pub mod local;
pub mod remote;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ExecutionConfig;
use crate::error::BackendError;
use crate::submission::TaskResult;

pub use batch::{BatchManifest, LocalBatch, RemoteBatch, TaskManifest};
pub use local::LocalTask;
pub use remote::RemoteTask;

/// Lifecycle of a task.
///
/// `Created → Submitted → Completed | Failed`. Local tasks go straight from
/// `Created` to a finished state.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Created,
    Submitted,
    Completed(TaskResult),
    Failed(BackendError),
}

impl TaskState {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskState::Created => TaskStatus::Created,
            TaskState::Submitted => TaskStatus::Submitted,
            TaskState::Completed(_) => TaskStatus::Completed,
            TaskState::Failed(_) => TaskStatus::Failed,
        }
    }

    /// Whether the task has a result or a failure cause.
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskState::Completed(_) | TaskState::Failed(_))
    }

    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            TaskState::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&BackendError> {
        match self {
            TaskState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Task state without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Submitted,
    Completed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Created => write!(f, "created"),
            TaskStatus::Submitted => write!(f, "submitted"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// How remote tasks are polled while pulling results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between status checks.
    pub interval: Duration,
    /// How long one pull waits; unfinished tasks stay submitted.
    pub timeout: Duration,
}

impl PollSettings {
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            timeout: config.task_timeout(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::TaskStatusCode;

    #[test]
    fn test_state_accessors() {
        let result = TaskResult {
            task_status: TaskStatusCode::Completed,
            shot_outputs: vec![],
        };
        let completed = TaskState::Completed(result.clone());
        assert!(completed.is_finished());
        assert_eq!(completed.result(), Some(&result));
        assert_eq!(completed.status(), TaskStatus::Completed);

        let failed = TaskState::Failed(BackendError::Timeout("slow".into()));
        assert!(failed.is_finished());
        assert!(failed.result().is_none());
        assert!(matches!(failed.error(), Some(BackendError::Timeout(_))));

        assert!(!TaskState::Submitted.is_finished());
        assert_eq!(TaskStatus::Submitted.to_string(), "submitted");
    }

    #[test]
    fn test_poll_settings_from_config() {
        let config = ExecutionConfig {
            poll_interval_ms: 250,
            task_timeout_secs: 12,
            ..Default::default()
        };
        let poll = PollSettings::from_config(&config);
        assert_eq!(poll.interval, Duration::from_millis(250));
        assert_eq!(poll.timeout, Duration::from_secs(12));
    }
}

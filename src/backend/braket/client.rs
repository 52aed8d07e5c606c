// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP client abstraction for the AWS Braket API.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::BackendError;
use crate::submission::{ShotResult, ShotStatus, TaskResult, TaskStatusCode};

use super::{BraketTaskRequest, BraketTaskResult};

/// Trait for Braket HTTP operations.
#[async_trait]
pub trait BraketHttpClient: Send + Sync {
    /// Create a quantum task.
    async fn create_task(&self, request: &BraketTaskRequest) -> Result<String, BackendError>;

    /// Get task status and, once completed, its result.
    async fn get_task(&self, task_id: &str) -> Result<BraketTaskResult, BackendError>;
}

/// Mock Braket client for testing.
///
/// Task ids are `mock-task-{n}`, numbered by submission attempt from 0.
/// Each task reports `RUNNING` for a configurable number of polls, then
/// `COMPLETED` with one shot per requested shot whose sequences equal the
/// register filling.
#[derive(Default)]
pub struct MockBraketClient {
    pending_polls: usize,
    failing: HashSet<usize>,
    rejected: HashSet<usize>,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    attempts: usize,
    submitted: Vec<BraketTaskRequest>,
    tasks: HashMap<String, MockTask>,
}

struct MockTask {
    number: usize,
    request: BraketTaskRequest,
    polls: usize,
}

impl MockBraketClient {
    /// Report `RUNNING` this many times before finishing.
    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Submission attempt `n` reports `FAILED` once finished.
    pub fn with_failing_task(mut self, n: usize) -> Self {
        self.failing.insert(n);
        self
    }

    /// Submission attempt `n` is rejected.
    pub fn with_rejected_submission(mut self, n: usize) -> Self {
        self.rejected.insert(n);
        self
    }

    /// Requests accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<BraketTaskRequest> {
        self.state.lock().submitted.clone()
    }
}

#[async_trait]
impl BraketHttpClient for MockBraketClient {
    async fn create_task(&self, request: &BraketTaskRequest) -> Result<String, BackendError> {
        let mut state = self.state.lock();
        let number = state.attempts;
        state.attempts += 1;
        if self.rejected.contains(&number) {
            return Err(BackendError::InvalidRequest(format!(
                "mock rejected submission {number}"
            )));
        }

        let task_id = format!("mock-task-{number}");
        state.submitted.push(request.clone());
        state.tasks.insert(
            task_id.clone(),
            MockTask {
                number,
                request: request.clone(),
                polls: 0,
            },
        );
        Ok(task_id)
    }

    async fn get_task(&self, task_id: &str) -> Result<BraketTaskResult, BackendError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| BackendError::NotFound(format!("Unknown task {task_id}")))?;
        task.polls += 1;

        if task.polls <= self.pending_polls {
            return Ok(BraketTaskResult {
                status: "RUNNING".into(),
                result: None,
            });
        }
        if self.failing.contains(&task.number) {
            return Ok(BraketTaskResult {
                status: "FAILED".into(),
                result: None,
            });
        }

        let filling = task.request.action.setup.ahs_register.filling.clone();
        let shot = ShotResult {
            shot_status: ShotStatus::Completed,
            pre_sequence: filling.clone(),
            post_sequence: filling,
        };
        Ok(BraketTaskResult {
            status: "COMPLETED".into(),
            result: Some(TaskResult {
                task_status: TaskStatusCode::Completed,
                shot_outputs: vec![shot; task.request.shots as usize],
            }),
        })
    }
}

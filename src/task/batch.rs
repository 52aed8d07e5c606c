// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batches of compiled tasks.
//!
//! A batch owns its tasks in batch index order. Execution never reorders
//! them: shuffled dispatch, out-of-order remote completion and parallel
//! local runs all write back to the task at its original index.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::local::LocalTask;
use super::remote::RemoteTask;
use super::{PollSettings, TaskState, TaskStatus};
use crate::backend::Emulator;
use crate::codegen::ClusterResult;
use crate::error::{BackendError, Error, Result};
use crate::params::AssignmentMap;
use crate::routine::Source;
use crate::submission::TaskResult;

/// Summary of one task, as written to a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskManifest {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub status: TaskStatus,
    pub parameters: AssignmentMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitstring_counts: Option<BTreeMap<String, usize>>,
}

impl TaskManifest {
    fn new(index: usize, task_id: Option<&str>, parameters: &AssignmentMap, state: &TaskState) -> Self {
        Self {
            index,
            task_id: task_id.map(str::to_string),
            status: state.status(),
            parameters: parameters.clone(),
            error: state.error().map(ToString::to_string),
            bitstring_counts: state.result().map(TaskResult::bitstring_counts),
        }
    }
}

/// Serializable summary of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub tasks: Vec<TaskManifest>,
}

impl BatchManifest {
    /// Write as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), tasks = self.tasks.len(), "Wrote batch manifest");
        Ok(())
    }

    /// Read a manifest written by [`BatchManifest::write`].
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Tasks compiled for a remote backend.
#[derive(Debug)]
pub struct RemoteBatch {
    id: Uuid,
    name: Option<String>,
    source: Arc<Source>,
    tasks: Vec<RemoteTask>,
    poll: PollSettings,
}

impl RemoteBatch {
    pub fn new(
        source: Arc<Source>,
        tasks: Vec<RemoteTask>,
        name: Option<String>,
        poll: PollSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            source,
            tasks,
            poll,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The program this batch was compiled from.
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Tasks in batch index order.
    pub fn tasks(&self) -> &[RemoteTask] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&RemoteTask> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Dispatch every created task.
    ///
    /// Tasks go out in index order, or in random order when `shuffle` is
    /// set. Dispatch failures are recorded on the task and do not stop the
    /// rest of the batch.
    #[instrument(skip(self), fields(batch = %self.id, tasks = self.tasks.len()))]
    pub async fn submit(&mut self, shuffle: bool) -> &mut Self {
        let mut order: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.status() == TaskStatus::Created)
            .map(|(index, _)| index)
            .collect();
        if shuffle {
            order.shuffle(&mut rand::thread_rng());
        }

        for index in order {
            if let Err(e) = self.tasks[index].submit().await {
                warn!(index, error = %e, "Task submission failed");
            }
        }

        info!(
            submitted = self.count(TaskStatus::Submitted),
            failed = self.count(TaskStatus::Failed),
            "Batch submitted"
        );
        self
    }

    /// Wait for every submitted task to finish.
    ///
    /// Tasks are polled concurrently and may finish in any order. Tasks
    /// still running at the poll timeout stay submitted; pull again to keep
    /// waiting for them.
    #[instrument(skip(self), fields(batch = %self.id, tasks = self.tasks.len()))]
    pub async fn pull(&mut self) -> &mut Self {
        let poll = self.poll;
        let timed_out = join_all(self.tasks.iter_mut().map(|task| task.pull(&poll)))
            .await
            .into_iter()
            .filter(std::result::Result::is_err)
            .count();

        info!(
            completed = self.count(TaskStatus::Completed),
            failed = self.count(TaskStatus::Failed),
            pending = timed_out,
            "Batch pulled"
        );
        self
    }

    /// Check every submitted task once without waiting.
    pub async fn fetch(&mut self) -> &mut Self {
        join_all(self.tasks.iter_mut().map(|task| task.fetch())).await;
        self
    }

    /// Indices of completed tasks.
    pub fn completed_tasks(&self) -> Vec<usize> {
        self.indices(TaskStatus::Completed)
    }

    /// Indices of failed tasks with their causes.
    pub fn failed_tasks(&self) -> Vec<(usize, &BackendError)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| task.state().error().map(|e| (index, e)))
            .collect()
    }

    /// Results in batch index order, `None` for unfinished or failed tasks.
    pub fn results(&self) -> Vec<Option<&TaskResult>> {
        self.tasks.iter().map(RemoteTask::result).collect()
    }

    /// Per-cluster results of every completed task, in batch index order.
    ///
    /// Tasks without a parallel decoder contribute nothing.
    pub fn cluster_results(&self) -> Vec<(usize, Vec<ClusterResult>)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| task.cluster_results().map(|r| (index, r)))
            .collect()
    }

    pub fn manifest(&self) -> BatchManifest {
        BatchManifest {
            id: self.id,
            name: self.name.clone(),
            tasks: self
                .tasks
                .iter()
                .enumerate()
                .map(|(index, task)| {
                    TaskManifest::new(index, task.task_id(), task.parameters(), task.state())
                })
                .collect(),
        }
    }

    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        self.manifest().write(path)
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }

    fn indices(&self, status: TaskStatus) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.status() == status)
            .map(|(index, _)| index)
            .collect()
    }
}

/// Tasks compiled for a local emulator.
#[derive(Debug)]
pub struct LocalBatch {
    id: Uuid,
    name: Option<String>,
    source: Arc<Source>,
    tasks: Vec<LocalTask>,
}

impl LocalBatch {
    pub fn new(source: Arc<Source>, tasks: Vec<LocalTask>, name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            source,
            tasks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Tasks in batch index order.
    pub fn tasks(&self) -> &[LocalTask] {
        &self.tasks
    }

    pub fn task(&self, index: usize) -> Option<&LocalTask> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every created task on `emulator`.
    ///
    /// With `multiprocessing`, tasks run on a pool of `num_workers` threads
    /// (one per CPU if unset). Each outcome is stored on the task at its
    /// original index, whatever order the workers finish in.
    ///
    /// # Errors
    ///
    /// `Config` if `num_workers` is zero or the pool cannot be started.
    /// Emulator failures are recorded per task.
    #[instrument(skip(self, emulator), fields(batch = %self.id, tasks = self.tasks.len(), emulator = emulator.name()))]
    pub fn run(
        &mut self,
        emulator: &dyn Emulator,
        multiprocessing: bool,
        num_workers: Option<usize>,
    ) -> Result<&mut Self> {
        let pending: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| task.status() == TaskStatus::Created)
            .map(|(index, _)| index)
            .collect();

        let tasks = &self.tasks;
        let outcomes: Vec<(usize, std::result::Result<TaskResult, BackendError>)> =
            if multiprocessing {
                if num_workers == Some(0) {
                    return Err(Error::Config("num_workers must be positive".into()));
                }
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_workers.unwrap_or(0))
                    .build()
                    .map_err(|e| Error::Config(format!("Failed to start worker pool: {}", e)))?;
                info!(workers = pool.current_num_threads(), "Running tasks in parallel");
                pool.install(|| {
                    pending
                        .par_iter()
                        .map(|&index| (index, tasks[index].execute(emulator)))
                        .collect()
                })
            } else {
                pending
                    .iter()
                    .map(|&index| (index, tasks[index].execute(emulator)))
                    .collect()
            };

        for (index, outcome) in outcomes {
            self.tasks[index].finish(outcome);
        }

        info!(
            completed = self.tasks.iter().filter(|t| t.status() == TaskStatus::Completed).count(),
            failed = self.tasks.iter().filter(|t| t.status() == TaskStatus::Failed).count(),
            "Batch run finished"
        );
        Ok(self)
    }

    /// Results in batch index order, `None` for failed or unrun tasks.
    pub fn results(&self) -> Vec<Option<&TaskResult>> {
        self.tasks.iter().map(LocalTask::result).collect()
    }

    pub fn failed_tasks(&self) -> Vec<(usize, &BackendError)> {
        self.tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| task.state().error().map(|e| (index, e)))
            .collect()
    }

    pub fn manifest(&self) -> BatchManifest {
        BatchManifest {
            id: self.id,
            name: self.name.clone(),
            tasks: self
                .tasks
                .iter()
                .enumerate()
                .map(|(index, task)| TaskManifest::new(index, None, task.parameters(), task.state()))
                .collect(),
        }
    }

    pub fn write_manifest(&self, path: &Path) -> Result<()> {
        self.manifest().write(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBraketClient;
    use crate::codegen::to_braket_task_ir;
    use crate::params::AssignmentValue;
    use crate::test_utils::{mock_remote_backend, sample_source, sample_task, MockEmulator};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn bound(index: usize) -> AssignmentMap {
        let mut map = AssignmentMap::new();
        map.insert("i".into(), AssignmentValue::Scalar(Decimal::from(index)));
        map
    }

    fn remote_batch(n: usize, client: MockBraketClient) -> RemoteBatch {
        let backend = mock_remote_backend(client);
        let tasks = (0..n)
            .map(|i| RemoteTask::new(bound(i), sample_task(i as u32 + 1), None, backend.clone()))
            .collect();
        let poll = PollSettings {
            interval: Duration::from_millis(5),
            timeout: Duration::from_secs(5),
        };
        RemoteBatch::new(Arc::new(sample_source()), tasks, Some("sweep".into()), poll)
    }

    fn local_batch(n: usize) -> LocalBatch {
        let tasks = (0..n)
            .map(|i| LocalTask::new(bound(i), to_braket_task_ir(&sample_task(i as u32 + 1))))
            .collect();
        LocalBatch::new(Arc::new(sample_source()), tasks, None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_and_pull() {
        let mut batch = remote_batch(3, MockBraketClient::default().with_pending_polls(2));
        batch.submit(false).await;
        assert!(batch.tasks().iter().all(|t| t.status() == TaskStatus::Submitted));
        assert_eq!(batch.task(2).unwrap().task_id(), Some("mock-task-2"));

        batch.pull().await;
        assert_eq!(batch.completed_tasks(), vec![0, 1, 2]);
        let shots: Vec<usize> = batch
            .results()
            .into_iter()
            .map(|r| r.unwrap().shot_outputs.len())
            .collect();
        assert_eq!(shots, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_shuffled_submit_keeps_indices() {
        let mut batch = remote_batch(8, MockBraketClient::default());
        batch.submit(true).await;

        assert!(batch.tasks().iter().all(|t| t.task_id().is_some()));

        batch.pull().await;
        for (index, result) in batch.results().into_iter().enumerate() {
            assert_eq!(result.unwrap().shot_outputs.len(), index + 1);
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let client = MockBraketClient::default()
            .with_rejected_submission(0)
            .with_failing_task(2);
        let mut batch = remote_batch(3, client);
        batch.submit(false).await;
        batch.pull().await;

        assert_eq!(batch.completed_tasks(), vec![1]);
        let failed = batch.failed_tasks();
        assert_eq!(failed.len(), 2);
        assert!(matches!(failed[0], (0, BackendError::InvalidRequest(_))));
        assert!(matches!(failed[1], (2, BackendError::ExecutionFailed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pull_resumes_after_timeout() {
        let mut batch = remote_batch(2, MockBraketClient::default().with_pending_polls(3));
        batch.poll = PollSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_millis(15),
        };
        batch.submit(false).await;

        batch.pull().await;
        assert!(batch.completed_tasks().is_empty());
        assert!(batch.failed_tasks().is_empty());
        assert!(batch.tasks().iter().all(|t| t.status() == TaskStatus::Submitted));

        batch.poll.timeout = Duration::from_secs(5);
        batch.pull().await;
        assert_eq!(batch.completed_tasks(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_second_submit_is_noop() {
        let mut batch = remote_batch(2, MockBraketClient::default());
        batch.submit(false).await;
        batch.submit(false).await;
        assert_eq!(batch.task(1).unwrap().task_id(), Some("mock-task-1"));
    }

    #[tokio::test]
    async fn test_fetch() {
        let mut batch = remote_batch(2, MockBraketClient::default().with_pending_polls(1));
        batch.submit(false).await;
        batch.fetch().await;
        assert!(batch.completed_tasks().is_empty());
        batch.fetch().await;
        assert_eq!(batch.completed_tasks(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_manifest_round_trip() {
        let mut batch = remote_batch(2, MockBraketClient::default().with_failing_task(1));
        batch.submit(false).await;
        batch.pull().await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        batch.write_manifest(&path).unwrap();

        let manifest = BatchManifest::read(&path).unwrap();
        assert_eq!(manifest, batch.manifest());
        assert_eq!(manifest.name.as_deref(), Some("sweep"));
        assert_eq!(manifest.tasks[0].status, TaskStatus::Completed);
        assert_eq!(manifest.tasks[0].task_id.as_deref(), Some("mock-task-0"));
        assert_eq!(manifest.tasks[0].bitstring_counts.as_ref().unwrap().len(), 1);
        assert_eq!(manifest.tasks[1].status, TaskStatus::Failed);
        assert!(manifest.tasks[1].error.is_some());
    }

    #[test]
    fn test_local_sequential_run() {
        let emulator = MockEmulator::echo();
        let mut batch = local_batch(3);
        batch.run(&emulator, false, None).unwrap();
        let shots: Vec<usize> = batch
            .results()
            .into_iter()
            .map(|r| r.unwrap().shot_outputs.len())
            .collect();
        assert_eq!(shots, vec![1, 2, 3]);
        assert!(batch.failed_tasks().is_empty());
    }

    #[test]
    fn test_local_parallel_run_preserves_order() {
        let emulator = MockEmulator::echo().with_random_delay(Duration::from_millis(20));
        let mut batch = local_batch(10);
        batch.run(&emulator, true, Some(4)).unwrap();

        assert_eq!(emulator.runs(), 10);
        for (index, result) in batch.results().into_iter().enumerate() {
            assert_eq!(result.unwrap().shot_outputs.len(), index + 1);
        }
    }

    #[test]
    fn test_local_zero_workers_rejected() {
        let emulator = MockEmulator::echo();
        let mut batch = local_batch(2);
        let err = batch.run(&emulator, true, Some(0)).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("num_workers")));
        assert_eq!(emulator.runs(), 0);
    }

    #[test]
    fn test_local_tasks_run_once() {
        let emulator = MockEmulator::echo();
        let mut batch = local_batch(2);
        batch.run(&emulator, false, None).unwrap();
        batch.run(&emulator, true, Some(2)).unwrap();
        assert_eq!(emulator.runs(), 2);
    }
}

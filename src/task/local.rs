// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tasks executed by a local emulator.

use tracing::{debug, warn};

use super::{TaskState, TaskStatus};
use crate::backend::Emulator;
use crate::codegen::BraketTaskSpecification;
use crate::error::BackendError;
use crate::params::AssignmentMap;
use crate::submission::TaskResult;

/// One emulator task.
#[derive(Debug, Clone)]
pub struct LocalTask {
    parameters: AssignmentMap,
    task_ir: BraketTaskSpecification,
    state: TaskState,
}

impl LocalTask {
    pub fn new(parameters: AssignmentMap, task_ir: BraketTaskSpecification) -> Self {
        Self {
            parameters,
            task_ir,
            state: TaskState::Created,
        }
    }

    pub fn parameters(&self) -> &AssignmentMap {
        &self.parameters
    }

    pub fn task_ir(&self) -> &BraketTaskSpecification {
        &self.task_ir
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

    /// Run on `emulator` and store the outcome.
    ///
    /// Finished tasks are not run again.
    pub fn run(&mut self, emulator: &dyn Emulator) -> TaskStatus {
        if matches!(self.state, TaskState::Created) {
            let outcome = self.execute(emulator);
            self.finish(outcome);
        }
        self.status()
    }

    /// Run on `emulator` without touching the task.
    pub(crate) fn execute(&self, emulator: &dyn Emulator) -> Result<TaskResult, BackendError> {
        debug!(emulator = emulator.name(), shots = self.task_ir.nshots, "Running task");
        emulator.run(&self.task_ir)
    }

    pub(crate) fn finish(&mut self, outcome: Result<TaskResult, BackendError>) {
        self.state = match outcome {
            Ok(result) => TaskState::Completed(result),
            Err(e) => {
                warn!(error = %e, "Emulator task failed");
                TaskState::Failed(e)
            }
        };
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Braket hardware and local emulator routes.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use super::base::{compile_tasks, Routine, Source};
use crate::backend::{Emulator, RemoteBackend};
use crate::codegen::to_braket_task_ir;
use crate::config::{Config, EmulatorConfig, ResourceLimits};
use crate::error::CompileError;
use crate::params::RawValue;
use crate::task::{LocalBatch, LocalTask, PollSettings, RemoteBatch, RemoteTask};

/// Route selection for a [`Source`] targeting Braket.
#[derive(Debug, Clone)]
pub struct BraketServiceOptions {
    source: Arc<Source>,
    limits: ResourceLimits,
    poll: PollSettings,
    shuffle: bool,
    emulator: EmulatorConfig,
}

impl BraketServiceOptions {
    pub(crate) fn new(source: Source) -> Self {
        Self {
            source: Arc::new(source),
            limits: ResourceLimits::default(),
            poll: PollSettings::default(),
            shuffle: false,
            emulator: EmulatorConfig::default(),
        }
    }

    /// Take resource limits, polling settings and the run defaults used by
    /// `run_configured` from `config`.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.limits = config.validation.limits.clone();
        self.poll = PollSettings::from_config(&config.execution);
        self.shuffle = config.execution.shuffle;
        self.emulator = config.backends.emulator.clone();
        self
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Route to QuEra Aquila through `backend`.
    pub fn aquila(self, backend: Arc<dyn RemoteBackend>) -> BraketHardwareRoutine {
        BraketHardwareRoutine {
            source: self.source,
            backend,
            limits: self.limits,
            poll: self.poll,
            shuffle: self.shuffle,
        }
    }

    /// Route to a local emulator.
    pub fn local_emulator(self, emulator: Arc<dyn Emulator>) -> BraketLocalEmulatorRoutine {
        BraketLocalEmulatorRoutine {
            source: self.source,
            emulator,
            limits: self.limits,
            defaults: self.emulator,
        }
    }
}

/// Compiles discretized tasks and runs them on a remote device.
pub struct BraketHardwareRoutine {
    source: Arc<Source>,
    backend: Arc<dyn RemoteBackend>,
    limits: ResourceLimits,
    poll: PollSettings,
    shuffle: bool,
}

impl fmt::Debug for BraketHardwareRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BraketHardwareRoutine")
            .field("backend", &self.backend.name())
            .field("limits", &self.limits)
            .field("poll", &self.poll)
            .field("shuffle", &self.shuffle)
            .finish_non_exhaustive()
    }
}

impl Routine for BraketHardwareRoutine {
    type Batch = RemoteBatch;

    fn source(&self) -> &Source {
        &self.source
    }

    #[instrument(skip(self, args), fields(backend = self.backend.name()))]
    fn compile(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> Result<RemoteBatch, CompileError> {
        let capabilities = self.backend.capabilities();
        let tasks = compile_tasks(&self.source, shots, args, Some(capabilities), &self.limits)?
            .into_iter()
            .map(|task| {
                RemoteTask::new(
                    task.parameters,
                    task.task_ir,
                    task.parallel_decoder,
                    Arc::clone(&self.backend),
                )
            })
            .collect();

        Ok(RemoteBatch::new(
            Arc::clone(&self.source),
            tasks,
            name.map(str::to_string),
            self.poll,
        ))
    }
}

impl BraketHardwareRoutine {
    /// Compile and dispatch without waiting for results.
    pub async fn submit(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
        shuffle: bool,
    ) -> Result<RemoteBatch, CompileError> {
        let mut batch = self.compile(shots, args, name)?;
        batch.submit(shuffle).await;
        Ok(batch)
    }

    /// Compile, dispatch and wait for every task.
    pub async fn run(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
        shuffle: bool,
    ) -> Result<RemoteBatch, CompileError> {
        let mut batch = self.submit(shots, args, name, shuffle).await?;
        batch.pull().await;
        Ok(batch)
    }

    /// [`submit`](Self::submit) with the configured dispatch order.
    pub async fn submit_configured(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> Result<RemoteBatch, CompileError> {
        self.submit(shots, args, name, self.shuffle).await
    }

    /// [`run`](Self::run) with the configured dispatch order.
    pub async fn run_configured(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> Result<RemoteBatch, CompileError> {
        self.run(shots, args, name, self.shuffle).await
    }
}

/// Compile emulator tasks for `source`, without discretization.
///
/// # Errors
///
/// `UnsupportedFeature` for a parallel register, before anything is
/// compiled, as well as any error of the shared pipeline.
pub fn compile_local_tasks(
    source: &Source,
    shots: u32,
    args: &[RawValue],
    limits: &ResourceLimits,
) -> Result<Vec<LocalTask>, CompileError> {
    if source.circuit().register.is_parallel() {
        return Err(CompileError::UnsupportedFeature(
            "parallel registers are not supported by local emulation".into(),
        ));
    }

    Ok(compile_tasks(source, shots, args, None, limits)?
        .into_iter()
        .map(|task| LocalTask::new(task.parameters, to_braket_task_ir(&task.task_ir)))
        .collect())
}

/// Compiles tasks for, and runs them on, a local emulator.
pub struct BraketLocalEmulatorRoutine {
    source: Arc<Source>,
    emulator: Arc<dyn Emulator>,
    limits: ResourceLimits,
    defaults: EmulatorConfig,
}

impl fmt::Debug for BraketLocalEmulatorRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BraketLocalEmulatorRoutine")
            .field("emulator", &self.emulator.name())
            .field("limits", &self.limits)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Routine for BraketLocalEmulatorRoutine {
    type Batch = LocalBatch;

    fn source(&self) -> &Source {
        &self.source
    }

    /// Compile without discretization; see [`compile_local_tasks`].
    #[instrument(skip(self, args), fields(emulator = self.emulator.name()))]
    fn compile(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> Result<LocalBatch, CompileError> {
        let tasks = compile_local_tasks(&self.source, shots, args, &self.limits)?;
        Ok(LocalBatch::new(
            Arc::clone(&self.source),
            tasks,
            name.map(str::to_string),
        ))
    }
}

impl BraketLocalEmulatorRoutine {
    /// Compile and run every task.
    ///
    /// # Errors
    ///
    /// Compile errors, or `Config` for a zero `num_workers`.
    pub fn run(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
        multiprocessing: bool,
        num_workers: Option<usize>,
    ) -> crate::Result<LocalBatch> {
        let mut batch = self.compile(shots, args, name)?;
        batch.run(self.emulator.as_ref(), multiprocessing, num_workers)?;
        info!(tasks = batch.len(), "Local run finished");
        Ok(batch)
    }

    /// [`run`](Self::run) with the configured worker pool settings.
    pub fn run_configured(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> crate::Result<LocalBatch> {
        self.run(
            shots,
            args,
            name,
            self.defaults.multiprocessing,
            self.defaults.num_workers,
        )
    }
}

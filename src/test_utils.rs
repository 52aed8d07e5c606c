// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test utilities for compiler and execution tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;

use crate::backend::{BraketBackend, Emulator, MockBraketClient, RemoteBackend};
use crate::codegen::BraketTaskSpecification;
use crate::config::BraketConfig;
use crate::error::BackendError;
use crate::ir::{AnalogCircuit, AtomArrangement, Field, Pulse, Sequence, Waveform};
use crate::routine::Source;
use crate::submission::{
    Capabilities, DetuningField, EffectiveHamiltonian, GlobalField, Lattice, RydbergHamiltonian,
    ShotResult, ShotStatus, TaskResult, TaskSpecification, TaskStatusCode, TimeSeries,
};

/// A Braket backend with Aquila capabilities over a mock client.
pub fn mock_remote_backend(client: MockBraketClient) -> Arc<dyn RemoteBackend> {
    let config = BraketConfig {
        enabled: true,
        ..Default::default()
    };
    Arc::new(BraketBackend::with_client(&config, Capabilities::aquila(), client))
}

/// Ramp up, hold and ramp down over 4 µs, peaking at 1.
pub fn aquila_ramp() -> Waveform {
    Waveform::piecewise_linear(
        [Decimal::new(1, 1), Decimal::new(38, 1), Decimal::new(1, 1)],
        [Decimal::ZERO, Decimal::ONE, Decimal::ONE, Decimal::ZERO],
    )
}

/// A fully bound two-atom program.
pub fn sample_source() -> Source {
    let pulse = Pulse::default()
        .with_rabi_amplitude(Field::uniform(aquila_ramp().scale(Decimal::new(25, 1))))
        .with_detuning(Field::uniform(Waveform::linear(-10, 10, 4)));
    let circuit = AnalogCircuit::new(
        AtomArrangement::chain(2, Decimal::new(61, 1)),
        Sequence::rydberg(pulse),
    );
    Source::new(circuit).expect("sample program is well formed")
}

/// A two-site task with an empty schedule; the second site is vacant.
pub fn sample_task(shots: u32) -> TaskSpecification {
    let series = TimeSeries::zero(Decimal::new(4, 6));
    TaskSpecification {
        nshots: shots,
        lattice: Lattice {
            sites: vec![
                (Decimal::ZERO, Decimal::ZERO),
                (Decimal::new(61, 7), Decimal::ZERO),
            ],
            filling: vec![1, 0],
        },
        effective_hamiltonian: EffectiveHamiltonian {
            rydberg: RydbergHamiltonian {
                rabi_frequency_amplitude: GlobalField {
                    global: series.clone(),
                },
                rabi_frequency_phase: GlobalField {
                    global: series.clone(),
                },
                detuning: DetuningField {
                    global: series,
                    local: None,
                },
            },
        },
    }
}

/// `shots` completed shots that measure every atom in its initial state.
pub fn echo_result(task: &BraketTaskSpecification, shots: u32) -> TaskResult {
    let filling = task.program.setup.ahs_register.filling.clone();
    TaskResult {
        task_status: TaskStatusCode::Completed,
        shot_outputs: vec![
            ShotResult {
                shot_status: ShotStatus::Completed,
                pre_sequence: filling.clone(),
                post_sequence: filling,
            };
            shots as usize
        ],
    }
}

type Behavior = dyn Fn(&BraketTaskSpecification) -> Result<TaskResult, BackendError> + Send + Sync;

/// Emulator driven by a closure, with optional random run times.
pub struct MockEmulator {
    behavior: Box<Behavior>,
    max_delay: Option<Duration>,
    runs: AtomicUsize,
}

impl MockEmulator {
    pub fn new<F>(behavior: F) -> Self
    where
        F: Fn(&BraketTaskSpecification) -> Result<TaskResult, BackendError> + Send + Sync + 'static,
    {
        Self {
            behavior: Box::new(behavior),
            max_delay: None,
            runs: AtomicUsize::new(0),
        }
    }

    /// Returns `nshots` shots echoing the register filling.
    pub fn echo() -> Self {
        Self::new(|task| Ok(echo_result(task, task.nshots)))
    }

    /// Sleep a random time up to `max_delay` in every run.
    pub fn with_random_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Number of runs so far.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Emulator for MockEmulator {
    fn name(&self) -> &str {
        "mock_emulator"
    }

    fn run(&self, task: &BraketTaskSpecification) -> Result<TaskResult, BackendError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(max_delay) = self.max_delay {
            let millis = rand::thread_rng().gen_range(0..=max_delay.as_millis() as u64);
            std::thread::sleep(Duration::from_millis(millis));
        }
        (self.behavior)(task)
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Program sources and the shared compile pipeline.

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::braket::BraketServiceOptions;
use crate::codegen::{assign_circuit, AssignmentScan, ParallelDecoder, QuEraCodeGen};
use crate::config::ResourceLimits;
use crate::error::CompileError;
use crate::ir::{derive_param_spec, AnalogCircuit, ParamSpec};
use crate::params::{AssignmentMap, AssignmentSet, Params, RawValue};
use crate::submission::{Capabilities, TaskSpecification};
use crate::validation::{validate_batch_size, validate_shots};

/// A program together with its parameter spec and assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    circuit: AnalogCircuit,
    spec: ParamSpec,
    assignments: AssignmentSet,
    flattened: Option<Vec<String>>,
}

impl Source {
    /// Wrap a finished program, deriving its parameter spec.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if a name is used both as a scalar and a vector.
    pub fn new(circuit: AnalogCircuit) -> Result<Self, CompileError> {
        let spec = derive_param_spec(&circuit)?;
        debug!(
            params = spec.len(),
            recorded = spec.recorded().len(),
            parallel = circuit.register.is_parallel(),
            "Derived parameter spec"
        );
        Ok(Self {
            circuit,
            spec,
            assignments: AssignmentSet::new(),
            flattened: None,
        })
    }

    /// Parse a program from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(Self::new(AnalogCircuit::from_json(json)?)?)
    }

    pub fn circuit(&self) -> &AnalogCircuit {
        &self.circuit
    }

    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    pub fn assignments(&self) -> &AssignmentSet {
        &self.assignments
    }

    /// Bind values shared by every task.
    pub fn assign<I, K, V>(mut self, assignments: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        self.assignments = std::mem::take(&mut self.assignments).with_assign(&self.spec, assignments)?;
        Ok(self)
    }

    /// Bind one value per task.
    pub fn batch_assign<I, K, V>(mut self, assignments: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        self.assignments =
            std::mem::take(&mut self.assignments).with_batch_assign(&self.spec, assignments)?;
        Ok(self)
    }

    /// Set the names bound by positional compile args, in order.
    ///
    /// # Errors
    ///
    /// `TypeKind` for a name the program does not read, and
    /// `DuplicateAssignment` for a name already assigned or listed twice.
    pub fn flatten<I, S>(mut self, names: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flattened: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !self.spec.contains(&name) || self.spec.is_recorded(&name) {
                return Err(CompileError::type_kind(
                    name,
                    "program parameter",
                    "unknown name",
                ));
            }
            if self.assignments.is_assigned(&name) || flattened.contains(&name) {
                return Err(CompileError::DuplicateAssignment(name));
            }
            flattened.push(name);
        }
        self.flattened = Some(flattened);
        Ok(self)
    }

    /// Names bound by positional compile args.
    ///
    /// Unless set with [`Source::flatten`], these are the parameters that
    /// are neither assigned nor recorded, in first-encounter order.
    pub fn args(&self) -> Vec<String> {
        match &self.flattened {
            Some(names) => names.clone(),
            None => self
                .spec
                .names()
                .filter(|name| !self.assignments.is_assigned(name) && !self.spec.is_recorded(name))
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn params(&self) -> Params {
        Params::new(&self.spec, &self.assignments, &self.args())
    }

    /// Routes targeting AWS Braket.
    pub fn braket(self) -> BraketServiceOptions {
        BraketServiceOptions::new(self)
    }
}

/// One task produced by the compile pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledTask {
    pub parameters: AssignmentMap,
    pub task_ir: TaskSpecification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_decoder: Option<ParallelDecoder>,
}

/// Compile one task per batch index.
///
/// Static assignments are bound once; each index then has its recorded
/// values scanned, is fully bound and lowered. Tasks are discretized when
/// `capabilities` is given. The first error aborts the whole compile.
#[instrument(skip_all, fields(shots = shots, args = args.len()))]
pub fn compile_tasks(
    source: &Source,
    shots: u32,
    args: &[RawValue],
    capabilities: Option<&Capabilities>,
    limits: &ResourceLimits,
) -> Result<Vec<CompiledTask>, CompileError> {
    validate_shots(shots, limits)?;
    let params = source.params();
    validate_batch_size(params.batch_size(), limits)?;

    let circuit = assign_circuit(source.circuit(), params.static_params());
    let codegen = QuEraCodeGen::new(capabilities);

    let tasks = params
        .batch_assignments(args)?
        .map(|parameters| {
            let final_params = AssignmentScan::new(parameters.clone()).emit(&circuit)?;
            let bound = assign_circuit(&circuit, &final_params);
            let (task_ir, parallel_decoder) = codegen.emit(shots, &bound)?;
            let task_ir = match capabilities {
                Some(capabilities) => task_ir.discretize(capabilities)?,
                None => task_ir,
            };
            Ok(CompiledTask {
                parameters,
                task_ir,
                parallel_decoder,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    info!(tasks = tasks.len(), discretized = capabilities.is_some(), "Compiled batch");
    Ok(tasks)
}

/// Shared compile contract of the execution routes.
pub trait Routine {
    type Batch;

    /// The program being compiled.
    fn source(&self) -> &Source;

    /// Compile one task per batch index.
    ///
    /// `args` bind the names of [`Source::args`] positionally.
    fn compile(
        &self,
        shots: u32,
        args: &[RawValue],
        name: Option<&str>,
    ) -> Result<Self::Batch, CompileError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AtomArrangement, Field, Pulse, Scalar, Sequence, Waveform};
    use crate::params::AssignmentValue;
    use crate::test_utils::sample_source;
    use rust_decimal_macros::dec;

    fn recorded_source() -> Source {
        let amplitude = Waveform::piecewise_linear(
            [Scalar::from(dec!(0.1)), Scalar::var("t"), Scalar::from(dec!(0.1))],
            [
                Scalar::from(dec!(0)),
                Scalar::var("omega"),
                Scalar::var("omega"),
                Scalar::from(dec!(0)),
            ],
        );
        let detuning = Waveform::constant(Scalar::var("delta"), Scalar::var("t").add(dec!(0.2)))
            .record("final_delta");
        let phase = Waveform::constant(
            Scalar::var("final_delta").mul(dec!(0.01)),
            Scalar::var("t").add(dec!(0.2)),
        );
        let pulse = Pulse::default()
            .with_rabi_amplitude(Field::uniform(amplitude))
            .with_detuning(Field::uniform(detuning))
            .with_rabi_phase(Field::uniform(phase));
        Source::new(AnalogCircuit::new(
            AtomArrangement::chain(2, dec!(6.1)),
            Sequence::rydberg(pulse),
        ))
        .unwrap()
    }

    #[test]
    fn test_default_args_skip_assigned_and_recorded() {
        let source = recorded_source().assign([("omega", dec!(15))]).unwrap();
        assert_eq!(source.args(), vec!["delta", "t"]);
    }

    #[test]
    fn test_flatten_order() {
        let source = recorded_source().flatten(["delta", "omega", "t"]).unwrap();
        assert_eq!(source.args(), vec!["delta", "omega", "t"]);
    }

    #[test]
    fn test_flatten_rejects_unknown_and_assigned() {
        assert!(matches!(
            recorded_source().flatten(["nope"]),
            Err(CompileError::TypeKind { .. })
        ));
        assert!(matches!(
            recorded_source().flatten(["final_delta"]),
            Err(CompileError::TypeKind { .. })
        ));
        let assigned = recorded_source().assign([("t", dec!(1))]).unwrap();
        assert_eq!(
            assigned.flatten(["t"]).unwrap_err(),
            CompileError::DuplicateAssignment("t".into())
        );
        assert_eq!(
            recorded_source().flatten(["t", "t"]).unwrap_err(),
            CompileError::DuplicateAssignment("t".into())
        );
    }

    #[test]
    fn test_compile_with_record_and_args() {
        let source = recorded_source()
            .assign([("omega", dec!(15))])
            .unwrap()
            .batch_assign([("delta", vec![dec!(-10), dec!(10)])])
            .unwrap();
        let tasks = compile_tasks(
            &source,
            10,
            &[RawValue::from(dec!(3.6))],
            None,
            &ResourceLimits::default(),
        )
        .unwrap();
        assert_eq!(tasks.len(), 2);

        // Bound maps hold the assigned values, not recorded ones
        assert_eq!(tasks[1].parameters["delta"], AssignmentValue::Scalar(dec!(10)));
        assert_eq!(tasks[1].parameters["t"], AssignmentValue::Scalar(dec!(3.6)));
        assert!(!tasks[1].parameters.contains_key("final_delta"));

        let phase = &tasks[1].task_ir.effective_hamiltonian.rydberg.rabi_frequency_phase;
        assert_eq!(phase.global.values, vec![dec!(0.1), dec!(0.1)]);
        let detuning = &tasks[0].task_ir.effective_hamiltonian.rydberg.detuning;
        assert_eq!(detuning.global.values[0], dec!(-10000000));
    }

    #[test]
    fn test_compile_unbound_parameter() {
        let source = recorded_source().assign([("omega", dec!(15))]).unwrap();
        let err = compile_tasks(
            &source,
            10,
            &[RawValue::from(dec!(3.6))],
            None,
            &ResourceLimits::default(),
        )
        .unwrap_err();
        // The positional arg binds `delta`, the first flattened name
        assert_eq!(source.args(), vec!["delta", "t"]);
        assert_eq!(err, CompileError::UnboundParameter("t".into()));
    }

    #[test]
    fn test_compile_rejects_excess_args() {
        let err = compile_tasks(
            &sample_source(),
            10,
            &[RawValue::from(1)],
            None,
            &ResourceLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::ShapeMismatch(_)));
    }

    #[test]
    fn test_compile_limits() {
        let limits = ResourceLimits {
            max_shots: 100,
            max_batch_size: 2,
        };
        assert!(matches!(
            compile_tasks(&sample_source(), 101, &[], None, &limits),
            Err(CompileError::ResourceLimit { .. })
        ));
        assert_eq!(
            compile_tasks(&sample_source(), 0, &[], None, &limits).unwrap_err(),
            CompileError::InvalidShots(0)
        );

        let batched = recorded_source()
            .assign([("omega", dec!(15)), ("t", dec!(3))])
            .unwrap()
            .batch_assign([("delta", vec![dec!(1), dec!(2), dec!(3)])])
            .unwrap();
        assert!(matches!(
            compile_tasks(&batched, 1, &[], None, &limits),
            Err(CompileError::ResourceLimit { .. })
        ));
    }

    #[test]
    fn test_compile_discretizes_with_capabilities() {
        let caps = Capabilities::aquila();
        let source = recorded_source()
            .assign([("omega", dec!(15)), ("t", dec!(3)), ("delta", dec!(1.23456789))])
            .unwrap();
        let tasks = compile_tasks(&source, 10, &[], Some(&caps), &ResourceLimits::default()).unwrap();
        let detuning = &tasks[0].task_ir.effective_hamiltonian.rydberg.detuning.global;
        assert_eq!(detuning.values[0], dec!(1234567.8));

        let too_many = compile_tasks(&source, 1001, &[], Some(&caps), &ResourceLimits::default());
        assert!(matches!(
            too_many,
            Err(CompileError::CapabilityViolation { .. })
        ));
    }
}

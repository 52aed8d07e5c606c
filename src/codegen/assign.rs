// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Substitution of bound values into a program tree.
//!
//! [`assign_circuit`] returns a new tree in which every variable named in the
//! map becomes an `Assigned` node and every named run-time vector becomes an
//! assigned vector. Names absent from the map stay symbolic. Applying the
//! same map twice gives the same tree.
//!
//! [`AssignmentScan`] evaluates `record` waveforms and extends a map with the
//! recorded final values, so that a second substitution can bind the names
//! they feed.

use tracing::trace;

use super::waveform::final_value;
use crate::error::CompileError;
use crate::ir::{
    AnalogCircuit, AtomArrangement, Drive, Field, LocationScale, ParallelRegister, Pulse,
    Register, Scalar, Sequence, Site, SpatialModulation, Waveform,
};
use crate::params::{AssignmentMap, AssignmentValue};

/// Rebuild a node with values from `map` bound in.
pub trait Assign {
    fn assign(&self, map: &AssignmentMap) -> Self;
}

/// Substitute `map` into `circuit`, leaving the input untouched.
pub fn assign_circuit(circuit: &AnalogCircuit, map: &AssignmentMap) -> AnalogCircuit {
    circuit.assign(map)
}

impl Assign for Scalar {
    fn assign(&self, map: &AssignmentMap) -> Self {
        match self {
            Scalar::Variable { name } => match map.get(name) {
                Some(AssignmentValue::Scalar(value)) => Scalar::Assigned {
                    name: name.clone(),
                    value: *value,
                },
                _ => self.clone(),
            },
            Scalar::Literal { .. } | Scalar::Assigned { .. } => self.clone(),
            Scalar::Neg { expr } => Scalar::Neg {
                expr: Box::new(expr.assign(map)),
            },
            Scalar::Add { lhs, rhs } => Scalar::Add {
                lhs: Box::new(lhs.assign(map)),
                rhs: Box::new(rhs.assign(map)),
            },
            Scalar::Mul { lhs, rhs } => Scalar::Mul {
                lhs: Box::new(lhs.assign(map)),
                rhs: Box::new(rhs.assign(map)),
            },
            Scalar::Div { lhs, rhs } => Scalar::Div {
                lhs: Box::new(lhs.assign(map)),
                rhs: Box::new(rhs.assign(map)),
            },
            Scalar::Min { lhs, rhs } => Scalar::Min {
                lhs: Box::new(lhs.assign(map)),
                rhs: Box::new(rhs.assign(map)),
            },
            Scalar::Max { lhs, rhs } => Scalar::Max {
                lhs: Box::new(lhs.assign(map)),
                rhs: Box::new(rhs.assign(map)),
            },
        }
    }
}

impl<T: Assign> Assign for Vec<T> {
    fn assign(&self, map: &AssignmentMap) -> Self {
        self.iter().map(|item| item.assign(map)).collect()
    }
}

impl<T: Assign> Assign for Option<T> {
    fn assign(&self, map: &AssignmentMap) -> Self {
        self.as_ref().map(|item| item.assign(map))
    }
}

impl Assign for Waveform {
    fn assign(&self, map: &AssignmentMap) -> Self {
        match self {
            Waveform::Constant { value, duration } => Waveform::Constant {
                value: value.assign(map),
                duration: duration.assign(map),
            },
            Waveform::Linear {
                start,
                stop,
                duration,
            } => Waveform::Linear {
                start: start.assign(map),
                stop: stop.assign(map),
                duration: duration.assign(map),
            },
            Waveform::PiecewiseLinear { durations, values } => Waveform::PiecewiseLinear {
                durations: durations.assign(map),
                values: values.assign(map),
            },
            Waveform::PiecewiseConstant { durations, values } => Waveform::PiecewiseConstant {
                durations: durations.assign(map),
                values: values.assign(map),
            },
            Waveform::Append { waveforms } => Waveform::Append {
                waveforms: waveforms.assign(map),
            },
            Waveform::Scale { factor, waveform } => Waveform::Scale {
                factor: factor.assign(map),
                waveform: Box::new(waveform.assign(map)),
            },
            Waveform::Negative { waveform } => Waveform::Negative {
                waveform: Box::new(waveform.assign(map)),
            },
            Waveform::Record { name, waveform } => Waveform::Record {
                name: name.clone(),
                waveform: Box::new(waveform.assign(map)),
            },
        }
    }
}

impl Assign for SpatialModulation {
    fn assign(&self, map: &AssignmentMap) -> Self {
        match self {
            SpatialModulation::RunTimeVector { name } => match map.get(name) {
                Some(AssignmentValue::Vector(values)) => SpatialModulation::AssignedRunTimeVector {
                    name: name.clone(),
                    values: values.clone(),
                },
                _ => self.clone(),
            },
            SpatialModulation::ScaledLocations { locations } => {
                SpatialModulation::ScaledLocations {
                    locations: locations
                        .iter()
                        .map(|location| LocationScale {
                            site: location.site,
                            scale: location.scale.assign(map),
                        })
                        .collect(),
                }
            }
            SpatialModulation::Uniform | SpatialModulation::AssignedRunTimeVector { .. } => {
                self.clone()
            }
        }
    }
}

impl Assign for Field {
    fn assign(&self, map: &AssignmentMap) -> Self {
        Field {
            drives: self
                .drives
                .iter()
                .map(|drive| Drive {
                    modulation: drive.modulation.assign(map),
                    waveform: drive.waveform.assign(map),
                })
                .collect(),
        }
    }
}

impl Assign for Pulse {
    fn assign(&self, map: &AssignmentMap) -> Self {
        Pulse {
            detuning: self.detuning.assign(map),
            rabi_amplitude: self.rabi_amplitude.assign(map),
            rabi_phase: self.rabi_phase.assign(map),
        }
    }
}

impl Assign for Sequence {
    fn assign(&self, map: &AssignmentMap) -> Self {
        Sequence {
            rydberg: self.rydberg.assign(map),
            hyperfine: self.hyperfine.assign(map),
        }
    }
}

impl Assign for Site {
    fn assign(&self, map: &AssignmentMap) -> Self {
        Site {
            x: self.x.assign(map),
            y: self.y.assign(map),
            filled: self.filled,
        }
    }
}

impl Assign for AtomArrangement {
    fn assign(&self, map: &AssignmentMap) -> Self {
        AtomArrangement {
            sites: self.sites.assign(map),
        }
    }
}

impl Assign for Register {
    fn assign(&self, map: &AssignmentMap) -> Self {
        match self {
            Register::Array(arrangement) => Register::Array(arrangement.assign(map)),
            Register::Parallel(parallel) => Register::Parallel(ParallelRegister {
                arrangement: parallel.arrangement.assign(map),
                cluster_spacing: parallel.cluster_spacing.assign(map),
            }),
        }
    }
}

impl Assign for AnalogCircuit {
    fn assign(&self, map: &AssignmentMap) -> Self {
        AnalogCircuit {
            register: self.register.assign(map),
            sequence: self.sequence.assign(map),
        }
    }
}

/// Evaluates `record` waveforms under an assignment map.
#[derive(Debug, Clone)]
pub struct AssignmentScan {
    assignments: AssignmentMap,
}

impl AssignmentScan {
    pub fn new(assignments: AssignmentMap) -> Self {
        Self { assignments }
    }

    /// Walk `circuit` in field order and return the map extended with each
    /// recorded value.
    ///
    /// A record may use names recorded earlier in the walk.
    pub fn emit(mut self, circuit: &AnalogCircuit) -> Result<AssignmentMap, CompileError> {
        for pulse in circuit.sequence.pulses() {
            for field in pulse.fields() {
                for drive in &field.drives {
                    self.scan(&drive.waveform)?;
                }
            }
        }
        Ok(self.assignments)
    }

    fn scan(&mut self, waveform: &Waveform) -> Result<(), CompileError> {
        match waveform {
            Waveform::Record { name, waveform } => {
                self.scan(waveform)?;
                let bound = waveform.assign(&self.assignments);
                let value = final_value(&bound)?;
                trace!(record = %name, %value, "Recorded waveform value");
                self.assignments
                    .insert(name.clone(), AssignmentValue::Scalar(value));
            }
            Waveform::Append { waveforms } => {
                for waveform in waveforms {
                    self.scan(waveform)?;
                }
            }
            Waveform::Scale { waveform, .. } | Waveform::Negative { waveform } => {
                self.scan(waveform)?;
            }
            Waveform::Constant { .. }
            | Waveform::Linear { .. }
            | Waveform::PiecewiseLinear { .. }
            | Waveform::PiecewiseConstant { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn circuit() -> AnalogCircuit {
        let detuning = Field::uniform(Waveform::linear(
            Scalar::var("start"),
            Scalar::var("stop"),
            Scalar::var("t"),
        ))
        .with_drive(
            SpatialModulation::RunTimeVector {
                name: "mask".into(),
            },
            Waveform::constant(Scalar::var("local"), Scalar::var("t")),
        );
        AnalogCircuit::new(
            AtomArrangement::chain(2, Scalar::var("spacing")),
            Sequence::rydberg(Pulse::default().with_detuning(detuning)),
        )
    }

    fn map(entries: &[(&str, AssignmentValue)]) -> AssignmentMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_assigns_scalars_and_vectors() {
        let bound = assign_circuit(
            &circuit(),
            &map(&[
                ("start", AssignmentValue::Scalar(dec!(1))),
                ("mask", AssignmentValue::Vector(vec![dec!(0.5), dec!(1)])),
            ]),
        );
        let detuning = bound.sequence.rydberg.unwrap().detuning.unwrap();
        match &detuning.drives[0].waveform {
            Waveform::Linear { start, stop, .. } => {
                assert_eq!(
                    start,
                    &Scalar::Assigned {
                        name: "start".into(),
                        value: dec!(1)
                    }
                );
                assert_eq!(stop, &Scalar::var("stop"));
            }
            other => panic!("unexpected waveform {other:?}"),
        }
        assert_eq!(
            detuning.drives[1].modulation,
            SpatialModulation::AssignedRunTimeVector {
                name: "mask".into(),
                values: vec![dec!(0.5), dec!(1)],
            }
        );
    }

    #[test]
    fn test_input_is_untouched() {
        let original = circuit();
        let before = original.clone();
        let _ = assign_circuit(&original, &map(&[("t", AssignmentValue::Scalar(dec!(2)))]));
        assert_eq!(original, before);
    }

    #[test]
    fn test_register_positions_are_bound() {
        let bound = assign_circuit(
            &circuit(),
            &map(&[("spacing", AssignmentValue::Scalar(dec!(6.1)))]),
        );
        let x = &bound.register.arrangement().sites[1].x;
        assert_eq!(x.value().unwrap(), dec!(6.1));
    }

    #[test]
    fn test_scaled_locations_are_bound() {
        let field = Field::default().with_drive(
            SpatialModulation::ScaledLocations {
                locations: vec![LocationScale {
                    site: 0,
                    scale: Scalar::var("c"),
                }],
            },
            Waveform::constant(1, 1),
        );
        let bound = field.assign(&map(&[("c", AssignmentValue::Scalar(dec!(0.25)))]));
        match &bound.drives[0].modulation {
            SpatialModulation::ScaledLocations { locations } => {
                assert_eq!(locations[0].scale.value().unwrap(), dec!(0.25));
            }
            other => panic!("unexpected modulation {other:?}"),
        }
    }

    #[test]
    fn test_scan_records_final_value() {
        let amplitude = Field::uniform(
            Waveform::piecewise_linear([1, 2], [Scalar::from(0), Scalar::var("peak"), Scalar::from(3)])
                .record("omega_end"),
        );
        let detuning = Field::uniform(Waveform::constant(Scalar::var("omega_end"), 3));
        let circuit = AnalogCircuit::new(
            AtomArrangement::chain(1, 0),
            Sequence::rydberg(
                Pulse::default()
                    .with_rabi_amplitude(amplitude)
                    .with_detuning(detuning),
            ),
        );
        let scanned = AssignmentScan::new(map(&[("peak", AssignmentValue::Scalar(dec!(5)))]))
            .emit(&circuit)
            .unwrap();
        assert_eq!(scanned["omega_end"], AssignmentValue::Scalar(dec!(3)));

        let bound = assign_circuit(&circuit, &scanned);
        let detuning = bound.sequence.rydberg.unwrap().detuning.unwrap();
        match &detuning.drives[0].waveform {
            Waveform::Constant { value, .. } => assert_eq!(value.value().unwrap(), dec!(3)),
            other => panic!("unexpected waveform {other:?}"),
        }
    }

    #[test]
    fn test_scan_of_unbound_record_fails() {
        let amplitude = Field::uniform(Waveform::constant(Scalar::var("x"), 1).record("r"));
        let circuit = AnalogCircuit::new(
            AtomArrangement::chain(1, 0),
            Sequence::rydberg(Pulse::default().with_rabi_amplitude(amplitude)),
        );
        let err = AssignmentScan::new(AssignmentMap::new())
            .emit(&circuit)
            .unwrap_err();
        assert_eq!(err, CompileError::UnboundParameter("x".into()));
    }

    proptest! {
        #[test]
        fn prop_substitution_is_idempotent(
            start in -100i64..100,
            local in -100i64..100,
            bind_stop in any::<bool>(),
            mask in proptest::collection::vec(0i64..10, 2),
        ) {
            let mut m = map(&[
                ("start", AssignmentValue::Scalar(Decimal::from(start))),
                ("local", AssignmentValue::Scalar(Decimal::from(local))),
                ("mask", AssignmentValue::Vector(mask.into_iter().map(Decimal::from).collect())),
            ]);
            if bind_stop {
                m.insert("stop".into(), AssignmentValue::Scalar(dec!(1.5)));
            }
            let once = assign_circuit(&circuit(), &m);
            let twice = assign_circuit(&once, &m);
            prop_assert_eq!(once, twice);
        }
    }
}

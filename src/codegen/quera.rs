// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Code generation for QuEra neutral-atom hardware.
//!
//! # Units
//!
//! Programs are written in µs, rad/µs and µm. The task representation is SI,
//! so times and positions are scaled by 1e-6 and amplitude and detuning
//! values by 1e6. Phase (rad) and site coefficients are dimensionless and
//! pass through unchanged.

use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::parallel::{tile, ParallelDecoder};
use super::waveform::{lower, Interpolation};
use crate::error::CompileError;
use crate::ir::{AnalogCircuit, Drive, Field, Register, SpatialModulation};
use crate::submission::{
    Capabilities, DetuningField, EffectiveHamiltonian, GlobalField, Lattice, LocalField,
    RydbergHamiltonian, TaskSpecification, TimeSeries,
};

const MICRO: Decimal = Decimal::from_parts(1, 0, 0, false, 6);
const MEGA: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Emits hardware tasks from fully bound circuits.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuEraCodeGen<'a> {
    capabilities: Option<&'a Capabilities>,
}

impl<'a> QuEraCodeGen<'a> {
    /// A generator for a device with `capabilities`, or for the local route
    /// when `None`. Parallel registers need capabilities.
    pub fn new(capabilities: Option<&'a Capabilities>) -> Self {
        Self { capabilities }
    }

    /// Lower a bound circuit to a task.
    ///
    /// # Errors
    ///
    /// - `InvalidShots` for zero shots
    /// - `UnboundParameter` if any name is still symbolic
    /// - `UnsupportedFeature` for hyperfine pulses, local rabi drives, more
    ///   than one drive of a kind on a field, or a parallel register without
    ///   capabilities
    /// - `ShapeMismatch` if a site vector does not match the register, or
    ///   fields end at different times
    #[instrument(skip(self, circuit), fields(sites = circuit.register.arrangement().len()))]
    pub fn emit(
        &self,
        shots: u32,
        circuit: &AnalogCircuit,
    ) -> Result<(TaskSpecification, Option<ParallelDecoder>), CompileError> {
        if shots == 0 {
            return Err(CompileError::InvalidShots(shots));
        }
        if circuit.sequence.hyperfine.is_some() {
            return Err(CompileError::UnsupportedFeature(
                "hyperfine coupling is not supported by QuEra hardware".into(),
            ));
        }
        let pulse = circuit.sequence.rydberg.as_ref().ok_or_else(|| {
            CompileError::UnsupportedFeature("sequence has no rydberg pulse".into())
        })?;

        let arrangement = circuit.register.arrangement();
        let mut sites = Vec::with_capacity(arrangement.len());
        let mut filling = Vec::with_capacity(arrangement.len());
        for site in &arrangement.sites {
            sites.push((scale(site.x.value()?, MICRO)?, scale(site.y.value()?, MICRO)?));
            filling.push(u8::from(site.filled));
        }
        let logical_sites = sites.len();

        let amplitude = pulse
            .rabi_amplitude
            .as_ref()
            .map(|field| global_series(field, "rabi amplitude", Interpolation::PiecewiseLinear))
            .transpose()?
            .flatten();
        let phase = pulse
            .rabi_phase
            .as_ref()
            .map(|field| global_series(field, "rabi phase", Interpolation::PiecewiseConstant))
            .transpose()?
            .flatten();
        let (detuning, local) = match &pulse.detuning {
            Some(field) => detuning_series(field, logical_sites)?,
            None => (None, None),
        };

        let duration = common_duration(
            [&amplitude, &phase, &detuning]
                .into_iter()
                .flatten()
                .chain(local.as_ref().map(|(series, _)| series)),
        )?;

        let (lattice, coefficients, decoder) = match &circuit.register {
            Register::Array(_) => (
                Lattice { sites, filling },
                local.as_ref().map(|(_, c)| c.clone()),
                None,
            ),
            Register::Parallel(parallel) => {
                let capabilities = self.capabilities.ok_or_else(|| {
                    CompileError::UnsupportedFeature(
                        "parallel registers need device capabilities".into(),
                    )
                })?;
                let spacing = scale(parallel.cluster_spacing.value()?, MICRO)?;
                let tiled = tile(&sites, &filling, spacing, &capabilities.lattice)?;
                let coefficients = local.as_ref().map(|(_, c)| {
                    tiled
                        .decoder
                        .mapping
                        .iter()
                        .map(|info| c[info.cluster_location_index])
                        .collect()
                });
                debug!(
                    clusters = tiled.decoder.clusters().len(),
                    sites = tiled.sites.len(),
                    "Tiled parallel register"
                );
                (
                    Lattice {
                        sites: tiled.sites,
                        filling: tiled.filling,
                    },
                    coefficients,
                    Some(tiled.decoder),
                )
            }
        };

        let to_si = |series: Option<TimeSeries>, value_scale: Decimal| match series {
            Some(series) => to_si_units(series, value_scale),
            None => Ok(TimeSeries::zero(scale(duration, MICRO)?)),
        };

        let local = match (local, coefficients) {
            (Some((series, _)), Some(lattice_site_coefficients)) => Some(LocalField {
                time_series: to_si_units(series, MEGA)?,
                lattice_site_coefficients,
            }),
            _ => None,
        };

        let task = TaskSpecification {
            nshots: shots,
            lattice,
            effective_hamiltonian: EffectiveHamiltonian {
                rydberg: RydbergHamiltonian {
                    rabi_frequency_amplitude: GlobalField {
                        global: to_si(amplitude, MEGA)?,
                    },
                    rabi_frequency_phase: GlobalField {
                        global: to_si(phase, Decimal::ONE)?,
                    },
                    detuning: DetuningField {
                        global: to_si(detuning, MEGA)?,
                        local,
                    },
                },
            },
        };

        debug!(nshots = shots, "Emitted QuEra task");
        Ok((task, decoder))
    }
}

/// Series of the single uniform drive of a field, if any.
fn global_series(
    field: &Field,
    label: &str,
    interpolation: Interpolation,
) -> Result<Option<TimeSeries>, CompileError> {
    let mut uniform: Option<&Drive> = None;
    for drive in &field.drives {
        match drive.modulation {
            SpatialModulation::Uniform => {
                if uniform.is_some() {
                    return Err(CompileError::UnsupportedFeature(format!(
                        "{} has more than one uniform drive",
                        label
                    )));
                }
                uniform = Some(drive);
            }
            _ => {
                return Err(CompileError::UnsupportedFeature(format!(
                    "{} supports only uniform drives",
                    label
                )))
            }
        }
    }
    uniform
        .map(|drive| lower(&drive.waveform, interpolation))
        .transpose()
}

type LocalDetuning = (TimeSeries, Vec<Decimal>);

fn detuning_series(
    field: &Field,
    num_sites: usize,
) -> Result<(Option<TimeSeries>, Option<LocalDetuning>), CompileError> {
    let mut global = None;
    let mut local = None;
    for drive in &field.drives {
        if let SpatialModulation::Uniform = drive.modulation {
            if global.is_some() {
                return Err(CompileError::UnsupportedFeature(
                    "detuning has more than one uniform drive".into(),
                ));
            }
            global = Some(lower(&drive.waveform, Interpolation::PiecewiseLinear)?);
            continue;
        }

        if local.is_some() {
            return Err(CompileError::UnsupportedFeature(
                "detuning has more than one local drive".into(),
            ));
        }
        let coefficients = site_coefficients(&drive.modulation, num_sites)?;
        local = Some((
            lower(&drive.waveform, Interpolation::PiecewiseLinear)?,
            coefficients,
        ));
    }
    Ok((global, local))
}

fn site_coefficients(
    modulation: &SpatialModulation,
    num_sites: usize,
) -> Result<Vec<Decimal>, CompileError> {
    match modulation {
        SpatialModulation::Uniform => Ok(vec![Decimal::ONE; num_sites]),
        SpatialModulation::RunTimeVector { name } => {
            Err(CompileError::UnboundParameter(name.clone()))
        }
        SpatialModulation::AssignedRunTimeVector { name, values } => {
            if values.len() != num_sites {
                return Err(CompileError::ShapeMismatch(format!(
                    "vector '{}' has {} elements but the register has {} sites",
                    name,
                    values.len(),
                    num_sites
                )));
            }
            Ok(values.clone())
        }
        SpatialModulation::ScaledLocations { locations } => {
            let mut coefficients = vec![Decimal::ZERO; num_sites];
            for location in locations {
                let slot = coefficients.get_mut(location.site).ok_or_else(|| {
                    CompileError::ShapeMismatch(format!(
                        "site {} is out of range for a register of {} sites",
                        location.site, num_sites
                    ))
                })?;
                *slot = location.scale.value()?;
            }
            Ok(coefficients)
        }
    }
}

fn common_duration<'s>(series: impl Iterator<Item = &'s TimeSeries>) -> Result<Decimal, CompileError> {
    let mut duration: Option<Decimal> = None;
    for series in series {
        let end = series.duration();
        match duration {
            None => duration = Some(end),
            Some(d) if d == end => {}
            Some(d) => {
                return Err(CompileError::ShapeMismatch(format!(
                    "fields end at different times: {} and {}",
                    d, end
                )))
            }
        }
    }
    duration.ok_or_else(|| CompileError::UnsupportedFeature("pulse has no drives".into()))
}

fn to_si_units(series: TimeSeries, value_scale: Decimal) -> Result<TimeSeries, CompileError> {
    Ok(TimeSeries {
        times: series
            .times
            .into_iter()
            .map(|t| scale(t, MICRO))
            .collect::<Result<_, _>>()?,
        values: series
            .values
            .into_iter()
            .map(|v| scale(v, value_scale))
            .collect::<Result<_, _>>()?,
    })
}

fn scale(value: Decimal, factor: Decimal) -> Result<Decimal, CompileError> {
    value
        .checked_mul(factor)
        .map(|v| v.normalize())
        .ok_or_else(|| CompileError::Arithmetic(format!("{} * {} overflows", value, factor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AtomArrangement, LocationScale, Pulse, Scalar, Sequence, Waveform};
    use rust_decimal_macros::dec;

    fn ramp() -> Waveform {
        Waveform::piecewise_linear(
            [dec!(0.1), dec!(3.8), dec!(0.1)],
            [dec!(0), dec!(15.8), dec!(15.8), dec!(0)],
        )
    }

    fn circuit(pulse: Pulse) -> AnalogCircuit {
        AnalogCircuit::new(AtomArrangement::chain(2, dec!(6.1)), Sequence::rydberg(pulse))
    }

    #[test]
    fn test_emit_scales_units() {
        let pulse = Pulse::default()
            .with_rabi_amplitude(Field::uniform(ramp()))
            .with_detuning(Field::uniform(Waveform::linear(-10, 10, 4)));
        let (task, decoder) = QuEraCodeGen::new(None).emit(10, &circuit(pulse)).unwrap();
        assert!(decoder.is_none());
        assert_eq!(task.nshots, 10);
        assert_eq!(task.lattice.sites[1], (dec!(0.0000061), dec!(0)));
        assert_eq!(task.lattice.filling, vec![1, 1]);

        let rydberg = &task.effective_hamiltonian.rydberg;
        assert_eq!(
            rydberg.rabi_frequency_amplitude.global.times,
            vec![dec!(0), dec!(0.0000001), dec!(0.0000039), dec!(0.000004)]
        );
        assert_eq!(
            rydberg.rabi_frequency_amplitude.global.values[1],
            dec!(15800000)
        );
        assert_eq!(rydberg.detuning.global.values, vec![dec!(-10000000), dec!(10000000)]);
        // Missing phase is a zero series over the pulse duration
        assert_eq!(rydberg.rabi_frequency_phase.global, TimeSeries::zero(dec!(0.000004)));
        assert!(rydberg.detuning.local.is_none());
    }

    #[test]
    fn test_unbound_parameter() {
        let pulse = Pulse::default().with_rabi_amplitude(Field::uniform(Waveform::constant(
            Scalar::var("omega"),
            1,
        )));
        let err = QuEraCodeGen::new(None).emit(10, &circuit(pulse)).unwrap_err();
        assert_eq!(err, CompileError::UnboundParameter("omega".into()));
    }

    #[test]
    fn test_unbound_register_position() {
        let pulse = Pulse::default().with_rabi_amplitude(Field::uniform(ramp()));
        let circuit = AnalogCircuit::new(
            AtomArrangement::chain(2, Scalar::var("a")),
            Sequence::rydberg(pulse),
        );
        assert_eq!(
            QuEraCodeGen::new(None).emit(1, &circuit).unwrap_err(),
            CompileError::UnboundParameter("a".into())
        );
    }

    #[test]
    fn test_local_detuning_from_vector() {
        let detuning = Field::uniform(Waveform::constant(0, 4)).with_drive(
            SpatialModulation::AssignedRunTimeVector {
                name: "mask".into(),
                values: vec![dec!(1), dec!(0.5)],
            },
            Waveform::constant(2, 4),
        );
        let pulse = Pulse::default()
            .with_rabi_amplitude(Field::uniform(ramp()))
            .with_detuning(detuning);
        let (task, _) = QuEraCodeGen::new(None).emit(10, &circuit(pulse)).unwrap();
        let local = task.effective_hamiltonian.rydberg.detuning.local.unwrap();
        assert_eq!(local.lattice_site_coefficients, vec![dec!(1), dec!(0.5)]);
        assert_eq!(local.time_series.values, vec![dec!(2000000), dec!(2000000)]);
    }

    #[test]
    fn test_vector_length_mismatch() {
        let detuning = Field::default().with_drive(
            SpatialModulation::AssignedRunTimeVector {
                name: "mask".into(),
                values: vec![dec!(1)],
            },
            Waveform::constant(2, 4),
        );
        let pulse = Pulse::default().with_detuning(detuning);
        assert!(matches!(
            QuEraCodeGen::new(None).emit(10, &circuit(pulse)),
            Err(CompileError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_scaled_location_out_of_range() {
        let detuning = Field::default().with_drive(
            SpatialModulation::ScaledLocations {
                locations: vec![LocationScale {
                    site: 5,
                    scale: Scalar::from(1),
                }],
            },
            Waveform::constant(2, 4),
        );
        let pulse = Pulse::default().with_detuning(detuning);
        assert!(matches!(
            QuEraCodeGen::new(None).emit(10, &circuit(pulse)),
            Err(CompileError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_unsupported_features() {
        let local_rabi = Pulse::default().with_rabi_amplitude(Field::default().with_drive(
            SpatialModulation::ScaledLocations { locations: vec![] },
            ramp(),
        ));
        let two_uniform = Pulse::default().with_rabi_amplitude(
            Field::uniform(ramp()).with_drive(SpatialModulation::Uniform, ramp()),
        );
        let mut hyperfine = Sequence::rydberg(Pulse::default().with_rabi_amplitude(Field::uniform(ramp())));
        hyperfine.hyperfine = Some(Pulse::default());

        let codegen = QuEraCodeGen::new(None);
        for pulse in [local_rabi, two_uniform] {
            assert!(matches!(
                codegen.emit(10, &circuit(pulse)),
                Err(CompileError::UnsupportedFeature(_))
            ));
        }
        let circuit = AnalogCircuit::new(AtomArrangement::chain(1, 0), hyperfine);
        assert!(matches!(
            codegen.emit(10, &circuit),
            Err(CompileError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_mismatched_durations() {
        let pulse = Pulse::default()
            .with_rabi_amplitude(Field::uniform(ramp()))
            .with_detuning(Field::uniform(Waveform::constant(0, 3)));
        assert!(matches!(
            QuEraCodeGen::new(None).emit(10, &circuit(pulse)),
            Err(CompileError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_zero_shots() {
        let pulse = Pulse::default().with_rabi_amplitude(Field::uniform(ramp()));
        assert_eq!(
            QuEraCodeGen::new(None).emit(0, &circuit(pulse)).unwrap_err(),
            CompileError::InvalidShots(0)
        );
    }

    #[test]
    fn test_parallel_register() {
        let pulse = Pulse::default().with_rabi_amplitude(Field::uniform(ramp()));
        let register = crate::ir::Register::from(AtomArrangement::chain(2, 5)).parallelize(20);
        let circuit = AnalogCircuit::new(register, Sequence::rydberg(pulse));

        assert!(matches!(
            QuEraCodeGen::new(None).emit(10, &circuit),
            Err(CompileError::UnsupportedFeature(_))
        ));

        let caps = Capabilities::aquila();
        let (task, decoder) = QuEraCodeGen::new(Some(&caps)).emit(10, &circuit).unwrap();
        let decoder = decoder.unwrap();
        assert!(!decoder.is_empty());
        assert_eq!(task.lattice.sites.len(), decoder.mapping.len());
        assert!(decoder.clusters().len() > 1);
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Quantization of task values onto a device grid.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::capabilities::{Capabilities, Quantity};
use super::ir::{
    DetuningField, EffectiveHamiltonian, GlobalField, Lattice, LocalField, RydbergHamiltonian,
    TaskSpecification, TimeSeries,
};
use crate::error::CompileError;

impl TaskSpecification {
    /// Round every value to the device grid.
    ///
    /// Each value is range-checked before and after rounding to the nearest
    /// multiple of its resolution; nothing is clamped.
    ///
    /// # Errors
    ///
    /// `CapabilityViolation` naming the quantity that falls outside the
    /// device range, or a shot or site count the device does not accept.
    pub fn discretize(&self, capabilities: &Capabilities) -> Result<TaskSpecification, CompileError> {
        let task = &capabilities.task;
        if self.nshots < task.number_shots_min || self.nshots > task.number_shots_max {
            return Err(CompileError::capability(
                "shots",
                format!(
                    "{} is outside [{}, {}]",
                    self.nshots, task.number_shots_min, task.number_shots_max
                ),
            ));
        }

        let lattice = discretize_lattice(&self.lattice, capabilities)?;
        let rydberg = &self.effective_hamiltonian.rydberg;
        let caps = &capabilities.rydberg;

        let amplitude = discretize_series(
            &rydberg.rabi_frequency_amplitude.global,
            &caps.time,
            &caps.rabi_frequency,
            "rabi_frequency_amplitude",
        )?;
        let phase = discretize_series(
            &rydberg.rabi_frequency_phase.global,
            &caps.time,
            &caps.phase,
            "rabi_frequency_phase",
        )?;
        let detuning = discretize_series(
            &rydberg.detuning.global,
            &caps.time,
            &caps.detuning,
            "detuning",
        )?;
        let local = rydberg
            .detuning
            .local
            .as_ref()
            .map(|local| {
                Ok::<_, CompileError>(LocalField {
                    time_series: discretize_series(
                        &local.time_series,
                        &caps.time,
                        &caps.local.detuning,
                        "local_detuning",
                    )?,
                    lattice_site_coefficients: local
                        .lattice_site_coefficients
                        .iter()
                        .map(|c| discretize_value(*c, &caps.local.site_coefficient, "site_coefficient"))
                        .collect::<Result<_, _>>()?,
                })
            })
            .transpose()?;

        debug!(
            nshots = self.nshots,
            sites = lattice.sites.len(),
            "Discretized task"
        );

        Ok(TaskSpecification {
            nshots: self.nshots,
            lattice,
            effective_hamiltonian: EffectiveHamiltonian {
                rydberg: RydbergHamiltonian {
                    rabi_frequency_amplitude: GlobalField { global: amplitude },
                    rabi_frequency_phase: GlobalField { global: phase },
                    detuning: DetuningField {
                        global: detuning,
                        local,
                    },
                },
            },
        })
    }
}

fn discretize_lattice(lattice: &Lattice, capabilities: &Capabilities) -> Result<Lattice, CompileError> {
    let caps = &capabilities.lattice;
    if lattice.sites.len() > caps.number_sites_max {
        return Err(CompileError::capability(
            "sites",
            format!(
                "{} sites exceeds the maximum of {}",
                lattice.sites.len(),
                caps.number_sites_max
            ),
        ));
    }

    let x_range = Quantity::new(Decimal::ZERO, caps.width, caps.position_resolution);
    let y_range = Quantity::new(Decimal::ZERO, caps.height, caps.position_resolution);
    let sites = lattice
        .sites
        .iter()
        .map(|(x, y)| {
            Ok((
                discretize_value(*x, &x_range, "site_x")?,
                discretize_value(*y, &y_range, "site_y")?,
            ))
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(Lattice {
        sites,
        filling: lattice.filling.clone(),
    })
}

fn discretize_series(
    series: &TimeSeries,
    time: &Quantity,
    values: &Quantity,
    quantity: &str,
) -> Result<TimeSeries, CompileError> {
    let times = series
        .times
        .iter()
        .map(|t| discretize_value(*t, time, "time"))
        .collect::<Result<_, _>>()?;
    let values = series
        .values
        .iter()
        .map(|v| discretize_value(*v, values, quantity))
        .collect::<Result<_, _>>()?;
    Ok(TimeSeries { times, values })
}

/// Round `value` to the nearest multiple of the quantity's resolution.
pub fn discretize_value(value: Decimal, quantity: &Quantity, name: &str) -> Result<Decimal, CompileError> {
    if !quantity.contains(value) {
        return Err(out_of_range(value, quantity, name));
    }
    if quantity.resolution <= Decimal::ZERO {
        return Ok(value.normalize());
    }

    let steps = value
        .checked_div(quantity.resolution)
        .ok_or_else(|| CompileError::Arithmetic(format!("{} / {} overflows", value, quantity.resolution)))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let rounded = steps
        .checked_mul(quantity.resolution)
        .ok_or_else(|| CompileError::Arithmetic(format!("{} * {} overflows", steps, quantity.resolution)))?;

    if !quantity.contains(rounded) {
        return Err(out_of_range(rounded, quantity, name));
    }
    Ok(rounded.normalize())
}

fn out_of_range(value: Decimal, quantity: &Quantity, name: &str) -> CompileError {
    CompileError::capability(
        name,
        format!("{} is outside [{}, {}]", value, quantity.min, quantity.max),
    )
}

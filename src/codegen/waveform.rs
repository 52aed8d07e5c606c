// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Lowering of bound waveforms to sampled time series.
//!
//! Amplitude and detuning fields are piecewise linear: the series is
//! interpolated between samples. Phase is piecewise constant: each value
//! holds until the next sample and the last value is repeated at the end
//! time. Lowered series are in program units (µs, rad/µs).

use rust_decimal::Decimal;

use crate::error::CompileError;
use crate::ir::{Scalar, Waveform};
use crate::submission::TimeSeries;

/// How a field interpolates between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    PiecewiseLinear,
    PiecewiseConstant,
}

/// Lower `waveform` to a series starting at time zero.
pub fn lower(waveform: &Waveform, interpolation: Interpolation) -> Result<TimeSeries, CompileError> {
    match interpolation {
        Interpolation::PiecewiseLinear => lower_linear(waveform),
        Interpolation::PiecewiseConstant => {
            let segments = constant_segments(waveform)?;
            let mut times = vec![Decimal::ZERO];
            let mut values = Vec::with_capacity(segments.len() + 1);
            let mut clock = Decimal::ZERO;
            for (duration, value) in &segments {
                clock = add(clock, *duration)?;
                times.push(clock);
                values.push(*value);
            }
            let last = values
                .last()
                .copied()
                .ok_or_else(|| CompileError::ShapeMismatch("waveform has no segments".into()))?;
            values.push(last);
            Ok(TimeSeries { times, values })
        }
    }
}

/// Value of a bound waveform at its end time.
pub fn final_value(waveform: &Waveform) -> Result<Decimal, CompileError> {
    match waveform {
        Waveform::Constant { value, .. } => value.value(),
        Waveform::Linear { stop, .. } => stop.value(),
        Waveform::PiecewiseLinear { values, .. } | Waveform::PiecewiseConstant { values, .. } => {
            values
                .last()
                .ok_or_else(|| CompileError::ShapeMismatch("waveform has no values".into()))?
                .value()
        }
        Waveform::Append { waveforms } => final_value(
            waveforms
                .last()
                .ok_or_else(|| CompileError::ShapeMismatch("append of no waveforms".into()))?,
        ),
        Waveform::Scale { factor, waveform } => mul(factor.value()?, final_value(waveform)?),
        Waveform::Negative { waveform } => Ok(-final_value(waveform)?),
        Waveform::Record { waveform, .. } => final_value(waveform),
    }
}

fn lower_linear(waveform: &Waveform) -> Result<TimeSeries, CompileError> {
    match waveform {
        Waveform::Constant { value, duration } => {
            let (value, duration) = (value.value()?, duration_of(duration)?);
            Ok(TimeSeries::new(vec![Decimal::ZERO, duration], vec![value, value]))
        }
        Waveform::Linear {
            start,
            stop,
            duration,
        } => Ok(TimeSeries::new(
            vec![Decimal::ZERO, duration_of(duration)?],
            vec![start.value()?, stop.value()?],
        )),
        Waveform::PiecewiseLinear { durations, values } => {
            if values.len() != durations.len() + 1 {
                return Err(CompileError::ShapeMismatch(format!(
                    "piecewise linear waveform needs one more value than durations, got {} durations and {} values",
                    durations.len(),
                    values.len()
                )));
            }
            let times = cumulative(durations)?;
            let values = values.iter().map(Scalar::value).collect::<Result<_, _>>()?;
            Ok(TimeSeries { times, values })
        }
        Waveform::PiecewiseConstant { .. } => {
            let segments = constant_segments(waveform)?;
            let mut series = TimeSeries::default();
            for (duration, value) in segments {
                let step = TimeSeries::new(vec![Decimal::ZERO, duration], vec![value, value]);
                series = concat_continuous(series, step)?;
            }
            Ok(series)
        }
        Waveform::Append { waveforms } => {
            if waveforms.is_empty() {
                return Err(CompileError::ShapeMismatch("append of no waveforms".into()));
            }
            waveforms
                .iter()
                .try_fold(TimeSeries::default(), |series, next| {
                    concat_continuous(series, lower_linear(next)?)
                })
        }
        Waveform::Scale { factor, waveform } => {
            let factor = factor.value()?;
            let mut series = lower_linear(waveform)?;
            series.values = series
                .values
                .into_iter()
                .map(|v| mul(factor, v))
                .collect::<Result<_, _>>()?;
            Ok(series)
        }
        Waveform::Negative { waveform } => {
            let mut series = lower_linear(waveform)?;
            series.values.iter_mut().for_each(|v| *v = -*v);
            Ok(series)
        }
        Waveform::Record { waveform, .. } => lower_linear(waveform),
    }
}

/// Join `next` after `series`, requiring the values to meet.
fn concat_continuous(mut series: TimeSeries, next: TimeSeries) -> Result<TimeSeries, CompileError> {
    let (Some(end), Some(&last)) = (series.times.last().copied(), series.values.last()) else {
        return Ok(next);
    };
    if let Some(&first) = next.values.first() {
        if first != last {
            return Err(CompileError::UnsupportedFeature(format!(
                "discontinuous waveform: value jumps from {} to {} at t={}",
                last, first, end
            )));
        }
    }
    for (time, value) in next.times.iter().zip(&next.values).skip(1) {
        series.times.push(add(end, *time)?);
        series.values.push(*value);
    }
    Ok(series)
}

/// Flatten a waveform into (duration, value) steps.
fn constant_segments(waveform: &Waveform) -> Result<Vec<(Decimal, Decimal)>, CompileError> {
    match waveform {
        Waveform::Constant { value, duration } => Ok(vec![(duration_of(duration)?, value.value()?)]),
        Waveform::PiecewiseConstant { durations, values } => {
            if durations.len() != values.len() {
                return Err(CompileError::ShapeMismatch(format!(
                    "piecewise constant waveform needs one value per duration, got {} durations and {} values",
                    durations.len(),
                    values.len()
                )));
            }
            durations
                .iter()
                .zip(values)
                .map(|(d, v)| Ok((duration_of(d)?, v.value()?)))
                .collect()
        }
        Waveform::Linear {
            start,
            stop,
            duration,
        } => {
            let (start, stop) = (start.value()?, stop.value()?);
            if start != stop {
                return Err(CompileError::UnsupportedFeature(
                    "a linear ramp cannot drive a piecewise constant field".into(),
                ));
            }
            Ok(vec![(duration_of(duration)?, start)])
        }
        Waveform::PiecewiseLinear { .. } => {
            let series = lower_linear(waveform)?;
            let first = series.values.first().copied().unwrap_or(Decimal::ZERO);
            if series.values.iter().any(|v| *v != first) {
                return Err(CompileError::UnsupportedFeature(
                    "a piecewise linear ramp cannot drive a piecewise constant field".into(),
                ));
            }
            Ok(vec![(series.duration(), first)])
        }
        Waveform::Append { waveforms } => {
            if waveforms.is_empty() {
                return Err(CompileError::ShapeMismatch("append of no waveforms".into()));
            }
            let mut segments = Vec::new();
            for waveform in waveforms {
                segments.extend(constant_segments(waveform)?);
            }
            Ok(segments)
        }
        Waveform::Scale { factor, waveform } => {
            let factor = factor.value()?;
            constant_segments(waveform)?
                .into_iter()
                .map(|(d, v)| Ok((d, mul(factor, v)?)))
                .collect()
        }
        Waveform::Negative { waveform } => Ok(constant_segments(waveform)?
            .into_iter()
            .map(|(d, v)| (d, -v))
            .collect()),
        Waveform::Record { waveform, .. } => constant_segments(waveform),
    }
}

fn cumulative(durations: &[Scalar]) -> Result<Vec<Decimal>, CompileError> {
    let mut times = Vec::with_capacity(durations.len() + 1);
    let mut clock = Decimal::ZERO;
    times.push(clock);
    for duration in durations {
        clock = add(clock, duration_of(duration)?)?;
        times.push(clock);
    }
    Ok(times)
}

fn duration_of(duration: &Scalar) -> Result<Decimal, CompileError> {
    let value = duration.value()?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CompileError::capability(
            "time",
            format!("waveform duration {} is negative", value),
        ));
    }
    Ok(value)
}

fn add(a: Decimal, b: Decimal) -> Result<Decimal, CompileError> {
    a.checked_add(b)
        .ok_or_else(|| CompileError::Arithmetic(format!("{} + {} overflows", a, b)))
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, CompileError> {
    a.checked_mul(b)
        .ok_or_else(|| CompileError::Arithmetic(format!("{} * {} overflows", a, b)))
}

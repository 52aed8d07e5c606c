// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Waveforms: time-dependent drive envelopes.
//!
//! Durations are in microseconds; values are in the unit of the field the
//! waveform drives (rad/µs for amplitude and detuning, rad for phase).

use serde::{Deserialize, Serialize};

use super::scalar::Scalar;

/// A symbolic waveform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Waveform {
    /// Constant value for `duration`.
    Constant { value: Scalar, duration: Scalar },
    /// Linear ramp from `start` to `stop` over `duration`.
    Linear {
        start: Scalar,
        stop: Scalar,
        duration: Scalar,
    },
    /// Linear interpolation through `values`; `values.len() == durations.len() + 1`.
    PiecewiseLinear {
        durations: Vec<Scalar>,
        values: Vec<Scalar>,
    },
    /// Step function; `values.len() == durations.len()`.
    PiecewiseConstant {
        durations: Vec<Scalar>,
        values: Vec<Scalar>,
    },
    /// Waveforms played back to back.
    Append { waveforms: Vec<Waveform> },
    /// Pointwise multiplication by `factor`.
    Scale {
        factor: Scalar,
        waveform: Box<Waveform>,
    },
    /// Pointwise negation.
    Negative { waveform: Box<Waveform> },
    /// Plays `waveform` and binds its final value to `name`.
    Record { name: String, waveform: Box<Waveform> },
}

impl Waveform {
    pub fn constant(value: impl Into<Scalar>, duration: impl Into<Scalar>) -> Self {
        Waveform::Constant {
            value: value.into(),
            duration: duration.into(),
        }
    }

    pub fn linear(
        start: impl Into<Scalar>,
        stop: impl Into<Scalar>,
        duration: impl Into<Scalar>,
    ) -> Self {
        Waveform::Linear {
            start: start.into(),
            stop: stop.into(),
            duration: duration.into(),
        }
    }

    pub fn piecewise_linear<D, V>(durations: D, values: V) -> Self
    where
        D: IntoIterator,
        D::Item: Into<Scalar>,
        V: IntoIterator,
        V::Item: Into<Scalar>,
    {
        Waveform::PiecewiseLinear {
            durations: durations.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn piecewise_constant<D, V>(durations: D, values: V) -> Self
    where
        D: IntoIterator,
        D::Item: Into<Scalar>,
        V: IntoIterator,
        V::Item: Into<Scalar>,
    {
        Waveform::PiecewiseConstant {
            durations: durations.into_iter().map(Into::into).collect(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn append(self, next: Waveform) -> Self {
        match self {
            Waveform::Append { mut waveforms } => {
                waveforms.push(next);
                Waveform::Append { waveforms }
            }
            first => Waveform::Append {
                waveforms: vec![first, next],
            },
        }
    }

    pub fn scale(self, factor: impl Into<Scalar>) -> Self {
        Waveform::Scale {
            factor: factor.into(),
            waveform: Box::new(self),
        }
    }

    pub fn negative(self) -> Self {
        Waveform::Negative {
            waveform: Box::new(self),
        }
    }

    pub fn record(self, name: impl Into<String>) -> Self {
        Waveform::Record {
            name: name.into(),
            waveform: Box::new(self),
        }
    }
}

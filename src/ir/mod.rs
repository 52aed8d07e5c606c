// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Program tree for analog circuits.
//!
//! The tree is produced outside this crate (by a builder or from JSON) and
//! treated as immutable: substitution passes build new trees rather than
//! editing nodes in place.
//!
//! - [`AnalogCircuit`]: register + sequence
//! - [`Scalar`], [`Waveform`], [`Field`]: symbolic building blocks
//! - [`ParamSpec`]: parameter names and kinds, from [`derive_param_spec`]

pub mod circuit;
pub mod field;
pub mod register;
pub mod scalar;
pub mod spec;
pub mod waveform;

pub use circuit::{AnalogCircuit, Pulse, Sequence};
pub use field::{Drive, Field, LocationScale, SpatialModulation};
pub use register::{AtomArrangement, ParallelRegister, Register, Site};
pub use scalar::Scalar;
pub use spec::{derive_param_spec, ParamKind, ParamSpec};
pub use waveform::Waveform;

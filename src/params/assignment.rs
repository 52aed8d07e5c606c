// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Static and batch assignment sets.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::cast::{cast_batch_param, cast_param, RawValue};
use super::AssignmentValue;
use crate::error::CompileError;
use crate::ir::{ParamKind, ParamSpec};

/// Cast assignments for one program.
///
/// `static_params` hold one value per name and apply to every task;
/// `batch_params` hold one value per task. All batch sequences have the
/// same length, which is the batch size.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssignmentSet {
    static_params: IndexMap<String, AssignmentValue>,
    batch_params: IndexMap<String, Vec<AssignmentValue>>,
}

impl AssignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a static assignment set.
    pub fn assign<I, K, V>(spec: &ParamSpec, assignments: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        Self::new().with_assign(spec, assignments)
    }

    /// Build a batch assignment set.
    ///
    /// # Errors
    ///
    /// `TypeKind` for values of the wrong shape and `ShapeMismatch` when the
    /// sequences differ in length or are empty.
    pub fn batch_assign<I, K, V>(spec: &ParamSpec, assignments: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        Self::new().with_batch_assign(spec, assignments)
    }

    /// Add static assignments to this set.
    pub fn with_assign<I, K, V>(mut self, spec: &ParamSpec, assignments: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        for (name, value) in assignments {
            let name = name.into();
            self.ensure_unassigned(&name)?;
            let kind = classify(spec, &name)?;
            let value = cast_param(kind, &value.into(), &name)?;
            debug!(param = %name, %value, "Static assignment");
            self.static_params.insert(name, value);
        }
        Ok(self)
    }

    /// Add batch assignments to this set.
    pub fn with_batch_assign<I, K, V>(
        mut self,
        spec: &ParamSpec,
        assignments: I,
    ) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        let mut cast = IndexMap::new();
        for (name, values) in assignments {
            let name = name.into();
            self.ensure_unassigned(&name)?;
            if cast.contains_key(&name) {
                return Err(CompileError::DuplicateAssignment(name));
            }
            let kind = classify(spec, &name)?;
            let values = cast_batch_param(kind, &values.into(), &name)?;
            cast.insert(name, values);
        }

        let lengths: IndexMap<&str, usize> = self
            .batch_params
            .iter()
            .chain(cast.iter())
            .map(|(name, values)| (name.as_str(), values.len()))
            .collect();

        if let Some((name, _)) = lengths.iter().find(|(_, len)| **len == 0) {
            return Err(CompileError::ShapeMismatch(format!(
                "batch assignment for '{}' is empty",
                name
            )));
        }

        let mut distinct: Vec<usize> = lengths.values().copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() > 1 {
            let described: Vec<String> = lengths
                .iter()
                .map(|(name, len)| format!("{}={}", name, len))
                .collect();
            return Err(CompileError::ShapeMismatch(format!(
                "all batch assignments need the same number of elements, got {}",
                described.join(", ")
            )));
        }

        self.batch_params.extend(cast);
        debug!(batch_size = self.batch_size(), "Batch assignment");
        Ok(self)
    }

    fn ensure_unassigned(&self, name: &str) -> Result<(), CompileError> {
        if self.is_assigned(name) {
            return Err(CompileError::DuplicateAssignment(name.to_string()));
        }
        Ok(())
    }

    pub fn static_params(&self) -> &IndexMap<String, AssignmentValue> {
        &self.static_params
    }

    pub fn batch_params(&self) -> &IndexMap<String, Vec<AssignmentValue>> {
        &self.batch_params
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        self.static_params.contains_key(name) || self.batch_params.contains_key(name)
    }

    /// Number of tasks this set expands to; 1 when there are no batch params.
    pub fn batch_size(&self) -> usize {
        self.batch_params
            .values()
            .next()
            .map(Vec::len)
            .unwrap_or(1)
    }
}

fn classify(spec: &ParamSpec, name: &str) -> Result<ParamKind, CompileError> {
    if spec.is_recorded(name) {
        return Err(CompileError::type_kind(
            name,
            "an assignable parameter",
            "recorded waveform value",
        ));
    }
    match spec.kind(name) {
        Some(kind) => Ok(kind),
        None => {
            warn!(param = %name, "Assigned parameter does not appear in the program");
            Ok(ParamKind::Scalar)
        }
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-task resolution of assignment sets.

use indexmap::IndexMap;

use super::assignment::AssignmentSet;
use super::cast::{cast_param, RawValue};
use super::{AssignmentMap, AssignmentValue};
use crate::error::CompileError;
use crate::ir::{ParamKind, ParamSpec};

/// Assignments of one program, ready to be expanded per task.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    static_params: AssignmentMap,
    batch_params: IndexMap<String, Vec<AssignmentValue>>,
    args: Vec<(String, ParamKind)>,
}

impl Params {
    /// Combine an assignment set with the names left for positional args.
    pub fn new(spec: &ParamSpec, assignments: &AssignmentSet, args: &[String]) -> Self {
        let args = args
            .iter()
            .map(|name| {
                let kind = spec.kind(name).unwrap_or(ParamKind::Scalar);
                (name.clone(), kind)
            })
            .collect();
        Self {
            static_params: assignments.static_params().clone(),
            batch_params: assignments.batch_params().clone(),
            args,
        }
    }

    pub fn static_params(&self) -> &AssignmentMap {
        &self.static_params
    }

    /// Names bound positionally at compile time, in order.
    pub fn args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(name, _)| name.as_str())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_params
            .values()
            .next()
            .map(Vec::len)
            .unwrap_or(1)
    }

    /// Expand into one assignment map per batch index.
    ///
    /// `args` are matched positionally to [`Params::args`] and cast by the
    /// kind of the name they bind. Fewer args than names leaves the rest
    /// unbound.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if more args are supplied than there are names, and
    /// `TypeKind` if an arg does not fit its name's kind.
    pub fn batch_assignments(&self, args: &[RawValue]) -> Result<BatchAssignments<'_>, CompileError> {
        if args.len() > self.args.len() {
            return Err(CompileError::ShapeMismatch(format!(
                "expected at most {} positional args ({}), got {}",
                self.args.len(),
                self.args().collect::<Vec<_>>().join(", "),
                args.len()
            )));
        }

        let extra = self
            .args
            .iter()
            .zip(args)
            .map(|((name, kind), value)| Ok((name.clone(), cast_param(*kind, value, name)?)))
            .collect::<Result<AssignmentMap, CompileError>>()?;

        Ok(BatchAssignments {
            params: self,
            extra,
            index: 0,
            len: self.batch_size(),
        })
    }
}

/// Iterator over the resolved assignment map of each batch index.
///
/// Cloning the iterator restarts from its current position; the map for a
/// given index is always the same.
#[derive(Debug, Clone)]
pub struct BatchAssignments<'a> {
    params: &'a Params,
    extra: AssignmentMap,
    index: usize,
    len: usize,
}

impl BatchAssignments<'_> {
    /// The resolved map for `index` without advancing.
    pub fn get(&self, index: usize) -> Option<AssignmentMap> {
        if index >= self.len {
            return None;
        }
        let mut map = self.params.static_params.clone();
        for (name, values) in &self.params.batch_params {
            map.insert(name.clone(), values[index].clone());
        }
        map.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(map)
    }
}

impl Iterator for BatchAssignments<'_> {
    type Item = AssignmentMap;

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.get(self.index)?;
        self.index += 1;
        Some(map)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchAssignments<'_> {}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resource-limit checks applied before compiling a batch.

use crate::config::ResourceLimits;
use crate::error::CompileError;

/// Validate the shot count of every task.
pub fn validate_shots(shots: u32, limits: &ResourceLimits) -> Result<(), CompileError> {
    if shots == 0 {
        return Err(CompileError::InvalidShots(shots));
    }

    if shots > limits.max_shots {
        return Err(CompileError::ResourceLimit {
            resource: "shots".into(),
            limit: limits.max_shots as u64,
            requested: shots as u64,
        });
    }

    Ok(())
}

/// Validate the number of tasks a batch expands to.
pub fn validate_batch_size(batch_size: usize, limits: &ResourceLimits) -> Result<(), CompileError> {
    if batch_size > limits.max_batch_size as usize {
        return Err(CompileError::ResourceLimit {
            resource: "batch_size".into(),
            limit: limits.max_batch_size as u64,
            requested: batch_size as u64,
        });
    }

    Ok(())
}

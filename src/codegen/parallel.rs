// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tiling of a parallel register across the device lattice, and decoding of
//! tiled results back to one result per cluster.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::submission::{LatticeCapabilities, ShotResult, ShotStatus, TaskResult};

/// Where one physical site sits in the tiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLocationInfo {
    pub cluster_index: (usize, usize),
    pub global_location_index: usize,
    pub cluster_location_index: usize,
}

/// Maps physical sites of a tiled task back to clusters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelDecoder {
    pub mapping: Vec<ClusterLocationInfo>,
}

/// Result of one cluster of a tiled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub cluster_index: (usize, usize),
    pub result: TaskResult,
}

impl ParallelDecoder {
    /// Cluster indices in tiling order.
    pub fn clusters(&self) -> Vec<(usize, usize)> {
        let mut clusters: Vec<(usize, usize)> = Vec::new();
        for info in &self.mapping {
            if !clusters.contains(&info.cluster_index) {
                clusters.push(info.cluster_index);
            }
        }
        clusters
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Split a physical result into one result per cluster.
    ///
    /// A shot whose sequences are too short to cover a cluster is kept with
    /// status `MissingMeasurement` and empty sequences.
    pub fn decode(&self, result: &TaskResult) -> Vec<ClusterResult> {
        self.clusters()
            .into_iter()
            .map(|cluster| {
                let mut sites: Vec<&ClusterLocationInfo> = self
                    .mapping
                    .iter()
                    .filter(|info| info.cluster_index == cluster)
                    .collect();
                sites.sort_by_key(|info| info.cluster_location_index);
                let globals: Vec<usize> = sites.iter().map(|info| info.global_location_index).collect();

                let shot_outputs = result
                    .shot_outputs
                    .iter()
                    .map(|shot| slice_shot(shot, &globals))
                    .collect();

                ClusterResult {
                    cluster_index: cluster,
                    result: TaskResult {
                        task_status: result.task_status,
                        shot_outputs,
                    },
                }
            })
            .collect()
    }
}

fn slice_shot(shot: &ShotResult, globals: &[usize]) -> ShotResult {
    let pick = |sequence: &[u8]| -> Option<Vec<u8>> {
        globals.iter().map(|g| sequence.get(*g).copied()).collect()
    };
    match (pick(&shot.pre_sequence), pick(&shot.post_sequence)) {
        (Some(pre_sequence), Some(post_sequence)) => ShotResult {
            shot_status: shot.shot_status,
            pre_sequence,
            post_sequence,
        },
        _ => ShotResult {
            shot_status: ShotStatus::MissingMeasurement,
            pre_sequence: Vec::new(),
            post_sequence: Vec::new(),
        },
    }
}

/// Physical lattice produced by tiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiledLattice {
    pub sites: Vec<(Decimal, Decimal)>,
    pub filling: Vec<u8>,
    pub decoder: ParallelDecoder,
}

/// Repeat a cluster across the device area.
///
/// Positions and spacing are in metres. Clusters are placed column by
/// column from the origin, one cluster extent plus `cluster_spacing` apart,
/// until the area or the site budget is used up.
pub fn tile(
    sites: &[(Decimal, Decimal)],
    filling: &[u8],
    cluster_spacing: Decimal,
    lattice: &LatticeCapabilities,
) -> Result<TiledLattice, CompileError> {
    if sites.is_empty() {
        return Err(CompileError::ShapeMismatch(
            "parallel register has no sites".into(),
        ));
    }
    if cluster_spacing <= Decimal::ZERO {
        return Err(CompileError::capability(
            "cluster_spacing",
            format!("{} must be positive", cluster_spacing),
        ));
    }

    let (x_min, x_max) = bounds(sites.iter().map(|(x, _)| *x));
    let (y_min, y_max) = bounds(sites.iter().map(|(_, y)| *y));
    let (extent_x, extent_y) = (x_max - x_min, y_max - y_min);
    let (step_x, step_y) = (extent_x + cluster_spacing, extent_y + cluster_spacing);

    let columns = fit(lattice.width, extent_x, step_x);
    let rows = fit(lattice.height, extent_y, step_y);
    let budget = lattice.number_sites_max / sites.len();

    if columns == 0 || rows == 0 || budget == 0 {
        return Err(CompileError::capability(
            "lattice",
            format!(
                "a cluster of {} sites spanning {} x {} does not fit in {} x {} with at most {} sites",
                sites.len(),
                extent_x,
                extent_y,
                lattice.width,
                lattice.height,
                lattice.number_sites_max
            ),
        ));
    }

    let mut tiled = TiledLattice {
        sites: Vec::new(),
        filling: Vec::new(),
        decoder: ParallelDecoder::default(),
    };
    let mut placed = 0;
    'outer: for i in 0..columns {
        for j in 0..rows {
            if placed == budget {
                break 'outer;
            }
            let dx = step_x * Decimal::from(i);
            let dy = step_y * Decimal::from(j);
            for (local, ((x, y), fill)) in sites.iter().zip(filling).enumerate() {
                tiled.decoder.mapping.push(ClusterLocationInfo {
                    cluster_index: (i, j),
                    global_location_index: tiled.sites.len(),
                    cluster_location_index: local,
                });
                tiled.sites.push((*x - x_min + dx, *y - y_min + dy));
                tiled.filling.push(*fill);
            }
            placed += 1;
        }
    }

    Ok(tiled)
}

fn bounds(values: impl Iterator<Item = Decimal>) -> (Decimal, Decimal) {
    values.fold((Decimal::MAX, Decimal::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Number of clusters of `extent` that fit in `available` at `step` pitch.
fn fit(available: Decimal, extent: Decimal, step: Decimal) -> usize {
    if available < extent {
        return 0;
    }
    ((available - extent) / step)
        .floor()
        .to_usize()
        .map_or(0, |n| n + 1)
}

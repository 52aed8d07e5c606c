// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! AWS Braket analog hardware backend.
//!
//! Discretized tasks are translated into Braket AHS programs and submitted
//! through a [`BraketHttpClient`]. Transport and authentication live behind
//! that trait.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::r#trait::{RemoteBackend, RemoteTaskStatus};
use crate::codegen::braket::{to_braket_task_ir, AhsProgram};
use crate::config::BraketConfig;
use crate::error::BackendError;
use crate::submission::{Capabilities, TaskResult, TaskSpecification};

use client::BraketHttpClient;

/// Device ARN of QuEra Aquila.
pub const AQUILA_ARN: &str = "arn:aws:braket:us-east-1::device/qpu/quera/Aquila";

/// Braket task request.
#[derive(Debug, Clone, Serialize)]
pub struct BraketTaskRequest {
    /// Device ARN.
    pub device_arn: String,
    /// AHS program.
    pub action: AhsProgram,
    /// Number of shots.
    pub shots: u32,
    /// S3 output location.
    pub output_s3_bucket: String,
    pub output_s3_key_prefix: String,
}

/// Braket task status, with the result once completed.
#[derive(Debug, Clone, Deserialize)]
pub struct BraketTaskResult {
    /// Task status.
    pub status: String,
    /// Measured shots.
    pub result: Option<TaskResult>,
}

/// AWS Braket analog backend.
pub struct BraketBackend<C: BraketHttpClient> {
    name: String,
    config: BraketConfig,
    capabilities: Capabilities,
    client: C,
}

impl<C: BraketHttpClient> BraketBackend<C> {
    /// Create with a custom HTTP client.
    pub fn with_client(config: &BraketConfig, capabilities: Capabilities, client: C) -> Self {
        let device = config
            .device_arn
            .rsplit('/')
            .next()
            .unwrap_or(&config.device_arn)
            .to_lowercase();
        Self {
            name: format!("braket_{device}"),
            config: config.clone(),
            capabilities,
            client,
        }
    }

    pub fn device_arn(&self) -> &str {
        &self.config.device_arn
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

fn parse_status(task_id: &str, status: &str) -> Result<RemoteTaskStatus, BackendError> {
    match status {
        "CREATED" | "QUEUED" => Ok(RemoteTaskStatus::Created),
        "RUNNING" => Ok(RemoteTaskStatus::Running),
        "COMPLETED" => Ok(RemoteTaskStatus::Completed),
        "FAILED" => Ok(RemoteTaskStatus::Failed),
        "CANCELLING" | "CANCELLED" => Ok(RemoteTaskStatus::Cancelled),
        other => Err(BackendError::Http(format!(
            "Braket task {task_id} has unknown status {other}"
        ))),
    }
}

#[async_trait]
impl<C: BraketHttpClient> RemoteBackend for BraketBackend<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn submit_task(&self, task: &TaskSpecification) -> Result<String, BackendError> {
        let request = BraketTaskRequest {
            device_arn: self.config.device_arn.clone(),
            action: to_braket_task_ir(task).program,
            shots: task.nshots,
            output_s3_bucket: self.config.s3_bucket.clone(),
            output_s3_key_prefix: self.config.s3_prefix.clone(),
        };

        let task_id = self.client.create_task(&request).await?;
        info!(task_id = %task_id, device = %self.config.device_arn, shots = task.nshots, "Braket task created");
        Ok(task_id)
    }

    async fn task_status(&self, task_id: &str) -> Result<RemoteTaskStatus, BackendError> {
        let result = self.client.get_task(task_id).await?;
        let status = parse_status(task_id, &result.status)?;
        debug!(task_id = %task_id, %status, "Braket task status");
        Ok(status)
    }

    async fn task_results(&self, task_id: &str) -> Result<TaskResult, BackendError> {
        let result = self.client.get_task(task_id).await?;
        match parse_status(task_id, &result.status)? {
            RemoteTaskStatus::Completed => result.result.ok_or_else(|| {
                BackendError::ExecutionFailed(format!(
                    "Braket task {task_id} completed without results"
                ))
            }),
            RemoteTaskStatus::Failed | RemoteTaskStatus::Cancelled => Err(
                BackendError::ExecutionFailed(format!("Braket task {task_id} {}", result.status)),
            ),
            status => Err(BackendError::Unavailable(format!(
                "Braket task {task_id} is {status}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::{
        DetuningField, EffectiveHamiltonian, GlobalField, Lattice, RydbergHamiltonian, TimeSeries,
    };
    use client::MockBraketClient;
    use rust_decimal_macros::dec;

    fn test_config() -> BraketConfig {
        BraketConfig {
            enabled: true,
            ..Default::default()
        }
    }

    fn task() -> TaskSpecification {
        let series = TimeSeries::zero(dec!(0.000001));
        TaskSpecification {
            nshots: 3,
            lattice: Lattice {
                sites: vec![(dec!(0), dec!(0)), (dec!(0.000006), dec!(0))],
                filling: vec![1, 0],
            },
            effective_hamiltonian: EffectiveHamiltonian {
                rydberg: RydbergHamiltonian {
                    rabi_frequency_amplitude: GlobalField {
                        global: series.clone(),
                    },
                    rabi_frequency_phase: GlobalField {
                        global: series.clone(),
                    },
                    detuning: DetuningField {
                        global: series,
                        local: None,
                    },
                },
            },
        }
    }

    #[test]
    fn test_backend_name_from_arn() {
        let backend =
            BraketBackend::with_client(&test_config(), Capabilities::aquila(), MockBraketClient::default());
        assert_eq!(backend.name(), "braket_aquila");
        assert!(backend.device_arn().contains("quera"));
    }

    #[tokio::test]
    async fn test_submit_and_fetch_results() {
        let client = MockBraketClient::default().with_pending_polls(1);
        let backend = BraketBackend::with_client(&test_config(), Capabilities::aquila(), client);

        let task_id = backend.submit_task(&task()).await.unwrap();
        assert_eq!(task_id, "mock-task-0");

        let submitted = backend.client().submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].shots, 3);
        assert_eq!(submitted[0].action.setup.ahs_register.filling, vec![1, 0]);

        assert_eq!(
            backend.task_status(&task_id).await.unwrap(),
            RemoteTaskStatus::Running
        );
        let result = backend.task_results(&task_id).await.unwrap();
        assert_eq!(result.shot_outputs.len(), 3);
        assert_eq!(result.bitstring_counts()["10"], 3);
    }

    #[tokio::test]
    async fn test_failed_task() {
        let client = MockBraketClient::default().with_failing_task(0);
        let backend = BraketBackend::with_client(&test_config(), Capabilities::aquila(), client);
        let task_id = backend.submit_task(&task()).await.unwrap();
        assert!(matches!(
            backend.task_results(&task_id).await,
            Err(BackendError::ExecutionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let client = MockBraketClient::default().with_rejected_submission(0);
        let backend = BraketBackend::with_client(&test_config(), Capabilities::aquila(), client);
        assert!(matches!(
            backend.submit_task(&task()).await,
            Err(BackendError::InvalidRequest(_))
        ));
        assert_eq!(backend.submit_task(&task()).await.unwrap(), "mock-task-1");
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let backend = BraketBackend::with_client(
            &test_config(),
            Capabilities::aquila(),
            MockBraketClient::default(),
        );
        assert!(matches!(
            backend.task_status("nope").await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("t", "QUEUED").unwrap(), RemoteTaskStatus::Created);
        assert_eq!(
            parse_status("t", "CANCELLING").unwrap(),
            RemoteTaskStatus::Cancelled
        );
        assert!(parse_status("t", "EXPLODED").is_err());
    }
}

// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the analog compiler.
//!
//! [`CompileError`] covers everything raised while binding parameters and
//! generating task instructions; any of these aborts the whole compile.
//! [`BackendError`] is raised while executing tasks and is recorded on the
//! individual task rather than propagated out of the batch.

use std::fmt;

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error types.
#[derive(Debug)]
pub enum Error {
    /// Configuration error
    Config(String),
    /// Compilation error
    Compile(CompileError),
    /// Backend error
    Backend(BackendError),
    /// IO error
    Io(std::io::Error),
    /// Serialization error
    Serialization(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Compile(e) => write!(f, "Compilation error: {}", e),
            Error::Backend(e) => write!(f, "Backend error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Compile(e) => Some(e),
            Error::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<BackendError> for Error {
    fn from(e: BackendError) -> Self {
        Error::Backend(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Errors raised while casting, binding and generating code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A value has the wrong type or shape for its parameter
    TypeKind {
        name: String,
        expected: String,
        found: String,
    },
    /// Sequence lengths or arities disagree
    ShapeMismatch(String),
    /// A symbolic name reached code generation
    UnboundParameter(String),
    /// The program uses something the target cannot express
    UnsupportedFeature(String),
    /// A value falls outside what the device can represent
    CapabilityViolation { quantity: String, message: String },
    /// The same parameter was assigned more than once
    DuplicateAssignment(String),
    /// Decimal arithmetic overflowed or divided by zero
    Arithmetic(String),
    /// Shot count is not a positive integer
    InvalidShots(u32),
    /// Configured resource limit exceeded
    ResourceLimit {
        resource: String,
        limit: u64,
        requested: u64,
    },
}

impl CompileError {
    pub(crate) fn type_kind(
        name: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        CompileError::TypeKind {
            name: name.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn capability(quantity: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::CapabilityViolation {
            quantity: quantity.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::TypeKind {
                name,
                expected,
                found,
            } => write!(
                f,
                "parameter '{}' must be {}, found type: {}",
                name, expected, found
            ),
            CompileError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            CompileError::UnboundParameter(name) => {
                write!(f, "Unbound parameter: '{}' has no assigned value", name)
            }
            CompileError::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            CompileError::CapabilityViolation { quantity, message } => {
                write!(f, "Capability violation for {}: {}", quantity, message)
            }
            CompileError::DuplicateAssignment(name) => {
                write!(f, "Parameter '{}' is assigned more than once", name)
            }
            CompileError::Arithmetic(msg) => write!(f, "Arithmetic error: {}", msg),
            CompileError::InvalidShots(shots) => {
                write!(f, "shots must be a positive integer, got {}", shots)
            }
            CompileError::ResourceLimit {
                resource,
                limit,
                requested,
            } => write!(
                f,
                "Resource limit exceeded for {}: limit={}, requested={}",
                resource, limit, requested
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Backend-specific errors, recorded per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Task or backend not found
    NotFound(String),
    /// Backend unavailable
    Unavailable(String),
    /// Execution failed
    ExecutionFailed(String),
    /// Timeout
    Timeout(String),
    /// Invalid request
    InvalidRequest(String),
    /// HTTP error
    Http(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotFound(name) => write!(f, "Not found: {}", name),
            BackendError::Unavailable(msg) => write!(f, "Backend unavailable: {}", msg),
            BackendError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            BackendError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            BackendError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            BackendError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

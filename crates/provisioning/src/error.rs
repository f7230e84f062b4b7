//! Provisioning error types and status classification

use std::fmt;

use thiserror::Error;
use tonic::{Code, Status};

use crate::paths::IdentifierKind;

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// The provisioning step a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    Instance,
    Database,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStep::Instance => write!(f, "instance"),
            ProvisionStep::Database => write!(f, "database"),
        }
    }
}

/// Fatal provisioning failures.
///
/// "Already exists" is never represented here; it is reported as
/// [`Outcome::AlreadyExists`](crate::Outcome::AlreadyExists).
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid {kind} identifier '{value}': {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        value: String,
        reason: &'static str,
    },

    #[error("Failed to connect {step} admin client to {endpoint}: {source}")]
    Connect {
        step: ProvisionStep,
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Create {step} request failed with {code:?}: {message}")]
    Rpc {
        step: ProvisionStep,
        code: Code,
        message: String,
    },

    #[error("Create {step} operation failed with {code:?}: {message}")]
    Operation {
        step: ProvisionStep,
        code: Code,
        message: String,
    },
}

impl ProvisionError {
    /// Create a request error from a rejected submission
    pub fn rpc(step: ProvisionStep, status: &Status) -> Self {
        Self::Rpc {
            step,
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    /// Create an operation error from a failed long-running operation
    pub fn operation(step: ProvisionStep, status: &Status) -> Self {
        Self::Operation {
            step,
            code: status.code(),
            message: status.message().to_string(),
        }
    }

    /// Status code carried by the failure, if the remote API returned one
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { code, .. } | Self::Operation { code, .. } => Some(*code),
            Self::InvalidIdentifier { .. } | Self::Connect { .. } => None,
        }
    }

    /// The step that failed, if the failure happened after planning
    pub fn step(&self) -> Option<ProvisionStep> {
        match self {
            Self::Connect { step, .. } | Self::Rpc { step, .. } | Self::Operation { step, .. } => {
                Some(*step)
            }
            Self::InvalidIdentifier { .. } => None,
        }
    }
}

/// Classify a rejected creation request.
///
/// `ALREADY_EXISTS` means the resource is present and the step is satisfied.
/// Any other code is fatal.
pub fn classify_submit(step: ProvisionStep, status: Status) -> Result<crate::Outcome> {
    if status.code() == Code::AlreadyExists {
        Ok(crate::Outcome::AlreadyExists)
    } else {
        Err(ProvisionError::rpc(step, &status))
    }
}

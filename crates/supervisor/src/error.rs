//! Supervisor error types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Server binary not found: {0:?}")]
    BinaryNotFound(PathBuf),

    #[error("Port {port} is already in use: {reason}")]
    PortInUse { port: u16, reason: String },

    #[error("Failed to spawn server {binary:?}: {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for server: {0}")]
    Wait(#[source] io::Error),

    #[error("Failed to stop server: {0}")]
    Kill(#[source] io::Error),
}

impl SupervisorError {
    /// Create a spawn error for a binary path
    pub fn spawn(binary: &Path, source: io::Error) -> Self {
        Self::Spawn {
            binary: binary.to_path_buf(),
            source,
        }
    }

    /// Create a port in use error
    pub fn port_in_use(port: u16, reason: impl Into<String>) -> Self {
        Self::PortInUse {
            port,
            reason: reason.into(),
        }
    }
}

//! Admin capability interfaces.
//!
//! The coordinator only ever talks to the emulator through these traits:
//! a creation call that returns a long-running operation, an await on that
//! operation, and an explicit close. [`grpc`] provides the tonic-backed
//! implementation; [`recording`] provides call-recording doubles for tests.

pub mod grpc;
pub mod proto;
pub mod recording;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tonic::Status;

use crate::error::Result;
use proto::{CreateDatabaseRequest, CreateInstanceRequest, Operation};

pub use grpc::GrpcAdminConnector;

/// Default interval between long-running operation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default interval between connection attempts while the server starts
pub const DEFAULT_CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(250);

/// Where the admin capabilities connect.
///
/// The endpoint is reached over plaintext without end-user authentication;
/// the bootstrapper and the emulator are co-located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEndpoint {
    /// `host:port` of the emulator gRPC server
    pub address: String,
    /// Interval between long-running operation polls
    pub poll_interval: Duration,
    /// Interval between connection attempts
    pub connect_retry_interval: Duration,
}

impl AdminEndpoint {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_retry_interval: DEFAULT_CONNECT_RETRY_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connect_retry_interval(mut self, interval: Duration) -> Self {
        self.connect_retry_interval = interval;
        self
    }

    /// URI used to dial the endpoint
    pub fn uri(&self) -> String {
        format!("http://{}", self.address)
    }
}

impl fmt::Display for AdminEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Instance administration capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstanceAdmin: Send + Sync {
    /// Submit an instance creation request
    ///
    /// # Returns
    /// The long-running operation tracking the creation
    async fn create_instance(&self, request: CreateInstanceRequest)
        -> std::result::Result<Operation, Status>;

    /// Wait for a long-running operation to complete
    ///
    /// Returns an error if polling fails or the operation finished with an error.
    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status>;

    /// Release the handle. Further calls fail with `CANCELLED`.
    async fn close(&self);
}

/// Database administration capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseAdmin: Send + Sync {
    /// Submit a database creation request
    ///
    /// # Returns
    /// The long-running operation tracking the creation
    async fn create_database(&self, request: CreateDatabaseRequest)
        -> std::result::Result<Operation, Status>;

    /// Wait for a long-running operation to complete
    ///
    /// Returns an error if polling fails or the operation finished with an error.
    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status>;

    /// Release the handle. Further calls fail with `CANCELLED`.
    async fn close(&self);
}

/// Builds admin handles for an endpoint
#[async_trait]
pub trait AdminConnector: Send + Sync {
    async fn instance_admin(&self, endpoint: &AdminEndpoint) -> Result<Box<dyn InstanceAdmin>>;

    async fn database_admin(&self, endpoint: &AdminEndpoint) -> Result<Box<dyn DatabaseAdmin>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uri() {
        let endpoint = AdminEndpoint::new("0.0.0.0:9010");
        assert_eq!(endpoint.uri(), "http://0.0.0.0:9010");
        assert_eq!(endpoint.to_string(), "0.0.0.0:9010");
        assert_eq!(endpoint.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}

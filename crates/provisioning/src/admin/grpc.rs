//! gRPC admin clients for the emulator.
//!
//! Uses tonic's low-level unary client with the inline message types from
//! [`proto`](super::proto), so no generated service stubs are needed.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::debug;

use super::proto::{
    CreateDatabaseRequest, CreateInstanceRequest, GetOperationRequest, Operation,
};
use super::{AdminConnector, AdminEndpoint, DatabaseAdmin, InstanceAdmin};
use crate::error::{ProvisionError, ProvisionStep, Result};

const CREATE_INSTANCE_PATH: &str =
    "/google.spanner.admin.instance.v1.InstanceAdmin/CreateInstance";
const CREATE_DATABASE_PATH: &str =
    "/google.spanner.admin.database.v1.DatabaseAdmin/CreateDatabase";
const GET_OPERATION_PATH: &str = "/google.longrunning.Operations/GetOperation";

/// Connect to the admin endpoint, waiting until it accepts connections.
///
/// The emulator server is started concurrently with provisioning, so a
/// refused connection is retried at `connect_retry_interval` with no
/// deadline. Only a malformed endpoint fails immediately.
pub async fn connect_when_ready(
    endpoint: &AdminEndpoint,
) -> std::result::Result<Channel, tonic::transport::Error> {
    let target = Endpoint::from_shared(endpoint.uri())?;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match target.connect().await {
            Ok(channel) => {
                debug!(endpoint = %endpoint, attempt, "Admin endpoint connected");
                return Ok(channel);
            }
            Err(e) => {
                debug!(
                    endpoint = %endpoint,
                    attempt,
                    error = %e,
                    "Admin endpoint not ready, retrying"
                );
                tokio::time::sleep(endpoint.connect_retry_interval).await;
            }
        }
    }
}

/// A closable channel shared by the instance and database clients
struct AdminChannel {
    channel: Mutex<Option<Channel>>,
    poll_interval: Duration,
}

impl AdminChannel {
    fn new(channel: Channel, poll_interval: Duration) -> Self {
        Self {
            channel: Mutex::new(Some(channel)),
            poll_interval,
        }
    }

    fn channel(&self) -> std::result::Result<Channel, Status> {
        self.channel
            .lock()
            .clone()
            .ok_or_else(|| Status::cancelled("admin client is closed"))
    }

    fn close(&self) {
        self.channel.lock().take();
    }

    async fn unary<T, R>(&self, path: &'static str, message: T) -> std::result::Result<R, Status>
    where
        T: prost::Message + Send + Sync + 'static,
        R: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel()?);
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("admin service was not ready: {}", e)))?;

        let codec = ProstCodec::<T, R>::default();
        let response = grpc
            .unary(Request::new(message), PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }

    /// Poll until `operation` is done, surfacing its error status if any
    async fn wait(&self, mut operation: Operation) -> std::result::Result<Operation, Status> {
        let mut polls: u32 = 0;

        while !operation.done {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;
            debug!(operation = %operation.name, polls, "Polling operation");
            operation = self
                .unary(
                    GET_OPERATION_PATH,
                    GetOperationRequest {
                        name: operation.name.clone(),
                    },
                )
                .await?;
        }

        match operation.error() {
            Some(status) => Err(status.to_status()),
            None => Ok(operation),
        }
    }
}

/// Instance admin client over gRPC
pub struct GrpcInstanceAdmin {
    inner: AdminChannel,
}

impl GrpcInstanceAdmin {
    /// Create a client from an existing channel
    pub fn from_channel(channel: Channel, poll_interval: Duration) -> Self {
        Self {
            inner: AdminChannel::new(channel, poll_interval),
        }
    }
}

#[async_trait]
impl InstanceAdmin for GrpcInstanceAdmin {
    async fn create_instance(
        &self,
        request: CreateInstanceRequest,
    ) -> std::result::Result<Operation, Status> {
        self.inner.unary(CREATE_INSTANCE_PATH, request).await
    }

    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status> {
        self.inner.wait(operation).await
    }

    async fn close(&self) {
        self.inner.close();
        debug!("Instance admin client closed");
    }
}

/// Database admin client over gRPC
pub struct GrpcDatabaseAdmin {
    inner: AdminChannel,
}

impl GrpcDatabaseAdmin {
    /// Create a client from an existing channel
    pub fn from_channel(channel: Channel, poll_interval: Duration) -> Self {
        Self {
            inner: AdminChannel::new(channel, poll_interval),
        }
    }
}

#[async_trait]
impl DatabaseAdmin for GrpcDatabaseAdmin {
    async fn create_database(
        &self,
        request: CreateDatabaseRequest,
    ) -> std::result::Result<Operation, Status> {
        self.inner.unary(CREATE_DATABASE_PATH, request).await
    }

    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status> {
        self.inner.wait(operation).await
    }

    async fn close(&self) {
        self.inner.close();
        debug!("Database admin client closed");
    }
}

/// Connector that dials the emulator over plaintext gRPC
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcAdminConnector;

impl GrpcAdminConnector {
    async fn connect(&self, step: ProvisionStep, endpoint: &AdminEndpoint) -> Result<Channel> {
        connect_when_ready(endpoint)
            .await
            .map_err(|source| ProvisionError::Connect {
                step,
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

#[async_trait]
impl AdminConnector for GrpcAdminConnector {
    async fn instance_admin(&self, endpoint: &AdminEndpoint) -> Result<Box<dyn InstanceAdmin>> {
        let channel = self.connect(ProvisionStep::Instance, endpoint).await?;
        Ok(Box::new(GrpcInstanceAdmin::from_channel(
            channel,
            endpoint.poll_interval,
        )))
    }

    async fn database_admin(&self, endpoint: &AdminEndpoint) -> Result<Box<dyn DatabaseAdmin>> {
        let channel = self.connect(ProvisionStep::Database, endpoint).await?;
        Ok(Box::new(GrpcDatabaseAdmin::from_channel(
            channel,
            endpoint.poll_interval,
        )))
    }
}

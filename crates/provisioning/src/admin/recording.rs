//! Call-recording admin doubles.
//!
//! Every call made through a [`RecordingConnector`] (connects, creations,
//! operation waits and closes) is appended to a shared [`CallLog`], so tests
//! can assert both what was called and in which order.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tonic::{Code, Status};

use super::proto::{CreateDatabaseRequest, CreateInstanceRequest, Operation};
use super::{AdminConnector, AdminEndpoint, DatabaseAdmin, InstanceAdmin};
use crate::error::Result;

/// One recorded admin call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    ConnectInstanceAdmin,
    CreateInstance { parent: String, instance_id: String },
    WaitInstanceOperation { name: String },
    CloseInstanceAdmin,
    ConnectDatabaseAdmin,
    CreateDatabase { parent: String, statement: String },
    WaitDatabaseOperation { name: String },
    CloseDatabaseAdmin,
}

/// Shared, ordered log of admin calls
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<AdminCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: AdminCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().clone()
    }

    pub fn instance_creations(&self) -> usize {
        self.count(|c| matches!(c, AdminCall::CreateInstance { .. }))
    }

    pub fn database_creations(&self) -> usize {
        self.count(|c| matches!(c, AdminCall::CreateDatabase { .. }))
    }

    pub fn count(&self, predicate: impl Fn(&AdminCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }
}

/// How a recording admin responds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Behavior {
    /// Status code the creation request is rejected with
    pub create_error: Option<Code>,
    /// Status code the long-running operation finishes with
    pub wait_error: Option<Code>,
}

impl Behavior {
    /// Creation and operation both succeed
    pub fn succeed() -> Self {
        Self::default()
    }

    /// The creation request is rejected with `code`
    pub fn reject(code: Code) -> Self {
        Self {
            create_error: Some(code),
            wait_error: None,
        }
    }

    /// The resource already exists
    pub fn already_exists() -> Self {
        Self::reject(Code::AlreadyExists)
    }

    /// The creation request is accepted but the operation fails with `code`
    pub fn fail_operation(code: Code) -> Self {
        Self {
            create_error: None,
            wait_error: Some(code),
        }
    }

    fn submit(&self, name: String) -> std::result::Result<Operation, Status> {
        match self.create_error {
            Some(code) => Err(Status::new(code, "rejected by recording admin")),
            None => Ok(Operation {
                name,
                done: false,
                ..Default::default()
            }),
        }
    }

    fn finish(&self, mut operation: Operation) -> std::result::Result<Operation, Status> {
        match self.wait_error {
            Some(code) => Err(Status::new(code, "operation failed in recording admin")),
            None => {
                operation.done = true;
                Ok(operation)
            }
        }
    }
}

/// Recording instance admin
pub struct RecordingInstanceAdmin {
    log: CallLog,
    behavior: Behavior,
}

impl RecordingInstanceAdmin {
    pub fn new(log: CallLog, behavior: Behavior) -> Self {
        Self { log, behavior }
    }
}

#[async_trait]
impl InstanceAdmin for RecordingInstanceAdmin {
    async fn create_instance(
        &self,
        request: CreateInstanceRequest,
    ) -> std::result::Result<Operation, Status> {
        let name = format!(
            "{}/instances/{}/operations/create",
            request.parent, request.instance_id
        );
        self.log.record(AdminCall::CreateInstance {
            parent: request.parent,
            instance_id: request.instance_id,
        });
        self.behavior.submit(name)
    }

    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status> {
        self.log.record(AdminCall::WaitInstanceOperation {
            name: operation.name.clone(),
        });
        self.behavior.finish(operation)
    }

    async fn close(&self) {
        self.log.record(AdminCall::CloseInstanceAdmin);
    }
}

/// Recording database admin
pub struct RecordingDatabaseAdmin {
    log: CallLog,
    behavior: Behavior,
}

impl RecordingDatabaseAdmin {
    pub fn new(log: CallLog, behavior: Behavior) -> Self {
        Self { log, behavior }
    }
}

#[async_trait]
impl DatabaseAdmin for RecordingDatabaseAdmin {
    async fn create_database(
        &self,
        request: CreateDatabaseRequest,
    ) -> std::result::Result<Operation, Status> {
        let name = format!("{}/databases/operations/create", request.parent);
        self.log.record(AdminCall::CreateDatabase {
            parent: request.parent,
            statement: request.create_statement,
        });
        self.behavior.submit(name)
    }

    async fn wait_operation(&self, operation: Operation) -> std::result::Result<Operation, Status> {
        self.log.record(AdminCall::WaitDatabaseOperation {
            name: operation.name.clone(),
        });
        self.behavior.finish(operation)
    }

    async fn close(&self) {
        self.log.record(AdminCall::CloseDatabaseAdmin);
    }
}

/// Connector handing out recording admins that share one [`CallLog`]
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    log: CallLog,
    instance: Behavior,
    database: Behavior,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure how the instance admin responds
    pub fn with_instance(mut self, behavior: Behavior) -> Self {
        self.instance = behavior;
        self
    }

    /// Configure how the database admin responds
    pub fn with_database(mut self, behavior: Behavior) -> Self {
        self.database = behavior;
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }
}

#[async_trait]
impl AdminConnector for RecordingConnector {
    async fn instance_admin(&self, _endpoint: &AdminEndpoint) -> Result<Box<dyn InstanceAdmin>> {
        self.log.record(AdminCall::ConnectInstanceAdmin);
        Ok(Box::new(RecordingInstanceAdmin::new(
            self.log.clone(),
            self.instance,
        )))
    }

    async fn database_admin(&self, _endpoint: &AdminEndpoint) -> Result<Box<dyn DatabaseAdmin>> {
        self.log.record(AdminCall::ConnectDatabaseAdmin);
        Ok(Box::new(RecordingDatabaseAdmin::new(
            self.log.clone(),
            self.database,
        )))
    }
}

//! Admin API message types.
//!
//! Only the fields the bootstrapper reads or writes are declared; the tags
//! match the published `google.spanner.admin.*.v1`, `google.longrunning` and
//! `google.rpc` protos. Defined inline to avoid a build.rs step.

use tonic::{Code, Status};

/// `google.spanner.admin.instance.v1.Instance`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Instance {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub config: String,
    #[prost(string, tag = "3")]
    pub display_name: String,
    #[prost(int32, tag = "5")]
    pub node_count: i32,
}

/// `google.spanner.admin.instance.v1.CreateInstanceRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateInstanceRequest {
    #[prost(string, tag = "1")]
    pub parent: String,
    #[prost(string, tag = "2")]
    pub instance_id: String,
    #[prost(message, optional, tag = "3")]
    pub instance: Option<Instance>,
}

/// `google.spanner.admin.database.v1.CreateDatabaseRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateDatabaseRequest {
    #[prost(string, tag = "1")]
    pub parent: String,
    #[prost(string, tag = "2")]
    pub create_statement: String,
    #[prost(string, repeated, tag = "3")]
    pub extra_statements: Vec<String>,
}

/// `google.rpc.Status`
#[derive(Clone, PartialEq, prost::Message)]
pub struct RpcStatus {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<prost_types::Any>,
}

impl RpcStatus {
    /// Convert the embedded status into a tonic status
    pub fn to_status(&self) -> Status {
        Status::new(Code::from(self.code), self.message.clone())
    }
}

/// `google.longrunning.Operation`
#[derive(Clone, PartialEq, prost::Message)]
pub struct Operation {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub metadata: Option<prost_types::Any>,
    #[prost(bool, tag = "3")]
    pub done: bool,
    #[prost(oneof = "operation::Result", tags = "4, 5")]
    pub result: Option<operation::Result>,
}

pub mod operation {
    /// Terminal result of an operation; set only once `done` is true
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "4")]
        Error(super::RpcStatus),
        #[prost(message, tag = "5")]
        Response(prost_types::Any),
    }
}

impl Operation {
    /// The error the operation finished with, if any
    pub fn error(&self) -> Option<&RpcStatus> {
        match &self.result {
            Some(operation::Result::Error(status)) => Some(status),
            _ => None,
        }
    }
}

/// `google.longrunning.GetOperationRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct GetOperationRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_operation_error_decodes() {
        let op = Operation {
            name: "projects/p/instances/i/operations/1".to_string(),
            metadata: None,
            done: true,
            result: Some(operation::Result::Error(RpcStatus {
                code: Code::ResourceExhausted as i32,
                message: "no capacity".to_string(),
                details: vec![],
            })),
        };

        let decoded = Operation::decode(op.encode_to_vec().as_slice()).unwrap();
        let status = decoded.error().unwrap().to_status();
        assert_eq!(status.code(), Code::ResourceExhausted);
        assert_eq!(status.message(), "no capacity");
    }
}

//! Idempotent provisioning for the emulator
//!
//! This crate ensures that the instance and database the emulator gateway
//! serves already exist in the emulator's backing store:
//! - Plans which steps run from the supplied identifiers ([`ProvisioningPlan`])
//! - Creates the instance, then the database, through narrow admin
//!   capabilities ([`InstanceAdmin`], [`DatabaseAdmin`])
//! - Treats `ALREADY_EXISTS` as success and everything else as fatal
//!
//! # Quick Start
//!
//! ```ignore
//! use provisioning::{AdminEndpoint, GrpcAdminConnector, ProvisioningCoordinator, ProvisioningTarget};
//!
//! let coordinator = ProvisioningCoordinator::new(
//!     GrpcAdminConnector,
//!     AdminEndpoint::new("0.0.0.0:9010"),
//! );
//! let report = coordinator.run(&target).await?;
//! tracing::info!(instance = %report.instance, database = %report.database, "Provisioned");
//! ```

pub mod admin;
pub mod coordinator;
pub mod error;
pub mod paths;
pub mod plan;

pub use admin::{AdminConnector, AdminEndpoint, DatabaseAdmin, GrpcAdminConnector, InstanceAdmin};
pub use coordinator::{ProvisionReport, ProvisioningCoordinator};
pub use error::{classify_submit, ProvisionError, ProvisionStep, Result};
pub use plan::{
    DatabaseSpec, InstanceAttributes, InstanceSpec, Outcome, ProvisioningPlan, ProvisioningTarget,
    SkipReason, Step,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::recording::{AdminCall, Behavior, RecordingConnector};
    use tonic::Code;

    fn target(project: Option<&str>, instance: Option<&str>, database: Option<&str>) -> ProvisioningTarget {
        ProvisioningTarget {
            project_id: project.map(String::from),
            instance_id: instance.map(String::from),
            database_id: database.map(String::from),
            instance: InstanceAttributes::default(),
        }
    }

    fn run_with(connector: RecordingConnector) -> ProvisioningCoordinator<RecordingConnector> {
        ProvisioningCoordinator::new(connector, AdminEndpoint::new("0.0.0.0:9010"))
    }

    #[tokio::test]
    async fn test_instance_only() {
        let connector = RecordingConnector::new();
        let log = connector.log().clone();

        let report = run_with(connector)
            .run(&target(Some("p"), Some("i"), None))
            .await
            .unwrap();

        assert_eq!(report.instance, Outcome::Created);
        assert_eq!(report.database, Outcome::Skipped(SkipReason::MissingDatabase));
        assert_eq!(log.instance_creations(), 1);
        assert_eq!(log.database_creations(), 0);
    }

    #[tokio::test]
    async fn test_existing_instance_new_database() {
        let connector = RecordingConnector::new()
            .with_instance(Behavior::already_exists())
            .with_database(Behavior::succeed());
        let log = connector.log().clone();

        let report = run_with(connector)
            .run(&target(Some("p"), Some("i"), Some("d")))
            .await
            .unwrap();

        assert_eq!(report.instance, Outcome::AlreadyExists);
        assert_eq!(report.database, Outcome::Created);
        assert_eq!(
            log.calls(),
            vec![
                AdminCall::ConnectInstanceAdmin,
                AdminCall::CreateInstance {
                    parent: "projects/p".to_string(),
                    instance_id: "i".to_string(),
                },
                AdminCall::CloseInstanceAdmin,
                AdminCall::ConnectDatabaseAdmin,
                AdminCall::CreateDatabase {
                    parent: "projects/p/instances/i".to_string(),
                    statement: "CREATE DATABASE `d`".to_string(),
                },
                AdminCall::WaitDatabaseOperation {
                    name: "projects/p/instances/i/databases/operations/create".to_string(),
                },
                AdminCall::CloseDatabaseAdmin,
            ]
        );
    }

    #[tokio::test]
    async fn test_rerun_against_provisioned_store() {
        let connector = RecordingConnector::new()
            .with_instance(Behavior::already_exists())
            .with_database(Behavior::already_exists());

        let report = run_with(connector)
            .run(&target(Some("p"), Some("i"), Some("d")))
            .await
            .unwrap();

        assert_eq!(report.instance, Outcome::AlreadyExists);
        assert_eq!(report.database, Outcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_failed_database_operation_is_fatal() {
        let connector = RecordingConnector::new()
            .with_database(Behavior::fail_operation(Code::Internal));
        let log = connector.log().clone();

        let err = run_with(connector)
            .run(&target(Some("p"), Some("i"), Some("d")))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some(Code::Internal));
        assert_eq!(err.step(), Some(ProvisionStep::Database));
        // The handle is still released
        assert_eq!(log.calls().last(), Some(&AdminCall::CloseDatabaseAdmin));
    }

    #[tokio::test]
    async fn test_database_without_instance_is_skipped() {
        let connector = RecordingConnector::new();
        let log = connector.log().clone();

        let report = run_with(connector)
            .run(&target(Some("p"), None, Some("d")))
            .await
            .unwrap();

        assert_eq!(report.database, Outcome::Skipped(SkipReason::MissingInstance));
        assert!(log.calls().is_empty());
    }
}

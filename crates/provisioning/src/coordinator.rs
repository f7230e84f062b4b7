//! Provisioning coordinator
//!
//! Ensures the instance and then the database exist. Each step connects its
//! own admin handle, submits a creation request, awaits the long-running
//! operation and closes the handle whatever the outcome.

use tracing::{info, warn};

use crate::admin::proto::{CreateDatabaseRequest, CreateInstanceRequest, Instance};
use crate::admin::{AdminConnector, AdminEndpoint, DatabaseAdmin, InstanceAdmin};
use crate::error::{classify_submit, ProvisionError, ProvisionStep, Result};
use crate::paths;
use crate::plan::{
    DatabaseSpec, InstanceSpec, Outcome, ProvisioningPlan, ProvisioningTarget, SkipReason, Step,
};

/// Outcomes of one provisioning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionReport {
    pub instance: Outcome,
    pub database: Outcome,
}

/// Runs the one-shot provisioning pass against an admin endpoint
pub struct ProvisioningCoordinator<C> {
    connector: C,
    endpoint: AdminEndpoint,
}

impl<C: AdminConnector> ProvisioningCoordinator<C> {
    pub fn new(connector: C, endpoint: AdminEndpoint) -> Self {
        Self {
            connector,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &AdminEndpoint {
        &self.endpoint
    }

    /// Plan and run both steps, instance first.
    ///
    /// A fatal instance error stops the pass before the database step.
    pub async fn run(&self, target: &ProvisioningTarget) -> Result<ProvisionReport> {
        let plan = ProvisioningPlan::from_target(target);
        if plan.is_empty() {
            info!("No identifiers configured, nothing to provision");
        }

        let instance = match &plan.instance {
            Step::Run(spec) => self.ensure_instance(spec).await?,
            Step::Skip(reason) => {
                info!(reason = %reason, "Skipping instance provisioning");
                Outcome::Skipped(*reason)
            }
        };

        let database = match &plan.database {
            Step::Run(spec) => self.ensure_database(spec).await?,
            Step::Skip(SkipReason::MissingDatabase) => {
                info!("Skipping database provisioning: no database id");
                Outcome::Skipped(SkipReason::MissingDatabase)
            }
            Step::Skip(reason) => {
                warn!(
                    reason = %reason,
                    database = ?target.database_id,
                    "Database id is set but its parent is not, skipping database provisioning"
                );
                Outcome::Skipped(*reason)
            }
        };

        Ok(ProvisionReport { instance, database })
    }

    /// Ensure the instance exists.
    ///
    /// Returns [`Outcome::AlreadyExists`] when the emulator reports the
    /// instance as present.
    pub async fn ensure_instance(&self, spec: &InstanceSpec) -> Result<Outcome> {
        let parent = paths::project_path(&spec.project_id)?;
        let name = paths::instance_path(&spec.project_id, &spec.instance_id)?;
        let request = CreateInstanceRequest {
            parent,
            instance_id: spec.instance_id.clone(),
            instance: Some(Instance {
                name,
                config: spec.attributes.config.clone(),
                display_name: spec.attributes.display_name.clone(),
                node_count: spec.attributes.node_count,
            }),
        };

        info!(
            project = %spec.project_id,
            instance = %spec.instance_id,
            endpoint = %self.endpoint,
            "Attempting to create instance"
        );

        let admin = self.connector.instance_admin(&self.endpoint).await?;
        let result = create_instance(admin.as_ref(), request).await;
        admin.close().await;

        log_outcome(ProvisionStep::Instance, &spec.instance_id, &result);
        result
    }

    /// Ensure the database exists under its instance.
    ///
    /// Returns [`Outcome::AlreadyExists`] when the emulator reports the
    /// database as present.
    pub async fn ensure_database(&self, spec: &DatabaseSpec) -> Result<Outcome> {
        let parent = paths::instance_path(&spec.project_id, &spec.instance_id)?;
        let create_statement = paths::create_database_statement(&spec.database_id)?;
        let request = CreateDatabaseRequest {
            parent,
            create_statement,
            extra_statements: Vec::new(),
        };

        info!(
            project = %spec.project_id,
            instance = %spec.instance_id,
            database = %spec.database_id,
            endpoint = %self.endpoint,
            "Attempting to create database"
        );

        let admin = self.connector.database_admin(&self.endpoint).await?;
        let result = create_database(admin.as_ref(), request).await;
        admin.close().await;

        log_outcome(ProvisionStep::Database, &spec.database_id, &result);
        result
    }
}

async fn create_instance(admin: &dyn InstanceAdmin, request: CreateInstanceRequest) -> Result<Outcome> {
    let operation = match admin.create_instance(request).await {
        Ok(operation) => operation,
        Err(status) => return classify_submit(ProvisionStep::Instance, status),
    };

    admin
        .wait_operation(operation)
        .await
        .map_err(|status| ProvisionError::operation(ProvisionStep::Instance, &status))?;
    Ok(Outcome::Created)
}

async fn create_database(admin: &dyn DatabaseAdmin, request: CreateDatabaseRequest) -> Result<Outcome> {
    let operation = match admin.create_database(request).await {
        Ok(operation) => operation,
        Err(status) => return classify_submit(ProvisionStep::Database, status),
    };

    admin
        .wait_operation(operation)
        .await
        .map_err(|status| ProvisionError::operation(ProvisionStep::Database, &status))?;
    Ok(Outcome::Created)
}

fn log_outcome(step: ProvisionStep, id: &str, result: &Result<Outcome>) {
    match result {
        Ok(Outcome::Created) => info!(%step, id, "{} created", step),
        Ok(Outcome::AlreadyExists) => info!(%step, id, "{} already exists, continuing", step),
        // Fatal errors are reported by whoever joins the provisioning task
        Ok(Outcome::Skipped(_)) | Err(_) => {}
    }
}

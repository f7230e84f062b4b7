//! Provisioning plan
//!
//! Decides, from the supplied identifiers alone, which steps run and which
//! are skipped. Planning never talks to the emulator.

use std::fmt;

/// Default instance configuration class understood by the emulator
pub const DEFAULT_INSTANCE_CONFIG: &str = "emulator-config";

/// Default number of nodes for a new instance
pub const DEFAULT_NODE_COUNT: i32 = 1;

/// Attributes of an instance to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceAttributes {
    pub config: String,
    pub display_name: String,
    pub node_count: i32,
}

impl Default for InstanceAttributes {
    fn default() -> Self {
        Self {
            config: DEFAULT_INSTANCE_CONFIG.to_string(),
            display_name: String::new(),
            node_count: DEFAULT_NODE_COUNT,
        }
    }
}

/// Identifiers and attributes supplied by configuration.
///
/// Any identifier may be absent. Empty and whitespace-only values count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningTarget {
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub database_id: Option<String>,
    pub instance: InstanceAttributes,
}

/// A fully identified instance to ensure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    pub project_id: String,
    pub instance_id: String,
    pub attributes: InstanceAttributes,
}

/// A fully identified database to ensure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub project_id: String,
    pub instance_id: String,
    pub database_id: String,
}

/// Why a step was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingProject,
    MissingInstance,
    MissingDatabase,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingProject => write!(f, "no project id"),
            SkipReason::MissingInstance => write!(f, "no instance id"),
            SkipReason::MissingDatabase => write!(f, "no database id"),
        }
    }
}

/// A planned step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Run(T),
    Skip(SkipReason),
}

impl<T> Step<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Step::Skip(_))
    }
}

/// Result of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The resource was created by this run
    Created,
    /// The resource was created by an earlier run
    AlreadyExists,
    /// The step was not attempted
    Skipped(SkipReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::AlreadyExists => write!(f, "already exists"),
            Outcome::Skipped(reason) => write!(f, "skipped ({})", reason),
        }
    }
}

/// Which steps a run performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub instance: Step<InstanceSpec>,
    pub database: Step<DatabaseSpec>,
}

impl ProvisioningPlan {
    /// Plan both steps.
    ///
    /// The database step needs the project and instance ids as well as its
    /// own; it is skipped when either parent id is missing rather than sent
    /// with an empty parent path.
    pub fn from_target(target: &ProvisioningTarget) -> Self {
        let project = present(&target.project_id);
        let instance = present(&target.instance_id);
        let database = present(&target.database_id);

        let instance_step = match (project, instance) {
            (None, _) => Step::Skip(SkipReason::MissingProject),
            (_, None) => Step::Skip(SkipReason::MissingInstance),
            (Some(project), Some(instance)) => Step::Run(InstanceSpec {
                project_id: project.to_string(),
                instance_id: instance.to_string(),
                attributes: target.instance.clone(),
            }),
        };

        let database_step = match (database, project, instance) {
            (None, _, _) => Step::Skip(SkipReason::MissingDatabase),
            (_, None, _) => Step::Skip(SkipReason::MissingProject),
            (_, _, None) => Step::Skip(SkipReason::MissingInstance),
            (Some(database), Some(project), Some(instance)) => Step::Run(DatabaseSpec {
                project_id: project.to_string(),
                instance_id: instance.to_string(),
                database_id: database.to_string(),
            }),
        };

        Self {
            instance: instance_step,
            database: database_step,
        }
    }

    /// True when neither step will run
    pub fn is_empty(&self) -> bool {
        self.instance.is_skipped() && self.database.is_skipped()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

//! Resource name formatting for the emulator admin API
//!
//! Every identifier is checked before it is embedded in a path or a DDL
//! statement. Identifiers must be non-empty and must not contain `/`,
//! whitespace or a backtick.

use std::fmt;

use crate::error::{ProvisionError, Result};

/// Which identifier a value was supplied for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Project,
    Instance,
    Database,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Project => write!(f, "project"),
            IdentifierKind::Instance => write!(f, "instance"),
            IdentifierKind::Database => write!(f, "database"),
        }
    }
}

/// Check that `value` can be used as a single path segment
pub fn validate_identifier(kind: IdentifierKind, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value.contains('/') {
        Some("must not contain '/'")
    } else if value.chars().any(char::is_whitespace) {
        Some("must not contain whitespace")
    } else if value.contains('`') {
        Some("must not contain '`'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ProvisionError::InvalidIdentifier {
            kind,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// `projects/{project}`
pub fn project_path(project: &str) -> Result<String> {
    validate_identifier(IdentifierKind::Project, project)?;
    Ok(format!("projects/{}", project))
}

/// `projects/{project}/instances/{instance}`
pub fn instance_path(project: &str, instance: &str) -> Result<String> {
    let parent = project_path(project)?;
    validate_identifier(IdentifierKind::Instance, instance)?;
    Ok(format!("{}/instances/{}", parent, instance))
}

/// `projects/{project}/instances/{instance}/databases/{database}`
pub fn database_path(project: &str, instance: &str, database: &str) -> Result<String> {
    let parent = instance_path(project, instance)?;
    validate_identifier(IdentifierKind::Database, database)?;
    Ok(format!("{}/databases/{}", parent, database))
}

/// DDL statement that creates `database` under its parent instance
pub fn create_database_statement(database: &str) -> Result<String> {
    validate_identifier(IdentifierKind::Database, database)?;
    Ok(format!("CREATE DATABASE `{}`", database))
}

use crate::*;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("server.hostname must not be empty")]
    MissingHostname,

    #[error("server.binary must not be empty")]
    MissingBinary,

    #[error("{field} must not be 0")]
    ZeroPort { field: String },

    #[error("server.grpc_port and server.http_port must differ, both are {port}")]
    PortConflict { port: u16 },

    #[error("provisioning.instance_config must not be empty")]
    MissingInstanceConfig,

    #[error("provisioning.node_count must be at least 1, got {0}")]
    InvalidNodeCount(i32),

    #[error("{field} must be a positive integer")]
    InvalidPositiveInteger { field: String },

    #[error("{field} '{value}': {message}")]
    InvalidIdentifier {
        field: String,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_warning(&self, field: &str) -> bool {
        self.warnings.iter().any(|w| w.field == field)
    }
}

pub fn validate_config(config: &BootstrapConfig) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_server(&config.server, &mut report);
    validate_provisioning(&config.provisioning, &mut report);

    report
}

fn validate_server(server: &ServerSettings, report: &mut ValidationReport) {
    if server.hostname.trim().is_empty() {
        report.add_error(ValidationError::MissingHostname);
    }

    if server.binary.as_os_str().is_empty() {
        report.add_error(ValidationError::MissingBinary);
    }

    validate_port("server.grpc_port", server.grpc_port, report);
    validate_port("server.http_port", server.http_port, report);

    if server.grpc_port != 0 && server.grpc_port == server.http_port {
        report.add_error(ValidationError::PortConflict {
            port: server.grpc_port,
        });
    }
}

fn validate_port(field: &str, port: u16, report: &mut ValidationReport) {
    if port == 0 {
        report.add_error(ValidationError::ZeroPort {
            field: field.to_string(),
        });
    } else if port < 1024 {
        report.add_warning(
            field,
            &format!("Port {} is a privileged port (requires root/admin privileges)", port),
        );
    }
}

fn validate_provisioning(provisioning: &ProvisioningSettings, report: &mut ValidationReport) {
    let project = validate_identifier(
        "provisioning.project_id",
        provisioning.project_id.as_deref(),
        project_id_regex(),
        report,
    );
    let instance = validate_identifier(
        "provisioning.instance_id",
        provisioning.instance_id.as_deref(),
        instance_id_regex(),
        report,
    );
    let database = validate_identifier(
        "provisioning.database_id",
        provisioning.database_id.as_deref(),
        database_id_regex(),
        report,
    );

    if database && !(project && instance) {
        report.add_warning(
            "provisioning.database_id",
            "Database id is set without a project id and instance id; database provisioning will be skipped",
        );
    }

    if provisioning.instance_config.trim().is_empty() {
        report.add_error(ValidationError::MissingInstanceConfig);
    }

    if provisioning.node_count < 1 {
        report.add_error(ValidationError::InvalidNodeCount(provisioning.node_count));
    }

    if provisioning.operation_poll_interval_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provisioning.operation_poll_interval_ms".to_string(),
        });
    }

    if provisioning.connect_retry_interval_ms == 0 {
        report.add_error(ValidationError::InvalidPositiveInteger {
            field: "provisioning.connect_retry_interval_ms".to_string(),
        });
    }
}

/// Check an optional identifier. Returns true if it is present.
fn validate_identifier(
    field: &str,
    value: Option<&str>,
    naming: &Regex,
    report: &mut ValidationReport,
) -> bool {
    let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value,
        None => return false,
    };

    if has_unresolved_env_vars(value) {
        report.add_warning(
            field,
            &format!("'{}' looks like an unresolved environment variable", value),
        );
    }

    if value.contains('/') || value.contains('`') || value.chars().any(char::is_whitespace) {
        report.add_error(ValidationError::InvalidIdentifier {
            field: field.to_string(),
            value: value.to_string(),
            message: "must not contain '/', '`' or whitespace".to_string(),
        });
    } else if !naming.is_match(value) {
        report.add_warning(
            field,
            &format!("'{}' does not follow the Cloud Spanner naming rules", value),
        );
    }

    true
}

fn project_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][-a-z0-9]{4,28}[a-z0-9]$").expect("project id pattern is valid"))
}

fn instance_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][-a-z0-9]{0,62}[a-z0-9]$").expect("instance id pattern is valid"))
}

fn database_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_\-]{0,28}[a-z0-9]$").expect("database id pattern is valid"))
}

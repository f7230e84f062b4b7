//! Configuration for the emulator bootstrap
//!
//! The effective configuration is assembled in layers, lowest first:
//! built-in defaults, an optional YAML file (with `${VAR}` substitution),
//! then command-line and environment overrides. It is built once, after all
//! inputs are parsed, and then shared read-only by the provisioning task and
//! the server orchestrator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod defaults;
pub mod parser;
pub mod substitution;
pub mod validator;

pub use defaults::*;
pub use parser::*;
pub use substitution::*;
pub use validator::*;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BootstrapConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provisioning: ProvisioningSettings,
}

/// How the emulator server subprocess is started
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_server_binary")]
    pub binary: PathBuf,
    /// Arguments appended to the server's startup arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Time between SIGTERM and SIGKILL when the server is stopped
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            grpc_port: default_grpc_port(),
            http_port: default_http_port(),
            binary: default_server_binary(),
            extra_args: Vec::new(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

/// Which resources to provision and how
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProvisioningSettings {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default = "default_instance_config")]
    pub instance_config: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_node_count")]
    pub node_count: i32,
    #[serde(default = "default_operation_poll_interval_ms")]
    pub operation_poll_interval_ms: u64,
    #[serde(default = "default_connect_retry_interval_ms")]
    pub connect_retry_interval_ms: u64,
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            instance_id: None,
            database_id: None,
            instance_config: default_instance_config(),
            display_name: String::new(),
            node_count: default_node_count(),
            operation_poll_interval_ms: default_operation_poll_interval_ms(),
            connect_retry_interval_ms: default_connect_retry_interval_ms(),
        }
    }
}

/// Values supplied on the command line or through the environment.
///
/// `None` leaves the underlying value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub hostname: Option<String>,
    pub grpc_port: Option<u16>,
    pub http_port: Option<u16>,
    pub binary: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub project_id: Option<String>,
    pub instance_id: Option<String>,
    pub database_id: Option<String>,
}

impl BootstrapConfig {
    /// Layer `overrides` on top of this configuration
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        let server = &mut self.server;
        if let Some(hostname) = overrides.hostname {
            server.hostname = hostname;
        }
        if let Some(port) = overrides.grpc_port {
            server.grpc_port = port;
        }
        if let Some(port) = overrides.http_port {
            server.http_port = port;
        }
        if let Some(binary) = overrides.binary {
            server.binary = binary;
        }
        server.extra_args.extend(overrides.extra_args);

        let provisioning = &mut self.provisioning;
        if overrides.project_id.is_some() {
            provisioning.project_id = overrides.project_id;
        }
        if overrides.instance_id.is_some() {
            provisioning.instance_id = overrides.instance_id;
        }
        if overrides.database_id.is_some() {
            provisioning.database_id = overrides.database_id;
        }
    }

    /// `host:port` the admin clients connect to
    pub fn admin_endpoint(&self) -> String {
        format!("{}:{}", self.server.hostname, self.server.grpc_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.server.hostname, "0.0.0.0");
        assert_eq!(config.server.grpc_port, 9010);
        assert_eq!(config.server.http_port, 9020);
        assert_eq!(config.server.binary, PathBuf::from("./gateway_main"));
        assert_eq!(config.server.stop_grace_ms, 5000);
        assert_eq!(config.provisioning.instance_config, "emulator-config");
        assert_eq!(config.provisioning.node_count, 1);
        assert_eq!(config.provisioning.project_id, None);
        assert_eq!(config.admin_endpoint(), "0.0.0.0:9010");
    }

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = BootstrapConfig::default();
        config.provisioning.project_id = Some("from-file".to_string());
        config.provisioning.instance_id = Some("file-instance".to_string());

        config.apply_overrides(ConfigOverrides {
            grpc_port: Some(9999),
            project_id: Some("from-env".to_string()),
            extra_args: vec!["--verbose".to_string()],
            ..Default::default()
        });

        assert_eq!(config.server.grpc_port, 9999);
        assert_eq!(config.server.http_port, 9020);
        assert_eq!(config.server.extra_args, vec!["--verbose"]);
        assert_eq!(config.provisioning.project_id.as_deref(), Some("from-env"));
        assert_eq!(config.provisioning.instance_id.as_deref(), Some("file-instance"));
        assert_eq!(config.admin_endpoint(), "0.0.0.0:9999");
    }
}

use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Load configuration from a YAML file, substituting environment variables
#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BootstrapConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());

    let substituted = substitution::substitute_env_vars(&content);
    debug!("Environment variable substitution completed");

    let config = parse_config_str(&substituted)?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Parse configuration from YAML text. Missing sections take their defaults.
pub fn parse_config_str(yaml: &str) -> Result<BootstrapConfig> {
    if yaml.trim().is_empty() {
        return Ok(BootstrapConfig::default());
    }
    serde_yaml::from_str(yaml).with_context(|| "Failed to parse YAML configuration")
}

/// Render configuration as YAML
pub fn render_config(config: &BootstrapConfig) -> Result<String> {
    serde_yaml::to_string(config).with_context(|| "Failed to serialize configuration to YAML")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let yaml = r#"
server:
  grpc_port: 19010
  extra_args: ["--log_requests"]
provisioning:
  project_id: test-project
  instance_id: test-instance
  node_count: 3
"#;
        let config = parse_config_str(yaml).unwrap();

        assert_eq!(config.server.grpc_port, 19010);
        assert_eq!(config.server.http_port, 9020);
        assert_eq!(config.server.hostname, "0.0.0.0");
        assert_eq!(config.server.extra_args, vec!["--log_requests"]);
        assert_eq!(config.provisioning.project_id.as_deref(), Some("test-project"));
        assert_eq!(config.provisioning.database_id, None);
        assert_eq!(config.provisioning.node_count, 3);
        assert_eq!(config.provisioning.instance_config, "emulator-config");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_config_str("").unwrap(), BootstrapConfig::default());
        assert_eq!(parse_config_str("  \n").unwrap(), BootstrapConfig::default());
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(parse_config_str("server: [1, 2").is_err());
        assert!(parse_config_str("server:\n  grpc_port: not-a-port\n").is_err());
    }

    #[test]
    fn test_render_round_trips() {
        let mut config = BootstrapConfig::default();
        config.provisioning.database_id = Some("test-db".to_string());

        let yaml = render_config(&config).unwrap();
        assert_eq!(parse_config_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config("/nonexistent/bootstrap.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

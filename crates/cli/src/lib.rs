use clap::Parser;
use observability::LogFormat;
use std::path::PathBuf;

pub const PROJECT_ID_ENV: &str = "SPANNER_PROJECT_ID";
pub const INSTANCE_ID_ENV: &str = "SPANNER_INSTANCE_ID";
pub const DATABASE_ID_ENV: &str = "SPANNER_DATABASE_ID";
pub const LOG_FORMAT_ENV: &str = "BOOTSTRAP_LOG_FORMAT";

#[derive(Parser, Debug)]
#[command(name = "emulator-bootstrap")]
#[command(about = "Start the emulator server and provision its instance and database")]
#[command(version)]
pub struct Cli {
    /// Address the server binds to
    #[arg(long)]
    pub hostname: Option<String>,

    /// gRPC port of the server, also used for provisioning
    #[arg(long = "grpc_port", alias = "grpc-port", value_name = "PORT")]
    pub grpc_port: Option<u16>,

    /// REST gateway port of the server
    #[arg(long = "http_port", alias = "http-port", value_name = "PORT")]
    pub http_port: Option<u16>,

    /// Server executable, a path or a name looked up on PATH
    #[arg(long, value_name = "BINARY")]
    pub server_binary: Option<PathBuf>,

    /// Optional YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project to provision under
    #[arg(long, env = PROJECT_ID_ENV)]
    pub project_id: Option<String>,

    /// Instance to ensure exists
    #[arg(long, env = INSTANCE_ID_ENV)]
    pub instance_id: Option<String>,

    /// Database to ensure exists
    #[arg(long, env = DATABASE_ID_ENV)]
    pub database_id: Option<String>,

    /// Log output format: pretty, json or compact
    #[arg(long, env = LOG_FORMAT_ENV, default_value = "pretty", value_name = "FORMAT")]
    pub log_format: LogFormat,

    /// Validate the configuration, print it with the provisioning plan, and exit
    #[arg(long)]
    pub check: bool,

    /// Extra arguments forwarded to the server after `--`
    #[arg(last = true, value_name = "SERVER_ARGS")]
    pub server_args: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["emulator-bootstrap"]).unwrap();
        assert_eq!(cli.hostname, None);
        assert_eq!(cli.grpc_port, None);
        assert_eq!(cli.config, None);
        assert!(!cli.check);
        assert!(cli.server_args.is_empty());
    }

    #[test]
    fn test_original_port_spelling_and_aliases() {
        let cli = Cli::try_parse_from([
            "emulator-bootstrap",
            "--grpc_port",
            "19010",
            "--http-port",
            "19020",
            "--hostname",
            "localhost",
        ])
        .unwrap();
        assert_eq!(cli.grpc_port, Some(19010));
        assert_eq!(cli.http_port, Some(19020));
        assert_eq!(cli.hostname.as_deref(), Some("localhost"));
    }

    #[test]
    fn test_identifiers_and_trailing_args() {
        let cli = Cli::try_parse_from([
            "emulator-bootstrap",
            "--project-id",
            "test-project",
            "--instance-id",
            "test-instance",
            "--database-id",
            "test-db",
            "--log-format",
            "JSON",
            "--",
            "--log_requests",
            "--enable_fault_injection",
        ])
        .unwrap();
        assert_eq!(cli.project_id.as_deref(), Some("test-project"));
        assert_eq!(cli.instance_id.as_deref(), Some("test-instance"));
        assert_eq!(cli.database_id.as_deref(), Some("test-db"));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.server_args, vec!["--log_requests", "--enable_fault_injection"]);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["emulator-bootstrap", "--grpc_port", "70000"]).is_err());
        let err = Cli::try_parse_from(["emulator-bootstrap", "--log-format", "xml"]).unwrap_err();
        assert!(err.to_string().contains("unknown log format 'xml'"));
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

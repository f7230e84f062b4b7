//! Server process configuration
//!
//! Describes the emulator server subprocess and derives its startup
//! arguments.

use std::path::PathBuf;

/// Default emulator ports
pub mod ports {
    /// Emulator gRPC port
    pub const GRPC: u16 = 9010;
    /// Emulator HTTP (REST) port
    pub const HTTP: u16 = 9020;
}

/// Default hostname the emulator binds to
pub const DEFAULT_HOSTNAME: &str = "0.0.0.0";

/// Default emulator gateway binary, relative to the working directory
pub const DEFAULT_BINARY: &str = "./gateway_main";

/// The emulator server subprocess
///
/// # Example
///
/// ```
/// use supervisor::config::ServerProcess;
///
/// let process = ServerProcess::new("./gateway_main", "0.0.0.0", 9010, 9020);
/// assert_eq!(process.grpc_endpoint(), "0.0.0.0:9010");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProcess {
    /// Path or name of the server binary
    pub binary: PathBuf,
    /// Hostname the server binds to
    pub hostname: String,
    /// gRPC port
    pub grpc_port: u16,
    /// HTTP port
    pub http_port: u16,
    /// Arguments appended after the derived ones
    pub extra_args: Vec<String>,
}

impl ServerProcess {
    pub fn new(binary: impl Into<PathBuf>, hostname: impl Into<String>, grpc_port: u16, http_port: u16) -> Self {
        Self {
            binary: binary.into(),
            hostname: hostname.into(),
            grpc_port,
            http_port,
            extra_args: Vec::new(),
        }
    }

    pub fn with_extra_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Arguments the server is started with
    pub fn startup_args(&self) -> Vec<String> {
        let mut args = vec![
            "--hostname".to_string(),
            self.hostname.clone(),
            "--grpc_port".to_string(),
            self.grpc_port.to_string(),
            "--http_port".to_string(),
            self.http_port.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// `host:port` of the server's gRPC listener
    pub fn grpc_endpoint(&self) -> String {
        format!("{}:{}", self.hostname, self.grpc_port)
    }

    /// True if the binary is given as a path rather than a name looked up on `PATH`
    pub fn binary_is_path(&self) -> bool {
        self.binary.components().count() > 1
    }
}

impl Default for ServerProcess {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY, DEFAULT_HOSTNAME, ports::GRPC, ports::HTTP)
    }
}

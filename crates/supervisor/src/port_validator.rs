//! Port pre-flight checks
//!
//! Note: checking a port before the server binds it has an inherent TOCTOU
//! race. Another process could take the port in between. The check gives
//! early feedback before the subprocess starts; the server's own bind is
//! the source of truth.

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ServerProcess;
use crate::error::{Result, SupervisorError};

/// Validate that the server's gRPC and HTTP ports are free
pub async fn validate_ports_available(process: &ServerProcess) -> Result<()> {
    debug!("Validating server ports...");

    for (protocol, port) in [("gRPC", process.grpc_port), ("HTTP", process.http_port)] {
        validate_single_port(&process.hostname, port, protocol).await?;
    }

    info!(
        grpc_port = process.grpc_port,
        http_port = process.http_port,
        "Server ports are available"
    );
    Ok(())
}

/// Validate a single port is available
async fn validate_single_port(host: &str, port: u16, protocol: &str) -> Result<()> {
    let addr = format!("{}:{}", host, port);

    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            // Drop the listener to release the port
            drop(listener);
            debug!("{} port {} is available", protocol, port);
            Ok(())
        }
        Err(e) => {
            error!("{} port {} is NOT available: {}", protocol, port, e);
            Err(SupervisorError::port_in_use(port, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_free_ports_pass() {
        let process = ServerProcess::new("gateway_main", "127.0.0.1", 0, 0);
        assert!(validate_ports_available(&process).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_reports_taken_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = listener.local_addr().unwrap().port();

        let process = ServerProcess::new("gateway_main", "127.0.0.1", 0, taken);
        let result = validate_ports_available(&process).await;

        assert_matches!(result, Err(SupervisorError::PortInUse { port, .. }) if port == taken);
    }
}

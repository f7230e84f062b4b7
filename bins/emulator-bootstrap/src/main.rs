//! Emulator bootstrap binary
//!
//! Starts the emulator gateway as a subprocess and, concurrently, makes sure
//! the configured instance and database exist. The process exits with the
//! server's status, or with status 1 if provisioning fails.

use anyhow::{Context, Result};
use cli::Cli;
use config::{load_config, render_config, validate_config, BootstrapConfig, ConfigOverrides};
use observability::init_logging;
use provisioning::{
    paths, AdminConnector, AdminEndpoint, GrpcAdminConnector, InstanceAttributes, ProvisionReport,
    ProvisioningCoordinator, ProvisioningPlan, ProvisioningTarget, Step,
};
use std::future::Future;
use std::process::{ExitCode, ExitStatus};
use std::time::Duration;
use supervisor::{exit_code, ProcessOrchestrator, ServerProcess, ShutdownController};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    init_logging("emulator-bootstrap", cli.log_format)?;
    debug!(?cli, "CLI arguments parsed");

    let config = build_config(&cli)?;

    if cli.check {
        print_check(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let code = run(config, GrpcAdminConnector).await?;
    Ok(ExitCode::from(code))
}

/// Defaults, then the optional file, then flags and environment
fn build_config(cli: &Cli) -> Result<BootstrapConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BootstrapConfig::default(),
    };
    config.apply_overrides(overrides(cli));

    let report = validate_config(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, message = %warning.message, "Configuration warning");
    }
    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot start due to configuration errors");
    }

    Ok(config)
}

fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        hostname: cli.hostname.clone(),
        grpc_port: cli.grpc_port,
        http_port: cli.http_port,
        binary: cli.server_binary.clone(),
        extra_args: cli.server_args.clone(),
        project_id: cli.project_id.clone(),
        instance_id: cli.instance_id.clone(),
        database_id: cli.database_id.clone(),
    }
}

fn admin_endpoint(config: &BootstrapConfig) -> AdminEndpoint {
    let provisioning = &config.provisioning;
    AdminEndpoint::new(config.admin_endpoint())
        .with_poll_interval(Duration::from_millis(provisioning.operation_poll_interval_ms))
        .with_connect_retry_interval(Duration::from_millis(provisioning.connect_retry_interval_ms))
}

fn provisioning_target(config: &BootstrapConfig) -> ProvisioningTarget {
    let provisioning = &config.provisioning;
    ProvisioningTarget {
        project_id: provisioning.project_id.clone(),
        instance_id: provisioning.instance_id.clone(),
        database_id: provisioning.database_id.clone(),
        instance: InstanceAttributes {
            config: provisioning.instance_config.clone(),
            display_name: provisioning.display_name.clone(),
            node_count: provisioning.node_count,
        },
    }
}

fn server_process(config: &BootstrapConfig) -> ServerProcess {
    let server = &config.server;
    ServerProcess::new(
        &server.binary,
        &server.hostname,
        server.grpc_port,
        server.http_port,
    )
    .with_extra_args(server.extra_args.iter().cloned())
}

fn print_check(config: &BootstrapConfig) -> Result<()> {
    let plan = ProvisioningPlan::from_target(&provisioning_target(config));

    println!("{}", render_config(config)?);
    println!("Server: {:?} {}", config.server.binary, server_process(config).startup_args().join(" "));
    println!("Admin endpoint: {}", config.admin_endpoint());

    let instance = match &plan.instance {
        Step::Run(spec) => format!(
            "create {}",
            paths::instance_path(&spec.project_id, &spec.instance_id)?
        ),
        Step::Skip(reason) => format!("skipped ({})", reason),
    };
    let database = match &plan.database {
        Step::Run(spec) => format!(
            "create {}",
            paths::database_path(&spec.project_id, &spec.instance_id, &spec.database_id)?
        ),
        Step::Skip(reason) => format!("skipped ({})", reason),
    };
    println!("Instance: {}", instance);
    println!("Database: {}", database);

    Ok(())
}

async fn run<C>(config: BootstrapConfig, connector: C) -> Result<u8>
where
    C: AdminConnector + 'static,
{
    let coordinator = ProvisioningCoordinator::new(connector, admin_endpoint(&config));
    let target = provisioning_target(&config);
    let orchestrator = ProcessOrchestrator::new(server_process(&config))
        .with_stop_grace(Duration::from_millis(config.server.stop_grace_ms));
    let shutdown = ShutdownController::with_signals();

    info!(
        endpoint = %coordinator.endpoint(),
        server = %orchestrator.process().grpc_endpoint(),
        project = ?target.project_id,
        instance = ?target.instance_id,
        database = ?target.database_id,
        "Starting provisioning"
    );
    // Started before the server; the admin clients wait for it to come up
    let provisioning = tokio::spawn(async move { coordinator.run(&target).await });

    supervise(orchestrator.run(shutdown.child_token()), provisioning, &shutdown).await
}

/// Join the provisioning task back into the server's lifetime.
///
/// Returns the server's exit code once it exits. A failed provisioning pass
/// stops the server and becomes the returned error.
async fn supervise<S>(
    server: S,
    mut provisioning: JoinHandle<provisioning::Result<ProvisionReport>>,
    shutdown: &ShutdownController,
) -> Result<u8>
where
    S: Future<Output = supervisor::Result<ExitStatus>>,
{
    tokio::pin!(server);

    let mut provisioned = false;
    loop {
        tokio::select! {
            status = &mut server => {
                if !provisioning.is_finished() {
                    warn!("Emulator server exited before provisioning finished");
                    provisioning.abort();
                }
                let status = status.context("Failed to run emulator server")?;
                return Ok(exit_code(status));
            }
            joined = &mut provisioning, if !provisioned => {
                provisioned = true;
                let failure = match joined {
                    Ok(Ok(report)) => {
                        info!(
                            instance = %report.instance,
                            database = %report.database,
                            "Provisioning complete"
                        );
                        continue;
                    }
                    Ok(Err(e)) => {
                        error!(step = ?e.step(), code = ?e.code(), "Provisioning failed: {}", e);
                        anyhow::Error::new(e)
                    }
                    Err(e) => {
                        error!("Provisioning task did not complete: {}", e);
                        anyhow::Error::new(e)
                    }
                };

                shutdown.shutdown();
                if let Err(e) = (&mut server).await {
                    warn!("Emulator server did not stop cleanly: {}", e);
                }
                return Err(failure.context("Provisioning failed"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config_from(args: &[&str]) -> BootstrapConfig {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut config = BootstrapConfig::default();
        config.apply_overrides(overrides(&cli));
        config
    }

    #[test]
    fn test_flags_flow_into_both_components() {
        let config = config_from(&[
            "emulator-bootstrap",
            "--hostname",
            "localhost",
            "--grpc_port",
            "19010",
            "--project-id",
            "p",
            "--instance-id",
            "i",
            "--",
            "--log_requests",
        ]);

        assert_eq!(admin_endpoint(&config).address, "localhost:19010");

        let process = server_process(&config);
        assert_eq!(
            process.startup_args(),
            vec![
                "--hostname",
                "localhost",
                "--grpc_port",
                "19010",
                "--http_port",
                "9020",
                "--log_requests"
            ]
        );

        let target = provisioning_target(&config);
        assert_eq!(target.project_id.as_deref(), Some("p"));
        assert_eq!(target.instance.config, "emulator-config");
    }

    #[cfg(unix)]
    mod supervision {
        use super::*;
        use provisioning::admin::recording::RecordingConnector;
        use provisioning::paths::IdentifierKind;
        use provisioning::{Outcome, ProvisionError, SkipReason};
        use std::os::unix::fs::PermissionsExt;
        use std::os::unix::process::ExitStatusExt;
        use std::path::PathBuf;
        use supervisor::SupervisorError;
        use tokio::sync::oneshot;

        fn invalid_instance() -> ProvisionError {
            ProvisionError::InvalidIdentifier {
                kind: IdentifierKind::Instance,
                value: "bad`i".to_string(),
                reason: "must not contain '`'",
            }
        }

        fn fake_server(dir: &tempfile::TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("gateway_main");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn local_config(binary: PathBuf, instance: &str) -> BootstrapConfig {
            let mut config = BootstrapConfig::default();
            config.server.binary = binary;
            config.server.hostname = "127.0.0.1".to_string();
            // Port 0 always binds, so the pre-flight check passes
            config.server.grpc_port = 0;
            config.server.http_port = 0;
            config.provisioning.project_id = Some("p".to_string());
            config.provisioning.instance_id = Some(instance.to_string());
            config
        }

        #[tokio::test]
        async fn test_failed_provisioning_stops_server() {
            let shutdown = ShutdownController::new();
            let token = shutdown.child_token();
            let server = async move {
                token.cancelled().await;
                Ok::<_, SupervisorError>(ExitStatus::from_raw(9))
            };
            let task = tokio::spawn(async { Err::<ProvisionReport, _>(invalid_instance()) });

            let err = supervise(server, task, &shutdown).await.unwrap_err();

            assert!(shutdown.is_cancelled());
            assert!(err.to_string().contains("Provisioning failed"));
            assert!(err.downcast_ref::<ProvisionError>().is_some());
        }

        #[tokio::test]
        async fn test_server_exit_aborts_provisioning() {
            let (guard, dropped) = oneshot::channel::<()>();
            let task = tokio::spawn(async move {
                let _guard = guard;
                std::future::pending::<provisioning::Result<ProvisionReport>>().await
            });
            let server = async { Ok::<_, SupervisorError>(ExitStatus::from_raw(3 << 8)) };

            let code = supervise(server, task, &ShutdownController::new()).await.unwrap();

            assert_eq!(code, 3);
            // The aborted task drops its sender
            assert!(dropped.await.is_err());
        }

        #[tokio::test]
        async fn test_successful_provisioning_leaves_server_running() {
            let shutdown = ShutdownController::new();
            let task = tokio::spawn(async {
                Ok(ProvisionReport {
                    instance: Outcome::AlreadyExists,
                    database: Outcome::Skipped(SkipReason::MissingDatabase),
                })
            });
            let server = async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, SupervisorError>(ExitStatus::from_raw(0))
            };

            let code = supervise(server, task, &shutdown).await.unwrap();

            assert_eq!(code, 0);
            assert!(!shutdown.is_cancelled());
        }

        // One test spawns every fake server so no concurrent fork holds a
        // script open for writing while another test executes it.
        #[tokio::test]
        async fn test_run_with_fake_server() {
            let dir = tempfile::tempdir().unwrap();

            // A fatal provisioning error stops a long-running server
            let binary = fake_server(&dir, "exec sleep 30");
            let connector = RecordingConnector::new();
            let log = connector.log().clone();
            let result = tokio::time::timeout(
                Duration::from_secs(10),
                run(local_config(binary, "bad`i"), connector),
            )
            .await
            .expect("server was not stopped after provisioning failed");
            assert!(result.is_err());
            assert!(log.calls().is_empty());

            // Otherwise the server's exit code is returned
            let dir = tempfile::tempdir().unwrap();
            let binary = fake_server(&dir, "sleep 1; exit 3");
            let connector = RecordingConnector::new();
            let log = connector.log().clone();
            let code = run(local_config(binary, "i"), connector).await.unwrap();
            assert_eq!(code, 3);
            assert_eq!(log.instance_creations(), 1);
        }
    }
}

//! Process orchestrator
//!
//! Starts the emulator server with its derived startup arguments, passes
//! its stdio straight through to ours, and waits for it to exit. There is
//! no restart policy: whatever status the server exits with is returned.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ServerProcess;
use crate::error::{Result, SupervisorError};
use crate::port_validator::validate_ports_available;

/// How long a stopping server gets between SIGTERM and SIGKILL
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Runs the server subprocess to completion
pub struct ProcessOrchestrator {
    process: ServerProcess,
    stop_grace: Duration,
}

impl ProcessOrchestrator {
    pub fn new(process: ServerProcess) -> Self {
        Self {
            process,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn process(&self) -> &ServerProcess {
        &self.process
    }

    /// Check the binary and ports before spawning
    pub async fn preflight(&self) -> Result<()> {
        if self.process.binary_is_path() && !self.process.binary.exists() {
            return Err(SupervisorError::BinaryNotFound(self.process.binary.clone()));
        }
        validate_ports_available(&self.process).await
    }

    /// Spawn the server and wait for it to exit.
    ///
    /// If `shutdown` is cancelled first, the server is asked to terminate,
    /// killed if it is still running after the stop grace period, and reaped.
    /// Its exit status is returned either way.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<ExitStatus> {
        self.preflight().await?;

        let args = self.process.startup_args();
        info!(binary = ?self.process.binary, ?args, "Starting emulator server");

        let mut child = Command::new(&self.process.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SupervisorError::spawn(&self.process.binary, e))?;

        let pid = child.id();
        info!(pid, "Emulator server started");

        let status = tokio::select! {
            status = child.wait() => status.map_err(SupervisorError::Wait)?,
            _ = shutdown.cancelled() => self.stop(&mut child).await?,
        };

        info!(%status, "Emulator server exited");
        Ok(status)
    }

    /// SIGTERM, then SIGKILL once the stop grace period runs out
    async fn stop(&self, child: &mut Child) -> Result<ExitStatus> {
        let pid = child.id();
        warn!(pid, grace = ?self.stop_grace, "Stopping emulator server");

        if terminate(child) {
            match tokio::time::timeout(self.stop_grace, child.wait()).await {
                Ok(status) => return status.map_err(SupervisorError::Wait),
                Err(_) => warn!(pid, "Emulator server ignored SIGTERM, killing it"),
            }
        }

        child.kill().await.map_err(SupervisorError::Kill)?;
        child.wait().await.map_err(SupervisorError::Wait)
    }
}

/// Send SIGTERM. Returns false if the signal could not be delivered.
#[cfg(unix)]
fn terminate(child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            warn!(pid, "Failed to send SIGTERM: {}", e);
            false
        }
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) -> bool {
    false
}

/// Process exit code to propagate for a server exit status.
///
/// On Unix a server killed by a signal maps to `128 + signal`, as a shell
/// would report it.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return u8::try_from(code).unwrap_or(1);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return u8::try_from(128 + signal).unwrap_or(1);
        }
    }

    1
}

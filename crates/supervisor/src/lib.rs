//! Emulator server supervision
//!
//! This crate starts the emulator gateway as a subprocess and supervises it
//! for the lifetime of the bootstrapper.
//!
//! # Architecture
//!
//! [`ProcessOrchestrator`] derives the server's startup arguments from a
//! [`ServerProcess`], checks the binary and ports, spawns the server with
//! inherited stdio, and waits for it. A [`ShutdownController`] token lets
//! signals or a fatal provisioning error stop the server early.
//!
//! # Example
//!
//! ```ignore
//! use supervisor::{ProcessOrchestrator, ServerProcess, ShutdownController};
//!
//! let shutdown = ShutdownController::with_signals();
//! let orchestrator = ProcessOrchestrator::new(ServerProcess::default());
//! let status = orchestrator.run(shutdown.child_token()).await?;
//! ```

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod port_validator;
pub mod shutdown;

pub use config::{ports, ServerProcess};
pub use error::{Result, SupervisorError};
pub use orchestrator::{exit_code, ProcessOrchestrator, DEFAULT_STOP_GRACE};
pub use shutdown::ShutdownController;

//! Logging for the emulator bootstrap
//!
//! Log records go to stderr so the server subprocess keeps stdout to itself.
//!
//! ```ignore
//! use observability::{init_logging, LogFormat};
//!
//! init_logging("emulator-bootstrap", LogFormat::Compact)?;
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat};

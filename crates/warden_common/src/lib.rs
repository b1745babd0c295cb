//! Archwarden Common - shared types for the maintenance orchestrator
//!
//! Configuration, error taxonomy, session paths, the command execution seam and
//! the tee'd session transcript.

pub mod config;
pub mod error;
pub mod exec;
pub mod session;
pub mod transcript;
pub mod ui;

pub use config::WardenConfig;
pub use error::{WardenError, WardenResult, EXIT_FAILURE, EXIT_SUCCESS};
pub use exec::{
    CommandOutcome, CommandRunner, Invocation, SystemRunner, ToolResolver, WhichResolver,
};
pub use session::Session;
pub use transcript::{Echo, Transcript};

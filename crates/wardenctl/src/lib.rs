//! Archwarden control - maintenance and audit pipeline
//!
//! Library half of `wardenctl`, exposed so the pipeline can be exercised with
//! scripted commands in integration tests.

pub mod app;
pub mod audit;
pub mod cli;
pub mod containers;
pub mod context;
pub mod keeper;
pub mod log_sink;
pub mod maintenance;
pub mod menu;
pub mod pipeline;
pub mod plan;
pub mod privilege;
pub mod probe;
pub mod probes;
pub mod recommendations;
pub mod report;
pub mod step;

pub use app::Mode;
pub use context::{Operator, RunContext};

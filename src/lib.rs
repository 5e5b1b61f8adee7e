//! vep library exports for testing.
//!
//! The binary is a thin wrapper over [`pipeline::run`]; integration tests
//! drive the same modules directly.

pub mod config;
pub mod entry_points;
pub mod error;
pub mod extras;
pub mod package;
pub mod pipeline;
pub mod process;
pub mod relocate;
pub mod setup_meta;
pub mod shim;
pub mod venv;

//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Process execution (the command-runner port)
//! - The gcloud CLI (auth, project config, Cloud Build, Cloud Run)

pub mod gcloud;
pub mod runner;

// Re-export commonly used types
pub use gcloud::Gcloud;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};

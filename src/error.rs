//! Centralized error types for skylift
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for skylift operations
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Prerequisite error: {0}")]
    Prereq(#[from] PrereqError),

    #[error("gcloud error: {0}")]
    Gcloud(#[from] GcloudError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Prerequisite check errors (all fatal)
#[derive(Error, Debug)]
pub enum PrereqError {
    #[error("{tool} not found. Install it from {install_url}")]
    ToolMissing { tool: String, install_url: String },

    #[error("No active gcloud account and login failed. Run `gcloud auth login` manually")]
    LoginFailed,

    #[error("Project {project} is not accessible with the current credentials")]
    ProjectInaccessible { project: String },
}

/// Errors from gcloud CLI invocations
#[derive(Error, Debug)]
pub enum GcloudError {
    #[error("gcloud {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Cloud Build submission failed for {image}: {message}")]
    BuildFailed { image: String, message: String },

    #[error("Cloud Run deploy failed for {service}: {message}")]
    DeployFailed { service: String, message: String },

    #[error("No URL reported for service {service} in {region}")]
    UrlMissing { service: String, region: String },

    #[error("Unexpected gcloud output: {message}")]
    UnexpectedOutput { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source directory not found: {path}")]
    SourceDirMissing { path: String },

    #[error("Invalid deploy target choice: {choice}. Expected 1, 2, or 3")]
    InvalidTarget { choice: String },

    #[error("Project id must not be empty")]
    EmptyProject,
}

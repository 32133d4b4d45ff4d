//! CLI definitions for skylift
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "skylift",
    version,
    about = "Deployment orchestrator for Cloud Run services",
    long_about = "Builds and deploys the backend API and frontend to Cloud Run.\nEvery interactive prompt has a flag or environment variable escape hatch."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and deploy services to Cloud Run
    Deploy {
        /// GCP project id (prompted if unset and not configured in gcloud)
        #[arg(long, env = "SKYLIFT_PROJECT")]
        project: Option<String>,

        /// Deployment region (prompted with a default if unset)
        #[arg(long, env = "SKYLIFT_REGION")]
        region: Option<String>,

        /// What to deploy (prompted via menu if unset)
        #[arg(long, value_enum)]
        target: Option<DeployTarget>,

        /// Backend source directory
        #[arg(long, default_value = "backend")]
        backend_dir: String,

        /// Frontend source directory
        #[arg(long, default_value = "frontend")]
        frontend_dir: String,

        /// Skip the post-deploy endpoint smoke test
        #[arg(long)]
        skip_smoke_test: bool,
    },

    /// Smoke-test deployed endpoints without deploying
    Verify {
        /// Backend URL (looked up from Cloud Run if unset)
        #[arg(long)]
        backend_url: Option<String>,

        /// Frontend URL (looked up from Cloud Run if unset)
        #[arg(long)]
        frontend_url: Option<String>,

        /// GCP project id
        #[arg(long, env = "SKYLIFT_PROJECT")]
        project: Option<String>,

        /// Deployment region
        #[arg(long, env = "SKYLIFT_REGION", default_value = "us-central1")]
        region: String,
    },
}

/// Which services a deploy run covers
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployTarget {
    /// Backend and frontend, in that order
    Both,
    /// Backend API only
    Backend,
    /// Frontend only (backend URL looked up from the existing service)
    Frontend,
}

impl DeployTarget {
    pub fn includes_backend(self) -> bool {
        matches!(self, DeployTarget::Both | DeployTarget::Backend)
    }

    pub fn includes_frontend(self) -> bool {
        matches!(self, DeployTarget::Both | DeployTarget::Frontend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_deploy_with_target() {
        let cli = Cli::parse_from(["skylift", "deploy", "--target", "backend"]);
        match cli.command {
            Commands::Deploy { target, .. } => assert_eq!(target, Some(DeployTarget::Backend)),
            _ => panic!("expected deploy subcommand"),
        }
    }

    #[test]
    fn test_parse_deploy_defaults() {
        let cli = Cli::parse_from(["skylift", "deploy"]);
        match cli.command {
            Commands::Deploy {
                target,
                backend_dir,
                frontend_dir,
                skip_smoke_test,
                ..
            } => {
                assert_eq!(target, None);
                assert_eq!(backend_dir, "backend");
                assert_eq!(frontend_dir, "frontend");
                assert!(!skip_smoke_test);
            }
            _ => panic!("expected deploy subcommand"),
        }
    }

    #[test]
    fn test_target_includes() {
        assert!(DeployTarget::Both.includes_backend());
        assert!(DeployTarget::Both.includes_frontend());
        assert!(!DeployTarget::Backend.includes_frontend());
        assert!(!DeployTarget::Frontend.includes_backend());
    }
}

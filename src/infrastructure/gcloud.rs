//! Typed wrapper around the gcloud CLI
//!
//! Every control-plane operation skylift performs is a gcloud invocation;
//! this client owns the argument shapes and output parsing so the pipeline
//! code stays free of CLI details. All execution goes through the
//! [`CommandRunner`] port.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use crate::config::ServiceSpec;
use crate::error::{GcloudError, PrereqError};
use crate::infrastructure::runner::{CommandOutput, CommandRunner};
use crate::tools::get_tool_path;

pub struct Gcloud<'a> {
    runner: &'a dyn CommandRunner,
    bin: String,
}

/// One entry of `gcloud auth list --format=json`
#[derive(Debug, Deserialize)]
struct AuthAccount {
    account: String,
    status: String,
}

impl<'a> Gcloud<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            bin: get_tool_path("gcloud"),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.runner.run(&self.bin, args).await
    }

    fn command_failed(args: &[&str], output: &CommandOutput) -> GcloudError {
        GcloudError::CommandFailed {
            command: args.join(" "),
            stderr: output.stderr.trim().to_string(),
        }
    }

    /// The currently active gcloud account, if any.
    pub async fn active_account(&self) -> Result<Option<String>> {
        let args = ["auth", "list", "--filter=status:ACTIVE", "--format=json"];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(Self::command_failed(&args, &output).into());
        }

        let accounts: Vec<AuthAccount> =
            serde_json::from_str(&output.stdout).map_err(|e| GcloudError::UnexpectedOutput {
                message: format!("auth list output is not valid JSON: {}", e),
            })?;

        Ok(accounts
            .into_iter()
            .find(|a| a.status == "ACTIVE")
            .map(|a| a.account))
    }

    /// Interactive login flow. Runs with inherited stdio so the browser
    /// handoff works.
    pub async fn login(&self) -> Result<()> {
        let code = self
            .runner
            .run_interactive(&self.bin, &["auth", "login"])
            .await?;
        if code != 0 {
            return Err(PrereqError::LoginFailed.into());
        }
        Ok(())
    }

    /// Project id from gcloud config, treating `(unset)` and empty output as
    /// no configuration.
    pub async fn configured_project(&self) -> Result<Option<String>> {
        let output = self.run(&["config", "get-value", "project"]).await?;
        let project = output.stdout.trim();
        if !output.success() || project.is_empty() || project == "(unset)" {
            return Ok(None);
        }
        Ok(Some(project.to_string()))
    }

    pub async fn set_project(&self, project: &str) -> Result<()> {
        let args = ["config", "set", "project", project];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(Self::command_failed(&args, &output).into());
        }
        Ok(())
    }

    /// Whether the project can be described with the current credentials.
    pub async fn project_accessible(&self, project: &str) -> Result<bool> {
        let output = self
            .run(&[
                "projects",
                "describe",
                project,
                "--format=value(projectId)",
            ])
            .await?;
        Ok(output.success())
    }

    pub async fn enable_service(&self, api: &str, project: &str) -> Result<()> {
        let args = ["services", "enable", api, "--project", project];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(Self::command_failed(&args, &output).into());
        }
        Ok(())
    }

    /// Submit a Cloud Build producing the spec's image from its source dir.
    pub async fn submit_build(&self, spec: &ServiceSpec, project: &str) -> Result<()> {
        let source = spec.source_dir.to_string_lossy();
        let args = [
            "builds",
            "submit",
            "--tag",
            spec.image.as_str(),
            source.as_ref(),
            "--project",
            project,
        ];
        debug!("submitting build for {}", spec.image);
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(GcloudError::BuildFailed {
                image: spec.image.clone(),
                message: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Deploy the built image as a managed Cloud Run service with public
    /// access and the spec's resource limits.
    pub async fn deploy_service(
        &self,
        spec: &ServiceSpec,
        region: &str,
        project: &str,
    ) -> Result<()> {
        let max_instances = spec.max_instances.to_string();
        let args = [
            "run",
            "deploy",
            spec.name.as_str(),
            "--image",
            spec.image.as_str(),
            "--platform",
            "managed",
            "--region",
            region,
            "--allow-unauthenticated",
            "--memory",
            spec.memory,
            "--cpu",
            spec.cpu,
            "--max-instances",
            max_instances.as_str(),
            "--project",
            project,
        ];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(GcloudError::DeployFailed {
                service: spec.name.clone(),
                message: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Public URL of a deployed service.
    pub async fn service_url(&self, service: &str, region: &str, project: &str) -> Result<String> {
        let args = [
            "run",
            "services",
            "describe",
            service,
            "--platform",
            "managed",
            "--region",
            region,
            "--project",
            project,
            "--format",
            "get(status.url)",
        ];
        let output = self.run(&args).await?;
        if !output.success() {
            return Err(Self::command_failed(&args, &output).into());
        }

        let url = output.stdout.trim().to_string();
        if url.is_empty() {
            return Err(GcloudError::UrlMissing {
                service: service.to_string(),
                region: region.to_string(),
            }
            .into());
        }
        Ok(url)
    }
}

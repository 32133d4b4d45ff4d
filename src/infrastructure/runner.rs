//! External command execution port
//!
//! Every invocation of an external CLI goes through [`CommandRunner`] so the
//! deploy pipeline can be exercised in tests without touching the system.
//! [`SystemRunner`] is the production implementation; `ScriptedRunner`
//! (test-only) replays canned outputs and records what was invoked.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Captured result of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    #[cfg(test)]
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            code: 0,
        }
    }

    #[cfg(test)]
    pub fn failed(stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            code: 1,
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is NOT an error at this layer; callers inspect
    /// [`CommandOutput::success`]. Err means the command could not be spawned.
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a command with inherited stdio, for flows that need the user's
    /// terminal (e.g. `gcloud auth login` opening a browser prompt).
    async fn run_interactive(&self, program: &str, args: &[&str]) -> Result<i32>;
}

/// Runs commands on the host via tokio
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("exec: {} {}", program, args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", program))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code().unwrap_or(-1),
        })
    }

    async fn run_interactive(&self, program: &str, args: &[&str]) -> Result<i32> {
        debug!("exec (interactive): {} {}", program, args.join(" "));
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to execute {}", program))?;
        Ok(status.code().unwrap_or(-1))
    }
}

//! Runtime tool path resolution
//!
//! For each external tool (e.g. `gcloud`), we:
//! 1. Check for an environment variable `{TOOL}_BIN` (e.g. `GCLOUD_BIN`)
//! 2. Fall back to PATH-based invocation if the envvar is not set
//!
//! The envvar override keeps the binary location explicit in CI and makes the
//! presence check easy to steer in tests.

use std::env;

use crate::error::PrereqError;

/// Get the path to an external tool
///
/// Checks for an environment variable `{TOOL}_BIN` (uppercase tool name + "_BIN").
/// Falls back to the tool name itself if the envvar is not set, which relies on PATH.
pub fn get_tool_path(tool: &str) -> String {
    let env_var = format!("{}_BIN", tool.to_uppercase().replace('-', "_"));
    env::var(&env_var).unwrap_or_else(|_| tool.to_string())
}

/// Verify an external tool is present, failing with an install hint if not.
///
/// Resolution goes through [`get_tool_path`], so a `{TOOL}_BIN` override is
/// honored. Returns the resolved path for use in subsequent invocations.
pub fn require_tool(tool: &str, install_url: &str) -> Result<String, PrereqError> {
    let path = get_tool_path(tool);
    which::which(&path).map_err(|_| PrereqError::ToolMissing {
        tool: tool.to_string(),
        install_url: install_url.to_string(),
    })?;
    Ok(path)
}

/// Common tool names used by skylift
pub mod tools {
    pub const GCLOUD: &str = "gcloud";
    pub const DOCKER: &str = "docker";
}

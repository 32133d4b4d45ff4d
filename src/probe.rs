//! Post-deploy endpoint smoke tests
//!
//! Probes are best-effort: a failed or unreachable endpoint produces a
//! warning in the report, never an error. Cloud Run cold starts can make the
//! first request slow, so the client carries a generous timeout, but there
//! are no retries.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::debug;

use crate::ui;

const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of probing one service
#[derive(Debug)]
pub struct ProbeResult {
    pub service: String,
    pub passed: bool,
    pub latency_ms: Option<u64>,
    pub detail: String,
}

pub fn probe_client() -> Result<Client> {
    Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Probe a service, trying each path in order until one returns 2xx.
///
/// The backend is probed with `["/health", "/"]` so a missing health route
/// falls back to the root; the frontend with `["/"]` only.
pub async fn probe_service(client: &Client, service: &str, base_url: &str, paths: &[&str]) -> ProbeResult {
    let mut detail = String::new();

    for path in paths {
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        let start = Instant::now();
        match client.get(&url).send().await {
            Ok(response) => {
                let latency_ms = start.elapsed().as_millis() as u64;
                let status = response.status();
                debug!("{} -> {} ({}ms)", url, status, latency_ms);
                if status.is_success() {
                    return ProbeResult {
                        service: service.to_string(),
                        passed: true,
                        latency_ms: Some(latency_ms),
                        detail: format!("{} -> {}", path, status),
                    };
                }
                detail = format!("{} -> {}", path, status);
            }
            Err(e) => {
                debug!("{} -> {}", url, e);
                detail = format!("{} -> {}", path, e);
            }
        }
    }

    ProbeResult {
        service: service.to_string(),
        passed: false,
        latency_ms: None,
        detail,
    }
}

/// Print a probe outcome as success or warning; never fails the run.
pub fn report(result: &ProbeResult) {
    if result.passed {
        ui::print_success(&format!(
            "{} responding ({}, {}ms)",
            result.service,
            result.detail,
            result.latency_ms.unwrap_or(0)
        ));
    } else {
        ui::print_warning(&format!(
            "{} not responding yet ({}). It may still be starting up.",
            result.service, result.detail
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_probe_passes_on_health() {
        let server = MockServer::start();
        let health = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).body("ok");
        });

        let client = probe_client().unwrap();
        let result = tokio_test::block_on(probe_service(
            &client,
            "backend",
            &server.base_url(),
            &["/health", "/"],
        ));

        health.assert();
        assert!(result.passed);
        assert!(result.latency_ms.is_some());
    }

    #[test]
    fn test_probe_falls_back_to_root() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(404);
        });
        let root = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200).body("ok");
        });

        let client = probe_client().unwrap();
        let result = tokio_test::block_on(probe_service(
            &client,
            "backend",
            &server.base_url(),
            &["/health", "/"],
        ));

        root.assert();
        assert!(result.passed);
    }

    #[test]
    fn test_probe_non_2xx_is_warning_not_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(500);
        });

        let client = probe_client().unwrap();
        let result = tokio_test::block_on(probe_service(
            &client,
            "frontend",
            &server.base_url(),
            &["/"],
        ));

        assert!(!result.passed);
        assert!(result.detail.contains("500"));
    }

    #[test]
    fn test_probe_connection_error_is_warning_not_error() {
        // Port 9 (discard) is not listening in the test environment
        let client = probe_client().unwrap();
        let result = tokio_test::block_on(probe_service(
            &client,
            "backend",
            "http://127.0.0.1:9",
            &["/health", "/"],
        ));

        assert!(!result.passed);
        assert!(result.latency_ms.is_none());
    }
}

//! Standalone endpoint smoke test
//!
//! Re-runs the post-deploy probes without deploying anything. URLs not given
//! on the command line are looked up from the deployed Cloud Run services.

use anyhow::Result;

use crate::config::{BACKEND_SERVICE, FRONTEND_SERVICE};
use crate::infrastructure::{Gcloud, SystemRunner};
use crate::probe;
use crate::tools::{self, tools::GCLOUD};
use crate::ui;

pub async fn execute(
    backend_url: Option<String>,
    frontend_url: Option<String>,
    project: Option<String>,
    region: String,
) -> Result<()> {
    ui::print_header("skylift - endpoint verification");

    let runner = SystemRunner;
    let needs_lookup = backend_url.is_none() || frontend_url.is_none();

    let (backend_url, frontend_url) = if needs_lookup {
        tools::require_tool(GCLOUD, "https://cloud.google.com/sdk/docs/install")?;
        let gcloud = Gcloud::new(&runner);

        let project = match project {
            Some(p) => p,
            None => gcloud.configured_project().await?.ok_or_else(|| {
                anyhow::anyhow!("No project configured. Pass --project or run `gcloud config set project`")
            })?,
        };

        let backend = match backend_url {
            Some(url) => Some(url),
            None => lookup(&gcloud, BACKEND_SERVICE, &region, &project).await,
        };
        let frontend = match frontend_url {
            Some(url) => Some(url),
            None => lookup(&gcloud, FRONTEND_SERVICE, &region, &project).await,
        };
        (backend, frontend)
    } else {
        (backend_url, frontend_url)
    };

    if backend_url.is_none() && frontend_url.is_none() {
        anyhow::bail!("Nothing to verify: no URLs given and no deployed services found");
    }

    let client = probe::probe_client()?;
    if let Some(url) = &backend_url {
        let result = probe::probe_service(&client, "Backend", url, &["/health", "/"]).await;
        probe::report(&result);
    }
    if let Some(url) = &frontend_url {
        let result = probe::probe_service(&client, "Frontend", url, &["/"]).await;
        probe::report(&result);
    }

    Ok(())
}

async fn lookup(gcloud: &Gcloud<'_>, service: &str, region: &str, project: &str) -> Option<String> {
    match gcloud.service_url(service, region, project).await {
        Ok(url) => Some(url),
        Err(e) => {
            ui::print_warning(&format!("Could not look up {}: {}", service, e));
            None
        }
    }
}

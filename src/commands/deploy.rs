//! The deploy pipeline
//!
//! Strictly sequential: prerequisites, platform APIs, config resolution,
//! backend deploy, frontend deploy, smoke test, summary. The backend goes
//! first because its URL is baked into the frontend at build time. There is
//! no rollback: a backend that deployed stays deployed even if the frontend
//! fails afterwards.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

use crate::cli::DeployTarget;
use crate::config::{DeployConfig, DeployOutcome, ServiceSpec, DEFAULT_REGION, REQUIRED_APIS};
use crate::descriptor;
use crate::error::{ConfigError, PrereqError};
use crate::infrastructure::{CommandRunner, Gcloud, SystemRunner};
use crate::probe;
use crate::prompt::{self, Prompt, StdinPrompt};
use crate::tools::{self, tools::DOCKER, tools::GCLOUD};
use crate::ui;

pub struct DeployOptions {
    pub project: Option<String>,
    pub region: Option<String>,
    pub target: Option<DeployTarget>,
    pub backend_dir: String,
    pub frontend_dir: String,
    pub skip_smoke_test: bool,
}

pub async fn execute(opts: DeployOptions) -> Result<()> {
    // Tool checks come first so a missing prerequisite fails before any
    // network call is made.
    tools::require_tool(GCLOUD, "https://cloud.google.com/sdk/docs/install")?;
    tools::require_tool(DOCKER, "https://docs.docker.com/get-docker/")?;

    let runner = SystemRunner;
    let mut prompt = StdinPrompt;
    run_pipeline(&runner, &mut prompt, opts).await?;
    Ok(())
}

/// Run every phase against the given runner and prompt.
///
/// Separated from [`execute`] so tests can drive the whole pipeline with a
/// scripted runner and preset answers.
pub(crate) async fn run_pipeline(
    runner: &dyn CommandRunner,
    prompt: &mut dyn Prompt,
    opts: DeployOptions,
) -> Result<DeployOutcome> {
    ui::print_header("skylift - Cloud Run deploy");

    let gcloud = Gcloud::new(runner);

    ui::print_step("Prerequisites");
    let project = resolve_project(&gcloud, prompt, opts.project).await?;

    let target = match opts.target {
        Some(t) => t,
        None => prompt::choose_target(prompt)?,
    };

    ui::print_step("Platform APIs");
    enable_apis(&gcloud, &project).await;

    let region = match opts.region {
        Some(r) => r,
        None => prompt.input("Deployment region", Some(DEFAULT_REGION))?,
    };
    let config = DeployConfig::resolve(project, region, &opts.backend_dir, &opts.frontend_dir);
    info!("Deploying to {} in {}", config.project_id, config.region);

    let mut outcome = DeployOutcome::default();

    if target.includes_backend() {
        ui::print_step("Backend");
        outcome.backend_url = Some(deploy_backend(&gcloud, &config).await?);
    }

    if target.includes_frontend() {
        ui::print_step("Frontend");
        let backend_url = match outcome.backend_url.clone() {
            Some(url) => Some(url),
            None => lookup_existing_backend(&gcloud, &config).await,
        };
        outcome.frontend_url =
            Some(deploy_frontend(&gcloud, &config, backend_url.as_deref()).await?);
    }

    if !opts.skip_smoke_test {
        ui::print_step("Smoke test");
        smoke_test(&outcome).await?;
    }

    print_summary(&config, &outcome);
    Ok(outcome)
}

/// Ensure an authenticated session and a usable project id.
///
/// Project resolution order: `--project` flag, then gcloud config, then an
/// interactive prompt. Whenever the id did not come from gcloud config it is
/// persisted there with a single `config set project`.
async fn resolve_project(
    gcloud: &Gcloud<'_>,
    prompt: &mut dyn Prompt,
    flag: Option<String>,
) -> Result<String> {
    match gcloud.active_account().await? {
        Some(account) => ui::print_info(&format!("Authenticated as {}", account)),
        None => {
            ui::print_warning("No active gcloud session, starting login");
            gcloud.login().await?;
        }
    }

    let mut persist = true;
    let project = match flag {
        Some(p) if !p.trim().is_empty() => p.trim().to_string(),
        _ => match gcloud.configured_project().await? {
            Some(p) => {
                persist = false;
                p
            }
            None => {
                let entered = prompt.input("GCP project id", None)?.trim().to_string();
                if entered.is_empty() {
                    return Err(ConfigError::EmptyProject.into());
                }
                entered
            }
        },
    };

    if persist {
        gcloud.set_project(&project).await?;
    }

    if !gcloud.project_accessible(&project).await? {
        return Err(PrereqError::ProjectInaccessible { project }.into());
    }

    ui::print_success(&format!("Using project {}", project));
    Ok(project)
}

/// Enable every required API, warning on failure.
///
/// `gcloud services enable` fails the same way for "already enabled with a
/// stale permission" and genuine errors, so all failures get one warning and
/// the run continues.
async fn enable_apis(gcloud: &Gcloud<'_>, project: &str) {
    for api in REQUIRED_APIS {
        match gcloud.enable_service(api, project).await {
            Ok(()) => ui::print_info(&format!("{} enabled", api)),
            Err(e) => ui::print_warning(&format!(
                "Could not enable {} (it may already be enabled): {}",
                api, e
            )),
        }
    }
}

async fn deploy_backend(gcloud: &Gcloud<'_>, config: &DeployConfig) -> Result<String> {
    require_source_dir(&config.backend)?;
    descriptor::ensure_dockerfile(&config.backend.source_dir, descriptor::BACKEND_DOCKERFILE)
        .await?;
    build_and_deploy(gcloud, &config.backend, &config.region, &config.project_id).await
}

async fn deploy_frontend(
    gcloud: &Gcloud<'_>,
    config: &DeployConfig,
    backend_url: Option<&str>,
) -> Result<String> {
    require_source_dir(&config.frontend)?;

    match backend_url {
        Some(url) => {
            descriptor::write_frontend_env(&config.frontend.source_dir, url).await?;
        }
        None => ui::print_warning(
            "No backend URL available; frontend will be built without backend injection",
        ),
    }

    descriptor::ensure_dockerfile(&config.frontend.source_dir, descriptor::FRONTEND_DOCKERFILE)
        .await?;
    build_and_deploy(gcloud, &config.frontend, &config.region, &config.project_id).await
}

fn require_source_dir(spec: &ServiceSpec) -> Result<()> {
    if !spec.source_dir.is_dir() {
        return Err(ConfigError::SourceDirMissing {
            path: spec.source_dir.display().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Cloud Build, Cloud Run deploy, then URL capture for one service.
async fn build_and_deploy(
    gcloud: &Gcloud<'_>,
    spec: &ServiceSpec,
    region: &str,
    project: &str,
) -> Result<String> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Building {}...", spec.image));
    pb.enable_steady_tick(Duration::from_millis(100));

    let build_result = gcloud.submit_build(spec, project).await;
    pb.finish_and_clear();
    build_result?;
    ui::print_success(&format!("Built {}", spec.image));

    gcloud.deploy_service(spec, region, project).await?;
    let url = gcloud.service_url(&spec.name, region, project).await?;
    ui::print_success(&format!("{} deployed: {}", spec.name, url));
    Ok(url)
}

/// For a frontend-only run, the backend URL comes from the service that is
/// already deployed. A missing backend is a warning, not an error.
async fn lookup_existing_backend(gcloud: &Gcloud<'_>, config: &DeployConfig) -> Option<String> {
    match gcloud
        .service_url(&config.backend.name, &config.region, &config.project_id)
        .await
    {
        Ok(url) => {
            ui::print_info(&format!("Using existing backend at {}", url));
            Some(url)
        }
        Err(e) => {
            ui::print_warning(&format!("Could not look up backend service: {}", e));
            None
        }
    }
}

async fn smoke_test(outcome: &DeployOutcome) -> Result<()> {
    let client = probe::probe_client()?;

    if let Some(url) = &outcome.backend_url {
        let result = probe::probe_service(&client, "Backend", url, &["/health", "/"]).await;
        probe::report(&result);
    }
    if let Some(url) = &outcome.frontend_url {
        let result = probe::probe_service(&client, "Frontend", url, &["/"]).await;
        probe::report(&result);
    }
    Ok(())
}

fn print_summary(config: &DeployConfig, outcome: &DeployOutcome) {
    ui::print_header("Deployment summary");

    match &outcome.backend_url {
        Some(url) => println!("  Backend:  {}", url),
        None => println!("  Backend:  not deployed in this run"),
    }
    match &outcome.frontend_url {
        Some(url) => println!("  Frontend: {}", url),
        None => println!("  Frontend: not deployed in this run"),
    }

    println!();
    println!("Useful follow-ups:");
    println!(
        "  gcloud run services logs read {} --region {} --project {}",
        config.backend.name, config.region, config.project_id
    );
    println!(
        "  gcloud run services logs read {} --region {} --project {}",
        config.frontend.name, config.region, config.project_id
    );
    println!(
        "  gcloud run services list --region {} --project {}",
        config.region, config.project_id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runner::scripted::ScriptedRunner;
    use crate::infrastructure::CommandOutput;
    use crate::prompt::PresetPrompt;
    use tempfile::tempdir;

    const ACTIVE_ACCOUNT: &str = r#"[{"account": "dev@example.com", "status": "ACTIVE"}]"#;

    fn opts(target: DeployTarget, backend_dir: &str, frontend_dir: &str) -> DeployOptions {
        DeployOptions {
            project: None,
            region: Some("us-central1".to_string()),
            target: Some(target),
            backend_dir: backend_dir.to_string(),
            frontend_dir: frontend_dir.to_string(),
            skip_smoke_test: true,
        }
    }

    #[test]
    fn test_project_persisted_once_when_unset() {
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("(unset)\n"), // config get-value project
            CommandOutput::ok(""),          // config set project
            CommandOutput::ok("my-project\n"), // projects describe
        ]);
        let gcloud = Gcloud::new(&runner);
        let mut prompt = PresetPrompt::new(["my-project"]);

        let project =
            tokio_test::block_on(resolve_project(&gcloud, &mut prompt, None)).unwrap();

        assert_eq!(project, "my-project");
        assert_eq!(runner.calls_matching("config set project my-project"), 1);
    }

    #[test]
    fn test_configured_project_not_rewritten() {
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("existing-project\n"),
            CommandOutput::ok("existing-project\n"), // projects describe
        ]);
        let gcloud = Gcloud::new(&runner);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let project =
            tokio_test::block_on(resolve_project(&gcloud, &mut prompt, None)).unwrap();

        assert_eq!(project, "existing-project");
        assert_eq!(runner.calls_matching("config set project"), 0);
    }

    #[test]
    fn test_inaccessible_project_is_fatal() {
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::failed("not found"), // projects describe
        ]);
        let gcloud = Gcloud::new(&runner);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let err =
            tokio_test::block_on(resolve_project(&gcloud, &mut prompt, None)).unwrap_err();
        assert!(err.to_string().contains("not accessible"));
    }

    #[test]
    fn test_enable_apis_swallows_failures() {
        let runner = ScriptedRunner::new([
            CommandOutput::failed("already enabled"),
            CommandOutput::failed("permission denied"),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
        ]);
        let gcloud = Gcloud::new(&runner);

        tokio_test::block_on(enable_apis(&gcloud, "my-project"));
        assert_eq!(runner.calls_matching("services enable"), 5);
    }

    #[test]
    fn test_backend_only_never_touches_frontend() {
        let backend = tempdir().unwrap();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::ok("my-project\n"), // projects describe
            CommandOutput::ok(""),             // 5x services enable
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""), // builds submit
            CommandOutput::ok(""), // run deploy
            CommandOutput::ok("https://backend.example.run\n"),
        ]);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let outcome = tokio_test::block_on(run_pipeline(
            &runner,
            &mut prompt,
            opts(
                DeployTarget::Backend,
                backend.path().to_str().unwrap(),
                "frontend-does-not-exist",
            ),
        ))
        .unwrap();

        assert_eq!(
            outcome.backend_url.as_deref(),
            Some("https://backend.example.run")
        );
        assert_eq!(outcome.frontend_url, None);
        assert_eq!(runner.calls_matching("f1-strategy-frontend"), 0);
    }

    #[test]
    fn test_backend_dockerfile_written_before_build() {
        let backend = tempdir().unwrap();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::ok("my-project\n"), // projects describe
            CommandOutput::ok(""),             // 5x services enable
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""), // builds submit
            CommandOutput::ok(""), // run deploy
            CommandOutput::ok("https://backend.example.run\n"),
        ]);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        tokio_test::block_on(run_pipeline(
            &runner,
            &mut prompt,
            opts(
                DeployTarget::Backend,
                backend.path().to_str().unwrap(),
                "frontend",
            ),
        ))
        .unwrap();

        let dockerfile = std::fs::read_to_string(backend.path().join("Dockerfile")).unwrap();
        assert_eq!(dockerfile, descriptor::BACKEND_DOCKERFILE);
    }

    #[test]
    fn test_frontend_env_contains_backend_url() {
        let backend = tempdir().unwrap();
        let frontend = tempdir().unwrap();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::ok("my-project\n"), // projects describe
            CommandOutput::ok(""),             // 5x services enable
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""), // backend build
            CommandOutput::ok(""), // backend deploy
            CommandOutput::ok("https://backend.example.run\n"),
            CommandOutput::ok(""), // frontend build
            CommandOutput::ok(""), // frontend deploy
            CommandOutput::ok("https://frontend.example.run\n"),
        ]);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let outcome = tokio_test::block_on(run_pipeline(
            &runner,
            &mut prompt,
            opts(
                DeployTarget::Both,
                backend.path().to_str().unwrap(),
                frontend.path().to_str().unwrap(),
            ),
        ))
        .unwrap();

        assert_eq!(
            outcome.frontend_url.as_deref(),
            Some("https://frontend.example.run")
        );
        let env = std::fs::read_to_string(frontend.path().join(".env.production")).unwrap();
        assert_eq!(env, "REACT_APP_BACKEND_URL=https://backend.example.run\n");
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::ok("my-project\n"),
        ]);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let err = tokio_test::block_on(run_pipeline(
            &runner,
            &mut prompt,
            opts(DeployTarget::Backend, "no-such-backend-dir", "frontend"),
        ))
        .unwrap_err();

        assert!(err.to_string().contains("Source directory not found"));
        assert_eq!(runner.calls_matching("builds submit"), 0);
    }

    #[test]
    fn test_frontend_only_looks_up_existing_backend() {
        let frontend = tempdir().unwrap();
        let runner = ScriptedRunner::new([
            CommandOutput::ok(ACTIVE_ACCOUNT),
            CommandOutput::ok("my-project\n"),
            CommandOutput::ok("my-project\n"), // projects describe
            CommandOutput::ok(""),             // 5x services enable
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok(""),
            CommandOutput::ok("https://backend.example.run\n"), // backend lookup
            CommandOutput::ok(""),                              // frontend build
            CommandOutput::ok(""),                              // frontend deploy
            CommandOutput::ok("https://frontend.example.run\n"),
        ]);
        let mut prompt = PresetPrompt::new(Vec::<String>::new());

        let outcome = tokio_test::block_on(run_pipeline(
            &runner,
            &mut prompt,
            opts(
                DeployTarget::Frontend,
                "backend",
                frontend.path().to_str().unwrap(),
            ),
        ))
        .unwrap();

        assert_eq!(outcome.backend_url, None);
        assert_eq!(runner.calls_matching("builds submit"), 1);
        let env = std::fs::read_to_string(frontend.path().join(".env.production")).unwrap();
        assert_eq!(env, "REACT_APP_BACKEND_URL=https://backend.example.run\n");
    }
}

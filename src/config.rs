//! Deployment configuration
//!
//! Resolved once at the start of a run and threaded explicitly through every
//! phase; nothing reads ambient environment state after resolution.

use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "us-central1";

/// Platform APIs every deploy needs enabled on the project.
///
/// Enabling an already-enabled API is harmless, so these are attempted
/// unconditionally on every run.
pub const REQUIRED_APIS: [&str; 5] = [
    "run.googleapis.com",
    "cloudbuild.googleapis.com",
    "containerregistry.googleapis.com",
    "artifactregistry.googleapis.com",
    "aiplatform.googleapis.com",
];

pub const BACKEND_SERVICE: &str = "f1-strategy-backend";
pub const FRONTEND_SERVICE: &str = "f1-strategy-frontend";

/// Resolved per-service deployment parameters
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    /// Cloud Run service name
    pub name: String,
    /// Fully qualified image reference submitted to Cloud Build
    pub image: String,
    /// Directory containing the service source (and Dockerfile)
    pub source_dir: PathBuf,
    /// Memory limit passed to `gcloud run deploy`
    pub memory: &'static str,
    /// CPU limit
    pub cpu: &'static str,
    /// Maximum instance count
    pub max_instances: u32,
}

/// Full configuration for one deploy run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub project_id: String,
    pub region: String,
    pub backend: ServiceSpec,
    pub frontend: ServiceSpec,
}

impl DeployConfig {
    /// Derive service and image names from the resolved project id.
    ///
    /// Naming is fixed: images live under `gcr.io/<project>/` and carry the
    /// service name.
    pub fn resolve(
        project_id: impl Into<String>,
        region: impl Into<String>,
        backend_dir: impl Into<PathBuf>,
        frontend_dir: impl Into<PathBuf>,
    ) -> Self {
        let project_id = project_id.into();
        Self {
            backend: ServiceSpec {
                name: BACKEND_SERVICE.to_string(),
                image: format!("gcr.io/{}/{}", project_id, BACKEND_SERVICE),
                source_dir: backend_dir.into(),
                memory: "512Mi",
                cpu: "1",
                max_instances: 10,
            },
            frontend: ServiceSpec {
                name: FRONTEND_SERVICE.to_string(),
                image: format!("gcr.io/{}/{}", project_id, FRONTEND_SERVICE),
                source_dir: frontend_dir.into(),
                memory: "256Mi",
                cpu: "1",
                max_instances: 5,
            },
            project_id,
            region: region.into(),
        }
    }
}

/// URLs captured as deploys succeed; `None` means the service was not
/// deployed in this run.
#[derive(Debug, Default)]
pub struct DeployOutcome {
    pub backend_url: Option<String>,
    pub frontend_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_derives_names_from_project() {
        let config = DeployConfig::resolve("my-proj", "us-central1", "backend", "frontend");
        assert_eq!(config.backend.name, "f1-strategy-backend");
        assert_eq!(config.backend.image, "gcr.io/my-proj/f1-strategy-backend");
        assert_eq!(config.frontend.image, "gcr.io/my-proj/f1-strategy-frontend");
        assert_eq!(config.region, "us-central1");
    }

    #[test]
    fn test_resource_limits() {
        let config = DeployConfig::resolve("p", DEFAULT_REGION, "b", "f");
        assert_eq!(config.backend.memory, "512Mi");
        assert_eq!(config.backend.max_instances, 10);
        assert_eq!(config.frontend.memory, "256Mi");
        assert_eq!(config.frontend.max_instances, 5);
    }

    #[test]
    fn test_required_apis() {
        assert_eq!(REQUIRED_APIS.len(), 5);
        assert!(REQUIRED_APIS.contains(&"run.googleapis.com"));
        assert!(REQUIRED_APIS.contains(&"cloudbuild.googleapis.com"));
    }
}

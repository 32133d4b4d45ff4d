//! Generated build artifacts
//!
//! Two kinds of files are written into service source directories:
//! a minimal Dockerfile when the directory has none, and the frontend's
//! `.env.production` carrying the backend URL for build-time injection.
//! Existing Dockerfiles are never overwritten.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub const BACKEND_DOCKERFILE: &str = "\
FROM python:3.11-slim

WORKDIR /app

COPY requirements.txt .
RUN pip install --no-cache-dir -r requirements.txt

COPY . .

ENV PORT=8080
CMD exec uvicorn main:app --host 0.0.0.0 --port ${PORT}
";

pub const FRONTEND_DOCKERFILE: &str = "\
FROM node:18-alpine AS build

WORKDIR /app

COPY package*.json ./
RUN npm ci

COPY . .
RUN npm run build

FROM nginx:alpine
COPY --from=build /app/build /usr/share/nginx/html
RUN sed -i 's/listen  *80;/listen 8080;/' /etc/nginx/conf.d/default.conf

EXPOSE 8080
CMD [\"nginx\", \"-g\", \"daemon off;\"]
";

pub const FRONTEND_ENV_FILE: &str = ".env.production";

/// Write a Dockerfile into `dir` if one is not already present.
///
/// Returns true when a file was written.
pub async fn ensure_dockerfile(dir: &Path, template: &str) -> Result<bool> {
    let dockerfile = dir.join("Dockerfile");
    if dockerfile.exists() {
        return Ok(false);
    }

    info!("No Dockerfile in {}, writing default", dir.display());
    tokio::fs::write(&dockerfile, template)
        .await
        .with_context(|| format!("Failed to write {}", dockerfile.display()))?;
    Ok(true)
}

/// Write the backend URL into the frontend's build-time environment file.
///
/// The frontend build reads `REACT_APP_BACKEND_URL` and bakes it into the
/// produced bundle, so this must run before the frontend build is submitted.
pub async fn write_frontend_env(frontend_dir: &Path, backend_url: &str) -> Result<()> {
    let env_path = frontend_dir.join(FRONTEND_ENV_FILE);
    let content = format!("REACT_APP_BACKEND_URL={}\n", backend_url);
    tokio::fs::write(&env_path, content)
        .await
        .with_context(|| format!("Failed to write {}", env_path.display()))?;
    info!("Wrote backend URL to {}", env_path.display());
    Ok(())
}

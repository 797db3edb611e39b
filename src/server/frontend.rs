use super::types::FrontendError;
use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, warn};

const ENTRY_DOCUMENT: &str = "index.html";

/// Prebuilt single-page frontend served for every route the API does not own.
#[derive(Debug, Clone)]
pub struct FrontendBundle {
    root: PathBuf,
}

impl FrontendBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serves `path` if it names a file inside the bundle, else the entry
    /// document so client-side routing can take over.
    pub async fn serve(&self, path: &str, request: Request) -> Response {
        let target = match self.resolve_asset(path).await {
            Some(asset) => asset,
            None => self.root.join(ENTRY_DOCUMENT),
        };

        if !is_file(&target).await {
            warn!(
                "Frontend entry document missing under {}",
                self.root.display()
            );
            return not_built();
        }

        debug!("Serving frontend file {}", target.display());
        let response = ServeFile::new(&target)
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        if response.status() == StatusCode::NOT_FOUND {
            return not_built();
        }

        response.into_response()
    }

    /// Maps a request path onto a regular file inside the bundle. Paths with
    /// parent, root or prefix components never resolve.
    async fn resolve_asset(&self, path: &str) -> Option<PathBuf> {
        if path.is_empty() {
            return None;
        }

        let relative = Path::new(path);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return None;
        }

        let candidate = self.root.join(relative);
        is_file(&candidate).await.then_some(candidate)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

fn not_built() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FrontendError::not_built()),
    )
        .into_response()
}

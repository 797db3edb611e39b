use super::{
    frontend::FrontendBundle,
    types::{HealthStatus, SearchRequest, SearchResponse},
};
use crate::{Error, agent::SearchAgent, llm::LlmClient};
use axum::{
    Json,
    extract::{
        Path, Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn LlmClient>,
    pub agent: Option<Arc<SearchAgent>>,
    pub frontend: Arc<FrontendBundle>,
}

type ApiResult = Result<Json<SearchResponse>, (StatusCode, Json<SearchResponse>)>;

pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult {
    let request_id = Uuid::new_v4();
    let Json(request) = payload.map_err(|rejection| reject(request_id, rejection))?;
    info!(%request_id, "Received search request: {}", request.query);

    match state.llm.complete(&request.query).await {
        Ok(answer) => {
            info!(%request_id, "Provider answered ({} chars)", answer.len());
            Ok(Json(SearchResponse { answer }))
        }
        Err(e) => Err(provider_failure(request_id, e)),
    }
}

pub async fn agent_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult {
    let request_id = Uuid::new_v4();
    let Json(request) = payload.map_err(|rejection| reject(request_id, rejection))?;
    info!(%request_id, "Received agent request: {}", request.query);

    let Some(agent) = state.agent.as_ref() else {
        return Err(provider_failure(
            request_id,
            Error::config("search provider is not configured (set SERPAPI_API_KEY)"),
        ));
    };

    match agent.run(&request.query).await {
        Ok(answer) => Ok(Json(SearchResponse { answer })),
        Err(e) => Err(provider_failure(request_id, e)),
    }
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

pub async fn frontend_index(State(state): State<AppState>, request: Request) -> Response {
    state.frontend.serve("", request).await
}

pub async fn frontend_asset(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    request: Request,
) -> Response {
    // Undecodable paths cannot name an asset, so they get the entry document
    let path = match path {
        Ok(Path(path)) => path,
        Err(rejection) => {
            warn!("Unresolvable frontend path: {}", rejection.body_text());
            String::new()
        }
    };
    state.frontend.serve(&path, request).await
}

fn provider_failure(request_id: Uuid, e: Error) -> (StatusCode, Json<SearchResponse>) {
    error!(%request_id, error = ?e, "Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(SearchResponse::error(e)),
    )
}

fn reject(request_id: Uuid, rejection: JsonRejection) -> (StatusCode, Json<SearchResponse>) {
    warn!(%request_id, "Rejected request body: {}", rejection.body_text());
    (
        rejection.status(),
        Json(SearchResponse::error(rejection.body_text())),
    )
}

//! Event ingestion endpoint

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiError, ApiResponse, ApiResult};
use crate::api::auth::STATS_WRITE;
use crate::api::state::AppState;
use crate::validation::ValidationCode;

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    #[serde(alias = "serverId", alias = "server_id")]
    pub server: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct IngestSummary {
    pub processed: usize,
    pub players: usize,
    pub rejected: usize,
}

/// POST /stats/events?server={serverId} - Ingest one batch of events
///
/// The body is parsed here rather than by the `Json` extractor so that
/// malformed JSON gets the `INVALID_BODY` envelope.
pub async fn post_events(
    State(state): State<Arc<AppState>>,
    params: Result<Query<IngestParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<IngestSummary> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let claims = state.auth.authorize(header, STATS_WRITE)?;

    let Query(params) = params?;
    let server_id = params.server.unwrap_or_default();

    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::bad_request(ValidationCode::InvalidBody, format!("Request body is not valid JSON: {}", e))
    })?;

    let report = state.engine.ingest(server_id.trim(), &body).await?;
    log::debug!("Batch from {} for {}: {:?}", claims.sub, server_id, report);

    Ok(ApiResponse::new(IngestSummary {
        processed: report.processed,
        players: report.players,
        rejected: report.rejected,
    }))
}

//! Clan roll-up endpoint

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::query::{clamp_limit, clan_view, parse_server_filter, parse_timeframe, roll_up_clans};
use crate::store::StoreError;
use crate::types::Timeframe;

#[derive(Debug, Deserialize)]
pub struct ClanParams {
    pub timeframe: Option<String>,
    #[serde(alias = "serverId")]
    pub server_id: Option<String>,
    pub limit: Option<usize>,
}

/// GET /stats/clans - Clans ranked by summed points
pub async fn get_clans(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ClanParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let timeframe = parse_timeframe(params.timeframe.as_deref(), Timeframe::Overall)?;
    let server_id = parse_server_filter(params.server_id.as_deref())?;
    let limit = clamp_limit(params.limit);

    let store = state
        .stores()
        .get(timeframe)
        .ok_or_else(|| ApiError::from(StoreError::Unavailable(timeframe.table_name().to_string())))?;
    let rows = store.all_rows(server_id.as_deref()).await?;

    let registry = state.registry();
    let clans: Vec<Value> = roll_up_clans(registry, &rows)
        .iter()
        .take(limit)
        .map(|c| clan_view(registry, c))
        .collect();

    Ok(ApiResponse::new(json!({
        "timeframe": timeframe,
        "serverId": server_id,
        "clans": clans,
    })))
}

//! Leaderboard endpoint

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;

use super::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::query::{leaderboard, Leaderboard, LeaderboardParams, LeaderboardQuery};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQueryParams {
    pub timeframe: Option<String>,
    #[serde(alias = "serverId")]
    pub server_id: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// GET /stats/leaderboard - Ranked page of one timeframe
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    params: Result<Query<LeaderboardQueryParams>, QueryRejection>,
) -> ApiResult<Leaderboard> {
    let Query(p) = params?;
    let query = LeaderboardQuery::resolve(
        state.registry(),
        &LeaderboardParams {
            timeframe: p.timeframe,
            server_id: p.server_id,
            sort: p.sort,
            order: p.order,
            limit: p.limit,
            offset: p.offset,
        },
    )?;

    let board = leaderboard(state.registry(), state.stores(), &query).await?;
    Ok(ApiResponse::new(board))
}

//! Player endpoints

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use super::{ApiError, ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::query::{parse_server_filter, parse_timeframe, player_everywhere, player_on_server};
use crate::types::Timeframe;
use crate::validation::{is_valid_player_id, ValidationCode};

#[derive(Debug, Deserialize)]
pub struct PlayerParams {
    #[serde(alias = "serverId")]
    pub server_id: Option<String>,
    pub timeframe: Option<String>,
}

/// GET /stats/player/:player_id - One player's stats
///
/// With `server_id`: that server's row in `timeframe` (default overall), or
/// `null`. Without: every server's rows, keyed by timeframe.
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    params: Result<Query<PlayerParams>, QueryRejection>,
) -> ApiResult<Value> {
    let Query(params) = params?;
    let player_id = player_id.trim();
    if !is_valid_player_id(player_id) {
        return Err(ApiError::bad_request(
            ValidationCode::InvalidPlayerId,
            "Player id must be exactly 17 digits",
        ));
    }

    let data = match parse_server_filter(params.server_id.as_deref())? {
        Some(server_id) => {
            let timeframe = parse_timeframe(params.timeframe.as_deref(), Timeframe::Overall)?;
            player_on_server(state.registry(), state.stores(), player_id, &server_id, timeframe).await?
        }
        None => {
            let timeframes = match params.timeframe.as_deref() {
                Some(t) => vec![parse_timeframe(Some(t), Timeframe::Overall)?],
                None => Timeframe::ALL.to_vec(),
            };
            player_everywhere(state.registry(), state.stores(), player_id, &timeframes).await?
        }
    };

    Ok(ApiResponse::new(data))
}

//! Per-player lookups across servers and timeframes

use serde_json::{Map, Value};

use super::view::player_view;
use crate::registry::StatRegistry;
use crate::store::{StoreError, StoreResult, TimeframeStores};
use crate::types::Timeframe;

/// One player's row on one server, or `null`
pub async fn player_on_server(
    registry: &StatRegistry,
    stores: &TimeframeStores,
    player_id: &str,
    server_id: &str,
    timeframe: Timeframe,
) -> StoreResult<Value> {
    let store = stores
        .get(timeframe)
        .ok_or_else(|| StoreError::Unavailable(timeframe.table_name().to_string()))?;
    let rows = store.fetch_rows(server_id, &[player_id.to_string()]).await?;
    Ok(rows
        .first()
        .map(|row| player_view(registry, row))
        .unwrap_or(Value::Null))
}

/// One player's rows on every server, keyed by timeframe
///
/// Each requested timeframe maps to an array of views, or `null` when the
/// player has no row there.
pub async fn player_everywhere(
    registry: &StatRegistry,
    stores: &TimeframeStores,
    player_id: &str,
    timeframes: &[Timeframe],
) -> StoreResult<Value> {
    let mut object = Map::new();
    for &timeframe in timeframes {
        let Some(store) = stores.get(timeframe) else {
            continue;
        };
        let rows = store.rows_for_player(player_id).await?;
        let value = if rows.is_empty() {
            Value::Null
        } else {
            Value::Array(rows.iter().map(|row| player_view(registry, row)).collect())
        };
        object.insert(timeframe.as_str().to_string(), value);
    }
    Ok(Value::Object(object))
}

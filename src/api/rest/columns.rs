//! Stat column catalogue

use std::sync::Arc;

use axum::extract::State;
use serde_json::{json, Value};

use super::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::query::camel_case;
use crate::types::Timeframe;

/// GET /stats/columns - Registry descriptors plus the legal event names
pub async fn get_columns(State(state): State<Arc<AppState>>) -> ApiResult<Value> {
    let registry = state.registry();

    let columns: Vec<Value> = registry
        .columns()
        .iter()
        .map(|desc| {
            let mut value = json!(desc);
            value["key"] = json!(camel_case(desc.column));
            value
        })
        .collect();
    let mut events: Vec<&str> = registry.legal_events().collect();
    events.sort_unstable();

    Ok(ApiResponse::new(json!({
        "columns": columns,
        "events": events,
        "sortable": registry.sortable_columns().collect::<Vec<_>>(),
        "timeframes": Timeframe::ALL,
    })))
}

//! Ranked reads of one timeframe

use serde::Serialize;
use serde_json::Value;

use super::view::player_view;
use crate::registry::StatRegistry;
use crate::store::{RowQuery, SortOrder, StoreError, TimeframeStores};
use crate::types::Timeframe;
use crate::validation::{is_valid_server_id, ValidationCode, ValidationError};

pub const DEFAULT_SORT: &str = "points";
pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 500;

/// Unvalidated leaderboard parameters as they arrive on the query string
#[derive(Debug, Clone, Default)]
pub struct LeaderboardParams {
    pub timeframe: Option<String>,
    pub server_id: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardQuery {
    pub timeframe: Timeframe,
    pub rows: RowQuery,
}

impl LeaderboardQuery {
    /// Apply defaults and check every parameter against the registry
    pub fn resolve(registry: &StatRegistry, params: &LeaderboardParams) -> Result<Self, ValidationError> {
        let timeframe = parse_timeframe(params.timeframe.as_deref(), Timeframe::Overall)?;
        let server_id = parse_server_filter(params.server_id.as_deref())?;

        let requested = params
            .sort
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_SORT.to_string());
        let sort = registry
            .sortable_columns()
            .find(|c| *c == requested)
            .ok_or_else(|| {
                ValidationError::new(ValidationCode::InvalidSort, format!("'{}' is not a sortable column", requested))
                    .with_details(serde_json::json!({ "sortable": registry.sortable_columns().collect::<Vec<_>>() }))
            })?;

        let order = match params.order.as_deref() {
            None => SortOrder::default(),
            Some(o) => o
                .parse::<SortOrder>()
                .map_err(|e| ValidationError::new(ValidationCode::InvalidSort, e))?,
        };

        Ok(Self {
            timeframe,
            rows: RowQuery {
                server_id,
                sort,
                order,
                limit: clamp_limit(params.limit),
                offset: params.offset.unwrap_or(0),
            },
        })
    }
}

/// `None` falls back to `default`; anything else must name a timeframe
pub fn parse_timeframe(value: Option<&str>, default: Timeframe) -> Result<Timeframe, ValidationError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .parse::<Timeframe>()
            .map_err(|e| ValidationError::new(ValidationCode::InvalidTimeframe, e)),
    }
}

/// Optional server filter; blank means every server
pub fn parse_server_filter(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if is_valid_server_id(v) => Ok(Some(v.to_string())),
        Some(_) => Err(ValidationError::new(
            ValidationCode::InvalidServerId,
            "Server id must be 1-64 characters of letters, digits, '_', '-' or '.'",
        )),
    }
}

pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub timeframe: Timeframe,
    #[serde(rename = "serverId")]
    pub server_id: Option<String>,
    pub sort: &'static str,
    pub order: &'static str,
    pub offset: usize,
    pub entries: Vec<Value>,
}

/// Read one page of a timeframe; each entry carries its 1-based `rank`
pub async fn leaderboard(
    registry: &StatRegistry,
    stores: &TimeframeStores,
    query: &LeaderboardQuery,
) -> Result<Leaderboard, StoreError> {
    let store = stores
        .get(query.timeframe)
        .ok_or_else(|| StoreError::Unavailable(query.timeframe.table_name().to_string()))?;
    let rows = store.query_rows(&query.rows).await?;

    let entries = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut view = player_view(registry, row);
            if let Value::Object(map) = &mut view {
                map.insert("rank".to_string(), Value::from(query.rows.offset + i + 1));
            }
            view
        })
        .collect();

    Ok(Leaderboard {
        timeframe: query.timeframe,
        server_id: query.rows.server_id.clone(),
        sort: query.rows.sort,
        order: match query.rows.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        },
        offset: query.rows.offset,
        entries,
    })
}

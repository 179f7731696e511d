//! Persisted aggregate rows

use std::collections::BTreeMap;

use serde::Serialize;

use super::event::UNKNOWN_PLAYER_NAME;
use super::value::StatValue;
use crate::registry::StatRegistry;

/// One player's cumulative stats within one timeframe and server
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub server_id: String,
    pub player_id: String,
    pub name: String,
    pub clan: String,
    /// Every registry column, including derived ones
    pub values: BTreeMap<String, StatValue>,
    /// Unix seconds of the last ingestion touching this row
    pub updated_at: i64,
}

impl AggregateRow {
    /// A row holding every column's default, as if the player had never been seen
    pub fn empty(registry: &StatRegistry, server_id: &str, player_id: &str) -> Self {
        let values = registry
            .columns()
            .iter()
            .map(|d| (d.column.to_string(), d.default.to_value()))
            .collect();

        Self {
            server_id: server_id.to_string(),
            player_id: player_id.to_string(),
            name: UNKNOWN_PLAYER_NAME.to_string(),
            clan: String::new(),
            values,
            updated_at: 0,
        }
    }

    pub fn value(&self, column: &str) -> Option<&StatValue> {
        self.values.get(column)
    }

    pub fn uint(&self, column: &str) -> u64 {
        self.values.get(column).map(StatValue::as_u64).unwrap_or(0)
    }

    pub fn float(&self, column: &str) -> f64 {
        self.values.get(column).map(StatValue::as_f64).unwrap_or(0.0)
    }

    pub fn set(&mut self, column: &str, value: StatValue) {
        self.values.insert(column.to_string(), value);
    }

    /// Fill columns missing from a stored row with registry defaults
    pub fn fill_defaults(&mut self, registry: &StatRegistry) {
        for desc in registry.columns() {
            self.values
                .entry(desc.column.to_string())
                .or_insert_with(|| desc.default.to_value());
        }
    }
}

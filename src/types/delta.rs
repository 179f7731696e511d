//! Per-player change contributed by one ingestion batch

use std::collections::BTreeMap;

/// Net change for one player within one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerDelta {
    pub player_id: String,
    /// Column -> summed amount (aggregatable, event-backed columns only)
    pub counter_deltas: BTreeMap<&'static str, u64>,
    /// Weapon -> kill count
    pub weapon_kill_deltas: BTreeMap<String, u64>,
    /// Latest reported name other than the sentinel
    pub display_name: Option<String>,
    /// Latest non-empty clan tag
    pub clan_tag: Option<String>,
    /// Number of events folded into this delta
    pub event_count: usize,
}

impl PlayerDelta {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Default::default()
        }
    }

    pub fn counter(&self, column: &str) -> u64 {
        self.counter_deltas.get(column).copied().unwrap_or(0)
    }

    pub fn add_counter(&mut self, column: &'static str, amount: u64) {
        let total = self.counter_deltas.entry(column).or_insert(0);
        *total = total.saturating_add(amount);
    }

    pub fn add_weapon_kills(&mut self, weapon: &str, amount: u64) {
        let total = self.weapon_kill_deltas.entry(weapon.to_string()).or_insert(0);
        *total = total.saturating_add(amount);
    }
}

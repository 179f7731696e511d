//! Folds validated events into per-player deltas

use std::collections::BTreeMap;

use crate::registry::StatRegistry;
use crate::types::{PlayerDelta, StatEvent};

/// Fold a batch into one delta per player
///
/// Events are processed once, in arrival order, so the last reported name
/// and clan of a player win within the batch.
pub fn accumulate(registry: &StatRegistry, events: &[StatEvent]) -> BTreeMap<String, PlayerDelta> {
    let weapon_column = registry.weapon_column();
    let mut deltas: BTreeMap<String, PlayerDelta> = BTreeMap::new();

    for event in events {
        let delta = deltas
            .entry(event.player_id.clone())
            .or_insert_with(|| PlayerDelta::new(event.player_id.clone()));
        delta.event_count += 1;

        if registry.is_aggregatable(event.column) {
            delta.add_counter(event.column, event.amount);
        }

        if Some(event.column) == weapon_column {
            if let Some(weapon) = event.weapon.as_deref() {
                delta.add_weapon_kills(weapon, event.amount);
            }
        }

        if event.has_display_name() {
            delta.display_name = Some(event.player_name.clone());
        }
        if !event.clan_tag.is_empty() {
            delta.clan_tag = Some(event.clan_tag.clone());
        }
    }

    deltas
}

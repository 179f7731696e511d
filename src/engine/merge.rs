//! Merge of stored baselines with batch deltas, and derived-field computation
//!
//! Everything here is pure: the same baseline, delta and `now` always
//! produce the same row.

use std::collections::{BTreeMap, HashMap};

use crate::registry::{Derivation, StatRegistry};
use crate::types::{AggregateRow, PlayerDelta, StatValue};

/// Merge every delta of a batch against one timeframe's baseline rows
pub fn merge_timeframe(
    registry: &StatRegistry,
    server_id: &str,
    baseline: &HashMap<String, AggregateRow>,
    deltas: &BTreeMap<String, PlayerDelta>,
    now: i64,
) -> Vec<AggregateRow> {
    deltas
        .values()
        .map(|delta| merge_row(registry, server_id, baseline.get(&delta.player_id), delta, now))
        .collect()
}

/// Combine one stored row (or none) with one player's delta
pub fn merge_row(
    registry: &StatRegistry,
    server_id: &str,
    existing: Option<&AggregateRow>,
    delta: &PlayerDelta,
    now: i64,
) -> AggregateRow {
    let mut row = match existing {
        Some(existing) => {
            let mut row = existing.clone();
            row.fill_defaults(registry);
            row
        }
        None => AggregateRow::empty(registry, server_id, &delta.player_id),
    };
    row.server_id = server_id.to_string();
    row.player_id = delta.player_id.clone();

    for &column in registry.aggregatable_columns() {
        if let Some(desc) = registry.descriptor(column) {
            let current = row
                .value(column)
                .cloned()
                .unwrap_or_else(|| desc.default.to_value());
            let added = StatValue::UInt(delta.counter(column));
            row.set(column, current.saturating_add(&added, desc.storage));
        }
    }

    if let Some(name) = &delta.display_name {
        row.name = name.clone();
    }
    if let Some(clan) = &delta.clan_tag {
        row.clan = clan.clone();
    }

    derive_fields(registry, &mut row, &delta.weapon_kill_deltas);
    row.updated_at = now;
    row
}

/// Recompute every derived column of a row
///
/// `weapon_deltas` are added to the row's stored weapon map; pass an empty
/// map to only recompute ratios and points.
pub fn derive_fields(
    registry: &StatRegistry,
    row: &mut AggregateRow,
    weapon_deltas: &BTreeMap<String, u64>,
) {
    for desc in registry.columns() {
        let value = match desc.derived {
            Some(Derivation::Ratio {
                numerator,
                denominator,
            }) => StatValue::Float(ratio(row.float(numerator), row.float(denominator))),
            Some(Derivation::Points) => StatValue::UInt(points(registry, row)),
            Some(Derivation::WeaponTally) => {
                let mut weapons = parse_weapon_map(row.value(desc.column));
                add_weapon_kills(&mut weapons, weapon_deltas);
                StatValue::Json(weapon_map_json(&weapons))
            }
            None => continue,
        };
        row.set(desc.column, value.coerce(desc.storage));
    }
}

/// Kill/death style ratio
///
/// A zero denominator yields the numerator itself, so deathless players are
/// ranked by kills instead of dividing by zero. Otherwise the quotient is
/// rounded to two decimal places.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        (numerator / denominator * 100.0).round() / 100.0
    }
}

/// Weighted sum over the registry's point columns
pub fn points(registry: &StatRegistry, row: &AggregateRow) -> u64 {
    registry
        .point_columns()
        .iter()
        .fold(0u64, |total, &(column, weight)| {
            total.saturating_add(row.uint(column).saturating_mul(weight))
        })
}

/// Parse a stored weapon map; anything malformed reads as empty
pub fn parse_weapon_map(value: Option<&StatValue>) -> BTreeMap<String, u64> {
    let Some(text) = value.and_then(StatValue::as_json_str) else {
        return BTreeMap::new();
    };

    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(weapon, count)| {
                let count = count
                    .as_u64()
                    .or_else(|| count.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?;
                Some((weapon, count))
            })
            .collect(),
        _ => {
            log::warn!("Ignoring malformed weapon map: {:.80}", text);
            BTreeMap::new()
        }
    }
}

/// Key-wise sum of `deltas` into `weapons`
pub fn add_weapon_kills(weapons: &mut BTreeMap<String, u64>, deltas: &BTreeMap<String, u64>) {
    for (weapon, count) in deltas {
        let total = weapons.entry(weapon.clone()).or_insert(0);
        *total = total.saturating_add(*count);
    }
}

pub fn weapon_map_json(weapons: &BTreeMap<String, u64>) -> String {
    serde_json::to_string(weapons).unwrap_or_else(|_| "{}".to_string())
}

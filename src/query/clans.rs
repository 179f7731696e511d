//! Clan roll-ups: members of a clan summed into one synthetic row

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use super::view::insert_stat_columns;
use crate::engine::merge::{add_weapon_kills, derive_fields, parse_weapon_map, points};
use crate::registry::StatRegistry;
use crate::types::AggregateRow;

/// One clan's summed stats
#[derive(Debug, Clone, PartialEq)]
pub struct ClanRollup {
    pub clan: String,
    pub members: usize,
    /// Summed counters with derived fields recomputed from the sums
    pub totals: AggregateRow,
}

/// Group rows by non-empty clan tag, ordered by points (descending) then tag
///
/// Rows of the same player on different servers count as separate members.
pub fn roll_up_clans(registry: &StatRegistry, rows: &[AggregateRow]) -> Vec<ClanRollup> {
    let mut groups: HashMap<&str, (usize, AggregateRow, BTreeMap<String, u64>)> = HashMap::new();

    for row in rows.iter().filter(|r| !r.clan.is_empty()) {
        let (members, totals, weapons) = groups.entry(row.clan.as_str()).or_insert_with(|| {
            let mut totals = AggregateRow::empty(registry, "", "");
            totals.name = row.clan.clone();
            totals.clan = row.clan.clone();
            (0, totals, BTreeMap::new())
        });

        *members += 1;
        for &column in registry.aggregatable_columns() {
            if let Some(desc) = registry.descriptor(column) {
                let current = totals.value(column).cloned().unwrap_or_else(|| desc.default.to_value());
                let member = row.value(column).cloned().unwrap_or_else(|| desc.default.to_value());
                totals.set(column, current.saturating_add(&member, desc.storage));
            }
        }
        if let Some(column) = registry.weapon_tally_column() {
            add_weapon_kills(weapons, &parse_weapon_map(row.value(column)));
        }
        totals.updated_at = totals.updated_at.max(row.updated_at);
    }

    let mut clans: Vec<ClanRollup> = groups
        .into_iter()
        .map(|(clan, (members, mut totals, weapons))| {
            derive_fields(registry, &mut totals, &weapons);
            ClanRollup {
                clan: clan.to_string(),
                members,
                totals,
            }
        })
        .collect();

    clans.sort_by(|a, b| {
        points(registry, &b.totals)
            .cmp(&points(registry, &a.totals))
            .then_with(|| a.clan.cmp(&b.clan))
    });
    clans
}

pub fn clan_view(registry: &StatRegistry, rollup: &ClanRollup) -> Value {
    let mut object = Map::new();
    object.insert("clan".to_string(), Value::String(rollup.clan.clone()));
    object.insert("members".to_string(), Value::from(rollup.members));
    insert_stat_columns(registry, &rollup.totals, &mut object);
    object.insert("updatedAt".to_string(), Value::from(rollup.totals.updated_at));
    Value::Object(object)
}

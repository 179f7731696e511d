//! JSON views of aggregate rows

use serde_json::{Map, Value};

use crate::registry::StatRegistry;
use crate::types::AggregateRow;
use crate::utils::format_duration;

/// `npc_kills` -> `npcKills`
pub fn camel_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len());
    let mut upper = false;
    for c in column.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Insert every registry column of `row` into `object`, plus a formatted
/// companion for each duration column
pub fn insert_stat_columns(registry: &StatRegistry, row: &AggregateRow, object: &mut Map<String, Value>) {
    for desc in registry.columns() {
        let value = row
            .value(desc.column)
            .cloned()
            .unwrap_or_else(|| desc.default.to_value())
            .coerce(desc.storage);
        object.insert(camel_case(desc.column), value.to_json());
    }
    for desc in registry.duration_columns() {
        object.insert(
            format!("{}Formatted", camel_case(desc.column)),
            Value::String(format_duration(row.uint(desc.column))),
        );
    }
}

/// Public view of one player row
pub fn player_view(registry: &StatRegistry, row: &AggregateRow) -> Value {
    let mut object = Map::new();
    object.insert("serverId".to_string(), Value::String(row.server_id.clone()));
    object.insert("steamId".to_string(), Value::String(row.player_id.clone()));
    object.insert("name".to_string(), Value::String(row.name.clone()));
    object.insert("clan".to_string(), Value::String(row.clan.clone()));
    insert_stat_columns(registry, row, &mut object);
    object.insert("updatedAt".to_string(), Value::from(row.updated_at));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatValue;
    use serde_json::json;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("kills"), "kills");
        assert_eq!(camel_case("npc_kills"), "npcKills");
        assert_eq!(camel_case("bradleys_destroyed"), "bradleysDestroyed");
    }

    #[test]
    fn test_player_view_shapes_every_column() {
        let registry = StatRegistry::standard().unwrap();
        let mut row = AggregateRow::empty(&registry, "eu-1", "76561198000000000");
        row.set("kills", StatValue::UInt(12));
        row.set("kdr", StatValue::Float(2.4));
        row.set("playtime", StatValue::UInt(3725));
        row.set("weapon_kills", StatValue::Json(r#"{"rifle.ak":12}"#.to_string()));
        row.updated_at = 1_700_000_000;

        let view = player_view(&registry, &row);
        assert_eq!(view["serverId"], "eu-1");
        assert_eq!(view["steamId"], "76561198000000000");
        assert_eq!(view["name"], "Unknown");
        assert_eq!(view["kills"], 12);
        assert_eq!(view["kdr"], 2.4);
        assert_eq!(view["npcKills"], 0);
        assert_eq!(view["playtimeFormatted"], "01:02:05");
        assert_eq!(view["weaponKills"], json!({"rifle.ak": 12}));
        assert_eq!(view["updatedAt"], 1_700_000_000);
        for desc in registry.columns() {
            assert!(view.get(camel_case(desc.column)).is_some(), "missing {}", desc.column);
        }
    }
}

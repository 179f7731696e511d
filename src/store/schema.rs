//! SQL layout of a timeframe table, generated from the stat registry
//!
//! ```text
//! stats_<timeframe>
//! ┌───────────┬───────────┬──────┬──────┬─ one column per descriptor ─┬────────────┐
//! │ server_id │ player_id │ name │ clan │ kills │ deaths │ ... │ kdr  │ updated_at │
//! └───────────┴───────────┴──────┴──────┴──────────────────────────────┴────────────┘
//!   PRIMARY KEY (server_id, player_id)
//! ```
//!
//! Appending a descriptor to the registry adds the column on the next start
//! (`ALTER TABLE ... ADD COLUMN`); existing rows read the descriptor default.

use std::collections::HashSet;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

use super::StoreResult;
use crate::registry::{DefaultValue, StatRegistry, StorageType};
use crate::types::{AggregateRow, StatValue, Timeframe, UNKNOWN_PLAYER_NAME};

/// Number of key/display columns preceding the stat columns in every select
const LEADING_COLUMNS: usize = 4;

#[derive(Debug, Clone)]
struct SchemaColumn {
    name: &'static str,
    storage: StorageType,
    default: DefaultValue,
}

/// Generated DDL and DML for one timeframe table
#[derive(Debug, Clone)]
pub struct TableSchema {
    table: &'static str,
    columns: Vec<SchemaColumn>,
    select_list: String,
    upsert: String,
}

impl TableSchema {
    pub fn new(timeframe: Timeframe, registry: &StatRegistry) -> Self {
        let table = timeframe.table_name();
        let columns: Vec<SchemaColumn> = registry
            .columns()
            .iter()
            .map(|d| SchemaColumn {
                name: d.column,
                storage: d.storage,
                default: d.default,
            })
            .collect();

        let stat_names: Vec<String> = columns.iter().map(|c| quote_ident(c.name)).collect();
        let select_list = format!(
            "server_id, player_id, name, clan, {}, updated_at",
            stat_names.join(", ")
        );

        let placeholders: Vec<String> = (1..=columns.len() + LEADING_COLUMNS + 1)
            .map(|i| format!("?{}", i))
            .collect();
        let updates: Vec<String> = ["name", "clan"]
            .iter()
            .map(|c| c.to_string())
            .chain(stat_names.iter().cloned())
            .chain(std::iter::once("updated_at".to_string()))
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        let upsert = format!(
            "INSERT INTO {table} ({select_list}) VALUES ({}) \
             ON CONFLICT(server_id, player_id) DO UPDATE SET {}",
            placeholders.join(", "),
            updates.join(", ")
        );

        Self {
            table,
            columns,
            select_list,
            upsert,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Comma-separated column list matching [`TableSchema::read_row`]
    pub fn select_list(&self) -> &str {
        &self.select_list
    }

    pub fn upsert_sql(&self) -> &str {
        &self.upsert
    }

    pub fn create_sql(&self) -> String {
        let stat_columns: Vec<String> = self.columns.iter().map(column_definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\n    \
                server_id TEXT NOT NULL,\n    \
                player_id TEXT NOT NULL,\n    \
                name TEXT NOT NULL DEFAULT '{unknown}',\n    \
                clan TEXT NOT NULL DEFAULT '',\n    \
                {stats},\n    \
                updated_at INTEGER NOT NULL DEFAULT 0,\n    \
                PRIMARY KEY (server_id, player_id)\n\
             );\n\
             CREATE INDEX IF NOT EXISTS idx_{table}_player ON {table} (player_id);",
            table = self.table,
            unknown = UNKNOWN_PLAYER_NAME,
            stats = stat_columns.join(",\n    "),
        )
    }

    /// Create the table if needed and add any registry column it lacks
    ///
    /// Returns the columns that were added.
    pub fn migrate(&self, conn: &Connection) -> StoreResult<Vec<&'static str>> {
        conn.execute_batch(&self.create_sql())?;

        let existing: HashSet<String> = {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", self.table))?;
            let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
            names.collect::<Result<_, _>>()?
        };

        let mut added = Vec::new();
        for column in &self.columns {
            if !existing.contains(column.name) {
                conn.execute_batch(&format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    self.table,
                    column_definition(column)
                ))?;
                log::info!("Added column {}.{}", self.table, column.name);
                added.push(column.name);
            }
        }
        Ok(added)
    }

    /// Positional parameters for [`TableSchema::upsert_sql`]
    pub fn row_params(&self, row: &AggregateRow) -> Vec<SqlValue> {
        let mut params = Vec::with_capacity(self.columns.len() + LEADING_COLUMNS + 1);
        params.push(SqlValue::Text(row.server_id.clone()));
        params.push(SqlValue::Text(row.player_id.clone()));
        params.push(SqlValue::Text(row.name.clone()));
        params.push(SqlValue::Text(row.clan.clone()));
        for column in &self.columns {
            let value = row
                .value(column.name)
                .cloned()
                .unwrap_or_else(|| column.default.to_value())
                .coerce(column.storage);
            params.push(to_sql_value(value));
        }
        params.push(SqlValue::Integer(row.updated_at));
        params
    }

    /// Decode a row selected with [`TableSchema::select_list`]
    ///
    /// Every stat cell is re-typed to its column's storage type, whatever
    /// SQLite actually holds.
    pub fn read_row(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<AggregateRow> {
        let mut values = std::collections::BTreeMap::new();
        for (i, column) in self.columns.iter().enumerate() {
            let raw: SqlValue = row.get(LEADING_COLUMNS + i)?;
            let value = from_sql_value(raw)
                .unwrap_or_else(|| column.default.to_value())
                .coerce(column.storage);
            values.insert(column.name.to_string(), value);
        }

        Ok(AggregateRow {
            server_id: row.get(0)?,
            player_id: row.get(1)?,
            name: row
                .get::<_, Option<String>>(2)?
                .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string()),
            clan: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            values,
            updated_at: row
                .get::<_, Option<i64>>(LEADING_COLUMNS + self.columns.len())?
                .unwrap_or(0),
        })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

fn column_definition(column: &SchemaColumn) -> String {
    format!(
        "{} {} NOT NULL DEFAULT {}",
        quote_ident(column.name),
        column.storage.sql_type(),
        default_literal(&column.default)
    )
}

fn default_literal(default: &DefaultValue) -> String {
    match default {
        DefaultValue::UInt(v) => v.to_string(),
        DefaultValue::Float(v) => format!("{:?}", v),
        DefaultValue::Json(v) => format!("'{}'", v.replace('\'', "''")),
    }
}

fn to_sql_value(value: StatValue) -> SqlValue {
    match value {
        StatValue::UInt(v) => SqlValue::Integer(i64::try_from(v).unwrap_or(i64::MAX)),
        StatValue::Float(v) => SqlValue::Real(v),
        StatValue::Json(v) => SqlValue::Text(v),
    }
}

fn from_sql_value(value: SqlValue) -> Option<StatValue> {
    match value {
        SqlValue::Integer(v) => Some(StatValue::UInt(u64::try_from(v).unwrap_or(0))),
        SqlValue::Real(v) => Some(StatValue::Float(v)),
        SqlValue::Text(v) => Some(StatValue::Json(v)),
        SqlValue::Null | SqlValue::Blob(_) => None,
    }
}

//! SQLite timeframe store
//!
//! One wide table per timeframe, all in the same database file. Every call
//! takes the connection lock on a blocking thread so the async executor is
//! never held by disk I/O.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection};

use super::schema::TableSchema;
use super::{RowQuery, SortOrder, StoreError, StoreResult, TimeframeStore};
use crate::registry::StatRegistry;
use crate::types::{AggregateRow, Timeframe};

/// Player ids bound per `IN (...)` query, well under SQLite's variable limit
const FETCH_CHUNK: usize = 400;

pub struct SqliteStore {
    timeframe: Timeframe,
    registry: Arc<StatRegistry>,
    schema: Arc<TableSchema>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and migrate this timeframe's table
    pub fn open(path: &Path, timeframe: Timeframe, registry: Arc<StatRegistry>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn, timeframe, registry)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory(timeframe: Timeframe, registry: Arc<StatRegistry>) -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, timeframe, registry)
    }

    fn with_connection(conn: Connection, timeframe: Timeframe, registry: Arc<StatRegistry>) -> StoreResult<Self> {
        let schema = TableSchema::new(timeframe, &registry);
        let added = schema.migrate(&conn)?;
        log::info!(
            "Opened {} ({} columns, {} added)",
            schema.table(),
            registry.columns().len(),
            added.len()
        );

        Ok(Self {
            timeframe,
            registry,
            schema: Arc::new(schema),
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection, &TableSchema) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let schema = Arc::clone(&self.schema);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard, &schema)
        })
        .await?
    }
}

fn select_rows(
    conn: &Connection,
    schema: &TableSchema,
    clause: &str,
    params: Vec<rusqlite::types::Value>,
) -> StoreResult<Vec<AggregateRow>> {
    let sql = format!("SELECT {} FROM {} {}", schema.select_list(), schema.table(), clause);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), |row| schema.read_row(row))?;
    Ok(rows.collect::<Result<_, _>>()?)
}

fn to_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl TimeframeStore for SqliteStore {
    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    async fn fetch_rows(&self, server_id: &str, player_ids: &[String]) -> StoreResult<Vec<AggregateRow>> {
        if player_ids.is_empty() {
            return Ok(Vec::new());
        }
        let server_id = server_id.to_string();
        let player_ids = player_ids.to_vec();

        self.run(move |conn, schema| {
            let mut found = Vec::with_capacity(player_ids.len());
            for chunk in player_ids.chunks(FETCH_CHUNK) {
                let placeholders: Vec<String> = (0..chunk.len()).map(|i| format!("?{}", i + 2)).collect();
                let clause = format!(
                    "WHERE server_id = ?1 AND player_id IN ({})",
                    placeholders.join(", ")
                );
                let params = std::iter::once(server_id.clone())
                    .chain(chunk.iter().cloned())
                    .map(rusqlite::types::Value::Text)
                    .collect();
                found.extend(select_rows(conn, schema, &clause, params)?);
            }
            Ok(found)
        })
        .await
    }

    async fn upsert_rows(&self, rows: &[AggregateRow]) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = rows.to_vec();

        self.run(move |conn, schema| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(schema.upsert_sql())?;
                for row in &rows {
                    stmt.execute(params_from_iter(schema.row_params(row)))?;
                }
            }
            tx.commit()?;
            Ok(rows.len())
        })
        .await
    }

    async fn rows_for_player(&self, player_id: &str) -> StoreResult<Vec<AggregateRow>> {
        let player_id = player_id.to_string();
        self.run(move |conn, schema| {
            select_rows(
                conn,
                schema,
                "WHERE player_id = ?1 ORDER BY server_id",
                vec![rusqlite::types::Value::Text(player_id)],
            )
        })
        .await
    }

    async fn query_rows(&self, query: &RowQuery) -> StoreResult<Vec<AggregateRow>> {
        if !self.registry.is_sortable(query.sort) {
            return Err(StoreError::UnknownColumn(query.sort.to_string()));
        }
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let query = query.clone();

        self.run(move |conn, schema| {
            let mut params = Vec::new();
            let mut clause = String::new();
            if let Some(server_id) = query.server_id {
                clause.push_str("WHERE server_id = ? ");
                params.push(rusqlite::types::Value::Text(server_id));
            }
            clause.push_str(&format!(
                "ORDER BY \"{}\" {}, player_id ASC LIMIT ? OFFSET ?",
                query.sort, direction
            ));
            params.push(rusqlite::types::Value::Integer(to_limit(query.limit)));
            params.push(rusqlite::types::Value::Integer(to_limit(query.offset)));
            select_rows(conn, schema, &clause, params)
        })
        .await
    }

    async fn all_rows(&self, server_id: Option<&str>) -> StoreResult<Vec<AggregateRow>> {
        let server_id = server_id.map(str::to_string);
        self.run(move |conn, schema| match server_id {
            Some(server_id) => select_rows(
                conn,
                schema,
                "WHERE server_id = ?1",
                vec![rusqlite::types::Value::Text(server_id)],
            ),
            None => select_rows(conn, schema, "", Vec::new()),
        })
        .await
    }

    async fn clear_all(&self) -> StoreResult<usize> {
        self.run(|conn, schema| Ok(conn.execute(&format!("DELETE FROM {}", schema.table()), [])?))
            .await
    }

    async fn clear_server(&self, server_id: &str) -> StoreResult<usize> {
        let server_id = server_id.to_string();
        self.run(move |conn, schema| {
            Ok(conn.execute(
                &format!("DELETE FROM {} WHERE server_id = ?1", schema.table()),
                [server_id],
            )?)
        })
        .await
    }
}

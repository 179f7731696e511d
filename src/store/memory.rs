//! In-memory timeframe store

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{RowQuery, SortOrder, StoreError, StoreResult, TimeframeStore};
use crate::registry::StatRegistry;
use crate::types::{AggregateRow, StatValue, Timeframe};

type RowKey = (String, String);

/// Rows keyed by (server, player) behind a read-write lock
pub struct MemoryStore {
    timeframe: Timeframe,
    registry: Arc<StatRegistry>,
    rows: RwLock<HashMap<RowKey, AggregateRow>>,
}

impl MemoryStore {
    pub fn new(timeframe: Timeframe, registry: Arc<StatRegistry>) -> Self {
        Self {
            timeframe,
            registry,
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

/// Order two rows by a numeric column, ties broken by player id for stable pages
pub(crate) fn compare_rows(a: &AggregateRow, b: &AggregateRow, column: &str, order: SortOrder) -> Ordering {
    let value = |row: &AggregateRow| row.value(column).map(StatValue::as_f64).unwrap_or(0.0);
    let primary = value(a).partial_cmp(&value(b)).unwrap_or(Ordering::Equal);
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.player_id.cmp(&b.player_id))
}

#[async_trait]
impl TimeframeStore for MemoryStore {
    fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    async fn fetch_rows(&self, server_id: &str, player_ids: &[String]) -> StoreResult<Vec<AggregateRow>> {
        let rows = self.rows.read();
        Ok(player_ids
            .iter()
            .filter_map(|p| rows.get(&(server_id.to_string(), p.clone())).cloned())
            .collect())
    }

    async fn upsert_rows(&self, rows: &[AggregateRow]) -> StoreResult<usize> {
        let mut stored = self.rows.write();
        for row in rows {
            let mut row = row.clone();
            row.fill_defaults(&self.registry);
            stored.insert((row.server_id.clone(), row.player_id.clone()), row);
        }
        Ok(rows.len())
    }

    async fn rows_for_player(&self, player_id: &str) -> StoreResult<Vec<AggregateRow>> {
        let mut found: Vec<AggregateRow> = self
            .rows
            .read()
            .values()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.server_id.cmp(&b.server_id));
        Ok(found)
    }

    async fn query_rows(&self, query: &RowQuery) -> StoreResult<Vec<AggregateRow>> {
        if !self.registry.is_sortable(query.sort) {
            return Err(StoreError::UnknownColumn(query.sort.to_string()));
        }
        let mut rows = self.all_rows(query.server_id.as_deref()).await?;
        rows.sort_by(|a, b| compare_rows(a, b, query.sort, query.order));
        Ok(rows.into_iter().skip(query.offset).take(query.limit).collect())
    }

    async fn all_rows(&self, server_id: Option<&str>) -> StoreResult<Vec<AggregateRow>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|r| server_id.map_or(true, |s| r.server_id == s))
            .cloned()
            .collect())
    }

    async fn clear_all(&self) -> StoreResult<usize> {
        let mut rows = self.rows.write();
        let removed = rows.len();
        rows.clear();
        Ok(removed)
    }

    async fn clear_server(&self, server_id: &str) -> StoreResult<usize> {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|(server, _), _| server != server_id);
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(Timeframe::Overall, Arc::new(StatRegistry::standard().unwrap()))
    }

    fn row(store: &MemoryStore, server: &str, player: &str, kills: u64) -> AggregateRow {
        let mut row = AggregateRow::empty(&store.registry, server, player);
        row.set("kills", StatValue::UInt(kills));
        row
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = store();
        let r = row(&store, "s1", "76561198000000001", 4);

        store.upsert_rows(&[r.clone()]).await.unwrap();
        store.upsert_rows(&[r.clone()]).await.unwrap();

        assert_eq!(store.len(), 1);
        let fetched = store.fetch_rows("s1", &[r.player_id.clone()]).await.unwrap();
        assert_eq!(fetched, vec![r]);
    }

    #[tokio::test]
    async fn test_clear_server_only_touches_that_server() {
        let store = store();
        store
            .upsert_rows(&[
                row(&store, "s1", "76561198000000001", 1),
                row(&store, "s2", "76561198000000001", 2),
            ])
            .await
            .unwrap();

        assert_eq!(store.clear_server("s1").await.unwrap(), 1);
        assert!(store.fetch_rows("s1", &["76561198000000001".to_string()]).await.unwrap().is_empty());
        assert_eq!(store.rows_for_player("76561198000000001").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_orders_and_paginates() {
        let store = store();
        store
            .upsert_rows(&[
                row(&store, "s1", "76561198000000001", 1),
                row(&store, "s1", "76561198000000002", 9),
                row(&store, "s1", "76561198000000003", 5),
            ])
            .await
            .unwrap();

        let query = RowQuery {
            server_id: Some("s1".to_string()),
            sort: "kills",
            order: SortOrder::Desc,
            limit: 2,
            offset: 0,
        };
        let rows = store.query_rows(&query).await.unwrap();
        let kills: Vec<u64> = rows.iter().map(|r| r.uint("kills")).collect();
        assert_eq!(kills, vec![9, 5]);

        let rows = store
            .query_rows(&RowQuery { offset: 2, ..query })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].uint("kills"), 1);
    }

    #[tokio::test]
    async fn test_query_rejects_unsortable_column() {
        let store = store();
        store
            .upsert_rows(&[row(&store, "s1", "76561198000000001", 1)])
            .await
            .unwrap();

        for sort in ["weapon_kills", "no_such_column"] {
            let query = RowQuery {
                server_id: None,
                sort,
                order: SortOrder::Desc,
                limit: 10,
                offset: 0,
            };
            assert!(matches!(
                store.query_rows(&query).await,
                Err(StoreError::UnknownColumn(c)) if c == sort
            ));
        }
    }
}

//! Timeframe stores
//!
//! Each timeframe ledger is an independent sink behind [`TimeframeStore`].
//! The engine never coordinates writes across stores: every store is its own
//! atomic unit and can fail without affecting the others.
//!
//! Backends:
//! - `MemoryStore`: `HashMap` behind a `parking_lot::RwLock`, for tests and
//!   throwaway deployments
//! - `SqliteStore`: one wide table per timeframe, columns generated from the
//!   stat registry

mod memory;
mod schema;
mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::registry::StatRegistry;
use crate::types::{AggregateRow, Timeframe};

pub use memory::MemoryStore;
pub use schema::TableSchema;
pub use sqlite::SqliteStore;

/// Errors raised by a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown sort column '{0}'")]
    UnknownColumn(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Ordered, paginated read of one timeframe
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    /// Restrict to one server, or every server when `None`
    pub server_id: Option<String>,
    /// A sortable registry column
    pub sort: &'static str,
    pub order: SortOrder,
    pub limit: usize,
    pub offset: usize,
}

/// One rolling aggregate ledger
#[async_trait]
pub trait TimeframeStore: Send + Sync {
    /// The ledger this store holds
    fn timeframe(&self) -> Timeframe;

    /// Current rows for `player_ids` on `server_id`; players without a row are omitted
    async fn fetch_rows(&self, server_id: &str, player_ids: &[String]) -> StoreResult<Vec<AggregateRow>>;

    /// Insert-or-replace by (server, player), as one atomic unit
    async fn upsert_rows(&self, rows: &[AggregateRow]) -> StoreResult<usize>;

    /// Rows of one player across every server
    async fn rows_for_player(&self, player_id: &str) -> StoreResult<Vec<AggregateRow>>;

    /// Sorted page of rows; `UnknownColumn` when `query.sort` is not sortable
    async fn query_rows(&self, query: &RowQuery) -> StoreResult<Vec<AggregateRow>>;

    /// Every row of one server, or of all servers when `None`
    async fn all_rows(&self, server_id: Option<&str>) -> StoreResult<Vec<AggregateRow>>;

    /// Delete every row; returns the number removed
    async fn clear_all(&self) -> StoreResult<usize>;

    /// Delete one server's rows; returns the number removed
    async fn clear_server(&self, server_id: &str) -> StoreResult<usize>;
}

/// The fixed set of timeframe sinks a deployment writes to
#[derive(Clone)]
pub struct TimeframeStores {
    stores: Vec<Arc<dyn TimeframeStore>>,
}

impl TimeframeStores {
    pub fn new(stores: Vec<Arc<dyn TimeframeStore>>) -> Self {
        Self { stores }
    }

    /// One in-memory store per timeframe
    pub fn in_memory(registry: Arc<StatRegistry>) -> Self {
        let stores = Timeframe::ALL
            .iter()
            .map(|&tf| Arc::new(MemoryStore::new(tf, registry.clone())) as Arc<dyn TimeframeStore>)
            .collect();
        Self { stores }
    }

    /// One SQLite table per timeframe in the database at `path`
    pub fn sqlite<P: AsRef<Path>>(path: P, registry: Arc<StatRegistry>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut stores: Vec<Arc<dyn TimeframeStore>> = Vec::with_capacity(Timeframe::ALL.len());
        for &tf in Timeframe::ALL.iter() {
            stores.push(Arc::new(SqliteStore::open(path, tf, registry.clone())?));
        }
        Ok(Self { stores })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TimeframeStore>> {
        self.stores.iter()
    }

    pub fn get(&self, timeframe: Timeframe) -> Option<&Arc<dyn TimeframeStore>> {
        self.stores.iter().find(|s| s.timeframe() == timeframe)
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

//! Concurrent reads and writes across the timeframe stores
//!
//! Both directions wait for every store and capture each outcome on its own.
//! A failed fetch degrades to an empty baseline for that timeframe; a failed
//! write marks that timeframe only.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::store::{StoreResult, TimeframeStore, TimeframeStores};
use crate::types::{AggregateRow, Timeframe};

/// Current rows of one timeframe, keyed by player id
pub struct Baseline {
    pub store: Arc<dyn TimeframeStore>,
    pub rows: HashMap<String, AggregateRow>,
    /// The read failed and `rows` is empty as a fallback
    pub degraded: bool,
}

/// Result of one timeframe's upsert
#[derive(Debug)]
pub struct WriteOutcome {
    pub timeframe: Timeframe,
    pub result: StoreResult<usize>,
}

impl WriteOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Bulk-read the rows of `player_ids` on `server_id` from every store at once
pub async fn fetch_baselines(
    stores: &TimeframeStores,
    server_id: &str,
    player_ids: &[String],
) -> Vec<Baseline> {
    let reads = stores.iter().map(|store| async move {
        let result = store.fetch_rows(server_id, player_ids).await;
        (Arc::clone(store), result)
    });

    join_all(reads)
        .await
        .into_iter()
        .map(|(store, result)| match result {
            Ok(rows) => Baseline {
                store,
                rows: rows.into_iter().map(|r| (r.player_id.clone(), r)).collect(),
                degraded: false,
            },
            Err(e) => {
                log::error!(
                    "Failed to read {} for server {}: {}",
                    store.timeframe().table_name(),
                    server_id,
                    e
                );
                Baseline {
                    store,
                    rows: HashMap::new(),
                    degraded: true,
                }
            }
        })
        .collect()
}

/// Upsert each store's rows concurrently; one outcome per store, in input order
pub async fn write_all(writes: Vec<(Arc<dyn TimeframeStore>, Vec<AggregateRow>)>, server_id: &str) -> Vec<WriteOutcome> {
    let upserts = writes.into_iter().map(|(store, rows)| async move {
        let result = store.upsert_rows(&rows).await;
        if let Err(e) = &result {
            log::error!(
                "Failed to write {} rows to {} for server {}: {}",
                rows.len(),
                store.timeframe().table_name(),
                server_id,
                e
            );
        }
        WriteOutcome {
            timeframe: store.timeframe(),
            result,
        }
    });

    join_all(upserts).await
}

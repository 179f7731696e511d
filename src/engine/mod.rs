//! Ingestion pipeline
//!
//! ```text
//! body ─▶ validate ─▶ accumulate ─▶ fetch baselines ─▶ merge ─▶ write
//!                                   (every timeframe,        (every timeframe,
//!                                    concurrently)            concurrently)
//! ```
//!
//! Validation, accumulation and merging are synchronous and pure; the two
//! store fan-outs are the only await points.

pub mod accumulator;
pub mod fanout;
pub mod merge;

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::registry::StatRegistry;
use crate::store::TimeframeStores;
use crate::types::Timeframe;
use crate::utils::current_timestamp;
use crate::validation::{is_valid_server_id, EventLimits, EventValidator, ValidationCode, ValidationError};

pub use accumulator::accumulate;
pub use fanout::{fetch_baselines, write_all, Baseline, WriteOutcome};
pub use merge::{derive_fields, merge_row, merge_timeframe, ratio};

/// Keyword that selects the global monthly reset instead of a server id
pub const MONTHLY_RESET: &str = "monthly";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No timeframe could be written (failed: {})", join_timeframes(.failed))]
    StorageUnavailable { failed: Vec<Timeframe> },
}

fn join_timeframes(timeframes: &[Timeframe]) -> String {
    timeframes.iter().map(Timeframe::as_str).collect::<Vec<_>>().join(", ")
}

/// Summary of one ingested batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Events that passed validation
    pub processed: usize,
    /// Distinct players touched
    pub players: usize,
    /// Events dropped by validation
    pub rejected: usize,
    pub timeframes_written: Vec<Timeframe>,
    pub timeframes_failed: Vec<Timeframe>,
    /// Written over an empty baseline because the read failed
    pub timeframes_degraded: Vec<Timeframe>,
}

/// What a reset clears
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetTarget {
    /// Monthly and wipe ledgers of every server
    Monthly,
    /// Wipe ledger of one server
    Server(String),
}

impl ResetTarget {
    pub fn parse(target: &str) -> Result<Self, ValidationError> {
        let target = target.trim();
        if target.eq_ignore_ascii_case(MONTHLY_RESET) {
            Ok(ResetTarget::Monthly)
        } else if is_valid_server_id(target) {
            Ok(ResetTarget::Server(target.to_string()))
        } else {
            Err(ValidationError::new(
                ValidationCode::InvalidTarget,
                "Reset target must be 'monthly' or a server id",
            ))
        }
    }

    /// Timeframes this target clears; overall is never among them
    pub fn timeframes(&self) -> &'static [Timeframe] {
        match self {
            ResetTarget::Monthly => &[Timeframe::Monthly, Timeframe::Wipe],
            ResetTarget::Server(_) => &[Timeframe::Wipe],
        }
    }
}

/// Rows deleted per timeframe by a reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub target: String,
    pub cleared: BTreeMap<&'static str, usize>,
}

/// Runs the ingestion pipeline against a fixed set of timeframe stores
pub struct IngestEngine {
    registry: Arc<StatRegistry>,
    validator: EventValidator,
    stores: TimeframeStores,
}

impl IngestEngine {
    pub fn new(registry: Arc<StatRegistry>, stores: TimeframeStores, limits: EventLimits) -> Self {
        let validator = EventValidator::new(Arc::clone(&registry), limits);
        Self {
            registry,
            validator,
            stores,
        }
    }

    pub fn registry(&self) -> &Arc<StatRegistry> {
        &self.registry
    }

    pub fn stores(&self) -> &TimeframeStores {
        &self.stores
    }

    pub async fn ingest(&self, server_id: &str, body: &Value) -> Result<IngestReport, IngestError> {
        self.ingest_at(server_id, body, current_timestamp()).await
    }

    /// Ingest one batch with an explicit `updated_at` timestamp
    pub async fn ingest_at(&self, server_id: &str, body: &Value, now: i64) -> Result<IngestReport, IngestError> {
        if !is_valid_server_id(server_id) {
            return Err(ValidationError::new(
                ValidationCode::InvalidServerId,
                "Server id must be 1-64 characters of letters, digits, '_', '-' or '.'",
            )
            .into());
        }

        let batch = self.validator.validate_batch(body)?;
        let deltas = accumulate(&self.registry, &batch.events);
        let player_ids: Vec<String> = deltas.keys().cloned().collect();

        let baselines = fetch_baselines(&self.stores, server_id, &player_ids).await;
        let timeframes_degraded: Vec<Timeframe> = baselines
            .iter()
            .filter(|b| b.degraded)
            .map(|b| b.store.timeframe())
            .collect();
        let writes = baselines
            .into_iter()
            .map(|baseline| {
                let rows = merge_timeframe(&self.registry, server_id, &baseline.rows, &deltas, now);
                (baseline.store, rows)
            })
            .collect();
        let outcomes = write_all(writes, server_id).await;

        let (written, failed): (Vec<_>, Vec<_>) = outcomes.iter().partition(|o| o.is_ok());
        let timeframes_written: Vec<Timeframe> = written.iter().map(|o| o.timeframe).collect();
        let timeframes_failed: Vec<Timeframe> = failed.iter().map(|o| o.timeframe).collect();

        if timeframes_written.is_empty() {
            return Err(IngestError::StorageUnavailable {
                failed: timeframes_failed,
            });
        }

        log::info!(
            "Ingested {} events for {} players on {} ({} rejected, written: {})",
            batch.events.len(),
            deltas.len(),
            server_id,
            batch.rejected(),
            join_timeframes(&timeframes_written)
        );
        if !timeframes_degraded.is_empty() {
            log::warn!(
                "Rows on {} were rebuilt without a baseline for: {}",
                server_id,
                join_timeframes(&timeframes_degraded)
            );
        }

        Ok(IngestReport {
            processed: batch.events.len(),
            players: deltas.len(),
            rejected: batch.rejected(),
            timeframes_written,
            timeframes_failed,
            timeframes_degraded,
        })
    }

    /// Clear the ledgers selected by `target`
    ///
    /// Each timeframe is cleared on its own; if any of them fails the reset
    /// reports every failed timeframe, the others stay cleared.
    pub async fn reset(&self, target: &ResetTarget) -> Result<ResetReport, IngestError> {
        let clears = target.timeframes().iter().filter_map(|&tf| {
            let store = self.stores.get(tf)?;
            Some(async move {
                let result = match target {
                    ResetTarget::Monthly => store.clear_all().await,
                    ResetTarget::Server(server_id) => store.clear_server(server_id).await,
                };
                (tf, result)
            })
        });

        let mut report = ResetReport {
            target: match target {
                ResetTarget::Monthly => MONTHLY_RESET.to_string(),
                ResetTarget::Server(server_id) => server_id.clone(),
            },
            cleared: BTreeMap::new(),
        };
        let mut failed = Vec::new();
        for (tf, result) in join_all(clears).await {
            match result {
                Ok(removed) => {
                    report.cleared.insert(tf.as_str(), removed);
                }
                Err(e) => {
                    log::error!("Failed to reset {} for {}: {}", tf.table_name(), report.target, e);
                    failed.push(tf);
                }
            }
        }

        if !failed.is_empty() {
            return Err(IngestError::StorageUnavailable { failed });
        }
        log::info!("Reset {}: {:?}", report.target, report.cleared);
        Ok(report)
    }
}

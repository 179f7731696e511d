//! Kit Stats Engine
//!
//! Player-stat ingestion and multi-timeframe aggregation for a game-server
//! network. Plugins post batches of events; every batch is validated,
//! folded into per-player deltas and merged into three independent ledgers
//! (wipe, monthly, overall).
//!
//! # Modules
//!
//! - `registry`: The stat column table every other module is driven by
//! - `validation`: Event batch and identifier validation
//! - `engine`: Accumulate, merge and fan out writes across timeframes
//! - `store`: `TimeframeStore` trait with in-memory and SQLite backends
//! - `query`: Player views, leaderboards and clan roll-ups
//! - `api`: Axum router, JWT auth and the response envelope
//! - `config`: Environment configuration
//! - `types`: Events, deltas, rows and timeframes
//! - `utils`: Timestamps and duration formatting
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kit_stats::{IngestEngine, StatRegistry, TimeframeStores};
//! use kit_stats::validation::EventLimits;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(StatRegistry::standard()?);
//! let stores = TimeframeStores::sqlite("data/stats.db", registry.clone())?;
//! let engine = IngestEngine::new(registry, stores, EventLimits::default());
//!
//! let body = serde_json::json!([{ "steamId": "76561198000000000", "_event": "kill" }]);
//! let report = engine.ingest("eu-main", &body).await?;
//! assert_eq!(report.processed, 1);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod query;
pub mod registry;
pub mod store;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export commonly used items at crate root
pub use config::{ConfigError, ServerConfig, StoreBackend};
pub use engine::{IngestEngine, IngestError, IngestReport, ResetReport, ResetTarget};
pub use registry::{StatColumnDescriptor, StatRegistry, STANDARD_COLUMNS};
pub use store::{MemoryStore, SqliteStore, StoreError, TimeframeStore, TimeframeStores};
pub use types::{AggregateRow, PlayerDelta, StatEvent, StatValue, Timeframe};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

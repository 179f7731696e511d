//! Integration tests for the ingestion pipeline and timeframe stores

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use kit_stats::engine::merge::parse_weapon_map;
use kit_stats::store::{RowQuery, StoreResult};
use kit_stats::validation::{EventLimits, ValidationCode};
use kit_stats::{
    AggregateRow, IngestEngine, IngestError, MemoryStore, ResetTarget, StatRegistry, StoreError, Timeframe,
    TimeframeStore, TimeframeStores,
};

const SERVER: &str = "eu-main";
const P1: &str = "76561198000000001";
const P2: &str = "76561198000000002";
const NOW: i64 = 1_700_000_000;

fn registry() -> Arc<StatRegistry> {
    Arc::new(StatRegistry::standard().unwrap())
}

fn memory_engine() -> IngestEngine {
    let registry = registry();
    let stores = TimeframeStores::in_memory(registry.clone());
    IngestEngine::new(registry, stores, EventLimits::default())
}

async fn row(engine: &IngestEngine, timeframe: Timeframe, server: &str, player: &str) -> Option<AggregateRow> {
    let store = engine.stores().get(timeframe).unwrap();
    store.fetch_rows(server, &[player.to_string()]).await.unwrap().into_iter().next()
}

/// Store wrapper whose reads and/or writes fail on demand
struct FailingStore {
    inner: MemoryStore,
    fail_fetch: AtomicBool,
    fail_write: AtomicBool,
}

impl FailingStore {
    fn new(timeframe: Timeframe, registry: Arc<StatRegistry>) -> Self {
        Self {
            inner: MemoryStore::new(timeframe, registry),
            fail_fetch: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
        }
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TimeframeStore for FailingStore {
    fn timeframe(&self) -> Timeframe {
        self.inner.timeframe()
    }

    async fn fetch_rows(&self, server_id: &str, player_ids: &[String]) -> StoreResult<Vec<AggregateRow>> {
        Self::check(&self.fail_fetch)?;
        self.inner.fetch_rows(server_id, player_ids).await
    }

    async fn upsert_rows(&self, rows: &[AggregateRow]) -> StoreResult<usize> {
        Self::check(&self.fail_write)?;
        self.inner.upsert_rows(rows).await
    }

    async fn rows_for_player(&self, player_id: &str) -> StoreResult<Vec<AggregateRow>> {
        self.inner.rows_for_player(player_id).await
    }

    async fn query_rows(&self, query: &RowQuery) -> StoreResult<Vec<AggregateRow>> {
        self.inner.query_rows(query).await
    }

    async fn all_rows(&self, server_id: Option<&str>) -> StoreResult<Vec<AggregateRow>> {
        self.inner.all_rows(server_id).await
    }

    async fn clear_all(&self) -> StoreResult<usize> {
        self.inner.clear_all().await
    }

    async fn clear_server(&self, server_id: &str) -> StoreResult<usize> {
        self.inner.clear_server(server_id).await
    }
}

/// Engine over three failing-capable stores, returned alongside the stores
fn failing_engine() -> (IngestEngine, Vec<Arc<FailingStore>>) {
    let registry = registry();
    let stores: Vec<Arc<FailingStore>> = Timeframe::ALL
        .iter()
        .map(|&tf| Arc::new(FailingStore::new(tf, registry.clone())))
        .collect();
    let dyn_stores = stores
        .iter()
        .map(|s| s.clone() as Arc<dyn TimeframeStore>)
        .collect();
    let engine = IngestEngine::new(registry, TimeframeStores::new(dyn_stores), EventLimits::default());
    (engine, stores)
}

#[tokio::test]
async fn test_kill_and_death_land_in_every_timeframe() {
    let engine = memory_engine();
    let body = json!([
        { "steamId": P1, "_event": "kill", "weapon": "rifle.ak", "playerName": "Alpha" },
        { "steamId": P1, "_event": "death" },
    ]);

    let report = engine.ingest_at(SERVER, &body, NOW).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.players, 1);
    assert_eq!(report.rejected, 0);
    assert_eq!(report.timeframes_written, Timeframe::ALL.to_vec());

    for tf in Timeframe::ALL {
        let row = row(&engine, tf, SERVER, P1).await.unwrap();
        assert_eq!(row.uint("kills"), 1, "{}", tf);
        assert_eq!(row.uint("deaths"), 1);
        assert_eq!(row.float("kdr"), 1.0);
        assert_eq!(row.uint("points"), 1);
        assert_eq!(row.name, "Alpha");
        assert_eq!(row.updated_at, NOW);
        assert_eq!(parse_weapon_map(row.value("weapon_kills")).get("rifle.ak"), Some(&1));
    }
}

#[tokio::test]
async fn test_batches_accumulate_across_requests() {
    let engine = memory_engine();
    engine
        .ingest_at(SERVER, &json!([{ "steamId": P1, "_event": "kill", "amount": 5 }]), NOW)
        .await
        .unwrap();
    engine
        .ingest_at(
            SERVER,
            &json!({ "events": [
                { "steamId": P1, "_event": "kill", "amount": 2 },
                { "steamId": P1, "_event": "death", "amount": 2 },
                { "steamId": P1, "_event": "tc_destroyed", "amount": 1 },
            ]}),
            NOW + 60,
        )
        .await
        .unwrap();

    let row = row(&engine, Timeframe::Overall, SERVER, P1).await.unwrap();
    assert_eq!(row.uint("kills"), 7);
    assert_eq!(row.uint("deaths"), 2);
    assert_eq!(row.float("kdr"), 3.5);
    assert_eq!(row.uint("points"), 12);
    assert_eq!(row.updated_at, NOW + 60);
}

#[tokio::test]
async fn test_mixed_case_keys_are_normalized() {
    let engine = memory_engine();
    let body = json!([{ "SteamId": P1, "_Event": "KILL", "Amount": 3, "PlayerName": "Alpha", "ClanTag": "ICE" }]);

    let report = engine.ingest_at(SERVER, &body, NOW).await.unwrap();
    assert_eq!(report.processed, 1);

    let row = row(&engine, Timeframe::Wipe, SERVER, P1).await.unwrap();
    assert_eq!(row.uint("kills"), 3);
    assert_eq!(row.clan, "ICE");
}

#[tokio::test]
async fn test_partial_batch_drops_invalid_events() {
    let engine = memory_engine();
    let body = json!([
        { "steamId": P1, "_event": "kill" },
        { "steamId": "123", "_event": "kill" },
        { "steamId": P2, "_event": "teleport" },
        { "steamId": P2, "_event": "death", "amount": -1 },
        "not an object",
        { "steamId": P2, "_event": "headshot" },
    ]);

    let report = engine.ingest_at(SERVER, &body, NOW).await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(report.players, 2);
    assert_eq!(report.rejected, 4);
}

#[tokio::test]
async fn test_batch_level_failures() {
    let engine = memory_engine();
    let code = |e: IngestError| match e {
        IngestError::Validation(v) => v.code,
        other => panic!("unexpected {:?}", other),
    };

    let err = engine.ingest_at(SERVER, &json!({ "kills": 1 }), NOW).await.unwrap_err();
    assert_eq!(code(err), ValidationCode::InvalidBody);

    let err = engine.ingest_at(SERVER, &json!([]), NOW).await.unwrap_err();
    assert_eq!(code(err), ValidationCode::NoValidEvents);

    let err = engine
        .ingest_at(SERVER, &json!([{ "steamId": "1", "_event": "kill" }]), NOW)
        .await
        .unwrap_err();
    assert_eq!(code(err), ValidationCode::NoValidEvents);

    let err = engine
        .ingest_at("bad server!", &json!([{ "steamId": P1, "_event": "kill" }]), NOW)
        .await
        .unwrap_err();
    assert_eq!(code(err), ValidationCode::InvalidServerId);

    let oversized: Vec<_> = (0..501).map(|_| json!({ "steamId": P1, "_event": "kill" })).collect();
    let err = engine.ingest_at(SERVER, &json!(oversized), NOW).await.unwrap_err();
    assert_eq!(code(err), ValidationCode::BatchTooLarge);
}

#[tokio::test]
async fn test_replayed_batch_rewrites_same_row() {
    let engine = memory_engine();
    let body = json!([{ "steamId": P1, "_event": "kill" }]);
    engine.ingest_at(SERVER, &body, NOW).await.unwrap();
    engine.ingest_at(SERVER, &body, NOW).await.unwrap();

    let store = engine.stores().get(Timeframe::Overall).unwrap();
    assert_eq!(store.all_rows(None).await.unwrap().len(), 1);
    assert_eq!(row(&engine, Timeframe::Overall, SERVER, P1).await.unwrap().uint("kills"), 2);
}

#[tokio::test]
async fn test_reset_scoping() {
    let engine = memory_engine();
    let kill = json!([{ "steamId": P1, "_event": "kill" }]);
    engine.ingest_at("s1", &kill, NOW).await.unwrap();
    engine.ingest_at("s2", &kill, NOW).await.unwrap();

    let report = engine.reset(&ResetTarget::parse("s1").unwrap()).await.unwrap();
    assert_eq!(report.cleared.get("wipe"), Some(&1));
    assert!(row(&engine, Timeframe::Wipe, "s1", P1).await.is_none());
    assert!(row(&engine, Timeframe::Wipe, "s2", P1).await.is_some());
    assert!(row(&engine, Timeframe::Monthly, "s1", P1).await.is_some());

    // Wipe and monthly start fresh, overall keeps counting
    engine.reset(&ResetTarget::Monthly).await.unwrap();
    engine.ingest_at("s1", &kill, NOW).await.unwrap();
    assert_eq!(row(&engine, Timeframe::Wipe, "s1", P1).await.unwrap().uint("kills"), 1);
    assert_eq!(row(&engine, Timeframe::Monthly, "s1", P1).await.unwrap().uint("kills"), 1);
    assert_eq!(row(&engine, Timeframe::Overall, "s1", P1).await.unwrap().uint("kills"), 2);
    assert!(row(&engine, Timeframe::Wipe, "s2", P1).await.is_none());

    assert!(ResetTarget::parse("not a server!").is_err());
}

#[tokio::test]
async fn test_failed_fetch_degrades_to_empty_baseline() {
    let (engine, stores) = failing_engine();
    let kill = json!([{ "steamId": P1, "_event": "kill" }]);
    engine.ingest_at(SERVER, &kill, NOW).await.unwrap();

    stores[1].fail_fetch.store(true, Ordering::SeqCst);
    let report = engine.ingest_at(SERVER, &kill, NOW).await.unwrap();
    assert_eq!(report.timeframes_written.len(), 3);
    assert_eq!(report.timeframes_degraded, vec![Timeframe::Monthly]);

    assert_eq!(row(&engine, Timeframe::Wipe, SERVER, P1).await.unwrap().uint("kills"), 2);
    stores[1].fail_fetch.store(false, Ordering::SeqCst);
    // Monthly was rebuilt from an empty baseline
    assert_eq!(row(&engine, Timeframe::Monthly, SERVER, P1).await.unwrap().uint("kills"), 1);
}

#[tokio::test]
async fn test_failed_write_is_isolated() {
    let (engine, stores) = failing_engine();
    stores[0].fail_write.store(true, Ordering::SeqCst);

    let report = engine
        .ingest_at(SERVER, &json!([{ "steamId": P1, "_event": "kill" }]), NOW)
        .await
        .unwrap();
    assert_eq!(report.timeframes_failed, vec![Timeframe::Wipe]);
    assert!(report.timeframes_degraded.is_empty());
    assert_eq!(report.timeframes_written, vec![Timeframe::Monthly, Timeframe::Overall]);
    assert!(row(&engine, Timeframe::Wipe, SERVER, P1).await.is_none());
    assert!(row(&engine, Timeframe::Overall, SERVER, P1).await.is_some());

    for store in &stores {
        store.fail_write.store(true, Ordering::SeqCst);
    }
    let err = engine
        .ingest_at(SERVER, &json!([{ "steamId": P1, "_event": "kill" }]), NOW)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::StorageUnavailable { failed } if failed.len() == 3));
}

#[tokio::test]
async fn test_sqlite_backend_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("stats.db");
    let registry = registry();

    {
        let stores = TimeframeStores::sqlite(&path, registry.clone()).unwrap();
        let engine = IngestEngine::new(registry.clone(), stores, EventLimits::default());
        let body = json!([
            { "steamId": P1, "_event": "kill", "weapon": "rifle.ak", "amount": "4" },
            { "steamId": P1, "_event": "playtime", "amount": 3600.9 },
            { "steamId": P2, "_event": "death", "clanTag": "ICE" },
        ]);
        let report = engine.ingest_at(SERVER, &body, NOW).await.unwrap();
        assert_eq!(report.processed, 3);
    }

    // Reopen: rows survive the process
    let stores = TimeframeStores::sqlite(&path, registry.clone()).unwrap();
    let engine = IngestEngine::new(registry, stores, EventLimits::default());
    engine
        .ingest_at(SERVER, &json!([{ "steamId": P1, "_event": "kill", "weapon": "rifle.ak" }]), NOW + 1)
        .await
        .unwrap();

    let p1 = row(&engine, Timeframe::Overall, SERVER, P1).await.unwrap();
    assert_eq!(p1.uint("kills"), 5);
    assert_eq!(p1.uint("playtime"), 3600);
    assert_eq!(p1.float("kdr"), 5.0);
    assert_eq!(parse_weapon_map(p1.value("weapon_kills")).get("rifle.ak"), Some(&5));

    let p2 = row(&engine, Timeframe::Overall, SERVER, P2).await.unwrap();
    assert_eq!(p2.uint("deaths"), 1);
    assert_eq!(p2.float("kdr"), 0.0);
    assert_eq!(p2.clan, "ICE");
}

#![allow(dead_code)]

use std::sync::Arc;

use fraud_scoring_engine::engine::ScoringEngine;
use fraud_scoring_engine::error::{EngineError, Result};
use fraud_scoring_engine::geo::GeoIndex;
use fraud_scoring_engine::ledger::{InMemoryLedger, TransactionLedger};
use fraud_scoring_engine::models::{CardLookupRecord, LedgerEntry, TransactionEvent};
use fraud_scoring_engine::store::{CardLookupStore, InMemoryCardLookupStore};

/// Reference rows: 10002 is ~100 km north of 10001, 10003 ~10 km north
pub const GEO_CSV: &str = "\
10001,40.0,-74.0,Newark,NJ,1001
10002,40.9,-74.0,Paterson,NJ,1002
10003,40.09,-74.0,Clifton,NJ,1003
90001,34.05,-118.24,Los Angeles,CA,9001
";

pub const CARD: u64 = 348702330256514;

pub fn geo_index() -> Arc<GeoIndex> {
    Arc::new(GeoIndex::from_reader(GEO_CSV.as_bytes(), "fixture").unwrap())
}

pub fn baseline(card_id: u64, score: i32, spend_limit: f64, postcode: u32, dt: &str) -> CardLookupRecord {
    CardLookupRecord {
        card_id,
        spend_limit,
        risk_score: score,
        postcode,
        last_transaction_dt: dt.to_string(),
    }
}

pub fn event(card_id: u64, amount: f64, postcode: u32, dt: &str) -> TransactionEvent {
    TransactionEvent {
        card_id,
        member_id: 37495066290,
        amount,
        pos_id: 248063406800722,
        postcode,
        transaction_dt: dt.to_string(),
    }
}

pub fn seeded_store(records: &[CardLookupRecord]) -> Arc<InMemoryCardLookupStore> {
    let store = InMemoryCardLookupStore::new();
    for record in records {
        store.upsert(record.clone()).unwrap();
    }
    Arc::new(store)
}

pub fn engine_with(
    records: &[CardLookupRecord],
) -> (
    ScoringEngine<InMemoryCardLookupStore, InMemoryLedger>,
    Arc<InMemoryCardLookupStore>,
    Arc<InMemoryLedger>,
) {
    let store = seeded_store(records);
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = ScoringEngine::new(geo_index(), Arc::clone(&store), Arc::clone(&ledger));
    (engine, store, ledger)
}

/// Store whose reads and writes always fail
pub struct UnavailableStore;

impl CardLookupStore for UnavailableStore {
    fn get(&self, _card_id: u64) -> Result<Option<CardLookupRecord>> {
        Err(EngineError::StoreUnavailable("connection refused".into()))
    }

    fn put(&self, _card_id: u64, _postcode: u32, _transaction_dt: &str) -> Result<()> {
        Err(EngineError::StoreUnavailable("connection refused".into()))
    }
}

/// Store that reads from a seeded map but fails every write
pub struct ReadOnlyStore(pub InMemoryCardLookupStore);

impl CardLookupStore for ReadOnlyStore {
    fn get(&self, card_id: u64) -> Result<Option<CardLookupRecord>> {
        self.0.get(card_id)
    }

    fn put(&self, _card_id: u64, _postcode: u32, _transaction_dt: &str) -> Result<()> {
        Err(EngineError::StoreUnavailable("write timeout".into()))
    }
}

/// Ledger that rejects every append
pub struct BrokenLedger;

impl TransactionLedger for BrokenLedger {
    fn append(&self, _entry: &LedgerEntry) -> Result<()> {
        Err(EngineError::StoreUnavailable("ledger table offline".into()))
    }
}

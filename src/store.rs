use std::collections::HashMap;
use std::io::Read;
use std::sync::RwLock;

use log::info;

use crate::error::{EngineError, Result};
use crate::models::CardLookupRecord;

/// Key-value access to per-card baselines
///
/// The scoring engine only ever calls `get` and `put`. Both are expected to be
/// bounded by the client's own timeout; the engine adds none of its own.
///
/// # Contract
///
/// - `get` returns `Ok(None)` when the card has never been seen. An `Err` is
///   treated as indeterminate and handled exactly like `Ok(None)`.
/// - `put` overwrites postcode and timestamp only. Spend limit and risk score
///   are external inputs and must survive every `put` untouched. A `put` for
///   a card with no record fails with `EngineError::UnknownCard`.
pub trait CardLookupStore: Send + Sync {
    fn get(&self, card_id: u64) -> Result<Option<CardLookupRecord>>;

    fn put(&self, card_id: u64, postcode: u32, transaction_dt: &str) -> Result<()>;
}

/// Process-local baseline store
///
/// Stands in for the remote key-value service. Baselines are seeded from the
/// external scoring feed (`upsert` / `load_csv`) and then refreshed by the
/// engine through `put`.
#[derive(Debug, Default)]
pub struct InMemoryCardLookupStore {
    records: RwLock<HashMap<u64, CardLookupRecord>>,
}

impl InMemoryCardLookupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed baselines from CSV with header
    /// `card_id,spend_limit,score,postcode,transaction_dt`
    pub fn load_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let store = Self::new();
        for result in csv_reader.deserialize::<CardLookupRecord>() {
            store.upsert(result?)?;
        }

        info!("Seeded {} card baselines", store.len());
        Ok(store)
    }

    /// Replace the whole record for a card
    pub fn upsert(&self, record: CardLookupRecord) -> Result<()> {
        if record.risk_score < 0 {
            return Err(EngineError::BaselineRecord {
                card_id: record.card_id,
                message: format!("negative risk score {}", record.risk_score),
            });
        }

        let mut records = self.write_lock()?;
        records.insert(record.card_id, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_lock(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<u64, CardLookupRecord>>> {
        self.records
            .write()
            .map_err(|_| EngineError::StoreUnavailable("baseline store lock poisoned".into()))
    }
}

impl CardLookupStore for InMemoryCardLookupStore {
    fn get(&self, card_id: u64) -> Result<Option<CardLookupRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| EngineError::StoreUnavailable("baseline store lock poisoned".into()))?;
        Ok(records.get(&card_id).cloned())
    }

    fn put(&self, card_id: u64, postcode: u32, transaction_dt: &str) -> Result<()> {
        let mut records = self.write_lock()?;

        // Without a seeded score and limit there is nothing to refresh
        let record = records
            .get_mut(&card_id)
            .ok_or(EngineError::UnknownCard { card_id })?;
        record.postcode = postcode;
        record.last_transaction_dt = transaction_dt.to_string();

        Ok(())
    }
}

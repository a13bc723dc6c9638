use std::collections::HashSet;
use std::io::Write;
use std::sync::Mutex;

use crate::error::{EngineError, Result};
use crate::models::LedgerEntry;

/// Append-only record of every scored transaction
///
/// Each call writes one row under the entry's own id and must never replace
/// an existing row. Failures are reported to the caller, who logs and moves on.
pub trait TransactionLedger: Send + Sync {
    fn append(&self, entry: &LedgerEntry) -> Result<()>;
}

/// Ledger kept in memory, in append order
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: Mutex<LedgerRows>,
}

#[derive(Debug, Default)]
struct LedgerRows {
    ids: HashSet<String>,
    entries: Vec<LedgerEntry>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows in append order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.inner
            .lock()
            .map(|rows| rows.entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|rows| rows.entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TransactionLedger for InMemoryLedger {
    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let mut rows = self
            .inner
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("ledger lock poisoned".into()))?;

        if !rows.ids.insert(entry.id.clone()) {
            return Err(EngineError::DuplicateLedgerId(entry.id.clone()));
        }
        rows.entries.push(entry.clone());
        Ok(())
    }
}

/// Ledger streamed as CSV rows to any writer (file, socket, stdout)
///
/// Rows are flushed per append so a crash loses at most the row in flight.
pub struct CsvLedger<W: Write + Send> {
    writer: Mutex<csv::Writer<W>>,
}

impl<W: Write + Send> CsvLedger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(csv::Writer::from_writer(writer)),
        }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        let writer = self
            .writer
            .into_inner()
            .map_err(|_| EngineError::StoreUnavailable("ledger lock poisoned".into()))?;
        writer
            .into_inner()
            .map_err(|e| EngineError::Io(e.into_error()))
    }
}

impl<W: Write + Send> TransactionLedger for CsvLedger<W> {
    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("ledger lock poisoned".into()))?;
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }
}

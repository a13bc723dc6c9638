use std::fmt;

use serde::{Deserialize, Serialize};

use super::transaction::TransactionEvent;

/// Outcome of scoring one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Fraud,
    Genuine,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Fraud => write!(f, "FRAUD"),
            TransactionStatus::Genuine => write!(f, "GENUINE"),
        }
    }
}

/// Immutable ledger row, one per scored event regardless of outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub card_id: u64,
    pub member_id: u64,
    pub amount: f64,
    pub postcode: u32,
    pub pos_id: u64,
    pub transaction_dt: String,
    pub status: TransactionStatus,
}

impl LedgerEntry {
    /// Build an entry for `event` under a freshly generated id
    pub fn new(event: &TransactionEvent, status: TransactionStatus) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            card_id: event.card_id,
            member_id: event.member_id,
            amount: event.amount,
            postcode: event.postcode,
            pos_id: event.pos_id,
            transaction_dt: event.transaction_dt.clone(),
            status,
        }
    }
}

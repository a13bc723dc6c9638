use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Wire format of `transaction_dt` on every record (stream, baseline, ledger)
pub const TRANSACTION_DT_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Card transaction as delivered by the stream
///
/// Delivery is at-least-once; duplicates are scored independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub card_id: u64,
    pub member_id: u64,
    pub amount: f64,
    pub pos_id: u64,
    pub postcode: u32,
    pub transaction_dt: String,
}

/// Parse a `DD-MM-YYYY HH:MM:SS` timestamp
pub fn parse_transaction_dt(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TRANSACTION_DT_FORMAT).map_err(|_| {
        EngineError::InvalidTimestamp {
            value: value.to_string(),
        }
    })
}

/// Whole seconds from `earlier` to `later`; negative when out of order
pub fn elapsed_seconds(later: &str, earlier: &str) -> Result<i64> {
    let later = parse_transaction_dt(later)?;
    let earlier = parse_transaction_dt(earlier)?;
    Ok(later.signed_duration_since(earlier).num_seconds())
}

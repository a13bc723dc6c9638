use serde::{Deserialize, Serialize};

/// Last-known baseline for a card, keyed by card id
///
/// `spend_limit` and `score` are external inputs; the engine only ever
/// rewrites `postcode` and `transaction_dt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLookupRecord {
    pub card_id: u64,
    pub spend_limit: f64,
    #[serde(rename = "score")]
    pub risk_score: i32,
    pub postcode: u32,
    #[serde(rename = "transaction_dt")]
    pub last_transaction_dt: String,
}

/// Baseline values the decision rule is evaluated against
///
/// Built either from a stored record or, for a never-seen card, from the
/// triggering event itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub risk_score: f64,
    pub spend_limit: f64,
    pub postcode: u32,
    pub last_transaction_dt: String,
}

impl Baseline {
    /// Sentinel for a card with no usable record: fails the score rule,
    /// neutralises the spend and distance rules.
    pub fn unseen(postcode: u32, transaction_dt: &str) -> Self {
        Self {
            risk_score: f64::NEG_INFINITY,
            spend_limit: f64::INFINITY,
            postcode,
            last_transaction_dt: transaction_dt.to_string(),
        }
    }

    /// True for the never-seen sentinel built by [`Baseline::unseen`]
    pub fn is_unseen(&self) -> bool {
        self.risk_score == f64::NEG_INFINITY
    }
}

impl From<CardLookupRecord> for Baseline {
    fn from(record: CardLookupRecord) -> Self {
        Self {
            risk_score: f64::from(record.risk_score),
            spend_limit: record.spend_limit,
            postcode: record.postcode,
            last_transaction_dt: record.last_transaction_dt,
        }
    }
}

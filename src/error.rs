use thiserror::Error;

/// Errors raised while loading reference data or scoring a single event.
///
/// Only `Configuration` (and the I/O / CSV errors around startup loading) is
/// fatal. Every other variant is absorbed per event by the scoring engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration in '{path}' (line {line}): {message}")]
    Configuration {
        path: String,
        line: u64,
        message: String,
    },

    #[error("Postcode {postcode} not found in geo index")]
    NotFound { postcode: u32 },

    #[error("Invalid location: postcode {postcode} has no coordinates")]
    InvalidLocation { postcode: u32 },

    #[error("Invalid transaction timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Card {card_id} has no baseline record")]
    UnknownCard { card_id: u64 },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Ledger entry '{0}' already exists")]
    DuplicateLedgerId(String),

    #[error("Invalid baseline record for card {card_id}: {message}")]
    BaselineRecord { card_id: u64, message: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub mod geo;
pub mod ledger_entry;
pub mod lookup;
pub mod transaction;

pub use geo::GeoCoordinate;
pub use ledger_entry::{LedgerEntry, TransactionStatus};
pub use lookup::{Baseline, CardLookupRecord};
pub use transaction::TransactionEvent;

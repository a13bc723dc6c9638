pub mod config;
pub mod dispatcher;
pub mod distance;
pub mod engine;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod models;
pub mod store;

use std::io::{Read, Write};

use log::warn;

use dispatcher::{StatsSnapshot, StreamDispatcher};
use error::Result;
use ledger::TransactionLedger;
use models::TransactionEvent;
use store::CardLookupStore;

/// Score a CSV transaction stream and write one ledger-shaped row per event
///
/// Events are dispatched in batches of `batch_size`; rows are written in
/// delivery order. Malformed input rows are logged and skipped.
pub async fn process_transactions<R, W, S, L>(
    reader: R,
    writer: W,
    dispatcher: &StreamDispatcher<S, L>,
    batch_size: usize,
) -> Result<StatsSnapshot>
where
    R: Read,
    W: Write,
    S: CardLookupStore + 'static,
    L: TransactionLedger + 'static,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut batch = Vec::with_capacity(batch_size);
    for result in csv_reader.deserialize::<TransactionEvent>() {
        match result {
            Ok(event) => batch.push(event),
            Err(e) => warn!("Skipping malformed transaction record: {}", e),
        }

        if batch.len() >= batch_size {
            dispatch_batch(dispatcher, std::mem::take(&mut batch), &mut csv_writer).await?;
        }
    }

    if !batch.is_empty() {
        dispatch_batch(dispatcher, batch, &mut csv_writer).await?;
    }

    csv_writer.flush()?;
    Ok(dispatcher.stats())
}

async fn dispatch_batch<W, S, L>(
    dispatcher: &StreamDispatcher<S, L>,
    batch: Vec<TransactionEvent>,
    csv_writer: &mut csv::Writer<W>,
) -> Result<()>
where
    W: Write,
    S: CardLookupStore + 'static,
    L: TransactionLedger + 'static,
{
    for outcome in dispatcher.process_batch(batch).await {
        csv_writer.serialize(&outcome.entry)?;
    }
    Ok(())
}

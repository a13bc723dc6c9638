//! Card transaction fraud scorer
//!
//! ```bash
//! fraud-scoring-engine transactions.csv zipcodes.csv baselines.csv > scored.csv
//! ```
//!
//! Tuning comes from `SCORING_*` environment variables (see `AppConfig`);
//! `RUST_LOG` controls logging verbosity.

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use fraud_scoring_engine::config::AppConfig;
use fraud_scoring_engine::dispatcher::StreamDispatcher;
use fraud_scoring_engine::engine::ScoringEngine;
use fraud_scoring_engine::geo::GeoIndex;
use fraud_scoring_engine::ledger::{CsvLedger, InMemoryLedger, TransactionLedger};
use fraud_scoring_engine::process_transactions;
use fraud_scoring_engine::store::InMemoryCardLookupStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = AppConfig::from_args_and_env(&args).with_context(|| {
        format!(
            "Usage: {} <transactions.csv> <zipcodes.csv> <baselines.csv>",
            env::args().next().unwrap_or_else(|| "fraud-scoring-engine".to_string())
        )
    })?;

    let geo = GeoIndex::shared(&config.geo_path)
        .await
        .with_context(|| format!("Failed to load geo reference '{}'", config.geo_path.display()))?;

    let baselines = File::open(&config.baselines_path).with_context(|| {
        format!("Failed to open baselines '{}'", config.baselines_path.display())
    })?;
    let store = Arc::new(
        InMemoryCardLookupStore::load_csv(BufReader::new(baselines))
            .context("Failed to seed card baselines")?,
    );

    match &config.ledger_path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create ledger '{}'", path.display()))?;
            run(&config, geo, store, Arc::new(CsvLedger::new(file))).await
        }
        None => run(&config, geo, store, Arc::new(InMemoryLedger::new())).await,
    }
}

async fn run<L: TransactionLedger + 'static>(
    config: &AppConfig,
    geo: Arc<GeoIndex>,
    store: Arc<InMemoryCardLookupStore>,
    ledger: Arc<L>,
) -> Result<()> {
    let engine = ScoringEngine::with_rules(geo, store, ledger, config.rules);
    info!(
        "Fraud thresholds: risk score below {}, speed above {} km/s",
        engine.rules().min_risk_score,
        engine.rules().max_speed_km_s
    );
    let dispatcher = StreamDispatcher::with_locking(engine, config.shards, config.per_card_locking);

    info!(
        "Scoring with {} shards, batch size {}, per-card locking {}",
        dispatcher.num_shards(),
        config.batch_size,
        dispatcher.per_card_locking()
    );

    let input = File::open(&config.transactions_path).with_context(|| {
        format!("Failed to open transactions '{}'", config.transactions_path.display())
    })?;

    let stats = process_transactions(BufReader::new(input), io::stdout(), &dispatcher, config.batch_size)
        .await
        .context("Failed to process transactions and write output")?;

    info!(
        "Scored {} events: {} genuine, {} fraud, {} with errors",
        stats.scored, stats.genuine, stats.fraud, stats.errors
    );

    Ok(())
}

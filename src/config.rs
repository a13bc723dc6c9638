use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::ScoringRules;
use crate::error::{EngineError, Result};

pub const DEFAULT_SHARDS: usize = 8;
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Runtime settings: input paths from the command line, tuning from the
/// environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub transactions_path: PathBuf,
    pub geo_path: PathBuf,
    pub baselines_path: PathBuf,
    /// Optional file receiving every ledger row as it is appended
    pub ledger_path: Option<PathBuf>,
    pub shards: usize,
    /// Events per dispatched batch; affects latency and throughput only
    pub batch_size: usize,
    pub per_card_locking: bool,
    pub rules: ScoringRules,
}

impl AppConfig {
    /// Build from `<transactions.csv> <zipcodes.csv> <baselines.csv>` plus
    /// `SCORING_*` environment variables
    pub fn from_args_and_env(args: &[String]) -> Result<Self> {
        let [transactions, geo, baselines] = args else {
            return Err(EngineError::Configuration {
                path: "<command line>".into(),
                line: 0,
                message: "expected <transactions.csv> <zipcodes.csv> <baselines.csv>".into(),
            });
        };

        Self::from_lookup(transactions, geo, baselines, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_args_and_env`] with an injectable variable source
    pub fn from_lookup<F>(transactions: &str, geo: &str, baselines: &str, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ScoringRules::default();

        let shards = parse_var(&var, "SCORING_SHARDS", DEFAULT_SHARDS)?;
        let batch_size = parse_var(&var, "SCORING_BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        if shards == 0 || batch_size == 0 {
            return Err(env_error("SCORING_SHARDS/SCORING_BATCH_SIZE", "must be at least 1"));
        }

        Ok(Self {
            transactions_path: PathBuf::from(transactions),
            geo_path: PathBuf::from(geo),
            baselines_path: PathBuf::from(baselines),
            ledger_path: var("SCORING_LEDGER_PATH").map(PathBuf::from),
            shards,
            batch_size,
            per_card_locking: parse_var(&var, "SCORING_PER_CARD_LOCKING", true)?,
            rules: ScoringRules {
                min_risk_score: parse_var(&var, "SCORING_MIN_RISK_SCORE", defaults.min_risk_score)?,
                max_speed_km_s: parse_var(&var, "SCORING_MAX_SPEED_KM_S", defaults.max_speed_km_s)?,
            },
        })
    }
}

fn parse_var<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| env_error(key, &format!("cannot parse '{}'", raw))),
    }
}

fn env_error(key: &str, message: &str) -> EngineError {
    EngineError::Configuration {
        path: format!("${}", key),
        line: 0,
        message: message.to_string(),
    }
}

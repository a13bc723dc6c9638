use std::sync::Arc;

use log::{debug, error, warn};

use crate::distance::distance_km;
use crate::error::{EngineError, Result};
use crate::geo::GeoIndex;
use crate::ledger::TransactionLedger;
use crate::models::transaction::elapsed_seconds;
use crate::models::{Baseline, GeoCoordinate, LedgerEntry, TransactionEvent, TransactionStatus};
use crate::store::CardLookupStore;

/// Thresholds of the fixed decision rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    /// Baselines scoring strictly below this are fraud
    pub min_risk_score: f64,
    /// Implied travel speed above this (km/s) is fraud; 0.25 ≈ 900 km/h
    pub max_speed_km_s: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            min_risk_score: 200.0,
            max_speed_km_s: 0.25,
        }
    }
}

/// Why an event was classified as fraud
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraudReason {
    LowRiskScore,
    OverSpendLimit,
    ImplausibleVelocity,
    /// Location or timestamp could not be evaluated
    Unscorable,
}

impl ScoringRules {
    /// Apply the rule; any single reason is sufficient for fraud
    pub fn evaluate(&self, baseline: &Baseline, amount: f64, speed_km_s: f64) -> Vec<FraudReason> {
        let mut reasons = Vec::new();
        if baseline.risk_score < self.min_risk_score {
            reasons.push(FraudReason::LowRiskScore);
        }
        if amount > baseline.spend_limit {
            reasons.push(FraudReason::OverSpendLimit);
        }
        if speed_km_s > self.max_speed_km_s {
            reasons.push(FraudReason::ImplausibleVelocity);
        }
        reasons
    }

    pub fn decide(&self, baseline: &Baseline, amount: f64, speed_km_s: f64) -> TransactionStatus {
        status_for(&self.evaluate(baseline, amount, speed_km_s))
    }
}

fn status_for(reasons: &[FraudReason]) -> TransactionStatus {
    if reasons.is_empty() {
        TransactionStatus::Genuine
    } else {
        TransactionStatus::Fraud
    }
}

/// Implied travel speed in km/s
///
/// Zero elapsed time is infinitely fast, so two same-card events with the
/// same timestamp always trip the velocity rule.
pub fn speed_km_s(distance_km: f64, elapsed_seconds: i64) -> f64 {
    if elapsed_seconds == 0 {
        f64::INFINITY
    } else {
        distance_km / elapsed_seconds as f64
    }
}

/// Result of scoring one event
#[derive(Debug)]
pub struct ScoreOutcome {
    /// Row handed to the ledger (whether or not the append succeeded)
    pub entry: LedgerEntry,
    pub reasons: Vec<FraudReason>,
    /// Per-event error that forced or accompanied the decision
    pub error: Option<EngineError>,
}

impl ScoreOutcome {
    pub fn status(&self) -> TransactionStatus {
        self.entry.status
    }
}

/// Per-event scoring: get baseline, compute velocity, decide, persist
///
/// One call is one complete cycle and never fails as a whole: every per-event
/// error ends as a FRAUD row in the ledger. The get→decide→put sequence is not
/// atomic here; callers that need per-card serialisation must provide it
/// (see `dispatcher::StreamDispatcher`).
pub struct ScoringEngine<S: CardLookupStore, L: TransactionLedger> {
    geo: Arc<GeoIndex>,
    store: Arc<S>,
    ledger: Arc<L>,
    rules: ScoringRules,
}

impl<S: CardLookupStore, L: TransactionLedger> ScoringEngine<S, L> {
    pub fn new(geo: Arc<GeoIndex>, store: Arc<S>, ledger: Arc<L>) -> Self {
        Self::with_rules(geo, store, ledger, ScoringRules::default())
    }

    pub fn with_rules(
        geo: Arc<GeoIndex>,
        store: Arc<S>,
        ledger: Arc<L>,
        rules: ScoringRules,
    ) -> Self {
        Self {
            geo,
            store,
            ledger,
            rules,
        }
    }

    pub fn score(&self, event: &TransactionEvent) -> ScoreOutcome {
        let (baseline, lookup_error) = self.baseline_for(event);

        let (reasons, error) = match self.evaluate(event, &baseline) {
            Ok(reasons) => (reasons, lookup_error),
            Err(e) => {
                warn!("Card {}: unscorable event, forcing FRAUD: {}", event.card_id, e);
                (vec![FraudReason::Unscorable], Some(e))
            }
        };
        let status = status_for(&reasons);

        debug!(
            "Card {} amount {} at {}: {} {:?}",
            event.card_id, event.amount, event.transaction_dt, status, reasons
        );

        let entry = LedgerEntry::new(event, status);
        if let Err(e) = self.ledger.append(&entry) {
            error!("Ledger append failed for entry {} (card {}): {}", entry.id, entry.card_id, e);
        }

        if status == TransactionStatus::Genuine {
            if let Err(e) = self
                .store
                .put(event.card_id, event.postcode, &event.transaction_dt)
            {
                error!("Baseline update failed for card {}: {}", event.card_id, e);
            }
        }

        ScoreOutcome {
            entry,
            reasons,
            error,
        }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Stored baseline, or the never-seen sentinel when absent or unreadable
    fn baseline_for(&self, event: &TransactionEvent) -> (Baseline, Option<EngineError>) {
        match self.store.get(event.card_id) {
            Ok(Some(record)) => (Baseline::from(record), None),
            Ok(None) => {
                debug!("Card {}: no baseline on record", event.card_id);
                (Baseline::unseen(event.postcode, &event.transaction_dt), None)
            }
            Err(e) => {
                warn!("Card {}: baseline indeterminate: {}", event.card_id, e);
                (Baseline::unseen(event.postcode, &event.transaction_dt), Some(e))
            }
        }
    }

    fn evaluate(&self, event: &TransactionEvent, baseline: &Baseline) -> Result<Vec<FraudReason>> {
        let here = self.locate(event.postcode)?;
        let previous = self.locate(baseline.postcode)?;
        let distance = distance_km(here, previous);

        let elapsed = elapsed_seconds(&event.transaction_dt, &baseline.last_transaction_dt)?;
        // A never-seen card has no previous location to travel from
        let speed = if baseline.is_unseen() {
            0.0
        } else {
            speed_km_s(distance, elapsed)
        };

        Ok(self.rules.evaluate(baseline, event.amount, speed))
    }

    fn locate(&self, postcode: u32) -> Result<&GeoCoordinate> {
        self.geo
            .lookup(postcode)
            .map_err(|_| EngineError::InvalidLocation { postcode })
    }
}

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::error;
use tokio::sync::Mutex;

use crate::engine::{ScoreOutcome, ScoringEngine};
use crate::ledger::TransactionLedger;
use crate::models::{TransactionEvent, TransactionStatus};
use crate::store::CardLookupStore;

/// Sharded, concurrent front end to a [`ScoringEngine`]
///
/// Cards are routed to shard `card_id % num_shards`. With per-card locking
/// enabled (the default) a shard is owned by one task for a whole
/// get→decide→put cycle, so two events for the same card can never read the
/// same stale baseline. Distinct shards score in parallel.
///
/// With locking disabled every event is scored in its own task with no
/// coordination, which reproduces the lost-update race on the baseline.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use fraud_scoring_engine::dispatcher::StreamDispatcher;
/// use fraud_scoring_engine::engine::ScoringEngine;
/// use fraud_scoring_engine::geo::GeoIndex;
/// use fraud_scoring_engine::ledger::InMemoryLedger;
/// use fraud_scoring_engine::store::InMemoryCardLookupStore;
///
/// #[tokio::main]
/// async fn main() {
///     let geo = Arc::new(GeoIndex::load("zipcodes.csv").unwrap());
///     let engine = ScoringEngine::new(
///         geo,
///         Arc::new(InMemoryCardLookupStore::new()),
///         Arc::new(InMemoryLedger::new()),
///     );
///     let dispatcher = StreamDispatcher::new(engine, 8);
///     let outcomes = dispatcher.process_batch(Vec::new()).await;
///     assert!(outcomes.is_empty());
/// }
/// ```
pub struct StreamDispatcher<S: CardLookupStore, L: TransactionLedger> {
    engine: Arc<ScoringEngine<S, L>>,
    shards: Vec<Arc<Mutex<()>>>,
    num_shards: usize,
    per_card_locking: bool,
    stats: Arc<DispatchStats>,
}

impl<S, L> StreamDispatcher<S, L>
where
    S: CardLookupStore + 'static,
    L: TransactionLedger + 'static,
{
    /// Dispatcher with per-card locking over `num_shards` shards
    pub fn new(engine: ScoringEngine<S, L>, num_shards: usize) -> Self {
        Self::with_locking(engine, num_shards, true)
    }

    pub fn with_locking(engine: ScoringEngine<S, L>, num_shards: usize, per_card_locking: bool) -> Self {
        assert!(num_shards > 0, "num_shards must be at least 1");

        Self {
            engine: Arc::new(engine),
            shards: (0..num_shards).map(|_| Arc::new(Mutex::new(()))).collect(),
            num_shards,
            per_card_locking,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    fn shard_for_card(&self, card_id: u64) -> usize {
        (card_id % self.num_shards as u64) as usize
    }

    /// Score one event, honouring the card's shard lock
    pub async fn process_event(&self, event: TransactionEvent) -> ScoreOutcome {
        let outcome = if self.per_card_locking {
            let _owner = self.shards[self.shard_for_card(event.card_id)].lock().await;
            self.engine.score(&event)
        } else {
            self.engine.score(&event)
        };

        self.stats.record(&outcome);
        outcome
    }

    /// Score a batch in parallel; outcomes come back in delivery order
    ///
    /// With locking, events of one shard are scored sequentially in delivery
    /// order by a single task that holds the shard for the whole run. An
    /// overlapping batch waits for the shard rather than interleaving.
    pub async fn process_batch(&self, events: Vec<TransactionEvent>) -> Vec<ScoreOutcome> {
        let total = events.len();

        let handles = if self.per_card_locking {
            self.spawn_per_shard(events)
        } else {
            self.spawn_per_event(events)
        };

        let mut indexed = Vec::with_capacity(total);
        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(outcomes) => indexed.extend(outcomes),
                Err(e) => error!("Scoring task aborted, its events are unscored: {}", e),
            }
        }

        indexed.sort_by_key(|(position, _)| *position);
        indexed
            .into_iter()
            .map(|(_, outcome)| {
                self.stats.record(&outcome);
                outcome
            })
            .collect()
    }

    fn spawn_per_shard(
        &self,
        events: Vec<TransactionEvent>,
    ) -> Vec<tokio::task::JoinHandle<Vec<(usize, ScoreOutcome)>>> {
        let mut routed: Vec<Vec<(usize, TransactionEvent)>> = vec![Vec::new(); self.num_shards];
        for (position, event) in events.into_iter().enumerate() {
            routed[self.shard_for_card(event.card_id)].push((position, event));
        }

        routed
            .into_iter()
            .enumerate()
            .filter(|(_, events)| !events.is_empty())
            .map(|(shard_id, events)| {
                let shard = Arc::clone(&self.shards[shard_id]);
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move {
                    let _owner = shard.lock().await;
                    events
                        .into_iter()
                        .map(|(position, event)| (position, engine.score(&event)))
                        .collect::<Vec<_>>()
                })
            })
            .collect()
    }

    fn spawn_per_event(
        &self,
        events: Vec<TransactionEvent>,
    ) -> Vec<tokio::task::JoinHandle<Vec<(usize, ScoreOutcome)>>> {
        events
            .into_iter()
            .enumerate()
            .map(|(position, event)| {
                let engine = Arc::clone(&self.engine);
                tokio::spawn(async move { vec![(position, engine.score(&event))] })
            })
            .collect()
    }

    /// Clone handle for sharing across tasks
    ///
    /// Shares the engine, shard locks and counters.
    pub fn clone_handle(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            shards: self.shards.clone(),
            num_shards: self.num_shards,
            per_card_locking: self.per_card_locking,
            stats: Arc::clone(&self.stats),
        }
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    pub fn per_card_locking(&self) -> bool {
        self.per_card_locking
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Running totals across every dispatched event
#[derive(Debug, Default)]
pub struct DispatchStats {
    scored: AtomicU64,
    fraud: AtomicU64,
    genuine: AtomicU64,
    errors: AtomicU64,
}

impl DispatchStats {
    fn record(&self, outcome: &ScoreOutcome) {
        self.scored.fetch_add(1, Ordering::Relaxed);
        match outcome.status() {
            TransactionStatus::Fraud => self.fraud.fetch_add(1, Ordering::Relaxed),
            TransactionStatus::Genuine => self.genuine.fetch_add(1, Ordering::Relaxed),
        };
        if outcome.error.is_some() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            scored: self.scored.load(Ordering::Relaxed),
            fraud: self.fraud.load(Ordering::Relaxed),
            genuine: self.genuine.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub scored: u64,
    pub fraud: u64,
    pub genuine: u64,
    pub errors: u64,
}

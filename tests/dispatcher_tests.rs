mod common;

use std::sync::Arc;

use common::*;
use fraud_scoring_engine::dispatcher::StreamDispatcher;
use fraud_scoring_engine::engine::ScoringEngine;
use fraud_scoring_engine::ledger::InMemoryLedger;
use fraud_scoring_engine::models::{TransactionEvent, TransactionStatus};
use fraud_scoring_engine::store::CardLookupStore;

const T0: &str = "01-03-2018 08:00:00";

/// `hours` after midnight on 2 March 2018, as a wire timestamp
fn hours_later(hours: u32) -> String {
    format!("{:02}-03-2018 {:02}:00:00", 2 + hours / 24, hours % 24)
}

/// Test same-card events in one batch are scored in delivery order
#[tokio::test]
async fn test_same_card_batch_scored_in_order() {
    let (engine, store, _) = engine_with(&[baseline(CARD, 500, 1000.0, 10001, T0)]);
    let dispatcher = StreamDispatcher::new(engine, 4);

    let batch = vec![
        // A day later in Los Angeles: plausible, moves the baseline west
        event(CARD, 50.0, 90001, "02-03-2018 08:00:00"),
        // A minute after that back in New Jersey: impossible
        event(CARD, 50.0, 10001, "02-03-2018 08:01:00"),
    ];

    let outcomes = dispatcher.process_batch(batch).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].status(), TransactionStatus::Genuine);
    assert_eq!(outcomes[1].status(), TransactionStatus::Fraud);
    assert_eq!(store.get(CARD).unwrap().unwrap().postcode, 90001);
}

/// Test outcomes come back in delivery order across shards
#[tokio::test]
async fn test_batch_outcomes_follow_delivery_order() {
    let records: Vec<_> = (1..=20)
        .map(|card| baseline(card, 500, 1000.0, 10001, T0))
        .collect();
    let (engine, _, ledger) = engine_with(&records);
    let dispatcher = StreamDispatcher::new(engine, 3);

    let batch: Vec<TransactionEvent> = (1..=20)
        .rev()
        .map(|card| event(card, card as f64, 10003, &hours_later(1)))
        .collect();

    let outcomes = dispatcher.process_batch(batch).await;

    let cards: Vec<u64> = outcomes.iter().map(|o| o.entry.card_id).collect();
    assert_eq!(cards, (1..=20).rev().collect::<Vec<u64>>());
    assert!(outcomes.iter().all(|o| o.status() == TransactionStatus::Genuine));
    assert_eq!(ledger.len(), 20);
}

/// Test a long same-card run keeps the newest baseline
#[tokio::test]
async fn test_same_card_run_ends_on_last_event() {
    let (engine, store, _) = engine_with(&[baseline(CARD, 500, 1000.0, 10001, T0)]);
    let dispatcher = StreamDispatcher::new(engine, 8);

    let batch: Vec<_> = (0..48)
        .map(|h| {
            let postcode = if h % 2 == 0 { 10003 } else { 10001 };
            event(CARD, 10.0, postcode, &hours_later(h))
        })
        .collect();

    let outcomes = dispatcher.process_batch(batch).await;

    assert!(outcomes.iter().all(|o| o.status() == TransactionStatus::Genuine));
    let record = store.get(CARD).unwrap().unwrap();
    assert_eq!(record.last_transaction_dt, hours_later(47));
    assert_eq!(record.postcode, 10001);
}

/// Test overlapping batches from different tasks never interleave a card
#[tokio::test]
async fn test_concurrent_batches_for_same_card() {
    let (engine, store, ledger) = engine_with(&[baseline(CARD, 500, 1000.0, 10001, T0)]);
    let dispatcher = StreamDispatcher::new(engine, 4);

    let mut handles = vec![];
    for task in 0..4u32 {
        let dispatcher = dispatcher.clone_handle();
        handles.push(tokio::spawn(async move {
            let batch = (0..10)
                .map(|i| event(CARD, 10.0, 10001, &hours_later(task * 10 + i)))
                .collect();
            dispatcher.process_batch(batch).await
        }));
    }

    let mut scored = 0;
    for h in handles {
        scored += h.await.unwrap().len();
    }

    assert_eq!(scored, 40);
    assert_eq!(ledger.len(), 40);
    let stats = dispatcher.stats();
    assert_eq!(stats.scored, 40);
    assert_eq!(stats.fraud + stats.genuine, 40);
    // Whatever order the batches ran in, the stored timestamp is one we sent
    let last = store.get(CARD).unwrap().unwrap().last_transaction_dt;
    assert!((0..40).any(|h| hours_later(h) == last));
}

/// Test many independent cards process concurrently
#[tokio::test]
async fn test_high_concurrency_distinct_cards() {
    let records: Vec<_> = (1..=200)
        .map(|card| baseline(card, 500, 1000.0, 10001, T0))
        .collect();
    let (engine, store, ledger) = engine_with(&records);
    let dispatcher = StreamDispatcher::new(engine, 16);

    let mut handles = vec![];
    for card in 1..=200u64 {
        let dispatcher = dispatcher.clone_handle();
        handles.push(tokio::spawn(async move {
            dispatcher
                .process_event(event(card, 5.0, 10003, &hours_later(2)))
                .await
        }));
    }

    for h in handles {
        assert_eq!(h.await.unwrap().status(), TransactionStatus::Genuine);
    }

    assert_eq!(ledger.len(), 200);
    assert_eq!(dispatcher.stats().genuine, 200);
    for card in 1..=200u64 {
        assert_eq!(store.get(card).unwrap().unwrap().postcode, 10003);
    }
}

/// Test unlocked dispatch still scores and ledgers every event
#[tokio::test]
async fn test_unlocked_dispatch_scores_everything() {
    let (engine, _, ledger) = engine_with(&[]);
    let dispatcher = StreamDispatcher::with_locking(engine, 4, false);
    assert!(!dispatcher.per_card_locking());

    let batch: Vec<_> = (1..=50)
        .map(|card| event(card, 1.0, 10001, T0))
        .collect();

    let outcomes = dispatcher.process_batch(batch).await;

    assert_eq!(outcomes.len(), 50);
    // None of these cards has a baseline
    assert!(outcomes.iter().all(|o| o.status() == TransactionStatus::Fraud));
    assert_eq!(ledger.len(), 50);
    assert_eq!(dispatcher.stats().fraud, 50);
}

/// Test per-event errors are counted but never stop the batch
#[tokio::test]
async fn test_errors_are_absorbed_per_event() {
    let store = seeded_store(&[baseline(CARD, 500, 1000.0, 10001, T0)]);
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = ScoringEngine::new(geo_index(), store, Arc::clone(&ledger));
    let dispatcher = StreamDispatcher::new(engine, 2);

    let batch = vec![
        event(CARD, 10.0, 12345, &hours_later(1)),
        event(CARD, 10.0, 10001, "not a date"),
        event(CARD, 10.0, 10003, &hours_later(3)),
    ];

    let outcomes = dispatcher.process_batch(batch).await;

    assert_eq!(outcomes[0].status(), TransactionStatus::Fraud);
    assert_eq!(outcomes[1].status(), TransactionStatus::Fraud);
    assert_eq!(outcomes[2].status(), TransactionStatus::Genuine);
    let stats = dispatcher.stats();
    assert_eq!(stats.errors, 2);
    assert_eq!(stats.scored, 3);
    assert_eq!(ledger.len(), 3);
}

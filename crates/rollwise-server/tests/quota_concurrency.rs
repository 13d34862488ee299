#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! Concurrency tests for the two shared mutable resources: the quota
//! counter and the decision resolution state. Both must behave as single
//! atomic compare-and-set operations under concurrent load.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, Utc};

use rollwise_server::decision::{DecisionError, DecisionService};
use rollwise_server::generator::{CompletionProvider, GeneratorAdapter, ProviderError};
use rollwise_server::quota::QuotaLedger;
use rollwise_server::storage::{Database, PrivacyLevel};

struct FixedProvider;

#[async_trait]
impl CompletionProvider for FixedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok("Option one here\nOption two here\nOption three here\nOption four here".to_string())
    }
}

async fn harness(daily_limit: u32) -> (DecisionService, QuotaLedger, Database) {
    let db = Database::open_in_memory().await.unwrap();
    db.create_user("u1", "alice").await.unwrap();
    let ledger = QuotaLedger::new(db.clone(), daily_limit);
    let generator = GeneratorAdapter::new(Arc::new(FixedProvider));
    let service = DecisionService::new(db.clone(), ledger.clone(), generator);
    (service, ledger, db)
}

#[tokio::test]
async fn five_concurrent_creates_yield_exactly_three() {
    let (service, _ledger, db) = harness(3).await;

    let mut handles = Vec::new();
    for i in 0..5 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.create("u1", &format!("attempt {i}"), PrivacyLevel::Private).await
        }));
    }

    let mut successes = 0;
    let mut exhausted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DecisionError::QuotaExceeded { remaining }) => {
                assert_eq!(remaining, 0);
                exhausted += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 3);
    assert_eq!(exhausted, 2);

    let user = db.get_user("u1").await.unwrap();
    assert_eq!(user.queries_used_today, 3);
    assert_eq!(db.list_decisions_by_owner("u1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn hundred_concurrent_rolls_one_success() {
    let (service, _ledger, _db) = harness(10).await;
    let created = service.create("u1", "One roll only", PrivacyLevel::Private).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let service = service.clone();
        let id = created.decision_id.clone();
        handles.push(tokio::spawn(async move { service.resolve(&id, "u1").await }));
    }

    let mut successes = 0;
    let mut already_resolved = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(resolution) => {
                assert!(resolution.selected_index < created.alternatives.len());
                successes += 1;
            }
            Err(DecisionError::AlreadyResolved) => already_resolved += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_resolved, 99);
}

#[tokio::test]
async fn stale_counter_resets_on_status_read() {
    let (_service, ledger, db) = harness(3).await;

    let yesterday = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    db.seed_quota_state("u1", 3, &yesterday).await.unwrap();

    // No explicit reset call: the read itself rolls the window over.
    let status = ledger.status("u1").await.unwrap();
    assert_eq!(status.queries_used_today, 0);
    assert_eq!(status.queries_remaining, Some(status.daily_limit));
}

#[tokio::test]
async fn stale_counter_resets_on_consume() {
    let (service, _ledger, db) = harness(3).await;

    let yesterday = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string();
    db.seed_quota_state("u1", 3, &yesterday).await.unwrap();

    // Exhausted yesterday; today's first create still passes.
    assert!(service.create("u1", "new day", PrivacyLevel::Private).await.is_ok());
    let user = db.get_user("u1").await.unwrap();
    assert_eq!(user.queries_used_today, 1);
}

#[tokio::test]
async fn concurrent_resolve_and_annotate_stay_consistent() {
    let (service, _ledger, db) = harness(10).await;
    let created = service.create("u1", "race me", PrivacyLevel::Private).await.unwrap();

    let resolver = {
        let service = service.clone();
        let id = created.decision_id.clone();
        tokio::spawn(async move { service.resolve(&id, "u1").await })
    };
    let annotator = {
        let service = service.clone();
        let id = created.decision_id.clone();
        tokio::spawn(async move { service.annotate_outcome(&id, "u1", true).await })
    };

    let resolved = resolver.await.unwrap();
    let annotated = annotator.await.unwrap();

    assert!(resolved.is_ok());
    // The annotation either landed after the resolve committed or failed
    // with NotYetResolved; either way the record is consistent.
    match annotated {
        Ok(()) => {
            let record = db.get_decision(&created.decision_id).await.unwrap();
            assert!(record.is_resolved());
            assert_eq!(record.implemented_flag(), Some(true));
        }
        Err(DecisionError::NotYetResolved) => {
            let record = db.get_decision(&created.decision_id).await.unwrap();
            assert!(record.implemented_flag().is_none());
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
}

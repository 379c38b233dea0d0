//! Drug-test recording tests against a real SQLite database

mod helpers;

use chrono::Utc;
use fid_common::models::InspectorStatus;
use fid_ds::db::inspectors::{drug_tests_for, record_test_result};
use fid_ds::Error;
use helpers::{point, seed_drug_test, seed_inspector, test_pool};

#[tokio::test]
async fn test_pending_result_recorded_once() {
    let (pool, _dir) = test_pool().await;
    let id = seed_inspector(
        &pool,
        "B-4001",
        "Noor",
        "Haddad",
        InspectorStatus::Available,
        Some(point(38.9, -77.0)),
        &[],
    )
    .await;
    let test_id = seed_drug_test(&pool, id, Utc::now(), 3, None).await;

    record_test_result(&pool, test_id, true).await.unwrap();

    let tests = drug_tests_for(&pool, id).await.unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].result, Some(true));
}

#[tokio::test]
async fn test_second_result_write_is_rejected() {
    let (pool, _dir) = test_pool().await;
    let id = seed_inspector(
        &pool,
        "B-4002",
        "Noor",
        "Haddad",
        InspectorStatus::Available,
        Some(point(38.9, -77.0)),
        &[],
    )
    .await;
    let test_id = seed_drug_test(&pool, id, Utc::now(), 3, None).await;

    record_test_result(&pool, test_id, false).await.unwrap();
    let err = record_test_result(&pool, test_id, true).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // First write stands
    let tests = drug_tests_for(&pool, id).await.unwrap();
    assert_eq!(tests[0].result, Some(false));
}

#[tokio::test]
async fn test_result_for_unknown_test_is_not_found() {
    let (pool, _dir) = test_pool().await;
    let err = record_test_result(&pool, 9_999, true).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_result_on_seeded_pass_is_rejected() {
    // Seeding with a result occupies the single write; a later overwrite
    // attempt must not flip it
    let (pool, _dir) = test_pool().await;
    let id = seed_inspector(
        &pool,
        "B-4003",
        "Noor",
        "Haddad",
        InspectorStatus::Available,
        Some(point(38.9, -77.0)),
        &[],
    )
    .await;
    let test_id = seed_drug_test(&pool, id, Utc::now(), 3, Some(true)).await;

    let err = record_test_result(&pool, test_id, false).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let tests = drug_tests_for(&pool, id).await.unwrap();
    assert_eq!(tests[0].result, Some(true));
}

//! End-to-end directory search tests against a real SQLite database

mod helpers;

use chrono::Utc;
use fid_common::clock::ManualClock;
use fid_common::models::InspectorStatus;
use fid_ds::cache::{CacheSettings, InMemorySearchCache, NoopSearchCache};
use fid_ds::search::{DirectoryService, SearchCriteria, SortKey};
use fid_ds::Error;
use helpers::{point, seed_drug_test, seed_inspector, test_pool};
use sqlx::SqlitePool;
use std::sync::Arc;

// Downtown Washington, DC as the query point; seeded inspectors sit at
// known offsets north of it (0.1 degrees of latitude is ~11.1 km)
const DC_LAT: f64 = 38.9072;
const DC_LON: f64 = -77.0369;

fn criteria(radius_miles: f64) -> SearchCriteria {
    SearchCriteria {
        latitude: DC_LAT,
        longitude: DC_LON,
        radius_miles,
        status: None,
        certifications: vec![],
        is_active: None,
        page_number: 1,
        page_size: 20,
        sort_by: SortKey::Distance,
        sort_descending: false,
    }
}

fn service(pool: &SqlitePool) -> DirectoryService {
    DirectoryService::new(
        pool.clone(),
        Arc::new(NoopSearchCache),
        Arc::new(ManualClock::new(Utc::now())),
    )
}

async fn seed_three_around_dc(pool: &SqlitePool) -> (i64, i64, i64) {
    // ~7 km, ~22 km, ~78 km north of the query point
    let near = seed_inspector(
        pool,
        "B-0001",
        "Ana",
        "Reyes",
        InspectorStatus::Available,
        Some(point(DC_LAT + 0.063, DC_LON)),
        &["API-510"],
    )
    .await;
    let mid = seed_inspector(
        pool,
        "B-0002",
        "Ben",
        "Okafor",
        InspectorStatus::Available,
        Some(point(DC_LAT + 0.2, DC_LON)),
        &["API-510", "NACE Level 2"],
    )
    .await;
    let far = seed_inspector(
        pool,
        "B-0003",
        "Cara",
        "Ngo",
        InspectorStatus::Mobilized,
        Some(point(DC_LAT + 0.7, DC_LON)),
        &[],
    )
    .await;
    (near, mid, far)
}

#[tokio::test]
async fn test_radius_restricts_results() {
    let (pool, _dir) = test_pool().await;
    let (near, mid, far) = seed_three_around_dc(&pool).await;
    let svc = service(&pool);

    // 10 miles (~16 km) catches only the nearest
    let page = svc.search(criteria(10.0)).await.unwrap();
    assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![near]);

    // 30 miles catches the first two, distance ascending
    let page = svc.search(criteria(30.0)).await.unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![near, mid]
    );

    // 60 miles catches all three
    let page = svc.search(criteria(60.0)).await.unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items.last().unwrap().id, far);
}

#[tokio::test]
async fn test_inspector_without_location_never_matches() {
    let (pool, _dir) = test_pool().await;
    seed_inspector(
        &pool,
        "B-0100",
        "No",
        "Where",
        InspectorStatus::Available,
        None,
        &[],
    )
    .await;
    let page = service(&pool).search(criteria(500.0)).await.unwrap();
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn test_certification_filter_uses_and_semantics_case_insensitive() {
    let (pool, _dir) = test_pool().await;
    let (near, mid, _far) = seed_three_around_dc(&pool).await;
    let svc = service(&pool);

    let mut c = criteria(60.0);
    c.certifications = vec!["api-510".to_string()];
    let page = svc.search(c).await.unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![near, mid]
    );

    // Requiring both certifications narrows to the one holding both
    let mut c = criteria(60.0);
    c.certifications = vec!["API-510".to_string(), "nace level 2".to_string()];
    let page = svc.search(c).await.unwrap();
    assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![mid]);
}

#[tokio::test]
async fn test_status_and_active_filters() {
    let (pool, _dir) = test_pool().await;
    let (near, mid, far) = seed_three_around_dc(&pool).await;
    helpers::soft_delete(&pool, mid).await;
    let svc = service(&pool);

    let mut c = criteria(60.0);
    c.status = Some(InspectorStatus::Mobilized);
    let page = svc.search(c).await.unwrap();
    assert_eq!(page.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![far]);

    let mut c = criteria(60.0);
    c.is_active = Some(true);
    let page = svc.search(c).await.unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![near, far]
    );
}

#[tokio::test]
async fn test_last_name_sort_with_distance_tie_break() {
    let (pool, _dir) = test_pool().await;
    // Same last name at different distances, plus one other name
    let nearer_doe = seed_inspector(
        &pool,
        "B-0201",
        "Nia",
        "doe",
        InspectorStatus::Available,
        Some(point(DC_LAT + 0.05, DC_LON)),
        &[],
    )
    .await;
    let farther_doe = seed_inspector(
        &pool,
        "B-0202",
        "Omar",
        "Doe",
        InspectorStatus::Available,
        Some(point(DC_LAT + 0.15, DC_LON)),
        &[],
    )
    .await;
    let abbott = seed_inspector(
        &pool,
        "B-0203",
        "Pia",
        "Abbott",
        InspectorStatus::Available,
        Some(point(DC_LAT + 0.2, DC_LON)),
        &[],
    )
    .await;

    let mut c = criteria(60.0);
    c.sort_by = SortKey::LastName;
    let page = service(&pool).search(c).await.unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![abbott, nearer_doe, farther_doe]
    );
}

#[tokio::test]
async fn test_last_drug_test_date_sort() {
    let (pool, _dir) = test_pool().await;
    let (near, mid, far) = seed_three_around_dc(&pool).await;
    let now = Utc::now();
    seed_drug_test(&pool, near, now, 30, Some(true)).await;
    seed_drug_test(&pool, mid, now, 5, Some(true)).await;
    // A newer failing test must not change mid's last passing date
    seed_drug_test(&pool, mid, now, 1, Some(false)).await;

    let mut c = criteria(60.0);
    c.sort_by = SortKey::LastDrugTestDate;
    c.sort_descending = true;
    let page = service(&pool).search(c).await.unwrap();
    // Most recent pass first; the never-tested inspector sorts last
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![mid, near, far]
    );
    assert!(page.items[0].last_passing_test_date > page.items[1].last_passing_test_date);
    assert_eq!(page.items[2].last_passing_test_date, None);
}

#[tokio::test]
async fn test_pagination_counts() {
    let (pool, _dir) = test_pool().await;
    for i in 0..5 {
        seed_inspector(
            &pool,
            &format!("B-03{i:02}"),
            "Pat",
            &format!("Lee{i}"),
            InspectorStatus::Available,
            Some(point(DC_LAT + 0.01 * f64::from(i), DC_LON)),
            &[],
        )
        .await;
    }
    let svc = service(&pool);

    let mut c = criteria(60.0);
    c.page_size = 2;
    let first = svc.search(c.clone()).await.unwrap();
    assert_eq!(first.total_count, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items.len(), 2);

    c.page_number = 3;
    let last = svc.search(c.clone()).await.unwrap();
    assert_eq!(last.items.len(), 1);

    c.page_number = 4;
    let past_end = svc.search(c).await.unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_count, 5);
}

#[tokio::test]
async fn test_invalid_criteria_rejected_before_storage() {
    let (pool, _dir) = test_pool().await;
    let svc = service(&pool);

    let mut c = criteria(0.5);
    assert!(matches!(svc.search(c.clone()).await, Err(Error::Validation(_))));
    c.radius_miles = 501.0;
    assert!(matches!(svc.search(c).await, Err(Error::Validation(_))));

    let mut c = criteria(25.0);
    c.page_size = 0;
    assert!(matches!(svc.search(c).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_cached_page_returned_verbatim_until_expiry() {
    let (pool, _dir) = test_pool().await;
    let (near, _mid, _far) = seed_three_around_dc(&pool).await;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = Arc::new(InMemorySearchCache::new(CacheSettings {
        sliding_ttl: chrono::Duration::seconds(60),
        absolute_ttl: chrono::Duration::seconds(300),
        compression_threshold: 64,
    }));
    let svc = DirectoryService::new(pool.clone(), cache, clock.clone());

    let first = svc.search(criteria(10.0)).await.unwrap();
    assert_eq!(first.items.len(), 1);

    // Mutate the row behind the cache's back; a hit must return the cached
    // page verbatim, not re-filter
    sqlx::query("UPDATE inspectors SET last_name = 'Changed' WHERE id = ?")
        .bind(near)
        .execute(&pool)
        .await
        .unwrap();
    let second = svc.search(criteria(10.0)).await.unwrap();
    assert_eq!(second, first);

    // Past the sliding window the recomputed page sees the new data
    clock.advance(chrono::Duration::seconds(61));
    let third = svc.search(criteria(10.0)).await.unwrap();
    assert_eq!(third.items[0].last_name, "Changed");
}

//! Shared test fixtures for dispatch integration tests
#![allow(dead_code)] // not every test binary uses every helper

use chrono::{DateTime, Duration, Utc};
use fid_common::geo::GeoPoint;
use fid_common::models::{Certification, DrugTest, InspectorStatus};
use fid_ds::db::{self, inspectors};
use fid_ds::db::inspectors::NewInspector;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// File-backed pool in a temp directory; needed wherever the test exercises
/// concurrent connections (an in-memory SQLite db is per-connection)
pub async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = db::init_database(&dir.path().join("dispatch.db"))
        .await
        .expect("init test database");
    (pool, dir)
}

pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).unwrap()
}

/// Seed an inspector; statuses outside the creation rule are applied with a
/// direct update afterwards
pub async fn seed_inspector(
    pool: &SqlitePool,
    badge: &str,
    first_name: &str,
    last_name: &str,
    status: InspectorStatus,
    location: Option<GeoPoint>,
    certifications: &[&str],
) -> i64 {
    let create_status = match status {
        InspectorStatus::Inactive => InspectorStatus::Inactive,
        _ => InspectorStatus::Available,
    };
    let new = NewInspector {
        badge_number: badge.to_string(),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        status: create_status,
        location,
        certifications: certifications
            .iter()
            .map(|name| Certification {
                name: (*name).to_string(),
                issuing_authority: "test authority".to_string(),
                expires_at: None,
            })
            .collect(),
    };
    let id = inspectors::create_inspector(pool, &new, Utc::now())
        .await
        .expect("seed inspector");

    if status != create_status {
        sqlx::query("UPDATE inspectors SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(pool)
            .await
            .expect("set seeded status");
    }
    id
}

pub async fn soft_delete(pool: &SqlitePool, inspector_id: i64) {
    sqlx::query("UPDATE inspectors SET is_active = 0 WHERE id = ?")
        .bind(inspector_id)
        .execute(pool)
        .await
        .expect("soft delete inspector");
}

static KIT_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Seed a drug test dated `days_ago` relative to `reference`
pub async fn seed_drug_test(
    pool: &SqlitePool,
    inspector_id: i64,
    reference: DateTime<Utc>,
    days_ago: i64,
    result: Option<bool>,
) -> i64 {
    let kit = KIT_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let test = DrugTest {
        inspector_id,
        test_date: reference - Duration::days(days_ago),
        result,
        test_type: "urinalysis".to_string(),
        test_kit_id: format!("KIT-{inspector_id}-{kit}"),
        notes: None,
    };
    inspectors::record_drug_test(pool, &test)
        .await
        .expect("seed drug test")
}

pub async fn status_of(pool: &SqlitePool, inspector_id: i64) -> InspectorStatus {
    inspectors::get_by_id(pool, inspector_id)
        .await
        .expect("load inspector")
        .expect("inspector exists")
        .status
}

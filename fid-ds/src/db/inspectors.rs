//! Inspector entity queries
//!
//! Row extraction follows the shared models; all timestamps are stored as
//! UTC text. Functions that must run inside the mobilization transaction
//! are generic over the executor so the same query serves the pool and a
//! transaction handle.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use fid_common::geo::{BoundingBox, GeoPoint};
use fid_common::models::{Certification, DrugTest, Inspector, InspectorStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};
use std::collections::{HashMap, HashSet};

/// Administrative creation payload
///
/// New inspectors start as Inactive or Available only; the other states are
/// reachable solely through lifecycle transitions.
#[derive(Debug, Clone)]
pub struct NewInspector {
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: InspectorStatus,
    pub location: Option<GeoPoint>,
    pub certifications: Vec<Certification>,
}

fn row_to_inspector(row: &SqliteRow) -> Result<Inspector> {
    let status_str: String = row.get("status");
    let status = InspectorStatus::from_str(&status_str)
        .ok_or_else(|| Error::Internal(format!("unknown inspector status in row: {status_str}")))?;

    let latitude: Option<f64> = row.get("latitude");
    let longitude: Option<f64> = row.get("longitude");
    let location = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    };

    Ok(Inspector {
        id: row.get("id"),
        badge_number: row.get("badge_number"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        status,
        location,
        location_updated_at: row.get("location_updated_at"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Create an inspector with certifications in one transaction
///
/// Returns the assigned id. Badge numbers are unique across all inspectors;
/// a duplicate surfaces as the database's constraint violation.
pub async fn create_inspector(
    pool: &SqlitePool,
    new: &NewInspector,
    now: DateTime<Utc>,
) -> Result<i64> {
    if !matches!(
        new.status,
        InspectorStatus::Inactive | InspectorStatus::Available
    ) {
        return Err(Error::Validation(format!(
            "new inspectors must start as inactive or available, got {}",
            new.status
        )));
    }
    if new.badge_number.trim().is_empty() {
        return Err(Error::Validation("badge number must not be empty".into()));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO inspectors (
            badge_number, first_name, last_name, status,
            latitude, longitude, location_updated_at,
            is_active, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&new.badge_number)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(new.status.as_str())
    .bind(new.location.map(|p| p.latitude))
    .bind(new.location.map(|p| p.longitude))
    .bind(new.location.map(|_| now))
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let inspector_id = result.last_insert_rowid();

    for cert in &new.certifications {
        sqlx::query(
            "INSERT INTO certifications (inspector_id, name, issuing_authority, expires_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(inspector_id)
        .bind(&cert.name)
        .bind(&cert.issuing_authority)
        .bind(cert.expires_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(inspector_id)
}

/// Fetch a single inspector by id
pub async fn get_by_id<'e, E>(db: E, id: i64) -> Result<Option<Inspector>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query("SELECT * FROM inspectors WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    row.as_ref().map(row_to_inspector).transpose()
}

/// Fetch inspectors whose last-known location falls inside the bounding box
///
/// Coarse prefilter only: the caller applies the exact haversine cut.
/// Inspectors with no reported location never match a radius search.
pub async fn find_in_box(pool: &SqlitePool, bounds: BoundingBox) -> Result<Vec<Inspector>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM inspectors
        WHERE latitude IS NOT NULL AND longitude IS NOT NULL
          AND latitude BETWEEN ? AND ?
          AND longitude BETWEEN ? AND ?
        "#,
    )
    .bind(bounds.min_latitude)
    .bind(bounds.max_latitude)
    .bind(bounds.min_longitude)
    .bind(bounds.max_longitude)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_inspector).collect()
}

/// Lowercased certification names per inspector, for candidates in the box
pub async fn certification_names_in_box(
    pool: &SqlitePool,
    bounds: BoundingBox,
) -> Result<HashMap<i64, HashSet<String>>> {
    let rows = sqlx::query(
        r#"
        SELECT c.inspector_id, c.name
        FROM certifications c
        JOIN inspectors i ON i.id = c.inspector_id
        WHERE i.latitude IS NOT NULL AND i.longitude IS NOT NULL
          AND i.latitude BETWEEN ? AND ?
          AND i.longitude BETWEEN ? AND ?
        "#,
    )
    .bind(bounds.min_latitude)
    .bind(bounds.max_latitude)
    .bind(bounds.min_longitude)
    .bind(bounds.max_longitude)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i64, HashSet<String>> = HashMap::new();
    for row in rows {
        let inspector_id: i64 = row.get("inspector_id");
        let name: String = row.get("name");
        map.entry(inspector_id)
            .or_default()
            .insert(name.to_lowercase());
    }
    Ok(map)
}

/// Most recent passing drug test date per inspector, for candidates in the box
///
/// The maximum is folded in Rust rather than SQL so it never depends on the
/// lexicographic ordering of stored timestamp text.
pub async fn last_passing_test_dates_in_box(
    pool: &SqlitePool,
    bounds: BoundingBox,
) -> Result<HashMap<i64, DateTime<Utc>>> {
    let rows = sqlx::query(
        r#"
        SELECT t.inspector_id, t.test_date
        FROM drug_tests t
        JOIN inspectors i ON i.id = t.inspector_id
        WHERE t.result = 1
          AND i.latitude IS NOT NULL AND i.longitude IS NOT NULL
          AND i.latitude BETWEEN ? AND ?
          AND i.longitude BETWEEN ? AND ?
        "#,
    )
    .bind(bounds.min_latitude)
    .bind(bounds.max_latitude)
    .bind(bounds.min_longitude)
    .bind(bounds.max_longitude)
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i64, DateTime<Utc>> = HashMap::new();
    for row in rows {
        let inspector_id: i64 = row.get("inspector_id");
        let test_date: DateTime<Utc> = row.get("test_date");
        map.entry(inspector_id)
            .and_modify(|d| {
                if test_date > *d {
                    *d = test_date;
                }
            })
            .or_insert(test_date);
    }
    Ok(map)
}

/// All drug tests for an inspector, oldest first
pub async fn drug_tests_for<'e, E>(db: E, inspector_id: i64) -> Result<Vec<DrugTest>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT inspector_id, test_date, result, test_type, test_kit_id, notes
         FROM drug_tests WHERE inspector_id = ? ORDER BY test_date ASC",
    )
    .bind(inspector_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .iter()
        .map(|row| DrugTest {
            inspector_id: row.get("inspector_id"),
            test_date: row.get("test_date"),
            result: row.get("result"),
            test_type: row.get("test_type"),
            test_kit_id: row.get("test_kit_id"),
            notes: row.get("notes"),
        })
        .collect())
}

/// Record a newly administered drug test (result pending)
pub async fn record_drug_test(pool: &SqlitePool, test: &DrugTest) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO drug_tests (inspector_id, test_date, result, test_type, test_kit_id, notes)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(test.inspector_id)
    .bind(test.test_date)
    .bind(test.result)
    .bind(&test.test_type)
    .bind(&test.test_kit_id)
    .bind(&test.notes)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Record a test result, at most once
///
/// The guarded UPDATE only matches rows whose result is still pending, which
/// is what makes result recording single-write.
pub async fn record_test_result(pool: &SqlitePool, test_id: i64, result: bool) -> Result<()> {
    let outcome = sqlx::query("UPDATE drug_tests SET result = ? WHERE id = ? AND result IS NULL")
        .bind(result)
        .bind(test_id)
        .execute(pool)
        .await?;

    if outcome.rows_affected() == 1 {
        return Ok(());
    }

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM drug_tests WHERE id = ?")
        .bind(test_id)
        .fetch_optional(pool)
        .await?;
    match exists {
        None => Err(Error::NotFound(format!("drug test {test_id}"))),
        Some(_) => Err(Error::Validation(format!(
            "drug test {test_id} already has a recorded result"
        ))),
    }
}

/// Flip an Available inspector to Mobilized
///
/// Guarded UPDATE: zero rows affected means the inspector is no longer
/// Available (or was soft-deleted), which the caller reports as a rejection.
/// Run on the mobilization transaction as its first write so the status
/// check and the write-lock acquisition are a single atomic step.
pub async fn mark_mobilized<'e, E>(db: E, inspector_id: i64, now: DateTime<Utc>) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE inspectors SET status = 'mobilized', updated_at = ?
         WHERE id = ? AND status = 'available' AND is_active = 1",
    )
    .bind(now)
    .bind(inspector_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

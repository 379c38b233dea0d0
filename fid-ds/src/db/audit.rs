//! Audit record persistence
//!
//! Appends run on a caller-supplied executor. The mobilization workflow
//! passes its transaction handle, so a failed append rolls the status change
//! back with it: no status change without an audit entry, and vice versa.

use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::Sqlite;
use uuid::Uuid;

/// Append one audit record
pub async fn append<'e, E>(
    db: E,
    entity_type: &str,
    entity_id: i64,
    action: &str,
    change_payload: &serde_json::Value,
    actor: Uuid,
    timestamp: DateTime<Utc>,
) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_log (guid, entity_type, entity_id, action, change_payload, actor, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(entity_type)
    .bind(entity_id.to_string())
    .bind(action)
    .bind(change_payload.to_string())
    .bind(actor.to_string())
    .bind(timestamp)
    .execute(db)
    .await?;
    Ok(())
}

/// Count audit records for an entity and action (test support)
pub async fn count_for<'e, E>(db: E, entity_type: &str, entity_id: i64, action: &str) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_log WHERE entity_type = ? AND entity_id = ? AND action = ?",
    )
    .bind(entity_type)
    .bind(entity_id.to_string())
    .bind(action)
    .fetch_one(db)
    .await?;
    Ok(count)
}

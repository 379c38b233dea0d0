//! Mobilization workflow
//!
//! Transitions an Available inspector to Mobilized as one atomic unit with
//! its audit record. Eligibility is checked twice: a cheap pre-check before
//! any transaction is opened (fail fast, possibly against stale reads), and
//! the authoritative check inside the transaction against freshly loaded
//! rows. Collapsing the two into one would reintroduce the
//! time-of-check/time-of-use race between concurrent attempts.
//!
//! The transaction's first write is the guarded status UPDATE, which makes
//! SQLite's write-lock acquisition and the status re-check a single atomic
//! step: of two concurrent attempts, exactly one finds a matching row. A
//! loser is logged distinctly for observability but surfaces the same
//! rejection as fresh ineligibility; "was never eligible" and "became
//! ineligible concurrently" both mean "not eligible right now".
//!
//! At-most-once semantics: nothing here retries a failed transaction.
//! Dropping the in-flight future rolls the transaction back, so a
//! cancellation between first mutation and commit leaves no observable
//! partial state.

use crate::db::{audit, inspectors};
use crate::eligibility::{evaluate_mobilization, IneligibilityReason};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use fid_common::clock::Clock;
use fid_common::models::InspectorStatus;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

/// Maximum length of free-text mobilization notes
pub const MAX_NOTES_LEN: usize = 500;

/// Mobilize command
#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeRequest {
    pub requesting_user_id: Uuid,
    pub notes: Option<String>,
    /// Defaults to the invocation instant when absent
    pub mobilization_date: Option<DateTime<Utc>>,
}

/// Successful transition summary
#[derive(Debug, Clone)]
pub struct MobilizeOutcome {
    pub inspector_id: i64,
    pub prior_status: InspectorStatus,
    pub new_status: InspectorStatus,
    pub mobilization_date: DateTime<Utc>,
}

/// Execute the Available -> Mobilized transition
pub async fn mobilize(
    pool: &SqlitePool,
    clock: &dyn Clock,
    inspector_id: i64,
    request: &MobilizeRequest,
) -> Result<MobilizeOutcome> {
    if let Some(notes) = &request.notes {
        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(Error::Validation(format!(
                "notes must be at most {MAX_NOTES_LEN} characters"
            )));
        }
    }

    // The compliance window is measured from the invocation instant, never
    // from a caller-supplied date
    let now = clock.now();
    let mobilization_date = request.mobilization_date.unwrap_or(now);

    // Pre-check: cheap rejection before opening a transaction. May read
    // stale data; only the in-transaction check is authoritative.
    let inspector = inspectors::get_by_id(pool, inspector_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("inspector {inspector_id}")))?;
    let drug_tests = inspectors::drug_tests_for(pool, inspector_id).await?;
    evaluate_mobilization(&inspector, &drug_tests, now, mobilization_date)
        .map_err(Error::Domain)?;

    let mut tx = pool.begin().await?;

    // First write of the transaction: guarded flip. Zero rows affected
    // means the row is no longer Available (concurrent transition or stale
    // pre-check read).
    let flipped = inspectors::mark_mobilized(&mut *tx, inspector_id, now).await?;
    if flipped == 0 {
        let fresh = inspectors::get_by_id(&mut *tx, inspector_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("inspector {inspector_id}")))?;
        let reason = if fresh.is_active {
            IneligibilityReason::WrongStatus {
                actual: fresh.status,
            }
        } else {
            IneligibilityReason::NotActive
        };
        warn!(
            inspector_id,
            status = %fresh.status,
            "Mobilization lost in-transaction re-check (concurrent transition or stale pre-check)"
        );
        return Err(Error::Domain(reason));
    }

    // Authoritative compliance re-check on rows read under the write lock.
    // The guarded UPDATE already proved the pre-transition status was
    // Available and the record active, so evaluate against that state.
    let mut fresh = inspectors::get_by_id(&mut *tx, inspector_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("inspector {inspector_id}")))?;
    fresh.status = InspectorStatus::Available;
    let fresh_tests = inspectors::drug_tests_for(&mut *tx, inspector_id).await?;
    if let Err(reason) = evaluate_mobilization(&fresh, &fresh_tests, now, mobilization_date) {
        tx.rollback().await?;
        warn!(inspector_id, %reason, "Mobilization failed authoritative re-check");
        return Err(Error::Domain(reason));
    }

    // Audit entry rides the same transaction: an append failure rolls the
    // status change back with it
    let payload = serde_json::json!({
        "prior_status": InspectorStatus::Available,
        "new_status": InspectorStatus::Mobilized,
        "mobilization_date": mobilization_date,
        "notes": request.notes,
    });
    audit::append(
        &mut *tx,
        "inspector",
        inspector_id,
        "mobilize",
        &payload,
        request.requesting_user_id,
        now,
    )
    .await?;

    tx.commit().await?;

    info!(
        inspector_id,
        %mobilization_date,
        requested_by = %request.requesting_user_id,
        "Inspector mobilized"
    );

    Ok(MobilizeOutcome {
        inspector_id,
        prior_status: InspectorStatus::Available,
        new_status: InspectorStatus::Mobilized,
        mobilization_date,
    })
}

//! Mobilization eligibility evaluator
//!
//! Pure decision function over an inspector's current state and compliance
//! history. No I/O and no clock reads of its own: callers pass the instant
//! the decision is measured against, which is what makes the 90-day and
//! 30-day windows deterministically testable.
//!
//! The same function runs twice per mobilization: once as a cheap pre-check
//! against possibly-stale data, and once inside the transaction against a
//! freshly loaded record. Only the in-transaction run is authoritative.

use chrono::{DateTime, Duration, Utc};
use fid_common::models::{DrugTest, Inspector, InspectorStatus};
use serde::{Deserialize, Serialize};

/// Trailing window within which a passing drug test must fall
pub const COMPLIANCE_WINDOW_DAYS: i64 = 90;

/// Backdating tolerance on the requested mobilization date (clock skew)
pub const BACKDATE_TOLERANCE_DAYS: i64 = 1;

/// Furthest ahead a mobilization may be scheduled
pub const MAX_SCHEDULE_AHEAD_DAYS: i64 = 30;

/// Reason codes for a mobilization rejection
///
/// Serialized into API responses verbatim, so variants are stable names.
/// A concurrent transition that invalidates the in-transaction re-check
/// surfaces as `WrongStatus` just like a fresh ineligibility; callers cannot
/// distinguish "was never eligible" from "became ineligible concurrently".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibilityReason {
    /// Inspector record is soft-deleted
    NotActive,
    /// Current status is not Available
    WrongStatus { actual: InspectorStatus },
    /// No drug test with a passing result inside the compliance window
    NoPassingDrugTestInWindow,
    /// Requested mobilization date outside [now - 1 day, now + 30 days]
    MobilizationDateOutOfRange,
}

impl std::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibilityReason::NotActive => write!(f, "inspector is not active"),
            IneligibilityReason::WrongStatus { actual } => {
                write!(f, "inspector status is {actual}, expected available")
            }
            IneligibilityReason::NoPassingDrugTestInWindow => write!(
                f,
                "no passing drug test within the last {COMPLIANCE_WINDOW_DAYS} days"
            ),
            IneligibilityReason::MobilizationDateOutOfRange => write!(
                f,
                "mobilization date outside [now - {BACKDATE_TOLERANCE_DAYS} day, now + {MAX_SCHEDULE_AHEAD_DAYS} days]"
            ),
        }
    }
}

/// Decide whether an Available -> Mobilized transition is permitted
///
/// All preconditions must hold; the first violated one is returned.
/// Compliance looks for *some* passing test inside the window: a pending or
/// failing test more recent than a qualifying pass does not block.
pub fn evaluate_mobilization(
    inspector: &Inspector,
    drug_tests: &[DrugTest],
    now: DateTime<Utc>,
    mobilization_date: DateTime<Utc>,
) -> Result<(), IneligibilityReason> {
    if !inspector.is_active {
        return Err(IneligibilityReason::NotActive);
    }

    if inspector.status != InspectorStatus::Available {
        return Err(IneligibilityReason::WrongStatus {
            actual: inspector.status,
        });
    }

    let window_start = now - Duration::days(COMPLIANCE_WINDOW_DAYS);
    let has_qualifying_pass = drug_tests
        .iter()
        .any(|t| t.is_pass() && t.test_date >= window_start);
    if !has_qualifying_pass {
        return Err(IneligibilityReason::NoPassingDrugTestInWindow);
    }

    let earliest = now - Duration::days(BACKDATE_TOLERANCE_DAYS);
    let latest = now + Duration::days(MAX_SCHEDULE_AHEAD_DAYS);
    if mobilization_date < earliest || mobilization_date > latest {
        return Err(IneligibilityReason::MobilizationDateOutOfRange);
    }

    Ok(())
}

/// Most recent qualifying (passing) test date, if any
///
/// "Most recent qualifying test" means the greatest `test_date` among
/// passing tests, independent of any newer pending or failing tests.
pub fn last_passing_test_date(drug_tests: &[DrugTest]) -> Option<DateTime<Utc>> {
    drug_tests
        .iter()
        .filter(|t| t.is_pass())
        .map(|t| t.test_date)
        .max()
}

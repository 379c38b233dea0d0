//! Domain models for the inspector dispatch services
//!
//! Plain data types shared between the dispatch service and its tests.
//! Persistence mapping (row extraction, inserts) lives in the service's
//! `db` module; these types carry no storage concerns.

use crate::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inspector lifecycle status
///
/// Transitions: Inactive -> Available -> Mobilized -> Available -> ...
/// Suspended is reachable from any state and is terminal until an explicit
/// administrative reactivation. The dispatch core itself only performs the
/// Available -> Mobilized transition; everything else is administrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectorStatus {
    Inactive,
    Available,
    Mobilized,
    Suspended,
}

impl InspectorStatus {
    /// Database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectorStatus::Inactive => "inactive",
            InspectorStatus::Available => "available",
            InspectorStatus::Mobilized => "mobilized",
            InspectorStatus::Suspended => "suspended",
        }
    }

    /// Parse the database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inactive" => Some(InspectorStatus::Inactive),
            "available" => Some(InspectorStatus::Available),
            "mobilized" => Some(InspectorStatus::Mobilized),
            "suspended" => Some(InspectorStatus::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for InspectorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field inspector
///
/// `badge_number` is globally unique across all inspectors, active or not,
/// and immutable after creation. `is_active` is a soft-delete flag and is
/// independent of `status`. `location` is the last reported position and may
/// be stale; inspectors created before their first check-in have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspector {
    pub id: i64,
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: InspectorStatus,
    pub location: Option<GeoPoint>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A certification held by an inspector
///
/// Used only as a search filter; expiry is informational and not enforced by
/// the dispatch core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuing_authority: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A drug compliance test owned by exactly one inspector
///
/// `result` of `None` means the test is still pending. Once set, the result
/// is immutable (single-write, enforced at the persistence layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugTest {
    pub inspector_id: i64,
    pub test_date: DateTime<Utc>,
    pub result: Option<bool>,
    pub test_type: String,
    pub test_kit_id: String,
    pub notes: Option<String>,
}

impl DrugTest {
    /// True when the test has a recorded passing result
    pub fn is_pass(&self) -> bool {
        self.result == Some(true)
    }
}

/// Search result projection of an inspector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorSummary {
    pub id: i64,
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: InspectorStatus,
    pub distance_meters: f64,
    pub last_passing_test_date: Option<DateTime<Utc>>,
}

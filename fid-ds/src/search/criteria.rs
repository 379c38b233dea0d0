//! Search criteria: validation and canonicalization
//!
//! Criteria are validated before any storage access (fail fast) and then
//! canonicalized into a stable form: certification names lowercased,
//! deduplicated and sorted; absent optional filters rendered as explicit
//! defaults. Equivalent requests therefore collide on the same cache key.

use crate::error::{Error, Result};
use fid_common::geo::GeoPoint;
use fid_common::models::InspectorStatus;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Allowed search radius, statute miles
pub const MIN_RADIUS_MILES: f64 = 1.0;
pub const MAX_RADIUS_MILES: f64 = 500.0;

/// Allowed page size
pub const MIN_PAGE_SIZE: u32 = 1;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Most required-certification filters a single request may carry
pub const MAX_CERTIFICATION_FILTERS: usize = 10;

/// Sort key for search results
///
/// Distance ascending is always the implicit secondary key when it is not
/// the primary one, so geographically nearer results group on ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Distance,
    LastName,
    Status,
    LastDrugTestDate,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Distance => "distance",
            SortKey::LastName => "last_name",
            SortKey::Status => "status",
            SortKey::LastDrugTestDate => "last_drug_test_date",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        SortKey::Distance
    }
}

/// Normalized inspector search request
///
/// A value object, never persisted. `certifications` carries set semantics:
/// order-insensitive, matched case-insensitively by name with AND semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_miles: f64,
    #[serde(default)]
    pub status: Option<InspectorStatus>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default = "default_page_number")]
    pub page_number: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_descending: bool,
}

fn default_page_number() -> u32 {
    1
}

fn default_page_size() -> u32 {
    20
}

impl SearchCriteria {
    /// Reject malformed or out-of-range criteria before any storage access
    pub fn validate(&self) -> Result<()> {
        GeoPoint::new(self.latitude, self.longitude)
            .map_err(|e| Error::Validation(e.to_string()))?;

        if !(MIN_RADIUS_MILES..=MAX_RADIUS_MILES).contains(&self.radius_miles)
            || !self.radius_miles.is_finite()
        {
            return Err(Error::Validation(format!(
                "radius must be within [{MIN_RADIUS_MILES}, {MAX_RADIUS_MILES}] miles, got {}",
                self.radius_miles
            )));
        }

        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::Validation(format!(
                "page size must be within [{MIN_PAGE_SIZE}, {MAX_PAGE_SIZE}], got {}",
                self.page_size
            )));
        }

        if self.page_number < 1 {
            return Err(Error::Validation(format!(
                "page number must be >= 1, got {}",
                self.page_number
            )));
        }

        if self.certifications.len() > MAX_CERTIFICATION_FILTERS {
            return Err(Error::Validation(format!(
                "at most {MAX_CERTIFICATION_FILTERS} certification filters allowed, got {}",
                self.certifications.len()
            )));
        }

        Ok(())
    }

    /// The query point (assumes `validate` has passed)
    pub fn query_point(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Normalize into canonical form: certifications lowercased,
    /// deduplicated and sorted
    pub fn canonicalize(mut self) -> Self {
        let mut certs: Vec<String> = self
            .certifications
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        certs.sort();
        certs.dedup();
        self.certifications = certs;
        self
    }

    /// Stable serialization of the canonical form
    ///
    /// Fixed field order, fixed float precision, explicit `any` markers for
    /// absent optional filters.
    pub fn canonical_string(&self) -> String {
        format!(
            "lat={:.6};lon={:.6};radius={:.2};status={};certs={};active={};page={};size={};sort={};desc={}",
            self.latitude,
            self.longitude,
            self.radius_miles,
            self.status.map_or("any", |s| s.as_str()),
            self.certifications.join(","),
            self.is_active.map_or("any", |a| if a { "true" } else { "false" }),
            self.page_number,
            self.page_size,
            self.sort_by.as_str(),
            self.sort_descending,
        )
    }

    /// Cache key: hex SHA-256 digest of the canonical string
    pub fn cache_key(&self) -> String {
        format!("{:x}", Sha256::digest(self.canonical_string().as_bytes()))
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_number: u32,
    pub total_pages: u32,
}

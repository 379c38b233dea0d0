//! Inspector directory service
//!
//! Answers "which inspectors satisfy these criteria, within this radius,
//! ranked how?". Composes the criteria validation, the result cache, the
//! bounding-box storage fetch, the exact haversine cut, filtering, sorting
//! and pagination.
//!
//! Searches are read-only apart from best-effort cache writes and run with
//! unbounded concurrency. Identical criteria submitted concurrently may each
//! compute the result before one populates the cache; callers get eventual
//! coherence within the expiration window, nothing stronger.

pub mod criteria;

pub use criteria::{Page, SearchCriteria, SortKey};

use crate::cache::SearchCache;
use crate::db::inspectors;
use crate::error::{Error, Result};
use fid_common::clock::Clock;
use fid_common::geo::{self, BoundingBox};
use fid_common::models::{Inspector, InspectorSummary};
use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default internal deadline on the storage fetch
///
/// Distinct from any caller-supplied cancellation; bounds worst-case latency
/// of a slow scan. A timeout is a retrieval failure, never an empty page.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Directory search orchestrator
pub struct DirectoryService {
    pool: SqlitePool,
    cache: Arc<dyn SearchCache>,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
}

impl DirectoryService {
    pub fn new(pool: SqlitePool, cache: Arc<dyn SearchCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            cache,
            clock,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Run a search: validate, consult the cache, or compute and cache
    ///
    /// Cached pages are returned verbatim with no re-filtering. Storage
    /// failures propagate as-is; retry policy belongs to the caller.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<Page<InspectorSummary>> {
        criteria.validate()?;
        let criteria = criteria.canonicalize();
        let key = criteria.cache_key();
        let now = self.clock.now();

        if let Some(bytes) = self.cache.get(&key, now) {
            match serde_json::from_slice::<Page<InspectorSummary>>(&bytes) {
                Ok(page) => {
                    debug!("Search cache hit for key {key}");
                    return Ok(page);
                }
                Err(e) => {
                    // Best-effort cache: an unreadable entry is a miss
                    warn!("Cached search page failed to deserialize, recomputing: {e}");
                }
            }
        }

        let page = self.compute(&criteria).await?;

        match serde_json::to_vec(&page) {
            Ok(bytes) => self.cache.put(&key, &bytes, now),
            Err(e) => warn!("Search page failed to serialize for caching: {e}"),
        }

        Ok(page)
    }

    async fn compute(&self, criteria: &SearchCriteria) -> Result<Page<InspectorSummary>> {
        let center = criteria.query_point();
        let radius_meters = geo::miles_to_meters(criteria.radius_miles);
        let bounds = BoundingBox::around(center, radius_meters);

        let fetch = async {
            tokio::try_join!(
                inspectors::find_in_box(&self.pool, bounds),
                inspectors::certification_names_in_box(&self.pool, bounds),
                inspectors::last_passing_test_dates_in_box(&self.pool, bounds),
            )
        };
        let (candidates, cert_names, last_pass_dates) =
            tokio::time::timeout(self.fetch_timeout, fetch)
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "inspector radius fetch exceeded {}s",
                        self.fetch_timeout.as_secs()
                    ))
                })??;

        let required_certs: HashSet<&str> =
            criteria.certifications.iter().map(String::as_str).collect();

        let mut results: Vec<InspectorSummary> = candidates
            .into_iter()
            .filter_map(|inspector| {
                let location = inspector.location?;
                let distance = geo::distance_meters(center, location);
                if distance > radius_meters {
                    return None; // inside the box but outside the circle
                }
                if !matches_filters(&inspector, criteria, &required_certs, &cert_names) {
                    return None;
                }
                let last_passing_test_date = last_pass_dates.get(&inspector.id).copied();
                Some(InspectorSummary {
                    id: inspector.id,
                    badge_number: inspector.badge_number,
                    first_name: inspector.first_name,
                    last_name: inspector.last_name,
                    status: inspector.status,
                    distance_meters: distance,
                    last_passing_test_date,
                })
            })
            .collect();

        sort_results(&mut results, criteria.sort_by, criteria.sort_descending);

        let total_count = results.len() as u64;
        let page_size = criteria.page_size as u64;
        let total_pages = (total_count.div_ceil(page_size)) as u32;
        let offset = (criteria.page_number as usize - 1) * criteria.page_size as usize;
        let items: Vec<InspectorSummary> = results
            .into_iter()
            .skip(offset)
            .take(criteria.page_size as usize)
            .collect();

        Ok(Page {
            items,
            total_count,
            page_number: criteria.page_number,
            total_pages,
        })
    }
}

fn matches_filters(
    inspector: &Inspector,
    criteria: &SearchCriteria,
    required_certs: &HashSet<&str>,
    cert_names: &HashMap<i64, HashSet<String>>,
) -> bool {
    if let Some(status) = criteria.status {
        if inspector.status != status {
            return false;
        }
    }
    if let Some(is_active) = criteria.is_active {
        if inspector.is_active != is_active {
            return false;
        }
    }
    if !required_certs.is_empty() {
        // AND semantics: every required certification must be present,
        // matched case-insensitively (names were lowercased on both sides)
        let held = cert_names.get(&inspector.id);
        let all_present = required_certs
            .iter()
            .all(|req| held.is_some_and(|h| h.contains(*req)));
        if !all_present {
            return false;
        }
    }
    true
}

/// Sort by the requested key with distance ascending as the implicit
/// secondary key when it is not already the primary one
///
/// `sort_descending` reverses the primary key only, never the tie-break.
/// Last-name ordering is case-insensitive. For `LastDrugTestDate`, inspectors
/// with no passing test sort as oldest.
fn sort_results(results: &mut [InspectorSummary], sort_by: SortKey, sort_descending: bool) {
    results.sort_by(|a, b| {
        let primary = match sort_by {
            SortKey::Distance => compare_distance(a, b),
            SortKey::LastName => a
                .last_name
                .to_lowercase()
                .cmp(&b.last_name.to_lowercase()),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::LastDrugTestDate => a.last_passing_test_date.cmp(&b.last_passing_test_date),
        };
        let primary = if sort_descending {
            primary.reverse()
        } else {
            primary
        };
        match sort_by {
            SortKey::Distance => primary,
            _ => primary.then_with(|| compare_distance(a, b)),
        }
    });
}

fn compare_distance(a: &InspectorSummary, b: &InspectorSummary) -> Ordering {
    a.distance_meters
        .partial_cmp(&b.distance_meters)
        .unwrap_or(Ordering::Equal)
}

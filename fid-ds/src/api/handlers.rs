//! HTTP request handlers
//!
//! Error mapping follows the service taxonomy: validation rejections are
//! 400, domain rejections are 422 with their specific reason code (never a
//! generic failure), unknown entities are 404, and infrastructure trouble is
//! a 5xx the caller may retry under its own policy.

use crate::api::AppContext;
use crate::db::inspectors::{self, NewInspector};
use crate::eligibility::IneligibilityReason;
use crate::error::Error;
use crate::mobilize::{self, MobilizeRequest};
use crate::search::{Page, SearchCriteria};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use fid_common::models::{Certification, InspectorStatus, InspectorSummary};
use fid_common::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IneligibilityReason>,
}

#[derive(Debug, Deserialize)]
pub struct CertificationBody {
    pub name: String,
    #[serde(default)]
    pub issuing_authority: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInspectorRequest {
    pub badge_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_new_status")]
    pub status: InspectorStatus,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub certifications: Vec<CertificationBody>,
}

fn default_new_status() -> InspectorStatus {
    InspectorStatus::Inactive
}

#[derive(Debug, Serialize)]
pub struct CreateInspectorResponse {
    pub inspector_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MobilizeResponse {
    pub inspector_id: i64,
    pub status: InspectorStatus,
    pub mobilization_date: DateTime<Utc>,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: Error) -> HandlerError {
    let status = match &e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Domain(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Database(_)
        | Error::Config(_)
        | Error::Io(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {e}");
    }
    let reason = match &e {
        Error::Domain(reason) => Some(*reason),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            reason,
        }),
    )
}

// ============================================================================
// Search
// ============================================================================

/// POST /api/v1/inspectors/search
pub async fn search_inspectors(
    State(ctx): State<AppContext>,
    Json(criteria): Json<SearchCriteria>,
) -> Result<Json<Page<InspectorSummary>>, HandlerError> {
    let page = ctx.directory.search(criteria).await.map_err(error_response)?;
    Ok(Json(page))
}

// ============================================================================
// Mobilization
// ============================================================================

/// POST /api/v1/inspectors/:inspector_id/mobilize
pub async fn mobilize_inspector(
    State(ctx): State<AppContext>,
    Path(inspector_id): Path<i64>,
    Json(request): Json<MobilizeRequest>,
) -> Result<Json<MobilizeResponse>, HandlerError> {
    let outcome = mobilize::mobilize(&ctx.pool, ctx.clock.as_ref(), inspector_id, &request)
        .await
        .map_err(error_response)?;
    Ok(Json(MobilizeResponse {
        inspector_id: outcome.inspector_id,
        status: outcome.new_status,
        mobilization_date: outcome.mobilization_date,
    }))
}

// ============================================================================
// Administrative creation
// ============================================================================

/// POST /api/v1/inspectors
pub async fn create_inspector(
    State(ctx): State<AppContext>,
    Json(request): Json<CreateInspectorRequest>,
) -> Result<(StatusCode, Json<CreateInspectorResponse>), HandlerError> {
    let location = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => Some(
            GeoPoint::new(lat, lon)
                .map_err(|e| error_response(Error::Validation(e.to_string())))?,
        ),
        (None, None) => None,
        _ => {
            return Err(error_response(Error::Validation(
                "latitude and longitude must be supplied together".to_string(),
            )))
        }
    };

    let new = NewInspector {
        badge_number: request.badge_number,
        first_name: request.first_name,
        last_name: request.last_name,
        status: request.status,
        location,
        certifications: request
            .certifications
            .into_iter()
            .map(|c| Certification {
                name: c.name,
                issuing_authority: c.issuing_authority,
                expires_at: c.expires_at,
            })
            .collect(),
    };

    let now = ctx.clock.now();
    let inspector_id = inspectors::create_inspector(&ctx.pool, &new, now)
        .await
        .map_err(|e| match &e {
            // Duplicate badge number is the caller's mistake, not ours
            Error::Database(db_err)
                if db_err
                    .as_database_error()
                    .is_some_and(|d| d.is_unique_violation()) =>
            {
                (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: "badge number already in use".to_string(),
                        reason: None,
                    }),
                )
            }
            _ => error_response(e),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateInspectorResponse { inspector_id }),
    ))
}

//! Handlers for `/submissions` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/submissions` | Caller's history; optional `status`, `start_date`, `end_date`, `limit`, `offset`; admins may pass `volunteer_id` |
//! | `POST`  | `/submissions` | Body: [`SubmissionBody`]; returns 201 + pending submission |
//! | `GET`   | `/submissions/{id}` | Owner or admin |
//! | `PATCH` | `/submissions/{id}` | Body: [`SubmissionPatch`] |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::{
  store::{HoursStore, SubmissionQuery},
  submission::{NewSubmission, ServiceType, StatusKind, Submission, SubmissionPatch},
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub volunteer_id: Option<Uuid>,
  pub status:       Option<StatusKind>,
  /// Inclusive lower bound on the service date.
  pub start_date:   Option<NaiveDate>,
  /// Inclusive upper bound on the service date.
  pub end_date:     Option<NaiveDate>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl From<ListParams> for SubmissionQuery {
  fn from(p: ListParams) -> Self {
    SubmissionQuery {
      volunteer_id: p.volunteer_id,
      status:       p.status,
      service_from: p.start_date,
      service_to:   p.end_date,
      limit:        p.limit,
      offset:       p.offset,
    }
  }
}

/// `GET /submissions[?status=...][&start_date=...][&end_date=...]`
pub async fn list<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>, ApiError> {
  if let (Some(from), Some(to)) = (params.start_date, params.end_date)
    && from > to
  {
    return Err(ApiError::BadRequest("start_date is after end_date".into()));
  }
  Ok(Json(state.ledger.history(&actor, params.into()).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submissions`.
#[derive(Debug, Deserialize)]
pub struct SubmissionBody {
  /// Defaults to the caller; only administrators may name someone else.
  pub volunteer_id:    Option<Uuid>,
  pub activity_name:   String,
  pub service_type:    ServiceType,
  pub hours:           Decimal,
  pub service_date:    NaiveDate,
  pub description:     String,
  pub proof_reference: Option<String>,
  #[serde(default)]
  pub is_historical:   bool,
}

/// `POST /submissions`
pub async fn create<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Json(body): Json<SubmissionBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewSubmission {
    volunteer_id:    body.volunteer_id.unwrap_or(actor.user_id),
    activity_name:   body.activity_name,
    service_type:    body.service_type,
    hours:           body.hours,
    service_date:    body.service_date,
    description:     body.description,
    proof_reference: body.proof_reference,
    is_historical:   body.is_historical,
  };
  let submission = state.ledger.submit(&actor, input).await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── Single submission ───────────────────────────────────────────────────────

/// `GET /submissions/{id}`
pub async fn get_one<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Submission>, ApiError> {
  Ok(Json(state.ledger.get_submission(&actor, id).await?))
}

/// `PATCH /submissions/{id}`
pub async fn edit<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
  Json(patch): Json<SubmissionPatch>,
) -> Result<Json<Submission>, ApiError> {
  Ok(Json(state.ledger.edit(&actor, id, patch).await?))
}

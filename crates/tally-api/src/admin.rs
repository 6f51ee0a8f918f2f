//! Handlers for `/admin` endpoints. Every handler here requires an
//! administrator; the [`tally_core::Ledger`] enforces it.

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use tally_core::{
  lifecycle::Decision,
  store::{HoursStore, LedgerStats},
  submission::{StatusKind, Submission},
  volunteer::Volunteer,
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /admin/pending`
pub async fn pending<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<Vec<Submission>>, ApiError> {
  Ok(Json(state.ledger.pending(&actor).await?))
}

/// Body of `PUT /admin/submissions/{id}/review`.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub status:           StatusKind,
  pub rejection_reason: Option<String>,
}

/// `PUT /admin/submissions/{id}/review`
pub async fn review<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Submission>, ApiError> {
  let decision = Decision::from_parts(body.status, body.rejection_reason)?;
  Ok(Json(state.ledger.review(&actor, id, decision).await?))
}

/// `POST /admin/submissions/{id}/reopen`
pub async fn reopen<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Submission>, ApiError> {
  Ok(Json(state.ledger.reopen(&actor, id).await?))
}

/// `GET /admin/volunteers`
pub async fn volunteers<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<Vec<Volunteer>>, ApiError> {
  Ok(Json(state.ledger.volunteers(&actor).await?))
}

/// `POST /admin/volunteers/{id}/recompute`
pub async fn recompute<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Volunteer>, ApiError> {
  Ok(Json(state.ledger.recompute(&actor, id).await?))
}

/// `GET /admin/stats`
pub async fn stats<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<LedgerStats>, ApiError> {
  Ok(Json(state.ledger.stats(&actor).await?))
}

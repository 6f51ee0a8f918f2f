//! Handlers for account endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: [`RegisterBody`]; returns 201 + volunteer |
//! | `GET`  | `/volunteers/me` | Caller's dashboard |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tally_core::{
  ledger::Dashboard,
  store::HoursStore,
  volunteer::{NewVolunteer, Role},
};

use crate::{
  AppState,
  auth::{Authenticated, hash_password},
  error::ApiError,
};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:       String,
  pub full_name:   String,
  pub password:    String,
  /// Referral code of the volunteer who invited this one.
  pub referred_by: Option<String>,
}

/// `POST /auth/register`. Self-registration always creates a volunteer;
/// administrators are provisioned from the server CLI.
pub async fn register<S: HoursStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let volunteer = state
    .ledger
    .register(NewVolunteer {
      email:         body.email,
      full_name:     body.full_name,
      password_hash: hash_password(&body.password)?,
      role:          Role::Volunteer,
      referred_by:   body.referred_by,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(volunteer)))
}

/// `GET /volunteers/me`
pub async fn me<S: HoursStore>(
  State(state): State<AppState<S>>,
  Authenticated(actor): Authenticated,
) -> Result<Json<Dashboard>, ApiError> {
  Ok(Json(state.ledger.dashboard(&actor).await?))
}

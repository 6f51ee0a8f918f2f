//! HTTP Basic-auth extractor and password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;
use tally_core::{store::HoursStore, volunteer::Actor};

use crate::{AppState, error::ApiError};

/// The verified caller. Present in a handler means the request carried valid
/// credentials for a registered user.
pub struct Authenticated(pub Actor);

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}").into()))
}

/// Check `password` against a stored PHC string.
pub fn verify_password(password_hash: &str, password: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(password_hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

/// Pull `(email, password)` out of an `Authorization: Basic` header.
fn credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;
  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: HoursStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = credentials(&parts.headers)?;
    let Some(volunteer) = state.ledger.store().find_volunteer_by_email(&email).await? else {
      tracing::debug!(%email, "login for unknown email");
      return Err(ApiError::Unauthorized);
    };
    verify_password(&volunteer.password_hash, &password)?;
    Ok(Self(Actor { user_id: volunteer.volunteer_id, role: volunteer.role }))
  }
}

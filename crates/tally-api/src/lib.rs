//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by a [`Ledger`] over any
//! [`tally_core::store::HoursStore`]. Callers authenticate with HTTP Basic
//! credentials (`email:password`) checked against the volunteer record.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(Arc::new(Ledger::new(store))))
//! ```

pub mod admin;
pub mod auth;
pub mod error;
pub mod submissions;
pub mod volunteers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use tally_core::{Ledger, store::HoursStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub ledger: Arc<Ledger<S>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self { Self { ledger: Arc::clone(&self.ledger) } }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `ledger`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ledger: Arc<Ledger<S>>) -> Router<()>
where
  S: HoursStore + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/register", post(volunteers::register::<S>))
    .route("/volunteers/me", get(volunteers::me::<S>))
    // Submissions
    .route("/submissions", get(submissions::list::<S>).post(submissions::create::<S>))
    .route(
      "/submissions/{id}",
      get(submissions::get_one::<S>).patch(submissions::edit::<S>),
    )
    // Administration
    .route("/admin/pending", get(admin::pending::<S>))
    .route("/admin/submissions/{id}/review", put(admin::review::<S>))
    .route("/admin/submissions/{id}/reopen", post(admin::reopen::<S>))
    .route("/admin/volunteers", get(admin::volunteers::<S>))
    .route("/admin/volunteers/{id}/recompute", post(admin::recompute::<S>))
    .route("/admin/stats", get(admin::stats::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(AppState { ledger })
}

#[cfg(test)]
mod tests;

//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use serde_json::{Value, json};
use tally_core::{
  Ledger,
  volunteer::{NewVolunteer, Role},
};
use tally_store_sqlite::SqliteStore;
use tower::ServiceExt as _;

use crate::{api_router, auth::hash_password};

const ADMIN: (&str, &str) = ("admin@example.org", "admin-pass");
const VOLUNTEER: (&str, &str) = ("vol@example.org", "vol-pass");

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let ledger = Arc::new(Ledger::new(store));
  ledger
    .register(NewVolunteer {
      email:         ADMIN.0.into(),
      full_name:     "Admin".into(),
      password_hash: hash_password(ADMIN.1).unwrap(),
      role:          Role::Admin,
      referred_by:   None,
    })
    .await
    .unwrap();
  api_router(ledger)
}

fn basic((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn send(
  app: &Router,
  method: &str,
  uri: &str,
  creds: Option<(&str, &str)>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(creds) = creds {
    builder = builder.header(header::AUTHORIZATION, basic(creds));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_of(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() }
}

async fn register(app: &Router, (email, password): (&str, &str)) -> Response {
  let body = json!({ "email": email, "full_name": "Vol", "password": password });
  send(app, "POST", "/auth/register", None, Some(body)).await
}

async fn submit(app: &Router, hours: u32) -> Value {
  let body = json!({
    "activity_name": "Reading buddies",
    "service_type":  "Tutoring",
    "hours":         hours,
    "service_date":  Utc::now().date_naive().to_string(),
    "description":   "Read with second graders",
  });
  let resp = send(app, "POST", "/submissions", Some(VOLUNTEER), Some(body)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  json_of(resp).await
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_dashboard() {
  let app = app().await;
  let resp = register(&app, VOLUNTEER).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_of(resp).await;
  assert_eq!(created["email"], VOLUNTEER.0);
  assert!(created.get("password_hash").is_none());

  let resp = send(&app, "GET", "/volunteers/me", Some(VOLUNTEER), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let dash = json_of(resp).await;
  assert_eq!(dash["volunteer"]["tier"], "None");
  assert_eq!(dash["next_tier"]["tier"], "Kindness Ambassador");
}

#[tokio::test]
async fn duplicate_email_and_short_password_are_bad_requests() {
  let app = app().await;
  assert_eq!(register(&app, VOLUNTEER).await.status(), StatusCode::CREATED);
  assert_eq!(register(&app, VOLUNTEER).await.status(), StatusCode::BAD_REQUEST);

  let resp = register(&app, ("short@example.org", "abc")).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_of(resp).await["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn missing_credentials_get_a_challenge() {
  let app = app().await;
  let resp = send(&app, "GET", "/volunteers/me", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
  let app = app().await;
  register(&app, VOLUNTEER).await;
  let resp = send(&app, "GET", "/volunteers/me", Some((VOLUNTEER.0, "nope")), None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn approval_flows_into_dashboard() {
  let app = app().await;
  register(&app, VOLUNTEER).await;
  let submission = submit(&app, 10).await;
  assert_eq!(submission["status"], "pending");
  let id = submission["submission_id"].as_str().unwrap().to_owned();
  let review_uri = format!("/admin/submissions/{id}/review");

  let resp = send(
    &app,
    "PUT",
    &review_uri,
    Some(VOLUNTEER),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp =
    send(&app, "PUT", &review_uri, Some(ADMIN), Some(json!({ "status": "approved" }))).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_of(resp).await["status"], "approved");

  let dash = json_of(send(&app, "GET", "/volunteers/me", Some(VOLUNTEER), None).await).await;
  assert_eq!(dash["volunteer"]["total_hours"], "10");
  assert_eq!(dash["history"].as_array().unwrap().len(), 1);

  // Approved submissions are locked for their owner.
  let resp = send(
    &app,
    "PATCH",
    &format!("/submissions/{id}"),
    Some(VOLUNTEER),
    Some(json!({ "description": "changed" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn rejection_without_reason_is_a_bad_request() {
  let app = app().await;
  register(&app, VOLUNTEER).await;
  let id = submit(&app, 2).await["submission_id"].as_str().unwrap().to_owned();

  let resp = send(
    &app,
    "PUT",
    &format!("/admin/submissions/{id}/review"),
    Some(ADMIN),
    Some(json!({ "status": "rejected" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(
    &app,
    "PUT",
    &format!("/admin/submissions/{id}/review"),
    Some(ADMIN),
    Some(json!({ "status": "rejected", "rejection_reason": "no proof" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_of(resp).await["rejection_reason"], "no proof");
}

#[tokio::test]
async fn unknown_submission_is_not_found() {
  let app = app().await;
  let uri = format!("/admin/submissions/{}/reopen", uuid::Uuid::new_v4());
  let resp = send(&app, "POST", &uri, Some(ADMIN), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_is_scoped_and_filtered() {
  let app = app().await;
  register(&app, VOLUNTEER).await;
  submit(&app, 1).await;
  submit(&app, 2).await;

  let resp = send(&app, "GET", "/submissions?status=pending", Some(VOLUNTEER), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 2);

  let resp = send(&app, "GET", "/submissions?status=approved", Some(VOLUNTEER), None).await;
  assert!(json_of(resp).await.as_array().unwrap().is_empty());

  let resp = send(&app, "GET", "/admin/pending", Some(ADMIN), None).await;
  assert_eq!(json_of(resp).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn admin_overview_counts_volunteers_only() {
  let app = app().await;
  register(&app, VOLUNTEER).await;
  submit(&app, 3).await;

  let resp = send(&app, "GET", "/admin/stats", Some(ADMIN), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let stats = json_of(resp).await;
  assert_eq!(stats["total_volunteers"], 1);
  assert_eq!(stats["pending_submissions"], 1);

  let resp = send(&app, "GET", "/admin/volunteers", Some(VOLUNTEER), None).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

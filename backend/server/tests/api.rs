//! HTTP contract tests for the `/api` routes.
//!
//! Mail goes to an in-memory outbox, so nothing here needs network access.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use reqwest::Client;
use serde_json::{Value, json};
use server::{
    app,
    config::Config,
    notify::{Notification, Notifier, NotifyError},
    state::AppState,
    store::{ChallengeStore, MemoryStore},
};
use tower::ServiceExt;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<Notification>>,
    broken: AtomicBool,
}

impl Outbox {
    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, notification: Notification) -> Result<Value, NotifyError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 401,
                body: "API key authentication/authorization failure".into(),
            });
        }
        self.sent.lock().unwrap().push(notification);
        Ok(json!({ "Messages": [{ "Status": "success" }] }))
    }
}

struct Harness {
    app: Router,
    outbox: Arc<Outbox>,
    store: Arc<MemoryStore>,
}

fn harness() -> Harness {
    let outbox = Arc::new(Outbox::default());
    let store = Arc::new(MemoryStore::default());
    let state = AppState::with_parts(
        Config::default(),
        Client::new(),
        outbox.clone(),
        store.clone(),
    );

    Harness {
        app: app(state),
        outbox,
        store,
    }
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    call(app, request).await
}

#[tokio::test]
async fn test_issue_then_verify_once() {
    let h = harness();

    let (status, body) = post(&h.app, "/api/sendVerificationCode", json!({ "email": "a@b.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Verification code sent");

    let code = h.store.get("a@b.com").unwrap().code;
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(h.outbox.sent()[0].to_email.as_deref(), Some("a@b.com"));

    let (status, body) = post(&h.app, "/api/verifyCode", json!({ "email": "a@b.com", "code": "000000" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid or expired verification code");
    assert_eq!(h.store.get("a@b.com").unwrap().code, code);

    let (status, body) = post(&h.app, "/api/verifyCode", json!({ "email": "a@b.com", "code": code })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email verified successfully");
    assert!(h.store.get("a@b.com").is_none());

    let (status, _) = post(&h.app, "/api/verifyCode", json!({ "email": "a@b.com", "code": code })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_validates_email() {
    let h = harness();

    let (status, body) = post(&h.app, "/api/sendVerificationCode", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email is required");

    let (status, body) = post(&h.app, "/api/sendVerificationCode", json!({ "email": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please enter a valid email");
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_issue_hides_transport_detail() {
    let h = harness();
    h.outbox.broken.store(true, Ordering::SeqCst);

    let (status, body) = post(&h.app, "/api/sendVerificationCode", json!({ "email": "a@b.com" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Failed to send verification code" }));
}

#[tokio::test]
async fn test_verify_requires_both_fields() {
    let h = harness();

    let (status, body) = post(&h.app, "/api/verifyCode", json!({ "email": "a@b.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and code are required");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let h = harness();
    let request = Request::post("/api/verifyCode")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Malformed payload");
}

#[tokio::test]
async fn test_contact_sends_admin_and_thank_you() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/api/sendContactEmail",
        json!({ "name": "Jane", "email": "jane@example.com", "message": "Phone: +8801712345678" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Form submitted successfully, emails sent.");
    assert!(body["data"]["adminEmailResult"].is_object());
    assert!(body["data"]["userThankYouEmail"].is_object());

    let sent = h.outbox.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to_email, None);
    assert_eq!(
        sent[0].subject.as_deref(),
        Some("New Contact Form Submission from Jane")
    );
    assert_eq!(sent[1].to_email.as_deref(), Some("jane@example.com"));
}

#[tokio::test]
async fn test_contact_requires_fields() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/api/sendContactEmail",
        json!({ "name": "Jane", "email": "jane@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please provide name, email, and message.");
    assert!(h.outbox.sent().is_empty());
}

#[tokio::test]
async fn test_contact_transport_failure() {
    let h = harness();
    h.outbox.broken.store(true, Ordering::SeqCst);

    let (status, body) = post(
        &h.app,
        "/api/sendContactEmail",
        json!({ "name": "Jane", "email": "jane@example.com", "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Failed to send email" }));
}

#[tokio::test]
async fn test_partial_accepts_text_body() {
    let h = harness();
    let request = Request::post("/api/sendPartialFormData")
        .header(CONTENT_TYPE, "text/plain;charset=UTF-8")
        .body(Body::from(
            json!({
                "name": "Jane",
                "email": "",
                "currentStep": 2,
                "message": "ABANDONED - User left at Step 2",
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Partial form data sent to admin.");

    let sent = h.outbox.sent();
    assert_eq!(
        sent[0].subject.as_deref(),
        Some("Partial Form Submission from Jane")
    );
    assert_eq!(
        sent[0].message.as_deref(),
        Some("Name: Jane\nMessage: ABANDONED - User left at Step 2\ncurrentStep: 2")
    );
}

#[tokio::test]
async fn test_partial_garbage_still_reports() {
    let h = harness();
    let request = Request::post("/api/sendPartialFormData")
        .body(Body::from("garbage"))
        .unwrap();

    let (status, _) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        h.outbox.sent()[0].message.as_deref(),
        Some("User exited the form without submitting any data.")
    );
}

#[tokio::test]
async fn test_partial_transport_failure() {
    let h = harness();
    h.outbox.broken.store(true, Ordering::SeqCst);

    let (status, body) = post(&h.app, "/api/sendPartialFormData", json!({ "name": "Jane" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to send partial form data");
}

#[tokio::test]
async fn test_booking_validates_before_calling_provider() {
    let h = harness();

    let (status, body) = post(&h.app, "/api/createBooking", json!({ "email": "jane@example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name and email are required.");

    let (status, body) = post(&h.app, "/api/getAvailableTimes", json!({ "startDate": "2026-11-01" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "startDate and endDate are required.");
}

#[tokio::test]
async fn test_unconfigured_provider_is_generic_failure() {
    let h = harness();

    let (status, body) = post(
        &h.app,
        "/api/createCalendlyLink",
        json!({ "name": "Jane", "email": "jane@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Failed to create booking" }));

    let request = Request::get("/api/eventTypes").body(Body::empty()).unwrap();
    let (status, body) = call(&h.app, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to fetch event types");
}

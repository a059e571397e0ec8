use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use wizard::validate::is_email;

use crate::{
    error::AppError,
    scheduling::{Booking, BookingRequest, SlotQuery},
    state::AppState,
    utils::{contact_notifications, parse_partial, partial_notification},
};

type Payload<T> = Result<Json<T>, JsonRejection>;

fn require_email(email: &str) -> Result<(), AppError> {
    if is_email(email) {
        Ok(())
    } else {
        Err(AppError::invalid("Please enter a valid email"))
    }
}

#[derive(Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    email: String,
}

pub async fn send_verification_code(
    State(state): State<Arc<AppState>>,
    payload: Payload<CodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if payload.email.is_empty() {
        return Err(AppError::invalid("Email is required"));
    }
    require_email(&payload.email)?;

    state
        .verifier
        .issue(&payload.email)
        .await
        .map_err(AppError::from_verification("Failed to send verification code"))?;

    Ok(Json(json!({ "message": "Verification code sent" })))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    code: String,
}

pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    payload: Payload<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if payload.email.is_empty() || payload.code.is_empty() {
        return Err(AppError::invalid("Email and code are required"));
    }

    state
        .verifier
        .verify(&payload.email, &payload.code)
        .map_err(AppError::from_verification("Failed to verify code"))?;

    Ok(Json(json!({ "message": "Email verified successfully" })))
}

#[derive(Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
}

pub async fn send_contact_email(
    State(state): State<Arc<AppState>>,
    payload: Payload<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if payload.name.is_empty() || payload.email.is_empty() || payload.message.is_empty() {
        return Err(AppError::invalid("Please provide name, email, and message."));
    }
    require_email(&payload.email)?;

    let (admin, thank_you) = contact_notifications(
        &payload.name,
        &payload.email,
        &payload.message,
        &state.config.mail.from_name,
    );

    let admin_email_result = state
        .notifier
        .send(admin)
        .await
        .map_err(AppError::upstream("Failed to send email"))?;
    let user_thank_you_email = state
        .notifier
        .send(thank_you)
        .await
        .map_err(AppError::upstream("Failed to send email"))?;

    info!("Contact submission relayed for {}", payload.email);

    Ok(Json(json!({
        "message": "Form submitted successfully, emails sent.",
        "data": {
            "adminEmailResult": admin_email_result,
            "userThankYouEmail": user_thank_you_email,
        },
    })))
}

pub async fn send_partial_form_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let fields = parse_partial(&body);
    let notification = partial_notification(&fields);

    let data = state
        .notifier
        .send(notification)
        .await
        .map_err(AppError::upstream("Failed to send partial form data"))?;

    Ok(Json(json!({
        "message": "Partial form data sent to admin.",
        "data": data,
    })))
}

pub async fn event_types(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let event_types = state
        .scheduler
        .list_event_types()
        .await
        .map_err(AppError::from_scheduling("Failed to fetch event types"))?;

    Ok(Json(json!({
        "message": "Event types fetched successfully",
        "eventTypes": event_types,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsRequest {
    event_type_slug: Option<String>,
    #[serde(default)]
    start_date: String,
    #[serde(default)]
    end_date: String,
    timezone: Option<String>,
}

pub async fn available_times(
    State(state): State<Arc<AppState>>,
    payload: Payload<SlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if payload.start_date.is_empty() || payload.end_date.is_empty() {
        return Err(AppError::invalid("startDate and endDate are required."));
    }

    let query = SlotQuery {
        event_type: payload.event_type_slug,
        start: payload.start_date,
        end: payload.end_date,
        timezone: payload
            .timezone
            .unwrap_or_else(|| state.config.default_timezone.clone()),
    };

    let slots = state
        .scheduler
        .available_slots(&query)
        .await
        .map_err(AppError::from_scheduling("Failed to fetch slots"))?;

    Ok(Json(json!({
        "message": "Available slots fetched successfully",
        "timezone": query.timezone,
        "slots": slots,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    timezone: Option<String>,
    start_time: Option<String>,
    event_type_id: Option<i64>,
    event_type_slug: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Payload<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    if payload.name.is_empty() || payload.email.is_empty() {
        return Err(AppError::invalid("Name and email are required."));
    }
    require_email(&payload.email)?;

    let request = BookingRequest {
        name: payload.name,
        email: payload.email,
        timezone: payload
            .timezone
            .unwrap_or_else(|| state.config.default_timezone.clone()),
        start_time: payload.start_time,
        event_type_id: payload.event_type_id,
        event_type_slug: payload.event_type_slug,
    };

    let booking = state
        .scheduler
        .create_booking(&request)
        .await
        .map_err(AppError::from_scheduling("Failed to create booking"))?;

    info!("{} booking created for {}", state.scheduler.name(), request.email);

    Ok(match booking {
        Booking::Link(booking_url) => (
            StatusCode::OK,
            Json(json!({
                "message": "Booking link created successfully",
                "bookingUrl": booking_url,
            })),
        ),
        Booking::Confirmed(booking) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Booking created successfully",
                "booking": booking,
            })),
        ),
    })
}

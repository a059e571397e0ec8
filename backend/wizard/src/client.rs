use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::snapshot::{Snapshot, Submission};

pub const DEFAULT_BASE_URL: &str = "http://localhost:4040/api";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

/// What the scheduling provider handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Booking {
    /// Booking exists on the calendar.
    Confirmed(Value),
    /// Visitor still has to pick a slot on the provider's page.
    Link(String),
}

/// The server endpoints the wizard talks to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send_verification_code(&self, email: &str) -> Result<(), ClientError>;

    async fn verify_code(&self, email: &str, code: &str) -> Result<(), ClientError>;

    async fn send_contact_email(&self, submission: &Submission) -> Result<(), ClientError>;

    async fn send_partial_form_data(&self, snapshot: &Snapshot) -> Result<(), ClientError>;

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Reply {
    #[serde(default)]
    message: String,
    booking_url: Option<String>,
    booking: Option<Value>,
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Reply, ClientError> {
        let response = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        read_reply(response).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

async fn read_reply(response: Response) -> Result<Reply, ClientError> {
    let status = response.status();
    let reply = response.json::<Reply>().await.unwrap_or(Reply {
        message: status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        booking_url: None,
        booking: None,
    });

    if status.is_success() {
        Ok(reply)
    } else if status.is_client_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message: reply.message,
        })
    } else {
        Err(ClientError::Server {
            status: status.as_u16(),
            message: reply.message,
        })
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn send_verification_code(&self, email: &str) -> Result<(), ClientError> {
        self.post("sendVerificationCode", &json!({ "email": email }))
            .await
            .map(|_| ())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<(), ClientError> {
        self.post("verifyCode", &json!({ "email": email, "code": code }))
            .await
            .map(|_| ())
    }

    async fn send_contact_email(&self, submission: &Submission) -> Result<(), ClientError> {
        self.post("sendContactEmail", submission).await.map(|_| ())
    }

    async fn send_partial_form_data(&self, snapshot: &Snapshot) -> Result<(), ClientError> {
        self.post("sendPartialFormData", snapshot).await.map(|_| ())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
        let reply = self.post("createBooking", request).await?;

        Ok(match (reply.booking_url, reply.booking) {
            (Some(url), _) => Booking::Link(url),
            (None, booking) => Booking::Confirmed(booking.unwrap_or(Value::Null)),
        })
    }
}

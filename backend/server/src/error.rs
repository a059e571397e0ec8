use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::{scheduling::SchedulingError, verification::VerificationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload(#[from] JsonRejection),

    #[error("{0}")]
    Invalid(String),

    #[error("Invalid or expired verification code")]
    ChallengeMismatch,

    /// Provider detail goes to the log, never to the caller.
    #[error("{context}")]
    Upstream {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Invalid(message.into())
    }

    pub fn upstream<E>(context: &'static str) -> impl FnOnce(E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        move |source| AppError::Upstream {
            context,
            source: source.into(),
        }
    }

    pub fn from_verification(context: &'static str) -> impl FnOnce(VerificationError) -> Self {
        move |e| match e {
            VerificationError::Mismatch => AppError::ChallengeMismatch,
            VerificationError::Delivery(source) => AppError::Upstream {
                context,
                source: source.into(),
            },
        }
    }

    pub fn from_scheduling(context: &'static str) -> impl FnOnce(SchedulingError) -> Self {
        move |e| match e {
            SchedulingError::Invalid(message) => AppError::Invalid(message.to_string()),
            other => AppError::Upstream {
                context,
                source: other.into(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload(rejection) => {
                warn!("Rejected payload: {rejection}");
                StatusCode::BAD_REQUEST
            }
            AppError::Invalid { .. } | AppError::ChallengeMismatch => StatusCode::BAD_REQUEST,
            AppError::Upstream { context, source } => {
                error!("{context}: {source}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    notify::{Notification, Notifier, NotifyError},
    store::{Challenge, ChallengeStore},
};

pub const CODE_SUBJECT: &str = "SEO Verification Code";

#[derive(Error, Debug)]
pub enum VerificationError {
    /// No live challenge, or the code differs. Callers cannot tell which.
    #[error("Invalid or expired verification code")]
    Mismatch,

    #[error(transparent)]
    Delivery(#[from] NotifyError),
}

pub struct Verifier {
    store: Arc<dyn ChallengeStore>,
    notifier: Arc<dyn Notifier>,
    ttl: TimeDelta,
}

impl Verifier {
    pub fn new(store: Arc<dyn ChallengeStore>, notifier: Arc<dyn Notifier>, ttl: TimeDelta) -> Self {
        Self {
            store,
            notifier,
            ttl,
        }
    }

    /// Stores a fresh code for `email`, replacing any earlier one, and mails it.
    pub async fn issue(&self, email: &str) -> Result<(), VerificationError> {
        let code = generate_code();

        self.store.set(
            email,
            Challenge {
                code: code.clone(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        debug!("Stored verification challenge for {email}");

        self.notifier
            .send(Notification {
                to_email: Some(email.to_string()),
                subject: Some(CODE_SUBJECT.to_string()),
                message: Some(format!("Your email verification code is: {code}")),
                ..Notification::default()
            })
            .await?;

        info!("Verification code sent to {email}");
        Ok(())
    }

    /// Single use. A failed attempt leaves the stored challenge alone, and a code issued
    /// concurrently is never replaced by an older one.
    pub fn verify(&self, email: &str, code: &str) -> Result<(), VerificationError> {
        if !self.store.take_if(email, code) {
            return Err(VerificationError::Mismatch);
        }

        info!("Email {email} verified");
        Ok(())
    }
}

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

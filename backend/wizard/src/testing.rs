use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    client::{Backend, Booking, BookingRequest, ClientError},
    snapshot::{Snapshot, Submission},
};

const CODE: &str = "482913";

/// In-process stand-in for the HTTP backend.
pub struct MockBackend {
    pub broken: AtomicBool,
    latency: Duration,
    codes: Mutex<HashMap<String, String>>,
    submissions: Mutex<Vec<Submission>>,
    partials_tx: UnboundedSender<Snapshot>,
    partials_rx: Mutex<Option<UnboundedReceiver<Snapshot>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// Partial reports take `latency` before they land.
    pub fn with_latency(latency: Duration) -> Self {
        let (partials_tx, partials_rx) = unbounded_channel();

        Self {
            broken: AtomicBool::new(false),
            latency,
            codes: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            partials_tx,
            partials_rx: Mutex::new(Some(partials_rx)),
        }
    }

    pub fn last_code(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).cloned()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn take_partials(&self) -> UnboundedReceiver<Snapshot> {
        self.partials_rx.lock().unwrap().take().expect("partials taken once")
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(ClientError::Server {
                status: 500,
                message: "Failed to send email".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn send_verification_code(&self, email: &str) -> Result<(), ClientError> {
        self.check()?;
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), CODE.to_string());
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<(), ClientError> {
        let mut codes = self.codes.lock().unwrap();
        if codes.get(email).is_some_and(|stored| stored == code) {
            codes.remove(email);
            Ok(())
        } else {
            Err(ClientError::Rejected {
                status: 400,
                message: "Invalid or expired verification code".into(),
            })
        }
    }

    async fn send_contact_email(&self, submission: &Submission) -> Result<(), ClientError> {
        self.check()?;
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(())
    }

    async fn send_partial_form_data(&self, snapshot: &Snapshot) -> Result<(), ClientError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let _ = self.partials_tx.send(snapshot.clone());
        self.check()
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ClientError> {
        self.check()?;
        Ok(match &request.start_time {
            Some(start) => Booking::Confirmed(json!({ "start": start, "attendee": request.name })),
            None => Booking::Link(format!("https://calendly.com/d/abc?name={}", request.name)),
        })
    }
}

use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{ProviderKind, SchedulingConfig};

const CALCOM_SLOTS_VERSION: &str = "2024-09-04";
const CALCOM_BOOKINGS_VERSION: &str = "2024-08-13";

#[derive(Error, Debug)]
pub enum SchedulingError {
    /// Caller supplied something the provider cannot use.
    #[error("{0}")]
    Invalid(&'static str),

    #[error("Scheduling provider is not configured: {0} missing")]
    Misconfigured(&'static str),

    #[error("Scheduling provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Scheduling provider returned an unexpected response: {0}")]
    Unexpected(&'static str),

    #[error("Scheduling request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub event_type: Option<String>,
    pub start: String,
    pub end: String,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub timezone: String,
    pub start_time: Option<String>,
    pub event_type_id: Option<i64>,
    pub event_type_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Booking {
    /// Single-use link the attendee finishes booking on.
    Link(String),
    Confirmed(Value),
}

/// The one calendar integration this deployment talks to.
pub enum SchedulingProvider {
    Calendly(Calendly),
    CalcomDirect(Calcom),
}

impl SchedulingProvider {
    pub fn from_config(client: Client, config: &SchedulingConfig) -> Self {
        match config.provider {
            ProviderKind::Calendly => SchedulingProvider::Calendly(Calendly {
                client,
                base_url: config.calendly_url.clone(),
                token: config.calendly_token.clone(),
                user_uri: config.calendly_user_uri.clone(),
                event_type_uri: config.calendly_event_type_uri.clone(),
            }),
            ProviderKind::Calcom => SchedulingProvider::CalcomDirect(Calcom {
                client,
                base_url: config.calcom_url.clone(),
                api_key: config.calcom_api_key.clone(),
                username: config.calcom_username.clone(),
                event_type_slug: config.calcom_event_type_slug.clone(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchedulingProvider::Calendly(_) => "Calendly",
            SchedulingProvider::CalcomDirect(_) => "Cal.com",
        }
    }

    pub async fn list_event_types(&self) -> Result<Value, SchedulingError> {
        match self {
            SchedulingProvider::Calendly(calendly) => calendly.list_event_types().await,
            SchedulingProvider::CalcomDirect(calcom) => calcom.list_event_types().await,
        }
    }

    pub async fn available_slots(&self, query: &SlotQuery) -> Result<Value, SchedulingError> {
        match self {
            SchedulingProvider::Calendly(calendly) => calendly.available_slots(query).await,
            SchedulingProvider::CalcomDirect(calcom) => calcom.available_slots(query).await,
        }
    }

    pub async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, SchedulingError> {
        match self {
            SchedulingProvider::Calendly(calendly) => calendly.create_booking(request).await,
            SchedulingProvider::CalcomDirect(calcom) => calcom.create_booking(request).await,
        }
    }
}

async fn send(request: RequestBuilder) -> Result<Value, SchedulingError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(SchedulingError::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    Ok(response.json::<Value>().await?)
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, SchedulingError> {
    value.as_deref().ok_or(SchedulingError::Misconfigured(name))
}

pub struct Calendly {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_uri: Option<String>,
    event_type_uri: Option<String>,
}

impl Calendly {
    fn get(&self, path: &str) -> Result<RequestBuilder, SchedulingError> {
        let token = required(&self.token, "CALENDLY_TOKEN")?;
        Ok(self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token))
    }

    async fn list_event_types(&self) -> Result<Value, SchedulingError> {
        let request = self.get("/event_types")?;
        let user = required(&self.user_uri, "CALENDLY_USER_URI")?;
        let body = send(request.query(&[("user", user)])).await?;

        Ok(collection(body))
    }

    async fn available_slots(&self, query: &SlotQuery) -> Result<Value, SchedulingError> {
        let event_type = match &query.event_type {
            Some(event_type) => event_type.as_str(),
            None => required(&self.event_type_uri, "CALENDLY_EVENT_TYPE_URI")?,
        };

        let request = self.get("/event_type_available_times")?.query(&[
            ("event_type", event_type),
            ("start_time", query.start.as_str()),
            ("end_time", query.end.as_str()),
        ]);
        let body = send(request).await?;

        Ok(collection(body))
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, SchedulingError> {
        let token = required(&self.token, "CALENDLY_TOKEN")?;
        let owner = required(&self.event_type_uri, "CALENDLY_EVENT_TYPE_URI")?;

        let body = send(
            self.client
                .post(format!("{}/scheduling_links", self.base_url))
                .bearer_auth(token)
                .json(&json!({
                    "max_event_count": 1,
                    "owner": owner,
                    "owner_type": "EventType",
                })),
        )
        .await?;
        debug!("Calendly scheduling link created: {body}");

        prefilled_link(&body, request).map(Booking::Link)
    }
}

/// Calendly wraps lists in `collection`.
fn collection(mut body: Value) -> Value {
    match body.get_mut("collection") {
        Some(collection) => collection.take(),
        None => body,
    }
}

fn prefilled_link(body: &Value, request: &BookingRequest) -> Result<String, SchedulingError> {
    let base = ["/resource/booking_url", "/data/resource/booking_url", "/data/booking_url"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
        .ok_or(SchedulingError::Unexpected("booking_url missing"))?;

    let mut url = Url::parse(base).map_err(|_| SchedulingError::Unexpected("booking_url invalid"))?;
    url.query_pairs_mut()
        .append_pair("name", &request.name)
        .append_pair("email", &request.email)
        .append_pair("timezone", &request.timezone);

    Ok(url.into())
}

pub struct Calcom {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    username: Option<String>,
    event_type_slug: Option<String>,
}

impl Calcom {
    fn request(&self, request: RequestBuilder) -> Result<RequestBuilder, SchedulingError> {
        let api_key = required(&self.api_key, "CALCOM_API_KEY")?;
        Ok(request.bearer_auth(api_key))
    }

    async fn list_event_types(&self) -> Result<Value, SchedulingError> {
        let request = self.request(self.client.get(format!("{}/event-types", self.base_url)))?;

        send(request).await
    }

    async fn available_slots(&self, query: &SlotQuery) -> Result<Value, SchedulingError> {
        let username = required(&self.username, "CALCOM_USERNAME")?;
        let slug = match &query.event_type {
            Some(slug) => slug.as_str(),
            None => required(&self.event_type_slug, "CALCOM_EVENT_TYPE_SLUG")?,
        };

        let request = self.request(
            self.client
                .get(format!("{}/slots", self.base_url))
                .header("cal-api-version", CALCOM_SLOTS_VERSION)
                .query(&[
                    ("eventTypeSlug", slug),
                    ("username", username),
                    ("start", query.start.as_str()),
                    ("end", query.end.as_str()),
                    ("timeZone", query.timezone.as_str()),
                    ("format", "range"),
                ]),
        )?;

        send(request).await
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, SchedulingError> {
        let payload = self.booking_payload(request)?;
        let request = self.request(
            self.client
                .post(format!("{}/bookings", self.base_url))
                .header("cal-api-version", CALCOM_BOOKINGS_VERSION)
                .json(&payload),
        )?;

        send(request).await.map(Booking::Confirmed)
    }

    fn booking_payload(&self, request: &BookingRequest) -> Result<Value, SchedulingError> {
        let start = request
            .start_time
            .as_deref()
            .ok_or(SchedulingError::Invalid("startTime is required to book on Cal.com."))?;

        let mut payload = json!({
            "start": start,
            "attendee": {
                "name": request.name,
                "email": request.email,
                "timeZone": request.timezone,
            },
        });

        if let Some(id) = request.event_type_id {
            payload["eventTypeId"] = json!(id);
        } else {
            let slug = match &request.event_type_slug {
                Some(slug) => slug.as_str(),
                None => required(&self.event_type_slug, "CALCOM_EVENT_TYPE_SLUG")?,
            };
            payload["eventTypeSlug"] = json!(slug);
            payload["username"] = json!(required(&self.username, "CALCOM_USERNAME")?);
        }

        Ok(payload)
    }
}

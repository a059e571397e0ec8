use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Context, anyhow};
use chrono::TimeDelta;
use tracing::{info, warn};

pub const MAILJET_URL: &str = "https://api.mailjet.com/v3.1/send";
pub const CALENDLY_URL: &str = "https://api.calendly.com";
pub const CALCOM_URL: &str = "https://api.cal.com/v2";

pub struct Config {
    pub port: u16,
    pub otp_ttl: TimeDelta,
    pub default_timezone: String,
    pub mail: MailConfig,
    pub scheduling: SchedulingConfig,
}

/// Mailjet settings. Missing credentials only fail when a message is sent.
#[derive(Clone)]
pub struct MailConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub from_email: Option<String>,
    pub from_name: String,
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Calendly,
    Calcom,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "calendly" => Ok(ProviderKind::Calendly),
            "calcom" | "cal.com" => Ok(ProviderKind::Calcom),
            other => Err(anyhow!("unknown scheduling provider {other:?}")),
        }
    }
}

#[derive(Clone)]
pub struct SchedulingConfig {
    pub provider: ProviderKind,
    pub calendly_url: String,
    pub calendly_token: Option<String>,
    pub calendly_user_uri: Option<String>,
    pub calendly_event_type_uri: Option<String>,
    pub calcom_url: String,
    pub calcom_api_key: Option<String>,
    pub calcom_username: Option<String>,
    pub calcom_event_type_slug: Option<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let otp_ttl_secs: i64 = try_load("OTP_TTL_SECS", "600")?;

        Ok(Self {
            port: try_load("RUST_PORT", "4040")?,
            otp_ttl: TimeDelta::try_seconds(otp_ttl_secs)
                .context("OTP_TTL_SECS out of range")?,
            default_timezone: try_load("DEFAULT_TIMEZONE", "Asia/Dhaka")?,
            mail: MailConfig {
                url: try_load("MAILJET_URL", MAILJET_URL)?,
                api_key: read_secret("MJ_API_KEY"),
                api_secret: read_secret("MJ_API_SECRET"),
                from_email: var("FROM_EMAIL"),
                from_name: try_load("FROM_NAME", "Consultation Desk")?,
                admin_email: var("TO_EMAIL"),
            },
            scheduling: SchedulingConfig {
                provider: try_load("SCHEDULING_PROVIDER", "calendly")?,
                calendly_url: try_load("CALENDLY_URL", CALENDLY_URL)?,
                calendly_token: read_secret("CALENDLY_TOKEN"),
                calendly_user_uri: var("CALENDLY_USER_URI"),
                calendly_event_type_uri: var("CALENDLY_EVENT_TYPE_URI"),
                calcom_url: try_load("CALCOM_URL", CALCOM_URL)?,
                calcom_api_key: read_secret("CALCOM_API_KEY"),
                calcom_username: var("CALCOM_USERNAME"),
                calcom_event_type_slug: var("CALCOM_EVENT_TYPE_SLUG"),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4040,
            otp_ttl: TimeDelta::minutes(10),
            default_timezone: "Asia/Dhaka".to_string(),
            mail: MailConfig {
                url: MAILJET_URL.to_string(),
                api_key: None,
                api_secret: None,
                from_email: None,
                from_name: "Consultation Desk".to_string(),
                admin_email: None,
            },
            scheduling: SchedulingConfig {
                provider: ProviderKind::Calendly,
                calendly_url: CALENDLY_URL.to_string(),
                calendly_token: None,
                calendly_user_uri: None,
                calendly_event_type_uri: None,
                calcom_url: CALCOM_URL.to_string(),
                calcom_api_key: None,
                calcom_username: None,
                calcom_event_type_slug: None,
            },
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}

/// Docker secret first, then the environment.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| var(secret_name))
        .or_else(|| {
            warn!("Secret {secret_name} not found in {path} or the environment");
            None
        })
}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use wizard::validate::is_email;

use crate::config::MailConfig;

/// One outbound email. `to_email` falls back to the admin address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notification {
    pub name: Option<String>,
    pub email: Option<String>,
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Mail transport is not configured: {0} missing")]
    Misconfigured(&'static str),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the provider's delivery receipt.
    async fn send(&self, notification: Notification) -> Result<Value, NotifyError>;
}

pub struct Mailjet {
    client: Client,
    config: MailConfig,
}

impl Mailjet {
    pub fn new(client: Client, config: MailConfig) -> Self {
        Self { client, config }
    }

    fn payload(&self, notification: &Notification) -> Result<Value, NotifyError> {
        let from_email = self
            .config
            .from_email
            .as_deref()
            .ok_or(NotifyError::Misconfigured("FROM_EMAIL"))?;
        let to_email = notification
            .to_email
            .as_deref()
            .or(self.config.admin_email.as_deref())
            .ok_or(NotifyError::Misconfigured("TO_EMAIL"))?;

        let subject = notification.subject.clone().unwrap_or_else(|| {
            match &notification.name {
                Some(name) => format!("New Contact Form Submission from {name}"),
                None => "New Email".to_string(),
            }
        });
        let text = notification
            .message
            .clone()
            .unwrap_or_else(|| "No message provided.".to_string());

        let mut message = json!({
            "From": { "Email": from_email, "Name": self.config.from_name },
            "To": [{ "Email": to_email, "Name": "Recipient" }],
            "Subject": subject,
            "TextPart": text,
            "CustomID": "UniversalEmail",
        });
        if let Some(reply_to) = notification.email.as_deref().filter(|e| is_email(e)) {
            message["ReplyTo"] = json!({ "Email": reply_to });
        }

        Ok(json!({ "Messages": [message] }))
    }
}

#[async_trait]
impl Notifier for Mailjet {
    async fn send(&self, notification: Notification) -> Result<Value, NotifyError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(NotifyError::Misconfigured("MJ_API_KEY"))?;
        let api_secret = self
            .config
            .api_secret
            .as_deref()
            .ok_or(NotifyError::Misconfigured("MJ_API_SECRET"))?;
        let payload = self.payload(&notification)?;

        let response = self
            .client
            .post(&self.config.url)
            .basic_auth(api_key, Some(api_secret))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let receipt = response.json::<Value>().await?;
        debug!("Mailjet accepted message: {receipt}");

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn mailjet() -> Mailjet {
        let mut config = Config::default().mail;
        config.api_key = Some("key".into());
        config.api_secret = Some("secret".into());
        config.from_email = Some("desk@example.com".into());
        config.admin_email = Some("admin@example.com".into());

        Mailjet::new(Client::new(), config)
    }

    #[test]
    fn test_payload_defaults_to_admin() {
        let payload = mailjet()
            .payload(&Notification {
                name: Some("Jane".into()),
                ..Notification::default()
            })
            .unwrap();
        let message = &payload["Messages"][0];

        assert_eq!(message["To"][0]["Email"], "admin@example.com");
        assert_eq!(message["From"]["Email"], "desk@example.com");
        assert_eq!(message["Subject"], "New Contact Form Submission from Jane");
        assert_eq!(message["TextPart"], "No message provided.");
        assert!(message.get("ReplyTo").is_none());
    }

    #[test]
    fn test_payload_explicit_recipient_and_reply_to() {
        let payload = mailjet()
            .payload(&Notification {
                email: Some("jane@example.com".into()),
                to_email: Some("jane@example.com".into()),
                subject: Some("Hello".into()),
                message: Some("Body".into()),
                ..Notification::default()
            })
            .unwrap();
        let message = &payload["Messages"][0];

        assert_eq!(message["To"][0]["Email"], "jane@example.com");
        assert_eq!(message["Subject"], "Hello");
        assert_eq!(message["ReplyTo"]["Email"], "jane@example.com");
    }

    #[test]
    fn test_payload_skips_bogus_reply_to() {
        let payload = mailjet()
            .payload(&Notification {
                email: Some("Not provided".into()),
                ..Notification::default()
            })
            .unwrap();

        assert!(payload["Messages"][0].get("ReplyTo").is_none());
        assert_eq!(payload["Messages"][0]["Subject"], "New Email");
    }

    #[tokio::test]
    async fn test_missing_credentials_are_misconfiguration() {
        let mailjet = Mailjet::new(Client::new(), Config::default().mail);

        assert!(matches!(
            mailjet.send(Notification::default()).await,
            Err(NotifyError::Misconfigured("MJ_API_KEY"))
        ));
    }

    #[test]
    fn test_missing_recipient_is_misconfiguration() {
        let mut mailjet = mailjet();
        mailjet.config.admin_email = None;

        assert!(matches!(
            mailjet.payload(&Notification::default()),
            Err(NotifyError::Misconfigured("TO_EMAIL"))
        ));
    }
}

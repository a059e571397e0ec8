use serde_json::{Map, Value};
use tracing::warn;

use crate::notify::Notification;

const LEADING: [(&str, &str); 3] = [("name", "Name"), ("email", "Email"), ("message", "Message")];

/// Partial reports arrive from exit beacons with any content type, so the body is
/// parsed by hand. Anything unreadable counts as an empty report.
pub fn parse_partial(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(other) => {
            warn!("Partial form body is not an object: {other}");
            Map::new()
        }
        Err(e) => {
            if !body.is_empty() {
                warn!("Failed to parse partial form body: {e}");
            }
            Map::new()
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn present(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).map(text).filter(|s| !s.is_empty())
}

/// Name, email and message lead when present, then every other field in arrival order.
pub fn partial_notification(fields: &Map<String, Value>) -> Notification {
    let name = present(fields, "name");
    let email = present(fields, "email");

    let mut lines: Vec<String> = LEADING
        .iter()
        .filter_map(|(key, label)| present(fields, key).map(|value| format!("{label}: {value}")))
        .collect();
    lines.extend(
        fields
            .iter()
            .filter(|(key, _)| !LEADING.iter().any(|(leading, _)| *leading == key.as_str()))
            .map(|(key, value)| format!("{key}: {}", text(value))),
    );

    let subject = match &name {
        Some(name) => format!("Partial Form Submission from {name}"),
        None => "Partial Form Submission".to_string(),
    };
    let message = if lines.is_empty() {
        "User exited the form without submitting any data.".to_string()
    } else {
        lines.join("\n")
    };

    Notification {
        name: Some(name.unwrap_or_else(|| "Unknown User".to_string())),
        email: Some(email.unwrap_or_else(|| "Not provided".to_string())),
        to_email: None,
        subject: Some(subject),
        message: Some(message),
    }
}

pub fn contact_notifications(
    name: &str,
    email: &str,
    message: &str,
    from_name: &str,
) -> (Notification, Notification) {
    let admin = Notification {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        to_email: None,
        subject: Some(format!("New Contact Form Submission from {name}")),
        message: Some(format!("Name: {name}\nEmail: {email}\nMessage: {message}")),
    };
    let thank_you = Notification {
        name: Some(from_name.to_string()),
        email: None,
        to_email: Some(email.to_string()),
        subject: Some("Thank You for Your Submission!".to_string()),
        message: Some(format!(
            "Hello {name},\n\nThank you for reaching out! We have received your meeting request and will get back to you on time."
        )),
    };

    (admin, thank_you)
}

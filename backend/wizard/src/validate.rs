use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::{
    form::{Field, FieldErrors, FormData},
    machine::Step,
};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+\d{10,15}$").expect("phone pattern"));

pub fn is_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

pub fn is_website_url(url: &str) -> bool {
    Url::parse(url).is_ok() && (url.starts_with("http://") || url.starts_with("https://"))
}

/// Facts about the session that live outside the form itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gate {
    pub email_verified: bool,
}

pub type Validator = fn(&FormData) -> FieldErrors;
pub type Precondition = fn(&Gate) -> Option<(Field, &'static str)>;

pub struct StepRules {
    pub validate: Validator,
    pub preconditions: &'static [Precondition],
}

const RULES: [StepRules; Step::COUNT] = [
    StepRules {
        validate: identity,
        preconditions: &[email_verified],
    },
    StepRules {
        validate: contact,
        preconditions: &[],
    },
    StepRules {
        validate: business,
        preconditions: &[],
    },
    StepRules {
        validate: services,
        preconditions: &[],
    },
    StepRules {
        validate: qualification,
        preconditions: &[],
    },
    StepRules {
        validate: scheduling,
        preconditions: &[],
    },
    StepRules {
        validate: consent,
        preconditions: &[],
    },
];

pub fn rules(step: Step) -> &'static StepRules {
    &RULES[step.index()]
}

/// Runs the step's validator and then its preconditions. Empty means the step passes.
pub fn check(step: Step, data: &FormData, gate: &Gate) -> FieldErrors {
    let rules = rules(step);
    let mut errors = (rules.validate)(data);

    for precondition in rules.preconditions {
        if let Some((field, message)) = precondition(gate) {
            errors.entry(field).or_insert_with(|| message.to_string());
        }
    }

    errors
}

fn email_verified(gate: &Gate) -> Option<(Field, &'static str)> {
    (!gate.email_verified).then_some((
        Field::EmailVerification,
        "Please verify your email before continuing",
    ))
}

fn email_error(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some("Email is required")
    } else if !is_email(email) {
        Some("Please enter a valid email")
    } else {
        None
    }
}

fn identity(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if data.full_name.trim().is_empty() {
        errors.insert(Field::FullName, "Full name is required".into());
    }
    if let Some(message) = email_error(&data.email) {
        errors.insert(Field::Email, message.into());
    }

    errors
}

fn contact(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if data.phone.is_empty() {
        errors.insert(Field::Phone, "Phone number is required".into());
    } else if !is_phone(&data.phone) {
        errors.insert(
            Field::Phone,
            "Please enter phone with country code (+880...)".into(),
        );
    }
    if !data.communication_consent {
        errors.insert(
            Field::CommunicationConsent,
            "You must agree to receive communications".into(),
        );
    }

    errors
}

fn business(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if data.company_name.trim().is_empty() {
        errors.insert(Field::CompanyName, "Company/Brand name is required".into());
    }
    if !data.no_website && !data.website_url.is_empty() && !is_website_url(&data.website_url) {
        errors.insert(
            Field::WebsiteUrl,
            "Please enter a valid URL with http:// or https://".into(),
        );
    }

    errors
}

fn services(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if data.services.is_empty() {
        errors.insert(Field::Services, "Please select at least one service".into());
    }

    errors
}

fn qualification(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if data.google_ranking.is_none() {
        errors.insert(
            Field::GoogleRanking,
            "Please select your Google ranking status".into(),
        );
    }
    if data.gbp_verified.is_none() {
        errors.insert(
            Field::GbpVerified,
            "Please select your GBP verification status".into(),
        );
    }
    if data.monthly_budget.is_none() {
        errors.insert(
            Field::MonthlyBudget,
            "Please select your monthly budget".into(),
        );
    }

    errors
}

fn scheduling(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !data.calendly_scheduled {
        errors.insert(
            Field::CalendlyScheduled,
            "You must confirm that you scheduled the meeting".into(),
        );
    }

    errors
}

fn consent(data: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !data.consultation_consent {
        errors.insert(
            Field::ConsultationConsent,
            "You must understand this is a professional consultation".into(),
        );
    }
    if !data.privacy_consent {
        errors.insert(
            Field::PrivacyConsent,
            "You must agree to the privacy policy".into(),
        );
    }

    errors
}

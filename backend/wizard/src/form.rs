use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "Asia/Dhaka";

pub const SERVICES: [&str; 6] = [
    "AI-First SEO Growth Sprint",
    "Local SEO Booster",
    "Digital PR & Brand Entity Build",
    "Generative-Engine Content Pack",
    "SEO Training / Mentorship",
    "Not sure yet, I'd like your recommendation",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ranking {
    Yes,
    No,
    #[serde(rename = "Not Sure")]
    NotSure,
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ranking::Yes => "Yes",
            Ranking::No => "No",
            Ranking::NotSure => "Not Sure",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GbpStatus {
    Yes,
    No,
}

impl fmt::Display for GbpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GbpStatus::Yes => "Yes",
            GbpStatus::No => "No",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    #[serde(rename = "Less than $500")]
    Under500,
    #[serde(rename = "$500–$1,000")]
    To1000,
    #[serde(rename = "$1,000–$2,500")]
    To2500,
    #[serde(rename = "$2,500–$5,000")]
    To5000,
    #[serde(rename = "$5,000+")]
    Over5000,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Budget::Under500 => "Less than $500",
            Budget::To1000 => "$500–$1,000",
            Budget::To2500 => "$1,000–$2,500",
            Budget::To5000 => "$2,500–$5,000",
            Budget::Over5000 => "$5,000+",
        })
    }
}

/// Everything the visitor has typed so far.
///
/// Deserializes with defaults for every field so partially filled answer files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormData {
    pub full_name: String,
    pub email: String,

    pub phone: String,
    pub communication_consent: bool,

    pub company_name: String,
    pub website_url: String,
    pub no_website: bool,
    pub business_idea: String,

    pub services: Vec<String>,

    pub google_ranking: Option<Ranking>,
    pub gbp_verified: Option<GbpStatus>,
    pub monthly_budget: Option<Budget>,

    pub timezone: String,
    pub calendly_scheduled: bool,

    pub additional_notes: String,
    pub consultation_consent: bool,
    pub privacy_consent: bool,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
            communication_consent: false,
            company_name: String::new(),
            website_url: String::new(),
            no_website: false,
            business_idea: String::new(),
            services: Vec::new(),
            google_ranking: None,
            gbp_verified: None,
            monthly_budget: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            calendly_scheduled: false,
            additional_notes: String::new(),
            consultation_consent: false,
            privacy_consent: false,
        }
    }
}

impl FormData {
    /// Reports are only worth sending once the visitor has identified themselves.
    pub fn has_identity(&self) -> bool {
        !self.full_name.is_empty() || !self.email.is_empty()
    }

    pub fn services_line(&self) -> String {
        self.services.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FullName,
    Email,
    EmailVerification,
    Phone,
    CommunicationConsent,
    CompanyName,
    WebsiteUrl,
    Services,
    GoogleRanking,
    GbpVerified,
    MonthlyBudget,
    CalendlyScheduled,
    ConsultationConsent,
    PrivacyConsent,
}

pub type FieldErrors = BTreeMap<Field, String>;

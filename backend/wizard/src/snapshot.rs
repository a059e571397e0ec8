use std::fmt;

use serde::Serialize;

use crate::{form::FormData, machine::Step};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    AutoSave,
    Abandoned,
}

impl SnapshotKind {
    pub fn status_line(self, step: Step) -> String {
        match self {
            SnapshotKind::AutoSave => format!("AUTO-SAVE - User at Step {step}"),
            SnapshotKind::Abandoned => format!("ABANDONED - User left at Step {step}"),
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotKind::AutoSave => "AUTO-SAVE",
            SnapshotKind::Abandoned => "ABANDONED",
        })
    }
}

/// Latest form contents and position, published by the wizard on every change.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub data: FormData,
    pub step: Step,
}

impl Progress {
    pub fn is_reportable(&self) -> bool {
        self.data.has_identity() && !self.step.is_last()
    }
}

/// Body of `/sendPartialFormData`. Field order is the order the admin reads them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub website_url: String,
    pub no_website: bool,
    pub business_idea: String,
    pub services: String,
    pub google_ranking: String,
    pub gbp_verified: String,
    pub monthly_budget: String,
    pub calendly_scheduled: bool,
    pub additional_notes: String,
    pub current_step: u8,
    pub message: String,
}

impl Snapshot {
    pub fn new(progress: &Progress, kind: SnapshotKind) -> Self {
        let data = &progress.data;
        let show = |value: Option<String>| value.unwrap_or_default();

        Self {
            name: data.full_name.clone(),
            email: data.email.clone(),
            phone: data.phone.clone(),
            company_name: data.company_name.clone(),
            website_url: data.website_url.clone(),
            no_website: data.no_website,
            business_idea: data.business_idea.clone(),
            services: data.services_line(),
            google_ranking: show(data.google_ranking.map(|r| r.to_string())),
            gbp_verified: show(data.gbp_verified.map(|g| g.to_string())),
            monthly_budget: show(data.monthly_budget.map(|b| b.to_string())),
            calendly_scheduled: data.calendly_scheduled,
            additional_notes: data.additional_notes.clone(),
            current_step: progress.step.number(),
            message: kind.status_line(progress.step),
        }
    }
}

/// Body of `/sendContactEmail`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Submission {
    pub fn new(data: &FormData) -> Self {
        let website = if data.no_website || data.website_url.is_empty() {
            "N/A"
        } else {
            data.website_url.as_str()
        };
        let or = |value: &str, fallback: &'static str| {
            if value.trim().is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };
        let choice = |value: Option<String>| value.unwrap_or_default();

        let message = [
            format!("Phone: {}", data.phone),
            format!("Company: {}", data.company_name),
            format!("Website: {website}"),
            format!("Business Idea: {}", or(&data.business_idea, "None")),
            format!("Services: {}", data.services_line()),
            format!(
                "Google Ranking: {}",
                choice(data.google_ranking.map(|r| r.to_string()))
            ),
            format!(
                "GBP Verified: {}",
                choice(data.gbp_verified.map(|g| g.to_string()))
            ),
            format!(
                "Budget: {}",
                choice(data.monthly_budget.map(|b| b.to_string()))
            ),
            format!(
                "Calendly Scheduled: {}",
                if data.calendly_scheduled { "Yes" } else { "No" }
            ),
            format!("Additional Notes: {}", or(&data.additional_notes, "None")),
        ]
        .join("\n");

        Self {
            name: data.full_name.clone(),
            email: data.email.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{Budget, Ranking};

    fn progress(step: u8) -> Progress {
        Progress {
            data: FormData {
                full_name: "Jane".into(),
                services: vec!["Local SEO Booster".into(), "Digital PR".into()],
                google_ranking: Some(Ranking::NotSure),
                ..FormData::default()
            },
            step: Step::new(step).expect("step in range"),
        }
    }

    #[test]
    fn test_status_lines() {
        let progress = progress(2);

        let auto = Snapshot::new(&progress, SnapshotKind::AutoSave);
        assert_eq!(auto.message, "AUTO-SAVE - User at Step 2");
        assert_eq!(auto.current_step, 2);

        let abandoned = Snapshot::new(&progress, SnapshotKind::Abandoned);
        assert_eq!(abandoned.message, "ABANDONED - User left at Step 2");
    }

    #[test]
    fn test_snapshot_flattens_services() {
        let snapshot = Snapshot::new(&progress(4), SnapshotKind::AutoSave);

        assert_eq!(snapshot.services, "Local SEO Booster, Digital PR");
        assert_eq!(snapshot.google_ranking, "Not Sure");
        assert_eq!(snapshot.gbp_verified, "");
    }

    #[test]
    fn test_snapshot_wire_names() {
        let value = serde_json::to_value(Snapshot::new(&progress(3), SnapshotKind::AutoSave))
            .expect("serializable");

        for key in [
            "name",
            "email",
            "phone",
            "companyName",
            "websiteUrl",
            "noWebsite",
            "businessIdea",
            "services",
            "googleRanking",
            "gbpVerified",
            "monthlyBudget",
            "calendlyScheduled",
            "additionalNotes",
            "currentStep",
            "message",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_reportable_needs_identity_before_last_step() {
        assert!(progress(6).is_reportable());
        assert!(!progress(7).is_reportable());
        assert!(!Progress::default().is_reportable());
    }

    #[test]
    fn test_submission_message() {
        let data = FormData {
            full_name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: "+8801712345678".into(),
            company_name: "Acme".into(),
            no_website: true,
            website_url: "https://ignored.example".into(),
            services: vec!["Local SEO Booster".into()],
            monthly_budget: Some(Budget::Over5000),
            calendly_scheduled: true,
            ..FormData::default()
        };

        let submission = Submission::new(&data);
        assert_eq!(submission.name, "Jane");
        assert!(submission.message.contains("Website: N/A"));
        assert!(submission.message.contains("Budget: $5,000+"));
        assert!(submission.message.contains("Calendly Scheduled: Yes"));
        assert!(submission.message.ends_with("Additional Notes: None"));
    }
}

use std::{fmt, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    client::{Backend, Booking, BookingRequest, ClientError},
    form::{Budget, Field, FieldErrors, FormData, GbpStatus, Ranking},
    report,
    snapshot::{Progress, Submission},
    validate::{self, Gate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step(u8);

impl Step {
    pub const COUNT: usize = 7;
    pub const FIRST: Step = Step(1);
    pub const LAST: Step = Step(Self::COUNT as u8);

    pub fn new(number: u8) -> Option<Self> {
        (Self::FIRST.0..=Self::LAST.0)
            .contains(&number)
            .then_some(Step(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn is_last(self) -> bool {
        self == Self::LAST
    }

    fn forward(self) -> Self {
        Step((self.0 + 1).min(Self::LAST.0))
    }

    fn back(self) -> Option<Self> {
        Step::new(self.0 - 1)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced(Step),
    Submitted,
}

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Please correct the highlighted fields")]
    Invalid(FieldErrors),

    #[error("Email cannot be changed after it has been verified")]
    EmailLocked,

    #[error("The form has already been submitted")]
    Closed,

    #[error("Verification failed: {0}")]
    Verification(#[source] ClientError),

    #[error("There was an error submitting the form. Please try again.")]
    Submission(#[source] ClientError),

    #[error("Booking failed: {0}")]
    Booking(#[source] ClientError),
}

impl WizardError {
    fn single(field: Field, message: &str) -> Self {
        WizardError::Invalid(FieldErrors::from([(field, message.to_string())]))
    }
}

/// Seven step consultation intake.
///
/// Every mutation goes through a setter so that the verified email stays locked and
/// the latest [`Progress`] is published for the background reporters.
pub struct Wizard {
    data: FormData,
    step: Step,
    email_verified: bool,
    code_sent: bool,
    submitted: bool,
    errors: FieldErrors,
    progress: watch::Sender<Progress>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(Progress::default());

        Self {
            data: FormData::default(),
            step: Step::FIRST,
            email_verified: false,
            code_sent: false,
            submitted: false,
            errors: FieldErrors::new(),
            progress,
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    pub fn code_sent(&self) -> bool {
        self.code_sent
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn progress(&self) -> Progress {
        Progress {
            data: self.data.clone(),
            step: self.step,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    fn publish(&self) {
        self.progress.send_replace(self.progress());
    }

    fn edit(
        &mut self,
        field: Option<Field>,
        apply: impl FnOnce(&mut FormData),
    ) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::Closed);
        }

        apply(&mut self.data);
        if let Some(field) = field {
            self.errors.remove(&field);
        }
        self.publish();

        Ok(())
    }

    pub fn set_full_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(Some(Field::FullName), |data| data.full_name = value)
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        if self.email_verified {
            return if value == self.data.email {
                Ok(())
            } else {
                Err(WizardError::EmailLocked)
            };
        }

        if value != self.data.email {
            self.code_sent = false;
        }
        self.edit(Some(Field::Email), |data| data.email = value)
    }

    pub fn set_phone(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(Some(Field::Phone), |data| data.phone = value)
    }

    pub fn set_communication_consent(&mut self, value: bool) -> Result<(), WizardError> {
        self.edit(Some(Field::CommunicationConsent), |data| {
            data.communication_consent = value
        })
    }

    pub fn set_company_name(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(Some(Field::CompanyName), |data| data.company_name = value)
    }

    pub fn set_website_url(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(Some(Field::WebsiteUrl), |data| data.website_url = value)
    }

    pub fn set_no_website(&mut self, value: bool) -> Result<(), WizardError> {
        self.edit(Some(Field::WebsiteUrl), |data| data.no_website = value)
    }

    pub fn set_business_idea(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(None, |data| data.business_idea = value)
    }

    /// Selects the service, or deselects it if already selected.
    pub fn toggle_service(&mut self, service: &str) -> Result<(), WizardError> {
        self.edit(Some(Field::Services), |data| {
            match data.services.iter().position(|s| s == service) {
                Some(index) => {
                    data.services.remove(index);
                }
                None => data.services.push(service.to_string()),
            }
        })
    }

    pub fn set_google_ranking(&mut self, value: Option<Ranking>) -> Result<(), WizardError> {
        self.edit(Some(Field::GoogleRanking), |data| data.google_ranking = value)
    }

    pub fn set_gbp_verified(&mut self, value: Option<GbpStatus>) -> Result<(), WizardError> {
        self.edit(Some(Field::GbpVerified), |data| data.gbp_verified = value)
    }

    pub fn set_monthly_budget(&mut self, value: Option<Budget>) -> Result<(), WizardError> {
        self.edit(Some(Field::MonthlyBudget), |data| data.monthly_budget = value)
    }

    pub fn set_timezone(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(None, |data| data.timezone = value)
    }

    pub fn set_scheduled(&mut self, value: bool) -> Result<(), WizardError> {
        self.edit(Some(Field::CalendlyScheduled), |data| {
            data.calendly_scheduled = value
        })
    }

    pub fn set_additional_notes(&mut self, value: impl Into<String>) -> Result<(), WizardError> {
        let value = value.into();
        self.edit(None, |data| data.additional_notes = value)
    }

    pub fn set_consultation_consent(&mut self, value: bool) -> Result<(), WizardError> {
        self.edit(Some(Field::ConsultationConsent), |data| {
            data.consultation_consent = value
        })
    }

    pub fn set_privacy_consent(&mut self, value: bool) -> Result<(), WizardError> {
        self.edit(Some(Field::PrivacyConsent), |data| data.privacy_consent = value)
    }

    /// Applies a whole set of answers through the individual setters.
    pub fn fill(&mut self, answers: FormData) -> Result<(), WizardError> {
        self.set_full_name(answers.full_name)?;
        self.set_email(answers.email)?;
        self.set_phone(answers.phone)?;
        self.set_communication_consent(answers.communication_consent)?;
        self.set_company_name(answers.company_name)?;
        self.set_website_url(answers.website_url)?;
        self.set_no_website(answers.no_website)?;
        self.set_business_idea(answers.business_idea)?;
        self.edit(Some(Field::Services), |data| data.services = answers.services)?;
        self.set_google_ranking(answers.google_ranking)?;
        self.set_gbp_verified(answers.gbp_verified)?;
        self.set_monthly_budget(answers.monthly_budget)?;
        self.set_timezone(answers.timezone)?;
        self.set_scheduled(answers.calendly_scheduled)?;
        self.set_additional_notes(answers.additional_notes)?;
        self.set_consultation_consent(answers.consultation_consent)?;
        self.set_privacy_consent(answers.privacy_consent)
    }

    fn gate(&self) -> Gate {
        Gate {
            email_verified: self.email_verified,
        }
    }

    /// Asks the backend to email a one-time code to the current address.
    pub async fn request_code(&mut self, backend: &dyn Backend) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::Closed);
        }
        if self.email_verified {
            return Ok(());
        }
        if !validate::is_email(&self.data.email) {
            let message = "Please enter a valid email";
            self.errors.insert(Field::Email, message.to_string());
            return Err(WizardError::single(Field::Email, message));
        }

        backend
            .send_verification_code(&self.data.email)
            .await
            .map_err(WizardError::Verification)?;

        self.code_sent = true;
        info!("Verification code requested for {}", self.data.email);

        Ok(())
    }

    /// Submits the emailed code. Success locks the email for the rest of the session.
    ///
    /// Surrounding whitespace from the input box is trimmed here; the server still
    /// compares the remaining code exactly.
    pub async fn confirm_code(
        &mut self,
        backend: &dyn Backend,
        code: &str,
    ) -> Result<(), WizardError> {
        if self.submitted {
            return Err(WizardError::Closed);
        }
        if self.email_verified {
            return Ok(());
        }

        let code = code.trim();
        if code.is_empty() {
            return Err(WizardError::single(
                Field::EmailVerification,
                "Please enter the verification code",
            ));
        }

        backend
            .verify_code(&self.data.email, code)
            .await
            .map_err(WizardError::Verification)?;

        self.email_verified = true;
        self.errors.remove(&Field::EmailVerification);
        info!("Email {} verified", self.data.email);

        Ok(())
    }

    /// Validates the current step and moves forward, or submits on the last step.
    pub async fn next(&mut self, backend: &dyn Backend) -> Result<Transition, WizardError> {
        if self.submitted {
            return Err(WizardError::Closed);
        }

        let errors = validate::check(self.step, &self.data, &self.gate());
        if !errors.is_empty() {
            debug!("Step {} failed validation: {:?}", self.step, errors.keys());
            self.errors = errors.clone();
            return Err(WizardError::Invalid(errors));
        }
        self.errors.clear();

        if self.step.is_last() {
            return self.submit(backend).await;
        }

        self.step = self.step.forward();
        self.publish();

        Ok(Transition::Advanced(self.step))
    }

    async fn submit(&mut self, backend: &dyn Backend) -> Result<Transition, WizardError> {
        backend
            .send_contact_email(&Submission::new(&self.data))
            .await
            .map_err(WizardError::Submission)?;

        self.submitted = true;
        self.publish();
        info!("Form submitted for {}", self.data.email);

        Ok(Transition::Submitted)
    }

    /// Steps back without validating. `None` on the first step.
    pub fn previous(&mut self) -> Option<Step> {
        if self.submitted {
            return None;
        }

        let step = self.step.back()?;
        self.step = step;
        self.errors.clear();
        self.publish();

        Some(step)
    }

    /// Books the consultation through the configured scheduling provider.
    pub async fn book(
        &mut self,
        backend: &dyn Backend,
        start_time: Option<String>,
    ) -> Result<Booking, WizardError> {
        if self.submitted {
            return Err(WizardError::Closed);
        }

        let request = BookingRequest {
            name: self.data.full_name.clone(),
            email: self.data.email.clone(),
            timezone: self.data.timezone.clone(),
            start_time,
        };
        let booking = backend
            .create_booking(&request)
            .await
            .map_err(WizardError::Booking)?;

        if let Booking::Confirmed(_) = booking {
            self.set_scheduled(true)?;
        }

        Ok(booking)
    }

    /// Starts periodic auto-save reports for this session.
    pub fn autosave(&self, backend: Arc<dyn Backend>, period: Duration) -> JoinHandle<()> {
        report::spawn_autosave(self.subscribe(), backend, period)
    }

    /// Fire-and-forget abandonment report. Never waits on delivery.
    pub fn abandon(&self, backend: Arc<dyn Backend>) -> Option<JoinHandle<()>> {
        report::report_abandoned(self.progress(), backend)
    }
}

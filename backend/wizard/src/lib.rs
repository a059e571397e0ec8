//! # Consultation Wizard
//!
//! Client side of the consultation intake. Shared with the server for the field rules.
//!
//! ## Steps
//!
//! | Step | Collects | Passes when |
//! |---|---|---|
//! | 1 | name, email | name set, email well formed, email verified |
//! | 2 | phone, consent | `+` followed by 10-15 digits, consent given |
//! | 3 | company, website, idea | company set, website is `http(s)://` unless "no website" |
//! | 4 | services | at least one |
//! | 5 | ranking, GBP, budget | all three chosen |
//! | 6 | scheduling | meeting confirmed |
//! | 7 | notes, consents | both consents given, then the form is submitted |
//!
//! Going forward always re-validates the current step. Going back never does.
//!
//! ## Email Verification
//!
//! Step 1 cannot pass on form contents alone.
//! 1. [`Wizard::request_code`] asks the server to email a six digit code.
//! 2. [`Wizard::confirm_code`] sends the code back. The server deletes it on a match.
//! 3. From then on the email is locked. [`Wizard::set_email`] refuses any other value.
//!
//! ## Reporting
//!
//! The wizard publishes a [`Progress`] on every change through a `tokio::sync::watch` channel.
//! - Auto-save ([`report::spawn_autosave`]) reads the latest value every 60 seconds and posts
//!   an `AUTO-SAVE` snapshot if the visitor gave a name or email and is not on the last step.
//! - Abandonment ([`Wizard::abandon`]) spawns a single `ABANDONED` post and returns without
//!   waiting, so shutdown is never held up by the mail server. A process about to exit uses
//!   [`report::flush_abandoned`] instead, which waits a bounded grace period for the post.
//!
//! Neither reporter can change the wizard. Failures only show up in the logs.
//!
//! ## Notes
//! - All server calls go through the [`Backend`] trait. [`ApiClient`] is the HTTP version.
//! - Validation lives in [`validate`] as a table of step rules, each a pure validator plus
//!   preconditions on session facts such as the verified email.
pub mod client;
pub mod form;
pub mod machine;
pub mod report;
pub mod snapshot;
pub mod validate;

#[cfg(test)]
mod testing;

pub use client::{ApiClient, Backend, Booking, BookingRequest, ClientError};
pub use form::{Budget, Field, FieldErrors, FormData, GbpStatus, Ranking};
pub use machine::{Step, Transition, Wizard, WizardError};
pub use snapshot::{Progress, Snapshot, SnapshotKind, Submission};

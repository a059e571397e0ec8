//! Documentation of a consultation intake platform: a seven step lead form and the small REST
//! backend behind it.
//!
//! Crates:
//! - `server` (`backend/server`): axum backend, email verification, mail relay, scheduling.
//! - `wizard` (`backend/wizard`): the form state machine, shared validation rules and the HTTP client.
//! - `tester` (`backend/tester`): walks the wizard from a terminal against a running server.
//!
//!
//!
//! # General Infrastructure
//! - Visitor fills the form step by step; every step is validated before moving on
//! - Step 1 asks the server for a one-time code, the visitor types it back, the email is then locked
//! - Every 60 seconds the form posts an auto-save snapshot if the visitor gave a name or email
//! - Leaving early posts one abandonment snapshot without waiting for the answer
//! - Step 6 books a slot through Calendly or Cal.com, whichever the deployment is configured for
//! - Step 7 posts the whole form; the admin gets the details and the visitor gets a thank-you
//!
//!
//!
//! # Email Verification
//!
//! **Goal**: Prove the visitor owns the email before we spend a consultation slot on it.
//!
//! - `POST /api/sendVerificationCode` stores a random code in `[100000, 999999]` under the email
//! - A second request for the same email replaces the first code
//! - Codes expire after `OTP_TTL_SECS` (10 minutes by default)
//! - `POST /api/verifyCode` deletes the code on a match, so each code works once
//! - Wrong code and no code give the same answer so nobody can probe which emails are pending
//!
//!
//!
//! # Notes
//!
//! ## Storage
//! Codes live in a process-local map behind the `ChallengeStore` trait. A restart forgets them,
//! which only means the visitor asks for another code. Submissions are never stored, they are
//! mailed and forgotten.
//!
//! ## Validation
//! The server checks emails with the same rules the wizard uses (`wizard::validate`), so a form
//! that skips the client still cannot get a code sent to `"asdf"`.
//!
//! ## Partial Reports
//! Browsers send exit beacons as `text/plain`. `/api/sendPartialFormData` reads the raw body as
//! JSON regardless of content type and still reports if the body is unreadable.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run the server.
//! ```sh
//! RUST_LOG=info cargo run --bin consult
//! ```
//!
//! Walk the form against it.
//! ```sh
//! cargo run -p tester -- demos/answers.json
//! ```
//!
//!
//!
//! # Environment
//!
//! Secrets are read from `/run/secrets/<NAME>` first, then the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `4040` |
//! | `FROM_EMAIL`, `FROM_NAME`, `TO_EMAIL` | none, none, `Consultation Desk` |
//! | `MJ_API_KEY`, `MJ_API_SECRET` | secrets |
//! | `OTP_TTL_SECS` | `600` |
//! | `SCHEDULING_PROVIDER` | `calendly` (or `calcom`) |
//! | `CALENDLY_TOKEN`, `CALENDLY_USER_URI`, `CALENDLY_EVENT_TYPE_URI` | secret, none, none |
//! | `CALCOM_API_KEY`, `CALCOM_USERNAME`, `CALCOM_EVENT_TYPE_SLUG` | secret, none, none |
//! | `DEFAULT_TIMEZONE` | `Asia/Dhaka` |
//!
//! Missing mail or scheduling credentials do not stop the server. The affected routes answer
//! with a 500 and the log names the missing value.

pub use server::start_server;

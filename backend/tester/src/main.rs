use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use tokio::{
    fs,
    io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin},
    signal::ctrl_c,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use wizard::{
    ApiClient, Backend, Booking, FormData, Transition, Wizard, WizardError,
    client::DEFAULT_BASE_URL,
    report::{ABANDON_GRACE, flush_abandoned},
};

const SCHEDULING_STEP: u8 = 6;

/// Walks the consultation wizard against a running server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file with the answers, same field names as the web form.
    answers: PathBuf,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, default_value_t = 60)]
    autosave_secs: u64,

    /// Book this start time (ISO 8601, UTC) on the scheduling step.
    #[arg(long)]
    book_at: Option<String>,
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.answers)
        .await
        .with_context(|| format!("reading {}", args.answers.display()))?;
    let answers: FormData = serde_json::from_str(&raw).context("parsing answers")?;

    let backend: Arc<dyn Backend> = Arc::new(ApiClient::new(args.base_url));
    let mut wizard = Wizard::new();
    wizard.fill(answers)?;

    let progress = wizard.subscribe();
    let _autosave = wizard.autosave(backend.clone(), Duration::from_secs(args.autosave_secs));
    let mut input = BufReader::new(stdin()).lines();

    tokio::select! {
        result = walk(&mut wizard, backend.as_ref(), &mut input, args.book_at) => result,
        _ = ctrl_c() => {
            let current = progress.borrow().clone();
            if flush_abandoned(current, backend.clone(), ABANDON_GRACE).await {
                info!("Abandonment report sent");
            }
            Ok(())
        }
    }
}

async fn walk(
    wizard: &mut Wizard,
    backend: &dyn Backend,
    input: &mut Input,
    mut book_at: Option<String>,
) -> anyhow::Result<()> {
    loop {
        if !wizard.email_verified() {
            verify_email(wizard, backend, input).await?;
        }
        if wizard.step().number() == SCHEDULING_STEP && !wizard.data().calendly_scheduled {
            schedule(wizard, backend, input, book_at.take()).await?;
        }

        match wizard.next(backend).await {
            Ok(Transition::Advanced(step)) => info!("Moved to step {step}"),
            Ok(Transition::Submitted) => {
                println!("Thank you! Check your email for confirmation.");
                return Ok(());
            }
            Err(WizardError::Invalid(errors)) => {
                for (field, message) in &errors {
                    warn!("{field:?}: {message}");
                }
                bail!("step {} is incomplete, fix the answers file", wizard.step());
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn verify_email(
    wizard: &mut Wizard,
    backend: &dyn Backend,
    input: &mut Input,
) -> anyhow::Result<()> {
    wizard.request_code(backend).await?;
    println!(
        "A verification code was sent to {}. Enter it below:",
        wizard.data().email
    );

    loop {
        let Some(line) = input.next_line().await? else {
            bail!("input closed before the email was verified");
        };

        match wizard.confirm_code(backend, &line).await {
            Ok(()) => return Ok(()),
            Err(WizardError::Verification(e)) => println!("{e}. Try again:"),
            Err(WizardError::Invalid(_)) => println!("Enter the six digit code:"),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn schedule(
    wizard: &mut Wizard,
    backend: &dyn Backend,
    input: &mut Input,
    start_time: Option<String>,
) -> anyhow::Result<()> {
    match wizard.book(backend, start_time).await? {
        Booking::Confirmed(_) => info!("Consultation booked"),
        Booking::Link(url) => {
            println!("Finish booking at {url} and press enter when done.");
            input.next_line().await?;
            wizard.set_scheduled(true)?;
        }
    }

    Ok(())
}

use std::{collections::VecDeque, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use panel_core::{cancel, dashboard_payment_url, debit, ConfiguredDashboardHost};
use payments_client::{
    config::{load_settings, prepare_api_base_url},
    HttpPaymentsApi, MissingPaymentsApi, PaymentsApi,
};
use shared::domain::{Currency, EnvironmentMode, Outcome, OutcomeKind, PaymentIntentId};

#[derive(Parser, Debug)]
struct Cli {
    /// Path to a panels.toml settings file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// Environment mode: "live" or "test".
    #[arg(long)]
    mode: Option<String>,
    /// Operator email attached to submission metadata.
    #[arg(long)]
    operator_email: Option<String>,
    /// Print the outcome as a JSON object instead of plain text.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a charge-type account debit against a connected account.
    Debit {
        #[arg(long)]
        source: String,
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        acknowledge: bool,
    },
    /// Cancel a PaymentIntent.
    Cancel {
        /// Target id; falls back to the configured object_id.
        #[arg(long)]
        payment_intent: Option<String>,
        #[arg(long)]
        acknowledge: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref());
    if let Some(mode) = cli.mode {
        settings.mode = EnvironmentMode::parse(&mode);
    }
    if let Some(email) = cli.operator_email {
        settings.operator_email = Some(email);
    }
    let api_base_url = prepare_api_base_url(&settings.api_base_url)?;

    let api: Arc<dyn PaymentsApi> = if settings.secret_key.is_empty() {
        tracing::warn!("no payments secret key configured; submissions will fail");
        Arc::new(MissingPaymentsApi)
    } else {
        Arc::new(HttpPaymentsApi::new(api_base_url, settings.secret_key))
    };
    let host = ConfiguredDashboardHost {
        operator_email: settings.operator_email,
    };

    let outcome = match cli.command {
        Command::Debit {
            source,
            amount,
            currency,
            acknowledge,
        } => {
            let currency = Currency::from_code(&currency)
                .ok_or_else(|| anyhow!("unsupported currency code '{currency}'"))?;
            run_debit(&*api, &host, source, amount, currency, acknowledge).await
        }
        Command::Cancel {
            payment_intent,
            acknowledge,
        } => {
            let target = payment_intent
                .or(settings.object_id)
                .map(PaymentIntentId::new);
            run_cancel(&*api, &host, target, acknowledge).await
        }
    };

    let Some(outcome) = outcome else {
        eprintln!("nothing submitted: the form never became valid");
        std::process::exit(1);
    };

    if cli.json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        report(&outcome, &settings.dashboard_base_url, settings.mode);
    }

    if outcome.kind == OutcomeKind::Attention {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_debit(
    api: &dyn PaymentsApi,
    host: &ConfiguredDashboardHost,
    source: String,
    amount: i64,
    currency: Currency,
    acknowledge: bool,
) -> Option<Outcome> {
    let (state, effects) = debit::init();
    let mut state = drive_debit(api, host, state, effects).await;

    for event in [
        debit::DebitEvent::SourceAccountChanged(source),
        debit::DebitEvent::AmountChanged(amount),
        debit::DebitEvent::CurrencyChanged(Some(currency)),
        debit::DebitEvent::AcknowledgedChanged(acknowledge),
        debit::DebitEvent::SubmitPressed,
    ] {
        let (next, effects) = debit::reduce(state, event);
        state = drive_debit(api, host, next, effects).await;
    }

    state.outcome
}

async fn drive_debit(
    api: &dyn PaymentsApi,
    host: &ConfiguredDashboardHost,
    mut state: debit::DebitPanel,
    effects: Vec<debit::DebitEffect>,
) -> debit::DebitPanel {
    let mut queue: VecDeque<_> = effects.into();
    while let Some(effect) = queue.pop_front() {
        if let Some(event) = debit::run_effect(api, host, effect).await {
            let (next, more) = debit::reduce(state, event);
            state = next;
            queue.extend(more);
        }
    }
    state
}

async fn run_cancel(
    api: &dyn PaymentsApi,
    host: &ConfiguredDashboardHost,
    target: Option<PaymentIntentId>,
    acknowledge: bool,
) -> Option<Outcome> {
    let (state, effects) = cancel::init(target);
    let mut state = drive_cancel(api, host, state, effects).await;

    for event in [
        cancel::CancelEvent::AcknowledgedChanged(acknowledge),
        cancel::CancelEvent::SubmitPressed,
    ] {
        let (next, effects) = cancel::reduce(state, event);
        state = drive_cancel(api, host, next, effects).await;
    }

    state.outcome
}

async fn drive_cancel(
    api: &dyn PaymentsApi,
    host: &ConfiguredDashboardHost,
    mut state: cancel::CancelPanel,
    effects: Vec<cancel::CancelEffect>,
) -> cancel::CancelPanel {
    let mut queue: VecDeque<_> = effects.into();
    while let Some(effect) = queue.pop_front() {
        if let Some(event) = cancel::run_effect(api, host, effect).await {
            let (next, more) = cancel::reduce(state, event);
            state = next;
            queue.extend(more);
        }
    }
    state
}

fn report(outcome: &Outcome, dashboard_base_url: &str, mode: EnvironmentMode) {
    match outcome.kind {
        OutcomeKind::Info => println!(
            "ok {} {}",
            outcome.text,
            dashboard_payment_url(dashboard_base_url, mode, &outcome.text)
        ),
        OutcomeKind::Attention => eprintln!("error: {}", outcome.text),
    }
}

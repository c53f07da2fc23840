//! Account-debit panel: form state, submission lifecycle, context loading.

use payments_client::{CreateChargeParams, PaymentsApi};
use shared::domain::{AccountId, ChargeId, ChargeStatus, Currency, Outcome};
use tracing::{info, warn};

use crate::{submission_metadata, DashboardHost};

pub const APP_TAG: &str = "dashboard-account-debit";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebitForm {
    pub source_account: String,
    pub amount_minor: i64,
    pub currency: Option<Currency>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DebitPanel {
    pub form: DebitForm,
    pub submitting: bool,
    pub outcome: Option<Outcome>,
    pub operator_email: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DebitEvent {
    SourceAccountChanged(String),
    AmountChanged(i64),
    CurrencyChanged(Option<Currency>),
    AcknowledgedChanged(bool),
    EmailResolved(String),
    SubmitPressed,
    SubmitCompleted(Result<ChargeId, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DebitEffect {
    FetchOperatorEmail,
    CreateCharge(CreateChargeParams),
}

pub fn init() -> (DebitPanel, Vec<DebitEffect>) {
    (DebitPanel::default(), vec![DebitEffect::FetchOperatorEmail])
}

pub fn form_is_valid(form: &DebitForm) -> bool {
    !form.source_account.trim().is_empty()
        && form.amount_minor > 0
        && form.currency.is_some()
        && form.acknowledged
}

/// Applies one event to the panel and returns the side effects the runtime
/// must perform. `SubmitPressed` is a no-op while a submission is in flight
/// or while the form is invalid, so at most one call is outstanding.
pub fn reduce(mut state: DebitPanel, event: DebitEvent) -> (DebitPanel, Vec<DebitEffect>) {
    let mut effects = Vec::new();

    match event {
        DebitEvent::SourceAccountChanged(value) => state.form.source_account = value,
        DebitEvent::AmountChanged(value) => state.form.amount_minor = value,
        DebitEvent::CurrencyChanged(value) => state.form.currency = value,
        DebitEvent::AcknowledgedChanged(value) => state.form.acknowledged = value,
        DebitEvent::EmailResolved(email) => state.operator_email = Some(email),
        DebitEvent::SubmitPressed => {
            if !state.submitting && form_is_valid(&state.form) {
                if let Some(currency) = state.form.currency {
                    state.submitting = true;
                    effects.push(DebitEffect::CreateCharge(CreateChargeParams {
                        amount: state.form.amount_minor,
                        currency,
                        source: AccountId::new(state.form.source_account.trim()),
                        metadata: submission_metadata(APP_TAG, state.operator_email.as_deref()),
                    }));
                }
            }
        }
        DebitEvent::SubmitCompleted(result) => {
            state.submitting = false;
            match result {
                Ok(charge_id) => {
                    state.outcome = Some(Outcome::info(charge_id.as_str()));
                    state.form = DebitForm::default();
                }
                Err(message) => {
                    state.outcome = Some(Outcome::attention(message));
                }
            }
        }
    }

    (state, effects)
}

/// Executes one effect against the injected collaborators. Returns the
/// completion event to feed back into `reduce`, if any.
pub async fn run_effect(
    api: &dyn PaymentsApi,
    host: &dyn DashboardHost,
    effect: DebitEffect,
) -> Option<DebitEvent> {
    match effect {
        DebitEffect::FetchOperatorEmail => match host.operator_email().await {
            Ok(email) => Some(DebitEvent::EmailResolved(email)),
            Err(err) => {
                warn!("debit: operator email lookup failed: {err}");
                None
            }
        },
        DebitEffect::CreateCharge(params) => {
            let event = match api.create_charge(params).await {
                Ok(charge) if charge.status == ChargeStatus::Succeeded => {
                    info!(charge_id = charge.id.as_str(), "debit: charge created");
                    DebitEvent::SubmitCompleted(Ok(charge.id))
                }
                Ok(charge) => DebitEvent::SubmitCompleted(Err(format!(
                    "charge {} was not completed",
                    charge.id
                ))),
                Err(err) => DebitEvent::SubmitCompleted(Err(err.to_string())),
            };
            Some(event)
        }
    }
}

#[cfg(test)]
#[path = "tests/debit_tests.rs"]
mod tests;

//! PaymentIntent cancellation panel: status-gated lifecycle, context loading.

use std::collections::HashMap;

use payments_client::PaymentsApi;
use shared::domain::{Outcome, PaymentIntentId, PaymentIntentStatus};
use tracing::{info, warn};

use crate::{submission_metadata, DashboardHost};

pub const APP_TAG: &str = "dashboard-cancellation";

pub const MISSING_TARGET_MESSAGE: &str =
    "payment intent id is missing from the dashboard context";

#[derive(Debug, Clone, Default)]
pub struct CancelForm {
    pub target: Option<PaymentIntentId>,
    pub acknowledged: bool,
    /// Platform-sourced, never user-editable.
    pub current_status: Option<PaymentIntentStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct CancelPanel {
    pub form: CancelForm,
    pub submitting: bool,
    pub outcome: Option<Outcome>,
    pub operator_email: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CancelEvent {
    AcknowledgedChanged(bool),
    StatusLoaded(PaymentIntentStatus),
    EmailResolved(String),
    SubmitPressed,
    SubmitCompleted(Result<PaymentIntentId, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelEffect {
    FetchOperatorEmail,
    FetchIntentStatus(PaymentIntentId),
    CancelIntent {
        target: PaymentIntentId,
        metadata: HashMap<String, String>,
    },
    RefreshDashboard,
}

/// A panel without an injected target id is unusable; that surfaces as an
/// immediate attention outcome and the status fetch is never attempted.
pub fn init(target: Option<PaymentIntentId>) -> (CancelPanel, Vec<CancelEffect>) {
    let mut state = CancelPanel::default();
    let mut effects = vec![CancelEffect::FetchOperatorEmail];

    match target {
        Some(target) => {
            effects.push(CancelEffect::FetchIntentStatus(target.clone()));
            state.form.target = Some(target);
        }
        None => {
            state.outcome = Some(Outcome::attention(MISSING_TARGET_MESSAGE));
        }
    }

    (state, effects)
}

pub fn is_cancellable(status: Option<PaymentIntentStatus>) -> bool {
    status.is_some_and(|status| status.is_cancellable())
}

pub fn form_is_valid(form: &CancelForm) -> bool {
    form.target.is_some() && form.acknowledged && is_cancellable(form.current_status)
}

/// Applies one event to the panel and returns the side effects the runtime
/// must perform. Any completed submission clears the consent checkbox, so
/// the operator has to re-confirm before retrying.
pub fn reduce(mut state: CancelPanel, event: CancelEvent) -> (CancelPanel, Vec<CancelEffect>) {
    let mut effects = Vec::new();

    match event {
        CancelEvent::AcknowledgedChanged(value) => state.form.acknowledged = value,
        CancelEvent::StatusLoaded(status) => state.form.current_status = Some(status),
        CancelEvent::EmailResolved(email) => state.operator_email = Some(email),
        CancelEvent::SubmitPressed => {
            if !state.submitting && form_is_valid(&state.form) {
                if let Some(target) = state.form.target.clone() {
                    state.submitting = true;
                    effects.push(CancelEffect::CancelIntent {
                        target,
                        metadata: submission_metadata(APP_TAG, state.operator_email.as_deref()),
                    });
                }
            }
        }
        CancelEvent::SubmitCompleted(result) => {
            state.submitting = false;
            state.form.acknowledged = false;
            match result {
                Ok(intent_id) => {
                    state.outcome = Some(Outcome::info(intent_id.as_str()));
                    state.form.current_status = Some(PaymentIntentStatus::Canceled);
                    effects.push(CancelEffect::RefreshDashboard);
                }
                Err(message) => {
                    state.outcome = Some(Outcome::attention(message));
                }
            }
        }
    }

    (state, effects)
}

/// Executes one effect against the injected collaborators. Context fetches
/// are never retried; a failed status fetch leaves the panel not cancellable.
pub async fn run_effect(
    api: &dyn PaymentsApi,
    host: &dyn DashboardHost,
    effect: CancelEffect,
) -> Option<CancelEvent> {
    match effect {
        CancelEffect::FetchOperatorEmail => match host.operator_email().await {
            Ok(email) => Some(CancelEvent::EmailResolved(email)),
            Err(err) => {
                warn!("cancel: operator email lookup failed: {err}");
                None
            }
        },
        CancelEffect::FetchIntentStatus(target) => {
            match api.retrieve_payment_intent(&target).await {
                Ok(intent) => Some(CancelEvent::StatusLoaded(intent.status)),
                Err(err) => {
                    warn!(
                        payment_intent = target.as_str(),
                        "cancel: status fetch failed: {err}"
                    );
                    None
                }
            }
        }
        CancelEffect::CancelIntent { target, metadata } => Some(CancelEvent::SubmitCompleted(
            cancel_and_tag(api, &target, metadata).await,
        )),
        CancelEffect::RefreshDashboard => {
            if let Err(err) = host.refresh_data().await {
                warn!("cancel: dashboard refresh failed: {err}");
            }
            None
        }
    }
}

async fn cancel_and_tag(
    api: &dyn PaymentsApi,
    target: &PaymentIntentId,
    metadata: HashMap<String, String>,
) -> Result<PaymentIntentId, String> {
    let intent = api
        .cancel_payment_intent(target)
        .await
        .map_err(|err| err.to_string())?;
    api.update_payment_intent_metadata(target, metadata)
        .await
        .map_err(|err| err.to_string())?;

    if intent.status == PaymentIntentStatus::Canceled {
        info!(payment_intent = intent.id.as_str(), "cancel: intent canceled");
        Ok(intent.id)
    } else {
        Err("failed to cancel the payment intent".to_string())
    }
}

#[cfg(test)]
#[path = "tests/cancel_tests.rs"]
mod tests;

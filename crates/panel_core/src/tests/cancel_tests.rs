use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payments_client::{ApiResult, Charge, CreateChargeParams, PaymentIntent};
use shared::error::{ApiError, ErrorCode};

use super::*;
use crate::{DashboardHost, METADATA_APP_TAG_KEY, METADATA_EMAIL_KEY};

struct ScriptedPaymentsApi {
    retrieve_result: Mutex<Option<ApiResult<PaymentIntent>>>,
    cancel_result: Mutex<Option<ApiResult<PaymentIntent>>>,
    update_result: Mutex<Option<ApiResult<PaymentIntent>>>,
    cancel_calls: Mutex<Vec<PaymentIntentId>>,
    update_calls: Mutex<Vec<HashMap<String, String>>>,
}

impl ScriptedPaymentsApi {
    fn new() -> Self {
        Self {
            retrieve_result: Mutex::new(None),
            cancel_result: Mutex::new(None),
            update_result: Mutex::new(None),
            cancel_calls: Mutex::new(Vec::new()),
            update_calls: Mutex::new(Vec::new()),
        }
    }

    fn with_retrieve(self, result: ApiResult<PaymentIntent>) -> Self {
        *self.retrieve_result.lock().expect("lock") = Some(result);
        self
    }

    fn with_cancel(self, result: ApiResult<PaymentIntent>) -> Self {
        *self.cancel_result.lock().expect("lock") = Some(result);
        self
    }

    fn with_update(self, result: ApiResult<PaymentIntent>) -> Self {
        *self.update_result.lock().expect("lock") = Some(result);
        self
    }

    fn intent(id: &str, status: PaymentIntentStatus) -> PaymentIntent {
        PaymentIntent {
            id: PaymentIntentId::new(id),
            status,
            created: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[async_trait]
impl PaymentsApi for ScriptedPaymentsApi {
    async fn create_charge(&self, _params: CreateChargeParams) -> ApiResult<Charge> {
        Err(ApiError::new(ErrorCode::Api, "not used by the cancel panel"))
    }

    async fn retrieve_payment_intent(&self, _id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        self.retrieve_result
            .lock()
            .expect("lock")
            .take()
            .expect("unexpected retrieve call")
    }

    async fn cancel_payment_intent(&self, id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        self.cancel_calls.lock().expect("lock").push(id.clone());
        self.cancel_result
            .lock()
            .expect("lock")
            .take()
            .expect("unexpected cancel call")
    }

    async fn update_payment_intent_metadata(
        &self,
        _id: &PaymentIntentId,
        metadata: HashMap<String, String>,
    ) -> ApiResult<PaymentIntent> {
        self.update_calls.lock().expect("lock").push(metadata);
        self.update_result
            .lock()
            .expect("lock")
            .take()
            .expect("unexpected update call")
    }
}

struct RecordingHost {
    email: Option<String>,
    refresh_calls: Mutex<u32>,
    fail_refresh: bool,
}

impl RecordingHost {
    fn with_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            refresh_calls: Mutex::new(0),
            fail_refresh: false,
        }
    }

    fn without_email() -> Self {
        Self {
            email: None,
            refresh_calls: Mutex::new(0),
            fail_refresh: false,
        }
    }
}

#[async_trait]
impl DashboardHost for RecordingHost {
    async fn operator_email(&self) -> anyhow::Result<String> {
        self.email
            .clone()
            .ok_or_else(|| anyhow!("email lookup unavailable"))
    }

    async fn refresh_data(&self) -> anyhow::Result<()> {
        *self.refresh_calls.lock().expect("lock") += 1;
        if self.fail_refresh {
            return Err(anyhow!("refresh hook unavailable"));
        }
        Ok(())
    }
}

fn target() -> PaymentIntentId {
    PaymentIntentId::new("pi_1")
}

fn cancellable_panel() -> CancelPanel {
    CancelPanel {
        form: CancelForm {
            target: Some(target()),
            acknowledged: true,
            current_status: Some(PaymentIntentStatus::RequiresCapture),
        },
        ..CancelPanel::default()
    }
}

#[test]
fn cancellable_statuses_match_the_platform_set() {
    for status in PaymentIntentStatus::CANCELLABLE {
        assert!(is_cancellable(Some(status)), "{status:?}");
    }
    assert!(!is_cancellable(Some(PaymentIntentStatus::Succeeded)));
    assert!(!is_cancellable(Some(PaymentIntentStatus::Canceled)));
    assert!(!is_cancellable(None));
}

#[test]
fn validity_requires_target_acknowledgment_and_cancellable_status() {
    assert!(form_is_valid(&cancellable_panel().form));

    let mut form = cancellable_panel().form;
    form.target = None;
    assert!(!form_is_valid(&form));

    let mut form = cancellable_panel().form;
    form.acknowledged = false;
    assert!(!form_is_valid(&form));

    let mut form = cancellable_panel().form;
    form.current_status = Some(PaymentIntentStatus::Succeeded);
    assert!(!form_is_valid(&form));

    let mut form = cancellable_panel().form;
    form.current_status = None;
    assert!(!form_is_valid(&form));
}

#[test]
fn init_without_target_surfaces_an_immediate_error() {
    let (state, effects) = init(None);
    assert_eq!(state.outcome, Some(Outcome::attention(MISSING_TARGET_MESSAGE)));
    assert_eq!(effects, vec![CancelEffect::FetchOperatorEmail]);
}

#[test]
fn init_with_target_fetches_email_and_status() {
    let (state, effects) = init(Some(target()));
    assert!(state.outcome.is_none());
    assert_eq!(
        effects,
        vec![
            CancelEffect::FetchOperatorEmail,
            CancelEffect::FetchIntentStatus(target()),
        ]
    );
}

#[test]
fn non_cancellable_status_suppresses_submission() {
    let mut panel = cancellable_panel();
    panel.form.current_status = Some(PaymentIntentStatus::Succeeded);

    let (state, effects) = reduce(panel, CancelEvent::SubmitPressed);
    assert!(effects.is_empty());
    assert!(!state.submitting);
}

#[test]
fn double_submit_emits_exactly_one_cancel_effect() {
    let (state, effects) = reduce(cancellable_panel(), CancelEvent::SubmitPressed);
    assert_eq!(effects.len(), 1);
    assert!(state.submitting);

    let (_, effects) = reduce(state, CancelEvent::SubmitPressed);
    assert!(effects.is_empty());
}

#[test]
fn successful_cancellation_updates_status_and_clears_acknowledgment() {
    let mut panel = cancellable_panel();
    panel.submitting = true;

    let (state, effects) = reduce(panel, CancelEvent::SubmitCompleted(Ok(target())));
    assert!(!state.submitting);
    assert_eq!(state.outcome, Some(Outcome::info("pi_1")));
    assert_eq!(state.form.current_status, Some(PaymentIntentStatus::Canceled));
    assert!(!state.form.acknowledged);
    assert_eq!(effects, vec![CancelEffect::RefreshDashboard]);
}

#[test]
fn failed_cancellation_clears_only_the_acknowledgment_flag() {
    let mut panel = cancellable_panel();
    panel.submitting = true;

    let (state, effects) = reduce(
        panel,
        CancelEvent::SubmitCompleted(Err("resource missing".to_string())),
    );
    assert!(effects.is_empty());
    assert_eq!(state.outcome, Some(Outcome::attention("resource missing")));
    assert!(!state.form.acknowledged);
    assert_eq!(
        state.form.current_status,
        Some(PaymentIntentStatus::RequiresCapture)
    );
    assert_eq!(state.form.target, Some(target()));
}

#[tokio::test]
async fn status_fetch_failure_leaves_the_panel_not_cancellable() {
    let api = ScriptedPaymentsApi::new().with_retrieve(Err(ApiError::new(
        ErrorCode::Network,
        "connection reset",
    )));
    let host = RecordingHost::without_email();

    let (state, effects) = init(Some(target()));
    assert!(run_effect(&api, &host, effects[1].clone()).await.is_none());
    assert!(!form_is_valid(&state.form));
}

#[tokio::test]
async fn cancel_submission_tags_metadata_and_reports_the_intent() {
    let api = ScriptedPaymentsApi::new()
        .with_cancel(Ok(ScriptedPaymentsApi::intent(
            "pi_1",
            PaymentIntentStatus::Canceled,
        )))
        .with_update(Ok(ScriptedPaymentsApi::intent(
            "pi_1",
            PaymentIntentStatus::Canceled,
        )));
    let host = RecordingHost::with_email("ops@example.com");

    let (state, effects) = reduce(cancellable_panel(), CancelEvent::SubmitPressed);
    let event = run_effect(&api, &host, effects[0].clone())
        .await
        .expect("completion event");
    let (state, effects) = reduce(state, event);

    assert_eq!(state.outcome, Some(Outcome::info("pi_1")));
    assert_eq!(effects, vec![CancelEffect::RefreshDashboard]);

    let updates = api.update_calls.lock().expect("lock");
    assert_eq!(updates.len(), 1);
    assert_eq!(
        updates[0].get(METADATA_APP_TAG_KEY).map(String::as_str),
        Some(APP_TAG)
    );
    assert!(!updates[0].contains_key(METADATA_EMAIL_KEY));
}

#[tokio::test]
async fn refresh_effect_invokes_the_host_hook_once() {
    let api = ScriptedPaymentsApi::new();
    let host = RecordingHost::with_email("ops@example.com");

    assert!(run_effect(&api, &host, CancelEffect::RefreshDashboard)
        .await
        .is_none());
    assert_eq!(*host.refresh_calls.lock().expect("lock"), 1);
}

#[tokio::test]
async fn refresh_failure_is_swallowed() {
    let api = ScriptedPaymentsApi::new();
    let mut host = RecordingHost::with_email("ops@example.com");
    host.fail_refresh = true;

    assert!(run_effect(&api, &host, CancelEffect::RefreshDashboard)
        .await
        .is_none());
    assert_eq!(*host.refresh_calls.lock().expect("lock"), 1);
}

#[tokio::test]
async fn cancel_rejection_surfaces_the_message_verbatim() {
    let api = ScriptedPaymentsApi::new().with_cancel(Err(ApiError::new(
        ErrorCode::NotFound,
        "resource missing",
    )));
    let host = RecordingHost::without_email();

    let (state, effects) = reduce(cancellable_panel(), CancelEvent::SubmitPressed);
    let event = run_effect(&api, &host, effects[0].clone())
        .await
        .expect("completion event");
    let (state, _) = reduce(state, event);

    assert_eq!(state.outcome, Some(Outcome::attention("resource missing")));
    assert!(!state.form.acknowledged);
    assert_eq!(
        state.form.current_status,
        Some(PaymentIntentStatus::RequiresCapture)
    );
    assert!(api.update_calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn metadata_update_failure_fails_the_whole_submission() {
    let api = ScriptedPaymentsApi::new()
        .with_cancel(Ok(ScriptedPaymentsApi::intent(
            "pi_1",
            PaymentIntentStatus::Canceled,
        )))
        .with_update(Err(ApiError::new(ErrorCode::RateLimited, "rate limited")));
    let host = RecordingHost::without_email();

    let (state, effects) = reduce(cancellable_panel(), CancelEvent::SubmitPressed);
    let event = run_effect(&api, &host, effects[0].clone())
        .await
        .expect("completion event");
    let (state, _) = reduce(state, event);

    assert_eq!(state.outcome, Some(Outcome::attention("rate limited")));
}

#[tokio::test]
async fn unexpected_cancel_status_is_reported_as_failure() {
    let api = ScriptedPaymentsApi::new()
        .with_cancel(Ok(ScriptedPaymentsApi::intent(
            "pi_1",
            PaymentIntentStatus::Processing,
        )))
        .with_update(Ok(ScriptedPaymentsApi::intent(
            "pi_1",
            PaymentIntentStatus::Processing,
        )));
    let host = RecordingHost::without_email();

    let (state, effects) = reduce(cancellable_panel(), CancelEvent::SubmitPressed);
    let event = run_effect(&api, &host, effects[0].clone())
        .await
        .expect("completion event");
    let (state, _) = reduce(state, event);

    let outcome = state.outcome.expect("outcome");
    assert_eq!(outcome.kind, shared::domain::OutcomeKind::Attention);
    assert_eq!(outcome.text, "failed to cancel the payment intent");
}

use std::collections::HashMap;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{
    domain::PaymentIntentId,
    error::{ApiError, ErrorCode},
};
use tracing::debug;
use uuid::Uuid;

use crate::{metadata_form_pairs, ApiResult, Charge, CreateChargeParams, PaymentIntent, PaymentsApi};

/// Pinned platform API version sent on every request.
pub const STRIPE_VERSION: &str = "2024-06-20";

pub struct HttpPaymentsApi {
    http: Client,
    api_base_url: String,
    secret_key: String,
}

impl HttpPaymentsApi {
    pub fn new(api_base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base_url: api_base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .header("Stripe-Version", STRIPE_VERSION)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(transport_error)?;
        decode_response(response).await
    }

    /// POSTs form-encoded pairs. Mutations carry a fresh idempotency key so a
    /// transport-level retry by the platform cannot double-apply.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: Vec<(String, String)>,
    ) -> ApiResult<T> {
        let response = self
            .request(Method::POST, path)
            .header("Idempotency-Key", Uuid::new_v4().to_string())
            .form(&pairs)
            .send()
            .await
            .map_err(transport_error)?;
        decode_response(response).await
    }
}

#[async_trait::async_trait]
impl PaymentsApi for HttpPaymentsApi {
    async fn create_charge(&self, params: CreateChargeParams) -> ApiResult<Charge> {
        debug!(
            amount = params.amount,
            currency = params.currency.code(),
            source = params.source.as_str(),
            "payments: creating charge"
        );
        self.post_form("/v1/charges", params.form_pairs()).await
    }

    async fn retrieve_payment_intent(&self, id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        self.get_json(&format!("/v1/payment_intents/{id}")).await
    }

    async fn cancel_payment_intent(&self, id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        debug!(payment_intent = id.as_str(), "payments: canceling intent");
        self.post_form(&format!("/v1/payment_intents/{id}/cancel"), Vec::new())
            .await
    }

    async fn update_payment_intent_metadata(
        &self,
        id: &PaymentIntentId,
        metadata: HashMap<String, String>,
    ) -> ApiResult<PaymentIntent> {
        self.post_form(
            &format!("/v1/payment_intents/{id}"),
            metadata_form_pairs(&metadata),
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(decode_error_body(status, &body));
    }

    serde_json::from_str(&body).map_err(|err| {
        ApiError::new(
            ErrorCode::Api,
            format!("invalid payments api response: {err}"),
        )
    })
}

/// Normalizes the platform's `{"error": {...}}` body into an `ApiError`,
/// keeping the message text intact for the operator.
fn decode_error_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| format!("payments api returned http {}", status.as_u16()));

    let code = match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Authentication,
        StatusCode::FORBIDDEN => ErrorCode::Permission,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ErrorCode::RateLimited,
        status if status.is_client_error() => ErrorCode::InvalidRequest,
        _ => ErrorCode::Api,
    };

    ApiError::new(code, message)
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::new(ErrorCode::Network, err.to_string())
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{
    domain::{AccountId, ChargeId, ChargeStatus, Currency, PaymentIntentId, PaymentIntentStatus},
    error::{ApiError, ErrorCode},
};

pub mod config;
mod http;

pub use http::{HttpPaymentsApi, STRIPE_VERSION};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateChargeParams {
    pub amount: i64,
    pub currency: Currency,
    pub source: AccountId,
    pub metadata: HashMap<String, String>,
}

impl CreateChargeParams {
    /// Flattens the params into the form-encoded pairs the platform expects,
    /// including the `metadata[key]` bracket notation for the metadata map.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("amount".to_string(), self.amount.to_string()),
            ("currency".to_string(), self.currency.code().to_string()),
            ("source".to_string(), self.source.to_string()),
        ];
        pairs.extend(metadata_form_pairs(&self.metadata));
        pairs
    }
}

pub fn metadata_form_pairs(metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut entries: Vec<_> = metadata.iter().collect();
    entries.sort();
    entries
        .into_iter()
        .map(|(key, value)| (format!("metadata[{key}]"), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: ChargeId,
    pub status: ChargeStatus,
    pub amount: i64,
    pub currency: Currency,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub status: PaymentIntentStatus,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentsApi: Send + Sync {
    async fn create_charge(&self, params: CreateChargeParams) -> ApiResult<Charge>;
    async fn retrieve_payment_intent(&self, id: &PaymentIntentId) -> ApiResult<PaymentIntent>;
    async fn cancel_payment_intent(&self, id: &PaymentIntentId) -> ApiResult<PaymentIntent>;
    async fn update_payment_intent_metadata(
        &self,
        id: &PaymentIntentId,
        metadata: HashMap<String, String>,
    ) -> ApiResult<PaymentIntent>;
}

pub struct MissingPaymentsApi;

fn unconfigured() -> ApiError {
    ApiError::new(
        ErrorCode::Api,
        "payments api is unavailable: no secret key configured",
    )
}

#[async_trait]
impl PaymentsApi for MissingPaymentsApi {
    async fn create_charge(&self, _params: CreateChargeParams) -> ApiResult<Charge> {
        Err(unconfigured())
    }

    async fn retrieve_payment_intent(&self, _id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        Err(unconfigured())
    }

    async fn cancel_payment_intent(&self, _id: &PaymentIntentId) -> ApiResult<PaymentIntent> {
        Err(unconfigured())
    }

    async fn update_payment_intent_metadata(
        &self,
        _id: &PaymentIntentId,
        _metadata: HashMap<String, String>,
    ) -> ApiResult<PaymentIntent> {
        Err(unconfigured())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

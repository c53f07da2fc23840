use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(AccountId);
id_newtype!(ChargeId);
id_newtype!(PaymentIntentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Jpy,
    Usd,
    Eur,
    Gbp,
    Aud,
    Cad,
    Sgd,
    Hkd,
}

impl Currency {
    pub const ALL: [Currency; 8] = [
        Currency::Jpy,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Aud,
        Currency::Cad,
        Currency::Sgd,
        Currency::Hkd,
    ];

    /// Lowercase ISO code as the payments platform expects it on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Jpy => "jpy",
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Gbp => "gbp",
            Currency::Aud => "aud",
            Currency::Cad => "cad",
            Currency::Sgd => "sgd",
            Currency::Hkd => "hkd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
            Currency::Cad => "CAD",
            Currency::Sgd => "SGD",
            Currency::Hkd => "HKD",
        }
    }

    pub fn from_code(raw: &str) -> Option<Currency> {
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(raw.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Succeeded,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl PaymentIntentStatus {
    /// Statuses the platform accepts a cancellation request for.
    pub const CANCELLABLE: [PaymentIntentStatus; 5] = [
        PaymentIntentStatus::RequiresPaymentMethod,
        PaymentIntentStatus::RequiresCapture,
        PaymentIntentStatus::RequiresConfirmation,
        PaymentIntentStatus::RequiresAction,
        PaymentIntentStatus::Processing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentIntentStatus::RequiresConfirmation => "requires_confirmation",
            PaymentIntentStatus::RequiresAction => "requires_action",
            PaymentIntentStatus::Processing => "processing",
            PaymentIntentStatus::RequiresCapture => "requires_capture",
            PaymentIntentStatus::Canceled => "canceled",
            PaymentIntentStatus::Succeeded => "succeeded",
        }
    }

    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    Live,
    Test,
}

impl EnvironmentMode {
    /// "live" selects live mode; anything else falls back to test.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("live") {
            EnvironmentMode::Live
        } else {
            EnvironmentMode::Test
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentMode::Live => "live",
            EnvironmentMode::Test => "test",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Info,
    Attention,
}

/// Result slot shown under a panel's submit control. Last write wins; a new
/// submission cycle overwrites the previous outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub text: String,
}

impl Outcome {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Info,
            text: text.into(),
        }
    }

    pub fn attention(text: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Attention,
            text: text.into(),
        }
    }
}

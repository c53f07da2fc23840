use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::domain::EnvironmentMode;

pub mod cancel;
pub mod debit;

pub const METADATA_APP_TAG_KEY: &str = "stripe_apps";
pub const METADATA_EMAIL_KEY: &str = "email";

/// Hosting-surface capabilities a panel may use: operator identity lookup and
/// the best-effort dashboard refresh hook.
#[async_trait]
pub trait DashboardHost: Send + Sync {
    async fn operator_email(&self) -> Result<String>;
    async fn refresh_data(&self) -> Result<()>;
}

pub struct MissingDashboardHost;

#[async_trait]
impl DashboardHost for MissingDashboardHost {
    async fn operator_email(&self) -> Result<String> {
        Err(anyhow!("dashboard host is unavailable: no operator email lookup"))
    }

    async fn refresh_data(&self) -> Result<()> {
        Ok(())
    }
}

/// Host backed by static configuration, used by the standalone surfaces that
/// have no real dashboard behind them.
pub struct ConfiguredDashboardHost {
    pub operator_email: Option<String>,
}

#[async_trait]
impl DashboardHost for ConfiguredDashboardHost {
    async fn operator_email(&self) -> Result<String> {
        self.operator_email
            .clone()
            .ok_or_else(|| anyhow!("no operator email configured"))
    }

    async fn refresh_data(&self) -> Result<()> {
        tracing::debug!("dashboard refresh requested");
        Ok(())
    }
}

/// Tags every outbound mutation with the fixed application marker, plus the
/// operator's email when the lookup resolved. The email entry is omitted
/// entirely when unresolved.
pub fn submission_metadata(
    app_tag: &str,
    operator_email: Option<&str>,
) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    metadata.insert(METADATA_APP_TAG_KEY.to_string(), app_tag.to_string());
    if let Some(email) = operator_email {
        metadata.insert(METADATA_EMAIL_KEY.to_string(), email.to_string());
    }
    metadata
}

pub fn dashboard_payment_url(
    dashboard_base_url: &str,
    mode: EnvironmentMode,
    payment_id: &str,
) -> String {
    let base = dashboard_base_url.trim_end_matches('/');
    match mode {
        EnvironmentMode::Live => format!("{base}/payments/{payment_id}"),
        EnvironmentMode::Test => format!("{base}/test/payments/{payment_id}"),
    }
}

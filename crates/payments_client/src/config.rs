use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use shared::domain::EnvironmentMode;
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub secret_key: String,
    pub api_base_url: String,
    pub mode: EnvironmentMode,
    pub dashboard_base_url: String,
    pub object_id: Option<String>,
    pub operator_email: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base_url: "https://api.stripe.com".into(),
            mode: EnvironmentMode::Test,
            dashboard_base_url: "https://dashboard.stripe.com".into(),
            object_id: None,
            operator_email: None,
        }
    }
}

/// Defaults, then an optional `panels.toml` string map, then environment
/// variables. Later layers win.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or_else(|| Path::new("panels.toml"));
    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("secret_key") {
                settings.secret_key = v.clone();
            }
            if let Some(v) = file_cfg.get("api_base_url") {
                settings.api_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("mode") {
                settings.mode = EnvironmentMode::parse(v);
            }
            if let Some(v) = file_cfg.get("dashboard_base_url") {
                settings.dashboard_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("object_id") {
                settings.object_id = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("operator_email") {
                settings.operator_email = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("PAYMENTS_SECRET_KEY") {
        settings.secret_key = v;
    }
    if let Ok(v) = std::env::var("APP__SECRET_KEY") {
        settings.secret_key = v;
    }

    if let Ok(v) = std::env::var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__MODE") {
        settings.mode = EnvironmentMode::parse(&v);
    }
    if let Ok(v) = std::env::var("APP__DASHBOARD_BASE_URL") {
        settings.dashboard_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__OBJECT_ID") {
        settings.object_id = Some(v);
    }
    if let Ok(v) = std::env::var("APP__OPERATOR_EMAIL") {
        settings.operator_email = Some(v);
    }

    settings
}

pub fn prepare_api_base_url(raw_base_url: &str) -> anyhow::Result<String> {
    let base_url = normalize_api_base_url(raw_base_url);
    Url::parse(&base_url)
        .with_context(|| format!("invalid payments api base url '{raw_base_url}'"))?;
    Ok(base_url)
}

fn normalize_api_base_url(raw_base_url: &str) -> String {
    let raw_base_url = raw_base_url.trim();

    if raw_base_url.is_empty() {
        return Settings::default().api_base_url;
    }

    let trimmed = raw_base_url.trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

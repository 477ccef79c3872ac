use std::collections::HashMap;
use std::env;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub bind_addr: String,
    pub database_url: String,
    /// Public base URL that permanent invite links are derived from.
    pub invite_base_url: String,
    /// Withholding rate applied to gross commission.
    pub tds_rate_percent: f64,
    /// When set, invite emails are POSTed to this endpoint; otherwise the
    /// in-memory stub dispatcher is used.
    pub email_webhook_url: Option<String>,
}

impl PortalConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_map(&env_map())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> AppResult<Self> {
        let tds_raw = get(vars, "PORTAL_TDS_RATE_PERCENT", "10");
        let tds_rate_percent: f64 = tds_raw.parse().map_err(|_| {
            AppError::Config(format!("PORTAL_TDS_RATE_PERCENT is not a number: {tds_raw}"))
        })?;
        if !(0.0..=100.0).contains(&tds_rate_percent) {
            return Err(AppError::Config(
                "PORTAL_TDS_RATE_PERCENT must be between 0 and 100".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: get(vars, "PORTAL_BIND_ADDR", "0.0.0.0:8080"),
            database_url: get(vars, "PORTAL_DATABASE_URL", "sqlite://propshare.db?mode=rwc"),
            invite_base_url: get(vars, "PORTAL_INVITE_BASE_URL", "https://propshare.in/join"),
            tds_rate_percent,
            email_webhook_url: optional(vars, "PORTAL_EMAIL_WEBHOOK_URL"),
        })
    }
}

fn env_map() -> HashMap<String, String> {
    env::vars().collect()
}

fn get(vars: &HashMap<String, String>, key: &str, default: &str) -> String {
    vars.get(key)
        .cloned()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).cloned().filter(|v| !v.is_empty())
}

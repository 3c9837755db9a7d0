use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub org: OrgConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// When unset (dev only), the service runs on the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

/// Organization identity printed on invoices and payment slips.
/// The slip account and reference are organization-wide values.
#[derive(Debug, Clone, Deserialize)]
pub struct OrgConfig {
    pub name: String,
    pub address: String,
    pub locality: String,
    pub email: String,
    pub slip_account: String,
    pub slip_reference: String,
}

impl BillingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => Some(url),
            Err(_) if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required in production but not set"
                )))
            }
            Err(_) => None,
        };

        Ok(BillingConfig {
            common,
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                port: get_env("SMTP_PORT", Some("587"), is_prod)?
                    .parse()
                    .unwrap_or(587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: get_env("SMTP_PASSWORD", Some(""), is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", Some("info@helvetia-umzug.ch"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Helvetia Umzug & Reinigung"), is_prod)?,
                enabled: env::var("SMTP_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            org: OrgConfig {
                name: get_env("ORG_NAME", Some("Helvetia Umzug & Reinigung GmbH"), is_prod)?,
                address: get_env("ORG_ADDRESS", Some("Werkstrasse 12"), is_prod)?,
                locality: get_env("ORG_LOCALITY", Some("8004 Zürich"), is_prod)?,
                email: get_env("ORG_EMAIL", Some("info@helvetia-umzug.ch"), is_prod)?,
                slip_account: get_env(
                    "SLIP_ACCOUNT",
                    Some("CH93 0076 2011 6238 5295 7"),
                    is_prod,
                )?,
                slip_reference: get_env("SLIP_REFERENCE", Some("RF18 5390 0754 7034"), is_prod)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

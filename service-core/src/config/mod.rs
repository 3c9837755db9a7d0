use crate::error::AppError;
use config::{Config as Loader, Environment, File};
use serde::Deserialize;

/// Settings every service in the workspace shares. Service-specific
/// configuration layers on top of this via `#[serde(flatten)]`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Default tracing filter; `RUST_LOG` still wins at runtime.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load from an optional `configuration.*` file with `APP__`-prefixed
    /// environment variables layered on top.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Loader::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn explicit_values_win_over_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"port": 9000, "log_level": "debug"}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, "debug");
    }
}

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use threadmark_core::ThreadRules;
use threadmark_sync::BackfillConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backfill: BackfillSettings,
    #[serde(default)]
    pub threads: ThreadRules,
    #[serde(default)]
    pub slack: SlackSettings,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub slack_bot_token: String,
    #[serde(default)]
    pub slack_signing_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackfillSettings {
    /// Lookback window in days
    pub days: u32,
    pub history_limit: u32,
    pub replies_limit: u32,
}

impl Default for BackfillSettings {
    fn default() -> Self {
        let defaults = BackfillConfig::default();
        Self {
            days: defaults.lookback_days,
            history_limit: defaults.history_limit,
            replies_limit: defaults.replies_limit,
        }
    }
}

impl From<&BackfillSettings> for BackfillConfig {
    fn from(settings: &BackfillSettings) -> Self {
        BackfillConfig::new()
            .with_lookback_days(settings.days)
            .with_history_limit(settings.history_limit)
            .with_replies_limit(settings.replies_limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackSettings {
    pub api_base: String,
}

impl Default for SlackSettings {
    fn default() -> Self {
        Self {
            api_base: "https://slack.com/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{ENV}.toml (if ENV is set)
    /// 4. THREADMARK_<SECTION>__<KEY> environment variables
    /// 5. BACKFILL_DAYS
    ///
    /// Fails when SLACK_BOT_TOKEN or SLACK_SIGNING_SECRET is missing.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("THREADMARK")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("threads.rename_prefixes")
                    .with_list_parse_key("threads.close_keywords")
                    .try_parsing(true),
            )
            .set_override_option("backfill.days", std::env::var("BACKFILL_DAYS").ok())?;

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.slack_bot_token = require_secret("SLACK_BOT_TOKEN")?;
        cfg.slack_signing_secret = require_secret("SLACK_SIGNING_SECRET")?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig::from(&self.backfill)
    }
}

fn require_secret(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Message(format!(
            "{} environment variable is required",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [backfill]
            days = 7
            history_limit = 200
            replies_limit = 500

            [threads]
            rename_prefixes = ["title:"]
            close_keywords = ["done"]

            [slack]
            api_base = "http://localhost:9999/api"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.backfill.days, 7);
        assert_eq!(config.threads.rename_prefixes, vec!["title:"]);
        assert_eq!(config.threads.close_keywords, vec!["done"]);
        assert_eq!(config.logging.format, "json");

        let backfill = config.backfill_config();
        assert_eq!(backfill.lookback_days, 7);
        assert_eq!(backfill.history_limit, 200);
        assert_eq!(backfill.replies_limit, 500);
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.backfill.days, 1);
        assert_eq!(config.threads, ThreadRules::default());
        assert_eq!(config.slack.api_base, "https://slack.com/api");
        assert!(config.slack_bot_token.is_empty());
    }

    #[test]
    fn test_default_toml_file_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.backfill.days, 1);
        assert_eq!(config.threads, ThreadRules::default());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let err = require_secret("THREADMARK_TEST_SECRET_THAT_IS_NEVER_SET").unwrap_err();
        assert!(err.to_string().contains("THREADMARK_TEST_SECRET_THAT_IS_NEVER_SET"));
    }
}

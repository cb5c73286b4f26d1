//! Configuration loader and validator for the Notion relay.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    #[serde(default)]
    pub production: bool,
    pub bind: String,
    pub database_url: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Notion OAuth client and API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notion {
    pub client_id: String,
    pub client_secret: String,
    pub version: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Database that receives uploads without an explicit parent.
    #[serde(default)]
    pub default_database: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base() -> String {
    crate::notion::transport::NOTION_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Load configuration from a YAML file, apply environment overrides and
/// validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    apply_overrides(&mut cfg, |key| std::env::var(key).ok());
    validate(&cfg)?;
    Ok(cfg)
}

/// Environment variables take precedence over the file:
/// `PRODUCTION`, `NOTION_CLIENT_ID`, `NOTION_SECRET`, `NOTION_TEST_DATABASE`,
/// `DATABASE_URL`, `BIND_ADDR`.
pub fn apply_overrides<F>(cfg: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("PRODUCTION") {
        cfg.app.production = v.trim() == "1";
    }
    if let Some(v) = lookup("NOTION_CLIENT_ID") {
        cfg.notion.client_id = v;
    }
    if let Some(v) = lookup("NOTION_SECRET") {
        cfg.notion.client_secret = v;
    }
    if let Some(v) = lookup("NOTION_TEST_DATABASE") {
        cfg.notion.default_database = Some(v).filter(|v| !v.trim().is_empty());
    }
    if let Some(v) = lookup("DATABASE_URL") {
        cfg.app.database_url = v;
    }
    if let Some(v) = lookup("BIND_ADDR") {
        cfg.app.bind = v;
    }
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.bind.trim().is_empty() {
        return Err(ConfigError::Invalid("app.bind must be non-empty"));
    }
    if cfg.app.database_url.trim().is_empty() {
        return Err(ConfigError::Invalid("app.database_url must be non-empty"));
    }

    if cfg.notion.client_id.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.client_id must be non-empty"));
    }
    if cfg.notion.client_secret.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.client_secret must be non-empty"));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.notion.api_base).is_err() {
        return Err(ConfigError::Invalid("notion.api_base must be a valid URL"));
    }
    if cfg.notion.timeout_secs == 0 {
        return Err(ConfigError::Invalid("notion.timeout_secs must be > 0"));
    }
    Ok(())
}

/// Example configuration document.
pub fn example() -> &'static str {
    r#"app:
  production: false
  bind: "127.0.0.1:5000"
  database_url: "sqlite://./data/relay.db"
  cors_origins:
    - "http://localhost:9000"

notion:
  client_id: "YOUR_NOTION_OAUTH_CLIENT_ID"
  client_secret: "YOUR_NOTION_OAUTH_CLIENT_SECRET"
  version: "2022-06-28"
  redirect_uri: null
  default_database: "NOTION_TEST_DATABASE_ID"
  timeout_secs: 30
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn example_cfg() -> Config {
        serde_yaml::from_str(example()).unwrap()
    }

    #[test]
    fn parse_example_ok() {
        let cfg = example_cfg();
        validate(&cfg).unwrap();
        assert_eq!(cfg.notion.api_base, "https://api.notion.com/");
        assert_eq!(cfg.notion.default_database.as_deref(), Some("NOTION_TEST_DATABASE_ID"));
        assert!(!cfg.app.production);
    }

    #[test]
    fn invalid_credentials() {
        let mut cfg = example_cfg();
        cfg.notion.client_id = "".into();
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("client_id")),
            _ => panic!("wrong error"),
        }

        let mut cfg = example_cfg();
        cfg.notion.client_secret = "  ".into();
        match validate(&cfg).unwrap_err() {
            ConfigError::Invalid(msg) => assert!(msg.contains("client_secret")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_app_and_transport_settings() {
        let mut cfg = example_cfg();
        cfg.app.database_url = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_cfg();
        cfg.notion.api_base = "not a url".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = example_cfg();
        cfg.notion.timeout_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("PRODUCTION", "1"),
            ("NOTION_CLIENT_ID", "env-client"),
            ("NOTION_SECRET", "env-secret"),
            ("NOTION_TEST_DATABASE", ""),
            ("DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();
        let mut cfg = example_cfg();
        apply_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));
        assert!(cfg.app.production);
        assert_eq!(cfg.notion.client_id, "env-client");
        assert_eq!(cfg.notion.client_secret, "env-secret");
        assert_eq!(cfg.notion.default_database, None);
        assert_eq!(cfg.app.database_url, "sqlite::memory:");
        assert_eq!(cfg.app.bind, "127.0.0.1:5000");
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.app.cors_origins, vec!["http://localhost:9000"]);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

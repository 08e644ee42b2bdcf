use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default config file location (extension resolved by the `config` crate)
pub const DEFAULT_CONFIG_PATH: &str = "config/telegram-gateway";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct TelegramConfig {
    pub api_id: Option<i32>,
    pub api_hash: Option<String>,
    pub session_path: PathBuf,
}

/// Application credentials issued by my.telegram.org
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_id: i32,
    pub api_hash: String,
}

impl TelegramConfig {
    /// Both values must be present and non-empty before anything connects.
    pub fn credentials(&self) -> Result<Credentials> {
        let api_id = match self.api_id {
            Some(id) if id > 0 => id,
            Some(id) => bail!("TELEGRAM_API_ID must be a positive integer, got {}", id),
            None => bail!("TELEGRAM_API_ID is not set. Please check your environment or config file."),
        };

        let api_hash = match self.api_hash.as_deref().map(str::trim) {
            Some(hash) if !hash.is_empty() => hash.to_string(),
            _ => bail!("TELEGRAM_API_HASH is not set. Please check your environment or config file."),
        };

        Ok(Credentials { api_id, api_hash })
    }
}

impl Config {
    /// Layered load: defaults, optional file at `path`, `GATEWAY_*` env
    /// (`__` as the nesting separator), then the `TELEGRAM_*` variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "telegram-gateway")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 5000)?
            .set_default("telegram.session_path", "session_name.session")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("telegram.api_id", non_empty_env("TELEGRAM_API_ID"))?
            .set_override_option("telegram.api_hash", non_empty_env("TELEGRAM_API_HASH"))?
            .set_override_option("telegram.session_path", non_empty_env("TELEGRAM_SESSION_PATH"))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_from(contents: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("gateway.toml")).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        let path = dir.path().join("gateway");
        Config::load(path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_apply_without_file() {
        let cfg = Config::load("does/not/exist/gateway").unwrap();
        assert_eq!(cfg.service.name, "telegram-gateway");
        assert_eq!(cfg.service.http.port, 5000);
        assert_eq!(cfg.http_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_file_values_override_defaults() {
        let cfg = load_from(
            r#"
[service.http]
bind = "127.0.0.1"
port = 8088

[telegram]
api_id = 12345
api_hash = "0123456789abcdef"
session_path = "/tmp/gateway.session"
"#,
        );

        assert_eq!(cfg.http_addr(), "127.0.0.1:8088");
        assert_eq!(cfg.telegram.session_path, PathBuf::from("/tmp/gateway.session"));

        let creds = cfg.telegram.credentials().unwrap();
        assert_eq!(creds.api_id, 12345);
        assert_eq!(creds.api_hash, "0123456789abcdef");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let telegram = TelegramConfig {
            api_id: None,
            api_hash: Some("abc".to_string()),
            session_path: PathBuf::from("x.session"),
        };
        let err = telegram.credentials().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_API_ID"));

        let telegram = TelegramConfig {
            api_id: Some(1),
            api_hash: Some("   ".to_string()),
            session_path: PathBuf::from("x.session"),
        };
        let err = telegram.credentials().unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_API_HASH"));
    }

    #[test]
    fn test_non_positive_api_id_rejected() {
        let telegram = TelegramConfig {
            api_id: Some(0),
            api_hash: Some("abc".to_string()),
            session_path: PathBuf::from("x.session"),
        };
        assert!(telegram.credentials().is_err());
    }
}

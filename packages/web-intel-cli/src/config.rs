use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use web_intel::SecretString;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: SecretString,
    pub openai_base_url: Option<String>,
    pub model: Option<String>,
    pub database_url: Option<String>,
    pub fetch_timeout: Option<Duration>,
    pub synthesis_timeout: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| get(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY")
                .context("OPENAI_API_KEY must be set")?
                .into(),
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("WEB_INTEL_MODEL"),
            database_url: get("WEB_INTEL_DATABASE_URL"),
            fetch_timeout: secs(get("WEB_INTEL_FETCH_TIMEOUT_SECS"))
                .context("WEB_INTEL_FETCH_TIMEOUT_SECS must be a whole number of seconds")?,
            synthesis_timeout: secs(get("WEB_INTEL_SYNTHESIS_TIMEOUT_SECS"))
                .context("WEB_INTEL_SYNTHESIS_TIMEOUT_SECS must be a whole number of seconds")?,
        })
    }
}

fn secs(value: Option<String>) -> Result<Option<Duration>> {
    value
        .map(|v| -> Result<Duration> {
            let secs: u64 = v.trim().parse()?;
            anyhow::ensure!(secs > 0, "timeout must be positive");
            Ok(Duration::from_secs(secs))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_api_key_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("OPENAI_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_optional_settings() {
        let config = load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("WEB_INTEL_MODEL", "gpt-4o"),
            ("WEB_INTEL_FETCH_TIMEOUT_SECS", "10"),
        ])
        .unwrap();

        assert_eq!(config.openai_api_key.expose(), "sk-test");
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.synthesis_timeout, None);
        assert_eq!(config.database_url, None);
        assert!(!format!("{:?}", config).contains("sk-test"));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let err = load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("WEB_INTEL_SYNTHESIS_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WEB_INTEL_SYNTHESIS_TIMEOUT_SECS"));

        assert!(load(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("WEB_INTEL_FETCH_TIMEOUT_SECS", "0"),
        ])
        .is_err());
    }
}

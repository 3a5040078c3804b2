//! Application configuration, loaded once at startup.
//!
//! Environment variables:
//! - `OPENAI_API_KEY` (required)
//! - `OPENAI_BASE_URL` (default `https://api.openai.com/v1`)
//! - `OPENAI_MODEL` (default `gpt-4`)
//! - `OPENAI_TEMPERATURE` (default `0.7`)
//! - `OPENAI_TIMEOUT_SECS` (optional)
//! - `AWS_REGION`, then `AWS_DEFAULT_REGION` (default `us-east-1`)

use std::time::Duration;

use crate::client::ClientError;
use crate::options::{
    HttpTransport, ModelOptions, SecretString, TransportOptions, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Completion endpoint settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Option<Duration>,
}

/// Cloud account settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub default_region: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub cloud: CloudConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup. Blank values count as unset.
    ///
    /// # Example
    /// ```
    /// use infrasight::config::AppConfig;
    ///
    /// let config = AppConfig::from_lookup(|key| match key {
    ///     "OPENAI_API_KEY" => Some("sk-test".to_string()),
    ///     "OPENAI_MODEL" => Some("gpt-4o".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.openai.model, "gpt-4o");
    /// assert_eq!(config.cloud.default_region, "us-east-1");
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| ClientError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let temperature = match get("OPENAI_TEMPERATURE") {
            Some(raw) => raw.trim().parse::<f32>().map_err(|e| {
                ClientError::Config(format!("OPENAI_TEMPERATURE {:?}: {}", raw, e))
            })?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout = get("OPENAI_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ClientError::Config(format!("OPENAI_TIMEOUT_SECS {:?}: {}", raw, e))
                })
            })
            .transpose()?;

        let default_region = get("AWS_REGION")
            .or_else(|| get("AWS_DEFAULT_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            openai: OpenAiConfig {
                api_key: SecretString::new(api_key),
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature,
                timeout,
            },
            cloud: CloudConfig { default_region },
        })
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions::default()
            .with_model(self.openai.model.clone())
            .with_temperature(self.openai.temperature)
    }

    pub fn transport_options(&self) -> TransportOptions<HttpTransport> {
        TransportOptions {
            timeout: self.openai.timeout,
            provider: HttpTransport::new(self.openai.api_key.clone())
                .with_base_url(self.openai.base_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.openai.api_key.expose_secret(), "sk-test");
        assert_eq!(config.openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.openai.model, "gpt-4");
        assert_eq!(config.openai.temperature, 0.7);
        assert_eq!(config.openai.timeout, None);
        assert_eq!(config.cloud.default_region, "us-east-1");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9000/v1"),
            ("OPENAI_TEMPERATURE", " 0.25 "),
            ("OPENAI_TIMEOUT_SECS", "90"),
            ("AWS_DEFAULT_REGION", "eu-west-2"),
        ]))
        .unwrap();

        assert_eq!(config.openai.temperature, 0.25);
        assert_eq!(config.openai.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.cloud.default_region, "eu-west-2");

        let transport = config.transport_options();
        assert_eq!(transport.timeout, Some(Duration::from_secs(90)));
        assert_eq!(
            transport.provider.base_url.as_deref(),
            Some("http://localhost:9000/v1")
        );

        let model = config.model_options();
        assert_eq!(model.model, "gpt-4");
        assert_eq!(model.temperature, 0.25);
    }

    #[test]
    fn test_aws_region_wins_over_default_region() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AWS_REGION", "ap-south-1"),
            ("AWS_DEFAULT_REGION", "eu-west-2"),
        ]))
        .unwrap();
        assert_eq!(config.cloud.default_region, "ap-south-1");
    }

    #[test]
    fn test_missing_key() {
        let err = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_bad_temperature() {
        let err = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_TEMPERATURE", "warm"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_TEMPERATURE"));
    }
}

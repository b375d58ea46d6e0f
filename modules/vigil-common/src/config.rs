use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::VigilError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Mistral,
    Claude,
}

impl FromStr for LlmProvider {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mistral" => Ok(LlmProvider::Mistral),
            "claude" | "anthropic" => Ok(LlmProvider::Claude),
            other => Err(VigilError::Config(format!(
                "VIGIL_LLM_PROVIDER must be 'mistral' or 'claude', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Mistral => write!(f, "mistral"),
            LlmProvider::Claude => write!(f, "claude"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Only the model keys are secrets; every engine knob has a default.
#[derive(Debug, Clone)]
pub struct Config {
    // AI
    pub llm_provider: LlmProvider,
    /// `None` means the provider's default model.
    pub llm_model: Option<String>,
    pub mistral_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,

    // Providers
    pub waqi_token: String,
    pub provider_timeout: Duration,
    pub seismic_radius_km: f64,

    // Engine
    pub cluster_radius_m: f64,
    pub generation_timeout: Duration,
    pub generation_max_attempts: u32,
    pub max_concurrent_clusters: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, VigilError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` is this over `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, VigilError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let llm_provider = match var("VIGIL_LLM_PROVIDER") {
            Some(v) => v.parse()?,
            None => LlmProvider::Mistral,
        };

        let config = Self {
            llm_provider,
            llm_model: var("VIGIL_LLM_MODEL"),
            mistral_api_key: var("MISTRAL_API_KEY"),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            waqi_token: var("WAQI_TOKEN").unwrap_or_else(|| "demo".to_string()),
            provider_timeout: Duration::from_secs(parse_or(&var, "VIGIL_PROVIDER_TIMEOUT_SECS", 5)?),
            seismic_radius_km: parse_or(&var, "VIGIL_SEISMIC_RADIUS_KM", 150.0)?,
            cluster_radius_m: parse_or(&var, "VIGIL_CLUSTER_RADIUS_M", 500.0)?,
            generation_timeout: Duration::from_secs(parse_or(
                &var,
                "VIGIL_GENERATION_TIMEOUT_SECS",
                30,
            )?),
            generation_max_attempts: parse_or(&var, "VIGIL_GENERATION_MAX_ATTEMPTS", 1)?,
            max_concurrent_clusters: parse_or(&var, "VIGIL_MAX_CONCURRENT_CLUSTERS", 4)?,
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), VigilError> {
        if !(self.cluster_radius_m > 0.0) {
            return Err(VigilError::Config("VIGIL_CLUSTER_RADIUS_M must be positive".into()));
        }
        if !(self.seismic_radius_km > 0.0) {
            return Err(VigilError::Config("VIGIL_SEISMIC_RADIUS_KM must be positive".into()));
        }
        if self.generation_max_attempts == 0 {
            return Err(VigilError::Config(
                "VIGIL_GENERATION_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        if self.max_concurrent_clusters == 0 {
            return Err(VigilError::Config(
                "VIGIL_MAX_CONCURRENT_CLUSTERS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// API key for the selected provider.
    pub fn llm_api_key(&self) -> Result<&str, VigilError> {
        let (key, name) = match self.llm_provider {
            LlmProvider::Mistral => (&self.mistral_api_key, "MISTRAL_API_KEY"),
            LlmProvider::Claude => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
        };
        key.as_deref()
            .ok_or_else(|| VigilError::Config(format!("{name} environment variable is required")))
    }

    pub fn log_redacted(&self) {
        info!(
            provider = %self.llm_provider,
            model = self.llm_model.as_deref().unwrap_or("(default)"),
            mistral_api_key = %key_preview(self.mistral_api_key.as_deref()),
            anthropic_api_key = %key_preview(self.anthropic_api_key.as_deref()),
            cluster_radius_m = self.cluster_radius_m,
            generation_timeout_secs = self.generation_timeout.as_secs(),
            generation_max_attempts = self.generation_max_attempts,
            provider_timeout_secs = self.provider_timeout.as_secs(),
            max_concurrent_clusters = self.max_concurrent_clusters,
            "Config loaded"
        );
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, VigilError> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| VigilError::Config(format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

/// First few characters of a secret plus its length, for logs.
fn key_preview(val: Option<&str>) -> String {
    match val {
        Some(v) => {
            let head: String = v.chars().take(5).collect();
            format!("{head}...({} chars)", v.chars().count())
        }
        None => "(not set)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.llm_provider, LlmProvider::Mistral);
        assert_eq!(config.cluster_radius_m, 500.0);
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
        assert_eq!(config.generation_max_attempts, 1);
        assert_eq!(config.provider_timeout, Duration::from_secs(5));
        assert_eq!(config.seismic_radius_km, 150.0);
        assert_eq!(config.max_concurrent_clusters, 4);
        assert_eq!(config.waqi_token, "demo");
        assert!(config.llm_model.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("VIGIL_LLM_PROVIDER", "Claude"),
            ("ANTHROPIC_API_KEY", "sk-ant-123456"),
            ("VIGIL_CLUSTER_RADIUS_M", "750"),
            ("VIGIL_GENERATION_MAX_ATTEMPTS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.llm_provider, LlmProvider::Claude);
        assert_eq!(config.cluster_radius_m, 750.0);
        assert_eq!(config.generation_max_attempts, 3);
        assert_eq!(config.llm_api_key().unwrap(), "sk-ant-123456");
    }

    #[test]
    fn missing_key_for_selected_provider_is_config_error() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-ant")])).unwrap();
        assert!(matches!(config.llm_api_key(), Err(VigilError::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("VIGIL_CLUSTER_RADIUS_M", "wide")])).is_err());
        assert!(Config::from_lookup(lookup(&[("VIGIL_CLUSTER_RADIUS_M", "-1")])).is_err());
        assert!(Config::from_lookup(lookup(&[("VIGIL_GENERATION_MAX_ATTEMPTS", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("VIGIL_LLM_PROVIDER", "gpt")])).is_err());
    }

    #[test]
    fn key_preview_is_char_safe() {
        assert_eq!(key_preview(None), "(not set)");
        assert_eq!(key_preview(Some("sk-ant-123456")), "sk-an...(13 chars)");
        assert_eq!(key_preview(Some("ключ-123456")), "ключ-...(11 chars)");
        assert_eq!(key_preview(Some("é")), "é...(1 chars)");
    }
}

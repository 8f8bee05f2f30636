use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub(crate) const SCORER_URL_ENV: &str = "AWS_ENDPOINT";
pub(crate) const GENERATOR_URL_ENV: &str = "GEMINI_API_URL";
pub(crate) const GENERATOR_KEY_ENV: &str = "GEMINI_API_KEY";

/// Looks up an environment variable by name.
pub(crate) type EnvLookup = fn(&str) -> Option<String>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProxyConfig {
    #[serde(default)]
    pub(crate) predict: PredictConfig,
    #[serde(default)]
    pub(crate) recommend: RecommendConfig,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PredictConfig {
    pub(crate) endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecommendConfig {
    pub(crate) api_url: Option<String>,
    pub(crate) api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GeneratorTarget {
    pub(crate) url: String,
    pub(crate) api_key: Option<String>,
}

fn validate_proxy_config(config: &ProxyConfig) -> anyhow::Result<()> {
    let urls = [
        ("predict.endpoint", config.predict.endpoint.as_deref()),
        ("recommend.api_url", config.recommend.api_url.as_deref()),
    ];
    for (label, url) in urls {
        let Some(url) = url.map(str::trim) else {
            continue;
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("{} must be an http(s) url", label);
        }
    }
    Ok(())
}

pub(crate) fn load_proxy_config(path: Option<&Path>) -> anyhow::Result<ProxyConfig> {
    let Some(path) = path else {
        return Ok(ProxyConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: ProxyConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    validate_proxy_config(&config)?;
    Ok(config)
}

/// Upstream locations, resolved on every request so that environment changes
/// apply without a restart. Environment values win over the config file.
pub(crate) struct UpstreamSettings {
    config: ProxyConfig,
    lookup: EnvLookup,
}

impl UpstreamSettings {
    pub(crate) fn new(config: ProxyConfig, lookup: EnvLookup) -> Self {
        Self { config, lookup }
    }

    pub(crate) fn from_process_env(config: ProxyConfig) -> Self {
        Self::new(config, read_process_env)
    }

    pub(crate) fn scorer_endpoint(&self) -> anyhow::Result<String> {
        self.resolve(SCORER_URL_ENV, self.config.predict.endpoint.as_deref())
            .ok_or_else(|| anyhow::anyhow!("{} is not configured", SCORER_URL_ENV))
    }

    pub(crate) fn generator(&self) -> anyhow::Result<GeneratorTarget> {
        let url = self
            .resolve(GENERATOR_URL_ENV, self.config.recommend.api_url.as_deref())
            .ok_or_else(|| anyhow::anyhow!("{} is not configured", GENERATOR_URL_ENV))?;
        let api_key = self.resolve(GENERATOR_KEY_ENV, self.config.recommend.api_key.as_deref());
        Ok(GeneratorTarget { url, api_key })
    }

    /// Names of upstream settings that currently resolve to nothing.
    pub(crate) fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.scorer_endpoint().is_err() {
            missing.push(SCORER_URL_ENV);
        }
        match self.generator() {
            Ok(target) if target.api_key.is_none() => missing.push(GENERATOR_KEY_ENV),
            Ok(_) => {}
            Err(_) => missing.push(GENERATOR_URL_ENV),
        }
        missing
    }

    fn resolve(&self, key: &str, fallback: Option<&str>) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| {
                fallback
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            })
    }
}

fn read_process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

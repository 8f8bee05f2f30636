use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use risk_protocol::{
    IntakeRecord, PredictResponse, RecommendRequest, RecommendResponse, PREDICT_PATH,
    RECOMMEND_PATH,
};
use serde_json::Number;

/// The two proxy calls a submission makes.
#[async_trait]
pub trait RiskApi: Send + Sync {
    async fn predict(&self, record: &IntakeRecord) -> anyhow::Result<Number>;
    async fn recommend(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Talks to a running `risk-proxy`.
pub struct HttpRiskApi {
    base_url: String,
    http: Client,
}

impl HttpRiskApi {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            anyhow::bail!("server url is empty");
        }
        let http = Client::builder()
            .user_agent("risk-intake")
            .build()
            .context("failed to build http client")?;
        Ok(Self { base_url, http })
    }

    fn url(&self, path: &str) -> String {
        join_base_path(&self.base_url, path)
    }
}

#[async_trait]
impl RiskApi for HttpRiskApi {
    async fn predict(&self, record: &IntakeRecord) -> anyhow::Result<Number> {
        let url = self.url(PREDICT_PATH);
        let response = self
            .http
            .post(&url)
            .json(record)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?
            .error_for_status()?;
        let body: PredictResponse = response.json().await.context("invalid predict response")?;
        Ok(body.prediction)
    }

    async fn recommend(&self, prompt: &str) -> anyhow::Result<String> {
        let url = self.url(RECOMMEND_PATH);
        let request = RecommendRequest {
            prompt: prompt.to_string(),
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {url} failed"))?
            .error_for_status()?;
        let body: RecommendResponse = response
            .json()
            .await
            .context("invalid recommend response")?;
        Ok(body.text)
    }
}

pub fn join_base_path(base: &str, path: &str) -> String {
    let normalized_base = base.trim().trim_end_matches('/');
    let normalized_path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    format!("{normalized_base}{normalized_path}")
}

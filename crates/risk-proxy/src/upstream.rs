use std::time::Instant;

use anyhow::Context;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::{json, Number, Value};
use uuid::Uuid;

use crate::config::GeneratorTarget;

pub(crate) fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent("risk-proxy").build()
}

/// Forwards an intake record to the scorer untouched and unwraps the
/// prediction from its reply.
pub(crate) async fn request_prediction(
    http: &Client,
    request_id: Uuid,
    endpoint: &str,
    record: Bytes,
) -> anyhow::Result<Number> {
    let started = Instant::now();
    let response = http
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(record)
        .send()
        .await
        .context("scorer request failed")?;
    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read scorer response")?;
    tracing::info!(
        event = "predict.upstream",
        request_id = %request_id,
        status = %status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        body_len = body.len(),
    );
    if !status.is_success() {
        anyhow::bail!(
            "scorer returned {} body={}",
            status,
            escape_log_body(&body)
        );
    }
    parse_prediction_envelope(&body)
}

/// The scorer sits behind a gateway that wraps its JSON reply in a string:
/// `{"body": "{\"prediction\": 2}"}`.
pub(crate) fn parse_prediction_envelope(raw: &str) -> anyhow::Result<Number> {
    let envelope: Value = serde_json::from_str(raw).context("scorer reply is not JSON")?;
    let inner = envelope
        .get("body")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("scorer reply has no string body"))?;
    let payload: Value = serde_json::from_str(inner).context("scorer body is not JSON")?;
    match payload.get("prediction") {
        Some(Value::Number(prediction)) => Ok(prediction.clone()),
        Some(other) => anyhow::bail!("scorer prediction is not a number: {}", other),
        None => anyhow::bail!("scorer body has no prediction"),
    }
}

pub(crate) fn generation_payload(prompt: &str) -> Value {
    json!({
        "contents": [
            {
                "parts": [
                    { "text": prompt }
                ]
            }
        ]
    })
}

pub(crate) async fn request_generation(
    http: &Client,
    request_id: Uuid,
    target: &GeneratorTarget,
    prompt: &str,
) -> anyhow::Result<String> {
    let mut request = http.post(&target.url).json(&generation_payload(prompt));
    match target.api_key.as_deref() {
        Some(key) => request = request.query(&[("key", key)]),
        None => tracing::warn!(
            event = "recommend.no_api_key",
            request_id = %request_id,
            "generator api key not configured"
        ),
    }
    let started = Instant::now();
    let response = request.send().await.context("generator request failed")?;
    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read generator response")?;
    tracing::info!(
        event = "recommend.upstream",
        request_id = %request_id,
        status = %status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        body_len = body.len(),
    );
    if !status.is_success() {
        anyhow::bail!(
            "generator returned {} body={}",
            status,
            escape_log_body(&body)
        );
    }
    extract_generated_text(&body)
}

/// Text of the first part of the first candidate, or empty when the
/// generator produced nothing.
pub(crate) fn extract_generated_text(raw: &str) -> anyhow::Result<String> {
    let value: Value = serde_json::from_str(raw).context("generator reply is not JSON")?;
    let candidates = value
        .get("candidates")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("generator reply has no candidates"))?;
    let text = candidates
        .first()
        .and_then(|candidate| candidate.pointer("/content/parts/0/text"))
        .and_then(Value::as_str)
        .unwrap_or("");
    Ok(text.to_string())
}

fn escape_log_body(body: &str) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    body.replace('\n', "\\n").replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_double_encoded_prediction() {
        let prediction = parse_prediction_envelope(r#"{"body": "{\"prediction\": 2}"}"#)
            .expect("prediction");
        assert_eq!(prediction.as_i64(), Some(2));
    }

    #[test]
    fn keeps_extra_envelope_fields_out_of_the_way() {
        let raw = r#"{"statusCode": 200, "body": "{\"prediction\": 1, \"model\": \"v3\"}"}"#;
        assert_eq!(parse_prediction_envelope(raw).unwrap().as_i64(), Some(1));
    }

    #[test]
    fn rejects_an_already_decoded_body() {
        let err = parse_prediction_envelope(r#"{"body": {"prediction": 2}}"#).unwrap_err();
        assert!(err.to_string().contains("no string body"));
    }

    #[test]
    fn rejects_bodies_without_a_numeric_prediction() {
        assert!(parse_prediction_envelope(r#"{"body": "{}"}"#).is_err());
        assert!(parse_prediction_envelope(r#"{"body": "{\"prediction\": \"2\"}"}"#).is_err());
        assert!(parse_prediction_envelope(r#"{"body": "not json"}"#).is_err());
        assert!(parse_prediction_envelope("<html>").is_err());
    }

    #[test]
    fn generation_payload_nests_prompt_in_parts() {
        let payload = generation_payload("hello");
        assert_eq!(
            payload.pointer("/contents/0/parts/0/text"),
            Some(&Value::String("hello".to_string()))
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let raw = r#"{"candidates": [
            {"content": {"parts": [{"text": "* one\n* two"}, {"text": "ignored"}]}},
            {"content": {"parts": [{"text": "second"}]}}
        ]}"#;
        assert_eq!(extract_generated_text(raw).unwrap(), "* one\n* two");
    }

    #[test]
    fn missing_candidate_content_yields_empty_text() {
        assert_eq!(extract_generated_text(r#"{"candidates": []}"#).unwrap(), "");
        assert_eq!(
            extract_generated_text(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap(),
            ""
        );
    }

    #[test]
    fn reply_without_candidates_is_an_error() {
        assert!(extract_generated_text(r#"{"error": {"code": 400}}"#).is_err());
    }

    #[test]
    fn escape_log_body_flattens_newlines() {
        assert_eq!(escape_log_body(""), "<empty>");
        assert_eq!(escape_log_body("a\nb\r"), "a\\nb\\r");
    }
}

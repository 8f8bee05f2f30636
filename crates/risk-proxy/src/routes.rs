use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use risk_protocol::{
    PredictResponse, RecommendRequest, RecommendResponse, PREDICT_PATH, RECOMMEND_PATH,
};
use uuid::Uuid;

use crate::config::UpstreamSettings;
use crate::error::{ProxyError, ProxyRoute};
use crate::upstream::{request_generation, request_prediction};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) http: reqwest::Client,
    pub(crate) settings: Arc<UpstreamSettings>,
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(PREDICT_PATH, post(predict).fallback(method_not_allowed))
        .route(RECOMMEND_PATH, post(recommend).fallback(method_not_allowed))
        .with_state(state)
        .layer(middleware::from_fn(log_http_request))
}

async fn health() -> &'static str {
    "ok"
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

async fn predict(
    State(state): State<AppState>,
    record: Bytes,
) -> Result<Json<PredictResponse>, ProxyError> {
    let request_id = Uuid::new_v4();
    let fail = || ProxyError::upstream(ProxyRoute::Predict, request_id);
    let endpoint = state.settings.scorer_endpoint().map_err(fail())?;
    tracing::info!(
        event = "predict.request",
        request_id = %request_id,
        body_len = record.len(),
    );
    let prediction = request_prediction(&state.http, request_id, &endpoint, record)
        .await
        .map_err(fail())?;
    tracing::info!(
        event = "predict.ok",
        request_id = %request_id,
        prediction = %prediction,
    );
    Ok(Json(PredictResponse { prediction }))
}

async fn recommend(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecommendResponse>, ProxyError> {
    let request_id = Uuid::new_v4();
    let fail = || ProxyError::upstream(ProxyRoute::Recommend, request_id);
    let request: RecommendRequest = serde_json::from_slice(&body)
        .map_err(|err| anyhow::anyhow!("invalid recommend request: {}", err))
        .map_err(fail())?;
    let target = state.settings.generator().map_err(fail())?;
    tracing::info!(
        event = "recommend.request",
        request_id = %request_id,
        prompt_len = request.prompt.len(),
    );
    let text = request_generation(&state.http, request_id, &target, &request.prompt)
        .await
        .map_err(fail())?;
    tracing::info!(
        event = "recommend.ok",
        request_id = %request_id,
        text_len = text.len(),
    );
    Ok(Json(RecommendResponse { text }))
}

async fn log_http_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "http request"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PredictConfig, ProxyConfig, RecommendConfig};
    use axum::extract::Query;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn app(predict: Option<String>, recommend: Option<String>) -> Router {
        let config = ProxyConfig {
            predict: PredictConfig { endpoint: predict },
            recommend: RecommendConfig {
                api_url: recommend,
                api_key: Some("test-key".to_string()),
            },
        };
        build_router(AppState {
            http: reqwest::Client::new(),
            settings: Arc::new(UpstreamSettings::new(config, no_env)),
        })
    }

    async fn spawn_upstream(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    async fn closed_upstream() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        format!("http://{addr}")
    }

    async fn call(router: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = router.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn predict_forwards_record_and_unwraps_envelope() {
        let received: Arc<Mutex<Vec<Bytes>>> = Arc::default();
        let sink = Arc::clone(&received);
        let scorer = Router::new().route(
            "/score",
            post(move |body: Bytes| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(body);
                    Json(json!({ "body": "{\"prediction\": 2}" }))
                }
            }),
        );
        let base = spawn_upstream(scorer).await;
        let record = r#"{"id":1,"age":45,"gender":1,"bmi":24.5}"#;

        let (status, body) = call(
            app(Some(format!("{base}/score")), None),
            Method::POST,
            PREDICT_PATH,
            record,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "prediction": 2 }));
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(&received[0][..], record.as_bytes());
    }

    #[tokio::test]
    async fn predict_fails_on_upstream_error_status() {
        let scorer = Router::new().route(
            "/score",
            post(|| async { (StatusCode::BAD_GATEWAY, "gateway timeout") }),
        );
        let base = spawn_upstream(scorer).await;
        let (status, body) = call(
            app(Some(format!("{base}/score")), None),
            Method::POST,
            PREDICT_PATH,
            "{}",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Prediction request failed" }));
    }

    #[tokio::test]
    async fn predict_fails_when_upstream_is_unreachable() {
        let base = closed_upstream().await;
        let (status, body) = call(app(Some(base), None), Method::POST, PREDICT_PATH, "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("prediction").is_none());
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn predict_fails_without_configured_endpoint() {
        let (status, _) = call(app(None, None), Method::POST, PREDICT_PATH, "{}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_post_requests_are_rejected() {
        for path in [PREDICT_PATH, RECOMMEND_PATH] {
            for method in [Method::GET, Method::PUT, Method::DELETE] {
                let (status, body) = call(app(None, None), method, path, "").await;
                assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
                assert_eq!(body, json!({ "error": "Method not allowed" }));
            }
        }
    }

    #[tokio::test]
    async fn recommend_wraps_prompt_and_returns_text() {
        let generator = Router::new().route(
            "/generate",
            post(
                |Query(query): Query<HashMap<String, String>>, Json(payload): Json<Value>| async move {
                    let prompt = payload
                        .pointer("/contents/0/parts/0/text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    let key = query.get("key").cloned().unwrap_or_default();
                    Json(json!({
                        "candidates": [
                            { "content": { "parts": [ { "text": format!("{key}:{prompt}") } ] } }
                        ]
                    }))
                },
            ),
        );
        let base = spawn_upstream(generator).await;
        let (status, body) = call(
            app(None, Some(format!("{base}/generate"))),
            Method::POST,
            RECOMMEND_PATH,
            r#"{"prompt": "three tips"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "test-key:three tips" }));
    }

    #[tokio::test]
    async fn recommend_defaults_to_empty_text() {
        let generator = Router::new().route(
            "/generate",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = spawn_upstream(generator).await;
        let (status, body) = call(
            app(None, Some(format!("{base}/generate"))),
            Method::POST,
            RECOMMEND_PATH,
            r#"{"prompt": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "" }));
    }

    #[tokio::test]
    async fn recommend_hides_upstream_error_payload() {
        let generator = Router::new().route(
            "/generate",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "message": "API key not valid" } })),
                )
            }),
        );
        let base = spawn_upstream(generator).await;
        let (status, body) = call(
            app(None, Some(format!("{base}/generate"))),
            Method::POST,
            RECOMMEND_PATH,
            r#"{"prompt": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Recommendation request failed" }));
    }

    #[tokio::test]
    async fn recommend_fails_when_upstream_is_unreachable() {
        let base = closed_upstream().await;
        let (status, body) = call(
            app(None, Some(base)),
            Method::POST,
            RECOMMEND_PATH,
            r#"{"prompt": "x"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("text").is_none());
    }

    #[tokio::test]
    async fn recommend_rejects_malformed_body_as_server_error() {
        let (status, _) = call(
            app(None, Some("http://127.0.0.1:9".to_string())),
            Method::POST,
            RECOMMEND_PATH,
            "not json",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let response = app(None, None).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use risk_protocol::ErrorResponse;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProxyRoute {
    Predict,
    Recommend,
}

impl ProxyRoute {
    fn name(self) -> &'static str {
        match self {
            ProxyRoute::Predict => "predict",
            ProxyRoute::Recommend => "recommend",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            ProxyRoute::Predict => "Prediction request failed",
            ProxyRoute::Recommend => "Recommendation request failed",
        }
    }
}

/// Everything a proxy handler can fail with. Upstream detail is logged and
/// never reaches the caller.
#[derive(Debug)]
pub(crate) enum ProxyError {
    MethodNotAllowed,
    Upstream {
        route: ProxyRoute,
        request_id: Uuid,
        source: anyhow::Error,
    },
}

impl ProxyError {
    pub(crate) fn upstream(
        route: ProxyRoute,
        request_id: Uuid,
    ) -> impl FnOnce(anyhow::Error) -> ProxyError {
        move |source| ProxyError::Upstream {
            route,
            request_id,
            source,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            ProxyError::Upstream {
                route,
                request_id,
                source,
            } => {
                let detail = format!("{source:#}");
                tracing::error!(
                    event = "proxy.failed",
                    route = route.name(),
                    request_id = %request_id,
                    error = %detail,
                    "upstream request failed"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, route.failure_message())
            }
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

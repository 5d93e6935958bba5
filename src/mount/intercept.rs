//! Error and not-found interception
//!
//! Both layers answer with the same body shape:
//!
//! ```json
//! { "status": "ko", "error": "..." }
//! ```

use crate::pipeline::{Next, Request, RequestFailure, Response};
use axum::Json;
use axum::body::HttpBody;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// How much of a failure reaches the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDetail {
    /// The error with its full cause chain
    Full,
    /// The top-level message only
    Message,
}

impl ErrorDetail {
    pub fn for_production(is_production: bool) -> Self {
        if is_production {
            ErrorDetail::Message
        } else {
            ErrorDetail::Full
        }
    }

    fn render(self, error: &anyhow::Error) -> String {
        match self {
            ErrorDetail::Full => format!("{:?}", error),
            ErrorDetail::Message => error.to_string(),
        }
    }
}

/// Body used by both interceptors
pub fn ko_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "status": "ko",
        "error": message.into(),
    });
    (status, Json(body)).into_response()
}

/// Turn tagged failures and panics from inner layers into 500 responses
pub async fn intercept_errors(
    State(detail): State<ErrorDetail>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => match response.extensions().get::<RequestFailure>() {
            Some(failure) => {
                let error = failure.error();
                error!(method = %method, uri = %uri, error = ?error, "Request failed");
                ko_response(StatusCode::INTERNAL_SERVER_ERROR, detail.render(error))
            }
            None => response,
        },
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(method = %method, uri = %uri, panic = %message, "Request handler panicked");
            let message = match detail {
                ErrorDetail::Full => format!("handler panicked: {}", message),
                ErrorDetail::Message => message,
            };
            ko_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// URL prefix the not-found interceptor watches
#[derive(Debug, Clone)]
pub struct NotFoundScope {
    prefix: Arc<str>,
}

impl NotFoundScope {
    /// Scope covering every path under `base + "/"`
    pub fn new(base: &str) -> Self {
        Self {
            prefix: format!("{}/", base).into(),
        }
    }

    pub fn covers(&self, path: &str) -> bool {
        path.starts_with(self.prefix.as_ref())
    }
}

/// Replace empty 404/405 responses under the scope with a structured 404
pub async fn intercept_not_found(
    State(scope): State<NotFoundScope>,
    request: Request,
    next: Next,
) -> Response {
    if !scope.covers(request.uri().path()) {
        return next.run(request).await;
    }

    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    let unmatched = matches!(
        response.status(),
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
    );

    if unmatched && response.body().size_hint().exact() == Some(0) {
        debug!(url = %url, "Page not found");
        return ko_response(StatusCode::NOT_FOUND, format!("Page {} not found", url));
    }

    response
}

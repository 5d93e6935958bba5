//! Carrying request-time errors to the interception layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;

/// Response extension holding the error a middleware or handler returned
#[derive(Clone)]
pub struct RequestFailure(pub Arc<anyhow::Error>);

impl RequestFailure {
    pub fn error(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for RequestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestFailure")
            .field(&self.0.to_string())
            .finish()
    }
}

/// Bare 500 response tagged with the failure, rendered later by the interceptor
pub fn failure_response(error: anyhow::Error) -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response
        .extensions_mut()
        .insert(RequestFailure(Arc::new(error)));
    response
}

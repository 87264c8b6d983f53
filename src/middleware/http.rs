//! HTTP-level middleware applied to every route.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limit and request timeout from `Config`
//! - Failures raised here still use the JSON error body

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header, header::HeaderName};
use axum::middleware;
use axum::response::Response;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::error_response;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn apply(router: Router, config: &Config) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                error_response(StatusCode::REQUEST_TIMEOUT, "request timeout")
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(config.request_body_limit))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    router
        .layer(layers)
        .layer(middleware::map_response(json_payload_too_large))
}

// RequestBodyLimitLayer answers an oversized Content-Length itself, in plain text.
async fn json_payload_too_large(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));

    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload too large");
    }
    response
}

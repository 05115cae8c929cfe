//! Per-request tracing.
//!
//! Propagates (or mints) an `x-trace-id` header, wraps the handler in a
//! request span, and logs one line per finished request with status and
//! latency.

use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

pub async fn trace_middleware(req: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
    );

    async move {
        let mut req = req;
        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            req.headers_mut().insert(X_TRACE_ID, value.clone());

            let mut response = next.run(req).await;
            response.headers_mut().insert(X_TRACE_ID, value);

            info!(
                status = response.status().as_u16(),
                latency_ms = start_time.elapsed().as_millis(),
                "request finished"
            );
            return response;
        }

        next.run(req).await
    }
    .instrument(span)
    .await
}

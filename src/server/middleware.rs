//! HTTP middleware

use axum::{
    body::Body,
    extract::Extension,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::trace;

use super::AppState;
use crate::storage::Operation;

/// Delays the response by the latency configured for its operation.
///
/// Handlers tag responses with the [`Operation`] they ran; untagged
/// responses (health, metrics, unmatched routes) pass straight through.
pub async fn inject_latency(
    Extension(state): Extension<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    if let Some(operation) = response.extensions().get::<Operation>() {
        let delay = state.latency.delay(operation.access());
        if !delay.is_zero() {
            trace!(operation = operation.as_str(), delay_ms = delay.as_millis() as u64, "Injecting latency");
            tokio::time::sleep(delay).await;
        }
    }

    response
}

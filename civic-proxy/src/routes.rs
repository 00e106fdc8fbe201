//! Request handlers.

use axum::Json;
use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::AppState;
use crate::error::{ProxyError, relay_status};

/// Header carrying the analytics admin password.
pub const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

/// Path prefix shared by the proxy and the backend analytics routes.
const ANALYTICS_PREFIX: &str = "/api/analytics/";

/// `POST /api/chat`: forward the body and relay the event stream.
pub(crate) async fn chat(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ProxyError> {
    let url = format!("{}/api/chat", state.upstream_url);
    tracing::debug!(url = %url, "civic.proxy.chat");

    let upstream = state
        .client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| unreachable(&url, e))?;

    let status = upstream.status();
    if !status.is_success() {
        tracing::warn!(url = %url, status = status.as_u16(), "civic.proxy.upstream_status");
        return Err(ProxyError::Upstream(relay_status(status)));
    }

    let headers = [
        (CONTENT_TYPE, "text/event-stream"),
        (CACHE_CONTROL, "no-cache"),
        (CONNECTION, "keep-alive"),
    ];
    Ok((headers, Body::from_stream(upstream.bytes_stream())).into_response())
}

/// `GET /api/analytics/{*path}`: forward path, query and admin password.
///
/// The path and query are forwarded still percent-encoded. Status and body
/// are relayed whatever the status is.
pub(crate) async fn analytics(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    let url = analytics_url(&state.upstream_url, &uri);
    let password = headers
        .get(ADMIN_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::debug!(url = %url, authorized = !password.is_empty(), "civic.proxy.analytics");

    let upstream = state
        .client
        .get(&url)
        .header(ADMIN_PASSWORD_HEADER, password)
        .send()
        .await
        .map_err(|e| unreachable(&url, e))?;

    let status = relay_status(upstream.status());
    Ok((
        status,
        [(CONTENT_TYPE, "application/json")],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// `GET /health`
pub(crate) async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Upstream analytics URL for a request URI, encoding left untouched.
fn analytics_url(upstream: &str, uri: &Uri) -> String {
    let path = uri.path().strip_prefix(ANALYTICS_PREFIX).unwrap_or_default();
    match uri.query().filter(|q| !q.is_empty()) {
        Some(query) => format!("{upstream}{ANALYTICS_PREFIX}{path}?{query}"),
        None => format!("{upstream}{ANALYTICS_PREFIX}{path}"),
    }
}

fn unreachable(url: &str, err: reqwest::Error) -> ProxyError {
    tracing::warn!(url = %url, error = %err, "civic.proxy.upstream_unreachable");
    ProxyError::Unreachable(err)
}

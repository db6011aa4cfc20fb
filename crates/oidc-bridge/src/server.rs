//! HTTP check listener
//!
//! Speaks the Envoy HTTP external-authorization convention: the proxy
//! forwards the original request's method, path and headers to the listener
//! and reads the verdict from the response.
//!
//! - `200`: allow; response headers are added to the upstream request and
//!   `x-envoy-auth-headers-to-remove` lists headers to strip
//! - `403` with an empty body: deny
//!
//! Every method and path is accepted.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::check::{CheckRequest, CheckResponse};
use crate::error::BridgeResult;
use crate::gateway::Gateway;
use crate::translator::AUTHORIZATION_HEADER;

/// Response header listing headers the proxy must remove upstream
pub const HEADERS_TO_REMOVE_HEADER: &str = "x-envoy-auth-headers-to-remove";

/// Request id header propagated by the proxy
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Router serving checks for one gateway
pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new().fallback(handle_check).with_state(gateway)
}

/// Bind `addr` and serve checks until `shutdown` resolves
///
/// # Errors
///
/// Returns [`BridgeError::Io`](crate::BridgeError::Io) if the address cannot be bound or
/// the server fails.
pub async fn serve<F>(addr: SocketAddr, gateway: Arc<Gateway>, shutdown: F) -> BridgeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_listener(listener, gateway, shutdown).await
}

/// Serve checks on an already-bound listener until `shutdown` resolves
///
/// # Errors
///
/// Returns [`BridgeError::Io`](crate::BridgeError::Io) if the server fails.
pub async fn serve_listener<F>(
    listener: TcpListener,
    gateway: Arc<Gateway>,
    shutdown: F,
) -> BridgeResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        "{} check listener on {}",
        gateway.direction(),
        listener.local_addr()?
    );

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn handle_check(
    State(gateway): State<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let request = check_request(&method, &uri, &headers);
    let response = gateway.check(&request).await;
    http_response(response)
}

/// Build a check request from the forwarded request
///
/// Header values that are not visible ASCII are dropped.
pub fn check_request(method: &Method, uri: &Uri, headers: &HeaderMap) -> CheckRequest {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(ToString::to_string))
        .unwrap_or_default();

    let path = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string);

    let mut request = CheckRequest::new(request_id, host, path, method.as_str());
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            request.insert_header(name.as_str(), value);
        }
    }
    request
}

/// Render a check response in ext_authz form
///
/// A header that cannot be encoded turns the verdict into a deny.
pub fn http_response(response: CheckResponse) -> Response {
    if !response.is_allowed() {
        return StatusCode::FORBIDDEN.into_response();
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers_to_add {
        let (Ok(name), Ok(mut value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) else {
            warn!("Check response carried a header that cannot be encoded, denying");
            return StatusCode::FORBIDDEN.into_response();
        };
        if name.as_str() == AUTHORIZATION_HEADER {
            value.set_sensitive(true);
        }
        headers.insert(name, value);
    }

    if !response.headers_to_remove.is_empty() {
        match HeaderValue::try_from(response.headers_to_remove.join(",")) {
            Ok(value) => {
                headers.insert(HEADERS_TO_REMOVE_HEADER, value);
            }
            Err(_) => {
                warn!("Check response carried a header name that cannot be encoded, denying");
                return StatusCode::FORBIDDEN.into_response();
            }
        }
    }

    (StatusCode::OK, headers).into_response()
}

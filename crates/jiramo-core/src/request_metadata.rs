use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

/// Ambient metadata of an inbound request, captured once by
/// [`capture_request_metadata`] and read by handlers through `Extension`.
#[derive(Clone, Debug, Default)]
pub struct RequestMetadata {
    /// Raw peer address as seen by the listener, port included (empty when unknown)
    pub remote_addr: String,
    pub user_agent: String,
    pub headers: HeaderMap,
    /// Raw query string of the request URI
    pub query: Option<String>,
}

impl RequestMetadata {
    pub fn from_parts(
        remote_addr: Option<SocketAddr>,
        headers: &HeaderMap,
        query: Option<&str>,
    ) -> Self {
        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            remote_addr: remote_addr.map(|a| a.to_string()).unwrap_or_default(),
            user_agent,
            headers: headers.clone(),
            query: query.map(str::to_string),
        }
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|h| h.to_str().ok())
    }
}

/// Middleware that stores a [`RequestMetadata`] in the request extensions.
///
/// The peer address is only available when the server is started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn capture_request_metadata(mut req: Request, next: Next) -> Response {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let metadata = RequestMetadata::from_parts(remote_addr, req.headers(), req.uri().query());
    req.extensions_mut().insert(metadata);

    next.run(req).await
}

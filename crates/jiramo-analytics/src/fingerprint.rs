//! Anonymous visitor identity and session keys

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::net::SocketAddr;
use uuid::Uuid;

const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client address, honouring reverse-proxy headers.
///
/// `X-Real-IP` wins, then the first hop of `X-Forwarded-For`, then the
/// connection address with its port removed.
pub fn client_ip(remote_addr: &str, headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, X_REAL_IP)
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(ip) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    strip_port(remote_addr.trim())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn strip_port(addr: &str) -> String {
    match addr.parse::<SocketAddr>() {
        Ok(socket) => socket.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}

/// 64-char lowercase hex SHA-256 of `"{ip}|{user_agent}|{project_id}"`.
pub fn visitor_fingerprint(ip: &str, user_agent: &str, project_id: Uuid) -> String {
    sha256_hex(&format!("{}|{}|{}", ip, user_agent, project_id))
}

/// Fresh session key for `fingerprint`.
///
/// A random nonce is mixed in with the timestamp so two keys minted for the
/// same fingerprint in the same nanosecond still differ.
pub fn new_session_key(fingerprint: &str, now: DateTime<Utc>) -> String {
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros().saturating_mul(1_000));
    let nonce: u64 = rand::random();
    sha256_hex(&format!("{}|{}|{}", fingerprint, nanos, nonce))
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

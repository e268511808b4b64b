//! Credentials attached to outbound GPS51 calls

use axum::http::{HeaderMap, header};
use reqwest::{RequestBuilder, Url};
use std::fmt;

/// Query parameters whose values never appear in logs
const SECRET_QUERY_KEYS: &[&str] = &["token", "password"];

/// Credential for one inbound request's data call
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent as the `token` query parameter
    Token(String),
    /// Session cookie obtained from a login call, sent as the `Cookie` header
    Session(String),
}

impl Credentials {
    /// Attach this credential to an outbound request
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Token(token) => request.query(&[("token", token.as_str())]),
            Credentials::Session(cookie) => request.header(header::COOKIE, cookie.as_str()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "token",
            Credentials::Session(_) => "session",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials::{}(<redacted>)", self.kind())
    }
}

/// Collapse all `Set-Cookie` headers into one `Cookie` header value
///
/// Only the `name=value` pair of each cookie is kept; attributes such as
/// `Path` or `HttpOnly` are dropped. Returns `None` when no usable cookie is
/// present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('=') && !pair.starts_with('='))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// URL rendering safe for logs: secret query values are replaced
pub fn redact_url(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if SECRET_QUERY_KEYS.contains(&key.as_ref()) {
                "<redacted>".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

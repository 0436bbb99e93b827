// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access token check for inbound gateway connections.
//!
//! The gateway may present the token as `Authorization: Bearer <token>` or
//! as an `access_token` query parameter. With no token configured every
//! connection is accepted.

use axum::http::HeaderMap;
use serde::Deserialize;

/// Query string accepted on the WebSocket endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Whether the request carries the expected token.
pub fn check_token(expected: Option<&str>, headers: &HeaderMap, query: &TokenQuery) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if bearer == Some(expected) {
        return true;
    }

    query.access_token.as_deref() == Some(expected)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn no_token_configured_accepts_everything() {
        assert!(check_token(None, &HeaderMap::new(), &TokenQuery::default()));
    }

    #[test]
    fn bearer_header_matches() {
        assert!(check_token(
            Some("abc"),
            &headers_with("Bearer abc"),
            &TokenQuery::default()
        ));
        assert!(!check_token(
            Some("abc"),
            &headers_with("Bearer xyz"),
            &TokenQuery::default()
        ));
    }

    #[test]
    fn query_parameter_matches() {
        let query = TokenQuery {
            access_token: Some("abc".into()),
        };
        assert!(check_token(Some("abc"), &HeaderMap::new(), &query));
    }

    #[test]
    fn missing_credentials_rejected() {
        assert!(!check_token(Some("abc"), &HeaderMap::new(), &TokenQuery::default()));
    }
}

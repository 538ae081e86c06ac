//! Authentication Module
//!
//! Extracts the identity token from inbound requests and connection params.
//! Validation is syntactic only: the token is never checked against a store.
//! Its value is later interpreted as a role-category name.

pub mod middleware;

use http::{header, HeaderMap};
use serde_json::Value;
use thiserror::Error;

/// Keys of a `connection_init` payload that may carry the token
const CONNECTION_PARAM_KEYS: [&str; 3] = ["authorization", "Authorization", "authToken"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No auth token found")]
    MissingToken,
    #[error("Auth token wrong format")]
    MalformedToken,
}

/// A syntactically valid identity token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract the token from the `Authorization` header.
///
/// Accepts `Bearer <token>` or the bare token.
pub fn validate_token(headers: &HeaderMap) -> Result<Token, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedToken)?;

    check_token(raw)
}

/// Extract the token from streaming connection params.
///
/// Returns `Ok(None)` when the params carry no token at all.
pub fn validate_connection_params(params: &Value) -> Result<Option<Token>, AuthError> {
    let raw = CONNECTION_PARAM_KEYS
        .iter()
        .find_map(|key| params.get(*key));

    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => check_token(raw).map(Some),
        Some(_) => Err(AuthError::MalformedToken),
    }
}

fn check_token(raw: &str) -> Result<Token, AuthError> {
    let raw = raw.trim();
    let token = match raw.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => raw,
    };

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    if !token.chars().all(|c| c.is_ascii_graphic()) {
        return Err(AuthError::MalformedToken);
    }

    Ok(Token(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bare_and_bearer_tokens() {
        assert_eq!(validate_token(&headers_with("ADMIN")).unwrap().as_str(), "ADMIN");
        assert_eq!(
            validate_token(&headers_with("Bearer GUEST")).unwrap().as_str(),
            "GUEST"
        );
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert_eq!(validate_token(&HeaderMap::new()), Err(AuthError::MissingToken));
        assert_eq!(validate_token(&headers_with("")), Err(AuthError::MissingToken));
        assert_eq!(validate_token(&headers_with("Bearer   ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(
            validate_token(&headers_with("two words")),
            Err(AuthError::MalformedToken)
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"caf\xe9").unwrap(),
        );
        assert_eq!(validate_token(&headers), Err(AuthError::MalformedToken));
    }

    #[test]
    fn test_connection_params() {
        assert_eq!(validate_connection_params(&json!({})), Ok(None));
        assert_eq!(validate_connection_params(&json!(null)), Ok(None));
        assert_eq!(
            validate_connection_params(&json!({"authToken": "USER"}))
                .unwrap()
                .unwrap()
                .as_str(),
            "USER"
        );
        assert_eq!(
            validate_connection_params(&json!({"authorization": "Bearer ADMIN"}))
                .unwrap()
                .unwrap()
                .as_str(),
            "ADMIN"
        );
        assert_eq!(
            validate_connection_params(&json!({"authToken": 42})),
            Err(AuthError::MalformedToken)
        );
        assert_eq!(
            validate_connection_params(&json!({"authToken": ""})),
            Err(AuthError::MissingToken)
        );
    }
}

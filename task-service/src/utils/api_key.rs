//! API key issuance and `Authorization` header parsing.

use axum::http::{header, HeaderMap};
use rand::{rngs::OsRng, RngCore};

use crate::services::AuthError;

pub const API_KEY_SCHEME: &str = "APIKEY";
const API_KEY_BYTES: usize = 32;

/// Pull the raw token out of `Authorization: APIKEY <token>`.
///
/// The scheme is case-sensitive and the token must be a single ASCII-alphanumeric word.
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, AuthError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingCredential);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?
        .trim();
    if value.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let token = value
        .strip_prefix(API_KEY_SCHEME)
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start)
        .ok_or(AuthError::MalformedCredential)?;

    if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token.to_string())
}

/// 32 bytes from the OS CSPRNG, hex encoded.
pub fn generate_api_key() -> Result<String, AuthError> {
    let mut bytes = [0u8; API_KEY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::CryptoFailure(e.to_string()))?;
    Ok(hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_token() {
        assert_eq!(extract_api_key(&headers("APIKEY abc123")).unwrap(), "abc123");
        assert_eq!(
            extract_api_key(&headers("  APIKEY   abc123  ")).unwrap(),
            "abc123"
        );
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            extract_api_key(&HeaderMap::new()),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            extract_api_key(&headers("   ")),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn test_malformed_header() {
        for value in [
            "Bearer abc123",
            "APIKEY",
            "APIKEYabc123",
            "ApiKey abc123",
            "APIKEY abc 123",
            "APIKEY abc-123",
        ] {
            assert!(
                matches!(extract_api_key(&headers(value)), Err(AuthError::MalformedCredential)),
                "expected malformed for {:?}",
                value
            );
        }
    }

    #[test]
    fn test_non_ascii_header_is_malformed() {
        let mut map = HeaderMap::new();
        map.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"APIKEY caf\xe9").unwrap(),
        );
        assert!(matches!(
            extract_api_key(&map),
            Err(AuthError::MalformedCredential)
        ));
    }

    #[test]
    fn test_generated_keys() {
        let a = generate_api_key().unwrap();
        let b = generate_api_key().unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
        assert_eq!(extract_api_key(&headers(&format!("APIKEY {}", a))).unwrap(), a);
    }
}

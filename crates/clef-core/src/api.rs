//! Shared plumbing for talking to the conversion backend.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::util::compact_text;

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

/// Extract a human-readable reason from an error response body.
///
/// The backend uses `{message}` on auth routes and `{error}` on upload
/// routes; plain-text bodies are compacted and empty ones fall back to the
/// status code.
pub(crate) fn parse_error_reason(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorResponse>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let message = message.trim();
            if !message.is_empty() {
                return message.to_string();
            }
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

pub(crate) fn backend_rejected(status: StatusCode, body: &str) -> Error {
    Error::BackendRejected {
        status: status.as_u16(),
        reason: parse_error_reason(status, body),
    }
}

/// Return the body text of a success response, or the mapped refusal.
pub(crate) async fn success_body(response: Response) -> Result<String> {
    let status = response.status();
    if status.is_success() {
        Ok(response.text().await?)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(backend_rejected(status, &body))
    }
}

/// Decode a success body, logging malformed payloads distinctly.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|error| {
        tracing::warn!("Malformed {context} response: {error}");
        Error::MalformedResponse(format!("could not decode the {context} response"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_reason_prefers_json_fields() {
        let status = StatusCode::UNAUTHORIZED;
        assert_eq!(
            parse_error_reason(status, r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
        assert_eq!(
            parse_error_reason(status, r#"{"error":"bad format"}"#),
            "bad format"
        );
    }

    #[test]
    fn error_reason_falls_back_to_body_then_status() {
        let status = StatusCode::BAD_GATEWAY;
        assert_eq!(parse_error_reason(status, "upstream down"), "upstream down");
        assert_eq!(parse_error_reason(status, "   "), "HTTP 502");
        assert_eq!(parse_error_reason(status, r#"{"message":""}"#), r#"{"message":""}"#);
    }

    #[test]
    fn decode_json_maps_to_malformed_response() {
        let error = decode_json::<ApiErrorResponse>("<html>oops</html>", "login").unwrap_err();
        assert!(matches!(error, Error::MalformedResponse(_)));
        assert!(error.to_string().contains("login"));
    }
}

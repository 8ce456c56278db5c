use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message}")]
    ValidationFailed {
        message: String,
        errors: HashMap<String, String>,
    },

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unexpected error: {0}")]
    UnknownError(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data. The cut is
    /// walked back to a char boundary so multi-byte text slices cleanly.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut cut = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..cut],
                body.len()
            )
        }
    }

    /// Classify a non-success response.
    ///
    /// The server reports failures as `{ "message": ..., "errors": ... }`;
    /// when the body parses, the server message wins over the per-status
    /// fallback text. Rate-limit and unavailability responses always use the
    /// fixed wording since their bodies tend to come from proxies.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let reported = ErrorBody::parse(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(reported.message_or("Authentication required")),
            403 => ApiError::Forbidden(
                reported.message_or("You do not have permission to access this resource"),
            ),
            404 => ApiError::NotFound(reported.message_or("Resource not found")),
            422 => ApiError::ValidationFailed {
                message: reported.message_or("Validation failed"),
                errors: reported.errors,
            },
            429 => ApiError::RateLimited("Too many requests. Please try again later.".to_string()),
            503 => ApiError::ServiceUnavailable(
                "Service temporarily unavailable. Please try again later.".to_string(),
            ),
            500..=599 => ApiError::ServerError(
                reported.message_or("Internal server error. Please try again later."),
            ),
            _ => match reported.message {
                Some(message) => ApiError::UnknownError(message),
                None => ApiError::UnknownError(format!(
                    "Status {}: {}",
                    status,
                    Self::truncate_body(body)
                )),
            },
        }
    }

    /// Whether this error is the 401 class that the request pipeline may
    /// recover from with a token refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// Parsed form of the server's error envelope.
struct ErrorBody {
    message: Option<String>,
    errors: HashMap<String, String>,
}

impl ErrorBody {
    /// Best-effort parse; anything unparseable degrades to the fallbacks.
    fn parse(body: &str) -> Self {
        let mut message = None;
        let mut errors = HashMap::new();

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            message = value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string);

            if let Some(map) = value.get("errors").and_then(|e| e.as_object()) {
                for (field, detail) in map {
                    // Field details are usually plain strings; anything else
                    // is kept in its JSON form
                    let detail = detail
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| detail.to_string());
                    errors.insert(field.clone(), detail);
                }
            }
        }

        Self { message, errors }
    }

    fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

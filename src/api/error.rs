use std::error::Error;
use std::fmt;

use reqwest::StatusCode;

/// Failures talking to the remote API.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, reset, TLS).
    Transport(reqwest::Error),
    /// The server answered 401 and the session could not be refreshed.
    Unauthorized { detail: Option<String> },
    /// Any other non-success status.
    Status {
        status: StatusCode,
        detail: Option<String>,
        body: String,
    },
    /// The response body did not match the expected shape.
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        let detail = extract_error_summary(&body);
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { detail }
        } else {
            ApiError::Status {
                status,
                detail,
                body,
            }
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Short text suitable for a transient notification. The full error is
    /// meant for the log, not for the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Network error, please try again".to_string(),
            ApiError::Unauthorized { detail } => match detail {
                Some(detail) if !detail.is_empty() => detail.clone(),
                _ => "Session expired, please sign in again".to_string(),
            },
            ApiError::Status { status, detail, .. } => match detail {
                Some(detail) if !detail.is_empty() => detail.clone(),
                _ => match *status {
                    StatusCode::NOT_FOUND => "Not found".to_string(),
                    StatusCode::FORBIDDEN => "Permission denied".to_string(),
                    status if status.is_server_error() => {
                        "Server error, please try again later".to_string()
                    }
                    _ => "Request failed".to_string(),
                },
            },
            ApiError::Decode { .. } => "Unexpected response from server".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(err) => write!(f, "request failed: {err}"),
            ApiError::Unauthorized { detail } => match detail {
                Some(detail) => write!(f, "unauthorized: {detail}"),
                None => write!(f, "unauthorized"),
            },
            ApiError::Status {
                status,
                detail,
                body,
            } => match detail {
                Some(detail) => write!(f, "API error {status}: {detail}"),
                None if body.trim().is_empty() => write!(f, "API error {status}"),
                None => write!(f, "API error {status}: {}", body.trim()),
            },
            ApiError::Decode { endpoint, source } => {
                write!(f, "could not decode response from {endpoint}: {source}")
            }
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::Transport(err) => Some(err),
            ApiError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

/// Pull a one-line summary out of an error body. FastAPI answers with
/// `{"detail": ...}`; other gateways use `message` or `error.message`.
pub(crate) fn extract_error_summary(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let summary = value
        .get("detail")
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.to_string()),
            // Validation failures carry a list of {loc, msg} objects.
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|item| item.get("msg"))
                .and_then(|msg| msg.as_str())
                .map(str::to_owned),
            _ => None,
        })
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str())
                .map(str::to_owned)
        })?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed.trim().to_string())
}

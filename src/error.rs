use std::time::SystemTime;
use thiserror::Error;

/// Library-wide result type
pub type Result<T> = std::result::Result<T, LabelerError>;

/// Seconds to wait after a 429 that carried no usable `Retry-After`
const FALLBACK_RETRY_AFTER_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum LabelerError {
    /// Gmail answered with a status we have no dedicated variant for
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Missing client registration, declined consent, or a revoked/expired grant
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// HTTP 429
    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    /// Connection failures and request timeouts
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Gmail server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// HTTP 404
    #[error("Not found: {0}")]
    MessageNotFound(String),

    /// HTTP 400, usually a malformed search query
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 403, typically a token without the modify scope
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// A fetched message lacked its payload
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    #[error("Label error: {0}")]
    LabelError(String),

    /// A phrase could not be turned into a matcher
    #[error("Invalid phrase '{phrase}': {reason}")]
    InvalidPhrase { phrase: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LabelerError {
    /// Whether waiting and trying the same request again can succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LabelerError::RateLimitExceeded { .. }
                | LabelerError::ServerError { .. }
                | LabelerError::NetworkError(_)
        )
    }

    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

/// Interpret a `Retry-After` value relative to `now`
///
/// Both delay-seconds ("120") and HTTP-date forms are understood. Returns
/// `None` for garbage and for dates already in the past.
fn retry_after_secs(value: &str, now: SystemTime) -> Option<u64> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    let at = httpdate::parse_http_date(value).ok()?;
    at.duration_since(now).ok().map(|wait| wait.as_secs())
}

fn retry_after_from_response<B>(response: &hyper::Response<B>) -> u64 {
    response
        .headers()
        .get(hyper::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| retry_after_secs(value, SystemTime::now()))
        .unwrap_or(FALLBACK_RETRY_AFTER_SECS)
}

fn status_error(status: hyper::StatusCode, retry_after: impl FnOnce() -> u64) -> LabelerError {
    let message = format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string();

    match status.as_u16() {
        429 => LabelerError::RateLimitExceeded {
            retry_after: retry_after(),
        },
        // An expired or revoked grant surfaces as 401 once the token is used
        401 => LabelerError::AuthError(message),
        400 => LabelerError::BadRequest(message),
        403 => LabelerError::Forbidden(message),
        404 => LabelerError::MessageNotFound(message),
        code @ 500..=599 => LabelerError::ServerError {
            status: code,
            message,
        },
        _ => LabelerError::ApiError(message),
    }
}

impl From<google_gmail1::Error> for LabelerError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => {
                status_error(response.status(), || retry_after_from_response(response))
            }
            google_gmail1::Error::BadRequest(ref err) => LabelerError::BadRequest(err.to_string()),
            google_gmail1::Error::HttpError(ref err) => {
                LabelerError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => LabelerError::NetworkError(err.to_string()),
            google_gmail1::Error::MissingToken(err) => {
                LabelerError::AuthError(format!("No usable access token: {}", err))
            }
            other => LabelerError::ApiError(other.to_string()),
        }
    }
}

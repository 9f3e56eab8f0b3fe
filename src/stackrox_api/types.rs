use crate::stackrox_api::resources::InitBundleRevocationError;
use serde::Serialize;
use std::fmt;

/// StackRox SDK error type
///
/// Represents all possible errors that can occur when interacting with
/// the StackRox Central API or preparing a request for it.
#[derive(Debug)]
pub enum StackroxError {
    /// Caller supplied insufficient or malformed parameters. Raised before
    /// any network call is made.
    InvalidArgument(String),
    /// API request failed (network, HTTP status, or response parsing error)
    Api(ApiError),
    /// A name-based lookup, made over the network, matched nothing
    NotFound { name: String },
    /// A name-based lookup matched more than one entity where exactly one
    /// was required
    AmbiguousMatch { name: String, count: usize },
    /// The bulk revoke endpoint reported one or more per-bundle failures.
    /// Carries the server's full error list even when some ids succeeded.
    BundleRevokeFailed(Vec<InitBundleRevocationError>),
    /// Connection configuration error
    Config(String),
}

/// Flat classification of a [`StackroxError`], for callers that only need
/// to branch on the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    Unauthorized,
    StatusMismatch,
    MalformedResponse,
    NotFound,
    AmbiguousMatch,
    BundleRevokeFailed,
    Network,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::StatusMismatch => "status_mismatch",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AmbiguousMatch => "ambiguous_match",
            ErrorKind::BundleRevokeFailed => "bundle_revoke_failed",
            ErrorKind::Network => "network",
            ErrorKind::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StackroxError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StackroxError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            StackroxError::Api(ApiError::Network(_)) => ErrorKind::Network,
            StackroxError::Api(ApiError::Unauthorized { .. }) => ErrorKind::Unauthorized,
            StackroxError::Api(ApiError::StatusMismatch { .. }) => ErrorKind::StatusMismatch,
            StackroxError::Api(ApiError::MalformedResponse(_)) => ErrorKind::MalformedResponse,
            StackroxError::NotFound { .. } => ErrorKind::NotFound,
            StackroxError::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            StackroxError::BundleRevokeFailed(_) => ErrorKind::BundleRevokeFailed,
            StackroxError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        StackroxError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for StackroxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackroxError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            StackroxError::Api(err) => write!(f, "API error: {}", err),
            StackroxError::NotFound { name } => write!(f, "No active token named '{}'", name),
            StackroxError::AmbiguousMatch { name, count } => write!(
                f,
                "{} active tokens share the name '{}'; use the token id instead",
                count, name
            ),
            StackroxError::BundleRevokeFailed(errors) => {
                let ids: Vec<&str> = errors.iter().map(|e| e.id.as_str()).collect();
                write!(
                    f,
                    "Failed to revoke one or more init bundles: [{}]",
                    ids.join(", ")
                )
            }
            StackroxError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StackroxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StackroxError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for StackroxError {
    fn from(err: ApiError) -> Self {
        StackroxError::Api(err)
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Network error (connection, timeout, TLS, etc.)
    Network(String),
    /// Central answered 401, whatever status the call expected
    Unauthorized { method: String, url: String },
    /// Central answered with a status other than the expected one
    StatusMismatch {
        expected: u16,
        actual: u16,
        url: String,
    },
    /// Response body was not the expected JSON document
    MalformedResponse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Unauthorized { method, url } => {
                write!(f, "Unauthorized for method {} to URL {}", method, url)
            }
            ApiError::StatusMismatch {
                expected,
                actual,
                url,
            } => write!(
                f,
                "Unexpected status code from StackRox API at {}. Expected = {}, received = {}",
                url, expected, actual
            ),
            ApiError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timeout".to_string())
        } else if err.is_connect() {
            ApiError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            ApiError::MalformedResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

//! Connection configuration for StackRox Central.
//!
//! A [`ConnectionConfig`] names the Central endpoint, exactly one way of
//! authenticating against it, and whether TLS certificates are verified.
//! It can be built directly, from loose module-style parameters, from a
//! TOML document, or from the environment:
//!
//! ```no_run
//! use stackrox_sdk::config::{ConnectionConfig, Credentials};
//!
//! // Explicit
//! let config = ConnectionConfig::new(
//!     "https://central.example.com",
//!     Credentials::Bearer("eyJhbGci...".to_string()),
//! );
//!
//! // From STACKROX_CENTRAL / STACKROX_API_TOKEN / ...
//! let config = ConnectionConfig::from_env().unwrap();
//! ```

use crate::stackrox_api::types::StackroxError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const ENV_CENTRAL: &str = "STACKROX_CENTRAL";
pub const ENV_API_TOKEN: &str = "STACKROX_API_TOKEN";
pub const ENV_USERNAME: &str = "STACKROX_USERNAME";
pub const ENV_PASSWORD: &str = "STACKROX_PASSWORD";
pub const ENV_VALIDATE_CERTS: &str = "STACKROX_VALIDATE_CERTS";

/// How requests authenticate against Central
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic auth, sent preemptively on every request
    Basic { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Validated connection settings for one Central instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL of Central, without a trailing slash
    pub central: String,
    pub credentials: Credentials,
    /// Verify Central's TLS certificate (default true)
    pub validate_certs: bool,
}

impl ConnectionConfig {
    pub fn new(central: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            central: normalize_central(central.into()),
            credentials,
            validate_certs: true,
        }
    }

    pub fn with_validate_certs(mut self, validate_certs: bool) -> Self {
        self.validate_certs = validate_certs;
        self
    }

    /// Load connection settings from a TOML document.
    ///
    /// Accepts the same keys as [`ConnectionParams`]:
    ///
    /// ```toml
    /// central = "https://central.example.com"
    /// token = "eyJhbGci..."
    /// validate_certs = false
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, StackroxError> {
        let params: ConnectionParams = toml::from_str(content).map_err(|e| {
            StackroxError::Config(format!("Failed to parse connection TOML: {}", e))
        })?;
        Self::try_from(params)
    }

    /// Load connection settings from a TOML file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StackroxError> {
        let path = path.as_ref();
        tracing::debug!("Loading connection config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            StackroxError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load connection settings from `STACKROX_*` environment variables
    pub fn from_env() -> Result<Self, StackroxError> {
        let validate_certs = match std::env::var(ENV_VALIDATE_CERTS) {
            Ok(value) => Some(parse_bool(&value).ok_or_else(|| {
                StackroxError::Config(format!(
                    "{} must be one of true, false, 1, 0 (got '{}')",
                    ENV_VALIDATE_CERTS, value
                ))
            })?),
            Err(_) => None,
        };

        let params = ConnectionParams {
            central: std::env::var(ENV_CENTRAL).ok(),
            token: std::env::var(ENV_API_TOKEN).ok(),
            username: std::env::var(ENV_USERNAME).ok(),
            password: std::env::var(ENV_PASSWORD).ok(),
            validate_certs,
        };

        Self::try_from(params)
    }
}

/// Loose connection parameters as a caller collects them.
///
/// Every field is optional here; [`ConnectionConfig::try_from`] decides
/// which credentials apply. A non-empty `token` always wins and any
/// username/password is then ignored.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub central: Option<String>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub validate_certs: Option<bool>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("central", &self.central)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("validate_certs", &self.validate_certs)
            .finish()
    }
}

impl TryFrom<ConnectionParams> for ConnectionConfig {
    type Error = StackroxError;

    fn try_from(params: ConnectionParams) -> Result<Self, Self::Error> {
        let central = params
            .central
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| StackroxError::Config("central is required".to_string()))?;

        let token = params.token.filter(|t| !t.is_empty());

        let credentials = match (token, params.username, params.password) {
            (Some(token), _, _) => Credentials::Bearer(token),
            (None, Some(username), Some(password)) => Credentials::Basic { username, password },
            (None, Some(_), None) | (None, None, Some(_)) => {
                return Err(StackroxError::Config(
                    "username and password must be provided together".to_string(),
                ))
            }
            (None, None, None) => {
                return Err(StackroxError::Config(
                    "either token or username/password must be provided".to_string(),
                ))
            }
        };

        Ok(ConnectionConfig::new(central, credentials)
            .with_validate_certs(params.validate_certs.unwrap_or(true)))
    }
}

fn normalize_central(central: String) -> String {
    central.trim().trim_end_matches('/').to_string()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

//! Declarative operation handlers
//!
//! Each handler takes a desired state for one resource type and reconciles
//! it against Central with one or more service calls, reporting whether
//! anything changed. Handlers never retry and never swallow errors: every
//! failure comes back to the caller, and [`ModuleResponse`] turns it into the
//! JSON failure document automation tooling expects.

pub mod apitoken;
pub mod initbundle;

use crate::config::{ConnectionConfig, ConnectionParams};
use crate::stackrox_api::resources::InitBundleRevocationError;
use crate::stackrox_api::types::{ErrorKind, StackroxError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Caller-visible result of a handler run
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModuleResponse<T> {
    Exit(T),
    Fail(ModuleFailure),
}

/// Failure document
#[derive(Debug, Clone, Serialize)]
pub struct ModuleFailure {
    pub failed: bool,
    pub changed: bool,
    pub msg: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_bundles: Vec<InitBundleRevocationError>,
}

impl From<StackroxError> for ModuleFailure {
    fn from(err: StackroxError) -> Self {
        let kind = err.kind();
        let msg = err.to_string();
        let failed_bundles = match err {
            StackroxError::BundleRevokeFailed(errors) => errors,
            _ => Vec::new(),
        };
        Self {
            failed: true,
            changed: false,
            msg,
            kind,
            failed_bundles,
        }
    }
}

impl<T: Serialize> ModuleResponse<T> {
    pub fn from_result(result: Result<T, StackroxError>) -> Self {
        match result {
            Ok(outcome) => ModuleResponse::Exit(outcome),
            Err(err) => {
                tracing::error!("Operation failed ({}): {}", err.kind(), err);
                ModuleResponse::Fail(ModuleFailure::from(err))
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ModuleResponse::Fail(_))
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            json!({
                "failed": true,
                "changed": false,
                "msg": format!("Failed to encode result: {}", e),
                "kind": ErrorKind::MalformedResponse,
            })
        })
    }
}

/// Decode handler parameters from a JSON object.
///
/// Unknown keys are ignored so one argument object can carry both the
/// connection fields and the handler's own fields.
pub fn parse_params<P: DeserializeOwned>(args: &Value) -> Result<P, StackroxError> {
    P::deserialize(args)
        .map_err(|e| StackroxError::invalid_argument(format!("Invalid parameters: {}", e)))
}

/// Build the connection configuration from the same argument object
pub fn connection_from_args(args: &Value) -> Result<ConnectionConfig, StackroxError> {
    let params: ConnectionParams = ConnectionParams::deserialize(args)
        .map_err(|e| StackroxError::Config(format!("Invalid connection parameters: {}", e)))?;
    ConnectionConfig::try_from(params)
}

//! Cluster-init bundle handlers
//!
//! [`run`] keeps a named bundle `present` or `absent`; [`info`] lists every
//! bundle. Bundles are looked up by name. Revoking a bundle confirms every
//! cluster that was provisioned with it, since Central refuses otherwise.

use crate::modules::{connection_from_args, parse_params, ModuleResponse};
use crate::stackrox_api::cluster_init::InitBundleService;
use crate::stackrox_api::resources::{GeneratedInitBundle, InitBundle};
use crate::stackrox_api::types::StackroxError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleState {
    #[default]
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InitBundleParams {
    pub name: String,
    #[serde(default)]
    pub state: BundleState,
}

impl InitBundleParams {
    pub fn new(name: impl Into<String>, state: BundleState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }

    pub fn validate(&self) -> Result<(), StackroxError> {
        if self.name.trim().is_empty() {
            return Err(StackroxError::invalid_argument("name must not be empty"));
        }
        Ok(())
    }
}

/// The bundle reported back to the caller: either the one that already
/// existed, or the freshly created one with its secrets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BundleSnapshot {
    Created(GeneratedInitBundle),
    Existing(InitBundle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitBundleOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initbundle: Option<BundleSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitBundleInfo {
    pub changed: bool,
    pub bundles: Vec<InitBundle>,
}

/// Reconcile one named init bundle against the requested state
pub async fn run(
    service: &InitBundleService,
    params: &InitBundleParams,
) -> Result<InitBundleOutcome, StackroxError> {
    params.validate()?;

    let existing = service.get_initbundle(&params.name).await?;

    match params.state {
        BundleState::Absent => match existing {
            Some(bundle) => {
                let impacted_cluster_ids = bundle.impacted_cluster_ids();
                service
                    .revoke_initbundles(vec![bundle.id.clone()], &impacted_cluster_ids)
                    .await?;
                Ok(InitBundleOutcome {
                    changed: true,
                    initbundle: None,
                })
            }
            None => Ok(InitBundleOutcome {
                changed: false,
                initbundle: None,
            }),
        },
        BundleState::Present => match existing {
            Some(bundle) => Ok(InitBundleOutcome {
                changed: false,
                initbundle: Some(BundleSnapshot::Existing(bundle)),
            }),
            None => {
                let created = service.create_initbundle(&params.name).await?;
                Ok(InitBundleOutcome {
                    changed: true,
                    initbundle: Some(BundleSnapshot::Created(created)),
                })
            }
        },
    }
}

/// List every init bundle. Never changes anything.
pub async fn info(service: &InitBundleService) -> Result<InitBundleInfo, StackroxError> {
    Ok(InitBundleInfo {
        changed: false,
        bundles: service.list_initbundles().await?,
    })
}

/// Run [`run`] from a single JSON argument object
pub async fn run_module(args: &Value) -> ModuleResponse<InitBundleOutcome> {
    ModuleResponse::from_result(run_from_args(args).await)
}

/// Run [`info`] from a single JSON argument object
pub async fn info_module(args: &Value) -> ModuleResponse<InitBundleInfo> {
    ModuleResponse::from_result(info_from_args(args).await)
}

async fn info_from_args(args: &Value) -> Result<InitBundleInfo, StackroxError> {
    let config = connection_from_args(args)?;
    let service = InitBundleService::new(&config)?;
    info(&service).await
}

async fn run_from_args(args: &Value) -> Result<InitBundleOutcome, StackroxError> {
    let config = connection_from_args(args)?;
    let params: InitBundleParams = parse_params(args)?;
    let service = InitBundleService::new(&config)?;
    run(&service, &params).await
}

use crate::config::ConnectionConfig;
use crate::stackrox_api::client::{ApiRequest, StackroxClient};
use crate::stackrox_api::resources::{
    CreateInitBundleRequest, GeneratedInitBundle, InitBundle, InitBundleList,
    InitBundleRevokeRequest, InitBundleRevokeResponse,
};
use crate::stackrox_api::types::StackroxError;
use serde_json::Value;

const API_BASE: &str = "cluster-init";
const INIT_BUNDLES: &str = "init-bundles";
const INIT_BUNDLES_REVOKE: &str = "init-bundles/revoke";

/// One bundle id or several
///
/// Accepted wherever bundles are revoked; always normalized to a list
/// before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleIds {
    Single(String),
    Many(Vec<String>),
}

impl BundleIds {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            BundleIds::Single(id) => vec![id],
            BundleIds::Many(ids) => ids,
        }
    }
}

impl From<String> for BundleIds {
    fn from(id: String) -> Self {
        BundleIds::Single(id)
    }
}

impl From<&str> for BundleIds {
    fn from(id: &str) -> Self {
        BundleIds::Single(id.to_string())
    }
}

impl From<Vec<String>> for BundleIds {
    fn from(ids: Vec<String>) -> Self {
        BundleIds::Many(ids)
    }
}

impl From<&[&str]> for BundleIds {
    fn from(ids: &[&str]) -> Self {
        BundleIds::Many(ids.iter().map(|id| id.to_string()).collect())
    }
}

impl TryFrom<&Value> for BundleIds {
    type Error = StackroxError;

    /// Accept a JSON string or an array of JSON strings
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(id) => Ok(BundleIds::Single(id.clone())),
            Value::Array(_) => Ok(BundleIds::Many(string_list(value, "Bundle IDs")?)),
            other => Err(StackroxError::invalid_argument(format!(
                "Bundle IDs must be a string or a list of strings, got {}",
                other
            ))),
        }
    }
}

/// Decode a JSON array whose every element must be a string
pub fn string_list(value: &Value, what: &str) -> Result<Vec<String>, StackroxError> {
    let items = value
        .as_array()
        .ok_or_else(|| StackroxError::invalid_argument(format!("{} must be a list", what)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| StackroxError::invalid_argument(format!("{} must be strings", what)))
        })
        .collect()
}

/// Service for cluster-init bundles (`/v1/cluster-init`)
#[derive(Debug, Clone)]
pub struct InitBundleService {
    client: StackroxClient,
}

impl InitBundleService {
    pub fn new(config: &ConnectionConfig) -> Result<Self, StackroxError> {
        Ok(Self {
            client: StackroxClient::new(config, API_BASE)?,
        })
    }

    /// Wrap an existing client. The client must point at `/v1/cluster-init`.
    pub fn from_client(client: StackroxClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StackroxClient {
        &self.client
    }

    /// Return every init bundle known to Central
    pub async fn list_initbundles(&self) -> Result<Vec<InitBundle>, StackroxError> {
        tracing::debug!("Listing init bundles");
        let list: InitBundleList = self
            .client
            .request(ApiRequest::get().suffix(INIT_BUNDLES))
            .await?;
        Ok(list.items)
    }

    /// Return the first bundle whose name is exactly `name`, if any
    pub async fn get_initbundle(&self, name: &str) -> Result<Option<InitBundle>, StackroxError> {
        let bundle = self
            .list_initbundles()
            .await?
            .into_iter()
            .find(|b| b.name == name);

        if bundle.is_none() {
            tracing::debug!("No init bundle named '{}'", name);
        }
        Ok(bundle)
    }

    /// Create a bundle with the given name.
    ///
    /// The response is the only place the bundle's helm and kubectl secrets
    /// are ever returned.
    pub async fn create_initbundle(&self, name: &str) -> Result<GeneratedInitBundle, StackroxError> {
        tracing::info!("Creating init bundle '{}'", name);

        let payload = CreateInitBundleRequest {
            name: name.to_string(),
        };
        let bundle: GeneratedInitBundle = self
            .client
            .request(ApiRequest::post().suffix(INIT_BUNDLES).json(&payload))
            .await?;

        tracing::info!("Created init bundle '{}' with id {}", bundle.meta.name, bundle.meta.id);
        Ok(bundle)
    }

    /// Revoke one or more bundles.
    ///
    /// `impacted_cluster_ids` must list every cluster that was provisioned
    /// with any of the bundles, or Central refuses the revocation. If Central
    /// reports any per-bundle error the whole call fails with
    /// [`StackroxError::BundleRevokeFailed`], even when other ids succeeded.
    pub async fn revoke_initbundles(
        &self,
        bundle_ids: impl Into<BundleIds>,
        impacted_cluster_ids: &[String],
    ) -> Result<Vec<String>, StackroxError> {
        let ids = bundle_ids.into().into_vec();
        if ids.is_empty() {
            return Err(StackroxError::invalid_argument("No init bundle IDs provided"));
        }

        tracing::info!(
            "Revoking init bundles {:?} (confirming {} impacted clusters)",
            ids,
            impacted_cluster_ids.len()
        );

        let payload = InitBundleRevokeRequest {
            ids,
            confirm_impacted_cluster_ids: impacted_cluster_ids.to_vec(),
        };

        let result: InitBundleRevokeResponse = self
            .client
            .request(ApiRequest::patch().suffix(INIT_BUNDLES_REVOKE).json(&payload))
            .await?;

        if !result.init_bundle_revocation_errors.is_empty() {
            tracing::error!(
                "Failed to revoke {} init bundle(s)",
                result.init_bundle_revocation_errors.len()
            );
            return Err(StackroxError::BundleRevokeFailed(
                result.init_bundle_revocation_errors,
            ));
        }

        Ok(result.init_bundle_revoked_ids)
    }

    /// Revoke bundles from untyped JSON arguments.
    ///
    /// `bundle_ids` may be a string or a list of strings and
    /// `impacted_cluster_ids` a list of strings; anything else fails with
    /// [`StackroxError::InvalidArgument`] before a request is sent.
    pub async fn revoke_initbundles_value(
        &self,
        bundle_ids: &Value,
        impacted_cluster_ids: Option<&Value>,
    ) -> Result<Vec<String>, StackroxError> {
        let ids = BundleIds::try_from(bundle_ids)?;
        let impacted = match impacted_cluster_ids {
            Some(value) => string_list(value, "Impacted cluster IDs")?,
            None => Vec::new(),
        };
        self.revoke_initbundles(ids, &impacted).await
    }
}

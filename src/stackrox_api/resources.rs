use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// API token metadata
///
/// Tokens are unique by `id` only; several tokens may share a `name`.
/// Every other key Central sends is kept in `extra` untouched, so a token
/// serializes back to exactly the record it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiToken {
    pub fn role(&self) -> Option<&str> {
        str_field(&self.extra, "role")
    }

    /// Role names, from `roles` or else the single legacy `role`
    pub fn roles(&self) -> Vec<&str> {
        match self.extra.get("roles").and_then(Value::as_array) {
            Some(roles) => roles.iter().filter_map(Value::as_str).collect(),
            None => self.role().into_iter().collect(),
        }
    }

    /// A missing `revoked` flag means active
    pub fn revoked(&self) -> bool {
        self.extra
            .get("revoked")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn issued_at(&self) -> Option<&str> {
        str_field(&self.extra, "issuedAt")
    }

    pub fn expiration(&self) -> Option<&str> {
        str_field(&self.extra, "expiration")
    }

    /// Whether this token should be part of a result set.
    ///
    /// Active tokens always are; revoked tokens only when asked for.
    pub fn is_included(&self, include_revoked: bool) -> bool {
        !self.revoked() || include_revoked
    }
}

/// Response wrapper for `GET /v1/apitokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

/// Request payload for `POST /v1/apitokens/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTokenRequest {
    pub name: String,
    pub role: String,
}

/// Response of `POST /v1/apitokens/generate`, kept as Central sent it.
///
/// Central answers either with `{token, metadata}` or with a flat token
/// record; the accessors read both shapes.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedToken {
    pub body: Map<String, Value>,
}

impl GeneratedToken {
    /// The token secret. Central returns it only from this call.
    pub fn token(&self) -> Option<&str> {
        str_field(&self.body, "token")
    }

    /// The token record, from the `metadata` envelope or the flat body
    pub fn metadata(&self) -> Option<ApiToken> {
        let record = match self.body.get("metadata") {
            Some(metadata) => metadata.clone(),
            None => Value::Object(self.body.clone()),
        };
        serde_json::from_value(record).ok()
    }

    pub fn id(&self) -> Option<String> {
        self.metadata().map(|t| t.id)
    }
}

impl fmt::Debug for GeneratedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedToken")
            .field("metadata", &self.metadata())
            .field("token", &self.token().map(|_| "<redacted>"))
            .finish()
    }
}

/// Reference to a cluster provisioned with an init bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Cluster-init bundle metadata
///
/// Only `id` and `name` are typed; the rest of the record, `createdBy`
/// included even when null, stays in `extra` as Central sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitBundle {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InitBundle {
    pub fn created_at(&self) -> Option<&str> {
        str_field(&self.extra, "createdAt")
    }

    pub fn expires_at(&self) -> Option<&str> {
        str_field(&self.extra, "expiresAt")
    }

    /// Identity of the creator, as opaque JSON
    pub fn created_by(&self) -> Option<&Value> {
        self.extra.get("createdBy").filter(|v| !v.is_null())
    }

    pub fn impacted_clusters(&self) -> Vec<ClusterRef> {
        self.extra
            .get("impactedClusters")
            .and_then(Value::as_array)
            .map(|clusters| {
                clusters
                    .iter()
                    .filter_map(|c| ClusterRef::deserialize(c).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn impacted_cluster_ids(&self) -> Vec<String> {
        self.impacted_clusters().into_iter().map(|c| c.id).collect()
    }
}

/// A freshly created init bundle.
///
/// The helm and kubectl bundles are secret material that Central returns
/// exactly once, from the create call. Unmodeled top-level keys are kept
/// in `extra`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedInitBundle {
    pub meta: InitBundle,
    pub helm_values_bundle: String,
    pub kubectl_bundle: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for GeneratedInitBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedInitBundle")
            .field("meta", &self.meta)
            .field("helm_values_bundle", &"<redacted>")
            .field("kubectl_bundle", &"<redacted>")
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Response wrapper for `GET /v1/cluster-init/init-bundles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitBundleList {
    #[serde(default)]
    pub items: Vec<InitBundle>,
}

/// Request payload for `POST /v1/cluster-init/init-bundles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInitBundleRequest {
    pub name: String,
}

/// Request payload for `PATCH /v1/cluster-init/init-bundles/revoke`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundleRevokeRequest {
    pub ids: Vec<String>,
    pub confirm_impacted_cluster_ids: Vec<String>,
}

/// Per-bundle failure reported by the revoke endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundleRevocationError {
    pub id: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub impacted_clusters: Vec<ClusterRef>,
}

/// Response for `PATCH /v1/cluster-init/init-bundles/revoke`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBundleRevokeResponse {
    #[serde(default)]
    pub init_bundle_revocation_errors: Vec<InitBundleRevocationError>,
    #[serde(default)]
    pub init_bundle_revoked_ids: Vec<String>,
}

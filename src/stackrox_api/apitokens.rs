use crate::config::ConnectionConfig;
use crate::stackrox_api::client::{ApiRequest, StackroxClient};
use crate::stackrox_api::resources::{
    ApiToken, GenerateTokenRequest, GeneratedToken, TokenList,
};
use crate::stackrox_api::types::StackroxError;

const API_BASE: &str = "apitokens";

/// Service for StackRox API tokens (`/v1/apitokens`)
#[derive(Debug, Clone)]
pub struct TokenService {
    client: StackroxClient,
}

impl TokenService {
    pub fn new(config: &ConnectionConfig) -> Result<Self, StackroxError> {
        Ok(Self {
            client: StackroxClient::new(config, API_BASE)?,
        })
    }

    /// Wrap an existing client. The client must point at `/v1/apitokens`.
    pub fn from_client(client: StackroxClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StackroxClient {
        &self.client
    }

    /// Return all API tokens.
    ///
    /// Revoked tokens are left out unless `include_revoked` is set.
    pub async fn list(&self, include_revoked: bool) -> Result<Vec<ApiToken>, StackroxError> {
        tracing::debug!("Listing API tokens (include_revoked={})", include_revoked);

        let list: TokenList = self
            .client
            .request(ApiRequest::get().query("revoked", include_revoked.to_string()))
            .await?;

        Ok(list
            .tokens
            .into_iter()
            .filter(|t| t.is_included(include_revoked))
            .collect())
    }

    /// Return API tokens matching an id or a name.
    ///
    /// When `id` is given it is used in preference to `name` and the token is
    /// fetched directly; the result holds at most one token. Otherwise every
    /// token is listed and filtered by exact name, which can match several
    /// tokens since names are not unique.
    pub async fn get(
        &self,
        name: Option<&str>,
        id: Option<&str>,
        include_revoked: bool,
    ) -> Result<Vec<ApiToken>, StackroxError> {
        let name = name.filter(|n| !n.is_empty());
        let id = id.filter(|i| !i.is_empty());

        match (id, name) {
            (Some(id), _) => {
                tracing::debug!("Fetching API token by id {}", id);
                let token: ApiToken = self.client.request(ApiRequest::get().suffix(id)).await?;
                Ok(if token.is_included(include_revoked) {
                    vec![token]
                } else {
                    Vec::new()
                })
            }
            (None, Some(name)) => {
                tracing::debug!("Fetching API tokens by name '{}'", name);
                Ok(self
                    .list(include_revoked)
                    .await?
                    .into_iter()
                    .filter(|t| t.name == name && t.is_included(include_revoked))
                    .collect())
            }
            (None, None) => Err(StackroxError::invalid_argument(
                "either name or id must be provided",
            )),
        }
    }

    /// Create a token with the given name and role.
    ///
    /// No uniqueness check is made; Central happily issues several tokens
    /// with the same name. The response is returned as Central sent it,
    /// secret included.
    pub async fn create(&self, name: &str, role: &str) -> Result<GeneratedToken, StackroxError> {
        tracing::info!("Generating API token '{}' with role '{}'", name, role);

        let payload = GenerateTokenRequest {
            name: name.to_string(),
            role: role.to_string(),
        };

        let token: GeneratedToken = self
            .client
            .request(ApiRequest::post().suffix("generate").json(&payload))
            .await?;

        tracing::info!(
            "Generated API token '{}' with id {}",
            name,
            token.id().unwrap_or_default()
        );
        Ok(token)
    }

    /// Revoke a token by id, or by name when the name is unique.
    ///
    /// Revoking by name looks the name up first. It fails with
    /// [`StackroxError::NotFound`] when no active token carries the name and
    /// with [`StackroxError::AmbiguousMatch`] when several do; neither case
    /// sends a revoke call.
    pub async fn revoke(&self, id: Option<&str>, name: Option<&str>) -> Result<bool, StackroxError> {
        let id = id.filter(|i| !i.is_empty());
        let name = name.filter(|n| !n.is_empty());

        let id = match (id, name) {
            (Some(id), _) => id.to_string(),
            (None, Some(name)) => {
                let mut matches = self.get(Some(name), None, false).await?;
                match matches.len() {
                    0 => {
                        return Err(StackroxError::NotFound {
                            name: name.to_string(),
                        })
                    }
                    1 => matches.remove(0).id,
                    count => {
                        tracing::warn!(
                            "Refusing to revoke by name: {} active tokens named '{}'",
                            count,
                            name
                        );
                        return Err(StackroxError::AmbiguousMatch {
                            name: name.to_string(),
                            count,
                        });
                    }
                }
            }
            (None, None) => {
                return Err(StackroxError::invalid_argument(
                    "either token id or name must be provided",
                ))
            }
        };

        tracing::info!("Revoking API token {}", id);

        let suffix = format!("revoke/{}", id);
        let _: serde_json::Value = self
            .client
            .request(ApiRequest::patch().suffix(&suffix))
            .await?;

        Ok(true)
    }
}

//! API token handler
//!
//! | state     | behavior                                                        |
//! |-----------|-----------------------------------------------------------------|
//! | `list`    | list tokens, optionally including revoked ones                  |
//! | `get`     | fetch by id, or every token with the given name                 |
//! | `present` | create a token unless one with this id/name already exists      |
//! | `absent`  | revoke the single matching token; ambiguous names are an error  |
//!
//! Tokens cannot be updated in place, so `present` never modifies an
//! existing token. The lookup and the create are separate calls: two
//! concurrent `present` runs for the same name can both create a token.

use crate::config::ConnectionConfig;
use crate::modules::{connection_from_args, parse_params, ModuleResponse};
use crate::stackrox_api::apitokens::TokenService;
use crate::stackrox_api::resources::{ApiToken, GeneratedToken};
use crate::stackrox_api::types::StackroxError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    #[default]
    Present,
    Absent,
    List,
    Get,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiTokenParams {
    pub name: Option<String>,
    pub id: Option<String>,
    pub role: Option<String>,
    pub include_revoked: bool,
    pub state: TokenState,
}

impl ApiTokenParams {
    fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|i| !i.is_empty())
    }

    fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.is_empty())
    }

    /// Check the per-state required parameters
    pub fn validate(&self) -> Result<(), StackroxError> {
        match self.state {
            TokenState::Present => {
                if self.name().is_none() || self.role().is_none() {
                    return Err(StackroxError::invalid_argument(
                        "state is present but all of the following are missing: name, role",
                    ));
                }
            }
            TokenState::Absent | TokenState::Get => {
                if self.name().is_none() && self.id().is_none() {
                    return Err(StackroxError::invalid_argument(
                        "either name or id must be provided",
                    ));
                }
            }
            TokenState::List => {}
        }
        Ok(())
    }
}

/// A token reported back to the caller: a stored record, or the generate
/// response with its secret.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenSnapshot {
    Existing(ApiToken),
    Generated(GeneratedToken),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiTokenOutcome {
    pub changed: bool,
    pub tokens: Vec<TokenSnapshot>,
}

impl ApiTokenOutcome {
    fn unchanged(tokens: Vec<ApiToken>) -> Self {
        Self {
            changed: false,
            tokens: tokens.into_iter().map(TokenSnapshot::Existing).collect(),
        }
    }
}

/// Reconcile API tokens against the requested state
pub async fn run(
    service: &TokenService,
    params: &ApiTokenParams,
) -> Result<ApiTokenOutcome, StackroxError> {
    params.validate()?;

    match params.state {
        TokenState::List => Ok(ApiTokenOutcome::unchanged(
            service.list(params.include_revoked).await?,
        )),
        TokenState::Get => Ok(ApiTokenOutcome::unchanged(
            service
                .get(params.name(), params.id(), params.include_revoked)
                .await?,
        )),
        TokenState::Absent => {
            let mut existing = service.get(params.name(), params.id(), false).await?;

            match existing.len() {
                0 => {
                    tracing::debug!("No matching token; nothing to revoke");
                    Ok(ApiTokenOutcome::unchanged(Vec::new()))
                }
                1 => {
                    let token = existing.remove(0);
                    service.revoke(Some(&token.id), None).await?;
                    Ok(ApiTokenOutcome {
                        changed: true,
                        tokens: Vec::new(),
                    })
                }
                count => Err(StackroxError::AmbiguousMatch {
                    name: params.name().unwrap_or_default().to_string(),
                    count,
                }),
            }
        }
        TokenState::Present => {
            let existing = service.get(params.name(), params.id(), false).await?;
            if !existing.is_empty() {
                return Ok(ApiTokenOutcome::unchanged(existing));
            }

            // validate() guarantees both are set for present
            let name = params.name().unwrap_or_default();
            let role = params.role().unwrap_or_default();
            let token = service.create(name, role).await?;

            Ok(ApiTokenOutcome {
                changed: true,
                tokens: vec![TokenSnapshot::Generated(token)],
            })
        }
    }
}

/// Run the handler from a single JSON argument object holding both the
/// connection fields and the token parameters.
pub async fn run_module(args: &Value) -> ModuleResponse<ApiTokenOutcome> {
    ModuleResponse::from_result(run_from_args(args).await)
}

async fn run_from_args(args: &Value) -> Result<ApiTokenOutcome, StackroxError> {
    let config: ConnectionConfig = connection_from_args(args)?;
    let params: ApiTokenParams = parse_params(args)?;
    let service = TokenService::new(&config)?;
    run(&service, &params).await
}

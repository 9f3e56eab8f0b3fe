//! StackRox SDK
//!
//! A Rust library for managing StackRox Central API tokens and
//! cluster-init bundles.
//!
//! This SDK provides:
//! - An authenticated Central API client (bearer token or basic auth,
//!   optional TLS verification)
//! - Token and init-bundle services with typed errors
//! - Declarative `present`/`absent`/`list`/`get` handlers that report
//!   whether anything changed
//! - Connection configuration from code, TOML, or the environment
//!
//! # Example
//!
//! ```no_run
//! use stackrox_sdk::{
//!     config::ConnectionConfig,
//!     modules::initbundle::{self, BundleState, InitBundleParams},
//!     InitBundleService, TokenService,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::from_env()?;
//!
//! // Generate a CI token
//! let tokens = TokenService::new(&config)?;
//! let token = tokens.create("ci-pipeline", "Continuous Integration").await?;
//! println!("Created token {}", token.id().unwrap_or_default());
//!
//! // Make sure an init bundle exists for a new cluster
//! let bundles = InitBundleService::new(&config)?;
//! let outcome = initbundle::run(
//!     &bundles,
//!     &InitBundleParams::new("prod-east", BundleState::Present),
//! )
//! .await?;
//! println!("changed: {}", outcome.changed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod modules;
pub mod stackrox_api;

// Re-export commonly used types and functions
pub use config::{ConnectionConfig, Credentials};
pub use modules::ModuleResponse;
pub use stackrox_api::{
    apitokens::TokenService,
    client::{ApiRequest, StackroxClient},
    cluster_init::{BundleIds, InitBundleService},
    resources::{
        ApiToken, ClusterRef, GeneratedInitBundle, GeneratedToken, InitBundle,
        InitBundleRevocationError,
    },
    types::{ApiError, ErrorKind, StackroxError},
};

/// StackRox Central API integration module
///
/// This module provides the authenticated HTTP client and the resource
/// services built on it.
///
/// ## Resources
///
/// - API tokens (`/v1/apitokens`): list, get, generate, revoke
/// - Cluster-init bundles (`/v1/cluster-init/init-bundles`): list, get by
///   name, create, bulk revoke
pub mod apitokens;
pub mod client;
pub mod cluster_init;
pub mod resources;
pub mod types;

pub use apitokens::TokenService;
pub use client::{ApiRequest, StackroxClient};
pub use cluster_init::{BundleIds, InitBundleService};
pub use resources::*;
pub use types::{ApiError, ErrorKind, StackroxError};

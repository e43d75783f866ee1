//! Sets up the GraphQL client of the Satisfactory Mod Repository site.
//!
//! Every operation the site runs passes through the same chain:
//!
//! 1. the normalized cache, which answers from cached entities when it can, keeps a few
//!    listing types out of normalization and evicts entities when the mutations that change
//!    them succeed,
//! 2. the auth exchange, which attaches the signed in user's token,
//! 3. persisted queries, sent as GET with a hash of the query text,
//! 4. the multipart transport, which sends file uploads as `multipart/form-data` and
//!    everything else as JSON.
//!
//! ```no_run
//! use smr_bootstrap::{initialize_graphql_client, queries::{get_mod, GetMod}, user_token, SiteConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = initialize_graphql_client(&SiteConfig::default(), None)?;
//! user_token().set(Some("token".to_string()));
//!
//! let _response = client
//!     .query(GetMod, get_mod::Variables { mod_id: "8d8gk4imvFanRs".to_string() })
//!     .await
//!     .map_err(|e| e.compat())?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate async_trait;

mod auth;
pub mod cache_policy;
mod config;
mod error;
mod graphql;
pub mod queries;
mod user;

pub use auth::{SmrAuth, SmrAuthState, AUTHORIZATION};
pub use cache_policy::{cache_options, InvalidationRule, INVALIDATION_RULES, NORMALIZATION_EXEMPTIONS};
pub use config::{SiteConfig, DEFAULT_API_URL};
pub use error::BootstrapError;
pub use graphql::{
    build_graphql_client, graphql_client, initialize_graphql_client, load_schema, SmrClient,
    SmrExchange
};
pub use user::{user_token, UserToken};

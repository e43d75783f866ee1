use smr_normalized_cache::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid site config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid API url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),
    #[error("the GraphQL client is already initialized")]
    AlreadyInitialized
}

use crate::{
    auth::SmrAuth,
    cache_policy::cache_options,
    config::SiteConfig,
    user::{user_token, UserToken},
    BootstrapError
};
use once_cell::sync::OnceCell;
use smr_graphql::{
    default_exchanges::{
        AuthExchange, AuthExchangeImpl, MultipartFetchExchange, MultipartFetchExchangeImpl,
        PersistedFetchExchange, PersistedFetchExchangeImpl
    },
    Client
};
use smr_normalized_cache::{NormalizedCacheExchange, NormalizedCacheImpl, SchemaMetadata};
use tracing::info;

/// The exchange chain of the site, outermost first: cache, auth, persisted queries, then the
/// multipart transport.
pub type SmrExchange = NormalizedCacheImpl<
    AuthExchangeImpl<SmrAuth, PersistedFetchExchangeImpl<MultipartFetchExchangeImpl>>
>;
pub type SmrClient = Client<SmrExchange>;

static CLIENT: OnceCell<SmrClient> = OnceCell::new();

/// Read the schema from an introspection query result.
pub fn load_schema(introspection: &str) -> Result<SchemaMetadata, BootstrapError> {
    let introspection: serde_json::Value = serde_json::from_str(introspection)?;
    Ok(SchemaMetadata::from_introspection(&introspection)?)
}

/// Assemble a client for the site without installing it anywhere.
pub fn build_graphql_client(
    config: &SiteConfig,
    token: UserToken,
    schema: Option<SchemaMetadata>
) -> Result<SmrClient, BootstrapError> {
    config.validate()?;
    let url = config.api_graphql();
    info!(url = url.as_str(), schema = schema.is_some(), "building GraphQL client");

    let client = Client::builder(url)
        .with_exchange(MultipartFetchExchange)
        .with_exchange(PersistedFetchExchange::new().prefer_get_for_persisted_queries(true))
        .with_exchange(AuthExchange::new(SmrAuth::new(token)))
        .with_exchange(NormalizedCacheExchange::with_options(cache_options(schema)))
        .build();
    Ok(client)
}

/// Build the client against the process-wide token store and install it. Only the first call
/// succeeds.
pub fn initialize_graphql_client(
    config: &SiteConfig,
    schema: Option<SchemaMetadata>
) -> Result<&'static SmrClient, BootstrapError> {
    let mut initialized = false;
    let client = CLIENT.get_or_try_init(|| {
        initialized = true;
        build_graphql_client(config, user_token(), schema)
    })?;
    if initialized {
        Ok(client)
    } else {
        Err(BootstrapError::AlreadyInitialized)
    }
}

/// The installed client, if `initialize_graphql_client` has run.
pub fn graphql_client() -> Option<&'static SmrClient> {
    CLIENT.get()
}

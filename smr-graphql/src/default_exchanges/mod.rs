//! The exchanges shipped with the client.
//! The network exchanges require the `default-exchanges` feature.

use crate::{
    exchange::{Client, Exchange, ExchangeResult, Operation},
    GraphQLQuery
};
use thiserror::Error;

mod auth;
#[cfg(feature = "default-exchanges")]
mod multipart;
#[cfg(feature = "default-exchanges")]
mod persisted;
#[cfg(feature = "default-exchanges")]
mod transport;

pub use auth::{AuthConfig, AuthExchange, AuthExchangeImpl};
#[cfg(feature = "default-exchanges")]
pub use multipart::{MultipartFetchExchange, MultipartFetchExchangeImpl};
#[cfg(feature = "default-exchanges")]
pub use persisted::{PersistedFetchExchange, PersistedFetchExchangeImpl};
#[cfg(feature = "default-exchanges")]
pub use transport::FetchError;

#[derive(Debug, Error)]
enum MiddlewareError {
    #[error("unexpected end of middleware chain")]
    UnexpectedEndOfChain
}

/// The terminating exchange.
/// This will always be the last exchange in the chain and will simply return an error if called.
pub struct TerminatorExchange;

#[async_trait]
impl Exchange for TerminatorExchange {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        _operation: Operation<Q::Variables>,
        _client: C
    ) -> ExchangeResult<Q::ResponseData> {
        Err(MiddlewareError::UnexpectedEndOfChain.into())
    }
}

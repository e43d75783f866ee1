#[cfg(feature = "default-exchanges")]
use crate::default_exchanges::MultipartFetchExchange;
use crate::{
    client::{Client, ClientImpl},
    default_exchanges::TerminatorExchange,
    exchange::{Exchange, ExchangeFactory},
    FetchOptionsInit, RequestPolicy
};
#[cfg(feature = "observable")]
use parking_lot::Mutex;
#[cfg(feature = "observable")]
use std::collections::HashMap;
use std::sync::Arc;

pub struct ClientBuilder<M: Exchange = TerminatorExchange> {
    exchange: M,
    url: String,
    fetch_options: Option<FetchOptionsInit>,
    request_policy: RequestPolicy
}

impl ClientBuilder<TerminatorExchange> {
    pub fn new<U: Into<String>>(url: U) -> Self {
        ClientBuilder {
            exchange: TerminatorExchange,
            url: url.into(),
            fetch_options: None,
            request_policy: RequestPolicy::CacheFirst
        }
    }
}

impl<M: Exchange> ClientBuilder<M> {
    /// Add the default exchanges to the chain. Keep in mind that exchanges are executed bottom
    /// to top, so the first one added will be the last one executed.
    #[cfg(feature = "default-exchanges")]
    pub fn with_default_exchanges(self) -> ClientBuilder<impl Exchange> {
        self.with_exchange(MultipartFetchExchange)
    }

    /// Add an exchange to the chain. Keep in mind that exchanges are executed bottom to top,
    /// so the first one added will be the last one executed.
    pub fn with_exchange<F>(self, exchange_factory: F) -> ClientBuilder<F::Output>
    where
        F: ExchangeFactory<M>
    {
        let exchange = exchange_factory.build(self.exchange);
        ClientBuilder {
            exchange,
            url: self.url,
            fetch_options: self.fetch_options,
            request_policy: self.request_policy
        }
    }

    /// Fetch options applied to every operation that doesn't bring its own.
    pub fn with_fetch_options<O: Into<FetchOptionsInit>>(mut self, fetch_options: O) -> Self {
        self.fetch_options = Some(fetch_options.into());
        self
    }

    pub fn with_request_policy(mut self, request_policy: RequestPolicy) -> Self {
        self.request_policy = request_policy;
        self
    }

    pub fn build(self) -> Client<M> {
        let client = ClientImpl {
            url: self.url,
            exchange: self.exchange,
            fetch_options: self.fetch_options,
            request_policy: self.request_policy,
            #[cfg(feature = "observable")]
            active_watchers: Arc::new(Mutex::new(HashMap::new()))
        };

        Client(Arc::new(client))
    }
}

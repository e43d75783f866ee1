use super::transport::{execute, payload_for, wants_get, Extensions, FetchError, RequestBody};
use crate::{
    exchange::{Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationResult},
    FetchOptions, GraphQLQuery, OperationType, Response
};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering}
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistedQueryError {
    NotFound,
    NotSupported
}

fn persisted_query_error<R: Clone>(response: &Response<R>) -> Option<PersistedQueryError> {
    response.errors.as_ref()?.iter().find_map(|error| {
        match (error.message.as_str(), error.code()) {
            ("PersistedQueryNotFound", _) | (_, Some("PERSISTED_QUERY_NOT_FOUND")) => {
                Some(PersistedQueryError::NotFound)
            }
            ("PersistedQueryNotSupported", _) | (_, Some("PERSISTED_QUERY_NOT_SUPPORTED")) => {
                Some(PersistedQueryError::NotSupported)
            }
            _ => None
        }
    })
}

/// Sends queries as the SHA-256 hash of their text.
///
/// If the server doesn't know a hash yet the query is sent again with its full text so the
/// server can store it. If the server doesn't support persisted queries at all, every later
/// operation is handed to the next exchange untouched.
///
/// Mutations and operations with file uploads are always handed to the next exchange.
pub struct PersistedFetchExchange {
    prefer_get: bool,
    http: Option<reqwest::Client>
}

impl PersistedFetchExchange {
    pub fn new() -> Self {
        Self {
            prefer_get: false,
            http: None
        }
    }

    /// Send hashed queries as GET requests, which lets HTTP caches answer them.
    pub fn prefer_get_for_persisted_queries(mut self, prefer_get: bool) -> Self {
        self.prefer_get = prefer_get;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

impl Default for PersistedFetchExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl<TNext: Exchange> ExchangeFactory<TNext> for PersistedFetchExchange {
    type Output = PersistedFetchExchangeImpl<TNext>;

    fn build(self, next: TNext) -> Self::Output {
        PersistedFetchExchangeImpl {
            prefer_get: self.prefer_get,
            http: self.http.unwrap_or_default(),
            supported: AtomicBool::new(true),
            hashes: Mutex::new(HashMap::new()),
            next
        }
    }
}

pub struct PersistedFetchExchangeImpl<TNext: Exchange> {
    prefer_get: bool,
    http: reqwest::Client,
    supported: AtomicBool,
    hashes: Mutex<HashMap<&'static str, String>>,
    next: TNext
}

impl<TNext: Exchange> PersistedFetchExchangeImpl<TNext> {
    /// `false` once the server has said it doesn't support persisted queries.
    pub fn is_enabled(&self) -> bool {
        self.supported.load(Ordering::Acquire)
    }

    fn hash_of(&self, query: &'static str) -> String {
        self.hashes
            .lock()
            .entry(query)
            .or_insert_with(|| hex::encode(Sha256::digest(query.as_bytes())))
            .clone()
    }

    async fn fetch<Q: GraphQLQuery>(
        &self,
        operation: &Operation<Q::Variables>,
        options: &FetchOptions,
        hash: &str,
        with_query: bool
    ) -> Result<Response<Q::ResponseData>, FetchError> {
        let body = RequestBody {
            query: if with_query {
                Some(operation.query.query)
            } else {
                None
            },
            operation_name: operation.query.operation_name,
            variables: &operation.query.variables,
            extensions: Some(Extensions::persisted(hash))
        };
        // Only hashed requests are worth sending as GET.
        let prefer_get = wants_get(options, self.prefer_get && !with_query);
        let payload = payload_for(&operation.options.url, &body, prefer_get)?;
        execute(&self.http, &operation.options.url, payload, options).await
    }
}

#[async_trait]
impl<TNext: Exchange> Exchange for PersistedFetchExchangeImpl<TNext> {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        client: C
    ) -> ExchangeResult<Q::ResponseData> {
        if operation.meta.operation_type != OperationType::Query
            || !self.is_enabled()
            || !Q::uploads(&operation.query.variables).is_empty()
        {
            return self.next.run::<Q, _>(operation, client).await;
        }

        let hash = self.hash_of(operation.query.query);
        let options = operation.resolved_fetch_options();
        let mut response = self.fetch::<Q>(&operation, &options, &hash, false).await?;

        match persisted_query_error(&response) {
            Some(PersistedQueryError::NotFound) => {
                debug!(
                    operation = operation.meta.operation_name,
                    hash = hash.as_str(),
                    "persisted query not found, sending full query"
                );
                response = self.fetch::<Q>(&operation, &options, &hash, true).await?;
            }
            Some(PersistedQueryError::NotSupported) => {
                warn!("server does not support persisted queries, disabling them");
                self.supported.store(false, Ordering::Release);
                return self.next.run::<Q, _>(operation, client).await;
            }
            None => {}
        }

        Ok(OperationResult {
            key: operation.key,
            meta: operation.meta,
            response
        })
    }

    fn teardown(&self, query_key: u64) {
        self.next.teardown(query_key);
    }
}

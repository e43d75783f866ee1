use crate::{GraphQLQuery, QueryBody, QueryError, Response};
use serde::{de::DeserializeOwned, Serialize, Serializer};
use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

#[cfg(feature = "observable")]
pub use crate::client::Observable;

pub type ExchangeResult<R> = Result<OperationResult<R>, QueryError>;

/// A single stage of the operation pipeline.
///
/// An exchange either answers an operation itself or hands it (possibly modified) to the next
/// exchange, and may act on the result on its way back.
#[async_trait]
pub trait Exchange: Send + Sync + 'static {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        client: C
    ) -> ExchangeResult<Q::ResponseData>;

    /// Nobody is interested in results for `query_key` anymore. Exchanges that keep state per
    /// operation drop it here, and every exchange that has a next one passes this on.
    fn teardown(&self, _query_key: u64) {}
}

/// Builds an exchange around the next one in the chain.
pub trait ExchangeFactory<TNext: Exchange> {
    type Output: Exchange;

    fn build(self, next: TNext) -> Self::Output;
}

/// The parts of the client exchanges are allowed to call back into.
pub trait Client: Clone + Send + Sync + 'static {
    /// Re-execute the operation with this key for everyone watching it.
    fn rerun_query(&self, query_key: u64);
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription
}

impl OperationType {
    pub fn to_str(&self) -> &'static str {
        match self {
            OperationType::Query => "query",
            OperationType::Mutation => "mutation",
            OperationType::Subscription => "subscription"
        }
    }

    /// The default name of the root type operations of this kind select on.
    pub fn root_typename(&self) -> &'static str {
        match self {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
            OperationType::Subscription => "Subscription"
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPolicy {
    /// Use cached data if it's complete, otherwise go to the network.
    CacheFirst,
    /// Never go to the network. A miss yields an empty response.
    CacheOnly,
    /// Always go to the network, but still write the result to the cache.
    NetworkOnly
}

impl Default for RequestPolicy {
    fn default() -> Self {
        RequestPolicy::CacheFirst
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    Post
}

/// Options applied to the HTTP request made for an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Forces a request method. Transports pick one themselves when this is `None`.
    pub method: Option<FetchMethod>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing header of the same name regardless of case.
    pub fn set_header<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.set_header(name, value);
        self
    }

    /// Merge `headers` into these options. Later values win over existing ones.
    pub fn merge_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>
    {
        for (name, value) in headers {
            self.set_header(name, value);
        }
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn with_method(mut self, method: FetchMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Fetch options as supplied by the caller: either fixed, or computed each time they're needed.
#[derive(Clone)]
pub enum FetchOptionsInit {
    Value(FetchOptions),
    Factory(Arc<dyn Fn() -> FetchOptions + Send + Sync>)
}

impl FetchOptionsInit {
    pub fn factory<F: Fn() -> FetchOptions + Send + Sync + 'static>(factory: F) -> Self {
        FetchOptionsInit::Factory(Arc::new(factory))
    }

    pub fn resolve(&self) -> FetchOptions {
        match self {
            FetchOptionsInit::Value(options) => options.clone(),
            FetchOptionsInit::Factory(factory) => factory()
        }
    }
}

impl From<FetchOptions> for FetchOptionsInit {
    fn from(options: FetchOptions) -> Self {
        FetchOptionsInit::Value(options)
    }
}

impl fmt::Debug for FetchOptionsInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOptionsInit::Value(options) => f.debug_tuple("Value").field(options).finish(),
            FetchOptionsInit::Factory(_) => f.write_str("Factory(..)")
        }
    }
}

/// A file to be sent with an operation. Serializes as `null`, which is what the multipart
/// request format expects in place of the file.
#[derive(Clone, Debug, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Arc<Vec<u8>>
}

impl Upload {
    pub fn new<N: Into<String>>(file_name: N, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            content: Arc::new(content)
        }
    }

    pub fn with_content_type<T: Into<String>>(mut self, content_type: T) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl Serialize for Upload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_unit()
    }
}

/// An upload together with its location in the request body.
#[derive(Clone, Debug, PartialEq)]
pub struct FileUpload {
    /// Dot-separated path, e.g. `variables.logo` or `variables.files.0`.
    pub path: String,
    pub file: Upload
}

impl FileUpload {
    pub fn new<P: Into<String>>(path: P, file: Upload) -> Self {
        Self {
            path: path.into(),
            file
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OperationMeta {
    /// Hash of the query text alone.
    pub query_key: u32,
    pub operation_type: OperationType,
    pub operation_name: &'static str
}

#[derive(Clone, Debug)]
pub struct OperationOptions {
    pub url: String,
    pub fetch_options: Option<FetchOptionsInit>,
    pub request_policy: RequestPolicy
}

#[derive(Clone)]
pub struct Operation<V: Serialize + Clone + Send + Sync> {
    /// Identifies the query text together with its variables.
    pub key: u64,
    pub meta: OperationMeta,
    pub query: QueryBody<V>,
    pub options: OperationOptions
}

impl<V: Serialize + Clone + Send + Sync> Operation<V> {
    /// The fetch options in effect for this operation, with factories already called.
    pub fn resolved_fetch_options(&self) -> FetchOptions {
        self.options
            .fetch_options
            .as_ref()
            .map(FetchOptionsInit::resolve)
            .unwrap_or_default()
    }

    pub fn with_fetch_options<O: Into<FetchOptionsInit>>(mut self, fetch_options: O) -> Self {
        self.options.fetch_options = Some(fetch_options.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultSource {
    Cache,
    Network
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugInfo {
    pub source: ResultSource
}

impl DebugInfo {
    pub fn cache() -> Self {
        Self {
            source: ResultSource::Cache
        }
    }

    pub fn network() -> Self {
        Self {
            source: ResultSource::Network
        }
    }
}

#[derive(Clone, Debug)]
pub struct OperationResult<R: DeserializeOwned + Send + Sync + Clone> {
    pub key: u64,
    pub meta: OperationMeta,
    pub response: Response<R>
}

/// Per-call overrides of the client defaults.
#[derive(Default, Clone, Debug)]
pub struct QueryOptions {
    pub url: Option<String>,
    pub fetch_options: Option<FetchOptionsInit>,
    pub request_policy: Option<RequestPolicy>
}

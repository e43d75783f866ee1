//! The GraphQL client used by the Satisfactory Mod Repository site.
//!
//! All of the client's behaviour lives in exchanges, which are chained together when the
//! client is built. An operation travels down the chain until an exchange can answer it,
//! and the result travels back up through every exchange it passed.
//!
//! # Getting Started
//!
//! Operations are plain types implementing [`GraphQLQuery`](./trait.GraphQLQuery.html):
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use smr_graphql::{GraphQLQuery, OperationType};
//!
//! pub struct GetMod;
//!
//! #[derive(Serialize, Clone)]
//! pub struct Variables {
//!     #[serde(rename = "modId")]
//!     pub mod_id: String
//! }
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! pub struct ResponseData {
//!     #[serde(rename = "getMod")]
//!     pub get_mod: Option<serde_json::Value>
//! }
//!
//! impl GraphQLQuery for GetMod {
//!     type Variables = Variables;
//!     type ResponseData = ResponseData;
//!
//!     const QUERY: &'static str =
//!         "query GetMod($modId: ModID!) { getMod(modId: $modId) { __typename id name } }";
//!     const OPERATION_NAME: &'static str = "GetMod";
//!     const OPERATION_TYPE: OperationType = OperationType::Query;
//! }
//! ```
//!
//! A client is then assembled from exchanges:
//!
//! ```no_run
//! # use smr_graphql::{Client, default_exchanges::{MultipartFetchExchange, PersistedFetchExchange}};
//! let client = Client::builder("https://api.ficsit.app/v2/query")
//!     .with_exchange(MultipartFetchExchange)
//!     .with_exchange(PersistedFetchExchange::new().prefer_get_for_persisted_queries(true))
//!     .build();
//! ```
//!
//! # Exchanges
//!
//! Exchanges are like a bi-directional middleware. Keep in mind that they are added bottom to
//! top: the first exchange passed to the builder is the last one to run.
//!
//! ## AuthExchange
//!
//! Asks an [`AuthConfig`](./default_exchanges/trait.AuthConfig.html) for the current auth state
//! before every operation and lets it rewrite the operation, usually to attach a header.
//!
//! ## PersistedFetchExchange
//!
//! Sends queries as a SHA-256 hash of their text instead of the text itself, falling back to the
//! full text when the server doesn't know the hash yet.
//!
//! ## MultipartFetchExchange
//!
//! The terminating transport. Operations carrying file uploads are sent as
//! `multipart/form-data`, everything else as JSON.
//!
//! # Features
//!
//! * `default-exchanges` **(default)** - Include the network exchanges. Pulls in `reqwest`.
//! * `observable` **(default)** - Include support for watched queries. Includes `tokio`.

#[macro_use]
extern crate async_trait;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{collections::HashMap, fmt, fmt::Display};
use types::*;

pub mod client;
pub mod default_exchanges;
mod error;
pub(crate) mod types;
pub mod utils;

pub use client::{Client, ClientBuilder};
pub use error::QueryError;
#[cfg(feature = "observable")]
pub use types::Observable;
pub use types::{
    DebugInfo, FetchMethod, FetchOptions, FetchOptionsInit, FileUpload, OperationType,
    QueryOptions, RequestPolicy, ResultSource, Upload
};

/// Types used by custom exchanges. Regular users probably don't need these.
pub mod exchange {
    pub use crate::types::{
        Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationMeta,
        OperationOptions, OperationResult, OperationType
    };
}

/// The form in which operations are sent over HTTP.
/// This will be built using the [GraphQLQuery](./trait.GraphQLQuery.html) trait normally.
#[derive(Debug, Serialize, Clone)]
pub struct QueryBody<Variables: Serialize + Send + Sync + Clone> {
    /// The values for the variables. They must match those declared in the query.
    pub variables: Variables,
    /// The GraphQL query, as a string.
    pub query: &'static str,
    /// The GraphQL operation name, as a string.
    #[serde(rename = "operationName")]
    pub operation_name: &'static str
}

/// A GraphQL operation known at compile time.
///
/// Implementors supply the document and the shapes of its variables and response.
/// Queries should select `__typename` and `id` on entities, and typed response data has to keep
/// `__typename` when serialized, so the normalized cache can identify them.
pub trait GraphQLQuery: Send + Sync + 'static {
    /// The shape of the variables expected by the operation.
    type Variables: Serialize + Send + Sync + Clone + 'static;
    /// The top-level shape of the response data (the `data` field in the GraphQL response).
    type ResponseData: Serialize + DeserializeOwned + Send + Sync + Clone + 'static;

    /// The full GraphQL document.
    const QUERY: &'static str;
    /// The name of the operation inside `QUERY` to execute.
    const OPERATION_NAME: &'static str;
    /// Whether this is a query, mutation or subscription.
    const OPERATION_TYPE: OperationType;

    /// Produce a request body that can be JSON serialized and sent to a GraphQL API, along with
    /// the metadata exchanges use to route it.
    fn build_query(variables: Self::Variables) -> (QueryBody<Self::Variables>, OperationMeta) {
        let meta = OperationMeta {
            query_key: utils::hash_query(Self::QUERY),
            operation_type: Self::OPERATION_TYPE,
            operation_name: Self::OPERATION_NAME
        };
        let body = QueryBody {
            variables,
            query: Self::QUERY,
            operation_name: Self::OPERATION_NAME
        };
        (body, meta)
    }

    /// The files contained in `variables`, with their paths into the request body
    /// (e.g. `variables.logo`). Upload values themselves serialize as `null`.
    fn uploads(_variables: &Self::Variables) -> Vec<FileUpload> {
        Vec::new()
    }
}

/// The generic shape taken by the responses of GraphQL APIs.
///
/// [Spec](https://github.com/facebook/graphql/blob/master/spec/Section%207%20--%20Response.md)
///
/// ```
/// # use serde_json::json;
/// # use serde::Deserialize;
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct Mod {
/// #     id: String,
/// # }
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct ResponseData {
/// #     mods: Vec<Mod>,
/// # }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use smr_graphql::Response;
///
/// let body: Response<ResponseData> = serde_json::from_value(json!({
///     "data": {
///         "mods": [{"id": "8d8gk4imvFanRs"}],
///     },
///     "errors": [],
/// }))?;
///
/// let expected: Response<ResponseData> = Response {
///     data: Some(ResponseData {
///         mods: vec![Mod { id: "8d8gk4imvFanRs".to_owned() }],
///     }),
///     errors: Some(vec![]),
///     debug_info: None
/// };
///
/// assert_eq!(body, expected);
///
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Response<Data: Clone> {
    /// Where the result came from. Filled in by exchanges, never sent by the server.
    #[serde(skip)]
    pub debug_info: Option<DebugInfo>,
    /// The absent, partial or complete response data.
    pub data: Option<Data>,
    /// The top-level errors returned by the server.
    pub errors: Option<Vec<Error>>
}

impl<Data: Clone> Response<Data> {
    /// `true` if the server returned at least one error.
    pub fn has_errors(&self) -> bool {
        self.errors
            .as_ref()
            .map(|errors| !errors.is_empty())
            .unwrap_or(false)
    }
}

/// An element in the top-level `errors` array of a response body.
///
/// [Spec](https://github.com/facebook/graphql/blob/master/spec/Section%207%20--%20Response.md)
///
/// ```
/// # use serde_json::json;
/// # use serde::Deserialize;
/// #
/// # #[derive(Debug, Deserialize, PartialEq, Clone)]
/// # struct ResponseData {
/// #     something: i32
/// # }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use smr_graphql::*;
///
/// let body: Response<ResponseData> = serde_json::from_value(json!({
///     "data": null,
///     "errors": [
///         {
///             "message": "user not logged in",
///             "path": ["deleteMod"]
///         },
///      ],
/// }))?;
///
/// let expected: Response<ResponseData> = Response {
///     data: None,
///     errors: Some(vec![
///         Error {
///             message: "user not logged in".to_owned(),
///             locations: None,
///             path: Some(vec![PathFragment::Key("deleteMod".into())]),
///             extensions: None,
///         },
///     ]),
///     debug_info: None
/// };
///
/// assert_eq!(body, expected);
///
/// #     Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Error {
    /// The human-readable error message. This is the only required field.
    pub message: String,
    /// Which locations in the query the error applies to.
    pub locations: Option<Vec<Location>>,
    /// Which path in the query the error applies to, e.g. `["getMods", "mods", 0, "name"]`.
    pub path: Option<Vec<PathFragment>>,
    /// Additional error data. Its exact format is defined by the server.
    pub extensions: Option<HashMap<String, serde_json::Value>>
}

impl Error {
    /// The `extensions.code` field, which is where servers put machine-readable error codes.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(|code| code.as_str())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use `/` as a separator like JSON Pointer.
        let path = self
            .path
            .as_ref()
            .map(|fragments| {
                fragments
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|| "<query>".to_string());

        let loc = self
            .locations
            .as_ref()
            .and_then(|locations| locations.iter().next())
            .cloned()
            .unwrap_or_default();

        write!(f, "{}:{}:{}: {}", path, loc.line, loc.column, self.message)
    }
}

/// Part of a path in a query. It can be an object key or an array index. See [Error](./struct.Error.html).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PathFragment {
    /// A key inside an object
    Key(String),
    /// An index inside an array
    Index(i32)
}

/// Represents a location inside a query string. Used in errors. See [Error](./struct.Error.html).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// The line number in the query string where the error originated (starting from 1).
    pub line: i32,
    /// The column number in the query string where the error originated (starting from 1).
    pub column: i32
}

impl Display for PathFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            PathFragment::Key(ref key) => write!(f, "{}", key),
            PathFragment::Index(ref idx) => write!(f, "{}", idx)
        }
    }
}

use std::sync::Arc;

mod builder;
mod r#impl;
#[cfg(feature = "observable")]
mod observable;

use crate::{
    default_exchanges::TerminatorExchange, exchange::Exchange, GraphQLQuery, QueryError,
    QueryOptions, Response
};
pub use builder::ClientBuilder;
#[cfg(feature = "observable")]
pub use observable::{Observable, OperationObservable};
pub use r#impl::ClientImpl;

/// A GraphQL client. Cheap to clone, all clones share the same exchanges.
#[repr(transparent)]
pub struct Client<M: Exchange = TerminatorExchange>(pub Arc<ClientImpl<M>>);

impl<M: Exchange> Clone for Client<M> {
    fn clone(&self) -> Self {
        Client(self.0.clone())
    }
}

impl Client {
    pub fn builder<U: Into<String>>(url: U) -> ClientBuilder {
        ClientBuilder::new(url)
    }
}

impl<M: Exchange> Client<M> {
    /// Execute a query or mutation with the client defaults.
    pub async fn query<Q: GraphQLQuery>(
        &self,
        _query: Q,
        variables: Q::Variables
    ) -> Result<Response<Q::ResponseData>, QueryError> {
        self.0.query(_query, variables).await
    }

    pub async fn query_with_options<Q: GraphQLQuery>(
        &self,
        _query: Q,
        variables: Q::Variables,
        options: QueryOptions
    ) -> Result<Response<Q::ResponseData>, QueryError> {
        self.0.query_with_options(_query, variables, options).await
    }

    /// Execute a query and keep listening for new results. The stream yields the initial
    /// result, then a new one every time an exchange asks for the query to be rerun
    /// (for example when the cache invalidates data it depends on).
    #[cfg(feature = "observable")]
    pub async fn watch_query<Q: GraphQLQuery>(
        &self,
        query: Q,
        variables: Q::Variables
    ) -> OperationObservable<Q, M> {
        self.0.watch_query(query, variables).await
    }

    #[cfg(feature = "observable")]
    pub async fn watch_query_with_options<Q: GraphQLQuery>(
        &self,
        _query: Q,
        variables: Q::Variables,
        options: QueryOptions
    ) -> OperationObservable<Q, M> {
        self.0
            .watch_query_with_options(_query, variables, options)
            .await
    }
}

use crate::{
    exchange::{Client, Exchange, Operation, OperationMeta, OperationOptions},
    utils::progressive_hash,
    FetchOptionsInit, GraphQLQuery, QueryBody, QueryError, QueryOptions, RequestPolicy, Response
};
#[cfg(feature = "observable")]
use parking_lot::Mutex;
#[cfg(feature = "observable")]
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "observable")]
use crate::client::observable::Watcher;

pub struct ClientImpl<M: Exchange> {
    pub(crate) url: String,
    pub(crate) exchange: M,
    pub(crate) fetch_options: Option<FetchOptionsInit>,
    pub(crate) request_policy: RequestPolicy,
    #[cfg(feature = "observable")]
    pub(crate) active_watchers: Arc<Mutex<HashMap<u64, Watcher>>>
}

impl<M: Exchange> Client for Arc<ClientImpl<M>> {
    #[cfg(feature = "observable")]
    fn rerun_query(&self, query_key: u64) {
        super::observable::rerun_query(self, query_key);
    }

    #[cfg(not(feature = "observable"))]
    fn rerun_query(&self, _query_key: u64) {}
}

impl<M: Exchange> ClientImpl<M> {
    #[cfg(feature = "observable")]
    pub(crate) fn clear_observable(&self, key: u64, index: usize) {
        let last_watcher = {
            let mut watchers = self.active_watchers.lock();
            match watchers.get_mut(&key) {
                Some(watcher) => {
                    watcher.listeners.remove(index);
                    let empty = watcher.listeners.is_empty();
                    if empty {
                        watchers.remove(&key);
                    }
                    empty
                }
                None => false
            }
        };
        if last_watcher {
            self.exchange.teardown(key);
        }
    }

    #[cfg(feature = "observable")]
    fn is_watched(&self, key: u64) -> bool {
        self.active_watchers.lock().contains_key(&key)
    }

    #[cfg(not(feature = "observable"))]
    fn is_watched(&self, _key: u64) -> bool {
        false
    }

    pub(crate) async fn execute_request_operation<Q: GraphQLQuery>(
        self: &Arc<Self>,
        operation: Operation<Q::Variables>
    ) -> Result<Response<Q::ResponseData>, QueryError> {
        debug!(
            operation = operation.meta.operation_name,
            key = operation.key,
            "executing {}",
            operation.meta.operation_type
        );
        self.exchange
            .run::<Q, _>(operation, self.clone())
            .await
            .map(|operation_result| operation_result.response)
    }

    pub async fn query<Q: GraphQLQuery>(
        self: &Arc<Self>,
        _query: Q,
        variables: Q::Variables
    ) -> Result<Response<Q::ResponseData>, QueryError> {
        self.query_with_options(_query, variables, QueryOptions::default())
            .await
    }

    pub async fn query_with_options<Q: GraphQLQuery>(
        self: &Arc<Self>,
        _query: Q,
        variables: Q::Variables,
        options: QueryOptions
    ) -> Result<Response<Q::ResponseData>, QueryError> {
        let (query, meta) = Q::build_query(variables);
        let operation = self.create_request_operation::<Q>(query, meta, options);
        let key = operation.key;
        let result = self.execute_request_operation::<Q>(operation).await;
        if !self.is_watched(key) {
            self.exchange.teardown(key);
        }
        result
    }

    #[cfg(feature = "observable")]
    pub async fn watch_query<Q: GraphQLQuery>(
        self: &Arc<Self>,
        query: Q,
        variables: Q::Variables
    ) -> super::observable::OperationObservable<Q, M> {
        self.watch_query_with_options(query, variables, QueryOptions::default())
            .await
    }

    #[cfg(feature = "observable")]
    pub async fn watch_query_with_options<Q: GraphQLQuery>(
        self: &Arc<Self>,
        _query: Q,
        variables: Q::Variables,
        options: QueryOptions
    ) -> super::observable::OperationObservable<Q, M> {
        super::observable::watch_with_options::<Q, M>(self, variables, options).await
    }

    pub(crate) fn create_request_operation<Q: GraphQLQuery>(
        &self,
        query: QueryBody<Q::Variables>,
        meta: OperationMeta,
        options: QueryOptions
    ) -> Operation<Q::Variables> {
        let fetch_options = options
            .fetch_options
            .or_else(|| self.fetch_options.clone());
        let key = progressive_hash(meta.query_key, &query.variables);

        Operation {
            key,
            meta,
            query,
            options: OperationOptions {
                url: options.url.unwrap_or_else(|| self.url.clone()),
                fetch_options,
                request_policy: options.request_policy.unwrap_or(self.request_policy)
            }
        }
    }
}

//! Contains the exchange factory and implementation. The factory is the only thing needed for most
//! users and is reexported from the root.

use crate::{
    cache::Cache,
    selection::{FieldNode, SelectionNode},
    store::{Store, StoreCache},
    types::{FnvMap, NormalizedCacheOptions, Updater}
};
use serde_json::Value;
use smr_graphql::{
    exchange::{
        Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationResult,
        OperationType
    },
    DebugInfo, GraphQLQuery, RequestPolicy, Response
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

/// The normalized cache exchange. This will store normalized queries by unique ID.
#[derive(Default)]
pub struct NormalizedCacheExchange {
    options: Option<NormalizedCacheOptions>
}

impl NormalizedCacheExchange {
    /// Create a new cache exchange with default options
    pub fn new() -> Self {
        Self { options: None }
    }

    /// Create a new cache exchange with extra options.
    pub fn with_options(options: NormalizedCacheOptions) -> Self {
        Self {
            options: Some(options)
        }
    }
}

fn check_options(options: &NormalizedCacheOptions) {
    let schema = match &options.schema {
        Some(schema) => schema,
        None => return
    };
    for typename in options.keys.keys() {
        if !schema.has_type(typename) {
            warn!(typename = typename.as_str(), "key resolver given for a type the schema doesn't have");
        }
    }
    for field in options.updates.keys() {
        if !schema.has_mutation_field(field) {
            warn!(field = field.as_str(), "updater given for a field the mutation type doesn't have");
        }
    }
}

impl<TNext: Exchange> ExchangeFactory<TNext> for NormalizedCacheExchange {
    type Output = NormalizedCacheImpl<TNext>;

    fn build(self, next: TNext) -> NormalizedCacheImpl<TNext> {
        let options = self.options.unwrap_or_default();
        check_options(&options);
        NormalizedCacheImpl {
            store: Arc::new(Store::new(&options)),
            updates: options.updates,
            next
        }
    }
}

/// The implementation of the normalized cache. Exposed in case someone needs it, but most users
/// shouldn't.
pub struct NormalizedCacheImpl<TNext: Exchange> {
    store: Arc<Store>,
    updates: FnvMap<String, Updater>,
    next: TNext
}

/// The fields selected directly on the root type, looking through fragments.
fn root_fields<'a>(selection: &'a [SelectionNode], fields: &mut Vec<&'a FieldNode>) {
    for node in selection {
        match node {
            SelectionNode::Field(field) => fields.push(field),
            SelectionNode::Fragment { selection, .. } => root_fields(selection, fields)
        }
    }
}

impl<TNext: Exchange> NormalizedCacheImpl<TNext> {
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    fn plan<Q: GraphQLQuery>(&self, operation: &Operation<Q::Variables>) -> Option<Vec<SelectionNode>> {
        match self.store.plan(
            operation.query.query,
            operation.meta.operation_name,
            &operation.query.variables
        ) {
            Ok(selection) => Some(selection),
            Err(e) => {
                warn!(
                    operation = operation.meta.operation_name,
                    error = %e,
                    "can't cache operation"
                );
                None
            }
        }
    }

    fn read_query<Q: GraphQLQuery>(
        &self,
        operation: &Operation<Q::Variables>,
        selection: &[SelectionNode]
    ) -> Option<OperationResult<Q::ResponseData>> {
        let mut dependencies = HashSet::new();
        let data = match self
            .store
            .read(self.store.query_root(), selection, &mut dependencies)
        {
            Some(data) => data,
            None => {
                debug!(key = operation.key, "cache miss");
                return None;
            }
        };

        match serde_json::from_value::<Q::ResponseData>(Value::Object(data)) {
            Ok(data) => {
                debug!(key = operation.key, "cache hit");
                self.store.set_dependencies(operation.key, &dependencies);
                Some(OperationResult {
                    key: operation.key,
                    meta: operation.meta.clone(),
                    response: Response {
                        debug_info: Some(DebugInfo::cache()),
                        data: Some(data),
                        errors: None
                    }
                })
            }
            Err(e) => {
                debug!(key = operation.key, error = %e, "cached data doesn't fit the query");
                None
            }
        }
    }

    fn write_query<Q: GraphQLQuery, C: Client>(
        &self,
        result: &OperationResult<Q::ResponseData>,
        selection: &[SelectionNode],
        client: &C
    ) {
        let data = match result.response.data.as_ref().map(serde_json::to_value) {
            Some(Ok(data)) => data,
            Some(Err(e)) => {
                warn!(key = result.key, error = %e, "failed to serialize result for the cache");
                return;
            }
            None => return
        };

        let written = self
            .store
            .write(self.store.query_root(), &data, selection, true);
        self.store.set_dependencies(result.key, &written.dependencies);
        self.store.rerun_queries(&written.changed, result.key, client);
    }

    fn write_mutation<Q: GraphQLQuery, C: Client>(
        &self,
        result: &OperationResult<Q::ResponseData>,
        selection: &[SelectionNode],
        client: &C
    ) {
        if result.response.has_errors() {
            debug!(key = result.key, "mutation returned errors, skipping updates");
            return;
        }
        let data = match result.response.data.as_ref().map(serde_json::to_value) {
            Some(Ok(data)) => data,
            Some(Err(e)) => {
                warn!(key = result.key, error = %e, "failed to serialize result for the cache");
                return;
            }
            None => return
        };

        let mut written = self
            .store
            .write(self.store.mutation_root(), &data, selection, false);

        let mut fields = Vec::new();
        root_fields(selection, &mut fields);
        for field in fields {
            let updater = match self.updates.get(&field.name) {
                Some(updater) => updater,
                None => continue
            };
            if data.get(&field.response_key).map_or(true, Value::is_null) {
                debug!(field = field.name.as_str(), "mutation field is null, skipping update");
                continue;
            }
            let mut cache = StoreCache {
                store: &self.store,
                changed: &mut written.changed
            };
            updater(&data, &field.arguments, &mut cache as &mut dyn Cache);
        }

        self.store.rerun_queries(&written.changed, result.key, client);
    }
}

#[async_trait]
impl<TNext: Exchange> Exchange for NormalizedCacheImpl<TNext> {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        client: C
    ) -> ExchangeResult<Q::ResponseData> {
        if operation.meta.operation_type == OperationType::Subscription {
            return self.next.run::<Q, _>(operation, client).await;
        }
        let selection = match self.plan::<Q>(&operation) {
            Some(selection) => selection,
            None => return self.next.run::<Q, _>(operation, client).await
        };

        if operation.meta.operation_type == OperationType::Mutation {
            let result = self.next.run::<Q, _>(operation, client.clone()).await?;
            self.write_mutation::<Q, _>(&result, &selection, &client);
            return Ok(result);
        }

        let request_policy = operation.options.request_policy;
        if request_policy != RequestPolicy::NetworkOnly {
            if let Some(cached) = self.read_query::<Q>(&operation, &selection) {
                return Ok(cached);
            }
            if request_policy == RequestPolicy::CacheOnly {
                return Ok(OperationResult {
                    key: operation.key,
                    meta: operation.meta,
                    response: Response {
                        debug_info: Some(DebugInfo::cache()),
                        data: None,
                        errors: None
                    }
                });
            }
        }

        let result = self.next.run::<Q, _>(operation, client.clone()).await?;
        self.write_query::<Q, _>(&result, &selection, &client);
        Ok(result)
    }

    fn teardown(&self, query_key: u64) {
        self.store.clear_dependencies(query_key);
        self.next.teardown(query_key);
    }
}

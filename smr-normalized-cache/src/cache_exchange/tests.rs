use crate::{
    cache_exchange::NormalizedCacheExchange, Entity, NormalizedCacheOptions, SchemaMetadata
};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use racetrack::{track_with, Tracker};
use serde::Serialize;
use serde_json::{json, Value};
use smr_graphql::{
    exchange::{
        Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationOptions,
        OperationResult
    },
    utils::progressive_hash,
    DebugInfo, GraphQLQuery, OperationType, RequestPolicy, Response, ResultSource
};
use std::{collections::HashMap, sync::Arc};

struct GetMod;

#[derive(Serialize, Clone)]
struct ModVariables {
    #[serde(rename = "modId")]
    mod_id: String
}

impl GraphQLQuery for GetMod {
    type Variables = ModVariables;
    type ResponseData = Value;

    const QUERY: &'static str =
        "query GetMod($modId: ModID!) { getMod(modId: $modId) { __typename id name } }";
    const OPERATION_NAME: &'static str = "GetMod";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

struct GetMods;

impl GraphQLQuery for GetMods {
    type Variables = ();
    type ResponseData = Value;

    const QUERY: &'static str =
        "query GetMods { getMods { __typename count mods { __typename id name } } }";
    const OPERATION_NAME: &'static str = "GetMods";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

struct DeleteMod;

impl GraphQLQuery for DeleteMod {
    type Variables = ModVariables;
    type ResponseData = Value;

    const QUERY: &'static str = "mutation DeleteMod($modId: ModID!) { deleteMod(modId: $modId) }";
    const OPERATION_NAME: &'static str = "DeleteMod";
    const OPERATION_TYPE: OperationType = OperationType::Mutation;
}

struct UpdateMod;

impl GraphQLQuery for UpdateMod {
    type Variables = ModVariables;
    type ResponseData = Value;

    const QUERY: &'static str =
        "mutation UpdateMod($modId: ModID!) { updateMod(modId: $modId) { __typename id name } }";
    const OPERATION_NAME: &'static str = "UpdateMod";
    const OPERATION_TYPE: OperationType = OperationType::Mutation;
}

struct GetContent;

impl GraphQLQuery for GetContent {
    type Variables = ();
    type ResponseData = Value;

    const QUERY: &'static str = r#"
        query GetContent {
            getContent {
                __typename
                ... on Mod { id name }
                ... on Guide { id title }
            }
        }
    "#;
    const OPERATION_NAME: &'static str = "GetContent";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

lazy_static! {
    static ref SCHEMA: SchemaMetadata = SchemaMetadata::from_introspection(&json!({
        "__schema": {
            "queryType": { "name": "Query" },
            "mutationType": null,
            "subscriptionType": null,
            "types": [
                { "kind": "OBJECT", "name": "Mod" },
                { "kind": "OBJECT", "name": "Guide" },
                { "kind": "UNION", "name": "Content", "possibleTypes": [{ "name": "Mod" }, { "name": "Guide" }] }
            ]
        }
    }))
    .unwrap();
    static ref TRACKER: Arc<Tracker> = Tracker::new();
}

struct SearchMods;

#[derive(Serialize, Clone)]
struct SearchVariables {
    search: String
}

impl GraphQLQuery for SearchMods {
    type Variables = SearchVariables;
    type ResponseData = Value;

    const QUERY: &'static str =
        "query SearchMods($search: String) { getMods(filter: { search: $search }) { __typename count mods { __typename id name } } }";
    const OPERATION_NAME: &'static str = "SearchMods";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

fn mod_variables() -> ModVariables {
    ModVariables {
        mod_id: "abc".to_string()
    }
}

fn make_op<Q: GraphQLQuery>(
    _query: Q,
    variables: Q::Variables,
    request_policy: RequestPolicy
) -> Operation<Q::Variables> {
    let (query, meta) = Q::build_query(variables);
    Operation {
        key: progressive_hash(meta.query_key, &query.variables),
        query,
        meta,
        options: OperationOptions {
            url: "http://0.0.0.0".to_string(),
            fetch_options: None,
            request_policy
        }
    }
}

/// Answers operations with canned responses by operation name.
#[derive(Clone)]
struct Fetch {
    responses: Arc<Mutex<HashMap<&'static str, Value>>>,
    tracker: Arc<Tracker>
}

impl Fetch {
    fn new(tracker: &Arc<Tracker>) -> Self {
        Fetch {
            responses: Arc::new(Mutex::new(HashMap::new())),
            tracker: tracker.clone()
        }
    }

    fn respond(&self, operation_name: &'static str, body: Value) {
        self.responses.lock().insert(operation_name, body);
    }
}

#[track_with(tracker)]
#[async_trait]
impl Exchange for Fetch {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        _client: C
    ) -> ExchangeResult<Q::ResponseData> {
        let body = self
            .responses
            .lock()
            .get(operation.meta.operation_name)
            .cloned()
            .unwrap_or_else(|| json!({ "data": null }));
        let mut response: Response<Q::ResponseData> = serde_json::from_value(body).unwrap();
        response.debug_info = Some(DebugInfo::network());

        Ok(OperationResult {
            key: operation.key,
            meta: operation.meta,
            response
        })
    }
}

#[derive(Clone)]
struct DummyClient {
    tracker: Arc<Tracker>
}

#[track_with(tracker, namespace = "Client")]
impl Client for DummyClient {
    fn rerun_query(&self, _query_key: u64) {}
}

fn mod_response(name: &str) -> Value {
    json!({ "data": { "getMod": { "__typename": "Mod", "id": "abc", "name": name } } })
}

fn source(result: &ExchangeResult<Value>) -> ResultSource {
    result
        .as_ref()
        .unwrap()
        .response
        .debug_info
        .as_ref()
        .unwrap()
        .source
        .clone()
}

#[tokio::test]
async fn writes_queries_to_cache() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond("GetMod", mod_response("Pak Utility Mod"));
    let exchange = NormalizedCacheExchange::new().build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };
    let operation = make_op(GetMod, mod_variables(), RequestPolicy::CacheFirst);

    let first = exchange
        .run::<GetMod, _>(operation.clone(), client.clone())
        .await;
    let second = exchange.run::<GetMod, _>(operation, client).await;

    assert_eq!(source(&first), ResultSource::Network);
    assert_eq!(source(&second), ResultSource::Cache, "Result didn't come from the cache");
    assert_eq!(second.unwrap().response.data.unwrap()["getMod"]["name"], "Pak Utility Mod");
    tracker.assert_that("Fetch::run").was_called_once();
    tracker.assert_that("Client::rerun_query").wasnt_called();
}

#[tokio::test]
async fn network_only_skips_reads_but_writes() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond("GetMod", mod_response("Pak Utility Mod"));
    let exchange = NormalizedCacheExchange::new().build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    for _ in 0..2 {
        let operation = make_op(GetMod, mod_variables(), RequestPolicy::NetworkOnly);
        exchange.run::<GetMod, _>(operation, client.clone()).await.unwrap();
    }
    let cached = exchange
        .run::<GetMod, _>(make_op(GetMod, mod_variables(), RequestPolicy::CacheFirst), client)
        .await;

    tracker.assert_that("Fetch::run").was_called_times(2);
    assert_eq!(source(&cached), ResultSource::Cache);
}

#[tokio::test]
async fn cache_only_misses_are_empty() {
    let tracker = Tracker::new();
    let exchange = NormalizedCacheExchange::new().build(Fetch::new(&tracker));

    let result = exchange
        .run::<GetMod, _>(
            make_op(GetMod, mod_variables(), RequestPolicy::CacheOnly),
            DummyClient {
                tracker: tracker.clone()
            }
        )
        .await
        .unwrap();

    assert!(result.response.data.is_none());
    assert!(result.response.errors.is_none());
    tracker.assert_that("Fetch::run").wasnt_called();
}

#[tokio::test]
async fn embedded_types_have_no_entity_key() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond(
        "GetMods",
        json!({ "data": { "getMods": {
            "__typename": "GetMods",
            "count": 1,
            "mods": [{ "__typename": "Mod", "id": "abc", "name": "Pak Utility Mod" }]
        } } })
    );
    let options = NormalizedCacheOptions::new().embed("GetMods");
    let exchange = NormalizedCacheExchange::with_options(options).build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    exchange
        .run::<GetMods, _>(make_op(GetMods, (), RequestPolicy::CacheFirst), client.clone())
        .await
        .unwrap();
    let cached = exchange
        .run::<GetMods, _>(make_op(GetMods, (), RequestPolicy::CacheFirst), client)
        .await;

    let store = exchange.store();
    assert_eq!(store.key_of_entity("GetMods", json!({ "id": "x" }).as_object().unwrap()), None);
    assert_eq!(
        store.resolve(&Entity::Key("Query"), "getMods", None),
        Some(json!("Query.getMods"))
    );
    assert_eq!(
        store.resolve(&Entity::new("Mod", "abc"), "name", None),
        Some(json!("Pak Utility Mod"))
    );
    assert_eq!(source(&cached), ResultSource::Cache);
    tracker.assert_that("Fetch::run").was_called_once();
}

#[tokio::test]
async fn mutation_updaters_invalidate_and_rerun_dependents() {
    #[track_with(TRACKER, namespace = "invalidate_and_rerun")]
    fn delete_mod(_mod_id: String) {}

    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond("GetMod", mod_response("Pak Utility Mod"));
    fetch.respond("DeleteMod", json!({ "data": { "deleteMod": true } }));
    let options = NormalizedCacheOptions::new().with_update("deleteMod", |_, args, cache| {
        let id = args["modId"].as_str().unwrap();
        delete_mod(id.to_string());
        cache.invalidate(&Entity::new("Mod", id));
    });
    let exchange = NormalizedCacheExchange::with_options(options).build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    let query = make_op(GetMod, mod_variables(), RequestPolicy::CacheFirst);
    let query_key = query.key;
    exchange.run::<GetMod, _>(query.clone(), client.clone()).await.unwrap();
    exchange
        .run::<DeleteMod, _>(
            make_op(DeleteMod, mod_variables(), RequestPolicy::NetworkOnly),
            client.clone()
        )
        .await
        .unwrap();
    let refetched = exchange.run::<GetMod, _>(query, client.clone()).await;

    TRACKER
        .assert_that("invalidate_and_rerun::delete_mod")
        .was_called_once()
        .with("abc".to_string());
    tracker
        .assert_that("Client::rerun_query")
        .was_called_once()
        .with(query_key);
    assert_eq!(source(&refetched), ResultSource::Network);
    tracker.assert_that("Fetch::run").was_called_times(3);
}

#[tokio::test]
async fn failed_mutations_skip_updaters() {
    #[track_with(TRACKER, namespace = "failed_mutation")]
    fn delete_mod() {}

    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond(
        "DeleteMod",
        json!({ "data": null, "errors": [{ "message": "user not authorized" }] })
    );
    let options = NormalizedCacheOptions::new().with_update("deleteMod", |_, _, _| delete_mod());
    let exchange = NormalizedCacheExchange::with_options(options).build(fetch);

    let result = exchange
        .run::<DeleteMod, _>(
            make_op(DeleteMod, mod_variables(), RequestPolicy::NetworkOnly),
            DummyClient {
                tracker: tracker.clone()
            }
        )
        .await
        .unwrap();

    assert!(result.response.has_errors());
    TRACKER
        .assert_that("failed_mutation::delete_mod")
        .wasnt_called();
    tracker.assert_that("Client::rerun_query").wasnt_called();
}

#[tokio::test]
async fn mutation_results_update_cached_entities() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond("GetMod", mod_response("Pak Utility Mod"));
    fetch.respond(
        "UpdateMod",
        json!({ "data": { "updateMod": { "__typename": "Mod", "id": "abc", "name": "PUM" } } })
    );
    let exchange = NormalizedCacheExchange::new().build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    let query = make_op(GetMod, mod_variables(), RequestPolicy::CacheFirst);
    let query_key = query.key;
    exchange.run::<GetMod, _>(query.clone(), client.clone()).await.unwrap();
    exchange
        .run::<UpdateMod, _>(
            make_op(UpdateMod, mod_variables(), RequestPolicy::NetworkOnly),
            client.clone()
        )
        .await
        .unwrap();
    let cached = exchange.run::<GetMod, _>(query, client.clone()).await;

    tracker
        .assert_that("Client::rerun_query")
        .was_called_once()
        .with(query_key);
    assert_eq!(source(&cached), ResultSource::Cache);
    assert_eq!(cached.unwrap().response.data.unwrap()["getMod"]["name"], "PUM");
}

#[tokio::test]
async fn fragments_match_through_the_schema() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond(
        "GetContent",
        json!({ "data": { "getContent": { "__typename": "Guide", "id": "g1", "title": "Modding 101" } } })
    );
    let exchange = NormalizedCacheExchange::with_options(NormalizedCacheOptions::new().with_schema(SCHEMA.clone()))
        .build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    exchange
        .run::<GetContent, _>(make_op(GetContent, (), RequestPolicy::CacheFirst), client.clone())
        .await
        .unwrap();
    let cached = exchange
        .run::<GetContent, _>(make_op(GetContent, (), RequestPolicy::CacheFirst), client)
        .await;

    assert_eq!(source(&cached), ResultSource::Cache);
    assert_eq!(
        cached.unwrap().response.data.unwrap(),
        json!({ "getContent": { "__typename": "Guide", "id": "g1", "title": "Modding 101" } })
    );
    tracker.assert_that("Fetch::run").was_called_once();
}

fn search_response(mod_ids: &[String]) -> Value {
    let mods: Vec<Value> = mod_ids
        .iter()
        .map(|id| json!({ "__typename": "Mod", "id": id, "name": id }))
        .collect();
    json!({ "data": { "getMods": { "__typename": "GetMods", "count": mods.len(), "mods": mods } } })
}

#[tokio::test]
async fn dependencies_follow_the_latest_result() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    let exchange = NormalizedCacheExchange::with_options(NormalizedCacheOptions::new().embed("GetMods"))
        .build(fetch.clone());
    let client = DummyClient {
        tracker: tracker.clone()
    };

    let mut keys = Vec::new();
    for i in 0..100 {
        let operation = make_op(
            SearchMods,
            SearchVariables {
                search: format!("search {}", i)
            },
            RequestPolicy::NetworkOnly
        );
        keys.push(operation.key);
        fetch.respond("SearchMods", search_response(&[format!("m{}", i)]));
        exchange.run::<SearchMods, _>(operation, client.clone()).await.unwrap();
    }

    let store = exchange.store();
    assert_eq!(store.dependents("Mod:m0"), vec![keys[0]]);
    assert!(store.dependents("Query").is_empty());

    fetch.respond("SearchMods", search_response(&[]));
    let rewritten = make_op(
        SearchMods,
        SearchVariables {
            search: "search 0".to_string()
        },
        RequestPolicy::NetworkOnly
    );
    exchange.run::<SearchMods, _>(rewritten, client).await.unwrap();

    assert!(store.dependents("Mod:m0").is_empty());
    assert_eq!(store.dependents("Mod:m1"), vec![keys[1]]);
}

#[tokio::test]
async fn teardown_stops_reruns() {
    let tracker = Tracker::new();
    let fetch = Fetch::new(&tracker);
    fetch.respond("GetMod", mod_response("Pak Utility Mod"));
    fetch.respond(
        "UpdateMod",
        json!({ "data": { "updateMod": { "__typename": "Mod", "id": "abc", "name": "PUM" } } })
    );
    let exchange = NormalizedCacheExchange::new().build(fetch);
    let client = DummyClient {
        tracker: tracker.clone()
    };

    let query = make_op(GetMod, mod_variables(), RequestPolicy::CacheFirst);
    exchange.run::<GetMod, _>(query.clone(), client.clone()).await.unwrap();
    assert_eq!(exchange.store().dependents("Mod:abc"), vec![query.key]);

    exchange.teardown(query.key);
    assert!(exchange.store().dependents("Mod:abc").is_empty());

    exchange
        .run::<UpdateMod, _>(
            make_op(UpdateMod, mod_variables(), RequestPolicy::NetworkOnly),
            client
        )
        .await
        .unwrap();
    tracker.assert_that("Client::rerun_query").wasnt_called();
}

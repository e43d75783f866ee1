use async_trait::async_trait;
use serde_json::{json, Value};
use smr_bootstrap::{
    cache_options,
    queries::{
        approve_mod, approve_version, delete_guide, delete_mod, delete_sml_version,
        delete_version, deny_mod, deny_version, update_version, ApproveMod, ApproveVersion,
        DeleteGuide, DeleteMod, DeleteSMLVersion, DeleteVersion, DenyMod, DenyVersion,
        UpdateVersion
    }
};
use smr_graphql::{
    exchange::{
        Client, Exchange, ExchangeFactory, ExchangeResult, Operation, OperationOptions,
        OperationResult
    },
    utils::progressive_hash,
    DebugInfo, GraphQLQuery, OperationType, RequestPolicy, Response
};
use smr_normalized_cache::{Entity, NormalizedCacheExchange};

const PRIMED: [(&str, &str); 4] = [
    ("Guide", "guide1"),
    ("Mod", "mod1"),
    ("Version", "version1"),
    ("SMLVersion", "sml1")
];

/// Loads one entity of every type a mutation can evict.
struct Prime;

impl GraphQLQuery for Prime {
    type Variables = ();
    type ResponseData = Value;

    const QUERY: &'static str = r#"
        query Prime {
            getGuide(guideId: "guide1") { __typename id name }
            getMod(modId: "mod1") { __typename id name }
            getVersion(versionId: "version1") { __typename id version }
            getSMLVersion(smlVersionId: "sml1") { __typename id version }
        }
    "#;
    const OPERATION_NAME: &'static str = "Prime";
    const OPERATION_TYPE: OperationType = OperationType::Query;
}

fn prime_data() -> Value {
    json!({
        "getGuide": { "__typename": "Guide", "id": "guide1", "name": "Getting started" },
        "getMod": { "__typename": "Mod", "id": "mod1", "name": "Pak Utility Mod" },
        "getVersion": { "__typename": "Version", "id": "version1", "version": "1.0.0" },
        "getSMLVersion": { "__typename": "SMLVersion", "id": "sml1", "version": "3.0.0" }
    })
}

/// Stands in for the API: answers `Prime`, and every mutation with `mutation_data`.
struct Api {
    mutation_data: Value
}

#[async_trait]
impl Exchange for Api {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        _client: C
    ) -> ExchangeResult<Q::ResponseData> {
        let data = match operation.meta.operation_type {
            OperationType::Query => prime_data(),
            _ => self.mutation_data.clone()
        };
        Ok(OperationResult {
            key: operation.key,
            meta: operation.meta,
            response: Response {
                debug_info: Some(DebugInfo::network()),
                data: Some(serde_json::from_value(data)?),
                errors: None
            }
        })
    }
}

#[derive(Clone)]
struct NoWatchers;

impl Client for NoWatchers {
    fn rerun_query(&self, _query_key: u64) {}
}

fn make_op<Q: GraphQLQuery>(variables: Q::Variables) -> Operation<Q::Variables> {
    let (query, meta) = Q::build_query(variables);
    Operation {
        key: progressive_hash(meta.query_key, &query.variables),
        query,
        meta,
        options: OperationOptions {
            url: "http://0.0.0.0/v2/query".to_string(),
            fetch_options: None,
            request_policy: RequestPolicy::NetworkOnly
        }
    }
}

/// Run `Q` against a primed cache and return the primed entities that are gone afterwards.
async fn evicted_by<Q: GraphQLQuery>(variables: Q::Variables, mutation_data: Value) -> Vec<String> {
    let exchange = NormalizedCacheExchange::with_options(cache_options(None)).build(Api {
        mutation_data
    });

    exchange.run::<Prime, _>(make_op::<Prime>(()), NoWatchers).await.unwrap();
    for (typename, id) in PRIMED.iter() {
        assert!(
            exchange.store().resolve(&Entity::new(typename, id), "id", None).is_some(),
            "{}:{} was not cached",
            typename,
            id
        );
    }

    let result = exchange.run::<Q, _>(make_op::<Q>(variables), NoWatchers).await.unwrap();
    assert!(!result.response.has_errors());

    PRIMED
        .iter()
        .filter(|(typename, id)| {
            exchange
                .store()
                .resolve(&Entity::new(typename, id), "id", None)
                .is_none()
        })
        .map(|(typename, id)| format!("{}:{}", typename, id))
        .collect()
}

fn id(id: &str) -> String {
    id.to_string()
}

#[tokio::test]
async fn every_site_mutation_evicts_only_its_entity() {
    let cases = vec![
        (
            "DeleteGuide",
            evicted_by::<DeleteGuide>(
                delete_guide::Variables { id: id("guide1") },
                json!({ "deleteGuide": true })
            )
            .await,
            "Guide:guide1"
        ),
        (
            "DeleteMod",
            evicted_by::<DeleteMod>(
                delete_mod::Variables { id: id("mod1") },
                json!({ "deleteMod": true })
            )
            .await,
            "Mod:mod1"
        ),
        (
            "ApproveMod",
            evicted_by::<ApproveMod>(
                approve_mod::Variables { id: id("mod1") },
                json!({ "approveMod": true })
            )
            .await,
            "Mod:mod1"
        ),
        (
            "DenyMod",
            evicted_by::<DenyMod>(deny_mod::Variables { id: id("mod1") }, json!({ "denyMod": true }))
                .await,
            "Mod:mod1"
        ),
        (
            "ApproveVersion",
            evicted_by::<ApproveVersion>(
                approve_version::Variables { id: id("version1") },
                json!({ "approveVersion": true })
            )
            .await,
            "Version:version1"
        ),
        (
            "DenyVersion",
            evicted_by::<DenyVersion>(
                deny_version::Variables { id: id("version1") },
                json!({ "denyVersion": true })
            )
            .await,
            "Version:version1"
        ),
        (
            "DeleteSMLVersion",
            evicted_by::<DeleteSMLVersion>(
                delete_sml_version::Variables { id: id("sml1") },
                json!({ "deleteSMLVersion": true })
            )
            .await,
            "SMLVersion:sml1"
        ),
        (
            "DeleteVersion",
            evicted_by::<DeleteVersion>(
                delete_version::Variables { id: id("version1") },
                json!({ "deleteVersion": true })
            )
            .await,
            "Version:version1"
        ),
        (
            "UpdateVersion",
            evicted_by::<UpdateVersion>(
                update_version::Variables {
                    version_id: id("version1"),
                    version: update_version::UpdateVersionInput {
                        changelog: Some("Fixed crash on load".to_string()),
                        ..Default::default()
                    }
                },
                json!({ "updateVersion": { "__typename": "Version", "id": "version1" } })
            )
            .await,
            "Version:version1"
        ),
    ];

    for (mutation, evicted, expected) in cases {
        assert_eq!(evicted, vec![expected.to_string()], "{} evicted the wrong entities", mutation);
    }
}

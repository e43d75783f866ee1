use crate::{
    exchange::{Client, Exchange, ExchangeFactory, ExchangeResult, Operation},
    GraphQLQuery
};
use serde::Serialize;
use tracing::trace;

/// Supplies auth state to the [`AuthExchange`](./struct.AuthExchange.html) and decides how it
/// is attached to operations.
#[async_trait]
pub trait AuthConfig: Send + Sync + 'static {
    type AuthState: Send + Sync + 'static;

    /// Look up the current auth state. Called once before every operation.
    async fn get_auth(&self) -> Option<Self::AuthState>;

    /// Return the operation to send downstream, given the state `get_auth` produced.
    fn add_auth_to_operation<V>(
        &self,
        auth_state: Option<&Self::AuthState>,
        operation: Operation<V>
    ) -> Operation<V>
    where
        V: Serialize + Clone + Send + Sync;
}

/// Attaches auth state to every operation before passing it on.
///
/// There is no refresh logic: whatever `get_auth` returns is used as is.
pub struct AuthExchange<A: AuthConfig> {
    config: A
}

impl<A: AuthConfig> AuthExchange<A> {
    pub fn new(config: A) -> Self {
        Self { config }
    }
}

impl<A: AuthConfig, TNext: Exchange> ExchangeFactory<TNext> for AuthExchange<A> {
    type Output = AuthExchangeImpl<A, TNext>;

    fn build(self, next: TNext) -> Self::Output {
        AuthExchangeImpl {
            config: self.config,
            next
        }
    }
}

pub struct AuthExchangeImpl<A: AuthConfig, TNext: Exchange> {
    config: A,
    next: TNext
}

impl<A: AuthConfig, TNext: Exchange> AuthExchangeImpl<A, TNext> {
    pub fn config(&self) -> &A {
        &self.config
    }
}

#[async_trait]
impl<A: AuthConfig, TNext: Exchange> Exchange for AuthExchangeImpl<A, TNext> {
    async fn run<Q: GraphQLQuery, C: Client>(
        &self,
        operation: Operation<Q::Variables>,
        client: C
    ) -> ExchangeResult<Q::ResponseData> {
        let auth_state = self.config.get_auth().await;
        trace!(
            key = operation.key,
            authenticated = auth_state.is_some(),
            "attaching auth state"
        );
        let operation = self
            .config
            .add_auth_to_operation(auth_state.as_ref(), operation);
        self.next.run::<Q, _>(operation, client).await
    }

    fn teardown(&self, query_key: u64) {
        self.next.teardown(query_key);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        exchange::{OperationMeta, OperationOptions, OperationResult},
        FetchOptions, OperationType, QueryBody, RequestPolicy, Response
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct StaticToken(Option<String>);

    #[async_trait]
    impl AuthConfig for StaticToken {
        type AuthState = String;

        async fn get_auth(&self) -> Option<String> {
            self.0.clone()
        }

        fn add_auth_to_operation<V>(&self, auth_state: Option<&String>, operation: Operation<V>) -> Operation<V>
        where
            V: Serialize + Clone + Send + Sync
        {
            match auth_state {
                Some(token) => {
                    let options = operation
                        .resolved_fetch_options()
                        .with_header("Authorization", token.as_str());
                    operation.with_fetch_options(options)
                }
                None => operation
            }
        }
    }

    #[derive(Clone)]
    struct NoopClient;
    impl Client for NoopClient {
        fn rerun_query(&self, _query_key: u64) {}
    }

    struct Capture(Arc<Mutex<Option<FetchOptions>>>);

    #[async_trait]
    impl Exchange for Capture {
        async fn run<Q: GraphQLQuery, C: Client>(
            &self,
            operation: Operation<Q::Variables>,
            _client: C
        ) -> ExchangeResult<Q::ResponseData> {
            *self.0.lock() = operation.options.fetch_options.as_ref().map(|o| o.resolve());
            Ok(OperationResult {
                key: operation.key,
                meta: operation.meta,
                response: Response {
                    debug_info: None,
                    data: None,
                    errors: None
                }
            })
        }
    }

    struct Ping;
    impl GraphQLQuery for Ping {
        type Variables = ();
        type ResponseData = serde_json::Value;

        const QUERY: &'static str = "query Ping { ping }";
        const OPERATION_NAME: &'static str = "Ping";
        const OPERATION_TYPE: OperationType = OperationType::Query;
    }

    fn operation() -> Operation<()> {
        let (query, meta): (QueryBody<()>, OperationMeta) = Ping::build_query(());
        Operation {
            key: 1,
            meta,
            query,
            options: OperationOptions {
                url: "http://localhost/graphql".to_string(),
                fetch_options: None,
                request_policy: RequestPolicy::NetworkOnly
            }
        }
    }

    #[tokio::test]
    async fn forwards_transformed_operation() {
        let seen = Arc::new(Mutex::new(None));
        let exchange =
            AuthExchange::new(StaticToken(Some("abc".to_string()))).build(Capture(seen.clone()));

        exchange.run::<Ping, _>(operation(), NoopClient).await.unwrap();

        let seen = seen.lock().clone().expect("fetch options were not set");
        assert_eq!(seen.header("Authorization"), Some("abc"));
    }

    #[tokio::test]
    async fn passes_through_without_auth_state() {
        let seen = Arc::new(Mutex::new(None));
        let exchange = AuthExchange::new(StaticToken(None)).build(Capture(seen.clone()));

        exchange.run::<Ping, _>(operation(), NoopClient).await.unwrap();

        assert!(seen.lock().is_none());
    }
}

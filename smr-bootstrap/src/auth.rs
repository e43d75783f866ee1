use crate::user::UserToken;
use serde::Serialize;
use smr_graphql::{default_exchanges::AuthConfig, exchange::Operation};
use tracing::trace;

pub const AUTHORIZATION: &str = "Authorization";

/// What the auth exchange learns about the user before each operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SmrAuthState {
    pub token: Option<String>
}

/// Attaches the signed in user's token to every operation.
pub struct SmrAuth {
    token: UserToken
}

impl SmrAuth {
    pub fn new(token: UserToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthConfig for SmrAuth {
    type AuthState = SmrAuthState;

    async fn get_auth(&self) -> Option<SmrAuthState> {
        Some(SmrAuthState {
            token: self.token.current()
        })
    }

    fn add_auth_to_operation<V>(
        &self,
        auth_state: Option<&SmrAuthState>,
        operation: Operation<V>
    ) -> Operation<V>
    where
        V: Serialize + Clone + Send + Sync
    {
        let token = auth_state
            .and_then(|state| state.token.as_deref())
            .filter(|token| !token.is_empty());
        let token = match token {
            Some(token) => token,
            None => return operation
        };

        trace!(key = operation.key, "adding authorization header");
        let fetch_options = operation
            .resolved_fetch_options()
            .with_header(AUTHORIZATION, token);
        operation.with_fetch_options(fetch_options)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smr_graphql::{
        exchange::{OperationMeta, OperationOptions},
        FetchMethod, FetchOptions, FetchOptionsInit, OperationType, QueryBody, RequestPolicy
    };
    use std::time::Duration;

    fn operation(fetch_options: Option<FetchOptionsInit>) -> Operation<()> {
        Operation {
            key: 42,
            meta: OperationMeta {
                query_key: 1,
                operation_type: OperationType::Query,
                operation_name: "GetMe"
            },
            query: QueryBody {
                variables: (),
                query: "query GetMe { getMe { id } }",
                operation_name: "GetMe"
            },
            options: OperationOptions {
                url: "https://api.ficsit.app/v2/query".to_string(),
                fetch_options,
                request_policy: RequestPolicy::CacheFirst
            }
        }
    }

    fn auth_with(token: Option<&str>) -> SmrAuth {
        let store = UserToken::new();
        store.set(token.map(String::from));
        SmrAuth::new(store)
    }

    #[tokio::test]
    async fn get_auth_reads_the_current_token() {
        let store = UserToken::new();
        let auth = SmrAuth::new(store.clone());

        assert_eq!(auth.get_auth().await, Some(SmrAuthState { token: None }));

        store.set(Some("abc".to_string()));
        assert_eq!(
            auth.get_auth().await,
            Some(SmrAuthState {
                token: Some("abc".to_string())
            })
        );
    }

    #[tokio::test]
    async fn no_token_leaves_the_operation_alone() {
        let auth = auth_with(None);
        let state = auth.get_auth().await;

        let result = auth.add_auth_to_operation(state.as_ref(), operation(None));
        assert_eq!(result.key, 42);
        assert!(result.options.fetch_options.is_none());

        let result = auth.add_auth_to_operation(None, operation(None));
        assert!(result.options.fetch_options.is_none());
    }

    #[test]
    fn empty_tokens_are_ignored() {
        let auth = auth_with(Some(""));
        let state = SmrAuthState {
            token: Some(String::new())
        };

        let result = auth.add_auth_to_operation(Some(&state), operation(None));

        assert!(result.options.fetch_options.is_none());
    }

    #[test]
    fn token_is_added_and_other_options_kept() {
        let auth = auth_with(None);
        let state = SmrAuthState {
            token: Some("secret".to_string())
        };
        let existing = FetchOptions::new()
            .with_header("X-Requested-With", "smr")
            .with_method(FetchMethod::Post)
            .with_timeout(Duration::from_secs(5));

        let result = auth.add_auth_to_operation(Some(&state), operation(Some(existing.into())));
        let options = result.resolved_fetch_options();

        assert_eq!(options.header("Authorization"), Some("secret"));
        assert_eq!(options.header("X-Requested-With"), Some("smr"));
        assert_eq!(options.method, Some(FetchMethod::Post));
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.headers.len(), 2);
    }

    #[test]
    fn factories_are_resolved_and_existing_tokens_replaced() {
        let auth = auth_with(None);
        let state = SmrAuthState {
            token: Some("new".to_string())
        };
        let factory = FetchOptionsInit::factory(|| {
            FetchOptions::new()
                .with_header("authorization", "old")
                .with_header("Accept-Language", "en")
        });

        let result = auth.add_auth_to_operation(Some(&state), operation(Some(factory)));
        let options = result.resolved_fetch_options();

        assert_eq!(options.header("Authorization"), Some("new"));
        assert_eq!(options.header("accept-language"), Some("en"));
        assert_eq!(options.headers.len(), 2);
    }
}

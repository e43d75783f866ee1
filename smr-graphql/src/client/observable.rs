use crate::{
    client::ClientImpl, exchange::Exchange, GraphQLQuery, QueryError, QueryOptions, Response
};
use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    Stream
};
use stable_vec::StableVec;
use std::{
    any::Any,
    future::Future,
    marker::PhantomData,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll}
};
use tracing::{debug, warn};

type AnyResult = Arc<dyn Any + Send + Sync>;

pub type OperationObservable<Q, M> =
    Observable<Result<Response<<Q as GraphQLQuery>::ResponseData>, QueryError>, M>;

pub(crate) struct Watcher {
    pub(crate) listeners: StableVec<UnboundedSender<AnyResult>>,
    // This captures the type and variables of the query without requiring generics, so we can store it in a hashmap
    pub(crate) rerun: Arc<dyn Fn() -> Pin<Box<dyn Future<Output = AnyResult> + Send>> + Send + Sync>
}

/// A stream of results for a watched query. Dropping it stops the watch.
pub struct Observable<T, M: Exchange> {
    inner: UnboundedReceiver<AnyResult>,
    client: Arc<ClientImpl<M>>,
    key: u64,
    index: usize,
    t: PhantomData<fn() -> T>
}

impl<T: Clone, M: Exchange> Observable<T, M> {
    pub(crate) fn new(
        key: u64,
        inner: UnboundedReceiver<AnyResult>,
        client: Arc<ClientImpl<M>>,
        index: usize
    ) -> Self {
        Observable {
            inner,
            client,
            key,
            index,
            t: PhantomData
        }
    }
}

impl<T, M: Exchange> Stream for Observable<T, M>
where
    T: 'static + Clone
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let inner = &mut self.get_mut().inner;
        loop {
            match Pin::new(&mut *inner).poll_next(cx) {
                Poll::Ready(Some(boxed)) => {
                    if let Some(cast) = boxed.downcast_ref::<T>() {
                        return Poll::Ready(Some(cast.clone()));
                    }
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending
            }
        }
    }
}

impl<T, M: Exchange> Drop for Observable<T, M> {
    fn drop(&mut self) {
        self.client.clear_observable(self.key, self.index)
    }
}

pub(crate) async fn watch_with_options<Q: GraphQLQuery, M: Exchange>(
    client: &Arc<ClientImpl<M>>,
    variables: Q::Variables,
    options: QueryOptions
) -> OperationObservable<Q, M> {
    let (query, meta) = Q::build_query(variables);
    let operation = client.create_request_operation::<Q>(query, meta, options);
    let key = operation.key;
    let (sender, receiver) = mpsc::unbounded();

    let index = {
        let mut watchers = client.active_watchers.lock();
        if let Some(watcher) = watchers.get_mut(&key) {
            watcher.listeners.push(sender.clone())
        } else {
            let rerun_client = client.clone();
            let operation = operation.clone();
            let watcher = Watcher {
                listeners: vec![sender.clone()].into(),
                rerun: Arc::new(move || {
                    let client = rerun_client.clone();
                    let operation = operation.clone();

                    Box::pin(async move {
                        let res = client.execute_request_operation::<Q>(operation).await;
                        let res_boxed: AnyResult = Arc::new(res);
                        res_boxed
                    })
                })
            };
            watchers.insert(key, watcher);
            0
        }
    };

    let res = client.execute_request_operation::<Q>(operation).await;
    let res_boxed: AnyResult = Arc::new(res);
    if sender.unbounded_send(res_boxed).is_err() {
        debug!(key, "watcher dropped before the first result arrived");
    }
    Observable::new(key, receiver, client.clone(), index)
}

pub(crate) fn rerun_query<M: Exchange>(client: &Arc<ClientImpl<M>>, key: u64) {
    let rerun = {
        let watchers = client.active_watchers.lock();
        watchers.get(&key).map(|watcher| watcher.rerun.clone())
    };
    let rerun = match rerun {
        Some(rerun) => rerun,
        None => return
    };

    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!(key, "cannot rerun query outside of a tokio runtime");
            return;
        }
    };

    let client = client.clone();
    handle.spawn(async move {
        debug!(key, "rerunning watched query");
        let value = rerun().await;

        let watchers = client.active_watchers.lock();
        if let Some(watcher) = watchers.get(&key) {
            for listener in watcher.listeners.values() {
                // A closed listener is removed when its observable drops.
                let _ = listener.unbounded_send(value.clone());
            }
        }
    });
}

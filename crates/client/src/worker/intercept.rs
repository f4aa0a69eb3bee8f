//! The fetch-intercept boundary.

use super::router::{Classification, Route};
use super::strategy::WorkerResponse;
use super::ServiceWorker;
use crate::fetch::FetchRequest;
use shellcache_core::Error;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// What the worker does with an intercepted request.
#[derive(Debug)]
pub enum Interception {
    /// The worker declines; the caller performs the request itself.
    PassThrough(FetchRequest),
    /// The worker answers; await the pending response.
    Respond(PendingResponse),
}

/// A response being produced by a strategy on its own task.
///
/// Dropping it does not cancel the task, so a cache write already under
/// way still completes.
#[derive(Debug)]
pub struct PendingResponse {
    handle: JoinHandle<WorkerResponse>,
    classification: Classification,
    fallback: &'static str,
}

impl PendingResponse {
    pub fn classification(&self) -> Classification {
        self.classification
    }
}

impl Future for PendingResponse {
    type Output = WorkerResponse;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(response)) => Poll::Ready(response),
            Poll::Ready(Err(e)) => {
                tracing::error!("strategy task failed: {e}");
                Poll::Ready(WorkerResponse::offline(self.fallback))
            }
        }
    }
}

impl ServiceWorker {
    /// Decide whether to answer `request` and, if so, start answering it.
    ///
    /// Requests pass through when no generation is active, when they come
    /// from an instance that is not yet controlled, or when the router
    /// declines them (non-GET or cross-origin).
    pub async fn intercept(&self, request: FetchRequest) -> Interception {
        let generation = {
            let state = self.inner.state.read().await;
            let Some(active) = state.active.as_ref() else {
                return Interception::PassThrough(request);
            };
            if let Some(client) = request.client_id.as_deref()
                && matches!(state.clients.controller(client), Some(None))
            {
                tracing::debug!(client, "uncontrolled client, passing through {}", request.url);
                return Interception::PassThrough(request);
            }
            active.name.clone()
        };

        let classification = match self.inner.router.route(&request) {
            Route::Handle(classification) => classification,
            Route::PassThrough(reason) => {
                tracing::debug!(?reason, "passing through {} {}", request.method, request.url);
                return Interception::PassThrough(request);
            }
        };

        let store = self.inner.db.store(&generation);
        let fallback = self.inner.strategy(classification).offline_message();
        let worker = self.clone();
        let handle = tokio::spawn(async move {
            worker
                .inner
                .strategy(classification)
                .resolve(&store, &request)
                .await
        });

        Interception::Respond(PendingResponse { handle, classification, fallback })
    }

    /// Intercept and wait for the answer; pass-through requests go straight
    /// to the network without touching any store.
    ///
    /// # Errors
    ///
    /// Only pass-through requests can fail, with `Error::Network`.
    pub async fn fetch(&self, request: FetchRequest) -> Result<WorkerResponse, Error> {
        match self.intercept(request).await {
            Interception::Respond(pending) => Ok(pending.await),
            Interception::PassThrough(request) => {
                let snapshot = self.inner.network.fetch(&request).await?;
                Ok(WorkerResponse::network(snapshot))
            }
        }
    }
}

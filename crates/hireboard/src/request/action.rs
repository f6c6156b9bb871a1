use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::state::{ActionError, RequestState};
use crate::session::{AccessToken, AuthProvider};

/// One backend call shape: `(token, static params, call-time args) -> output`.
#[async_trait]
pub trait BackendOperation: Send + Sync + 'static {
    /// Bound once when the call site is created.
    type Params: Send + Sync + 'static;
    /// Supplied on every trigger.
    type Args: Send + 'static;
    type Output: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        token: Option<AccessToken>,
        params: &Self::Params,
        args: Self::Args,
    ) -> Result<Self::Output, ActionError>;
}

/// How settlements of overlapping dispatches are applied to the shared state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// Every settlement is applied in completion order; the last one to finish wins.
    #[default]
    LastSettledWins,
    /// Only the most recently dispatched invocation may touch the state. Earlier
    /// dispatches still return their outcome to the caller.
    LatestDispatchOnly,
}

/// Cloneable call-site binding around a [`BackendOperation`].
pub struct AsyncAction<O: BackendOperation> {
    inner: Arc<Binding<O>>,
}

struct Binding<O: BackendOperation> {
    operation: O,
    params: O::Params,
    auth: Arc<dyn AuthProvider>,
    policy: SettlementPolicy,
    state: watch::Sender<RequestState<O::Output>>,
    dispatched: AtomicU64,
    disposed: AtomicBool,
}

impl<O: BackendOperation> Clone for AsyncAction<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: BackendOperation> fmt::Debug for AsyncAction<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAction")
            .field("operation", &self.inner.operation.name())
            .field("policy", &self.inner.policy)
            .field("dispatched", &self.inner.dispatched.load(Ordering::Relaxed))
            .finish()
    }
}

impl<O: BackendOperation> AsyncAction<O> {
    pub fn new(operation: O, params: O::Params, auth: Arc<dyn AuthProvider>) -> Self {
        Self::with_policy(operation, params, auth, SettlementPolicy::default())
    }

    pub fn with_policy(
        operation: O,
        params: O::Params,
        auth: Arc<dyn AuthProvider>,
        policy: SettlementPolicy,
    ) -> Self {
        let (state, _) = watch::channel(RequestState::default());
        Self {
            inner: Arc::new(Binding {
                operation,
                params,
                auth,
                policy,
                state,
                dispatched: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Starts an invocation. `loading` is raised before this returns; the returned
    /// future performs the token lookup and the backend call, applies the settlement,
    /// and resolves to the result (or `None` on failure). Dropping the future before it
    /// settles still lowers `loading`.
    pub fn trigger(&self, args: O::Args) -> Pending<O::Output> {
        let ticket = self.inner.begin();
        let mut in_flight = InFlight {
            binding: Arc::clone(&self.inner),
            ticket,
            settled: false,
        };
        Pending {
            future: Box::pin(async move {
                let outcome = in_flight.binding.run(in_flight.ticket, args).await;
                in_flight.settled = true;
                outcome
            }),
        }
    }

    pub fn snapshot(&self) -> RequestState<O::Output> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<O::Output>> {
        self.inner.state.subscribe()
    }

    pub fn policy(&self) -> SettlementPolicy {
        self.inner.policy
    }

    pub fn params(&self) -> &O::Params {
        &self.inner.params
    }

    /// Detaches the binding: in-flight and future settlements no longer mutate state.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl<O: BackendOperation> Binding<O> {
    fn begin(&self) -> u64 {
        let ticket = self.dispatched.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.disposed.load(Ordering::Acquire) {
            self.state.send_modify(|state| state.loading = true);
        }
        debug!(operation = self.operation.name(), ticket, "dispatching");
        ticket
    }

    async fn run(&self, ticket: u64, args: O::Args) -> Option<O::Output> {
        let token = self.auth.session_token().await;
        let outcome = self.operation.execute(token, &self.params, args).await;
        self.settle(ticket, &outcome);
        outcome.ok()
    }

    /// Whether a settlement for `ticket` may touch the state under the current policy.
    fn accepts(&self, ticket: u64) -> bool {
        let operation = self.operation.name();

        if self.disposed.load(Ordering::Acquire) {
            warn!(operation, ticket, "settlement ignored after dispose");
            return false;
        }

        if self.policy == SettlementPolicy::LatestDispatchOnly {
            let latest = self.dispatched.load(Ordering::Acquire);
            if ticket != latest {
                warn!(operation, ticket, latest, "stale settlement discarded");
                return false;
            }
        }

        true
    }

    /// Invocation dropped before settling: lower `loading`, leave data and error alone.
    fn abandon(&self, ticket: u64) {
        if !self.accepts(ticket) {
            return;
        }
        warn!(operation = self.operation.name(), ticket, "invocation dropped before settling");
        self.state.send_if_modified(|state| {
            let was_loading = state.loading;
            state.loading = false;
            was_loading
        });
    }

    fn settle(&self, ticket: u64, outcome: &Result<O::Output, ActionError>) {
        let operation = self.operation.name();

        if !self.accepts(ticket) {
            return;
        }

        if let Err(error) = outcome {
            warn!(
                operation,
                ticket,
                kind = error.kind.label(),
                detail = %error.message,
                "request failed"
            );
        }

        self.state.send_modify(|state| {
            match outcome {
                Ok(value) => {
                    state.data = Some(value.clone());
                    state.error = None;
                }
                Err(error) => state.error = Some(error.clone()),
            }
            state.loading = false;
        });
    }
}

/// Owned by the pending future; clears `loading` if the future is dropped unsettled.
struct InFlight<O: BackendOperation> {
    binding: Arc<Binding<O>>,
    ticket: u64,
    settled: bool,
}

impl<O: BackendOperation> Drop for InFlight<O> {
    fn drop(&mut self) {
        if !self.settled {
            self.binding.abandon(self.ticket);
        }
    }
}

/// In-flight invocation returned by [`AsyncAction::trigger`].
#[must_use = "the backend call only runs when the pending invocation is awaited or spawned"]
pub struct Pending<T> {
    future: Pin<Box<dyn Future<Output = Option<T>> + Send + 'static>>,
}

impl<T> Future for Pending<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pending")
    }
}

//! Composition root for one line-item table instance.
//!
//! A host creates a panel per attached component, binds the parent record,
//! calls `start()` on attach and `stop()` on detach. A stopped panel is not
//! restarted; create a fresh one (which also re-resolves the role).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use lineitems_auth::{RoleFlag, RoleGate, RoleResolver};
use lineitems_core::ParentId;
use lineitems_sales::{ColumnDescriptor, DisplayRow, Labels, ListView, columns};

use crate::api::LineItemApi;
use crate::binding::ParentBinding;
use crate::config::ClientConfig;
use crate::dispatcher::{Navigator, RowActionDispatcher};
use crate::error::DispatchError;
use crate::query::{QueryResult, ReactiveQuery};
use crate::subscriber::{InvalidationChannel, InvalidationSubscriber, SubscriberState};

/// Collaborators supplied by the host.
#[derive(Clone)]
pub struct PanelDeps {
    pub api: Arc<dyn LineItemApi>,
    pub roles: Arc<dyn RoleResolver>,
    pub channel: Arc<InvalidationChannel>,
    pub navigator: Arc<dyn Navigator>,
}

pub struct LineItemsPanel {
    labels: Labels,
    binding: ParentBinding,
    query: Arc<ReactiveQuery>,
    gate: Arc<RoleGate>,
    subscriber: Arc<InvalidationSubscriber>,
    dispatcher: RowActionDispatcher,
    observer: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl LineItemsPanel {
    pub fn new(config: &ClientConfig, deps: PanelDeps) -> Self {
        let binding = ParentBinding::new(None);
        let query = Arc::new(ReactiveQuery::new(
            Arc::clone(&deps.api),
            binding.clone(),
            config.refresh_policy,
        ));
        let gate = Arc::new(RoleGate::new(deps.roles));
        let subscriber = Arc::new(InvalidationSubscriber::new(
            deps.channel,
            config.topic(),
            binding.clone(),
            Arc::clone(&query),
        ));
        let dispatcher = RowActionDispatcher::new(
            deps.api,
            Arc::clone(&query),
            Arc::clone(&gate),
            deps.navigator,
        );

        Self {
            labels: Labels::default(),
            binding,
            query,
            gate,
            subscriber,
            dispatcher,
            observer: Mutex::new(None),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Bind the parent record. After `start()`, a change re-fetches.
    pub fn bind_parent(&self, parent_id: ParentId) -> bool {
        self.binding.set(parent_id)
    }

    /// Attach: resolve the role, subscribe to invalidations and run the
    /// initial fetch concurrently, then follow parent-id changes.
    ///
    /// Only the first call on a panel does anything.
    pub async fn start(&self) {
        if self.stopped.load(Ordering::SeqCst) || self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("panel already started or stopped; ignoring start()");
            return;
        }

        let observer = {
            let query = Arc::clone(&self.query);
            self.binding.spawn_observer(move |parent_id| {
                let query = Arc::clone(&query);
                async move {
                    tracing::debug!(?parent_id, "parent binding changed; refreshing");
                    query.refresh().await;
                }
            })
        };
        *self.observer.lock().unwrap_or_else(PoisonError::into_inner) = Some(observer);

        let (flag, state, ()) = tokio::join!(
            self.gate.resolve(),
            self.subscriber.start(),
            self.query.refresh(),
        );
        tracing::info!(%flag, ?state, parent_id = ?self.binding.current(), "line-item panel started");
    }

    /// Detach: stop following the binding, discard any fetch still in flight
    /// and release the invalidation subscription.
    ///
    /// If the subscribe issued by `start()` has not completed yet, this
    /// returns with the subscriber `Unsubscribing`; it converges to
    /// `Unsubscribed` once that subscribe resolves and its handle is released.
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let observer = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(observer) = observer {
            observer.abort();
        }

        self.query.detach();
        self.subscriber.stop().await;
        tracing::info!("line-item panel stopped");
    }

    /// Re-fetch on demand.
    pub async fn refresh(&self) {
        self.query.refresh().await;
    }

    /// Handle a row-action event from the rendering collaborator.
    pub async fn dispatch(&self, action: &str, row: &DisplayRow) -> Result<(), DispatchError> {
        self.dispatcher.dispatch(action, row).await
    }

    /// Current rows and flags for rendering.
    pub fn view(&self) -> ListView {
        match self.query.current() {
            QueryResult::Loading => ListView::loading(),
            QueryResult::Success(items) => ListView::from_items(&items, self.role()),
            QueryResult::Failure(err) => ListView::failed(err.to_string()),
        }
    }

    /// Notice above the table (no products / stock warning), if any.
    pub fn message(&self) -> Option<String> {
        self.view().message(&self.labels).map(str::to_string)
    }

    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        columns(&self.labels, self.role())
    }

    pub fn role(&self) -> RoleFlag {
        self.gate.flag()
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn binding(&self) -> &ParentBinding {
        &self.binding
    }

    pub fn query(&self) -> &Arc<ReactiveQuery> {
        &self.query
    }

    pub fn subscriber_state(&self) -> SubscriberState {
        self.subscriber.state()
    }

    pub fn refreshes_triggered(&self) -> u64 {
        self.subscriber.refreshes_triggered()
    }
}

impl core::fmt::Debug for LineItemsPanel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineItemsPanel")
            .field("query", &self.query)
            .field("gate", &self.gate)
            .field("subscriber", &self.subscriber)
            .field("stopped", &self.stopped.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

//! Fakes shared by the unit tests of this crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use lineitems_auth::{RoleResolutionError, RoleResolver};
use lineitems_core::{LineItemId, ParentId, ProductId};
use lineitems_events::{
    ChannelError, ChannelMessage, ErrorListener, InMemoryPushChannel, LineItemUpdate, PushChannel,
    ReplayPosition, Subscription, SubscriptionHandle, Topic,
};
use lineitems_sales::{LineItem, Product};

use crate::api::LineItemApi;
use crate::dispatcher::{NavigationRequest, Navigator};
use crate::error::RemoteError;

pub(crate) fn parent(id: &str) -> ParentId {
    ParentId::new(id).unwrap()
}

pub(crate) fn line_item(id: &str, quantity: i64, stock: i64) -> LineItem {
    LineItem {
        id: LineItemId::new(id).unwrap(),
        quantity,
        unit_price: 1000,
        total_price: 1000 * quantity.max(0) as u64,
        product: Product {
            id: ProductId::new(format!("P-{id}")).unwrap(),
            name: format!("Product {id}"),
            quantity_in_stock: stock,
        },
    }
}

/// Poll `condition` until it holds, or panic after ~500ms.
pub(crate) async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..50 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition did not become true within timeout");
}

/// In-memory remote store: fetch returns what is stored, delete removes.
#[derive(Default)]
pub(crate) struct StubApi {
    items: Mutex<Vec<LineItem>>,
    fetch_error: Mutex<Option<RemoteError>>,
    delete_error: Mutex<Option<RemoteError>>,
    role: Mutex<Option<Result<bool, RoleResolutionError>>>,
    fetches: AtomicUsize,
    deletes: AtomicUsize,
    role_checks: AtomicUsize,
}

impl StubApi {
    pub(crate) fn with_items(items: Vec<LineItem>) -> Arc<Self> {
        let api = Self::default();
        *api.items.lock().unwrap() = items;
        Arc::new(api)
    }

    pub(crate) fn fail_fetch(&self, err: RemoteError) {
        *self.fetch_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn fail_delete(&self, err: RemoteError) {
        *self.delete_error.lock().unwrap() = Some(err);
    }

    pub(crate) fn set_role(&self, answer: Result<bool, RoleResolutionError>) {
        *self.role.lock().unwrap() = Some(answer);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub(crate) fn role_check_count(&self) -> usize {
        self.role_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LineItemApi for StubApi {
    async fn fetch_line_items(&self, _parent_id: &ParentId) -> Result<Vec<LineItem>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn delete_line_item(&self, line_item_id: &LineItemId) -> Result<(), RemoteError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| &item.id != line_item_id);
        if items.len() == before {
            return Err(RemoteError::NotFound(line_item_id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleResolver for StubApi {
    async fn check_elevated_role(&self) -> Result<bool, RoleResolutionError> {
        self.role_checks.fetch_add(1, Ordering::SeqCst);
        self.role.lock().unwrap().clone().unwrap_or(Ok(false))
    }
}

/// Remote store whose n-th fetch blocks until `open(n)` is called.
pub(crate) struct GatedApi {
    responses: Vec<Result<Vec<LineItem>, RemoteError>>,
    gates: Vec<Notify>,
    calls: AtomicUsize,
}

impl GatedApi {
    pub(crate) fn new(responses: Vec<Result<Vec<LineItem>, RemoteError>>) -> Arc<Self> {
        let gates = responses.iter().map(|_| Notify::new()).collect();
        Arc::new(Self {
            responses,
            gates,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn open(&self, call: usize) {
        self.gates[call].notify_one();
    }
}

#[async_trait]
impl LineItemApi for GatedApi {
    async fn fetch_line_items(&self, _parent_id: &ParentId) -> Result<Vec<LineItem>, RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.gates[call].notified().await;
        self.responses[call].clone()
    }

    async fn delete_line_item(&self, _line_item_id: &LineItemId) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// In-memory channel with switchable subscribe/unsubscribe failures and an
/// optional gate on subscribe.
#[derive(Default)]
pub(crate) struct ScriptedChannel {
    pub(crate) inner: InMemoryPushChannel<LineItemUpdate>,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    subscribe_gate: Mutex<Option<Arc<Notify>>>,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    listeners: AtomicUsize,
}

impl ScriptedChannel {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_unsubscribe(&self, fail: bool) {
        self.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    /// Hold every later subscribe call until the returned gate is notified.
    pub(crate) fn hold_subscribe(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.subscribe_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    pub(crate) fn publish(&self, topic: &Topic, parent_id: &str) {
        self.inner
            .publish(topic, LineItemUpdate::new(parent(parent_id)))
            .unwrap();
    }
}

#[async_trait]
impl PushChannel<ChannelMessage<LineItemUpdate>> for ScriptedChannel {
    async fn subscribe(
        &self,
        topic: &Topic,
        replay: ReplayPosition,
    ) -> Result<Subscription<ChannelMessage<LineItemUpdate>>, ChannelError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.subscribe_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ChannelError::Subscribe {
                topic: topic.clone(),
                reason: "handshake rejected".to_string(),
            });
        }
        self.inner.subscribe(topic, replay).await
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), ChannelError> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(ChannelError::Unsubscribe {
                handle: handle.clone(),
                reason: "server went away".to_string(),
            });
        }
        self.inner.unsubscribe(handle).await
    }

    fn on_error(&self, listener: ErrorListener) {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        self.inner.on_error(listener);
    }
}

/// Navigator that records every request.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub(crate) requests: Mutex<Vec<NavigationRequest>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, request: NavigationRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

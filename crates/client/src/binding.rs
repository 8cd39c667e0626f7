//! Reactive parent-id parameter.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use lineitems_core::ParentId;

/// The parent record the table is bound to.
///
/// Cloning shares the same binding. Observers are only woken when the value
/// actually changes; re-binding the current id is a no-op.
#[derive(Debug, Clone)]
pub struct ParentBinding {
    tx: Arc<watch::Sender<Option<ParentId>>>,
}

impl ParentBinding {
    pub fn new(initial: Option<ParentId>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<ParentId> {
        self.tx.borrow().clone()
    }

    /// Bind to `parent_id`. Returns whether the binding changed.
    pub fn set(&self, parent_id: ParentId) -> bool {
        self.tx.send_if_modified(|current| {
            if current.as_ref() == Some(&parent_id) {
                false
            } else {
                *current = Some(parent_id);
                true
            }
        })
    }

    /// Unbind. Returns whether the binding changed.
    pub fn clear(&self) -> bool {
        self.tx.send_if_modified(|current| current.take().is_some())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ParentId>> {
        self.tx.subscribe()
    }

    /// Spawn a task that runs `on_change` after every change of the binding.
    ///
    /// Changes made before the task is spawned are not reported. Bursts of
    /// changes may be observed as one (only the latest value is delivered).
    pub fn spawn_observer<F, Fut>(&self, mut on_change: F) -> JoinHandle<()>
    where
        F: FnMut(Option<ParentId>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let parent_id = rx.borrow_and_update().clone();
                on_change(parent_id).await;
            }
        })
    }
}

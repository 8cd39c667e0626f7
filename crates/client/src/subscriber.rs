//! Push-channel subscription lifecycle for line-item invalidations.
//!
//! State machine:
//!
//! ```text
//! Unsubscribed -> Subscribing -> Subscribed -> Unsubscribing -> Unsubscribed
//!                      |                                            ^
//!                      +------------- subscribe failed -------------+
//! ```
//!
//! Channel failures never escape this module: they are logged and leave the
//! query usable through initial and manual refreshes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tokio::sync::oneshot;

use lineitems_events::{
    ChannelMessage, LineItemUpdate, ParentScoped, PushChannel, ReplayPosition, Subscription,
    SubscriptionHandle, Topic,
};

use crate::binding::ParentBinding;
use crate::query::ReactiveQuery;

/// Channel carrying line-item invalidations.
pub type InvalidationChannel = dyn PushChannel<ChannelMessage<LineItemUpdate>>;

type Message = ChannelMessage<LineItemUpdate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberState {
    Unsubscribed,
    Subscribing,
    Subscribed,
    Unsubscribing,
}

struct Live {
    handle: SubscriptionHandle,
    shutdown: oneshot::Sender<()>,
}

struct Inner {
    state: SubscriberState,
    live: Option<Live>,
}

/// Subscribes to invalidations and refreshes the query for matching ones.
///
/// Owns at most one live subscription. Messages are pumped by a spawned task
/// that holds only a weak reference, so dropping the subscriber ends it.
pub struct InvalidationSubscriber {
    channel: Arc<InvalidationChannel>,
    topic: Topic,
    binding: ParentBinding,
    query: Arc<ReactiveQuery>,
    inner: Mutex<Inner>,
    listener_registered: AtomicBool,
    triggered: AtomicU64,
}

impl InvalidationSubscriber {
    pub fn new(
        channel: Arc<InvalidationChannel>,
        topic: Topic,
        binding: ParentBinding,
        query: Arc<ReactiveQuery>,
    ) -> Self {
        Self {
            channel,
            topic,
            binding,
            query,
            inner: Mutex::new(Inner {
                state: SubscriberState::Unsubscribed,
                live: None,
            }),
            listener_registered: AtomicBool::new(false),
            triggered: AtomicU64::new(0),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn state(&self) -> SubscriberState {
        self.lock().state
    }

    /// Handle of the live subscription; `Some` only while `Subscribed`.
    pub fn handle(&self) -> Option<SubscriptionHandle> {
        let inner = self.lock();
        match inner.state {
            SubscriberState::Subscribed => inner.live.as_ref().map(|live| live.handle.clone()),
            _ => None,
        }
    }

    /// Number of refreshes triggered by invalidation messages.
    pub fn refreshes_triggered(&self) -> u64 {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Subscribe for new messages only. Returns the resulting state.
    ///
    /// A no-op unless `Unsubscribed`. A failed subscribe is logged and not
    /// retried.
    pub async fn start(self: &Arc<Self>) -> SubscriberState {
        {
            let mut inner = self.lock();
            if inner.state != SubscriberState::Unsubscribed {
                tracing::warn!(topic = %self.topic, state = ?inner.state, "subscriber already started");
                return inner.state;
            }
            inner.state = SubscriberState::Subscribing;
        }

        self.register_error_listener();

        let subscription = match self
            .channel
            .subscribe(&self.topic, ReplayPosition::NewOnly)
            .await
        {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!(topic = %self.topic, error = %err, "subscribe failed; invalidations disabled");
                self.lock().state = SubscriberState::Unsubscribed;
                return SubscriberState::Unsubscribed;
            }
        };

        let handle = subscription.handle().clone();

        // stop() may have run while the subscribe call was pending.
        let stop_requested = {
            let mut inner = self.lock();
            if inner.state == SubscriberState::Unsubscribing {
                true
            } else {
                let (shutdown, shutdown_rx) = oneshot::channel();
                tokio::spawn(pump(Arc::downgrade(self), subscription, shutdown_rx));
                inner.live = Some(Live {
                    handle: handle.clone(),
                    shutdown,
                });
                inner.state = SubscriberState::Subscribed;
                false
            }
        };

        if stop_requested {
            self.release(&handle).await;
            self.lock().state = SubscriberState::Unsubscribed;
            return SubscriberState::Unsubscribed;
        }

        tracing::info!(topic = %self.topic, %handle, "subscribed to line-item invalidations");
        SubscriberState::Subscribed
    }

    /// Release the subscription. Always ends `Unsubscribed`, even when the
    /// channel rejects the unsubscribe.
    ///
    /// Called while a subscribe is still pending, this only marks the
    /// subscriber `Unsubscribing`; the pending `start()` releases the handle
    /// as soon as it arrives.
    pub async fn stop(&self) {
        let live = {
            let mut inner = self.lock();
            match inner.state {
                SubscriberState::Unsubscribed | SubscriberState::Unsubscribing => return,
                SubscriberState::Subscribing => {
                    inner.state = SubscriberState::Unsubscribing;
                    return;
                }
                SubscriberState::Subscribed => {
                    inner.state = SubscriberState::Unsubscribing;
                    inner.live.take()
                }
            }
        };

        if let Some(live) = live {
            // The pump may be mid-refresh; it finishes that one and exits.
            let _ = live.shutdown.send(());
            self.release(&live.handle).await;
        }

        self.lock().state = SubscriberState::Unsubscribed;
    }

    /// Filter one message against the bound parent and refresh on a match.
    ///
    /// Returns whether a refresh was triggered.
    pub async fn handle_message(&self, message: &Message) -> bool {
        if self.state() != SubscriberState::Subscribed {
            tracing::debug!(topic = %self.topic, "message arrived while not subscribed; ignoring");
            return false;
        }

        let Some(bound) = self.binding.current() else {
            tracing::debug!(topic = %self.topic, "no parent bound; ignoring invalidation");
            return false;
        };

        if !message.concerns(&bound) {
            tracing::debug!(
                parent_id = %bound,
                message_parent_id = %message.parent_id(),
                "invalidation for another parent; ignoring"
            );
            return false;
        }

        self.triggered.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            parent_id = %bound,
            event_id = %message.event_id(),
            replay_id = message.replay_id(),
            published_at = %message.published_at(),
            "invalidation received; refreshing"
        );
        self.query.refresh().await;
        true
    }

    fn register_error_listener(&self) {
        if self.listener_registered.swap(true, Ordering::SeqCst) {
            return;
        }
        let topic = self.topic.clone();
        self.channel.on_error(Arc::new(move |err| {
            tracing::error!(%topic, error = %err, "push channel error");
        }));
    }

    async fn release(&self, handle: &SubscriptionHandle) {
        match self.channel.unsubscribe(handle).await {
            Ok(()) => tracing::info!(topic = %self.topic, %handle, "unsubscribed"),
            Err(err) => {
                tracing::warn!(topic = %self.topic, %handle, error = %err, "unsubscribe failed; dropping handle")
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pump(
    subscriber: Weak<InvalidationSubscriber>,
    mut subscription: Subscription<Message>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            message = subscription.recv() => {
                let Some(message) = message else {
                    tracing::debug!("invalidation stream closed");
                    break;
                };
                let Some(subscriber) = subscriber.upgrade() else {
                    break;
                };
                subscriber.handle_message(&message).await;
            }
        }
    }
}

impl core::fmt::Debug for InvalidationSubscriber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InvalidationSubscriber")
            .field("topic", &self.topic)
            .field("state", &self.state())
            .field("triggered", &self.refreshes_triggered())
            .finish_non_exhaustive()
    }
}

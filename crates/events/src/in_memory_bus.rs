//! In-memory push channel for tests/dev.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::bus::{
    ChannelError, ErrorListener, PushChannel, ReplayPosition, Subscription, SubscriptionHandle,
    Topic,
};
use crate::envelope::ChannelMessage;

const DEFAULT_RETENTION: usize = 1024;

struct Registration<P> {
    topic: Topic,
    sender: mpsc::UnboundedSender<ChannelMessage<P>>,
}

struct Inner<P> {
    registrations: HashMap<Uuid, Registration<P>>,
    retained: Vec<ChannelMessage<P>>,
    next_replay_id: u64,
    error_listeners: Vec<ErrorListener>,
}

/// In-memory push channel.
///
/// - Topic-scoped fan-out
/// - Bounded retained log for replay (oldest messages are evicted first)
/// - Dead subscribers are pruned while publishing
#[derive(Debug)]
pub struct InMemoryPushChannel<P> {
    inner: Mutex<Inner<P>>,
    retention: usize,
}

impl<P> core::fmt::Debug for Inner<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inner")
            .field("registrations", &self.registrations.len())
            .field("retained", &self.retained.len())
            .field("next_replay_id", &self.next_replay_id)
            .field("error_listeners", &self.error_listeners.len())
            .finish()
    }
}

impl<P> InMemoryPushChannel<P> {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a channel that retains at most `retention` messages for replay.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                registrations: HashMap::new(),
                retained: Vec::new(),
                next_replay_id: 1,
                error_listeners: Vec::new(),
            }),
            retention,
        }
    }

    /// Number of live registrations on `topic`.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.inner
            .lock()
            .map(|inner| {
                inner
                    .registrations
                    .values()
                    .filter(|r| &r.topic == topic)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Fan a transport-level error out to every registered error listener.
    pub fn report_error(&self, error: ChannelError) {
        // Listeners run outside the lock so they may call back into the channel.
        let listeners = match self.inner.lock() {
            Ok(inner) => inner.error_listeners.clone(),
            Err(_) => return,
        };

        for listener in listeners {
            listener(&error);
        }
    }
}

impl<P> Default for InMemoryPushChannel<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> InMemoryPushChannel<P>
where
    P: Clone,
{
    /// Publish `payload` on `topic`. Returns the assigned replay id.
    pub fn publish(&self, topic: &Topic, payload: P) -> Result<u64, ChannelError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ChannelError::Transport("lock poisoned".to_string()))?;

        let replay_id = inner.next_replay_id;
        inner.next_replay_id += 1;

        let message = ChannelMessage::stamped(replay_id, topic.clone(), payload);

        // Drop any dead subscribers while publishing.
        inner.registrations.retain(|_, reg| {
            reg.topic != *topic || reg.sender.send(message.clone()).is_ok()
        });

        inner.retained.push(message);
        if inner.retained.len() > self.retention {
            let excess = inner.retained.len() - self.retention;
            inner.retained.drain(..excess);
        }

        Ok(replay_id)
    }
}

#[async_trait]
impl<P> PushChannel<ChannelMessage<P>> for InMemoryPushChannel<P>
where
    P: Clone + Send + Sync + 'static,
{
    async fn subscribe(
        &self,
        topic: &Topic,
        replay: ReplayPosition,
    ) -> Result<Subscription<ChannelMessage<P>>, ChannelError> {
        let mut inner = self.inner.lock().map_err(|_| ChannelError::Subscribe {
            topic: topic.clone(),
            reason: "lock poisoned".to_string(),
        })?;

        let (tx, rx) = mpsc::unbounded_channel();

        // Backlog is queued before registering, under the same lock, so replayed
        // and live messages cannot interleave out of order.
        let backlog = inner.retained.iter().filter(|m| m.topic() == topic);
        for message in backlog {
            let wanted = match replay {
                ReplayPosition::NewOnly => false,
                ReplayPosition::AllRetained => true,
                ReplayPosition::After(id) => message.replay_id() > id,
            };
            if wanted {
                // The receiver is still in hand, so this cannot fail.
                let _ = tx.send(message.clone());
            }
        }

        let id = Uuid::now_v7();
        inner.registrations.insert(
            id,
            Registration {
                topic: topic.clone(),
                sender: tx,
            },
        );

        tracing::debug!(%topic, handle = %id, ?replay, "in-memory subscription registered");

        Ok(Subscription::new(SubscriptionHandle::new(id, topic.clone()), rx))
    }

    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock().map_err(|_| ChannelError::Unsubscribe {
            handle: handle.clone(),
            reason: "lock poisoned".to_string(),
        })?;

        // Unknown / already released handles are fine.
        inner.registrations.remove(&handle.id());
        Ok(())
    }

    fn on_error(&self, listener: ErrorListener) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.error_listeners.push(listener);
        }
    }
}

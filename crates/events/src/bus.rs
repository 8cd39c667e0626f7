//! Push-channel subscription abstraction (mechanics only).
//!
//! A push channel delivers invalidation messages published by the remote side
//! to every live subscriber of a topic.
//!
//! ## Delivery Guarantees
//!
//! - **Best-effort, at-most-once per subscription**: a subscriber that is not
//!   registered when a message is published never sees it unless it asks for
//!   replay.
//! - **Ordered per topic**: messages of one topic are delivered in publish order.
//! - **No persistence promise**: retention and replay are transport-specific.
//!
//! Consumers treat a message as a hint ("something changed") and re-fetch; the
//! message body is never applied as a state delta.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Name of a push-channel topic (e.g. `/event/OpportunityProductUpdate_e__e`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Topic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a new subscription starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayPosition {
    /// Only messages published after the subscription is registered.
    NewOnly,
    /// Every message the transport still retains, then new ones.
    AllRetained,
    /// Retained messages with a replay id strictly greater than the given one.
    After(u64),
}

/// Opaque handle to one registration on a push channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle {
    id: Uuid,
    topic: Topic,
}

impl SubscriptionHandle {
    pub fn new(id: Uuid, topic: Topic) -> Self {
        Self { id, topic }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl core::fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.id, self.topic)
    }
}

/// Subscription-side failures (subscribe, unsubscribe, transport).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: Topic, reason: String },

    #[error("unsubscribe of {handle} failed: {reason}")]
    Unsubscribe {
        handle: SubscriptionHandle,
        reason: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("channel closed")]
    Closed,
}

/// Listener for transport-level channel errors.
pub type ErrorListener = Arc<dyn Fn(&ChannelError) + Send + Sync>;

/// A live registration on a push channel.
///
/// Holds the handle needed to unsubscribe and the receiving end of the
/// delivery queue. Designed for a single consumer task.
#[derive(Debug)]
pub struct Subscription<M> {
    handle: SubscriptionHandle,
    receiver: mpsc::UnboundedReceiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(handle: SubscriptionHandle, receiver: mpsc::UnboundedReceiver<M>) -> Self {
        Self { handle, receiver }
    }

    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Wait for the next message. `None` once the channel side is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }
}

/// Transport-agnostic push channel.
///
/// Implementations must make `unsubscribe` idempotent: releasing a handle that
/// is unknown or already released returns `Ok(())`.
#[async_trait]
pub trait PushChannel<M>: Send + Sync
where
    M: Send + 'static,
{
    /// Register a subscription on `topic`, starting at `replay`.
    async fn subscribe(
        &self,
        topic: &Topic,
        replay: ReplayPosition,
    ) -> Result<Subscription<M>, ChannelError>;

    /// Release a registration.
    async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), ChannelError>;

    /// Register a listener for transport-level errors.
    ///
    /// Listeners are independent of any subscription and stay registered for
    /// the lifetime of the channel.
    fn on_error(&self, listener: ErrorListener);
}

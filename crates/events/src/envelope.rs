use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lineitems_core::ParentId;

use crate::bus::Topic;

/// Envelope for a message delivered over a push channel.
///
/// Notes:
/// - `replay_id` is assigned by the transport and increases monotonically per
///   topic; it is what `ReplayPosition::After` refers to.
/// - `payload` is the domain-specific message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage<P> {
    event_id: Uuid,
    replay_id: u64,
    topic: Topic,
    published_at: DateTime<Utc>,
    payload: P,
}

impl<P> ChannelMessage<P> {
    pub fn new(
        event_id: Uuid,
        replay_id: u64,
        topic: Topic,
        published_at: DateTime<Utc>,
        payload: P,
    ) -> Self {
        Self {
            event_id,
            replay_id,
            topic,
            published_at,
            payload,
        }
    }

    /// Envelope with a fresh UUIDv7 event id, published now.
    pub fn stamped(replay_id: u64, topic: Topic, payload: P) -> Self {
        Self::new(Uuid::now_v7(), replay_id, topic, Utc::now(), payload)
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn replay_id(&self) -> u64 {
        self.replay_id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }
}

/// Invalidation payload: the line items of `parent_id` changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemUpdate {
    pub parent_id: ParentId,
}

impl LineItemUpdate {
    pub fn new(parent_id: ParentId) -> Self {
        Self { parent_id }
    }
}

impl crate::ParentScoped for LineItemUpdate {
    fn parent_id(&self) -> &ParentId {
        &self.parent_id
    }
}

//! `lineitems-events`: push-channel mechanics for invalidation messages.
//!
//! The channel carries notifications that backing data changed somewhere
//! (possibly outside the current session). It is a distribution mechanism only:
//! the remote store remains the source of truth and consumers re-fetch.

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;
pub mod scope;

pub use bus::{
    ChannelError, ErrorListener, PushChannel, ReplayPosition, Subscription, SubscriptionHandle,
    Topic,
};
pub use envelope::{ChannelMessage, LineItemUpdate};
pub use in_memory_bus::InMemoryPushChannel;
pub use scope::ParentScoped;

//! `lineitems-client`
//!
//! **Responsibility:** the reactive pipeline behind a line-item table.
//!
//! This crate provides:
//! - `ReactiveQuery`: the cached query result and its `refresh()`
//! - `ParentBinding`: the bound parent id, observed for changes
//! - `InvalidationSubscriber`: push-channel lifecycle and message filtering
//! - `RowActionDispatcher`: delete-then-refresh and role-gated navigation
//! - `LineItemsPanel`: the composition root a host starts and stops
//!
//! The remote store stays the authority: every mutation and every invalidation
//! re-fetches; nothing is patched locally.

pub mod api;
pub mod binding;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod panel;
pub mod query;
pub mod subscriber;

#[cfg(test)]
mod test_support;

pub use api::LineItemApi;
pub use binding::ParentBinding;
pub use config::ClientConfig;
pub use dispatcher::{
    EntityType, Intent, NavigationRequest, Navigator, RowActionDispatcher, TargetType,
};
pub use error::{DispatchError, MutationError, QueryError, RemoteError};
pub use http::HttpLineItemApi;
pub use panel::{LineItemsPanel, PanelDeps};
pub use query::{QueryResult, ReactiveQuery, RefreshPolicy, UnknownRefreshPolicy};
pub use subscriber::{InvalidationChannel, InvalidationSubscriber, SubscriberState};

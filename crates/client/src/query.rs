//! Cached line-item query with explicit refresh.
//!
//! The stored `QueryResult` is replaced wholesale by each completed fetch; it
//! is never patched. How concurrent `refresh()` calls interact is governed by
//! [`RefreshPolicy`]:
//!
//! - `SingleFlight` serializes fetches. A request made while a fetch is in
//!   flight waits and is served by one follow-up fetch shared with every other
//!   request made in the meantime. Results can never land out of order.
//! - `LastWriterWins` lets every call fetch independently; whichever fetch
//!   completes last owns the result, even if it started first.

use core::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, watch};

use lineitems_sales::LineItem;

use crate::api::LineItemApi;
use crate::binding::ParentBinding;
use crate::error::{QueryError, RemoteError};

/// State of the line-item query. Exactly one variant is live at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Loading,
    Success(Arc<[LineItem]>),
    Failure(QueryError),
}

impl QueryResult {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryResult::Loading)
    }

    pub fn items(&self) -> Option<&[LineItem]> {
        match self {
            QueryResult::Success(items) => Some(items),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryResult::Failure(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    #[default]
    SingleFlight,
    LastWriterWins,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown refresh policy '{0}' (expected 'single_flight' or 'last_writer_wins')")]
pub struct UnknownRefreshPolicy(pub String);

impl FromStr for RefreshPolicy {
    type Err = UnknownRefreshPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single_flight" => Ok(RefreshPolicy::SingleFlight),
            "last_writer_wins" => Ok(RefreshPolicy::LastWriterWins),
            other => Err(UnknownRefreshPolicy(other.to_string())),
        }
    }
}

/// Owner of the current line-item result for the bound parent.
pub struct ReactiveQuery {
    api: Arc<dyn LineItemApi>,
    binding: ParentBinding,
    policy: RefreshPolicy,
    result: watch::Sender<QueryResult>,

    /// Held for the duration of a fetch under `SingleFlight`.
    flight: Mutex<()>,
    /// Ticket of the most recent refresh request.
    requested: AtomicU64,
    /// Every request with a ticket at or below this was served by a fetch
    /// that started after it was made.
    covered: AtomicU64,

    fetches: AtomicU64,
    detached: AtomicBool,
}

impl ReactiveQuery {
    pub fn new(api: Arc<dyn LineItemApi>, binding: ParentBinding, policy: RefreshPolicy) -> Self {
        let (result, _rx) = watch::channel(QueryResult::Loading);
        Self {
            api,
            binding,
            policy,
            result,
            flight: Mutex::new(()),
            requested: AtomicU64::new(0),
            covered: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            detached: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Snapshot of the current result.
    pub fn current(&self) -> QueryResult {
        self.result.borrow().clone()
    }

    /// Receiver notified whenever the result is replaced.
    pub fn watch(&self) -> watch::Receiver<QueryResult> {
        self.result.subscribe()
    }

    /// Number of remote fetches issued so far.
    pub fn refresh_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Stop accepting results. Fetches already in flight still complete, but
    /// their outcome is discarded.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    /// Re-execute the query for the bound parent and replace the result.
    ///
    /// Never fails: remote errors become `QueryResult::Failure`.
    pub async fn refresh(&self) {
        match self.policy {
            RefreshPolicy::LastWriterWins => self.fetch_and_store().await,
            RefreshPolicy::SingleFlight => {
                let ticket = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
                let _flight = self.flight.lock().await;

                if self.covered.load(Ordering::SeqCst) >= ticket {
                    tracing::debug!(ticket, "refresh coalesced into a completed fetch");
                    return;
                }

                let started_at = self.requested.load(Ordering::SeqCst);
                self.fetch_and_store().await;
                self.covered.fetch_max(started_at, Ordering::SeqCst);
            }
        }
    }

    async fn fetch_and_store(&self) {
        if self.is_detached() {
            tracing::debug!("refresh requested after detach; ignoring");
            return;
        }

        let Some(parent_id) = self.binding.current() else {
            tracing::debug!("no parent bound; skipping line-item fetch");
            return;
        };

        self.fetches.fetch_add(1, Ordering::SeqCst);
        let outcome = self.api.fetch_line_items(&parent_id).await;

        if self.is_detached() {
            tracing::debug!(%parent_id, "discarding line-item fetch completed after detach");
            return;
        }

        let next = match outcome.and_then(validated) {
            Ok(items) => {
                tracing::debug!(%parent_id, count = items.len(), "line items loaded");
                QueryResult::Success(items.into())
            }
            Err(source) => {
                let err = QueryError { parent_id, source };
                tracing::error!(error = %err, "line-item query failed");
                QueryResult::Failure(err)
            }
        };

        self.result.send_replace(next);
    }
}

fn validated(items: Vec<LineItem>) -> Result<Vec<LineItem>, RemoteError> {
    for item in &items {
        item.validate()
            .map_err(|err| RemoteError::Parse(err.to_string()))?;
    }
    Ok(items)
}

impl core::fmt::Debug for ReactiveQuery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReactiveQuery")
            .field("policy", &self.policy)
            .field("parent_id", &self.binding.current())
            .field("fetches", &self.refresh_count())
            .field("detached", &self.is_detached())
            .finish_non_exhaustive()
    }
}

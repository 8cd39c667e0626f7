//! Memoized, fail-closed role resolution.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::RoleFlag;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleResolutionError {
    #[error("role check failed: {0}")]
    Remote(String),
}

/// Remote role check (`checkElevatedRole`).
#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn check_elevated_role(&self) -> Result<bool, RoleResolutionError>;
}

/// Fetch-once capability flag.
///
/// The first `resolve()` calls the resolver; every later call (and `flag()`)
/// returns the memoized value. A failed check memoizes `Standard`, so elevated
/// actions are never granted on error and the resolver is never re-invoked by
/// this gate. A fresh gate re-resolves.
pub struct RoleGate {
    resolver: Arc<dyn RoleResolver>,
    resolved: OnceCell<RoleFlag>,
}

impl RoleGate {
    pub fn new(resolver: Arc<dyn RoleResolver>) -> Self {
        Self {
            resolver,
            resolved: OnceCell::new(),
        }
    }

    /// Resolve the flag (at most one remote call per gate).
    pub async fn resolve(&self) -> RoleFlag {
        *self
            .resolved
            .get_or_init(|| async {
                match self.resolver.check_elevated_role().await {
                    Ok(elevated) => {
                        let flag = RoleFlag::from(elevated);
                        tracing::info!(%flag, "role resolved");
                        flag
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "role resolution failed; continuing as standard user");
                        RoleFlag::Standard
                    }
                }
            })
            .await
    }

    /// Current flag; `Standard` until resolved.
    pub fn flag(&self) -> RoleFlag {
        self.resolved.get().copied().unwrap_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.initialized()
    }
}

impl core::fmt::Debug for RoleGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RoleGate")
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingResolver {
        answer: Result<bool, RoleResolutionError>,
        calls: AtomicUsize,
    }

    impl CountingResolver {
        fn new(answer: Result<bool, RoleResolutionError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RoleResolver for CountingResolver {
        async fn check_elevated_role(&self) -> Result<bool, RoleResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[tokio::test]
    async fn unresolved_gate_is_standard() {
        let gate = RoleGate::new(CountingResolver::new(Ok(true)));
        assert!(!gate.is_resolved());
        assert_eq!(gate.flag(), RoleFlag::Standard);
    }

    #[tokio::test]
    async fn resolves_once_and_memoizes() {
        let resolver = CountingResolver::new(Ok(true));
        let gate = RoleGate::new(resolver.clone());

        assert_eq!(gate.resolve().await, RoleFlag::Elevated);
        assert_eq!(gate.resolve().await, RoleFlag::Elevated);
        assert_eq!(gate.flag(), RoleFlag::Elevated);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_fails_closed_and_is_not_retried() {
        let resolver =
            CountingResolver::new(Err(RoleResolutionError::Remote("timeout".to_string())));
        let gate = RoleGate::new(resolver.clone());

        assert_eq!(gate.resolve().await, RoleFlag::Standard);
        assert_eq!(gate.resolve().await, RoleFlag::Standard);
        assert!(gate.is_resolved());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn a_fresh_gate_re_resolves() {
        let resolver = CountingResolver::new(Ok(false));

        let first = RoleGate::new(resolver.clone());
        first.resolve().await;
        let second = RoleGate::new(resolver.clone());
        second.resolve().await;

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }
}

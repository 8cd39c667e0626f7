//! `lineitems-auth`: capability gating for line-item actions (fail-closed).
//!
//! This crate is intentionally decoupled from HTTP and storage: the role check
//! itself is a remote call behind [`RoleResolver`].

pub mod authorize;
pub mod gate;
pub mod roles;

pub use authorize::{authorize_action, ActionAuthorization, AuthzError, Capability};
pub use gate::{RoleGate, RoleResolutionError, RoleResolver};
pub use roles::RoleFlag;

use thiserror::Error;

use lineitems_auth::AuthzError;
use lineitems_core::{LineItemId, ParentId};
use lineitems_sales::UnknownAction;

/// Failure of a remote procedure call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0}): {1}")]
    Api(u16, String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// The line-item query failed; the view degrades to an error state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("loading line items of {parent_id} failed: {source}")]
pub struct QueryError {
    pub parent_id: ParentId,
    pub source: RemoteError,
}

/// A delete failed; the current rows stay displayed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("deleting line item {line_item_id} failed: {source}")]
pub struct MutationError {
    pub line_item_id: LineItemId,
    pub source: RemoteError,
}

/// A row action could not be carried out. None of these mutate state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownAction(#[from] UnknownAction),

    #[error("row action not permitted: {0}")]
    NotPermitted(#[from] AuthzError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

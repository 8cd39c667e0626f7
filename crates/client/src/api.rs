//! Remote data endpoints behind the table.

use async_trait::async_trait;

use lineitems_core::{LineItemId, ParentId};
use lineitems_sales::LineItem;

use crate::error::RemoteError;

/// Query and mutation procedures of the remote store.
///
/// The role check lives on `lineitems_auth::RoleResolver`; one backend type
/// usually implements both.
#[async_trait]
pub trait LineItemApi: Send + Sync {
    /// Line items of `parent_id`, each with its product embedded.
    async fn fetch_line_items(&self, parent_id: &ParentId) -> Result<Vec<LineItem>, RemoteError>;

    /// Delete one line item. Fails for unknown identifiers.
    async fn delete_line_item(&self, line_item_id: &LineItemId) -> Result<(), RemoteError>;
}

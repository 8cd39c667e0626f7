//! Row-action handling: delete-then-refresh and product navigation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use lineitems_auth::{ActionAuthorization, RoleGate, authorize_action};
use lineitems_core::ProductId;
use lineitems_sales::{DisplayRow, RowAction};

use crate::api::LineItemApi;
use crate::error::{DispatchError, MutationError};
use crate::query::ReactiveQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "recordDetail")]
    RecordDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Product,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    View,
}

/// Request handed to the host's navigation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    pub target_type: TargetType,
    pub record_id: ProductId,
    pub entity_type: EntityType,
    pub intent: Intent,
}

impl NavigationRequest {
    pub fn view_product(product_id: ProductId) -> Self {
        Self {
            target_type: TargetType::RecordDetail,
            record_id: product_id,
            entity_type: EntityType::Product,
            intent: Intent::View,
        }
    }
}

/// Host navigation service. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate(&self, request: NavigationRequest);
}

/// Carries out row actions emitted by the rendering collaborator.
pub struct RowActionDispatcher {
    api: Arc<dyn LineItemApi>,
    query: Arc<ReactiveQuery>,
    gate: Arc<RoleGate>,
    navigator: Arc<dyn Navigator>,
}

impl RowActionDispatcher {
    pub fn new(
        api: Arc<dyn LineItemApi>,
        query: Arc<ReactiveQuery>,
        gate: Arc<RoleGate>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            query,
            gate,
            navigator,
        }
    }

    /// Run the action named `action` against `row`.
    ///
    /// Authorization is re-checked here against the memoized role flag, even
    /// though the action set already hides what the user may not do. A
    /// rejected action never reaches the remote store.
    pub async fn dispatch(&self, action: &str, row: &DisplayRow) -> Result<(), DispatchError> {
        let action = action.parse::<RowAction>().inspect_err(|err| {
            tracing::warn!(line_item_id = %row.id, error = %err, "row action rejected");
        })?;

        let flag = self.gate.flag();
        if let Err(err) = authorize_action(flag, action.required_capability()) {
            tracing::warn!(line_item_id = %row.id, action = action.name(), error = %err, "row action rejected");
            return Err(err.into());
        }

        match action {
            RowAction::Delete => self.delete(row).await,
            RowAction::ViewProduct => {
                tracing::debug!(product_id = %row.product_id, "navigating to product");
                self.navigator
                    .navigate(NavigationRequest::view_product(row.product_id.clone()));
                Ok(())
            }
        }
    }

    async fn delete(&self, row: &DisplayRow) -> Result<(), DispatchError> {
        if let Err(source) = self.api.delete_line_item(&row.id).await {
            let err = MutationError {
                line_item_id: row.id.clone(),
                source,
            };
            tracing::error!(error = %err, "line-item delete failed; keeping current rows");
            return Err(err.into());
        }

        tracing::info!(line_item_id = %row.id, "line item deleted");
        self.query.refresh().await;
        Ok(())
    }
}

impl core::fmt::Debug for RowActionDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RowActionDispatcher")
            .field("gate", &self.gate)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

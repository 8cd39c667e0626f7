//! Data-only table and row-action descriptors.
//!
//! The rendering collaborator receives these and emits row-action events by
//! action name; nothing here renders.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lineitems_auth::{ActionAuthorization, Capability, RoleFlag, authorize_action};

use crate::labels::Labels;
use crate::view_model::STOCK_ERROR_CLASS;

/// Row action offered in the trailing action column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
    Delete,
    ViewProduct,
}

impl RowAction {
    /// Every action, in display order.
    pub const ALL: [RowAction; 2] = [RowAction::Delete, RowAction::ViewProduct];

    /// Wire name used in row-action events.
    pub fn name(&self) -> &'static str {
        match self {
            RowAction::Delete => "delete",
            RowAction::ViewProduct => "view",
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            RowAction::Delete => "utility:delete",
            RowAction::ViewProduct => "utility:preview",
        }
    }

    pub fn label<'a>(&self, labels: &'a Labels) -> &'a str {
        match self {
            RowAction::Delete => &labels.delete_action,
            RowAction::ViewProduct => &labels.view_product,
        }
    }
}

impl ActionAuthorization for RowAction {
    fn required_capability(&self) -> Capability {
        match self {
            RowAction::Delete => Capability::DeleteLineItem,
            RowAction::ViewProduct => Capability::ViewProduct,
        }
    }
}

/// Row-action name that matches no known action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown row action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for RowAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delete" => Ok(RowAction::Delete),
            "view" | "navigate" => Ok(RowAction::ViewProduct),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Actions available for `flag`, in display order.
pub fn action_set(flag: RoleFlag) -> Vec<RowAction> {
    RowAction::ALL
        .into_iter()
        .filter(|action| authorize_action(flag, action.required_capability()).is_ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowActionDescriptor {
    pub label: String,
    pub name: String,
    pub icon_name: String,
}

impl RowActionDescriptor {
    fn new(action: RowAction, labels: &Labels) -> Self {
        Self {
            label: action.label(labels).to_string(),
            name: action.name().to_string(),
            icon_name: action.icon_name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Currency,
    Number,
    Action,
}

/// Cell styling applied when the boolean row field `when` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellClass {
    pub when: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub label: String,
    /// Serialized `DisplayRow` field shown in this column; `None` for actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_class: Option<CellClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_actions: Vec<RowActionDescriptor>,
}

impl ColumnDescriptor {
    fn data(label: &str, field: &str, kind: ColumnKind) -> Self {
        Self {
            label: label.to_string(),
            field: Some(field.to_string()),
            kind,
            cell_class: None,
            row_actions: Vec::new(),
        }
    }

    fn flag_stock_error(mut self) -> Self {
        self.cell_class = Some(CellClass {
            when: "hasStockError".to_string(),
            class: STOCK_ERROR_CLASS.to_string(),
        });
        self
    }
}

/// Table layout for `flag`: five data columns, then the action column.
pub fn columns(labels: &Labels, flag: RoleFlag) -> Vec<ColumnDescriptor> {
    let actions = action_set(flag)
        .into_iter()
        .map(|action| RowActionDescriptor::new(action, labels))
        .collect();

    vec![
        ColumnDescriptor::data(&labels.product_name, "productName", ColumnKind::Text),
        ColumnDescriptor::data(&labels.unit_price, "unitPrice", ColumnKind::Currency),
        ColumnDescriptor::data(&labels.total_price, "totalPrice", ColumnKind::Currency),
        ColumnDescriptor::data(&labels.quantity, "quantity", ColumnKind::Number)
            .flag_stock_error(),
        ColumnDescriptor::data(&labels.stock_quantity, "quantityInStock", ColumnKind::Number)
            .flag_stock_error(),
        ColumnDescriptor {
            label: String::new(),
            field: None,
            kind: ColumnKind::Action,
            cell_class: None,
            row_actions: actions,
        },
    ]
}

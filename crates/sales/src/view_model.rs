//! Display rows derived from fetched line items.
//!
//! Rows are rebuilt from scratch for every result; nothing here is cached or
//! mutated in place.

use serde::Serialize;

use lineitems_auth::RoleFlag;
use lineitems_core::{LineItemId, ProductId};

use crate::columns::{RowAction, action_set};
use crate::labels::Labels;
use crate::line_item::LineItem;

/// Styling key for quantity cells of a row with a stock error.
pub const STOCK_ERROR_CLASS: &str = "slds-button_icon-error";

/// Whether the ordered quantity exceeds what is in stock.
///
/// The only stock comparison in the crate; row flags and the list-level
/// warning both go through it.
pub fn has_stock_error(quantity: i64, quantity_in_stock: i64) -> bool {
    quantity > quantity_in_stock
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: u64,
    pub total_price: u64,
    pub quantity: i64,
    pub quantity_in_stock: i64,
    pub has_stock_error: bool,
    pub quantity_class: &'static str,
    pub actions: Vec<RowAction>,
}

/// Map one line item (and its embedded product) to a display row.
pub fn map_row(item: &LineItem, flag: RoleFlag) -> DisplayRow {
    let stock_error = has_stock_error(item.quantity, item.product.quantity_in_stock);

    DisplayRow {
        id: item.id.clone(),
        product_id: item.product.id.clone(),
        product_name: item.product.name.clone(),
        unit_price: item.unit_price,
        total_price: item.total_price,
        quantity: item.quantity,
        quantity_in_stock: item.product.quantity_in_stock,
        has_stock_error: stock_error,
        quantity_class: if stock_error { STOCK_ERROR_CLASS } else { "" },
        actions: action_set(flag),
    }
}

pub fn map_rows(items: &[LineItem], flag: RoleFlag) -> Vec<DisplayRow> {
    items.iter().map(|item| map_row(item, flag)).collect()
}

/// What the rendering collaborator shows for one query state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub rows: Vec<DisplayRow>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListView {
    pub fn loading() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
            error: None,
        }
    }

    /// Degraded view: no rows, plus the error to display.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            loading: false,
            error: Some(error.into()),
        }
    }

    pub fn from_items(items: &[LineItem], flag: RoleFlag) -> Self {
        Self {
            rows: map_rows(items, flag),
            loading: false,
            error: None,
        }
    }

    pub fn has_products(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn has_stock_warning(&self) -> bool {
        self.rows.iter().any(|row| row.has_stock_error)
    }

    /// Notice shown above the table, if any.
    pub fn message<'a>(&self, labels: &'a Labels) -> Option<&'a str> {
        if self.loading || self.error.is_some() {
            None
        } else if !self.has_products() {
            Some(labels.no_products.as_str())
        } else if self.has_stock_warning() {
            Some(labels.stock_warning.as_str())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::line_item::Product;

    fn item(id: &str, quantity: i64, stock: i64) -> LineItem {
        LineItem {
            id: LineItemId::new(id).unwrap(),
            quantity,
            unit_price: 1000,
            total_price: 1000 * quantity.max(0) as u64,
            product: Product {
                id: ProductId::new(format!("P-{id}")).unwrap(),
                name: format!("Product {id}"),
                quantity_in_stock: stock,
            },
        }
    }

    #[test]
    fn over_ordered_line_is_flagged() {
        let view = ListView::from_items(&[item("LI1", 5, 3)], RoleFlag::Standard);

        let row = &view.rows[0];
        assert!(row.has_stock_error);
        assert_eq!(row.quantity_class, STOCK_ERROR_CLASS);
        assert_eq!(row.product_name, "Product LI1");
        assert_eq!(row.quantity_in_stock, 3);
        assert!(view.has_stock_warning());
        assert_eq!(
            view.message(&Labels::default()),
            Some(Labels::default().stock_warning.as_str())
        );
    }

    #[test]
    fn exact_stock_is_not_an_error() {
        let row = map_row(&item("LI1", 3, 3), RoleFlag::Standard);
        assert!(!row.has_stock_error);
        assert_eq!(row.quantity_class, "");
    }

    #[test]
    fn negative_stock_is_taken_as_given() {
        let row = map_row(&item("LI1", 0, -1), RoleFlag::Standard);
        assert!(row.has_stock_error);
    }

    #[test]
    fn row_actions_follow_role_flag() {
        let standard = map_row(&item("LI1", 1, 1), RoleFlag::Standard);
        assert_eq!(standard.actions, vec![RowAction::Delete]);

        let elevated = map_row(&item("LI1", 1, 1), RoleFlag::Elevated);
        assert_eq!(elevated.actions, vec![RowAction::Delete, RowAction::ViewProduct]);
    }

    #[test]
    fn empty_and_degraded_views() {
        let labels = Labels::default();

        let empty = ListView::from_items(&[], RoleFlag::Standard);
        assert!(!empty.has_products());
        assert_eq!(empty.message(&labels), Some(labels.no_products.as_str()));

        let failed = ListView::failed("backend unavailable");
        assert!(!failed.has_products());
        assert_eq!(failed.error.as_deref(), Some("backend unavailable"));
        assert_eq!(failed.message(&labels), None);

        assert_eq!(ListView::loading().message(&labels), None);
    }

    #[test]
    fn rows_serialize_with_column_field_names() {
        let json = serde_json::to_value(map_row(&item("LI1", 2, 1), RoleFlag::Standard)).unwrap();
        for field in ["productName", "unitPrice", "totalPrice", "quantity", "quantityInStock"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert_eq!(json["hasStockError"], true);
    }

    mod properties {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: the row flag is exactly `quantity > stock`.
            #[test]
            fn stock_error_matches_comparison(
                quantity in 0i64..10_000,
                stock in -10_000i64..10_000,
            ) {
                let row = map_row(&item("LI1", quantity, stock), RoleFlag::Standard);
                prop_assert_eq!(row.has_stock_error, quantity > stock);
            }

            /// Property: the subtraction phrasing `stock - quantity < 0` agrees.
            #[test]
            fn subtraction_form_is_equivalent(
                quantity in i64::MIN / 2..i64::MAX / 2,
                stock in i64::MIN / 2..i64::MAX / 2,
            ) {
                let by_subtraction = stock.checked_sub(quantity).map(|d| d < 0);
                prop_assert_eq!(by_subtraction, Some(has_stock_error(quantity, stock)));
            }

            /// Property: the list warning is set iff some row has a stock error.
            #[test]
            fn list_warning_is_any_row_error(
                lines in prop::collection::vec((0i64..50, -5i64..50), 0..20),
            ) {
                let items: Vec<LineItem> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, (q, s))| item(&format!("LI{i}"), *q, *s))
                    .collect();
                let view = ListView::from_items(&items, RoleFlag::Elevated);
                let expected = lines.iter().any(|(q, s)| q > s);
                prop_assert_eq!(view.has_stock_warning(), expected);
                prop_assert_eq!(view.rows.len(), items.len());
            }

            /// Property: standard users never see the product view action.
            #[test]
            fn standard_rows_never_offer_view(quantity in 0i64..100, stock in -5i64..100) {
                let row = map_row(&item("LI1", quantity, stock), RoleFlag::Standard);
                prop_assert!(!row.actions.contains(&RowAction::ViewProduct));
            }
        }
    }
}

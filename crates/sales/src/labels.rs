use serde::{Deserialize, Serialize};

/// User-visible strings of the line-item table.
///
/// Loading translations is the host's job; this is only the table it fills.
/// Missing keys in a deserialized override fall back to the English defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub no_products: String,
    pub stock_warning: String,
    pub product_name: String,
    pub unit_price: String,
    pub total_price: String,
    pub quantity: String,
    pub stock_quantity: String,
    pub delete_action: String,
    pub view_product: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            no_products: "No products are attached to this record.".to_string(),
            stock_warning: "Some line items exceed the quantity in stock.".to_string(),
            product_name: "Product Name".to_string(),
            unit_price: "Unit Price".to_string(),
            total_price: "Total Price".to_string(),
            quantity: "Quantity".to_string(),
            stock_quantity: "Quantity In Stock".to_string(),
            delete_action: "Delete".to_string(),
            view_product: "View Product".to_string(),
        }
    }
}

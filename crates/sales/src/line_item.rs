use serde::{Deserialize, Serialize};

use lineitems_core::{DomainError, DomainResult, LineItemId, ProductId};

/// Product referenced by a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Units on hand. Taken as given, even when negative.
    pub quantity_in_stock: i64,
}

/// Line item of a parent record, with its product embedded.
///
/// Snapshot of the remote record at fetch time; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub quantity: i64,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    /// Computed by the remote store; carried as-is.
    pub total_price: u64,
    pub product: Product,
}

impl LineItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::validation(format!(
                "line item {} has negative quantity {}",
                self.id, self.quantity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64) -> LineItem {
        LineItem {
            id: LineItemId::new("LI1").unwrap(),
            quantity,
            unit_price: 1250,
            total_price: 1250 * quantity.max(0) as u64,
            product: Product {
                id: ProductId::new("P1").unwrap(),
                name: "Widget".to_string(),
                quantity_in_stock: -2,
            },
        }
    }

    #[test]
    fn negative_quantity_is_rejected() {
        assert!(item(0).validate().is_ok());
        match item(-1).validate() {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("negative quantity")),
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_remote_shape() {
        let json = r#"{
            "id": "LI1",
            "quantity": 5,
            "unit_price": 1000,
            "total_price": 5000,
            "product": { "id": "P1", "name": "Widget", "quantity_in_stock": 3 }
        }"#;
        let parsed: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.quantity, 5);
        assert_eq!(parsed.product.quantity_in_stock, 3);
        assert_eq!(parsed.id.as_str(), "LI1");
    }
}

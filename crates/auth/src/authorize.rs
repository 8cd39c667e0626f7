use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RoleFlag;

/// Something a row action needs to be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Remove a line item from its parent record.
    DeleteLineItem,
    /// Open the detail page of the product behind a line item.
    ViewProduct,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DeleteLineItem => "delete_line_item",
            Capability::ViewProduct => "view_product",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: '{capability}' requires an elevated role (current: {flag})")]
    Forbidden { capability: String, flag: RoleFlag },
}

/// Action-side authorization contract.
///
/// Implement this on row actions; dispatchers check it before running the
/// effect, independently of whether the UI offered the action.
pub trait ActionAuthorization {
    fn required_capability(&self) -> Capability;
}

/// Authorize `capability` for the given role flag.
///
/// - No IO
/// - No panics
/// - Delete is open to every user; product navigation needs `Elevated`.
pub fn authorize_action(flag: RoleFlag, capability: Capability) -> Result<(), AuthzError> {
    let granted = match capability {
        Capability::DeleteLineItem => true,
        Capability::ViewProduct => flag.is_elevated(),
    };

    if granted {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            capability: capability.as_str().to_string(),
            flag,
        })
    }
}

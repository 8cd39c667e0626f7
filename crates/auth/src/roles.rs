use serde::{Deserialize, Serialize};

/// Capability level of the current user, as reported by the remote role check.
///
/// `Standard` is the default and the value used whenever the check has not
/// resolved or has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFlag {
    #[default]
    Standard,
    Elevated,
}

impl RoleFlag {
    pub fn is_elevated(self) -> bool {
        matches!(self, RoleFlag::Elevated)
    }
}

impl From<bool> for RoleFlag {
    fn from(elevated: bool) -> Self {
        if elevated {
            RoleFlag::Elevated
        } else {
            RoleFlag::Standard
        }
    }
}

impl core::fmt::Display for RoleFlag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RoleFlag::Standard => f.write_str("standard"),
            RoleFlag::Elevated => f.write_str("elevated"),
        }
    }
}

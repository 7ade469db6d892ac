use crate::error::RegistryError;
use crate::ids::{Height, Principal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal permission level grantable per work per principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PermissionTier {
    None = 0,
    View = 1,
    Edit = 2,
    Full = 3,
}

impl PermissionTier {
    /// Highest defined tier.
    pub const MAX: PermissionTier = PermissionTier::Full;

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PermissionTier {
    type Error = RegistryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::View),
            2 => Ok(Self::Edit),
            3 => Ok(Self::Full),
            other => Err(RegistryError::InvalidTier(other)),
        }
    }
}

impl fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::View => "view",
            Self::Edit => "edit",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

/// A delegated permission tier on one work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub tier: PermissionTier,
    pub granted_by: Principal,
    pub granted_at: Height,
}

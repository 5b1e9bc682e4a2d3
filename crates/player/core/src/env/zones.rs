use bitflags::bitflags;

use super::items::ZoneRestriction;
use crate::state::{ComboId, ItemId, ScriptId, ZoneId};

pub trait ZoneOracle: Send + Sync {
    fn zone(&self, id: ZoneId) -> Option<&ZoneDefinition>;
}

pub trait ComboOracle: Send + Sync {
    fn combo(&self, id: ComboId) -> Option<&ComboDefinition>;
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ZoneFlags: u8 {
        /// Dying here costs no experience.
        const NO_EXP_PENALTY = 1 << 0;
        /// Equipment is locked while inside.
        const NO_EQUIP_CHANGE = 1 << 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneDefinition {
    pub id: ZoneId,
    pub name: String,
    /// Categories this zone belongs to; items barred from any of them are inert.
    pub restrictions: ZoneRestriction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: ZoneFlags,
}

/// A set of items that grant an extra script when worn together.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComboDefinition {
    pub id: ComboId,
    pub members: Vec<ItemId>,
    pub script: ScriptId,
}

use bitflags::bitflags;

use super::jobs::{ClassMask, UpperMask};
use crate::state::{ComboId, EquipPoints, ItemId, ScriptId, Sex};
use crate::stats::WeaponType;

pub trait ItemOracle: Send + Sync {
    fn item(&self, id: ItemId) -> Option<&ItemDefinition>;
}

bitflags! {
    /// Zone categories an item may be barred from.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ZoneRestriction: u16 {
        const NORMAL = 1 << 0;
        const PVP = 1 << 1;
        const GVG = 1 << 2;
        const BATTLEGROUND = 1 << 3;
        const TOWN = 1 << 4;
    }
}

/// Sex an item is restricted to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SexRestriction {
    Female,
    Male,
    #[default]
    Any,
}

impl SexRestriction {
    pub fn allows(self, sex: Sex) -> bool {
        match self {
            SexRestriction::Any => true,
            SexRestriction::Female => sex == Sex::Female,
            SexRestriction::Male => sex == Sex::Male,
        }
    }
}

/// Inclusive base-level window; `max = None` means unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelRange {
    pub min: u16,
    pub max: Option<u16>,
}

impl LevelRange {
    pub fn contains(&self, level: u16) -> bool {
        level >= self.min && self.max.is_none_or(|max| level <= max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponData {
    pub kind: WeaponType,
    pub atk: u32,
    pub weapon_level: u8,
    pub two_handed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmorData {
    pub def: i32,
    pub mdef: i32,
}

/// Item type with type-specific data.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    Weapon(WeaponData),
    Armor(ArmorData),
    Ammo { atk: u32 },
    /// Inserted into another item's slots; its equip script runs with the host.
    Card,
    Consumable,
    Etc,
}

/// Static description of one item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub equip_points: EquipPoints,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub level_range: LevelRange,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sex: SexRestriction,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class_mask: ClassMask,
    #[cfg_attr(feature = "serde", serde(default))]
    pub upper_mask: UpperMask,
    #[cfg_attr(feature = "serde", serde(default))]
    pub zone_restriction: ZoneRestriction,
    pub equip_script: Option<ScriptId>,
    pub unequip_script: Option<ScriptId>,
    pub use_script: Option<ScriptId>,
    /// Combos this item (or card) is a member of.
    #[cfg_attr(feature = "serde", serde(default))]
    pub combos: Vec<ComboId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub slots: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub refineable: bool,
}

impl ItemDefinition {
    pub fn weapon(&self) -> Option<&WeaponData> {
        match &self.kind {
            ItemKind::Weapon(data) => Some(data),
            _ => None,
        }
    }

    pub fn armor(&self) -> Option<&ArmorData> {
        match &self.kind {
            ItemKind::Armor(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_equippable(&self) -> bool {
        !self.equip_points.is_empty()
            && matches!(
                self.kind,
                ItemKind::Weapon(_) | ItemKind::Armor(_) | ItemKind::Ammo { .. }
            )
    }

    pub fn is_two_handed(&self) -> bool {
        self.weapon().is_some_and(|w| w.two_handed)
    }

    pub fn is_consumable(&self) -> bool {
        matches!(self.kind, ItemKind::Consumable)
    }
}

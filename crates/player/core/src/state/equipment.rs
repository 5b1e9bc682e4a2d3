//! Equip slots and the translation between item equip points and slots.

use bitflags::bitflags;
use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

use super::common::InventoryIndex;
use crate::stats::BonusSource;

bitflags! {
    /// Positions an item may occupy, as stored in item data.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct EquipPoints: u32 {
        const HEAD_LOW = 0x0000_0001;
        const HAND_R = 0x0000_0002;
        const GARMENT = 0x0000_0004;
        const ACC_L = 0x0000_0008;
        const ARMOR = 0x0000_0010;
        const HAND_L = 0x0000_0020;
        const SHOES = 0x0000_0040;
        const ACC_R = 0x0000_0080;
        const HEAD_TOP = 0x0000_0100;
        const HEAD_MID = 0x0000_0200;
        const COSTUME_HEAD_TOP = 0x0000_0400;
        const COSTUME_HEAD_MID = 0x0000_0800;
        const COSTUME_HEAD_LOW = 0x0000_1000;
        const COSTUME_GARMENT = 0x0000_2000;
        const AMMO = 0x0000_8000;
        const SHADOW_ARMOR = 0x0001_0000;
        const SHADOW_WEAPON = 0x0002_0000;
        const SHADOW_SHIELD = 0x0004_0000;
        const SHADOW_SHOES = 0x0008_0000;
        const SHADOW_ACC_R = 0x0010_0000;
        const SHADOW_ACC_L = 0x0020_0000;

        const HANDS = Self::HAND_R.bits() | Self::HAND_L.bits();
        const ACC = Self::ACC_R.bits() | Self::ACC_L.bits();
        const SHADOW_ACC = Self::SHADOW_ACC_R.bits() | Self::SHADOW_ACC_L.bits();
        const COSTUME = Self::COSTUME_HEAD_TOP.bits()
            | Self::COSTUME_HEAD_MID.bits()
            | Self::COSTUME_HEAD_LOW.bits()
            | Self::COSTUME_GARMENT.bits();
    }
}

/// A concrete equip position.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumCount, EnumIter, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EquipSlot {
    HeadLow,
    HandR,
    Garment,
    AccL,
    Armor,
    HandL,
    Shoes,
    AccR,
    HeadTop,
    HeadMid,
    CostumeHeadTop,
    CostumeHeadMid,
    CostumeHeadLow,
    CostumeGarment,
    Ammo,
    ShadowArmor,
    ShadowWeapon,
    ShadowShield,
    ShadowShoes,
    ShadowAccR,
    ShadowAccL,
}

/// Slot ↔ equip-point translation, indexed by `EquipSlot as usize`.
const SLOT_POINTS: [EquipPoints; EquipSlot::COUNT] = [
    EquipPoints::HEAD_LOW,
    EquipPoints::HAND_R,
    EquipPoints::GARMENT,
    EquipPoints::ACC_L,
    EquipPoints::ARMOR,
    EquipPoints::HAND_L,
    EquipPoints::SHOES,
    EquipPoints::ACC_R,
    EquipPoints::HEAD_TOP,
    EquipPoints::HEAD_MID,
    EquipPoints::COSTUME_HEAD_TOP,
    EquipPoints::COSTUME_HEAD_MID,
    EquipPoints::COSTUME_HEAD_LOW,
    EquipPoints::COSTUME_GARMENT,
    EquipPoints::AMMO,
    EquipPoints::SHADOW_ARMOR,
    EquipPoints::SHADOW_WEAPON,
    EquipPoints::SHADOW_SHIELD,
    EquipPoints::SHADOW_SHOES,
    EquipPoints::SHADOW_ACC_R,
    EquipPoints::SHADOW_ACC_L,
];

/// Single-side pairs whose side is chosen at equip time, right side first.
pub const AMBIGUOUS_PAIRS: [(EquipSlot, EquipSlot); 3] = [
    (EquipSlot::AccR, EquipSlot::AccL),
    (EquipSlot::ShadowAccR, EquipSlot::ShadowAccL),
    (EquipSlot::HandR, EquipSlot::HandL),
];

impl EquipSlot {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn points(self) -> EquipPoints {
        SLOT_POINTS[self.index()]
    }

    pub fn is_costume(self) -> bool {
        EquipPoints::COSTUME.contains(self.points())
    }

    /// Source side scripts of the item in this slot write under.
    pub fn bonus_source(self, is_weapon: bool) -> BonusSource {
        match self {
            EquipSlot::HandR => BonusSource::RightHand,
            EquipSlot::HandL if is_weapon => BonusSource::LeftHand,
            EquipSlot::Ammo => BonusSource::Ammo,
            _ => BonusSource::Armor,
        }
    }
}

impl EquipPoints {
    /// Concrete slots covered by these points, in slot order.
    pub fn slots(self) -> impl Iterator<Item = EquipSlot> {
        EquipSlot::iter().filter(move |slot| self.contains(slot.points()))
    }

    pub fn from_slots(slots: impl IntoIterator<Item = EquipSlot>) -> Self {
        slots
            .into_iter()
            .fold(EquipPoints::empty(), |acc, slot| acc | slot.points())
    }
}

/// Mapping of every slot to the inventory entry that occupies it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipSlots {
    slots: [Option<InventoryIndex>; EquipSlot::COUNT],
}

impl EquipSlots {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, slot: EquipSlot) -> Option<InventoryIndex> {
        self.slots[slot.index()]
    }

    pub fn set(&mut self, slot: EquipSlot, index: Option<InventoryIndex>) {
        self.slots[slot.index()] = index;
    }

    pub fn is_free(&self, slot: EquipSlot) -> bool {
        self.get(slot).is_none()
    }

    /// Slots currently held by `index`.
    pub fn points_of(&self, index: InventoryIndex) -> EquipPoints {
        EquipPoints::from_slots(self.iter().filter(|(_, i)| *i == index).map(|(s, _)| s))
    }

    /// Clears every slot held by `index`, returning the freed points.
    pub fn clear_index(&mut self, index: InventoryIndex) -> EquipPoints {
        let freed = self.points_of(index);
        for slot in freed.slots() {
            self.set(slot, None);
        }
        freed
    }

    /// Occupied slots with their occupant.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, InventoryIndex)> + '_ {
        EquipSlot::iter().filter_map(|slot| self.get(slot).map(|index| (slot, index)))
    }

    /// Distinct occupants, each paired with its first slot.
    pub fn distinct(&self) -> Vec<(EquipSlot, InventoryIndex)> {
        let mut seen: Vec<(EquipSlot, InventoryIndex)> = Vec::new();
        for (slot, index) in self.iter() {
            if !seen.iter().any(|(_, i)| *i == index) {
                seen.push((slot, index));
            }
        }
        seen
    }

    pub fn occupied_points(&self) -> EquipPoints {
        EquipPoints::from_slots(self.iter().map(|(slot, _)| slot))
    }
}

/// The live loadout and the staged alternate loadout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Loadout {
    pub live: EquipSlots,
    pub staged: EquipSlots,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_table_is_one_bit_per_slot() {
        let mut all = EquipPoints::empty();
        for slot in EquipSlot::iter() {
            assert_eq!(slot.points().bits().count_ones(), 1);
            assert!(!all.intersects(slot.points()));
            all |= slot.points();
        }
    }

    #[test]
    fn two_handed_points_cover_both_hands() {
        let slots: Vec<_> = EquipPoints::HANDS.slots().collect();
        assert_eq!(slots, vec![EquipSlot::HandR, EquipSlot::HandL]);
    }

    #[test]
    fn clear_index_frees_every_slot_held() {
        let mut set = EquipSlots::new();
        set.set(EquipSlot::HandR, Some(InventoryIndex(2)));
        set.set(EquipSlot::HandL, Some(InventoryIndex(2)));
        set.set(EquipSlot::Armor, Some(InventoryIndex(3)));

        assert_eq!(set.distinct().len(), 2);
        assert_eq!(set.clear_index(InventoryIndex(2)), EquipPoints::HANDS);
        assert_eq!(set.occupied_points(), EquipPoints::ARMOR);
    }
}

//! Closed enumerations used as keys of the conditional bonus tables.
//!
//! Bonus scripts pass these as raw integers. [`Discriminant::select`] turns a
//! raw value into either one concrete key or the "all" wildcard; anything else
//! is rejected by the accumulator.

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

/// Result of resolving a raw discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection<T> {
    One(T),
    All,
}

/// A closed key space addressed by raw script integers.
pub trait Discriminant: Copy + Sized + 'static {
    /// Raw value meaning "every member", if the key space has one.
    const ALL: Option<i32>;

    fn from_raw(raw: i32) -> Option<Self>;
    fn index(self) -> usize;

    fn select(raw: i32) -> Option<Selection<Self>> {
        if Self::ALL == Some(raw) {
            return Some(Selection::All);
        }
        Self::from_raw(raw).map(Selection::One)
    }
}

macro_rules! discriminant {
    ($ty:ty, $all:expr) => {
        impl Discriminant for $ty {
            const ALL: Option<i32> = $all;

            fn from_raw(raw: i32) -> Option<Self> {
                u8::try_from(raw).ok().and_then(<$ty>::from_repr)
            }

            #[inline]
            fn index(self) -> usize {
                self as usize
            }
        }
    };
}

/// Monster race.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Race {
    Formless,
    Undead,
    Brute,
    Plant,
    Insect,
    Fish,
    Demon,
    DemiHuman,
    Angel,
    Dragon,
}
discriminant!(Race, Some(10));

/// Attack and defense element.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    FromRepr,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Element {
    #[default]
    Neutral,
    Water,
    Earth,
    Fire,
    Wind,
    Poison,
    Holy,
    Dark,
    Ghost,
    Undead,
}
discriminant!(Element, Some(10));

/// Body size class.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Size {
    Small,
    Medium,
    Large,
}
discriminant!(Size, Some(3));

/// Monster rank class.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MonsterClass {
    Normal,
    Boss,
    Guardian,
}
discriminant!(MonsterClass, Some(3));

/// Negative effect that can be inflicted on hit or resisted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Ailment {
    Stone,
    Freeze,
    Stun,
    Sleep,
    Poison,
    Curse,
    Silence,
    Confusion,
    Blind,
    Bleeding,
}
discriminant!(Ailment, None);

/// Weapon family; also keys the per-job attack delay table.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumCount,
    EnumIter,
    FromRepr,
    IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum WeaponType {
    #[default]
    Fist,
    Dagger,
    OneHandSword,
    TwoHandSword,
    OneHandSpear,
    TwoHandSpear,
    OneHandAxe,
    TwoHandAxe,
    Mace,
    TwoHandMace,
    Staff,
    Bow,
    Knuckle,
    Musical,
    Whip,
    Book,
    Katar,
    Revolver,
    Rifle,
    Gatling,
    Shotgun,
    Grenade,
    Huuma,
    TwoHandStaff,
}
discriminant!(WeaponType, None);

impl WeaponType {
    /// Ranged families whose base attack scales with DEX instead of STR.
    pub fn is_ranged(self) -> bool {
        matches!(
            self,
            WeaponType::Bow
                | WeaponType::Musical
                | WeaponType::Whip
                | WeaponType::Revolver
                | WeaponType::Rifle
                | WeaponType::Gatling
                | WeaponType::Shotgun
                | WeaponType::Grenade
        )
    }

    /// Families that can be wielded in the off hand by dual-wield jobs.
    pub fn is_dual_wieldable(self) -> bool {
        matches!(
            self,
            WeaponType::Dagger | WeaponType::OneHandSword | WeaponType::OneHandAxe
        )
    }
}

/// Fixed-size additive table keyed by a closed discriminant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateTable<const N: usize>(pub [i32; N]);

impl<const N: usize> Default for RateTable<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> RateTable<N> {
    pub fn add<D: Discriminant>(&mut self, selection: Selection<D>, value: i32) {
        match selection {
            Selection::One(key) => {
                if let Some(slot) = self.0.get_mut(key.index()) {
                    *slot = slot.saturating_add(value);
                }
            }
            Selection::All => {
                for slot in &mut self.0 {
                    *slot = slot.saturating_add(value);
                }
            }
        }
    }

    pub fn get<D: Discriminant>(&self, key: D) -> i32 {
        self.0.get(key.index()).copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }
}

pub type RaceTable = RateTable<{ Race::COUNT }>;
pub type ElementTable = RateTable<{ Element::COUNT }>;
pub type SizeTable = RateTable<{ Size::COUNT }>;
pub type ClassTable = RateTable<{ MonsterClass::COUNT }>;
pub type AilmentTable = RateTable<{ Ailment::COUNT }>;
pub type WeaponTypeTable = RateTable<{ WeaponType::COUNT }>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_accepts_all_wildcard_and_rejects_out_of_range() {
        assert_eq!(Race::select(7), Some(Selection::One(Race::DemiHuman)));
        assert_eq!(Race::select(10), Some(Selection::All));
        assert_eq!(Race::select(11), None);
        assert_eq!(Race::select(-1), None);
        assert_eq!(Ailment::select(10), None);
    }

    #[test]
    fn wildcard_adds_to_every_key() {
        let mut table = SizeTable::default();
        table.add(Selection::<Size>::All, 5);
        table.add(Selection::One(Size::Large), 10);
        assert_eq!(table.get(Size::Small), 5);
        assert_eq!(table.get(Size::Large), 15);
    }
}

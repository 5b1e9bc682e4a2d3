//! Bonus kinds grouped by the arity of the script call that writes them.

use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::stats::Stat;

/// Single-parameter bonuses: `bonus(kind, value)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus1 {
    Str,
    Agi,
    Vit,
    Int,
    Dex,
    Luk,
    AllStats,
    MaxHp,
    MaxSp,
    MaxHpRate,
    MaxSpRate,
    Atk,
    AtkRate,
    Matk,
    MatkRate,
    Def,
    DefRate,
    Mdef,
    MdefRate,
    Hit,
    HitRate,
    Flee,
    FleeRate,
    PerfectDodge,
    Critical,
    CriticalRate,
    AspdRate,
    Aspd,
    HpRecovRate,
    SpRecovRate,
    CastRate,
    DelayRate,
    UseSpRate,
    LongAtkRate,
    CritAtkRate,
    AddMaxWeight,
    SpeedRate,
    PerfectHitRate,
    DoubleRate,
    SplashRange,
    AtkEle,
    DefEle,
    NoSizeFix,
    NoKnockback,
}

/// How repeated writes of the same kind combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accumulation {
    Additive,
    Max,
    Replace,
    Flag,
}

impl Bonus1 {
    pub fn stat(self) -> Option<Stat> {
        Some(match self {
            Bonus1::Str => Stat::Str,
            Bonus1::Agi => Stat::Agi,
            Bonus1::Vit => Stat::Vit,
            Bonus1::Int => Stat::Int,
            Bonus1::Dex => Stat::Dex,
            Bonus1::Luk => Stat::Luk,
            _ => return None,
        })
    }

    pub fn accumulation(self) -> Accumulation {
        match self {
            Bonus1::SpeedRate
            | Bonus1::PerfectHitRate
            | Bonus1::DoubleRate
            | Bonus1::SplashRange => Accumulation::Max,
            Bonus1::AtkEle | Bonus1::DefEle => Accumulation::Replace,
            Bonus1::NoSizeFix | Bonus1::NoKnockback => Accumulation::Flag,
            _ => Accumulation::Additive,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Two-parameter bonuses: `bonus2(kind, key, value)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus2 {
    AddRace,
    SubRace,
    AddEle,
    SubEle,
    AddSize,
    SubSize,
    AddClass,
    SubClass,
    ExpAddRace,
    ExpAddClass,
    WeaponAtk,
    SkillAtk,
    ResEff,
    /// `(rate, percent)`: chance per mille to drain `percent` of damage.
    HpDrainRate,
    SpDrainRate,
    /// `(value, interval)` periodic gain or loss.
    HpRegenRate,
    SpRegenRate,
    HpLossRate,
    SpLossRate,
    /// `(skill, level)` usable while the item is equipped.
    GrantSkill,
}

/// Three-parameter bonuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus3 {
    /// `(ailment, rate, duration)`
    AddEff,
    /// `(skill, level, rate)`
    AutoSpell,
}

/// Four-parameter bonuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus4 {
    /// `(skill, ailment, rate, duration)`
    AddEffOnSkill,
    /// `(skill, level, rate, flag)`
    AutoSpellWhenHit,
}

/// Five-parameter bonuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus5 {
    /// `(trigger skill, skill, level, rate, flag)`
    AutoSpellOnSkill,
}

/// Which weapon-data record conditional bonuses land in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BonusSource {
    #[default]
    RightHand,
    LeftHand,
    Ammo,
    Armor,
}

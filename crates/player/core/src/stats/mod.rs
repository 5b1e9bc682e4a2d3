//! Stat system.
//!
//! ```text
//! Layer 1  PrimaryStats + StatBonuses   → EffectiveStats   (core.rs)
//! Layer 2  DerivedInputs + BonusTable   → BattleStatus     (derived.rs)
//! ```
//!
//! The [`BonusTable`](accumulator::BonusTable) is filled by scripts during a
//! recompute pass and feeds both layers.

pub mod accumulator;
pub mod bonus;
pub mod core;
pub mod derived;
pub mod discriminants;

pub use accumulator::{
    AutobonusSpec, Bonus1, Bonus2, Bonus3, Bonus4, Bonus5, BonusFlags, BonusSource, BonusTable,
};
pub use bonus::{Bonus, BonusStack, StatBounds, StatLayer};
pub use self::core::{
    EffectiveStats, MIN_STAT, PrimaryStats, Stat, StatBonuses, StatCaps, StatCostCurve,
};
pub use derived::{BattleStatus, DerivedCaps, DerivedInputs, WieldedWeapon};
pub use discriminants::{
    Ailment, Discriminant, Element, MonsterClass, Race, Selection, Size, WeaponType,
};

//! Derived battle status - Layer 2 of the stat system.
//!
//! Folds effective primary stats, the equipped gear summary and the bonus
//! table into the values combat and the client observe. Recomputed at the end
//! of every recompute pass and never persisted.

use crate::env::UpperKind;
use crate::stats::accumulator::{Bonus1, BonusTable};
use crate::stats::bonus::{StatBounds, StatLayer};
use crate::stats::core::EffectiveStats;
use crate::stats::discriminants::{Element, WeaponType};

/// Attack delay used when a job has no entry for the wielded weapon.
pub const DEFAULT_AMOTION: u32 = 2_000;
/// Slowest walk delay.
pub const MAX_WALK_SPEED: i32 = 1_000;
/// Fastest walk delay.
pub const MIN_WALK_SPEED: i32 = 20;
const BASE_WALK_SPEED: i64 = 150;
const RIDING_WEIGHT_BONUS: u32 = 10_000;

/// A weapon in one hand, as seen by the formulas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WieldedWeapon {
    pub kind: WeaponType,
    pub atk: u32,
    pub weapon_level: u8,
    pub refine: u8,
}

impl WieldedWeapon {
    /// Attack added per refine level, by weapon level.
    pub fn refine_bonus(weapon_level: u8) -> u32 {
        match weapon_level {
            0 | 1 => 2,
            2 => 3,
            3 => 5,
            _ => 7,
        }
    }
}

/// Caps from the engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivedCaps {
    pub max_aspd_amotion: u32,
    pub max_hp: u32,
    pub max_sp: u32,
}

/// Everything the battle formulas read apart from the bonus table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedInputs {
    pub stats: EffectiveStats,
    pub base_level: u16,
    pub upper: UpperKind,
    pub hp_per_level: u32,
    pub sp_per_level: u32,
    pub base_weight: u32,
    pub right: Option<WieldedWeapon>,
    pub left: Option<WieldedWeapon>,
    /// Job attack delay for the right-hand weapon (or bare hands).
    pub amotion_right: u32,
    /// Job attack delay for the left-hand weapon when dual wielding.
    pub amotion_left: Option<u32>,
    pub armor_def: i32,
    pub armor_mdef: i32,
    pub armor_refine: i32,
    pub riding: bool,
    /// Walk slowdown in percent from debuffs.
    pub slow_rate: i32,
    pub caps: DerivedCaps,
}

/// Battle-ready attributes published after each recompute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleStatus {
    pub batk: i32,
    pub watk_right: i32,
    pub watk_left: i32,
    pub matk_min: i32,
    pub matk_max: i32,
    pub def: i32,
    pub def2: i32,
    pub mdef: i32,
    pub mdef2: i32,
    pub hit: i32,
    pub flee: i32,
    /// Tenths of a percent.
    pub perfect_dodge: i32,
    /// Tenths of a percent.
    pub critical: i32,
    /// Attack motion delay in milliseconds; lower is faster.
    pub amotion: u32,
    pub max_hp: u32,
    pub max_sp: u32,
    pub speed: i32,
    pub hp_regen: u32,
    pub sp_regen: u32,
    pub weight_max: u32,
    pub atk_ele: Element,
    pub def_ele: Element,
}

impl BattleStatus {
    /// Client-facing attack speed (`200 - amotion / 10`).
    pub fn aspd(&self) -> u32 {
        200u32.saturating_sub(self.amotion / 10)
    }
}

fn rate(value: i64, rate: i32) -> i64 {
    value * (100 + i64::from(rate)) / 100
}

fn battle(value: i64) -> i32 {
    let bounds = StatBounds::BATTLE;
    value.clamp(i64::from(bounds.min), i64::from(bounds.max)) as i32
}

fn weapon_atk(weapon: Option<WieldedWeapon>, bonuses: &BonusTable) -> i64 {
    let Some(weapon) = weapon else {
        return 0;
    };
    i64::from(weapon.atk)
        + i64::from(weapon.refine) * i64::from(WieldedWeapon::refine_bonus(weapon.weapon_level))
        + i64::from(bonuses.weapon_atk.get(weapon.kind))
}

#[allow(clippy::too_many_arguments)]
fn resource(
    base: i64,
    level: i64,
    per_level: u32,
    stat: i32,
    flat: i32,
    rate_bonus: i32,
    upper: UpperKind,
    cap: u32,
) -> u32 {
    let raw = (base + level * i64::from(per_level)) * (100 + i64::from(stat)) / 100;
    let with_flat = rate(raw + i64::from(flat), rate_bonus);
    let scaled = match upper {
        UpperKind::Normal => with_flat,
        UpperKind::Upper => with_flat * 125 / 100,
        UpperKind::Baby => with_flat * 70 / 100,
    };
    scaled.clamp(1, i64::from(cap.max(1))) as u32
}

impl StatLayer for BattleStatus {
    type Base = DerivedInputs;
    type Bonuses = BonusTable;
    type Final = BattleStatus;

    fn compute(base: &DerivedInputs, bonuses: &BonusTable) -> BattleStatus {
        let s = &base.stats;
        let level = i64::from(base.base_level);
        let (str, agi, vit, int, dex, luk) = (
            i64::from(s.str()),
            i64::from(s.agi()),
            i64::from(s.vit()),
            i64::from(s.int()),
            i64::from(s.dex()),
            i64::from(s.luk()),
        );

        let ranged = base.right.is_some_and(|w| w.kind.is_ranged());
        let (main, sub) = if ranged { (dex, str) } else { (str, dex) };
        let batk = rate(
            main + (main / 10) * (main / 10) + sub / 5 + luk / 5,
            bonuses.get(Bonus1::AtkRate),
        ) + i64::from(bonuses.get(Bonus1::Atk));

        let matk_rate = bonuses.get(Bonus1::MatkRate);
        let matk_flat = i64::from(bonuses.get(Bonus1::Matk));
        let matk_min = rate(int + (int / 7) * (int / 7) + matk_flat, matk_rate);
        let matk_max = rate(int + (int / 5) * (int / 5) + matk_flat, matk_rate);

        let def = rate(
            i64::from(base.armor_def)
                + i64::from(base.armor_refine)
                + i64::from(bonuses.get(Bonus1::Def)),
            bonuses.get(Bonus1::DefRate),
        );
        let mdef = rate(
            i64::from(base.armor_mdef) + i64::from(bonuses.get(Bonus1::Mdef)),
            bonuses.get(Bonus1::MdefRate),
        );

        let hit = rate(
            level + dex + i64::from(bonuses.get(Bonus1::Hit)),
            bonuses.get(Bonus1::HitRate),
        );
        let flee = rate(
            level + agi + i64::from(bonuses.get(Bonus1::Flee)),
            bonuses.get(Bonus1::FleeRate),
        );
        let perfect_dodge = luk + 10 + i64::from(bonuses.get(Bonus1::PerfectDodge)) * 10;
        let critical = rate(
            10 + luk * 3 + i64::from(bonuses.get(Bonus1::Critical)) * 10,
            bonuses.get(Bonus1::CriticalRate),
        );

        let delay = match base.amotion_left {
            Some(left) => (i64::from(base.amotion_right) + i64::from(left)) / 2,
            None => i64::from(base.amotion_right),
        };
        let mut amotion = delay - delay * (4 * agi + dex) / 1000;
        amotion = amotion * (100 - i64::from(bonuses.get(Bonus1::AspdRate))) / 100;
        amotion -= i64::from(bonuses.get(Bonus1::Aspd)) * 10;
        let amotion = amotion.clamp(
            i64::from(base.caps.max_aspd_amotion),
            i64::from(DEFAULT_AMOTION),
        ) as u32;

        let max_hp = resource(
            35,
            level,
            base.hp_per_level,
            s.vit(),
            bonuses.get(Bonus1::MaxHp),
            bonuses.get(Bonus1::MaxHpRate),
            base.upper,
            base.caps.max_hp,
        );
        let max_sp = resource(
            10,
            level,
            base.sp_per_level,
            s.int(),
            bonuses.get(Bonus1::MaxSp),
            bonuses.get(Bonus1::MaxSpRate),
            base.upper,
            base.caps.max_sp,
        );

        let haste = i64::from(bonuses.get(Bonus1::SpeedRate).clamp(0, 99));
        let mut speed = BASE_WALK_SPEED * (100 - haste) / 100;
        speed = speed * (100 + i64::from(base.slow_rate.max(0))) / 100;
        if base.riding {
            speed = speed * 75 / 100;
        }
        let speed = speed.clamp(i64::from(MIN_WALK_SPEED), i64::from(MAX_WALK_SPEED)) as i32;

        let hp_regen = rate(
            i64::from(max_hp) / 200 + vit / 5 + 1,
            bonuses.get(Bonus1::HpRecovRate),
        )
        .max(0) as u32;
        let sp_regen = rate(
            i64::from(max_sp) / 100 + int / 6 + 1,
            bonuses.get(Bonus1::SpRecovRate),
        )
        .max(0) as u32;

        let mut weight_max =
            i64::from(base.base_weight) + str * 300 + i64::from(bonuses.get(Bonus1::AddMaxWeight));
        if base.riding {
            weight_max += i64::from(RIDING_WEIGHT_BONUS);
        }

        BattleStatus {
            batk: battle(batk),
            watk_right: battle(weapon_atk(base.right, bonuses)),
            watk_left: battle(weapon_atk(base.left, bonuses)),
            matk_min: battle(matk_min),
            matk_max: battle(matk_max.max(matk_min)),
            def: battle(def),
            def2: battle(vit),
            mdef: battle(mdef),
            mdef2: battle(int + vit / 2),
            hit: battle(hit),
            flee: battle(flee),
            perfect_dodge: battle(perfect_dodge),
            critical: battle(critical),
            amotion,
            max_hp,
            max_sp,
            speed,
            hp_regen,
            sp_regen,
            weight_max: weight_max.clamp(0, i64::from(u32::MAX)) as u32,
            atk_ele: bonuses.right.atk_ele.unwrap_or_default(),
            def_ele: bonuses.def_ele.unwrap_or_default(),
        }
    }

    fn empty_bonuses() -> BonusTable {
        BonusTable::new()
    }

    fn bounds() -> Option<StatBounds> {
        Some(StatBounds::BATTLE)
    }
}

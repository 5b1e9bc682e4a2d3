//! Bonus accumulator.
//!
//! A [`BonusTable`] is rebuilt from scratch on every recompute pass. Item,
//! card, combo, autobonus and status scripts write into it through the arity
//! entry points (`bonus` .. `bonus5`). Every entry is keyed by kind and
//! discriminant, and each kind has a fixed accumulation rule:
//!
//! | rule     | kinds |
//! |----------|-------|
//! | additive | flat stats, rates, per-race/element/size/class tables |
//! | max      | `SpeedRate`, `PerfectHitRate`, `DoubleRate`, `SplashRange`, granted skill level |
//! | replace  | `AtkEle`, `DefEle` |
//! | longest  | inflict durations; shortest for periodic intervals |
//!
//! Raw discriminants that fall outside their key space are logged and ignored.
//! Bounded lists drop overflowing entries with a warning.

mod kinds;

use arrayvec::ArrayVec;
use bitflags::bitflags;
use strum::EnumCount;
use tracing::warn;

use crate::config::EngineConfig;
use crate::state::{InventoryIndex, ScriptId, SkillId};
use crate::stats::bonus::Bonus;
use crate::stats::core::StatBonuses;
use crate::stats::discriminants::{
    Ailment, AilmentTable, ClassTable, Discriminant, Element, ElementTable, MonsterClass, Race,
    RaceTable, Selection, Size, SizeTable, WeaponType, WeaponTypeTable,
};
use crate::stats::Stat;

pub use kinds::{Accumulation, Bonus1, Bonus2, Bonus3, Bonus4, Bonus5, BonusSource};

bitflags! {
    /// Boolean bonus kinds.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BonusFlags: u8 {
        const NO_SIZE_FIX = 1 << 0;
        const NO_KNOCKBACK = 1 << 1;
    }
}

/// Chance-based drain attached to one weapon record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainRate {
    /// Per mille chance.
    pub rate: i32,
    /// Percentage of the damage drained.
    pub percent: i32,
}

/// Conditional bonuses for one hand (or the ammo slot).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeaponBonusData {
    pub atk_ele: Option<Element>,
    pub add_race: RaceTable,
    pub add_ele: ElementTable,
    pub add_size: SizeTable,
    pub add_class: ClassTable,
    pub hp_drain: DrainRate,
    pub sp_drain: DrainRate,
}

/// Extra damage percentage for one skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillRate {
    pub skill: SkillId,
    pub rate: i32,
}

/// Chance to inflict an ailment on hit, optionally restricted to one skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InflictEffect {
    pub skill: Option<SkillId>,
    pub ailment: Ailment,
    /// Per ten-thousand chance.
    pub rate: i32,
    pub duration: u32,
}

/// Skill cast automatically on attack, when hit, or after a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoSpell {
    pub trigger: Option<SkillId>,
    pub skill: SkillId,
    pub level: u8,
    /// Per mille chance.
    pub rate: i32,
    pub flag: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeriodicKind {
    HpRegen,
    SpRegen,
    HpLoss,
    SpLoss,
}

/// Periodic HP/SP change granted by equipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodicBonus {
    pub kind: PeriodicKind,
    pub value: i32,
    /// Milliseconds between applications.
    pub interval: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrantedSkill {
    pub skill: SkillId,
    pub level: u8,
}

/// A bonus script that may temporarily activate during combat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutobonusSpec {
    pub script: ScriptId,
    /// Per ten-thousand activation chance, rolled by the combat collaborator.
    pub rate: u16,
    /// Active duration in milliseconds.
    pub duration: u64,
    /// Inventory item whose script registered it.
    pub source: Option<InventoryIndex>,
}

const MAX_PC_BONUS: usize = EngineConfig::MAX_PC_BONUS;
const MAX_AUTOSPELL: usize = EngineConfig::MAX_AUTOSPELL;
const MAX_AUTOBONUS: usize = EngineConfig::MAX_AUTOBONUS;

/// Every bonus written during one recompute pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BonusTable {
    pub stats: StatBonuses,
    values: [i32; Bonus1::COUNT],
    pub flags: BonusFlags,
    pub def_ele: Option<Element>,

    pub right: WeaponBonusData,
    pub left: WeaponBonusData,
    pub ammo: WeaponBonusData,

    pub sub_race: RaceTable,
    pub sub_ele: ElementTable,
    pub sub_size: SizeTable,
    pub sub_class: ClassTable,
    pub exp_add_race: RaceTable,
    pub exp_add_class: ClassTable,
    pub res_eff: AilmentTable,
    pub weapon_atk: WeaponTypeTable,

    pub skill_atk: ArrayVec<SkillRate, MAX_PC_BONUS>,
    pub add_eff: ArrayVec<InflictEffect, MAX_PC_BONUS>,
    pub periodic: ArrayVec<PeriodicBonus, MAX_PC_BONUS>,
    pub granted_skills: ArrayVec<GrantedSkill, MAX_PC_BONUS>,
    pub autospell: ArrayVec<AutoSpell, MAX_AUTOSPELL>,
    pub autospell_when_hit: ArrayVec<AutoSpell, MAX_AUTOSPELL>,
    pub autospell_on_skill: ArrayVec<AutoSpell, MAX_AUTOSPELL>,
    pub autobonuses: ArrayVec<AutobonusSpec, MAX_AUTOBONUS>,

    source: BonusSource,
    current_item: Option<InventoryIndex>,
    /// Entries dropped because a bounded list was full.
    pub capacity_drops: u32,
    /// Calls ignored because of an invalid discriminant or argument.
    pub rejected: u32,
}

impl Default for BonusTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BonusTable {
    pub fn new() -> Self {
        Self {
            stats: StatBonuses::new(),
            values: [0; Bonus1::COUNT],
            flags: BonusFlags::empty(),
            def_ele: None,
            right: WeaponBonusData::default(),
            left: WeaponBonusData::default(),
            ammo: WeaponBonusData::default(),
            sub_race: RaceTable::default(),
            sub_ele: ElementTable::default(),
            sub_size: SizeTable::default(),
            sub_class: ClassTable::default(),
            exp_add_race: RaceTable::default(),
            exp_add_class: ClassTable::default(),
            res_eff: AilmentTable::default(),
            weapon_atk: WeaponTypeTable::default(),
            skill_atk: ArrayVec::new(),
            add_eff: ArrayVec::new(),
            periodic: ArrayVec::new(),
            granted_skills: ArrayVec::new(),
            autospell: ArrayVec::new(),
            autospell_when_hit: ArrayVec::new(),
            autospell_on_skill: ArrayVec::new(),
            autobonuses: ArrayVec::new(),
            source: BonusSource::RightHand,
            current_item: None,
            capacity_drops: 0,
            rejected: 0,
        }
    }

    /// Sets the ambient source side and item for the scripts that follow.
    pub fn set_source(&mut self, source: BonusSource, item: Option<InventoryIndex>) {
        self.source = source;
        self.current_item = item;
    }

    pub fn source(&self) -> BonusSource {
        self.source
    }

    pub fn current_item(&self) -> Option<InventoryIndex> {
        self.current_item
    }

    /// Accumulated value of a single-parameter kind.
    #[inline]
    pub fn get(&self, kind: Bonus1) -> i32 {
        self.values[kind.index()]
    }

    pub fn has_flag(&self, flag: BonusFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Weapon record the current source side writes into.
    fn weapon_mut(&mut self) -> &mut WeaponBonusData {
        match self.source {
            BonusSource::RightHand | BonusSource::Armor => &mut self.right,
            BonusSource::LeftHand => &mut self.left,
            BonusSource::Ammo => &mut self.ammo,
        }
    }

    fn reject(&mut self, kind: &'static str, detail: &str) {
        self.rejected += 1;
        warn!(
            target: "player_core::bonus",
            kind,
            detail,
            item = ?self.current_item,
            "ignoring bonus with invalid argument"
        );
    }

    fn drop_entry(&mut self, kind: &'static str) {
        self.capacity_drops += 1;
        warn!(
            target: "player_core::bonus",
            kind,
            item = ?self.current_item,
            "bonus list full, entry dropped"
        );
    }

    fn select<D: Discriminant>(&mut self, kind: &'static str, raw: i32) -> Option<Selection<D>> {
        let selection = D::select(raw);
        if selection.is_none() {
            self.reject(kind, &format!("discriminant {raw} out of range"));
        }
        selection
    }

    fn element(&mut self, kind: &'static str, raw: i32) -> Option<Element> {
        match Element::from_raw(raw) {
            Some(ele) => Some(ele),
            None => {
                self.reject(kind, &format!("element {raw} out of range"));
                None
            }
        }
    }

    fn skill(&mut self, kind: &'static str, raw: i32) -> Option<SkillId> {
        match u16::try_from(raw) {
            Ok(id) if id > 0 => Some(SkillId(id)),
            _ => {
                self.reject(kind, &format!("skill {raw} out of range"));
                None
            }
        }
    }

    fn level(&mut self, kind: &'static str, raw: i32) -> Option<u8> {
        match u8::try_from(raw) {
            Ok(level) if level > 0 => Some(level),
            _ => {
                self.reject(kind, &format!("level {raw} out of range"));
                None
            }
        }
    }

    /// Adds a layered bonus directly to a primary stat (status changes use
    /// percentage layers that scripts cannot express).
    pub fn stat_bonus(&mut self, stat: Stat, bonus: Bonus) {
        self.stats.add(stat, bonus);
    }

    /// `bonus(kind, value)`.
    pub fn bonus(&mut self, kind: Bonus1, value: i32) {
        let name: &'static str = kind.into();
        if let Some(stat) = kind.stat() {
            self.stats.add(stat, Bonus::flat(value));
            return;
        }
        match kind.accumulation() {
            Accumulation::Additive => {
                if kind == Bonus1::AllStats {
                    self.stats.add_all(Bonus::flat(value));
                }
                let slot = &mut self.values[kind.index()];
                *slot = slot.saturating_add(value);
            }
            Accumulation::Max => {
                let slot = &mut self.values[kind.index()];
                *slot = (*slot).max(value);
            }
            Accumulation::Replace => {
                let Some(ele) = self.element(name, value) else {
                    return;
                };
                if kind == Bonus1::DefEle {
                    self.def_ele = Some(ele);
                } else {
                    self.weapon_mut().atk_ele = Some(ele);
                }
            }
            Accumulation::Flag => {
                let flag = match kind {
                    Bonus1::NoSizeFix => BonusFlags::NO_SIZE_FIX,
                    _ => BonusFlags::NO_KNOCKBACK,
                };
                if value != 0 {
                    self.flags.insert(flag);
                }
            }
        }
    }

    /// `bonus2(kind, key, value)`.
    pub fn bonus2(&mut self, kind: Bonus2, key: i32, value: i32) {
        let name: &'static str = kind.into();
        match kind {
            Bonus2::AddRace => {
                if let Some(sel) = self.select::<Race>(name, key) {
                    self.weapon_mut().add_race.add(sel, value);
                }
            }
            Bonus2::AddEle => {
                if let Some(sel) = self.select::<Element>(name, key) {
                    self.weapon_mut().add_ele.add(sel, value);
                }
            }
            Bonus2::AddSize => {
                if let Some(sel) = self.select::<Size>(name, key) {
                    self.weapon_mut().add_size.add(sel, value);
                }
            }
            Bonus2::AddClass => {
                if let Some(sel) = self.select::<MonsterClass>(name, key) {
                    self.weapon_mut().add_class.add(sel, value);
                }
            }
            Bonus2::SubRace => {
                if let Some(sel) = self.select::<Race>(name, key) {
                    self.sub_race.add(sel, value);
                }
            }
            Bonus2::SubEle => {
                if let Some(sel) = self.select::<Element>(name, key) {
                    self.sub_ele.add(sel, value);
                }
            }
            Bonus2::SubSize => {
                if let Some(sel) = self.select::<Size>(name, key) {
                    self.sub_size.add(sel, value);
                }
            }
            Bonus2::SubClass => {
                if let Some(sel) = self.select::<MonsterClass>(name, key) {
                    self.sub_class.add(sel, value);
                }
            }
            Bonus2::ExpAddRace => {
                if let Some(sel) = self.select::<Race>(name, key) {
                    self.exp_add_race.add(sel, value);
                }
            }
            Bonus2::ExpAddClass => {
                if let Some(sel) = self.select::<MonsterClass>(name, key) {
                    self.exp_add_class.add(sel, value);
                }
            }
            Bonus2::ResEff => {
                if let Some(sel) = self.select::<Ailment>(name, key) {
                    self.res_eff.add(sel, value);
                }
            }
            Bonus2::WeaponAtk => {
                if let Some(sel) = self.select::<WeaponType>(name, key) {
                    self.weapon_atk.add(sel, value);
                }
            }
            Bonus2::HpDrainRate | Bonus2::SpDrainRate => {
                let weapon = self.weapon_mut();
                let drain = if kind == Bonus2::HpDrainRate {
                    &mut weapon.hp_drain
                } else {
                    &mut weapon.sp_drain
                };
                drain.rate = drain.rate.saturating_add(key);
                drain.percent = drain.percent.saturating_add(value);
            }
            Bonus2::SkillAtk => {
                let Some(skill) = self.skill(name, key) else {
                    return;
                };
                if let Some(entry) = self.skill_atk.iter_mut().find(|e| e.skill == skill) {
                    entry.rate = entry.rate.saturating_add(value);
                } else if self
                    .skill_atk
                    .try_push(SkillRate { skill, rate: value })
                    .is_err()
                {
                    self.drop_entry(name);
                }
            }
            Bonus2::HpRegenRate | Bonus2::SpRegenRate | Bonus2::HpLossRate | Bonus2::SpLossRate => {
                let periodic = match kind {
                    Bonus2::HpRegenRate => PeriodicKind::HpRegen,
                    Bonus2::SpRegenRate => PeriodicKind::SpRegen,
                    Bonus2::HpLossRate => PeriodicKind::HpLoss,
                    _ => PeriodicKind::SpLoss,
                };
                let Ok(interval) = u32::try_from(value) else {
                    self.reject(name, "negative interval");
                    return;
                };
                if interval == 0 {
                    self.reject(name, "zero interval");
                    return;
                }
                if let Some(entry) = self.periodic.iter_mut().find(|e| e.kind == periodic) {
                    entry.value = entry.value.saturating_add(key);
                    entry.interval = entry.interval.min(interval);
                } else if self
                    .periodic
                    .try_push(PeriodicBonus {
                        kind: periodic,
                        value: key,
                        interval,
                    })
                    .is_err()
                {
                    self.drop_entry(name);
                }
            }
            Bonus2::GrantSkill => {
                let (Some(skill), Some(level)) = (self.skill(name, key), self.level(name, value))
                else {
                    return;
                };
                if let Some(entry) = self.granted_skills.iter_mut().find(|e| e.skill == skill) {
                    entry.level = entry.level.max(level);
                } else if self
                    .granted_skills
                    .try_push(GrantedSkill { skill, level })
                    .is_err()
                {
                    self.drop_entry(name);
                }
            }
        }
    }

    /// `bonus3(kind, a, b, value)`.
    pub fn bonus3(&mut self, kind: Bonus3, a: i32, b: i32, value: i32) {
        let name: &'static str = kind.into();
        match kind {
            Bonus3::AddEff => {
                let Some(ailment) = Ailment::from_raw(a) else {
                    self.reject(name, &format!("ailment {a} out of range"));
                    return;
                };
                self.push_inflict(name, None, ailment, b, value);
            }
            Bonus3::AutoSpell => {
                let (Some(skill), Some(level)) = (self.skill(name, a), self.level(name, b)) else {
                    return;
                };
                let spell = AutoSpell {
                    trigger: None,
                    skill,
                    level,
                    rate: value,
                    flag: 0,
                };
                self.push_autospell(name, AutoSpellList::OnAttack, spell);
            }
        }
    }

    /// `bonus4(kind, a, b, c, value)`.
    pub fn bonus4(&mut self, kind: Bonus4, a: i32, b: i32, c: i32, value: i32) {
        let name: &'static str = kind.into();
        match kind {
            Bonus4::AddEffOnSkill => {
                let Some(skill) = self.skill(name, a) else {
                    return;
                };
                let Some(ailment) = Ailment::from_raw(b) else {
                    self.reject(name, &format!("ailment {b} out of range"));
                    return;
                };
                self.push_inflict(name, Some(skill), ailment, c, value);
            }
            Bonus4::AutoSpellWhenHit => {
                let (Some(skill), Some(level)) = (self.skill(name, a), self.level(name, b)) else {
                    return;
                };
                let spell = AutoSpell {
                    trigger: None,
                    skill,
                    level,
                    rate: c,
                    flag: value,
                };
                self.push_autospell(name, AutoSpellList::WhenHit, spell);
            }
        }
    }

    /// `bonus5(kind, a, b, c, d, value)`.
    pub fn bonus5(&mut self, kind: Bonus5, a: i32, b: i32, c: i32, d: i32, value: i32) {
        let name: &'static str = kind.into();
        match kind {
            Bonus5::AutoSpellOnSkill => {
                let (Some(trigger), Some(skill), Some(level)) =
                    (self.skill(name, a), self.skill(name, b), self.level(name, c))
                else {
                    return;
                };
                let spell = AutoSpell {
                    trigger: Some(trigger),
                    skill,
                    level,
                    rate: d,
                    flag: value,
                };
                self.push_autospell(name, AutoSpellList::OnSkill, spell);
            }
        }
    }

    /// Registers an autobonus; identical registrations from the same item
    /// collapse into one entry.
    pub fn autobonus(&mut self, script: ScriptId, rate: u16, duration: u64) {
        let spec = AutobonusSpec {
            script,
            rate,
            duration,
            source: self.current_item,
        };
        if self.autobonuses.contains(&spec) {
            return;
        }
        if self.autobonuses.try_push(spec).is_err() {
            self.drop_entry("Autobonus");
        }
    }

    fn push_inflict(
        &mut self,
        name: &'static str,
        skill: Option<SkillId>,
        ailment: Ailment,
        rate: i32,
        duration: i32,
    ) {
        let duration = u32::try_from(duration).unwrap_or(0);
        if let Some(entry) = self
            .add_eff
            .iter_mut()
            .find(|e| e.skill == skill && e.ailment == ailment)
        {
            entry.rate = entry.rate.saturating_add(rate);
            entry.duration = entry.duration.max(duration);
        } else if self
            .add_eff
            .try_push(InflictEffect {
                skill,
                ailment,
                rate,
                duration,
            })
            .is_err()
        {
            self.drop_entry(name);
        }
    }

    fn push_autospell(&mut self, name: &'static str, list: AutoSpellList, spell: AutoSpell) {
        let target = match list {
            AutoSpellList::OnAttack => &mut self.autospell,
            AutoSpellList::WhenHit => &mut self.autospell_when_hit,
            AutoSpellList::OnSkill => &mut self.autospell_on_skill,
        };
        if let Some(entry) = target.iter_mut().find(|e| {
            e.trigger == spell.trigger && e.skill == spell.skill && e.level == spell.level
        }) {
            entry.rate = entry.rate.saturating_add(spell.rate);
            entry.flag |= spell.flag;
            return;
        }
        if target.try_push(spell).is_err() {
            self.drop_entry(name);
        }
    }
}

#[derive(Clone, Copy)]
enum AutoSpellList {
    OnAttack,
    WhenHit,
    OnSkill,
}

//! Primary stats - Layer 1 of the stat system.
//!
//! The six primary attributes are the only stats that are persisted. Each is
//! kept inside `[1, cap]` where the cap comes from the character's job. Raising
//! a stat costs status points following a [`StatCostCurve`].
//!
//! Effective = (Base + Flat) × (1 + %Inc) × More × Less × Clamp

use strum::{EnumCount, EnumIter, FromRepr, IntoEnumIterator, IntoStaticStr};

use super::bonus::{Bonus, BonusStack, StatBounds, StatLayer};

/// Primary attribute identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, FromRepr, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Stat {
    Str,
    Agi,
    Vit,
    Int,
    Dex,
    Luk,
}

impl Stat {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Lowest value any primary stat may hold.
pub const MIN_STAT: u16 = 1;

/// Raw primary stats as allocated by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimaryStats {
    values: [u16; Stat::COUNT],
}

impl PrimaryStats {
    pub const fn uniform(value: u16) -> Self {
        Self {
            values: [value; Stat::COUNT],
        }
    }

    pub const fn from_array(values: [u16; Stat::COUNT]) -> Self {
        Self { values }
    }

    #[inline]
    pub fn get(&self, stat: Stat) -> u16 {
        self.values[stat.index()]
    }

    /// Stores `value` clamped to `[1, caps.get(stat)]` and returns what was stored.
    pub fn set(&mut self, stat: Stat, value: u16, caps: &StatCaps) -> u16 {
        let clamped = value.clamp(MIN_STAT, caps.get(stat).max(MIN_STAT));
        self.values[stat.index()] = clamped;
        clamped
    }

    /// Clamps every stat into its cap. Returns the stats that had to move.
    pub fn clamp_to(&mut self, caps: &StatCaps) -> Vec<Stat> {
        let mut moved = Vec::new();
        for stat in Stat::iter() {
            let before = self.get(stat);
            if self.set(stat, before, caps) != before {
                moved.push(stat);
            }
        }
        moved
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, u16)> + '_ {
        Stat::iter().map(|stat| (stat, self.get(stat)))
    }
}

impl Default for PrimaryStats {
    fn default() -> Self {
        Self::uniform(MIN_STAT)
    }
}

/// Per-class maximum for each primary stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatCaps(pub [u16; Stat::COUNT]);

impl StatCaps {
    pub const fn uniform(cap: u16) -> Self {
        Self([cap; Stat::COUNT])
    }

    #[inline]
    pub fn get(&self, stat: Stat) -> u16 {
        self.0[stat.index()]
    }
}

impl Default for StatCaps {
    fn default() -> Self {
        Self::uniform(99)
    }
}

/// Status-point price of raising a stat by one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatCostCurve {
    /// `cost(v) = (v + 9) / 10` for the step `v → v + 1`.
    #[default]
    Classic,
    /// `table[v - 1]`; values past the end repeat the last entry.
    Table(Vec<u16>),
}

impl StatCostCurve {
    /// Cost of the single step from `value` to `value + 1`.
    pub fn cost(&self, value: u16) -> u32 {
        match self {
            StatCostCurve::Classic => (u32::from(value) + 9) / 10,
            StatCostCurve::Table(table) => {
                let idx = usize::from(value.saturating_sub(1));
                table
                    .get(idx)
                    .or(table.last())
                    .map_or(1, |&cost| u32::from(cost))
            }
        }
    }

    /// Points spent to move a stat from `from` by `delta` steps.
    ///
    /// A negative delta prices the reverse range, which is the refund for
    /// lowering the stat by the same amount.
    pub fn points_needed(&self, from: u16, delta: i32) -> u32 {
        let (low, high) = if delta >= 0 {
            (i64::from(from), i64::from(from) + i64::from(delta))
        } else {
            (
                (i64::from(from) + i64::from(delta)).max(i64::from(MIN_STAT)),
                i64::from(from),
            )
        };
        (low..high)
            .map(|v| self.cost(v.clamp(0, i64::from(u16::MAX)) as u16))
            .sum()
    }

    /// Total points spent to raise a stat from 1 to `value`.
    pub fn spent_on(&self, value: u16) -> u32 {
        self.points_needed(MIN_STAT, i32::from(value) - i32::from(MIN_STAT))
    }

    /// Greedily increments `stat` while `available` covers the next step and
    /// the cap allows it. Returns `(increase, cost)`.
    pub fn max_increase_affordable(
        &self,
        stats: &PrimaryStats,
        caps: &StatCaps,
        stat: Stat,
        available: u32,
    ) -> (u16, u32) {
        let mut value = stats.get(stat);
        let cap = caps.get(stat);
        let mut spent = 0u32;
        let mut increase = 0u16;
        while value < cap {
            let step = self.cost(value);
            if spent + step > available {
                break;
            }
            spent += step;
            value += 1;
            increase += 1;
        }
        (increase, spent)
    }
}

/// Per-stat bonus stacks filled by the accumulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatBonuses {
    stacks: [BonusStack; Stat::COUNT],
}

impl StatBonuses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stat: Stat, bonus: Bonus) {
        self.stacks[stat.index()].add(bonus);
    }

    pub fn add_all(&mut self, bonus: Bonus) {
        for stack in &mut self.stacks {
            stack.add(bonus);
        }
    }

    pub fn stack(&self, stat: Stat) -> &BonusStack {
        &self.stacks[stat.index()]
    }
}

/// Effective primary stats after bonuses. Never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectiveStats {
    values: [i32; Stat::COUNT],
}

impl EffectiveStats {
    #[inline]
    pub fn get(&self, stat: Stat) -> i32 {
        self.values[stat.index()]
    }

    pub fn str(&self) -> i32 {
        self.get(Stat::Str)
    }
    pub fn agi(&self) -> i32 {
        self.get(Stat::Agi)
    }
    pub fn vit(&self) -> i32 {
        self.get(Stat::Vit)
    }
    pub fn int(&self) -> i32 {
        self.get(Stat::Int)
    }
    pub fn dex(&self) -> i32 {
        self.get(Stat::Dex)
    }
    pub fn luk(&self) -> i32 {
        self.get(Stat::Luk)
    }
}

impl StatLayer for EffectiveStats {
    type Base = PrimaryStats;
    type Bonuses = StatBonuses;
    type Final = EffectiveStats;

    fn compute(base: &PrimaryStats, bonuses: &StatBonuses) -> EffectiveStats {
        let bounds = Self::bounds().unwrap_or(StatBounds::UNCLAMPED);
        let mut values = [0; Stat::COUNT];
        for stat in Stat::iter() {
            values[stat.index()] = bonuses.stack(stat).apply(
                i32::from(base.get(stat)),
                bounds.min,
                bounds.max,
            );
        }
        EffectiveStats { values }
    }

    fn empty_bonuses() -> StatBonuses {
        StatBonuses::new()
    }

    fn bounds() -> Option<StatBounds> {
        Some(StatBounds::EFFECTIVE_STATS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_into_class_caps() {
        let caps = StatCaps::uniform(99);
        let mut stats = PrimaryStats::default();
        assert_eq!(stats.set(Stat::Str, 0, &caps), 1);
        assert_eq!(stats.set(Stat::Str, 150, &caps), 99);
        assert_eq!(stats.get(Stat::Str), 99);
    }

    #[test]
    fn classic_cost_of_first_point_is_one() {
        let curve = StatCostCurve::Classic;
        assert_eq!(curve.cost(1), 1);
        assert_eq!(curve.cost(10), 1);
        assert_eq!(curve.cost(11), 2);
        assert_eq!(curve.cost(98), 10);
    }

    #[test]
    fn negative_delta_prices_the_reverse_range() {
        let curve = StatCostCurve::Classic;
        let up = curve.points_needed(9, 4);
        let down = curve.points_needed(13, -4);
        assert_eq!(up, down);
        assert_eq!(up, 1 + 1 + 2 + 2);
    }

    #[test]
    fn table_curve_repeats_last_entry() {
        let curve = StatCostCurve::Table(vec![1, 2, 3]);
        assert_eq!(curve.cost(1), 1);
        assert_eq!(curve.cost(3), 3);
        assert_eq!(curve.cost(50), 3);
    }

    #[test]
    fn affordable_increase_stops_at_budget_and_cap() {
        let curve = StatCostCurve::Classic;
        let stats = PrimaryStats::uniform(9);
        let caps = StatCaps::uniform(12);

        // 9→10 costs 1, 10→11 costs 1, 11→12 costs 2
        assert_eq!(curve.max_increase_affordable(&stats, &caps, Stat::Agi, 3), (2, 2));
        assert_eq!(curve.max_increase_affordable(&stats, &caps, Stat::Agi, 100), (3, 4));
    }

    #[test]
    fn effective_stats_apply_bonus_layers() {
        let base = PrimaryStats::uniform(10);
        let mut bonuses = StatBonuses::new();
        bonuses.add(Stat::Agi, Bonus::flat(10));
        bonuses.add(Stat::Agi, Bonus::increased(50));
        bonuses.add_all(Bonus::flat(1));

        let eff = EffectiveStats::compute(&base, &bonuses);
        assert_eq!(eff.agi(), 31);
        assert_eq!(eff.str(), 11);
    }
}

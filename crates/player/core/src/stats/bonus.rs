//! Layered bonus stack shared by every stat layer.
//!
//! Calculation order: Flat → %Inc → More → Less → Clamp. Equipment and
//! status changes push [`Bonus`] values into per-stat stacks during a
//! recompute pass; the stack is folded once when the layer is computed.

/// A single modifier applied to a stat value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    /// Flat additive bonus (applied first).
    Flat(i32),

    /// Percentage increase, summed with other %Inc before multiplying.
    /// Stored as integer percentage (20 = +20%).
    Increased(i32),

    /// Multiplicative "more" modifier applied on its own (50 = ×1.5).
    More(i32),

    /// Multiplicative "less" modifier applied on its own (10 = ×0.9).
    Less(i32),
}

impl Bonus {
    pub fn flat(value: i32) -> Self {
        Bonus::Flat(value)
    }

    pub fn increased(percent: i32) -> Self {
        Bonus::Increased(percent)
    }

    pub fn more(percent: i32) -> Self {
        Bonus::More(percent)
    }

    pub fn less(percent: i32) -> Self {
        Bonus::Less(percent)
    }
}

/// A collection of bonuses folded in a fixed order.
///
/// ```
/// # use player_core::stats::bonus::{Bonus, BonusStack};
/// let mut stack = BonusStack::new();
/// stack.add(Bonus::flat(5));
/// stack.add(Bonus::increased(20));
/// stack.add(Bonus::increased(15));
/// stack.add(Bonus::more(50));
/// stack.add(Bonus::less(10));
///
/// // clamp((10 + 5) × 1.35 × 1.5 × 0.9, 5, 100) = 27
/// assert_eq!(stack.apply(10, 5, 100), 27);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BonusStack {
    bonuses: Vec<Bonus>,
}

impl BonusStack {
    pub fn new() -> Self {
        Self {
            bonuses: Vec::new(),
        }
    }

    pub fn add(&mut self, bonus: Bonus) {
        self.bonuses.push(bonus);
    }

    pub fn extend(&mut self, bonuses: impl IntoIterator<Item = Bonus>) {
        self.bonuses.extend(bonuses);
    }

    /// Sum of the flat entries, used when only the additive part matters.
    pub fn flat_sum(&self) -> i32 {
        self.bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Flat(v) => Some(*v),
                _ => None,
            })
            .sum()
    }

    /// Folds all bonuses into `base` and clamps the result.
    ///
    /// ```text
    /// result = clamp((base + flat) × (1 + inc/100) × Π more × Π less, min, max)
    /// ```
    ///
    /// Intermediate math is done in `i64` so large rate stacks cannot overflow.
    pub fn apply(&self, base: i32, min: i32, max: i32) -> i32 {
        let flat_sum = i64::from(self.flat_sum());

        let inc_sum: i64 = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Increased(p) => Some(i64::from(*p)),
                _ => None,
            })
            .sum();

        let after_inc = (i64::from(base) + flat_sum) * (100 + inc_sum) / 100;

        let after_more = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::More(p) => Some(i64::from(*p)),
                _ => None,
            })
            .fold(after_inc, |acc, more| acc * (100 + more) / 100);

        let after_less = self
            .bonuses
            .iter()
            .filter_map(|b| match b {
                Bonus::Less(p) => Some(i64::from(*p)),
                _ => None,
            })
            .fold(after_more, |acc, less| acc * (100 - less) / 100);

        after_less.clamp(i64::from(min), i64::from(max)) as i32
    }

    pub fn apply_unclamped(&self, base: i32) -> i32 {
        self.apply(base, i32::MIN, i32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.bonuses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bonuses.len()
    }
}

/// Trait for stat layers that follow the Base → Bonuses → Final pattern.
///
/// ```text
/// Layer 1: PrimaryStats   + StatBonuses → EffectiveStats
/// Layer 2: DerivedInputs  + BonusTable  → BattleStatus
/// ```
pub trait StatLayer {
    type Base;
    type Bonuses;
    type Final;

    fn compute(base: &Self::Base, bonuses: &Self::Bonuses) -> Self::Final;

    fn empty_bonuses() -> Self::Bonuses;

    /// Compute with no bonuses.
    fn from_base(base: &Self::Base) -> Self::Final {
        Self::compute(base, &Self::empty_bonuses())
    }

    fn bounds() -> Option<StatBounds> {
        None
    }
}

/// Clamp bounds for one layer's outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatBounds {
    pub min: i32,
    pub max: i32,
}

impl StatBounds {
    /// Effective primary stats may drop to zero under debuffs.
    pub const EFFECTIVE_STATS: Self = Self { min: 0, max: 32_767 };

    /// Battle values (atk, def, hit, ...).
    pub const BATTLE: Self = Self { min: 0, max: 65_535 };

    pub const UNCLAMPED: Self = Self {
        min: i32::MIN,
        max: i32::MAX,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stack_returns_clamped_base() {
        let stack = BonusStack::new();
        assert_eq!(stack.apply(42, 0, 40), 40);
        assert_eq!(stack.apply_unclamped(42), 42);
    }

    #[test]
    fn increased_bonuses_are_summed_before_multiplying() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::increased(50));
        stack.add(Bonus::increased(50));
        // 10 × (1 + 1.0), not 10 × 1.5 × 1.5
        assert_eq!(stack.apply_unclamped(10), 20);
    }

    #[test]
    fn negative_flat_can_reach_floor() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::flat(-50));
        assert_eq!(stack.apply(10, 0, 100), 0);
    }

    #[test]
    fn large_rates_do_not_overflow() {
        let mut stack = BonusStack::new();
        stack.add(Bonus::more(10_000));
        stack.add(Bonus::more(10_000));
        assert_eq!(stack.apply(i32::MAX / 2, 0, i32::MAX), i32::MAX);
    }
}

//! Engine configuration constants and tunable policy parameters.

use crate::stats::StatCostCurve;

/// Policy knobs and capacities for the attribute & progression engine.
///
/// Every runtime-tunable value is loadable from TOML through the content
/// crate; compile-time capacities size the bounded tables and are exposed as
/// associated constants.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Treat characters that have spent few skill points as a lower class
    /// when resolving the skill tree.
    pub skillup_limit: bool,
    /// Allow quest-only skills to be learned through the tree.
    pub quest_skill_learn: bool,
    /// Allow a single experience gain to grant several levels.
    pub multi_level_up: bool,
    /// Cap for a single gain, per mille of the next-level requirement (0 = off).
    pub max_exp_gain_rate: u32,
    /// Base experience lost on death, in basis points of current experience.
    pub death_penalty_base: u32,
    /// Job experience lost on death, in basis points of current experience.
    pub death_penalty_job: u32,
    /// VIP tier table, indexed by `tier - 1`.
    pub vip_tiers: Vec<VipTierRule>,
    /// Experience penalty bands keyed on `monster_level - base_level`.
    pub level_gap: Vec<LevelGapBand>,
    /// Status points granted when entering an upper (transcendent) class.
    pub upper_stipend: u32,
    /// Status points a freshly created character starts with.
    pub start_status_points: u32,
    /// Group level at which zone and equip restrictions are ignored.
    pub privileged_group_level: u8,
    /// Lowest attack motion delay (fastest attack speed) allowed.
    pub max_aspd_amotion: u32,
    pub max_hp: u32,
    pub max_sp: u32,
    /// Base level a rank-track character needs before its bonus tree unlocks.
    pub ranker_min_level: u16,
    /// Cost of raising a primary stat by one point.
    pub stat_cost: StatCostCurve,
}

/// Bonus and penalty modifiers attached to a VIP tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VipTierRule {
    /// Extra experience, in percent.
    pub exp_bonus: u32,
    /// Percentage of the normal death penalty applied.
    pub penalty_rate: u32,
}

/// Experience rate applied when the level gap falls inside `[min_diff, max_diff]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelGapBand {
    pub min_diff: i32,
    pub max_diff: i32,
    /// Percentage of the experience kept.
    pub rate: u32,
}

impl EngineConfig {
    // ===== compile-time capacities =====
    /// Entries per bounded bonus list (skill damage, inflict effects, ...).
    pub const MAX_PC_BONUS: usize = 16;
    pub const MAX_AUTOSPELL: usize = 15;
    pub const MAX_AUTOBONUS: usize = 8;
    pub const MAX_COMBOS: usize = 16;
    pub const MAX_SKILL_COOLDOWNS: usize = 20;
    pub const MAX_STATUS_CHANGES: usize = 24;
    pub const MAX_INVENTORY: usize = 100;
    pub const MAX_CARD_SLOTS: usize = 4;
    /// Upper bound on skill-tree fixed-point passes.
    pub const MAX_RESOLVE_PASSES: usize = 64;
    /// Natural regeneration period in milliseconds.
    pub const REGEN_INTERVAL: u64 = 6_000;
    /// Walk delay of an unmodified character.
    pub const DEFAULT_WALK_SPEED: u32 = 150;

    pub fn new() -> Self {
        Self {
            skillup_limit: true,
            quest_skill_learn: false,
            multi_level_up: false,
            max_exp_gain_rate: 0,
            death_penalty_base: 100,
            death_penalty_job: 100,
            vip_tiers: vec![
                VipTierRule {
                    exp_bonus: 50,
                    penalty_rate: 50,
                },
                VipTierRule {
                    exp_bonus: 100,
                    penalty_rate: 0,
                },
            ],
            level_gap: default_level_gap(),
            upper_stipend: 52,
            start_status_points: 48,
            privileged_group_level: 60,
            max_aspd_amotion: 100,
            max_hp: 1_000_000,
            max_sp: 1_000_000,
            ranker_min_level: 90,
            stat_cost: StatCostCurve::Classic,
        }
    }

    /// Whether a group level bypasses zone equipment restrictions and learns
    /// every skill.
    pub fn is_privileged(&self, group_level: u8) -> bool {
        group_level >= self.privileged_group_level
    }

    /// VIP modifiers for `tier`, `None` for non-VIP characters.
    pub fn vip(&self, tier: u8) -> Option<&VipTierRule> {
        if tier == 0 {
            return None;
        }
        self.vip_tiers.get(usize::from(tier) - 1)
    }

    /// Experience rate (percent) for a kill `diff` levels above the player.
    pub fn level_gap_rate(&self, diff: i32) -> u32 {
        self.level_gap
            .iter()
            .find(|band| band.min_diff <= diff && diff <= band.max_diff)
            .map_or(100, |band| band.rate)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_level_gap() -> Vec<LevelGapBand> {
    let band = |min_diff, max_diff, rate| LevelGapBand {
        min_diff,
        max_diff,
        rate,
    };
    vec![
        band(16, i32::MAX, 40),
        band(-5, 15, 100),
        band(-10, -6, 95),
        band(-15, -11, 90),
        band(-20, -16, 85),
        band(-30, -21, 60),
        band(i32::MIN, -31, 10),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_gap_bands_cover_extremes() {
        let config = EngineConfig::default();
        assert_eq!(config.level_gap_rate(0), 100);
        assert_eq!(config.level_gap_rate(40), 40);
        assert_eq!(config.level_gap_rate(-8), 95);
        assert_eq!(config.level_gap_rate(-100), 10);
    }

    #[test]
    fn vip_tier_zero_is_not_vip() {
        let config = EngineConfig::default();
        assert!(config.vip(0).is_none());
        assert_eq!(config.vip(1).map(|v| v.exp_bonus), Some(50));
        assert!(config.vip(9).is_none());
    }
}

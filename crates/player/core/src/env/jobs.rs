use bitflags::bitflags;

use crate::state::JobId;
use crate::stats::derived::DEFAULT_AMOTION;
use crate::stats::{Stat, StatCaps, WeaponType};

/// Job metadata and experience tables.
pub trait JobOracle: Send + Sync {
    fn job(&self, id: JobId) -> Option<&JobDefinition>;

    /// Base experience needed to advance from `level` to `level + 1`.
    ///
    /// `None` when the job has no row for `level` (it is at or past its cap).
    fn base_exp_threshold(&self, job: JobId, level: u16) -> Option<u64>;

    /// Job experience needed to advance from `level` to `level + 1`.
    fn job_exp_threshold(&self, job: JobId, level: u16) -> Option<u64>;

    /// Status points awarded on reaching `level`, when a table overrides the
    /// default curve.
    fn status_point_award(&self, _job: JobId, _level: u16) -> Option<u32> {
        None
    }
}

/// Advancement tier of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobTier {
    #[default]
    Novice,
    First,
    Second,
    Third,
}

/// Rebirth line of a job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpperKind {
    #[default]
    Normal,
    Upper,
    Baby,
}

impl UpperKind {
    pub fn mask(self) -> UpperMask {
        match self {
            UpperKind::Normal => UpperMask::NORMAL,
            UpperKind::Upper => UpperMask::UPPER,
            UpperKind::Baby => UpperMask::BABY,
        }
    }
}

bitflags! {
    /// Set of job classes, one bit per class line.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ClassMask: u64 {
        const ALL = !0;
    }
}

impl Default for ClassMask {
    fn default() -> Self {
        ClassMask::ALL
    }
}

bitflags! {
    /// Rebirth lines an item accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct UpperMask: u8 {
        const NORMAL = 1 << 0;
        const UPPER = 1 << 1;
        const BABY = 1 << 2;
        const ALL = Self::NORMAL.bits() | Self::UPPER.bits() | Self::BABY.bits();
    }
}

impl Default for UpperMask {
    fn default() -> Self {
        UpperMask::ALL
    }
}

/// Attack delay of a job with one weapon family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AspdEntry {
    pub weapon: WeaponType,
    pub amotion: u32,
}

/// Stat point granted by the job itself at a given job level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobBonusStep {
    pub job_level: u16,
    pub stat: Stat,
}

/// Static description of one job.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobDefinition {
    pub id: JobId,
    pub name: String,
    pub tier: JobTier,
    pub upper: UpperKind,
    /// The class-line bit items test against.
    pub class_mask: ClassMask,
    /// Job this one was promoted from, used for tree inheritance.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<JobId>,
    pub max_base_level: u16,
    pub max_job_level: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_stats: StatCaps,
    pub hp_per_level: u32,
    pub sp_per_level: u32,
    pub base_weight: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub aspd_base: Vec<AspdEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub job_bonus: Vec<JobBonusStep>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub dual_wield: bool,
    /// A rank-track job whose whole tree is granted once all points are spent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rank_track: Option<JobId>,
}

impl JobDefinition {
    /// Attack delay for `weapon`, falling back to the slowest delay.
    pub fn amotion(&self, weapon: WeaponType) -> u32 {
        self.aspd_base
            .iter()
            .find(|entry| entry.weapon == weapon)
            .map_or(DEFAULT_AMOTION, |entry| entry.amotion)
    }

    /// Whether the job can wield `weapon` at all.
    pub fn can_wield(&self, weapon: WeaponType) -> bool {
        weapon == WeaponType::Fist || self.aspd_base.iter().any(|entry| entry.weapon == weapon)
    }

    /// Job stat bonuses unlocked at `job_level`.
    pub fn job_bonus_at(&self, job_level: u16) -> impl Iterator<Item = Stat> + '_ {
        self.job_bonus
            .iter()
            .filter(move |step| step.job_level <= job_level)
            .map(|step| step.stat)
    }

    pub fn is_novice(&self) -> bool {
        self.tier == JobTier::Novice
    }
}

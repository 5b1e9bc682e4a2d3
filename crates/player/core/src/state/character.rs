use bitflags::bitflags;

use super::common::{AccountId, CharacterId, JobId, ZoneId};
use crate::stats::PrimaryStats;

bitflags! {
    /// Boolean and tiered state of a character.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct StateFlags: u16 {
        const DEAD = 1 << 0;
        const SITTING = 1 << 1;
        const RIDING = 1 << 2;
        const DISGUISED = 1 << 3;
        /// Has reached the ranking that unlocks a rank-track tree.
        const RANKED = 1 << 4;
        /// Carrying at least half of the weight limit.
        const OVERWEIGHT_50 = 1 << 5;
        /// Carrying at least 90% of the weight limit.
        const OVERWEIGHT_90 = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sex {
    Female,
    #[default]
    Male,
}

/// The persistent root entity of a connected player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    pub id: CharacterId,
    pub account: AccountId,
    pub name: String,
    pub sex: Sex,
    pub job: JobId,
    pub base_level: u16,
    pub job_level: u16,
    pub base_exp: u64,
    pub job_exp: u64,
    pub stats: PrimaryStats,
    pub status_points: u32,
    pub skill_points: u32,
    pub hp: u32,
    pub sp: u32,
    pub zone: ZoneId,
    pub flags: StateFlags,
    /// 0 for regular accounts.
    pub vip_tier: u8,
    pub group_level: u8,
    /// Job level held when promoted to a second class, 0 if never.
    pub change_level_2nd: u16,
    /// Job level held when promoted to a third class, 0 if never.
    pub change_level_3rd: u16,
}

impl Character {
    pub fn new(id: CharacterId, account: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            account,
            name: name.into(),
            sex: Sex::default(),
            job: JobId::NOVICE,
            base_level: 1,
            job_level: 1,
            base_exp: 0,
            job_exp: 0,
            stats: PrimaryStats::default(),
            status_points: 0,
            skill_points: 0,
            hp: 1,
            sp: 1,
            zone: ZoneId::default(),
            flags: StateFlags::empty(),
            vip_tier: 0,
            group_level: 0,
            change_level_2nd: 0,
            change_level_3rd: 0,
        }
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.flags.contains(StateFlags::DEAD)
    }

    /// Overweight tier: 0 (none), 1 (≥50%) or 2 (≥90%).
    pub fn overweight_tier(&self) -> u8 {
        if self.flags.contains(StateFlags::OVERWEIGHT_90) {
            2
        } else if self.flags.contains(StateFlags::OVERWEIGHT_50) {
            1
        } else {
            0
        }
    }
}

use bitflags::bitflags;

use crate::state::{JobId, SkillId};

/// Skill database and per-job skill trees.
pub trait SkillOracle: Send + Sync {
    fn skill(&self, id: SkillId) -> Option<&SkillDefinition>;

    /// Flattened tree of `job`, inherited entries included. Empty for unknown jobs.
    fn tree(&self, job: JobId) -> &[SkillTreeEntry];

    /// Every skill in the database, used by the full-privilege grant.
    fn all_skills(&self) -> Vec<&SkillDefinition>;
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SkillFlags: u8 {
        const PASSIVE = 1 << 0;
        /// Learned from a quest, never through the tree by default.
        const QUEST = 1 << 1;
        const WEDDING = 1 << 2;
        /// Monster-only skill.
        const NPC = 1 << 3;
        const GUILD = 1 << 4;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub max_level: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: SkillFlags,
}

impl SkillDefinition {
    pub fn is_quest(&self) -> bool {
        self.flags.contains(SkillFlags::QUEST)
    }

    /// Wedding and quest skills are outside the ordinary tree.
    pub fn is_special(&self) -> bool {
        self.flags.intersects(SkillFlags::QUEST | SkillFlags::WEDDING)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillRequirement {
    pub skill: SkillId,
    pub level: u8,
}

/// One entry of a job's skill tree.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillTreeEntry {
    pub skill: SkillId,
    pub max_level: u8,
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_level: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub job_level: u16,
    #[cfg_attr(feature = "serde", serde(default))]
    pub prerequisites: Vec<SkillRequirement>,
    /// Only grantable while a soul link for this job is active.
    #[cfg_attr(feature = "serde", serde(default))]
    pub linked_to: Option<JobId>,
}

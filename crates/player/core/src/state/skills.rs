//! Per-character skill record.
//!
//! Every known skill carries an explicit origin. Only permanent levels cost
//! skill points; only permanent, granted and plagiarized levels persist.

use std::collections::{BTreeMap, BTreeSet};

use super::common::SkillId;

/// Where a non-persistent skill level came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemporarySource {
    /// Granted by an equipped item's script.
    Item,
    /// The rank-track bonus tree.
    RankTrack,
    /// Full-privilege accounts.
    Privilege,
}

/// Level and origin of one known skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillLevel {
    /// Learned with skill points.
    Permanent(u8),
    /// Granted outright, ignoring the tree.
    Granted(u8),
    /// Exists only while its source is active.
    Temporary { level: u8, source: TemporarySource },
    /// Copied from another player.
    Plagiarized(u8),
    /// A permanent level temporarily raised; `original` is restored on removal.
    OverriddenFrom {
        original: u8,
        current: u8,
        source: TemporarySource,
    },
}

impl SkillLevel {
    /// Level usable right now.
    pub fn level(self) -> u8 {
        match self {
            SkillLevel::Permanent(l) | SkillLevel::Granted(l) | SkillLevel::Plagiarized(l) => l,
            SkillLevel::Temporary { level, .. } => level,
            SkillLevel::OverriddenFrom { current, .. } => current,
        }
    }

    /// Level that counts toward prerequisites.
    pub fn known_level(self) -> u8 {
        match self {
            SkillLevel::Permanent(l) | SkillLevel::Granted(l) => l,
            SkillLevel::OverriddenFrom { original, .. } => original,
            SkillLevel::Temporary { .. } | SkillLevel::Plagiarized(_) => 0,
        }
    }

    /// Level paid for with skill points.
    pub fn spent_level(self) -> u8 {
        match self {
            SkillLevel::Permanent(l) => l,
            SkillLevel::OverriddenFrom { original, .. } => original,
            _ => 0,
        }
    }

    /// Form stored in a snapshot, `None` when the level does not persist.
    pub fn persisted(self) -> Option<SkillLevel> {
        match self {
            SkillLevel::Permanent(_) | SkillLevel::Granted(_) | SkillLevel::Plagiarized(_) => {
                Some(self)
            }
            SkillLevel::OverriddenFrom { original, .. } if original > 0 => {
                Some(SkillLevel::Permanent(original))
            }
            _ => None,
        }
    }

    pub fn temporary_source(self) -> Option<TemporarySource> {
        match self {
            SkillLevel::Temporary { source, .. } | SkillLevel::OverriddenFrom { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Known skills plus the set of skills the tree currently offers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillRecord {
    known: BTreeMap<SkillId, SkillLevel>,
    /// Tree entries whose requirements are met; derived, rebuilt by the resolver.
    #[cfg_attr(feature = "serde", serde(skip))]
    available: BTreeSet<SkillId>,
}

impl SkillRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, skill: SkillId) -> Option<SkillLevel> {
        self.known.get(&skill).copied()
    }

    pub fn level(&self, skill: SkillId) -> u8 {
        self.get(skill).map_or(0, SkillLevel::level)
    }

    pub fn known_level(&self, skill: SkillId) -> u8 {
        self.get(skill).map_or(0, SkillLevel::known_level)
    }

    pub fn set(&mut self, skill: SkillId, level: SkillLevel) {
        self.known.insert(skill, level);
    }

    pub fn remove(&mut self, skill: SkillId) -> Option<SkillLevel> {
        self.known.remove(&skill)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillId, SkillLevel)> + '_ {
        self.known.iter().map(|(id, level)| (*id, *level))
    }

    pub fn is_available(&self, skill: SkillId) -> bool {
        self.available.contains(&skill)
    }

    pub fn available(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.available.iter().copied()
    }

    pub(crate) fn set_available(&mut self, available: BTreeSet<SkillId>) {
        self.available = available;
    }

    /// Sum of levels bought with skill points.
    pub fn spent_points(&self) -> u32 {
        self.known
            .values()
            .map(|level| u32::from(level.spent_level()))
            .sum()
    }

    /// Drops every level from `source`, restoring overridden originals.
    pub fn clear_temporary(&mut self, source: TemporarySource) {
        self.known.retain(|_, level| match *level {
            SkillLevel::Temporary { source: s, .. } => s != source,
            _ => true,
        });
        for level in self.known.values_mut() {
            if let SkillLevel::OverriddenFrom {
                original,
                source: s,
                ..
            } = *level
                && s == source
            {
                *level = SkillLevel::Permanent(original);
            }
        }
    }

    /// Raises `skill` to at least `level` from a temporary source without
    /// touching the persisted level.
    pub fn apply_temporary(&mut self, skill: SkillId, level: u8, source: TemporarySource) {
        match self.get(skill) {
            None => self.set(skill, SkillLevel::Temporary { level, source }),
            Some(SkillLevel::Permanent(original)) if original < level => self.set(
                skill,
                SkillLevel::OverriddenFrom {
                    original,
                    current: level,
                    source,
                },
            ),
            Some(SkillLevel::Temporary { level: current, .. }) if current < level => {
                self.set(skill, SkillLevel::Temporary { level, source })
            }
            Some(SkillLevel::OverriddenFrom {
                original, current, ..
            }) if current < level => self.set(
                skill,
                SkillLevel::OverriddenFrom {
                    original,
                    current: level,
                    source,
                },
            ),
            _ => {}
        }
    }

    /// Currently plagiarized skill, if any.
    pub fn plagiarized(&self) -> Option<(SkillId, u8)> {
        self.known.iter().find_map(|(id, level)| match level {
            SkillLevel::Plagiarized(l) => Some((*id, *l)),
            _ => None,
        })
    }
}

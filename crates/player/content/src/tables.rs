//! In-memory oracle implementations over loaded reference data.
//!
//! Tables are built once at startup and shared read-only by every session.

use std::collections::HashMap;

use player_core::env::{
    ComboDefinition, ComboOracle, ItemDefinition, ItemOracle, JobDefinition, JobOracle,
    SkillDefinition, SkillOracle, SkillTreeEntry, ZoneDefinition, ZoneOracle,
};
use player_core::state::{ComboId, ItemId, JobId, SkillId, ZoneId};
use tracing::warn;

/// Experience requirements shared by a group of jobs.
///
/// Row `n` holds the experience needed to go from level `n + 1` to `n + 2`.
/// The row of the max level is kept so progress can be pinned just below it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpGroup {
    pub jobs: Vec<JobId>,
    pub base: Vec<u64>,
    pub job: Vec<u64>,
    /// Status points awarded on reaching each base level, indexed like `base`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub status_points: Vec<u32>,
}

fn row<T: Copy>(table: &[T], level: u16) -> Option<T> {
    let index = usize::from(level.checked_sub(1)?);
    table.get(index).copied()
}

/// Job definitions plus their experience groups.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: HashMap<JobId, JobDefinition>,
    groups: Vec<ExpGroup>,
    group_of: HashMap<JobId, usize>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_job(&mut self, def: JobDefinition) {
        self.jobs.insert(def.id, def);
    }

    pub fn add_exp_group(&mut self, group: ExpGroup) {
        let index = self.groups.len();
        for job in &group.jobs {
            if self.group_of.insert(*job, index).is_some() {
                warn!(job = %job, "job listed in several experience groups; last one wins");
            }
        }
        self.groups.push(group);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobDefinition> {
        self.jobs.values()
    }

    fn group(&self, job: JobId) -> Option<&ExpGroup> {
        self.group_of.get(&job).and_then(|&i| self.groups.get(i))
    }

    /// Rows past the job's cap are hidden even when the shared group is longer.
    fn capped(&self, job: JobId, level: u16, max: impl Fn(&JobDefinition) -> u16) -> bool {
        self.jobs.get(&job).is_some_and(|def| level <= max(def))
    }
}

impl JobOracle for JobTable {
    fn job(&self, id: JobId) -> Option<&JobDefinition> {
        self.jobs.get(&id)
    }

    fn base_exp_threshold(&self, job: JobId, level: u16) -> Option<u64> {
        if !self.capped(job, level, |def| def.max_base_level) {
            return None;
        }
        row(&self.group(job)?.base, level)
    }

    fn job_exp_threshold(&self, job: JobId, level: u16) -> Option<u64> {
        if !self.capped(job, level, |def| def.max_job_level) {
            return None;
        }
        row(&self.group(job)?.job, level)
    }

    fn status_point_award(&self, job: JobId, level: u16) -> Option<u32> {
        row(&self.group(job)?.status_points, level)
    }
}

/// Item database.
#[derive(Debug, Default)]
pub struct ItemTable {
    items: HashMap<ItemId, ItemDefinition>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_definition(&mut self, def: ItemDefinition) {
        self.items.insert(def.id, def);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemOracle for ItemTable {
    fn item(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }
}

/// Tree entries declared by one job, before inheritance is applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeSpec {
    pub job: JobId,
    pub entries: Vec<SkillTreeEntry>,
}

/// Skill database and flattened per-job trees.
#[derive(Debug, Default)]
pub struct SkillTable {
    skills: HashMap<SkillId, SkillDefinition>,
    trees: HashMap<JobId, Vec<SkillTreeEntry>>,
}

impl SkillTable {
    /// Builds the table, flattening every job's tree with the entries of its
    /// parent chain. A job's own entry overrides an inherited one for the
    /// same skill.
    pub fn new(
        skills: impl IntoIterator<Item = SkillDefinition>,
        trees: impl IntoIterator<Item = TreeSpec>,
        jobs: &JobTable,
    ) -> Self {
        let declared: HashMap<JobId, Vec<SkillTreeEntry>> = trees
            .into_iter()
            .map(|spec| (spec.job, spec.entries))
            .collect();

        let mut flattened = HashMap::new();
        for def in jobs.iter() {
            let mut chain = vec![def.id];
            let mut cursor = def.parent;
            while let Some(parent) = cursor {
                if chain.contains(&parent) {
                    warn!(job = %def.id, parent = %parent, "cyclic job parents; tree truncated");
                    break;
                }
                chain.push(parent);
                cursor = jobs.job(parent).and_then(|p| p.parent);
            }

            let mut tree: Vec<SkillTreeEntry> = Vec::new();
            for job in chain.iter().rev() {
                for entry in declared.get(job).into_iter().flatten() {
                    match tree.iter_mut().find(|e| e.skill == entry.skill) {
                        Some(existing) => *existing = entry.clone(),
                        None => tree.push(entry.clone()),
                    }
                }
            }
            flattened.insert(def.id, tree);
        }

        Self {
            skills: skills.into_iter().map(|def| (def.id, def)).collect(),
            trees: flattened,
        }
    }
}

impl SkillOracle for SkillTable {
    fn skill(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.skills.get(&id)
    }

    fn tree(&self, job: JobId) -> &[SkillTreeEntry] {
        self.trees.get(&job).map_or(&[], Vec::as_slice)
    }

    fn all_skills(&self) -> Vec<&SkillDefinition> {
        let mut all: Vec<_> = self.skills.values().collect();
        all.sort_by_key(|def| def.id);
        all
    }
}

#[derive(Debug, Default)]
pub struct ComboTable {
    combos: HashMap<ComboId, ComboDefinition>,
}

impl ComboTable {
    pub fn new(combos: impl IntoIterator<Item = ComboDefinition>) -> Self {
        Self {
            combos: combos.into_iter().map(|def| (def.id, def)).collect(),
        }
    }
}

impl ComboOracle for ComboTable {
    fn combo(&self, id: ComboId) -> Option<&ComboDefinition> {
        self.combos.get(&id)
    }
}

#[derive(Debug, Default)]
pub struct ZoneTable {
    zones: HashMap<ZoneId, ZoneDefinition>,
}

impl ZoneTable {
    pub fn new(zones: impl IntoIterator<Item = ZoneDefinition>) -> Self {
        Self {
            zones: zones.into_iter().map(|def| (def.id, def)).collect(),
        }
    }
}

impl ZoneOracle for ZoneTable {
    fn zone(&self, id: ZoneId) -> Option<&ZoneDefinition> {
        self.zones.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::env::{JobTier, SkillFlags, UpperKind};
    use player_core::stats::StatCaps;

    fn job(id: u16, parent: Option<u16>, max_job_level: u16) -> JobDefinition {
        JobDefinition {
            id: JobId(id),
            name: format!("job{id}"),
            tier: JobTier::First,
            upper: UpperKind::Normal,
            class_mask: Default::default(),
            parent: parent.map(JobId),
            max_base_level: 3,
            max_job_level,
            max_stats: StatCaps::default(),
            hp_per_level: 5,
            sp_per_level: 1,
            base_weight: 20_000,
            aspd_base: Vec::new(),
            job_bonus: Vec::new(),
            dual_wield: false,
            rank_track: None,
        }
    }

    fn entry(skill: u16, max_level: u8) -> SkillTreeEntry {
        SkillTreeEntry {
            skill: SkillId(skill),
            max_level,
            base_level: 0,
            job_level: 0,
            prerequisites: Vec::new(),
            linked_to: None,
        }
    }

    #[test]
    fn thresholds_stop_at_the_job_cap() {
        let mut jobs = JobTable::new();
        jobs.add_job(job(1, None, 2));
        jobs.add_exp_group(ExpGroup {
            jobs: vec![JobId(1)],
            base: vec![10, 20, 30, 40],
            job: vec![5, 6, 7],
            status_points: Vec::new(),
        });

        assert_eq!(jobs.base_exp_threshold(JobId(1), 1), Some(10));
        assert_eq!(jobs.base_exp_threshold(JobId(1), 3), Some(30));
        assert_eq!(jobs.base_exp_threshold(JobId(1), 4), None);
        assert_eq!(jobs.job_exp_threshold(JobId(1), 2), Some(6));
        assert_eq!(jobs.job_exp_threshold(JobId(1), 3), None);
        assert_eq!(jobs.base_exp_threshold(JobId(1), 0), None);
        assert_eq!(jobs.status_point_award(JobId(1), 2), None);
    }

    #[test]
    fn trees_inherit_from_parents() {
        let mut jobs = JobTable::new();
        jobs.add_job(job(0, None, 10));
        jobs.add_job(job(1, Some(0), 50));
        jobs.add_job(job(7, Some(1), 50));

        let skills = [SkillDefinition {
            id: SkillId(1),
            name: "Basic".into(),
            max_level: 9,
            flags: SkillFlags::empty(),
        }];
        let trees = [
            TreeSpec {
                job: JobId(0),
                entries: vec![entry(1, 9)],
            },
            TreeSpec {
                job: JobId(1),
                entries: vec![entry(2, 10), entry(5, 10)],
            },
            TreeSpec {
                job: JobId(7),
                entries: vec![entry(5, 5), entry(55, 10)],
            },
        ];
        let table = SkillTable::new(skills, trees, &jobs);

        let knight: Vec<_> = table
            .tree(JobId(7))
            .iter()
            .map(|e| (e.skill.0, e.max_level))
            .collect();
        assert_eq!(knight, vec![(1, 9), (2, 10), (5, 5), (55, 10)]);
        assert_eq!(table.tree(JobId(0)).len(), 1);
        assert!(table.tree(JobId(99)).is_empty());
        assert_eq!(table.all_skills().len(), 1);
    }
}

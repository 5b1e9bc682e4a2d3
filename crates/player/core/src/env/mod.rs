//! Traits describing read-only reference data.
//!
//! Oracles expose job metadata, item and skill databases, combo patterns,
//! zones and the script boundary. The [`Env`] aggregate bundles them so the
//! engine can reach everything it needs without depending on concrete tables.
mod error;
mod items;
mod jobs;
mod scripts;
mod skills;
mod zones;

pub use error::OracleError;
pub use items::{
    ArmorData, ItemDefinition, ItemKind, ItemOracle, LevelRange, SexRestriction, WeaponData,
    ZoneRestriction,
};
pub use jobs::{
    AspdEntry, ClassMask, JobBonusStep, JobDefinition, JobOracle, JobTier, UpperKind, UpperMask,
};
pub use scripts::{ScriptContext, ScriptEffect, ScriptEngine, ScriptItem, ScriptPhase, run_hook};
pub use skills::{SkillDefinition, SkillFlags, SkillOracle, SkillRequirement, SkillTreeEntry};
pub use zones::{ComboDefinition, ComboOracle, ZoneDefinition, ZoneFlags, ZoneOracle};

/// Aggregates the read-only oracles required by the engine.
pub struct Env<'a, J, I, S, C, Z, X>
where
    J: JobOracle + ?Sized,
    I: ItemOracle + ?Sized,
    S: SkillOracle + ?Sized,
    C: ComboOracle + ?Sized,
    Z: ZoneOracle + ?Sized,
    X: ScriptEngine + ?Sized,
{
    jobs: Option<&'a J>,
    items: Option<&'a I>,
    skills: Option<&'a S>,
    combos: Option<&'a C>,
    zones: Option<&'a Z>,
    scripts: Option<&'a X>,
}

impl<J, I, S, C, Z, X> Clone for Env<'_, J, I, S, C, Z, X>
where
    J: JobOracle + ?Sized,
    I: ItemOracle + ?Sized,
    S: SkillOracle + ?Sized,
    C: ComboOracle + ?Sized,
    Z: ZoneOracle + ?Sized,
    X: ScriptEngine + ?Sized,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<J, I, S, C, Z, X> Copy for Env<'_, J, I, S, C, Z, X>
where
    J: JobOracle + ?Sized,
    I: ItemOracle + ?Sized,
    S: SkillOracle + ?Sized,
    C: ComboOracle + ?Sized,
    Z: ZoneOracle + ?Sized,
    X: ScriptEngine + ?Sized,
{
}

pub type PlayerEnv<'a> = Env<
    'a,
    dyn JobOracle + 'a,
    dyn ItemOracle + 'a,
    dyn SkillOracle + 'a,
    dyn ComboOracle + 'a,
    dyn ZoneOracle + 'a,
    dyn ScriptEngine + 'a,
>;

impl<'a, J, I, S, C, Z, X> Env<'a, J, I, S, C, Z, X>
where
    J: JobOracle + ?Sized,
    I: ItemOracle + ?Sized,
    S: SkillOracle + ?Sized,
    C: ComboOracle + ?Sized,
    Z: ZoneOracle + ?Sized,
    X: ScriptEngine + ?Sized,
{
    pub fn new(
        jobs: Option<&'a J>,
        items: Option<&'a I>,
        skills: Option<&'a S>,
        combos: Option<&'a C>,
        zones: Option<&'a Z>,
        scripts: Option<&'a X>,
    ) -> Self {
        Self {
            jobs,
            items,
            skills,
            combos,
            zones,
            scripts,
        }
    }

    pub fn with_all(
        jobs: &'a J,
        items: &'a I,
        skills: &'a S,
        combos: &'a C,
        zones: &'a Z,
        scripts: &'a X,
    ) -> Self {
        Self::new(
            Some(jobs),
            Some(items),
            Some(skills),
            Some(combos),
            Some(zones),
            Some(scripts),
        )
    }

    /// # Errors
    ///
    /// Returns `OracleError::JobsNotAvailable` if no job oracle was provided.
    pub fn jobs(&self) -> Result<&'a J, OracleError> {
        self.jobs.ok_or(OracleError::JobsNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::ItemsNotAvailable` if no item oracle was provided.
    pub fn items(&self) -> Result<&'a I, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::SkillsNotAvailable` if no skill oracle was provided.
    pub fn skills(&self) -> Result<&'a S, OracleError> {
        self.skills.ok_or(OracleError::SkillsNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::CombosNotAvailable` if no combo oracle was provided.
    pub fn combos(&self) -> Result<&'a C, OracleError> {
        self.combos.ok_or(OracleError::CombosNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::ZonesNotAvailable` if no zone oracle was provided.
    pub fn zones(&self) -> Result<&'a Z, OracleError> {
        self.zones.ok_or(OracleError::ZonesNotAvailable)
    }

    /// # Errors
    ///
    /// Returns `OracleError::ScriptsNotAvailable` if no script engine was provided.
    pub fn scripts(&self) -> Result<&'a X, OracleError> {
        self.scripts.ok_or(OracleError::ScriptsNotAvailable)
    }
}

impl<'a> PlayerEnv<'a> {
    /// Convenience lookup that fails with a typed error on unknown jobs.
    pub fn job(&self, id: crate::state::JobId) -> Result<&'a JobDefinition, OracleError> {
        self.jobs()?.job(id).ok_or(OracleError::JobNotFound(id))
    }

    pub fn item(&self, id: crate::state::ItemId) -> Result<&'a ItemDefinition, OracleError> {
        self.items()?.item(id).ok_or(OracleError::ItemNotFound(id))
    }

    pub fn skill(&self, id: crate::state::SkillId) -> Result<&'a SkillDefinition, OracleError> {
        self.skills()?.skill(id).ok_or(OracleError::SkillNotFound(id))
    }

    /// Zone metadata, `None` when unknown. An unknown zone carries no
    /// restrictions.
    pub fn zone(&self, id: crate::state::ZoneId) -> Option<&'a ZoneDefinition> {
        self.zones().ok().and_then(|zones| zones.zone(id))
    }
}

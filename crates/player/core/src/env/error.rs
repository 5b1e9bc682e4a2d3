//! Oracle access errors.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{ComboId, ItemId, JobId, ScriptId, SkillId, ZoneId};

/// Errors that occur when reading reference data.
///
/// A missing oracle means the engine was wired incorrectly; a missing entry
/// means a command referenced an id the content tables do not know.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    #[error("JobOracle not available")]
    JobsNotAvailable,

    #[error("ItemOracle not available")]
    ItemsNotAvailable,

    #[error("SkillOracle not available")]
    SkillsNotAvailable,

    #[error("ComboOracle not available")]
    CombosNotAvailable,

    #[error("ZoneOracle not available")]
    ZonesNotAvailable,

    #[error("ScriptEngine not available")]
    ScriptsNotAvailable,

    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("skill {0} not found")]
    SkillNotFound(SkillId),

    #[error("combo {0:?} not found")]
    ComboNotFound(ComboId),

    #[error("zone {0:?} not found")]
    ZoneNotFound(ZoneId),

    #[error("script {0:?} not found")]
    ScriptNotFound(ScriptId),

    /// A script ran but could not complete.
    #[error("script {script:?} failed: {reason}")]
    ScriptFailed { script: ScriptId, reason: String },
}

impl GameError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        use OracleError::*;
        match self {
            JobsNotAvailable | ItemsNotAvailable | SkillsNotAvailable | CombosNotAvailable
            | ZonesNotAvailable | ScriptsNotAvailable => ErrorSeverity::Fatal,

            JobNotFound(_) | ItemNotFound(_) | SkillNotFound(_) | ComboNotFound(_)
            | ZoneNotFound(_) | ScriptNotFound(_) => ErrorSeverity::Validation,

            ScriptFailed { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use OracleError::*;
        match self {
            JobsNotAvailable => "ORACLE_JOBS_NOT_AVAILABLE",
            ItemsNotAvailable => "ORACLE_ITEMS_NOT_AVAILABLE",
            SkillsNotAvailable => "ORACLE_SKILLS_NOT_AVAILABLE",
            CombosNotAvailable => "ORACLE_COMBOS_NOT_AVAILABLE",
            ZonesNotAvailable => "ORACLE_ZONES_NOT_AVAILABLE",
            ScriptsNotAvailable => "ORACLE_SCRIPTS_NOT_AVAILABLE",
            JobNotFound(_) => "ORACLE_JOB_NOT_FOUND",
            ItemNotFound(_) => "ORACLE_ITEM_NOT_FOUND",
            SkillNotFound(_) => "ORACLE_SKILL_NOT_FOUND",
            ComboNotFound(_) => "ORACLE_COMBO_NOT_FOUND",
            ZoneNotFound(_) => "ORACLE_ZONE_NOT_FOUND",
            ScriptNotFound(_) => "ORACLE_SCRIPT_NOT_FOUND",
            ScriptFailed { .. } => "ORACLE_SCRIPT_FAILED",
        }
    }
}

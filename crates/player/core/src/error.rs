//! Common error infrastructure for player-core.
//!
//! This module provides the shared classification and [`DenyReason`], the
//! reason code every declined command carries. Oracle failures live in
//! `env::OracleError`; the command-level wrapper is `engine::CommandError`.
//!
//! # Design Principles
//!
//! - **Recoverable by construction**: no mutation in the engine has a fatal
//!   outcome; every error leaves the character in a consistent state
//! - **Severity Classification**: errors are categorized for logging and
//!   client feedback
//! - **Stable codes**: every variant maps to a static reason code that the
//!   transport layer forwards verbatim

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the player may retry once the precondition holds.
    ///
    /// Examples: not enough status points, item level too high
    Recoverable,

    /// Validation error - the request itself is malformed.
    ///
    /// Examples: unknown inventory index, unknown job id
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// These indicate bugs and should be investigated.
    Internal,

    /// Fatal error - state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all player-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Why a command was declined. Always recoverable: the character is left
/// exactly as it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DenyReason {
    #[error("character is dead")]
    Dead,

    #[error("base level outside the item's range")]
    EquipLevelRange,

    #[error("item is restricted to the other sex")]
    EquipSex,

    #[error("job cannot use this item")]
    EquipClass,

    #[error("class tier cannot use this item")]
    EquipUpper,

    #[error("item is restricted in this zone")]
    EquipZone,

    #[error("an active status forbids equipment changes")]
    EquipStatus,

    #[error("no slot matches the requested position")]
    EquipNoSlot,

    #[error("item cannot be equipped")]
    NotEquippable,

    #[error("no item at that inventory index")]
    NoSuchItem,

    #[error("item is already equipped")]
    AlreadyEquipped,

    #[error("staged item can no longer be equipped")]
    StagedMismatch,

    #[error("inventory is full")]
    InventoryFull,

    #[error("not enough status points")]
    InsufficientStatPoints,

    #[error("stat is already at its maximum")]
    StatAtMax,

    #[error("not enough skill points")]
    InsufficientSkillPoints,

    #[error("skill is not learnable")]
    SkillNotLearnable,

    #[error("skill is already at its maximum level")]
    SkillAtMax,

    #[error("already that job")]
    SameJob,

    #[error("unknown job")]
    JobNotFound,

    #[error("item is not consumable")]
    NotConsumable,

    #[error("too many active status changes")]
    StatusCapacity,

    #[error("no such autobonus")]
    AutobonusNotFound,
}

impl GameError for DenyReason {
    fn severity(&self) -> ErrorSeverity {
        match self {
            DenyReason::NoSuchItem | DenyReason::JobNotFound | DenyReason::AutobonusNotFound => {
                ErrorSeverity::Validation
            }
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use DenyReason::*;
        match self {
            Dead => "CHAR_DEAD",
            EquipLevelRange => "EQUIP_LEVEL_RANGE",
            EquipSex => "EQUIP_SEX",
            EquipClass => "EQUIP_CLASS",
            EquipUpper => "EQUIP_UPPER",
            EquipZone => "EQUIP_ZONE",
            EquipStatus => "EQUIP_STATUS",
            EquipNoSlot => "EQUIP_NO_SLOT",
            NotEquippable => "EQUIP_NOT_EQUIPPABLE",
            NoSuchItem => "ITEM_NOT_FOUND",
            AlreadyEquipped => "EQUIP_ALREADY_EQUIPPED",
            StagedMismatch => "EQUIP_STAGED_MISMATCH",
            InventoryFull => "ITEM_INVENTORY_FULL",
            InsufficientStatPoints => "STAT_INSUFFICIENT_POINTS",
            StatAtMax => "STAT_AT_MAX",
            InsufficientSkillPoints => "SKILL_INSUFFICIENT_POINTS",
            SkillNotLearnable => "SKILL_NOT_LEARNABLE",
            SkillAtMax => "SKILL_AT_MAX",
            SameJob => "JOB_SAME",
            JobNotFound => "JOB_NOT_FOUND",
            NotConsumable => "ITEM_NOT_CONSUMABLE",
            StatusCapacity => "STATUS_CAPACITY",
            AutobonusNotFound => "AUTOBONUS_NOT_FOUND",
        }
    }
}

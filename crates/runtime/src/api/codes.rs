//! Numeric result codes for the wire.
//!
//! Clients receive one `u16` per command. Codes are stable: new reasons get
//! new numbers and retired ones are never reused.

use player_core::{CommandError, DenyReason};

use super::errors::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ResultCode {
    Ok = 0,

    Dead = 1,
    EquipLevelRange = 10,
    EquipSex = 11,
    EquipClass = 12,
    EquipUpper = 13,
    EquipZone = 14,
    EquipStatus = 15,
    EquipNoSlot = 16,
    NotEquippable = 17,
    AlreadyEquipped = 18,
    StagedMismatch = 19,
    NoSuchItem = 20,
    InventoryFull = 21,
    NotConsumable = 22,
    InsufficientStatPoints = 30,
    StatAtMax = 31,
    InsufficientSkillPoints = 40,
    SkillNotLearnable = 41,
    SkillAtMax = 42,
    SameJob = 50,
    JobNotFound = 51,
    StatusCapacity = 60,
    AutobonusNotFound = 61,

    /// Reference data missing or malformed.
    ContentError = 100,
    NotLoggedIn = 200,
    AlreadyLoggedIn = 201,
    CharacterNotFound = 202,
    /// Anything the client cannot act on: closed channels, storage failures.
    Internal = 255,
}

impl ResultCode {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, ResultCode::Ok)
    }
}

impl From<DenyReason> for ResultCode {
    fn from(reason: DenyReason) -> Self {
        use DenyReason::*;
        match reason {
            Dead => ResultCode::Dead,
            EquipLevelRange => ResultCode::EquipLevelRange,
            EquipSex => ResultCode::EquipSex,
            EquipClass => ResultCode::EquipClass,
            EquipUpper => ResultCode::EquipUpper,
            EquipZone => ResultCode::EquipZone,
            EquipStatus => ResultCode::EquipStatus,
            EquipNoSlot => ResultCode::EquipNoSlot,
            NotEquippable => ResultCode::NotEquippable,
            NoSuchItem => ResultCode::NoSuchItem,
            AlreadyEquipped => ResultCode::AlreadyEquipped,
            StagedMismatch => ResultCode::StagedMismatch,
            InventoryFull => ResultCode::InventoryFull,
            InsufficientStatPoints => ResultCode::InsufficientStatPoints,
            StatAtMax => ResultCode::StatAtMax,
            InsufficientSkillPoints => ResultCode::InsufficientSkillPoints,
            SkillNotLearnable => ResultCode::SkillNotLearnable,
            SkillAtMax => ResultCode::SkillAtMax,
            SameJob => ResultCode::SameJob,
            JobNotFound => ResultCode::JobNotFound,
            NotConsumable => ResultCode::NotConsumable,
            StatusCapacity => ResultCode::StatusCapacity,
            AutobonusNotFound => ResultCode::AutobonusNotFound,
        }
    }
}

impl From<&CommandError> for ResultCode {
    fn from(err: &CommandError) -> Self {
        match err {
            CommandError::Denied(reason) => (*reason).into(),
            CommandError::Oracle(_) => ResultCode::ContentError,
        }
    }
}

impl From<&RuntimeError> for ResultCode {
    fn from(err: &RuntimeError) -> Self {
        match err {
            RuntimeError::Command(err) => err.into(),
            RuntimeError::NotLoggedIn(_) => ResultCode::NotLoggedIn,
            RuntimeError::AlreadyLoggedIn(_) => ResultCode::AlreadyLoggedIn,
            RuntimeError::CharacterNotFound(_) => ResultCode::CharacterNotFound,
            _ => ResultCode::Internal,
        }
    }
}

impl<T> From<&Result<T, RuntimeError>> for ResultCode {
    fn from(result: &Result<T, RuntimeError>) -> Self {
        result.as_ref().map_or_else(ResultCode::from, |_| ResultCode::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_core::{CharacterId, OracleError};

    #[test]
    fn denials_keep_their_own_codes() {
        let err = RuntimeError::Command(CommandError::Denied(DenyReason::EquipLevelRange));
        assert_eq!(ResultCode::from(&err).as_u16(), 10);
        assert_eq!(
            ResultCode::from(&CommandError::Oracle(OracleError::ScriptsNotAvailable)),
            ResultCode::ContentError
        );
    }

    #[test]
    fn session_errors_map_to_session_codes() {
        let ok: Result<(), RuntimeError> = Ok(());
        assert!(ResultCode::from(&ok).is_ok());

        let missing: Result<(), RuntimeError> = Err(RuntimeError::NotLoggedIn(CharacterId(3)));
        assert_eq!(ResultCode::from(&missing), ResultCode::NotLoggedIn);
        assert_eq!(
            ResultCode::from(&RuntimeError::CommandChannelClosed),
            ResultCode::Internal
        );
    }
}

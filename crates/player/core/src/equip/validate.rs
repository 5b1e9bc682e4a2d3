//! Equip preconditions.

use crate::config::EngineConfig;
use crate::env::{ItemDefinition, JobDefinition, ZoneDefinition, ZoneFlags};
use crate::error::DenyReason;
use crate::state::{Character, EquipPoints};

/// Slots `item` may occupy for a wearer of `job`.
///
/// Dual-wield jobs may hold a one-handed weapon in either hand.
pub fn effective_points(item: &ItemDefinition, job: &JobDefinition) -> EquipPoints {
    let mut points = item.equip_points;
    if let Some(weapon) = item.weapon()
        && !weapon.two_handed
        && job.dual_wield
        && weapon.kind.is_dual_wieldable()
        && points.contains(EquipPoints::HAND_R)
    {
        points |= EquipPoints::HAND_L;
    }
    points
}

/// Checks that depend only on the wearer: level range, sex, class and tier.
pub fn check_wearer(
    character: &Character,
    item: &ItemDefinition,
    job: &JobDefinition,
) -> Result<(), DenyReason> {
    if !item.is_equippable() {
        return Err(DenyReason::NotEquippable);
    }
    if !item.level_range.contains(character.base_level) {
        return Err(DenyReason::EquipLevelRange);
    }
    if !item.sex.allows(character.sex) {
        return Err(DenyReason::EquipSex);
    }
    if !item.class_mask.intersects(job.class_mask) {
        return Err(DenyReason::EquipClass);
    }
    if let Some(weapon) = item.weapon()
        && !job.can_wield(weapon.kind)
    {
        return Err(DenyReason::EquipClass);
    }
    if !item.upper_mask.intersects(job.upper.mask()) {
        return Err(DenyReason::EquipUpper);
    }
    Ok(())
}

/// Whether `item` is disabled in `zone`. Privileged characters ignore zone
/// restrictions.
pub fn restricted_in_zone(
    item: &ItemDefinition,
    zone: Option<&ZoneDefinition>,
    privileged: bool,
) -> bool {
    !privileged && zone.is_some_and(|zone| item.zone_restriction.intersects(zone.restrictions))
}

/// Whether the zone forbids equipment changes for this character.
pub fn zone_locks_equipment(zone: Option<&ZoneDefinition>, privileged: bool) -> bool {
    !privileged && zone.is_some_and(|zone| zone.flags.contains(ZoneFlags::NO_EQUIP_CHANGE))
}

/// Every precondition except slot availability and status locks.
pub fn check_equippable(
    character: &Character,
    item: &ItemDefinition,
    job: &JobDefinition,
    zone: Option<&ZoneDefinition>,
    config: &EngineConfig,
) -> Result<(), DenyReason> {
    if character.is_dead() {
        return Err(DenyReason::Dead);
    }
    check_wearer(character, item, job)?;
    let privileged = config.is_privileged(character.group_level);
    if restricted_in_zone(item, zone, privileged) || zone_locks_equipment(zone, privileged) {
        return Err(DenyReason::EquipZone);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{LevelRange, SexRestriction, ZoneRestriction};
    use crate::state::{JobId, Sex, ZoneId};
    use crate::testkit::{self, items, jobs};

    fn character(job: JobId, level: u16) -> Character {
        let mut character = testkit::character();
        character.job = job;
        character.base_level = level;
        character
    }

    #[test]
    fn wearer_checks_run_in_order() {
        let swordman = testkit::job(jobs::SWORDMAN);
        let mut helm = testkit::item(items::HELM).clone();

        helm.level_range = LevelRange {
            min: 50,
            max: None,
        };
        assert_eq!(
            check_wearer(&character(jobs::SWORDMAN, 10), &helm, swordman),
            Err(DenyReason::EquipLevelRange)
        );

        helm.level_range = LevelRange::default();
        helm.sex = SexRestriction::Female;
        let mut male = character(jobs::SWORDMAN, 10);
        male.sex = Sex::Male;
        assert_eq!(
            check_wearer(&male, &helm, swordman),
            Err(DenyReason::EquipSex)
        );
    }

    #[test]
    fn class_mask_and_weapon_table_both_gate_weapons() {
        let novice = testkit::job(jobs::NOVICE);
        let sword = testkit::item(items::TWO_HAND_SWORD);
        assert_eq!(
            check_wearer(&character(jobs::NOVICE, 10), sword, novice),
            Err(DenyReason::EquipClass)
        );
    }

    #[test]
    fn dual_wield_jobs_may_use_the_left_hand() {
        let assassin = testkit::job(jobs::ASSASSIN);
        let swordman = testkit::job(jobs::SWORDMAN);
        let knife = testkit::item(items::KNIFE);
        assert!(effective_points(knife, assassin).contains(EquipPoints::HAND_L));
        assert!(!effective_points(knife, swordman).contains(EquipPoints::HAND_L));
    }

    #[test]
    fn privileged_characters_ignore_zone_rules() {
        let zone = ZoneDefinition {
            id: ZoneId(9),
            name: "arena".into(),
            restrictions: ZoneRestriction::PVP,
            flags: ZoneFlags::empty(),
        };
        let mut item = testkit::item(items::HELM).clone();
        item.zone_restriction = ZoneRestriction::PVP;
        assert!(restricted_in_zone(&item, Some(&zone), false));
        assert!(!restricted_in_zone(&item, Some(&zone), true));
        assert!(!restricted_in_zone(&item, None, false));
    }
}

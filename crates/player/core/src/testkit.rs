//! In-memory oracles and a small reference database shared by unit tests.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::config::EngineConfig;
use crate::engine::PlayerEngine;
use crate::env::{
    ArmorData, AspdEntry, ClassMask, ComboDefinition, ComboOracle, ItemDefinition, ItemKind,
    ItemOracle, JobBonusStep, JobDefinition, JobOracle, JobTier, LevelRange, OracleError,
    PlayerEnv, ScriptContext, ScriptEngine, SkillDefinition, SkillFlags, SkillOracle,
    SkillRequirement, SkillTreeEntry, UpperKind, UpperMask, WeaponData, ZoneDefinition, ZoneFlags,
    ZoneOracle, ZoneRestriction,
};
use crate::state::{
    AccountId, Character, CharacterId, CharacterSnapshot, ComboId, EquipPoints, InventoryItem,
    ItemId, JobId, PlayerState, ScriptId, SkillId, StatusKind, Tick, ZoneId,
};
use crate::stats::{Bonus1, Bonus2, Stat, StatCaps, WeaponType};

pub mod jobs {
    use crate::state::JobId;

    pub const NOVICE: JobId = JobId(0);
    pub const SWORDMAN: JobId = JobId(1);
    pub const THIEF: JobId = JobId(6);
    pub const KNIGHT: JobId = JobId(7);
    pub const ASSASSIN: JobId = JobId(12);
    pub const LORD_KNIGHT: JobId = JobId(4008);
    pub const TAEKWON: JobId = JobId(4046);
}

pub mod skills {
    use crate::state::SkillId;

    pub const BASIC: SkillId = SkillId(1);
    pub const SWORD_MASTERY: SkillId = SkillId(2);
    pub const TWO_HAND_MASTERY: SkillId = SkillId(3);
    pub const BASH: SkillId = SkillId(5);
    pub const MAGNUM_BREAK: SkillId = SkillId(7);
    pub const DOUBLE_ATTACK: SkillId = SkillId(48);
    pub const SPEAR_MASTERY: SkillId = SkillId(55);
    pub const PIERCE: SkillId = SkillId(56);
    pub const KATAR_MASTERY: SkillId = SkillId(134);
    pub const SONIC_BLOW: SkillId = SkillId(136);
    pub const FIRST_AID: SkillId = SkillId(142);
    pub const SPIRIT_BLADE: SkillId = SkillId(400);
    pub const TK_RUN: SkillId = SkillId(411);
    pub const TK_STORM: SkillId = SkillId(412);
    pub const NPC_POWERUP: SkillId = SkillId(900);
}

pub mod items {
    use crate::state::ItemId;

    pub const RED_POTION: ItemId = ItemId(501);
    pub const BLESS_SCROLL: ItemId = ItemId(12216);
    pub const SWORD: ItemId = ItemId(1101);
    pub const TWO_HAND_SWORD: ItemId = ItemId(1151);
    pub const KNIFE: ItemId = ItemId(1201);
    pub const BOW: ItemId = ItemId(1701);
    pub const ARROW: ItemId = ItemId(1750);
    pub const GUARD: ItemId = ItemId(2101);
    pub const HELM: ItemId = ItemId(2228);
    pub const SHIRT: ItemId = ItemId(2301);
    pub const CLIP: ItemId = ItemId(2607);
    pub const RING: ItemId = ItemId(2621);
    pub const ANDRE_CARD: ItemId = ItemId(4043);
    pub const PECO_CARD: ItemId = ItemId(4031);
    pub const COSTUME_HAT: ItemId = ItemId(19500);
}

pub mod combos {
    use crate::state::ComboId;

    /// Helm + clip.
    pub const PAIR: ComboId = ComboId(1);
    /// Helm + clip + ring.
    pub const TRIO: ComboId = ComboId(2);
    /// Two clips.
    pub const TWIN_CLIPS: ComboId = ComboId(3);
}

pub mod zones {
    use crate::state::ZoneId;

    pub const TOWN: ZoneId = ZoneId(0);
    pub const ARENA: ZoneId = ZoneId(1);
    pub const SIEGE: ZoneId = ZoneId(2);
}

pub mod scripts {
    use crate::state::ScriptId;

    pub const SLAYER: ScriptId = ScriptId(1);
    pub const HELM: ScriptId = ScriptId(2);
    pub const CLIP: ScriptId = ScriptId(3);
    pub const RING: ScriptId = ScriptId(4);
    pub const ANDRE: ScriptId = ScriptId(5);
    pub const PECO: ScriptId = ScriptId(6);
    pub const COSTUME: ScriptId = ScriptId(7);
    pub const PAIR: ScriptId = ScriptId(10);
    pub const TRIO: ScriptId = ScriptId(11);
    pub const TWIN_CLIPS: ScriptId = ScriptId(12);
    pub const RED_POTION: ScriptId = ScriptId(20);
    pub const BLESS_SCROLL: ScriptId = ScriptId(21);
    pub const FURY: ScriptId = ScriptId(30);
    pub const BROKEN: ScriptId = ScriptId(99);
}

type Script = fn(&mut ScriptContext<'_>);

/// Reference tables implementing every oracle.
pub struct Fixture {
    jobs: BTreeMap<JobId, JobDefinition>,
    items: BTreeMap<ItemId, ItemDefinition>,
    skills: BTreeMap<SkillId, SkillDefinition>,
    trees: BTreeMap<JobId, Vec<SkillTreeEntry>>,
    combos: BTreeMap<ComboId, ComboDefinition>,
    zones: BTreeMap<ZoneId, ZoneDefinition>,
    scripts: BTreeMap<ScriptId, Script>,
}

impl JobOracle for Fixture {
    fn job(&self, id: JobId) -> Option<&JobDefinition> {
        self.jobs.get(&id)
    }

    fn base_exp_threshold(&self, job: JobId, level: u16) -> Option<u64> {
        let max = self.jobs.get(&job)?.max_base_level;
        (level >= 1 && level <= max).then(|| u64::from(level) * 100)
    }

    fn job_exp_threshold(&self, job: JobId, level: u16) -> Option<u64> {
        let max = self.jobs.get(&job)?.max_job_level;
        (level >= 1 && level <= max).then(|| u64::from(level) * 50)
    }
}

impl ItemOracle for Fixture {
    fn item(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }
}

impl SkillOracle for Fixture {
    fn skill(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.skills.get(&id)
    }

    fn tree(&self, job: JobId) -> &[SkillTreeEntry] {
        self.trees.get(&job).map_or(&[], Vec::as_slice)
    }

    fn all_skills(&self) -> Vec<&SkillDefinition> {
        self.skills.values().collect()
    }
}

impl ComboOracle for Fixture {
    fn combo(&self, id: ComboId) -> Option<&ComboDefinition> {
        self.combos.get(&id)
    }
}

impl ZoneOracle for Fixture {
    fn zone(&self, id: ZoneId) -> Option<&ZoneDefinition> {
        self.zones.get(&id)
    }
}

impl ScriptEngine for Fixture {
    fn run(&self, script: ScriptId, ctx: &mut ScriptContext<'_>) -> Result<(), OracleError> {
        if script == scripts::BROKEN {
            return Err(OracleError::ScriptFailed {
                script,
                reason: "syntax error".into(),
            });
        }
        let body = self
            .scripts
            .get(&script)
            .ok_or(OracleError::ScriptNotFound(script))?;
        body(ctx);
        Ok(())
    }
}

pub fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(build)
}

pub fn env() -> PlayerEnv<'static> {
    let f = fixture();
    PlayerEnv::with_all(f, f, f, f, f, f)
}

pub fn config() -> &'static EngineConfig {
    static CONFIG: OnceLock<EngineConfig> = OnceLock::new();
    CONFIG.get_or_init(EngineConfig::default)
}

pub fn job(id: JobId) -> &'static JobDefinition {
    &fixture().jobs[&id]
}

pub fn item(id: ItemId) -> &'static ItemDefinition {
    &fixture().items[&id]
}

/// A fresh level-1 novice.
pub fn character() -> Character {
    Character::new(CharacterId(1), AccountId(1), "Tester")
}

/// A logged-in character with `job` at the given levels.
pub fn player(job: JobId, base_level: u16, job_level: u16) -> PlayerState {
    let mut character = character();
    character.job = job;
    character.base_level = base_level;
    character.job_level = job_level;
    login(CharacterSnapshot::new(character))
}

pub fn login(snapshot: CharacterSnapshot) -> PlayerState {
    let (state, _) = PlayerEngine::login(snapshot, env(), config(), Tick::ZERO)
        .expect("fixture character logs in");
    state
}

/// Adds `item` to the inventory and returns its index.
pub fn give(state: &mut PlayerState, item: InventoryItem) -> crate::state::InventoryIndex {
    state.inventory.add(item).expect("inventory has room")
}

fn class_bit(bit: u32) -> ClassMask {
    ClassMask::from_bits_retain(1 << bit)
}

fn job_def(
    id: JobId,
    name: &str,
    tier: JobTier,
    upper: UpperKind,
    class_mask: ClassMask,
    parent: Option<JobId>,
) -> JobDefinition {
    JobDefinition {
        id,
        name: name.into(),
        tier,
        upper,
        class_mask,
        parent,
        max_base_level: 99,
        max_job_level: if tier == JobTier::Novice { 10 } else { 50 },
        max_stats: StatCaps::default(),
        hp_per_level: 5,
        sp_per_level: 1,
        base_weight: 20_000,
        aspd_base: vec![
            AspdEntry {
                weapon: WeaponType::Fist,
                amotion: 500,
            },
            AspdEntry {
                weapon: WeaponType::Dagger,
                amotion: 650,
            },
        ],
        job_bonus: Vec::new(),
        dual_wield: false,
        rank_track: None,
    }
}

fn entry(skill: SkillId, max_level: u8, job_level: u16, prerequisites: &[(SkillId, u8)]) -> SkillTreeEntry {
    SkillTreeEntry {
        skill,
        max_level,
        base_level: 0,
        job_level,
        prerequisites: prerequisites
            .iter()
            .map(|&(skill, level)| SkillRequirement { skill, level })
            .collect(),
        linked_to: None,
    }
}

fn skill_def(id: SkillId, name: &str, max_level: u8, flags: SkillFlags) -> SkillDefinition {
    SkillDefinition {
        id,
        name: name.into(),
        max_level,
        flags,
    }
}

fn gear(id: ItemId, name: &str, kind: ItemKind, points: EquipPoints) -> ItemDefinition {
    ItemDefinition {
        id,
        name: name.into(),
        kind,
        equip_points: points,
        weight: 100,
        level_range: LevelRange::default(),
        sex: Default::default(),
        class_mask: ClassMask::ALL,
        upper_mask: UpperMask::ALL,
        zone_restriction: ZoneRestriction::empty(),
        equip_script: None,
        unequip_script: None,
        use_script: None,
        combos: Vec::new(),
        slots: 1,
        refineable: true,
    }
}

fn weapon(kind: WeaponType, atk: u32, weapon_level: u8, two_handed: bool) -> ItemKind {
    ItemKind::Weapon(WeaponData {
        kind,
        atk,
        weapon_level,
        two_handed,
    })
}

fn armor(def: i32, mdef: i32) -> ItemKind {
    ItemKind::Armor(ArmorData { def, mdef })
}

fn build() -> Fixture {
    use self::{combos as c, items as i, jobs as j, scripts as s, skills as k};

    let swords = class_bit(1) | class_bit(2);
    let mut jobs = BTreeMap::new();

    let novice = job_def(j::NOVICE, "Novice", JobTier::Novice, UpperKind::Normal, class_bit(0), None);
    jobs.insert(j::NOVICE, novice);

    let mut swordman = job_def(
        j::SWORDMAN,
        "Swordman",
        JobTier::First,
        UpperKind::Normal,
        class_bit(1),
        Some(j::NOVICE),
    );
    swordman.hp_per_level = 7;
    swordman.sp_per_level = 2;
    swordman.aspd_base.extend([
        AspdEntry {
            weapon: WeaponType::OneHandSword,
            amotion: 550,
        },
        AspdEntry {
            weapon: WeaponType::TwoHandSword,
            amotion: 600,
        },
    ]);
    swordman.job_bonus = vec![
        JobBonusStep {
            job_level: 2,
            stat: Stat::Str,
        },
        JobBonusStep {
            job_level: 6,
            stat: Stat::Vit,
        },
    ];
    jobs.insert(j::SWORDMAN, swordman.clone());

    let mut knight = swordman.clone();
    knight.id = j::KNIGHT;
    knight.name = "Knight".into();
    knight.tier = JobTier::Second;
    knight.class_mask = class_bit(2);
    knight.parent = Some(j::SWORDMAN);
    jobs.insert(j::KNIGHT, knight.clone());

    let mut lord_knight = knight.clone();
    lord_knight.id = j::LORD_KNIGHT;
    lord_knight.name = "Lord Knight".into();
    lord_knight.upper = UpperKind::Upper;
    jobs.insert(j::LORD_KNIGHT, lord_knight);

    let thief = job_def(
        j::THIEF,
        "Thief",
        JobTier::First,
        UpperKind::Normal,
        class_bit(3),
        Some(j::NOVICE),
    );
    jobs.insert(j::THIEF, thief.clone());

    let mut assassin = thief;
    assassin.id = j::ASSASSIN;
    assassin.name = "Assassin".into();
    assassin.tier = JobTier::Second;
    assassin.class_mask = class_bit(4);
    assassin.parent = Some(j::THIEF);
    assassin.dual_wield = true;
    assassin.aspd_base.push(AspdEntry {
        weapon: WeaponType::Katar,
        amotion: 500,
    });
    jobs.insert(j::ASSASSIN, assassin);

    let mut taekwon = job_def(
        j::TAEKWON,
        "Taekwon",
        JobTier::First,
        UpperKind::Normal,
        class_bit(5),
        Some(j::NOVICE),
    );
    taekwon.rank_track = Some(j::TAEKWON);
    jobs.insert(j::TAEKWON, taekwon);

    let mut skills = BTreeMap::new();
    for def in [
        skill_def(k::BASIC, "Basic Skill", 9, SkillFlags::empty()),
        skill_def(k::SWORD_MASTERY, "Sword Mastery", 10, SkillFlags::PASSIVE),
        skill_def(k::TWO_HAND_MASTERY, "Two-Hand Mastery", 10, SkillFlags::PASSIVE),
        skill_def(k::BASH, "Bash", 10, SkillFlags::empty()),
        skill_def(k::MAGNUM_BREAK, "Magnum Break", 10, SkillFlags::empty()),
        skill_def(k::DOUBLE_ATTACK, "Double Attack", 10, SkillFlags::PASSIVE),
        skill_def(k::SPEAR_MASTERY, "Spear Mastery", 10, SkillFlags::PASSIVE),
        skill_def(k::PIERCE, "Pierce", 10, SkillFlags::empty()),
        skill_def(k::KATAR_MASTERY, "Katar Mastery", 10, SkillFlags::PASSIVE),
        skill_def(k::SONIC_BLOW, "Sonic Blow", 10, SkillFlags::empty()),
        skill_def(k::FIRST_AID, "First Aid", 1, SkillFlags::QUEST),
        skill_def(k::SPIRIT_BLADE, "Spirit Blade", 5, SkillFlags::empty()),
        skill_def(k::TK_RUN, "Running", 10, SkillFlags::empty()),
        skill_def(k::TK_STORM, "Tornado Stance", 7, SkillFlags::empty()),
        skill_def(k::NPC_POWERUP, "Power Up", 5, SkillFlags::NPC),
    ] {
        skills.insert(def.id, def);
    }

    let novice_tree = vec![entry(k::BASIC, 9, 1, &[]), entry(k::FIRST_AID, 1, 1, &[])];
    let mut swordman_tree = novice_tree.clone();
    swordman_tree.extend([
        entry(k::SWORD_MASTERY, 10, 1, &[]),
        entry(k::TWO_HAND_MASTERY, 10, 1, &[(k::SWORD_MASTERY, 1)]),
        entry(k::BASH, 10, 1, &[]),
        entry(k::MAGNUM_BREAK, 10, 5, &[(k::BASH, 5)]),
    ]);
    let mut knight_tree = swordman_tree.clone();
    knight_tree.extend([
        entry(k::SPEAR_MASTERY, 10, 1, &[]),
        entry(k::PIERCE, 10, 1, &[(k::SPEAR_MASTERY, 1)]),
        SkillTreeEntry {
            linked_to: Some(j::KNIGHT),
            ..entry(k::SPIRIT_BLADE, 5, 1, &[])
        },
    ]);
    let mut thief_tree = novice_tree.clone();
    thief_tree.push(entry(k::DOUBLE_ATTACK, 10, 1, &[]));
    let mut assassin_tree = thief_tree.clone();
    assassin_tree.extend([
        entry(k::KATAR_MASTERY, 10, 1, &[]),
        entry(k::SONIC_BLOW, 10, 1, &[(k::KATAR_MASTERY, 4)]),
    ]);
    let mut taekwon_tree = novice_tree.clone();
    taekwon_tree.extend([
        entry(k::TK_RUN, 10, 1, &[]),
        entry(k::TK_STORM, 7, 1, &[(k::TK_RUN, 7)]),
    ]);

    let mut trees = BTreeMap::new();
    trees.insert(j::NOVICE, novice_tree);
    trees.insert(j::SWORDMAN, swordman_tree);
    trees.insert(j::KNIGHT, knight_tree.clone());
    trees.insert(j::LORD_KNIGHT, knight_tree);
    trees.insert(j::THIEF, thief_tree);
    trees.insert(j::ASSASSIN, assassin_tree);
    trees.insert(j::TAEKWON, taekwon_tree);

    let mut items = BTreeMap::new();
    let mut add = |def: ItemDefinition| {
        items.insert(def.id, def);
    };

    let mut sword = gear(i::SWORD, "Sword", weapon(WeaponType::OneHandSword, 25, 1, false), EquipPoints::HAND_R);
    sword.class_mask = swords | class_bit(4);
    sword.weight = 500;
    add(sword);

    let mut slayer = gear(
        i::TWO_HAND_SWORD,
        "Slayer",
        weapon(WeaponType::TwoHandSword, 60, 2, true),
        EquipPoints::HANDS,
    );
    slayer.class_mask = swords;
    slayer.equip_script = Some(s::SLAYER);
    slayer.weight = 1_500;
    add(slayer);

    let mut knife = gear(i::KNIFE, "Knife", weapon(WeaponType::Dagger, 17, 1, false), EquipPoints::HAND_R);
    knife.weight = 40;
    knife.combos = Vec::new();
    add(knife);

    let mut bow = gear(i::BOW, "Bow", weapon(WeaponType::Bow, 15, 1, false), EquipPoints::HAND_R);
    bow.class_mask = class_bit(6);
    add(bow);

    add(gear(i::ARROW, "Arrow", ItemKind::Ammo { atk: 25 }, EquipPoints::AMMO));
    add(gear(i::GUARD, "Guard", armor(3, 0), EquipPoints::HAND_L));

    let mut helm = gear(i::HELM, "Helm", armor(2, 0), EquipPoints::HEAD_TOP);
    helm.equip_script = Some(s::HELM);
    helm.combos = vec![c::PAIR, c::TRIO];
    add(helm);

    add(gear(i::SHIRT, "Cotton Shirt", armor(1, 0), EquipPoints::ARMOR));

    let mut clip = gear(i::CLIP, "Clip", armor(0, 0), EquipPoints::ACC);
    clip.equip_script = Some(s::CLIP);
    clip.combos = vec![c::PAIR, c::TRIO, c::TWIN_CLIPS];
    clip.weight = 10;
    add(clip);

    let mut ring = gear(i::RING, "Ring", armor(0, 0), EquipPoints::ACC);
    ring.equip_script = Some(s::RING);
    ring.combos = vec![c::TRIO];
    ring.weight = 10;
    add(ring);

    let mut andre = gear(i::ANDRE_CARD, "Andre Card", ItemKind::Card, EquipPoints::HAND_R);
    andre.equip_script = Some(s::ANDRE);
    andre.weight = 1;
    add(andre);

    let mut peco = gear(i::PECO_CARD, "Peco Card", ItemKind::Card, EquipPoints::ARMOR);
    peco.equip_script = Some(s::PECO);
    peco.weight = 1;
    add(peco);

    let mut costume = gear(i::COSTUME_HAT, "Costume Hat", armor(0, 0), EquipPoints::COSTUME_HEAD_TOP);
    costume.equip_script = Some(s::COSTUME);
    add(costume);

    let mut potion = gear(i::RED_POTION, "Red Potion", ItemKind::Consumable, EquipPoints::empty());
    potion.use_script = Some(s::RED_POTION);
    potion.weight = 70;
    add(potion);

    let mut scroll = gear(i::BLESS_SCROLL, "Blessing Scroll", ItemKind::Consumable, EquipPoints::empty());
    scroll.use_script = Some(s::BLESS_SCROLL);
    scroll.weight = 10;
    add(scroll);

    let mut combos = BTreeMap::new();
    for (id, members, script) in [
        (c::PAIR, vec![i::HELM, i::CLIP], s::PAIR),
        (c::TRIO, vec![i::HELM, i::CLIP, i::RING], s::TRIO),
        (c::TWIN_CLIPS, vec![i::CLIP, i::CLIP], s::TWIN_CLIPS),
    ] {
        combos.insert(id, ComboDefinition { id, members, script });
    }

    let mut zones = BTreeMap::new();
    for zone in [
        ZoneDefinition {
            id: zones::TOWN,
            name: "prontera".into(),
            restrictions: ZoneRestriction::TOWN,
            flags: ZoneFlags::empty(),
        },
        ZoneDefinition {
            id: zones::ARENA,
            name: "arena".into(),
            restrictions: ZoneRestriction::PVP,
            flags: ZoneFlags::NO_EXP_PENALTY,
        },
        ZoneDefinition {
            id: zones::SIEGE,
            name: "siege".into(),
            restrictions: ZoneRestriction::GVG,
            flags: ZoneFlags::NO_EQUIP_CHANGE,
        },
    ] {
        zones.insert(zone.id, zone);
    }

    let mut scripts: BTreeMap<ScriptId, Script> = BTreeMap::new();
    scripts.insert(s::SLAYER, |ctx| {
        ctx.bonus(Bonus1::Str, 2);
        if ctx.refine() >= 5 {
            ctx.bonus(Bonus1::Atk, 10);
        }
        ctx.autobonus(s::FURY, 100, 5_000);
    });
    scripts.insert(s::HELM, |ctx| ctx.bonus(Bonus1::Vit, 1));
    scripts.insert(s::CLIP, |ctx| ctx.bonus(Bonus1::MaxSp, 10));
    scripts.insert(s::RING, |ctx| ctx.bonus(Bonus1::Str, 2));
    scripts.insert(s::ANDRE, |ctx| ctx.bonus(Bonus1::Atk, 20));
    scripts.insert(s::PECO, |ctx| ctx.bonus(Bonus1::MaxHpRate, 10));
    scripts.insert(s::COSTUME, |ctx| ctx.bonus(Bonus1::Str, 50));
    scripts.insert(s::PAIR, |ctx| ctx.bonus(Bonus1::Def, 5));
    scripts.insert(s::TRIO, |ctx| {
        ctx.bonus(Bonus1::AllStats, 1);
        ctx.grant_skill(k::BASH, 3);
    });
    scripts.insert(s::TWIN_CLIPS, |ctx| ctx.bonus(Bonus1::MaxSp, 50));
    scripts.insert(s::RED_POTION, |ctx| ctx.heal(45, 0));
    scripts.insert(s::BLESS_SCROLL, |ctx| {
        ctx.start_status(StatusKind::Blessing, 10, 240_000)
    });
    scripts.insert(s::FURY, |ctx| {
        ctx.bonus(Bonus1::AspdRate, 10);
        ctx.bonus2(Bonus2::AddRace, 10, 5);
    });

    Fixture {
        jobs,
        items,
        skills,
        trees,
        combos,
        zones,
        scripts,
    }
}

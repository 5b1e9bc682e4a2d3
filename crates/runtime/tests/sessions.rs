//! Session lifecycle against the shipped content and both repositories.

use std::path::PathBuf;
use std::sync::Arc;

use player_core::{
    AccountId, Character, CharacterId, CharacterSnapshot, DenyReason, ExpReward, InventoryItem,
    ItemId, JobId, Notification, PlayerCommand, Stat, StatusKind, Tick, TimerId,
};
use runtime::{
    CharacterRepository, Event, FileCharacterRepository, InMemoryCharacterRepository,
    OracleManager, PlayerEvent, RepositoryError, ResultCode, Runtime, RuntimeConfig,
    RuntimeError, SessionEvent, Topic,
};
use tokio::sync::broadcast;

const KNIGHT: CharacterId = CharacterId(7);

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../player/content/data")
}

fn knight() -> CharacterSnapshot {
    let mut character = Character::new(KNIGHT, AccountId(7), "Tristan");
    character.job = JobId(7);
    character.base_level = 60;
    character.job_level = 30;
    character.status_points = 5;
    CharacterSnapshot::new(character)
}

fn start(repository: Arc<dyn CharacterRepository>) -> Runtime {
    let (oracles, engine) = OracleManager::load(data_dir()).expect("shipped data loads");
    Runtime::builder()
        .content(oracles)
        .repository(repository)
        .config(RuntimeConfig {
            engine,
            autosave_interval: None,
            ..RuntimeConfig::default()
        })
        .build()
        .expect("runtime builds")
}

fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Notification> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Player(PlayerEvent { notification, .. }) = event {
            seen.push(notification);
        }
    }
    seen
}

struct ReadOnlyRepository(InMemoryCharacterRepository);

impl CharacterRepository for ReadOnlyRepository {
    fn save(&self, _snapshot: &CharacterSnapshot) -> runtime::repository::Result<()> {
        Err(RepositoryError::Io(std::io::Error::other("disk full")))
    }

    fn load(&self, id: CharacterId) -> runtime::repository::Result<Option<CharacterSnapshot>> {
        self.0.load(id)
    }

    fn exists(&self, id: CharacterId) -> bool {
        self.0.exists(id)
    }

    fn delete(&self, id: CharacterId) -> runtime::repository::Result<()> {
        self.0.delete(id)
    }

    fn list(&self) -> runtime::repository::Result<Vec<CharacterId>> {
        self.0.list()
    }
}

#[tokio::test]
async fn progress_survives_logout_and_relogin() {
    let dir = tempfile::tempdir().unwrap();
    let repository = Arc::new(FileCharacterRepository::new(dir.path()).unwrap());
    repository.save(&knight()).unwrap();

    let runtime = start(repository.clone());
    let handle = runtime.handle();
    let mut peers = handle.subscribe(Topic::Peers);

    handle.login(KNIGHT).await.unwrap();
    handle
        .execute(KNIGHT, PlayerCommand::GainExperience(ExpReward::raw(1_000_000, 0)))
        .await
        .unwrap();
    handle
        .execute(
            KNIGHT,
            PlayerCommand::AllocateStat {
                stat: Stat::Str,
                amount: 1,
            },
        )
        .await
        .unwrap();
    assert!(drain(&mut peers).contains(&Notification::BaseLevelUp { level: 61 }));

    let saved = handle.logout(KNIGHT).await.unwrap();
    assert!(handle.sessions().await.unwrap().is_empty());

    let stored = repository.load(KNIGHT).unwrap().unwrap();
    assert_eq!(stored, saved);
    assert!(stored.character.base_level > 60);

    handle.login(KNIGHT).await.unwrap();
    assert_eq!(handle.snapshot(KNIGHT).await.unwrap(), Some(saved));

    drop(handle);
    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn session_errors_carry_result_codes() {
    let repository = Arc::new(InMemoryCharacterRepository::with_snapshots([knight()]));
    let runtime = start(repository);
    let handle = runtime.handle();

    let missing = handle.login(CharacterId(99)).await;
    assert!(matches!(missing, Err(RuntimeError::CharacterNotFound(_))));
    assert_eq!(ResultCode::from(&missing), ResultCode::CharacterNotFound);

    let offline = handle.execute(KNIGHT, PlayerCommand::SetSitting(true)).await;
    assert_eq!(ResultCode::from(&offline), ResultCode::NotLoggedIn);

    handle.login(KNIGHT).await.unwrap();
    assert!(matches!(
        handle.login(KNIGHT).await,
        Err(RuntimeError::AlreadyLoggedIn(_))
    ));

    let denied = handle.execute(KNIGHT, PlayerCommand::ChangeJob(JobId(7))).await;
    let reason = denied
        .as_ref()
        .err()
        .and_then(RuntimeError::command)
        .and_then(|err| err.deny_reason());
    assert_eq!(reason, Some(DenyReason::SameJob));
    assert_eq!(ResultCode::from(&denied), ResultCode::SameJob);
}

#[tokio::test]
async fn advancing_the_clock_expires_statuses() {
    let repository = Arc::new(InMemoryCharacterRepository::with_snapshots([knight()]));
    let runtime = start(repository);
    let handle = runtime.handle();
    let mut own = handle.subscribe(Topic::Player);

    handle.login(KNIGHT).await.unwrap();
    handle
        .execute(
            KNIGHT,
            PlayerCommand::AddItem(InventoryItem::new(ItemId(12216), 1)),
        )
        .await
        .unwrap();
    let scroll = handle
        .snapshot(KNIGHT)
        .await
        .unwrap()
        .unwrap()
        .inventory
        .iter()
        .find(|(_, entry)| entry.item == ItemId(12216))
        .map(|(index, _)| index)
        .unwrap();
    handle
        .execute(KNIGHT, PlayerCommand::UseItem(scroll))
        .await
        .unwrap();
    assert!(drain(&mut own).iter().any(|n| matches!(
        n,
        Notification::StatusStarted {
            kind: StatusKind::Blessing,
            ..
        }
    )));

    handle.advance(Tick(1_000)).await.unwrap();
    assert!(!drain(&mut own).contains(&Notification::StatusEnded(StatusKind::Blessing)));
    assert!(handle.advance(Tick(240_000)).await.unwrap() >= 1);
    assert!(drain(&mut own).contains(&Notification::StatusEnded(StatusKind::Blessing)));
}

#[tokio::test]
async fn timers_for_closed_sessions_are_ignored() {
    let runtime = start(Arc::new(InMemoryCharacterRepository::new()));
    let handle = runtime.handle();

    let outcome = handle.fire_timer(KNIGHT, TimerId(1)).await.unwrap();
    assert!(outcome.notifications.is_empty());
}

#[tokio::test]
async fn failed_saves_never_fail_the_command() {
    let repository = Arc::new(ReadOnlyRepository(
        InMemoryCharacterRepository::with_snapshots([knight()]),
    ));
    let runtime = start(repository);
    let handle = runtime.handle();
    let mut sessions = handle.subscribe(Topic::Session);

    handle.login(KNIGHT).await.unwrap();
    assert_eq!(handle.save_all().await.unwrap(), 0);

    let snapshot = handle.logout(KNIGHT).await.unwrap();
    assert_eq!(snapshot.character.id, KNIGHT);

    let mut logged_out = None;
    while let Ok(event) = sessions.try_recv() {
        if let Event::Session(SessionEvent::LoggedOut { saved, .. }) = event {
            logged_out = Some(saved);
        }
    }
    assert_eq!(logged_out, Some(false));
}

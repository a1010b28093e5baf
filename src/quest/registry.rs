//! Quest Store
//!
//! The single persistence authority for quests: registers them, writes
//! their records, rebuilds the registry from durable storage, and routes
//! events through each quest's lifecycle.
//!
//! Every transition runs under the quest's own lock, and the record write
//! happens before that lock is released, so a completion check, its reward
//! grant and its save behave as one step. The directory lock is never held
//! across I/O.
//!
//! Create and load rebuild registry state from storage, so they hold the
//! store gate exclusively; every other operation holds it shared. A load
//! therefore never reads a record while a transition on it is in flight.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, RewardAudience};
use crate::error::{QuestError, StoreError};
use crate::host::{EntityId, PlayerId, QuestHost};
use crate::storage::{RecordStore, TomlRecordStore};

use super::definition::Quest;
use super::directory::{QuestDirectory, QuestHandle};
use super::events::{QuestEvent, QuestEventResult, RewardReport, Transition};
use super::record::QuestRecord;

/// Whether a create/save actually touched storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The operation was a deliberate no-op (create on an existing name,
    /// save on a name that was never created)
    Skipped,
}

/// Summary of a load pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    /// (record key, reason) for every record left out of the registry
    pub skipped: Vec<(String, String)>,
}

pub struct QuestStore<H: QuestHost> {
    records: Arc<dyn RecordStore>,
    host: Arc<H>,
    audience: RewardAudience,
    directory: RwLock<QuestDirectory>,
    /// Exclusive for create and load, shared for everything else
    gate: RwLock<()>,
}

impl<H: QuestHost> QuestStore<H> {
    pub fn new(records: Arc<dyn RecordStore>, host: Arc<H>, audience: RewardAudience) -> Self {
        Self {
            records,
            host,
            audience,
            directory: RwLock::new(QuestDirectory::new()),
            gate: RwLock::new(()),
        }
    }

    /// A store backed by TOML files in `config.quests_dir`.
    pub fn from_config(config: &EngineConfig, host: Arc<H>) -> Self {
        let records = Arc::new(TomlRecordStore::new(&config.quests_dir));
        Self::new(records, host, config.reward_audience)
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write a new quest and register it. A no-op if a record with the same
    /// name already exists; the existing record is left untouched.
    pub async fn create(&self, quest: Quest) -> Result<WriteOutcome, QuestError> {
        let _gate = self.gate.write().await;
        let name = quest.name().to_string();

        if self.records.exists(&name)? || self.directory.read().await.contains(&name) {
            debug!("Quest '{}' already exists, not creating", name);
            return Ok(WriteOutcome::Skipped);
        }

        let record = QuestRecord::from_quest(&quest).to_table()?;
        if let Err(e) = self.records.write(&name, &record) {
            error!("Failed to create quest '{}': {}", name, e);
            return Err(e.into());
        }

        self.directory.write().await.insert(quest);
        info!("Created quest '{}'", name);
        Ok(WriteOutcome::Written)
    }

    /// Overwrite the record of an already-created quest. Never creates.
    ///
    /// If the quest is registered, the registered instance adopts the saved
    /// state so memory and storage agree. A copy that is behind the
    /// registered instance (e.g. not completed when the registry says
    /// completed) is refused. Must not be called while holding the guard of
    /// the same quest's handle; use `save_registered` for that instance.
    pub async fn save(&self, quest: &Quest) -> Result<WriteOutcome, StoreError> {
        let _gate = self.gate.read().await;
        let Some(handle) = self.get(quest.name()).await else {
            return self.persist(quest);
        };

        let mut registered = handle.lock().await;
        if registered.status() > quest.status() {
            warn!(
                "Quest '{}' is {} in the registry, refusing to save a {} copy",
                quest.name(),
                registered.status().as_str(),
                quest.status().as_str()
            );
            return Ok(WriteOutcome::Skipped);
        }

        let outcome = self.persist(quest)?;
        if outcome == WriteOutcome::Written {
            if registered.npc() != quest.npc() {
                self.directory.write().await.retarget(quest.name(), quest.npc());
            }
            *registered = quest.clone();
        }
        Ok(outcome)
    }

    /// Write the registered instance's current state to storage.
    pub async fn save_registered(&self, name: &str) -> Result<WriteOutcome, QuestError> {
        let _gate = self.gate.read().await;
        let handle = self.handle(name).await?;
        let quest = handle.lock().await;
        Ok(self.persist(&quest)?)
    }

    fn persist(&self, quest: &Quest) -> Result<WriteOutcome, StoreError> {
        let name = quest.name();
        let result = self.records.exists(name).and_then(|exists| {
            if !exists {
                return Ok(WriteOutcome::Skipped);
            }
            let record = QuestRecord::from_quest(quest).to_table()?;
            self.records.write(name, &record)?;
            Ok(WriteOutcome::Written)
        });

        match &result {
            Ok(WriteOutcome::Skipped) => debug!("Quest '{}' was never created, not saving", name),
            Ok(WriteOutcome::Written) => debug!("Saved quest '{}'", name),
            Err(e) => error!("Failed to save quest '{}': {}", name, e),
        }
        result
    }

    /// Rebuild the registry from durable storage. Records that fail to parse,
    /// name an unknown condition or reward, or whose counterpart cannot be
    /// resolved are skipped; the rest load.
    ///
    /// If the key listing itself fails the current registry is kept.
    pub async fn load(&self) -> Result<LoadReport, StoreError> {
        let _gate = self.gate.write().await;

        let keys = self.records.list_keys()?;
        info!("Loading {} quest records", keys.len());

        let mut directory = QuestDirectory::new();
        let mut report = LoadReport::default();

        for key in keys {
            match self.load_record(&key) {
                Ok(quest) => {
                    debug!("Loaded quest '{}' ({})", key, quest.status().as_str());
                    directory.insert(quest);
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!("Skipping quest record '{}': {}", key, e);
                    report.skipped.push((key, e.to_string()));
                }
            }
        }

        *self.directory.write().await = directory;
        info!(
            "Loaded {} quests ({} skipped)",
            report.loaded,
            report.skipped.len()
        );
        Ok(report)
    }

    fn load_record(&self, key: &str) -> Result<Quest, QuestError> {
        let table = self
            .records
            .read(key)?
            .ok_or_else(|| QuestError::UnknownQuest(key.to_string()))?;
        QuestRecord::from_table(key, table)?.into_quest(key, &*self.host)
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub async fn get(&self, name: &str) -> Option<QuestHandle> {
        self.directory.read().await.by_name(name)
    }

    /// The quest anchored to `npc`, if any (first by name when shared).
    pub async fn by_counterpart(&self, npc: &EntityId) -> Option<QuestHandle> {
        self.directory
            .read()
            .await
            .by_counterpart(npc)
            .map(|(_, handle)| handle)
    }

    pub async fn all_names(&self) -> Vec<String> {
        self.directory.read().await.names()
    }

    pub async fn count(&self) -> usize {
        self.directory.read().await.len()
    }

    /// Forget every registered quest. Durable records are untouched.
    pub async fn clear(&self) {
        let _gate = self.gate.write().await;
        self.directory.write().await.clear();
    }

    async fn handle(&self, name: &str) -> Result<QuestHandle, QuestError> {
        self.get(name)
            .await
            .ok_or_else(|| QuestError::UnknownQuest(name.to_string()))
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Persist `quest` if `transition` changed it. The in-memory transition
    /// stands even if the write fails, so rewards are never re-granted.
    fn commit(&self, quest: &Quest, transition: Transition) -> Result<Transition, QuestError> {
        if transition.is_change() {
            self.persist(quest)?;
        }
        Ok(transition)
    }

    pub async fn start(&self, name: &str) -> Result<Transition, QuestError> {
        let _gate = self.gate.read().await;
        let handle = self.handle(name).await?;
        let mut quest = handle.lock().await;

        let transition = if quest.start() {
            Transition::Started
        } else {
            Transition::NoChange
        };
        self.commit(&quest, transition)
    }

    /// Complete the quest if it is started and its success trigger has
    /// fired. Repeated calls after completion do nothing.
    pub async fn try_complete(&self, name: &str) -> Result<Transition, QuestError> {
        let _gate = self.gate.read().await;
        let handle = self.handle(name).await?;
        let mut quest = handle.lock().await;

        let transition = quest.try_complete(&*self.host, self.audience);
        self.commit(&quest, transition)
    }

    /// Mark an objective complete, then check whether the quest can finish.
    pub async fn complete_objective(&self, name: &str, index: usize) -> Result<Transition, QuestError> {
        let _gate = self.gate.read().await;
        let handle = self.handle(name).await?;
        let mut quest = handle.lock().await;

        let transition = match quest.complete_objective(index)? {
            Transition::Progressed => match quest.try_complete(&*self.host, self.audience) {
                Transition::NoChange => Transition::Progressed,
                completed => completed,
            },
            other => other,
        };
        self.commit(&quest, transition)
    }

    /// Grant the quest's rewards again to the current delivery set. This is
    /// a manual override and bypasses the once-only completion guard.
    pub async fn give_rewards(&self, name: &str) -> Result<RewardReport, QuestError> {
        let _gate = self.gate.read().await;
        let handle = self.handle(name).await?;
        let quest = handle.lock().await;
        info!("Manually granting rewards for quest '{}'", name);
        Ok(quest.give_rewards(&*self.host, self.audience))
    }

    /// Route a player's interaction with `npc` to the quest anchored there.
    pub async fn interact(&self, player: &PlayerId, npc: &EntityId) -> Result<Option<QuestEventResult>, QuestError> {
        let _gate = self.gate.read().await;
        let Some((name, handle)) = self.directory.read().await.by_counterpart(npc) else {
            debug!("No quest anchored to {}", npc);
            return Ok(None);
        };

        let mut quest = handle.lock().await;
        let transition = quest.interact(npc, &*self.host, self.audience);
        match &transition {
            Transition::Started => info!("Player {} started quest '{}'", player, name),
            Transition::Completed(report) => info!(
                "Player {} completed quest '{}' ({} rewards delivered)",
                player,
                name,
                report.delivered.len()
            ),
            _ => {}
        }

        let transition = self.commit(&quest, transition)?;
        Ok(Some(QuestEventResult::new(&name, transition)))
    }

    /// Process a quest event and return the resulting transition, or `None`
    /// if no quest was affected.
    pub async fn process_event(&self, event: &QuestEvent) -> Result<Option<QuestEventResult>, QuestError> {
        debug!("Processing quest event {}", event.event_type());

        match event {
            QuestEvent::NpcInteraction { player_id, npc_id } => self.interact(player_id, npc_id).await,
            QuestEvent::ObjectiveCompleted { quest, objective } => {
                let transition = self.complete_objective(quest, *objective).await?;
                Ok(Some(QuestEventResult::new(quest, transition)))
            }
            QuestEvent::QuestAccepted { player_id, quest } => {
                let transition = self.start(quest).await?;
                if transition.is_change() {
                    info!("Player {} accepted quest '{}'", player_id, quest);
                }
                Ok(Some(QuestEventResult::new(quest, transition)))
            }
        }
    }
}

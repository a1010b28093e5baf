//! Quest Definition and Lifecycle
//!
//! A quest moves NotStarted -> Started -> Completed and never back. The
//! completed flag is the once-only guard for rewards: a quest that is
//! already complete never grants again, whatever the caller does.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::RewardAudience;
use crate::error::QuestError;
use crate::host::{EntityId, PlayerId, RewardTarget};

use super::condition::CompletionCondition;
use super::events::{RewardReport, Transition};
use super::reward::Reward;

/// Ordered by lifecycle progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QuestStatus {
    NotStarted,
    Started,
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::NotStarted => "not_started",
            QuestStatus::Started => "started",
            QuestStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Objective {
    pub description: String,
    pub completed: bool,
}

impl Objective {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quest {
    name: String,
    /// Display lines; not behaviourally significant
    pub description: Vec<String>,
    objectives: Vec<Objective>,
    rewards: Vec<Reward>,
    recipient: Option<PlayerId>,
    /// Counterpart NPC, held by id and resolved through the host
    npc: EntityId,
    condition: CompletionCondition,
    started: bool,
    completed: bool,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn new(name: &str, npc: EntityId, condition: CompletionCondition) -> Self {
        Self {
            name: name.to_string(),
            description: Vec::new(),
            objectives: Vec::new(),
            rewards: Vec::new(),
            recipient: None,
            npc,
            condition,
            started: false,
            completed: false,
            started_at: None,
            completed_at: None,
        }
    }

    /// A quest completed by interacting with `npc`.
    pub fn with_npc(name: &str, npc: EntityId) -> Self {
        Self::new(name, npc, CompletionCondition::npc(npc))
    }

    pub fn description_line(mut self, line: &str) -> Self {
        self.description.push(line.to_string());
        self
    }

    pub fn objective(mut self, description: &str) -> Self {
        self.objectives.push(Objective::new(description));
        self
    }

    pub fn reward(mut self, reward: Reward) -> Self {
        self.rewards.push(reward);
        self
    }

    pub fn recipient(mut self, player: PlayerId) -> Self {
        self.recipient = Some(player);
        self
    }

    /// Rebuild a quest from persisted state. A record claiming completion
    /// without a start is treated as started.
    pub(crate) fn restore(
        mut self,
        objectives: Vec<Objective>,
        started: bool,
        completed: bool,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        if completed && !started {
            warn!("Quest '{}' is marked clear but not started, treating as started", self.name);
        }
        self.objectives = objectives;
        self.started = started || completed;
        self.completed = completed;
        self.started_at = started_at;
        self.completed_at = completed_at;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    pub fn rewards(&self) -> &[Reward] {
        &self.rewards
    }

    pub fn recipient_id(&self) -> Option<&PlayerId> {
        self.recipient.as_ref()
    }

    pub fn npc(&self) -> EntityId {
        self.npc
    }

    pub fn condition(&self) -> &CompletionCondition {
        &self.condition
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn status(&self) -> QuestStatus {
        if self.completed {
            QuestStatus::Completed
        } else if self.started {
            QuestStatus::Started
        } else {
            QuestStatus::NotStarted
        }
    }

    /// True when every objective is done (vacuously true with none).
    pub fn objectives_complete(&self) -> bool {
        self.objectives.iter().all(|o| o.completed)
    }

    /// The success trigger. An NPC quest is ready once its counterpart has
    /// been spoken to after the start; its objectives only describe the
    /// errand and are settled on completion. An objectives quest is ready
    /// when every objective is done.
    pub fn is_ready(&self) -> bool {
        match &self.condition {
            CompletionCondition::Objectives => self.objectives_complete(),
            condition => condition.is_completed(),
        }
    }

    /// Mark the quest as taken. Idempotent; returns true on the first call.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.started_at = Some(Utc::now());
        info!("Quest '{}' started", self.name);
        true
    }

    /// Mark one objective complete. Completing an objective on a finished
    /// quest is a no-op.
    pub fn complete_objective(&mut self, index: usize) -> Result<Transition, QuestError> {
        if self.completed {
            return Ok(Transition::NoChange);
        }
        let objective = self
            .objectives
            .get_mut(index)
            .ok_or_else(|| QuestError::NoSuchObjective {
                quest: self.name.clone(),
                index,
            })?;

        if objective.completed {
            return Ok(Transition::NoChange);
        }
        objective.completed = true;
        debug!("Quest '{}' objective {} complete: {}", self.name, index, objective.description);
        Ok(Transition::Progressed)
    }

    /// Complete the quest if it is started and ready, applying rewards once.
    pub fn try_complete(&mut self, target: &dyn RewardTarget, audience: RewardAudience) -> Transition {
        if self.completed {
            debug!("Quest '{}' already completed", self.name);
            return Transition::NoChange;
        }
        if !self.started {
            debug!("Quest '{}' not started, ignoring completion check", self.name);
            return Transition::NoChange;
        }
        if !self.is_ready() {
            return Transition::NoChange;
        }

        self.completed = true;
        self.completed_at = Some(Utc::now());
        for objective in &mut self.objectives {
            objective.completed = true;
        }
        info!("Quest '{}' completed", self.name);

        Transition::Completed(self.give_rewards(target, audience))
    }

    /// Route an interaction with `entity` through the quest. The first
    /// interaction with the counterpart starts the quest; later ones feed
    /// the condition and attempt completion.
    pub fn interact(
        &mut self,
        entity: &EntityId,
        target: &dyn RewardTarget,
        audience: RewardAudience,
    ) -> Transition {
        if *entity != self.npc || self.completed {
            return Transition::NoChange;
        }
        if self.start() {
            return Transition::Started;
        }

        self.condition.on_interact(entity);
        self.try_complete(target, audience)
    }

    /// Apply every reward to every player in the delivery set. Not guarded:
    /// callers wanting once-only semantics go through `try_complete`.
    pub fn give_rewards(&self, target: &dyn RewardTarget, audience: RewardAudience) -> RewardReport {
        let mut report = RewardReport::default();

        for player in self.delivery_set(target, audience) {
            for reward in &self.rewards {
                match reward.apply(&player, target) {
                    Ok(delivery) => report.delivered.push((player.clone(), delivery)),
                    Err(e) => {
                        warn!("Quest '{}': {}", self.name, e);
                        report.failed.push((player.clone(), e));
                    }
                }
            }
        }

        report
    }

    fn delivery_set(&self, target: &dyn RewardTarget, audience: RewardAudience) -> Vec<PlayerId> {
        let online = target.current_recipients();
        match audience {
            RewardAudience::Online => online,
            RewardAudience::Recipient => self
                .recipient
                .iter()
                .filter(|r| online.contains(r))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SessionHost;
    use crate::item::{ItemTemplate, Location};

    fn online(host: &SessionHost, ids: &[&str]) -> Vec<PlayerId> {
        ids.iter()
            .map(|id| {
                let player = PlayerId::new(id);
                host.join(&player, Location::new(0.0, 0.0));
                player
            })
            .collect()
    }

    fn xp_quest(npc: EntityId) -> Quest {
        Quest::with_npc("welcome", npc)
            .description_line("Say hello")
            .reward(Reward::experience(50).unwrap())
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut quest = xp_quest(EntityId::new());
        assert_eq!(quest.status(), QuestStatus::NotStarted);

        assert!(quest.start());
        let first = quest.started_at();
        assert!(!quest.start());

        assert!(quest.is_started());
        assert_eq!(quest.started_at(), first);
        assert_eq!(quest.status(), QuestStatus::Started);
    }

    #[test]
    fn test_ready_condition_needs_explicit_start() {
        let host = SessionHost::new();
        let players = online(&host, &["alice"]);
        let mut quest = Quest::new("errand", EntityId::new(), CompletionCondition::Objectives)
            .reward(Reward::experience(10).unwrap());
        assert!(quest.is_ready());

        assert_eq!(quest.try_complete(&host, RewardAudience::Online), Transition::NoChange);
        assert!(!quest.is_completed());
        assert_eq!(host.experience(&players[0]), Some(0));
    }

    #[test]
    fn test_rewards_granted_exactly_once() {
        let host = SessionHost::new();
        let players = online(&host, &["alice"]);
        let npc = EntityId::new();
        let mut quest = xp_quest(npc);

        assert_eq!(quest.interact(&npc, &host, RewardAudience::Online), Transition::Started);
        assert!(matches!(
            quest.interact(&npc, &host, RewardAudience::Online),
            Transition::Completed(_)
        ));

        for _ in 0..5 {
            assert_eq!(quest.try_complete(&host, RewardAudience::Online), Transition::NoChange);
            assert_eq!(quest.interact(&npc, &host, RewardAudience::Online), Transition::NoChange);
            assert!(quest.is_completed());
        }
        assert_eq!(host.experience(&players[0]), Some(50));
    }

    #[test]
    fn test_interaction_with_other_entity_is_ignored() {
        let host = SessionHost::new();
        let mut quest = xp_quest(EntityId::new());

        assert_eq!(
            quest.interact(&EntityId::new(), &host, RewardAudience::Online),
            Transition::NoChange
        );
        assert!(!quest.is_started());
    }

    #[test]
    fn test_npc_interaction_completes_quest_with_objectives() {
        let host = SessionHost::new();
        let players = online(&host, &["alice"]);
        let npc = EntityId::new();
        let mut quest = xp_quest(npc).objective("greet npc");

        assert_eq!(quest.interact(&npc, &host, RewardAudience::Online), Transition::Started);
        assert!(!quest.is_completed());
        assert!(!quest.objectives()[0].completed);

        assert!(matches!(
            quest.interact(&npc, &host, RewardAudience::Online),
            Transition::Completed(_)
        ));
        assert!(quest.objectives_complete());
        assert_eq!(host.experience(&players[0]), Some(50));
    }

    #[test]
    fn test_objectives_gate_completion() {
        let host = SessionHost::new();
        let players = online(&host, &["alice"]);
        let npc = EntityId::new();
        let mut quest = Quest::new("errand", npc, CompletionCondition::Objectives)
            .objective("Find the key")
            .objective("Open the door")
            .reward(Reward::experience(50).unwrap());

        quest.interact(&npc, &host, RewardAudience::Online);
        assert_eq!(quest.interact(&npc, &host, RewardAudience::Online), Transition::NoChange);

        assert_eq!(quest.complete_objective(0).unwrap(), Transition::Progressed);
        assert_eq!(quest.complete_objective(0).unwrap(), Transition::NoChange);
        assert_eq!(quest.try_complete(&host, RewardAudience::Online), Transition::NoChange);

        quest.complete_objective(1).unwrap();
        assert!(matches!(
            quest.try_complete(&host, RewardAudience::Online),
            Transition::Completed(_)
        ));
        assert_eq!(host.experience(&players[0]), Some(50));
    }

    #[test]
    fn test_unknown_objective() {
        let mut quest = xp_quest(EntityId::new()).objective("Only one");
        assert!(matches!(
            quest.complete_objective(3),
            Err(QuestError::NoSuchObjective { index: 3, .. })
        ));
    }

    #[test]
    fn test_broadcast_and_recipient_audiences() {
        let host = SessionHost::new();
        let players = online(&host, &["alice", "bob"]);
        let quest = xp_quest(EntityId::new()).recipient(players[0].clone());

        let report = quest.give_rewards(&host, RewardAudience::Online);
        assert_eq!(report.recipients().len(), 2);
        assert_eq!(host.experience(&players[1]), Some(50));

        let report = quest.give_rewards(&host, RewardAudience::Recipient);
        assert_eq!(report.recipients(), vec![&players[0]]);
        assert_eq!(host.experience(&players[0]), Some(100));
        assert_eq!(host.experience(&players[1]), Some(50));
    }

    #[test]
    fn test_offline_recipient_receives_nothing() {
        let host = SessionHost::new();
        online(&host, &["bob"]);
        let quest = xp_quest(EntityId::new()).recipient(PlayerId::new("alice"));

        let report = quest.give_rewards(&host, RewardAudience::Recipient);
        assert!(report.delivered.is_empty());
    }

    #[test]
    fn test_every_reward_to_every_player() {
        let host = SessionHost::new();
        let players = online(&host, &["alice", "bob"]);
        let quest = xp_quest(EntityId::new())
            .reward(Reward::item(ItemTemplate::plain("bread"), 3).unwrap());

        let report = quest.give_rewards(&host, RewardAudience::Online);

        assert_eq!(report.delivered.len(), 4);
        for player in &players {
            assert_eq!(host.inventory(player).unwrap().count("bread"), 3);
        }
    }

    #[test]
    fn test_status_order_follows_lifecycle() {
        assert!(QuestStatus::NotStarted < QuestStatus::Started);
        assert!(QuestStatus::Started < QuestStatus::Completed);
    }

    #[test]
    fn test_restore_enforces_started_when_completed() {
        let quest = xp_quest(EntityId::new()).restore(Vec::new(), false, true, None, None);
        assert!(quest.is_started());
        assert_eq!(quest.status(), QuestStatus::Completed);
    }
}

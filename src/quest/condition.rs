//! Completion Conditions
//!
//! The predicate that decides when a quest's success trigger has fired.
//! Variants are keyed by a stable identifier string, which is what gets
//! persisted; an unrecognised identifier fails construction.

use crate::error::QuestError;
use crate::host::EntityId;

/// Identifier accepted on read for records written before the NPC condition
/// was renamed. Always rewritten as `NPCCondition`.
const LEGACY_NPC_IDENTIFIER: &str = "SpecificCondition";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Fires once the quest's counterpart NPC has been interacted with
    Npc,
    /// No extra predicate; the quest's objectives gate alone decides
    Objectives,
}

impl ConditionKind {
    pub fn identifier(&self) -> &'static str {
        match self {
            ConditionKind::Npc => "NPCCondition",
            ConditionKind::Objectives => "ObjectivesCondition",
        }
    }

    pub fn from_identifier(s: &str) -> Option<Self> {
        match s {
            "NPCCondition" | LEGACY_NPC_IDENTIFIER => Some(ConditionKind::Npc),
            "ObjectivesCondition" => Some(ConditionKind::Objectives),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpcCondition {
    npc: EntityId,
    has_interacted: bool,
}

impl NpcCondition {
    pub fn new(npc: EntityId) -> Self {
        Self {
            npc,
            has_interacted: false,
        }
    }

    pub fn npc(&self) -> EntityId {
        self.npc
    }

    pub fn has_interacted(&self) -> bool {
        self.has_interacted
    }

    /// Record an interaction. Returns false if `entity` is not our NPC.
    pub fn on_interact(&mut self, entity: &EntityId) -> bool {
        if *entity != self.npc {
            return false;
        }
        self.has_interacted = true;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionCondition {
    Npc(NpcCondition),
    Objectives,
}

impl CompletionCondition {
    pub fn npc(npc: EntityId) -> Self {
        CompletionCondition::Npc(NpcCondition::new(npc))
    }

    /// Rebuild a condition from its persisted identifier. `npc` is the
    /// quest's already-resolved counterpart.
    pub fn from_identifier(identifier: &str, npc: EntityId) -> Result<Self, QuestError> {
        match ConditionKind::from_identifier(identifier) {
            Some(ConditionKind::Npc) => Ok(CompletionCondition::npc(npc)),
            Some(ConditionKind::Objectives) => Ok(CompletionCondition::Objectives),
            None => Err(QuestError::UnknownCondition(identifier.to_string())),
        }
    }

    pub fn kind(&self) -> ConditionKind {
        match self {
            CompletionCondition::Npc(_) => ConditionKind::Npc,
            CompletionCondition::Objectives => ConditionKind::Objectives,
        }
    }

    pub fn identifier(&self) -> &'static str {
        self.kind().identifier()
    }

    pub fn is_completed(&self) -> bool {
        match self {
            CompletionCondition::Npc(c) => c.has_interacted,
            CompletionCondition::Objectives => true,
        }
    }

    /// Deliver an interaction event. Returns true if the condition consumed it.
    pub fn on_interact(&mut self, entity: &EntityId) -> bool {
        match self {
            CompletionCondition::Npc(c) => c.on_interact(entity),
            CompletionCondition::Objectives => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parsing() {
        assert_eq!(ConditionKind::from_identifier("NPCCondition"), Some(ConditionKind::Npc));
        assert_eq!(ConditionKind::from_identifier("SpecificCondition"), Some(ConditionKind::Npc));
        assert_eq!(
            ConditionKind::from_identifier("ObjectivesCondition"),
            Some(ConditionKind::Objectives)
        );
        assert_eq!(ConditionKind::from_identifier("KillCondition"), None);
    }

    #[test]
    fn test_legacy_identifier_is_rewritten() {
        let condition = CompletionCondition::from_identifier("SpecificCondition", EntityId::new()).unwrap();
        assert_eq!(condition.identifier(), "NPCCondition");
    }

    #[test]
    fn test_unknown_identifier_fails() {
        assert!(matches!(
            CompletionCondition::from_identifier("KillCondition", EntityId::new()),
            Err(QuestError::UnknownCondition(id)) if id == "KillCondition"
        ));
    }

    #[test]
    fn test_npc_condition_only_reacts_to_its_npc() {
        let npc = EntityId::new();
        let mut condition = CompletionCondition::npc(npc);
        assert!(!condition.is_completed());

        assert!(!condition.on_interact(&EntityId::new()));
        assert!(!condition.is_completed());

        assert!(condition.on_interact(&npc));
        assert!(condition.is_completed());
    }

    #[test]
    fn test_objectives_condition_ignores_interaction() {
        let mut condition = CompletionCondition::Objectives;
        assert!(condition.is_completed());
        assert!(!condition.on_interact(&EntityId::new()));
    }
}

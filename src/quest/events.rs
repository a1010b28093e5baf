//! Quest Event Types
//!
//! Events delivered to the quest engine and the transitions they cause.

use crate::error::RewardError;
use crate::host::{EntityId, PlayerId};

use super::reward::Delivery;

/// Events that can drive a quest forward
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestEvent {
    /// Player interacted with an NPC
    NpcInteraction {
        player_id: PlayerId,
        npc_id: EntityId,
    },

    /// An objective's underlying condition became true
    ObjectiveCompleted {
        quest: String,
        /// Index into the quest's objective list
        objective: usize,
    },

    /// Player accepted a quest outside of an NPC interaction
    QuestAccepted {
        player_id: PlayerId,
        quest: String,
    },
}

impl QuestEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::NpcInteraction { .. } => "npc_interaction",
            QuestEvent::ObjectiveCompleted { .. } => "objective_completed",
            QuestEvent::QuestAccepted { .. } => "quest_accepted",
        }
    }
}

/// Outcome of applying rewards to the delivery set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardReport {
    pub delivered: Vec<(PlayerId, Delivery)>,
    pub failed: Vec<(PlayerId, RewardError)>,
}

impl RewardReport {
    pub fn recipients(&self) -> Vec<&PlayerId> {
        let mut ids: Vec<&PlayerId> = self.delivered.iter().map(|(p, _)| p).collect();
        ids.dedup();
        ids
    }
}

/// What a lifecycle operation did to a quest.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// NotStarted -> Started
    Started,
    /// An objective was newly completed; the quest is still open
    Progressed,
    /// Started -> Completed, rewards applied
    Completed(RewardReport),
    NoChange,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        !matches!(self, Transition::NoChange)
    }
}

/// Result of routing one event through the store
#[derive(Debug, Clone, PartialEq)]
pub struct QuestEventResult {
    /// Quest that the event was routed to
    pub quest: String,
    pub transition: Transition,
}

impl QuestEventResult {
    pub fn new(quest: &str, transition: Transition) -> Self {
        Self {
            quest: quest.to_string(),
            transition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Location;

    #[test]
    fn test_event_type() {
        let event = QuestEvent::NpcInteraction {
            player_id: PlayerId::new("alice"),
            npc_id: EntityId::new(),
        };
        assert_eq!(event.event_type(), "npc_interaction");
    }

    #[test]
    fn test_report_recipients_dedup() {
        let alice = PlayerId::new("alice");
        let report = RewardReport {
            delivered: vec![
                (alice.clone(), Delivery::Experience(5)),
                (alice.clone(), Delivery::Dropped(Location::new(0.0, 0.0))),
            ],
            failed: Vec::new(),
        };
        assert_eq!(report.recipients(), vec![&alice]);
        assert!(Transition::Completed(report).is_change());
        assert!(!Transition::NoChange.is_change());
    }
}

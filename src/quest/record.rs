//! Quest Records
//!
//! The durable shape of a quest, one document per quest name:
//!
//! ```toml
//! name = "welcome"
//! description = ["Say hello to the elder"]
//! npc = "8c6f0c8e-..."
//! questCompletionCondition = "NPCCondition"
//! isStart = false
//! isClear = false
//!
//! [[reward]]
//! kind = "EXPERIENCE"
//! amount = 50
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{QuestError, StoreError};
use crate::host::{EntityId, EntityResolver, PlayerId};
use crate::item::ItemTemplate;

use super::condition::CompletionCondition;
use super::definition::{Objective, Quest};
use super::reward::Reward;

/// Older records store a single string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptionField {
    Lines(Vec<String>),
    Single(String),
}

impl DescriptionField {
    pub fn into_lines(self) -> Vec<String> {
        match self {
            DescriptionField::Lines(lines) => lines,
            DescriptionField::Single(line) => vec![line],
        }
    }
}

impl Default for DescriptionField {
    fn default() -> Self {
        DescriptionField::Lines(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    /// "ITEM" or "EXPERIENCE"
    pub kind: String,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemTemplate>,
}

impl RewardRecord {
    pub fn from_reward(reward: &Reward) -> Self {
        Self {
            kind: reward.kind().as_str().to_string(),
            amount: i64::from(reward.amount()),
            item: reward.item_template().cloned(),
        }
    }

    pub fn to_reward(&self) -> Result<Reward, QuestError> {
        Reward::from_parts(&self.kind, self.amount, self.item.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestRecord {
    pub name: String,
    #[serde(default)]
    pub description: DescriptionField,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<ObjectiveRecord>,
    #[serde(default)]
    pub reward: Vec<RewardRecord>,
    /// Counterpart entity id
    pub npc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub quest_completion_condition: String,
    pub is_start: bool,
    pub is_clear: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuestRecord {
    pub fn from_quest(quest: &Quest) -> Self {
        Self {
            name: quest.name().to_string(),
            description: DescriptionField::Lines(quest.description.clone()),
            objectives: quest
                .objectives()
                .iter()
                .map(|o| ObjectiveRecord {
                    description: o.description.clone(),
                    completed: o.completed,
                })
                .collect(),
            reward: quest.rewards().iter().map(RewardRecord::from_reward).collect(),
            npc: quest.npc().to_string(),
            recipient: quest.recipient_id().map(|p| p.as_str().to_string()),
            quest_completion_condition: quest.condition().identifier().to_string(),
            is_start: quest.is_started(),
            is_clear: quest.is_completed(),
            started_at: quest.started_at(),
            completed_at: quest.completed_at(),
        }
    }

    /// Parse a raw stored document.
    pub fn from_table(key: &str, table: toml::Table) -> Result<Self, QuestError> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|source| QuestError::MalformedRecord {
                key: key.to_string(),
                source,
            })
    }

    pub fn to_table(&self) -> Result<toml::Table, StoreError> {
        match toml::Value::try_from(self)? {
            toml::Value::Table(table) => Ok(table),
            other => Err(StoreError::Serialize(<toml::ser::Error as serde::ser::Error>::custom(
                format!("record serialized to {} instead of a table", other.type_str()),
            ))),
        }
    }

    /// Check everything that does not need a live host: entity id syntax,
    /// the condition identifier and every reward entry.
    pub fn validate(&self) -> Result<(), QuestError> {
        let npc = EntityId::parse(&self.npc)?;
        CompletionCondition::from_identifier(&self.quest_completion_condition, npc)?;
        for reward in &self.reward {
            reward.to_reward()?;
        }
        Ok(())
    }

    /// Rebuild the in-memory quest. The quest is named after `key`; the
    /// counterpart must currently resolve through `resolver`.
    pub fn into_quest(self, key: &str, resolver: &dyn EntityResolver) -> Result<Quest, QuestError> {
        if self.name != key {
            warn!("Record '{}' carries name '{}', using the key", key, self.name);
        }

        let npc = EntityId::parse(&self.npc)?;
        if resolver.resolve_entity(&npc).is_none() {
            return Err(QuestError::UnresolvedEntity(self.npc));
        }

        let condition = CompletionCondition::from_identifier(&self.quest_completion_condition, npc)?;
        let rewards = self
            .reward
            .iter()
            .map(RewardRecord::to_reward)
            .collect::<Result<Vec<_>, _>>()?;
        let objectives = self
            .objectives
            .into_iter()
            .map(|o| Objective {
                description: o.description,
                completed: o.completed,
            })
            .collect();

        let mut quest = Quest::new(key, npc, condition);
        quest.description = self.description.into_lines();
        for reward in rewards {
            quest = quest.reward(reward);
        }
        if let Some(recipient) = self.recipient {
            quest = quest.recipient(PlayerId::new(&recipient));
        }

        Ok(quest.restore(
            objectives,
            self.is_start,
            self.is_clear,
            self.started_at,
            self.completed_at,
        ))
    }
}

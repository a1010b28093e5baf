//! Quest System Module
//!
//! Quest lifecycle (not started -> started -> completed), polymorphic
//! rewards and completion conditions, and a store that persists each quest
//! as a TOML record and rebuilds the registry from those records.

pub mod condition;
pub mod definition;
pub mod directory;
pub mod events;
pub mod record;
pub mod registry;
pub mod reward;

pub use condition::{CompletionCondition, ConditionKind, NpcCondition};
pub use definition::{Objective, Quest, QuestStatus};
pub use directory::{QuestDirectory, QuestHandle};
pub use events::{QuestEvent, QuestEventResult, RewardReport, Transition};
pub use record::QuestRecord;
pub use registry::{LoadReport, QuestStore, WriteOutcome};
pub use reward::{Delivery, ExperienceReward, ItemReward, Reward, RewardKind};

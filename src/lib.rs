//! Quest lifecycle and persistence engine for a live game session.

pub mod config;
pub mod error;
pub mod host;
pub mod item;
pub mod quest;
pub mod storage;

pub use config::{EngineConfig, RewardAudience};
pub use error::{ConfigError, QuestError, RewardError, StoreError};
pub use host::{EntityId, PlayerId, QuestHost, SessionHost};
pub use quest::{Quest, QuestStore};

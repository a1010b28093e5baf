//! Error types for the quest engine.

use thiserror::Error;

/// Failures reading the engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures of the durable record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be parsed.
    #[error("failed to parse record '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    /// A record could not be encoded.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Keys must be non-empty and free of path separators.
    #[error("invalid record key: {0:?}")]
    InvalidKey(String),

    /// Writes were switched off (in-memory store only).
    #[error("store is read-only")]
    ReadOnly,
}

/// Failures constructing or loading a quest.
///
/// Every variant except `Store` is scoped to a single quest: the load pass
/// logs it, skips the record and keeps going.
#[derive(Debug, Error)]
pub enum QuestError {
    #[error("unknown completion condition identifier: {0}")]
    UnknownCondition(String),

    #[error("unknown reward kind: {0}")]
    UnknownRewardKind(String),

    #[error("item template must be provided for ITEM reward")]
    MissingItem,

    #[error("reward amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("invalid entity id '{0}'")]
    InvalidEntityId(String),

    #[error("entity {0} is not currently resolvable")]
    UnresolvedEntity(String),

    #[error("malformed record '{key}': {source}")]
    MalformedRecord {
        key: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("quest '{0}' is not registered")]
    UnknownQuest(String),

    #[error("quest '{quest}' has no objective at index {index}")]
    NoSuchObjective { quest: String, index: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A reward that could be neither inserted nor dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewardError {
    #[error("reward for {recipient} is undeliverable: no free slot and no world location")]
    Undeliverable { recipient: String },
}

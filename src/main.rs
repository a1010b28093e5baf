//! Quest record checker.
//!
//! Reads the engine config (first argument, default `quest-engine.toml`),
//! then parses and validates every quest record in the configured quest
//! directory. Entity resolution needs a running game server, so counterpart
//! ids are only checked for syntax here. Exits non-zero if any record is
//! invalid.

use std::path::PathBuf;
use std::process::ExitCode;

use quest_engine::config::EngineConfig;
use quest_engine::quest::QuestRecord;
use quest_engine::storage::{RecordStore, TomlRecordStore};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "quest-engine.toml";

fn main() -> ExitCode {
    let config_path = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string()));

    let config = match EngineConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let mut filter = EnvFilter::from_default_env();
    match config.log_filter.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log_filter '{}': {}", config.log_filter, e),
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if !config_path.exists() {
        warn!("Config file {:?} not found, using defaults", config_path);
    }

    let store = TomlRecordStore::new(&config.quests_dir);
    let keys = match store.list_keys() {
        Ok(keys) => keys,
        Err(e) => {
            error!("Failed to list quest records in {:?}: {}", store.dir(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut invalid = 0;
    for key in &keys {
        let checked = store
            .read(key)
            .map_err(|e| e.to_string())
            .and_then(|table| table.ok_or_else(|| "record vanished".to_string()))
            .and_then(|table| QuestRecord::from_table(key, table).map_err(|e| e.to_string()))
            .and_then(|record| record.validate().map(|_| record).map_err(|e| e.to_string()));

        match checked {
            Ok(record) => info!(
                "{}: {} reward(s), condition {}, start={}, clear={}",
                key,
                record.reward.len(),
                record.quest_completion_condition,
                record.is_start,
                record.is_clear
            ),
            Err(e) => {
                error!("{}: {}", key, e);
                invalid += 1;
            }
        }
    }

    info!("Checked {} quest records in {:?}, {} invalid", keys.len(), store.dir(), invalid);

    if invalid > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

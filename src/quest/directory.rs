//! Quest Directory
//!
//! In-memory index of registered quests by name and by counterpart NPC.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::host::EntityId;

use super::definition::Quest;

/// Shared, individually locked quest.
pub type QuestHandle = Arc<Mutex<Quest>>;

#[derive(Clone)]
struct Entry {
    /// Copied out of the quest so lookups never take the quest lock
    npc: EntityId,
    handle: QuestHandle,
}

#[derive(Default)]
pub struct QuestDirectory {
    quests: BTreeMap<String, Entry>,
}

impl QuestDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quest under its name, replacing any previous entry.
    pub fn insert(&mut self, quest: Quest) -> QuestHandle {
        let name = quest.name().to_string();
        let npc = quest.npc();
        let handle = Arc::new(Mutex::new(quest));
        self.quests.insert(
            name,
            Entry {
                npc,
                handle: Arc::clone(&handle),
            },
        );
        handle
    }

    pub fn contains(&self, name: &str) -> bool {
        self.quests.contains_key(name)
    }

    pub fn by_name(&self, name: &str) -> Option<QuestHandle> {
        self.quests.get(name).map(|e| Arc::clone(&e.handle))
    }

    /// First quest (in name order) anchored to `npc`. Several quests may
    /// share a counterpart; only one is returned.
    pub fn by_counterpart(&self, npc: &EntityId) -> Option<(String, QuestHandle)> {
        self.quests
            .iter()
            .find(|(_, e)| e.npc == *npc)
            .map(|(name, e)| (name.clone(), Arc::clone(&e.handle)))
    }

    /// Names of every quest anchored to `npc`, in name order.
    pub fn names_for_counterpart(&self, npc: &EntityId) -> Vec<String> {
        self.quests
            .iter()
            .filter(|(_, e)| e.npc == *npc)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Point an existing entry at a new counterpart. Returns false if `name`
    /// is not registered.
    pub fn retarget(&mut self, name: &str, npc: EntityId) -> bool {
        match self.quests.get_mut(name) {
            Some(entry) => {
                entry.npc = npc;
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.quests.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn clear(&mut self) {
        self.quests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_name_and_counterpart() {
        let elder = EntityId::new();
        let smith = EntityId::new();
        let mut directory = QuestDirectory::new();
        directory.insert(Quest::with_npc("welcome", elder));
        directory.insert(Quest::with_npc("forge", smith));

        let handle = directory.by_name("forge").unwrap();
        assert_eq!(handle.lock().await.npc(), smith);
        assert!(directory.by_name("missing").is_none());

        let (name, _) = directory.by_counterpart(&elder).unwrap();
        assert_eq!(name, "welcome");
        assert!(directory.by_counterpart(&EntityId::new()).is_none());
    }

    #[tokio::test]
    async fn test_shared_counterpart_returns_first_by_name() {
        let elder = EntityId::new();
        let mut directory = QuestDirectory::new();
        directory.insert(Quest::with_npc("b_second", elder));
        directory.insert(Quest::with_npc("a_first", elder));

        let (name, _) = directory.by_counterpart(&elder).unwrap();
        assert_eq!(name, "a_first");
        assert_eq!(directory.names_for_counterpart(&elder), vec!["a_first", "b_second"]);
    }

    #[test]
    fn test_retarget_moves_counterpart_lookup() {
        let elder = EntityId::new();
        let smith = EntityId::new();
        let mut directory = QuestDirectory::new();
        directory.insert(Quest::with_npc("welcome", elder));

        assert!(directory.retarget("welcome", smith));
        assert!(directory.by_counterpart(&elder).is_none());
        assert_eq!(directory.by_counterpart(&smith).map(|(name, _)| name), Some("welcome".to_string()));
        assert!(!directory.retarget("missing", smith));
    }

    #[test]
    fn test_insert_replaces_and_clear() {
        let mut directory = QuestDirectory::new();
        directory.insert(Quest::with_npc("welcome", EntityId::new()));
        directory.insert(Quest::with_npc("welcome", EntityId::new()));
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.names(), vec!["welcome"]);

        directory.clear();
        assert!(directory.is_empty());
        assert!(!directory.contains("welcome"));
    }
}

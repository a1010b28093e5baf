//! Host Interfaces
//!
//! The narrow surface the quest engine consumes from the hosting game
//! server: entity resolution, the set of connected players, and inventory /
//! experience mutation. `SessionHost` is an in-memory implementation that
//! owns its own player and entity maps, so each test or server instance
//! gets an isolated copy.

use std::fmt;
use std::sync::Mutex;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::QuestError;
use crate::item::{GroundItem, Inventory, ItemStack, Location};

// ============================================================================
// Identifiers
// ============================================================================

/// Stable id of a world entity (NPC). Quests hold this, never the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Deterministic id for a world-authored name such as `npc-1`. The same
    /// name always maps to the same id.
    pub fn named(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Accepts a UUID, or any non-blank name without whitespace (see `named`).
    pub fn parse(s: &str) -> Result<Self, QuestError> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self(id));
        }
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(QuestError::InvalidEntityId(s.to_string()));
        }
        Ok(Self::named(s))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live entity as seen by the host at resolution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub location: Location,
}

// ============================================================================
// Host Traits
// ============================================================================

pub trait EntityResolver: Send + Sync {
    /// Returns `None` if the entity is not currently loaded.
    fn resolve_entity(&self, id: &EntityId) -> Option<Entity>;
}

pub trait RewardTarget: Send + Sync {
    /// Players eligible for rewards right now (all connected players).
    fn current_recipients(&self) -> Vec<PlayerId>;

    /// Place the whole stack in the player's inventory, or return false.
    fn try_insert(&self, recipient: &PlayerId, stack: &ItemStack) -> bool;

    fn location_of(&self, recipient: &PlayerId) -> Option<Location>;

    fn drop_at(&self, location: Location, stack: ItemStack);

    fn grant_experience(&self, recipient: &PlayerId, amount: u32);
}

/// Everything the quest engine needs from its host.
pub trait QuestHost: EntityResolver + RewardTarget {}

impl<T: EntityResolver + RewardTarget> QuestHost for T {}

// ============================================================================
// In-memory Session Host
// ============================================================================

/// Per-player state tracked while a player is connected.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub inventory: Inventory,
    pub experience: u64,
    pub location: Location,
}

impl PlayerSession {
    pub fn new(location: Location) -> Self {
        Self {
            inventory: Inventory::new(),
            experience: 0,
            location,
        }
    }
}

pub struct SessionHost {
    players: DashMap<PlayerId, PlayerSession>,
    entities: DashMap<EntityId, Entity>,
    ground_items: Mutex<Vec<GroundItem>>,
}

impl SessionHost {
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
            entities: DashMap::new(),
            ground_items: Mutex::new(Vec::new()),
        }
    }

    /// Register a connected player. Rejoining keeps the existing session.
    pub fn join(&self, player: &PlayerId, location: Location) {
        self.players
            .entry(player.clone())
            .or_insert_with(|| PlayerSession::new(location));
        info!("Player {} joined", player);
    }

    pub fn leave(&self, player: &PlayerId) -> Option<PlayerSession> {
        let session = self.players.remove(player).map(|(_, s)| s);
        if session.is_some() {
            info!("Player {} left", player);
        }
        session
    }

    /// Spawn an entity whose id is derived from `name` (see `EntityId::named`).
    pub fn spawn_named(&self, name: &str, location: Location) -> EntityId {
        let id = EntityId::named(name);
        self.insert_entity(Entity {
            id,
            name: name.to_string(),
            location,
        });
        id
    }

    pub fn spawn_entity(&self, name: &str, location: Location) -> EntityId {
        let id = EntityId::new();
        self.insert_entity(Entity {
            id,
            name: name.to_string(),
            location,
        });
        id
    }

    pub fn insert_entity(&self, entity: Entity) {
        debug!("Entity {} ({}) spawned", entity.name, entity.id);
        self.entities.insert(entity.id, entity);
    }

    pub fn despawn_entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.remove(id).map(|(_, e)| e)
    }

    /// Drop all players, entities and ground items.
    pub fn clear(&self) {
        self.players.clear();
        self.entities.clear();
        self.ground_items_mut().clear();
    }

    pub fn session(&self, player: &PlayerId) -> Option<PlayerSession> {
        self.players.get(player).map(|s| s.value().clone())
    }

    pub fn experience(&self, player: &PlayerId) -> Option<u64> {
        self.players.get(player).map(|s| s.experience)
    }

    pub fn inventory(&self, player: &PlayerId) -> Option<Inventory> {
        self.players.get(player).map(|s| s.inventory.clone())
    }

    /// Give a connected player an item directly (bypasses reward logic).
    pub fn give_item(&self, player: &PlayerId, stack: &ItemStack) -> bool {
        self.players
            .get_mut(player)
            .is_some_and(|mut s| s.inventory.try_insert(stack))
    }

    pub fn ground_items(&self) -> Vec<GroundItem> {
        self.ground_items_mut().clone()
    }

    pub fn online_count(&self) -> usize {
        self.players.len()
    }

    fn ground_items_mut(&self) -> std::sync::MutexGuard<'_, Vec<GroundItem>> {
        self.ground_items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityResolver for SessionHost {
    fn resolve_entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.get(id).map(|e| e.value().clone())
    }
}

impl RewardTarget for SessionHost {
    fn current_recipients(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.iter().map(|p| p.key().clone()).collect();
        ids.sort();
        ids
    }

    fn try_insert(&self, recipient: &PlayerId, stack: &ItemStack) -> bool {
        self.players
            .get_mut(recipient)
            .is_some_and(|mut s| s.inventory.try_insert(stack))
    }

    fn location_of(&self, recipient: &PlayerId) -> Option<Location> {
        self.players.get(recipient).map(|s| s.location)
    }

    fn drop_at(&self, location: Location, stack: ItemStack) {
        debug!(
            "Dropping {} x{} at ({}, {})",
            stack.template.name(),
            stack.quantity,
            location.x,
            location.y
        );
        self.ground_items_mut().push(GroundItem { stack, location });
    }

    fn grant_experience(&self, recipient: &PlayerId, amount: u32) {
        if let Some(mut session) = self.players.get_mut(recipient) {
            session.experience += u64::from(amount);
        }
    }
}

//! Quest Rewards
//!
//! A closed set of reward variants. Each variant carries a stable kind tag
//! ("ITEM", "EXPERIENCE") used both for dispatch and for the persisted
//! record.

use tracing::{debug, warn};

use crate::error::{QuestError, RewardError};
use crate::host::{PlayerId, RewardTarget};
use crate::item::{ItemTemplate, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    Item,
    Experience,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Item => "ITEM",
            RewardKind::Experience => "EXPERIENCE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ITEM" => Some(RewardKind::Item),
            "EXPERIENCE" => Some(RewardKind::Experience),
            _ => None,
        }
    }
}

/// Where a reward ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delivery {
    Inventory,
    /// Inventory was full; the stack was dropped at the recipient's feet.
    Dropped(Location),
    Experience(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReward {
    item: ItemTemplate,
    amount: u32,
}

impl ItemReward {
    pub fn new(item: ItemTemplate, amount: u32) -> Result<Self, QuestError> {
        if amount == 0 {
            return Err(QuestError::InvalidAmount(0));
        }
        Ok(Self { item, amount })
    }

    pub fn item(&self) -> &ItemTemplate {
        &self.item
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    fn apply(&self, recipient: &PlayerId, target: &dyn RewardTarget) -> Result<Delivery, RewardError> {
        let stack = self.item.to_stack(self.amount);
        if target.try_insert(recipient, &stack) {
            return Ok(Delivery::Inventory);
        }

        match target.location_of(recipient) {
            Some(location) => {
                debug!(
                    "Inventory of {} is full, dropping {} x{}",
                    recipient,
                    self.item.name(),
                    self.amount
                );
                target.drop_at(location, stack);
                Ok(Delivery::Dropped(location))
            }
            None => Err(RewardError::Undeliverable {
                recipient: recipient.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceReward {
    amount: u32,
}

impl ExperienceReward {
    pub fn new(amount: u32) -> Result<Self, QuestError> {
        if amount == 0 {
            return Err(QuestError::InvalidAmount(0));
        }
        Ok(Self { amount })
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reward {
    Item(ItemReward),
    Experience(ExperienceReward),
}

impl Reward {
    pub fn item(item: ItemTemplate, amount: u32) -> Result<Self, QuestError> {
        ItemReward::new(item, amount).map(Reward::Item)
    }

    pub fn experience(amount: u32) -> Result<Self, QuestError> {
        ExperienceReward::new(amount).map(Reward::Experience)
    }

    /// Build a reward from loosely-typed parts (kind tag, amount, optional
    /// item), rejecting combinations that would yield a half-built reward.
    pub fn from_parts(kind: &str, amount: i64, item: Option<ItemTemplate>) -> Result<Self, QuestError> {
        let kind = RewardKind::from_str(kind)
            .ok_or_else(|| QuestError::UnknownRewardKind(kind.to_string()))?;
        let amount = u32::try_from(amount)
            .ok()
            .filter(|a| *a > 0)
            .ok_or(QuestError::InvalidAmount(amount))?;

        match kind {
            RewardKind::Item => {
                let item = item.ok_or(QuestError::MissingItem)?;
                Reward::item(item, amount)
            }
            RewardKind::Experience => {
                if item.is_some() {
                    warn!("Ignoring item on EXPERIENCE reward");
                }
                Reward::experience(amount)
            }
        }
    }

    pub fn kind(&self) -> RewardKind {
        match self {
            Reward::Item(_) => RewardKind::Item,
            Reward::Experience(_) => RewardKind::Experience,
        }
    }

    pub fn amount(&self) -> u32 {
        match self {
            Reward::Item(r) => r.amount,
            Reward::Experience(r) => r.amount,
        }
    }

    pub fn item_template(&self) -> Option<&ItemTemplate> {
        match self {
            Reward::Item(r) => Some(&r.item),
            Reward::Experience(_) => None,
        }
    }

    /// Grant this reward to one recipient.
    pub fn apply(&self, recipient: &PlayerId, target: &dyn RewardTarget) -> Result<Delivery, RewardError> {
        match self {
            Reward::Item(r) => r.apply(recipient, target),
            Reward::Experience(r) => {
                target.grant_experience(recipient, r.amount);
                Ok(Delivery::Experience(r.amount))
            }
        }
    }
}

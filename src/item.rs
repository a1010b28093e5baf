use serde::{Deserialize, Serialize};

// ============================================================================
// Item Templates
// ============================================================================

/// Kind plus display metadata for an item; cloned into stacks on grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTemplate {
    /// Material / prototype id (e.g. "diamond", "health_potion")
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
}

impl ItemTemplate {
    pub fn new(kind: &str, display_name: &str, lore: Vec<String>) -> Self {
        Self {
            kind: kind.to_string(),
            display_name: Some(display_name.to_string()),
            lore,
        }
    }

    /// A bare template with no display metadata.
    pub fn plain(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            display_name: None,
            lore: Vec::new(),
        }
    }

    /// Clone this template into a stack of `quantity`.
    pub fn to_stack(&self, quantity: u32) -> ItemStack {
        ItemStack {
            template: self.clone(),
            quantity,
        }
    }

    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub template: ItemTemplate,
    pub quantity: u32,
}

impl ItemStack {
    /// Two stacks merge only when their templates are identical.
    pub fn stacks_with(&self, other: &ItemStack) -> bool {
        self.template == other.template
    }
}

// ============================================================================
// Inventory
// ============================================================================

pub const INVENTORY_SIZE: usize = 20;
pub const MAX_STACK: u32 = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            slots: vec![None; INVENTORY_SIZE],
        }
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    /// Try to place a whole stack. Fills matching stacks first, then empty
    /// slots. Leaves the inventory untouched and returns false if the stack
    /// does not fit entirely.
    pub fn try_insert(&mut self, stack: &ItemStack) -> bool {
        if stack.quantity == 0 {
            return true;
        }

        let mut room = 0u32;
        for slot in &self.slots {
            room += match slot {
                Some(existing) if existing.stacks_with(stack) => {
                    MAX_STACK.saturating_sub(existing.quantity)
                }
                Some(_) => 0,
                None => MAX_STACK,
            };
        }
        if room < stack.quantity {
            return false;
        }

        let mut quantity = stack.quantity;

        // First, try to stack with existing items
        for slot in self.slots.iter_mut().flatten() {
            if quantity == 0 {
                break;
            }
            if slot.stacks_with(stack) {
                let add = quantity.min(MAX_STACK.saturating_sub(slot.quantity));
                slot.quantity += add;
                quantity -= add;
            }
        }

        // Then, spill the remainder into empty slots
        for slot in &mut self.slots {
            if quantity == 0 {
                break;
            }
            if slot.is_none() {
                let add = quantity.min(MAX_STACK);
                *slot = Some(stack.template.to_stack(add));
                quantity -= add;
            }
        }

        true
    }

    /// Total quantity held of a given item kind.
    pub fn count(&self, kind: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.template.kind == kind)
            .map(|s| s.quantity)
            .sum()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Ground Item (dropped in world)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub x: f32,
    pub y: f32,
}

impl Location {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundItem {
    pub stack: ItemStack,
    pub location: Location,
}

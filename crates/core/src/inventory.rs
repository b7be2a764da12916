//! Item inventory - claim flags and remaining uses per item
//!
//! An item must be claimed before it can be used. Claiming grants uses;
//! every level load resets claimed items back to the configured default.

use crate::config::ItemConfig;
use crate::store::KeyValueStore;
use triple_tray_types::ItemKind;

/// Claim state and uses of one item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemSlot {
    pub claimed: bool,
    pub uses: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    slots: [ItemSlot; 3],
}

fn index(kind: ItemKind) -> usize {
    match kind {
        ItemKind::Remove => 0,
        ItemKind::Undo => 1,
        ItemKind::Shuffle => 2,
    }
}

fn claimed_key(kind: ItemKind) -> String {
    format!("item.{}.claimed", kind.as_str())
}

fn uses_key(kind: ItemKind) -> String {
    format!("item.{}.uses", kind.as_str())
}

impl Inventory {
    /// Fresh inventory following `config`
    pub fn new(config: &ItemConfig) -> Self {
        let mut inventory = Self::default();
        if config.start_claimed {
            for kind in ItemKind::ALL {
                inventory.slots[index(kind)] = ItemSlot {
                    claimed: true,
                    uses: config.default_uses,
                };
            }
        }
        inventory
    }

    pub fn slot(&self, kind: ItemKind) -> ItemSlot {
        self.slots[index(kind)]
    }

    pub fn is_claimed(&self, kind: ItemKind) -> bool {
        self.slot(kind).claimed
    }

    pub fn uses(&self, kind: ItemKind) -> u32 {
        self.slot(kind).uses
    }

    /// Claimed with at least one use left
    pub fn can_spend(&self, kind: ItemKind) -> bool {
        let slot = self.slot(kind);
        slot.claimed && slot.uses > 0
    }

    /// Mark claimed and grant `amount` uses
    pub fn claim(&mut self, kind: ItemKind, amount: u32) {
        let slot = &mut self.slots[index(kind)];
        slot.claimed = true;
        slot.uses = slot.uses.saturating_add(amount);
    }

    /// Spend one use
    pub fn consume(&mut self, kind: ItemKind) -> bool {
        if !self.can_spend(kind) {
            return false;
        }
        self.slots[index(kind)].uses -= 1;
        true
    }

    /// Level-load reset: claimed items get the default uses back
    pub fn reset_to_default(&mut self, config: &ItemConfig) {
        for slot in &mut self.slots {
            if slot.claimed || config.start_claimed {
                slot.claimed = true;
                slot.uses = config.default_uses;
            }
        }
    }

    /// Read every slot from `store`, keeping current values for missing keys
    pub fn load(&mut self, store: &dyn KeyValueStore) {
        for kind in ItemKind::ALL {
            let slot = &mut self.slots[index(kind)];
            if let Some(claimed) = store.get(&claimed_key(kind)) {
                slot.claimed = claimed != 0;
            }
            if let Some(uses) = store.get(&uses_key(kind)) {
                slot.uses = u32::try_from(uses.max(0)).unwrap_or(u32::MAX);
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        for kind in ItemKind::ALL {
            let slot = self.slot(kind);
            store.set(&claimed_key(kind), i64::from(slot.claimed));
            store.set(&uses_key(kind), i64::from(slot.uses));
        }
    }
}

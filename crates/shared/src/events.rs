use serde::{Deserialize, Serialize};

use crate::domain::{CartItem, ItemId};

/// Derived view of the cart that read-only consumers render from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub item_count: usize,
    pub total: u64,
}

impl CartSnapshot {
    pub fn of(items: &[CartItem]) -> Self {
        Self {
            item_count: items.len(),
            total: items.iter().map(|item| u64::from(item.price)).sum(),
        }
    }

    /// Navbar badge text: `Cart (2)`, or plain `Cart` when empty.
    pub fn badge(&self) -> String {
        if self.item_count > 0 {
            format!("Cart ({})", self.item_count)
        } else {
            "Cart".to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CartEvent {
    ItemAdded {
        item: CartItem,
        snapshot: CartSnapshot,
    },
    ItemRemoved {
        id: ItemId,
        snapshot: CartSnapshot,
    },
    Cleared {
        snapshot: CartSnapshot,
    },
    Restored {
        snapshot: CartSnapshot,
    },
}

impl CartEvent {
    pub fn snapshot(&self) -> CartSnapshot {
        match self {
            CartEvent::ItemAdded { snapshot, .. }
            | CartEvent::ItemRemoved { snapshot, .. }
            | CartEvent::Cleared { snapshot }
            | CartEvent::Restored { snapshot } => *snapshot,
        }
    }
}

use std::collections::HashSet;

use crossbeam_channel::{unbounded, Receiver, Sender};
use shared::{
    domain::{CartItem, ItemId},
    events::{CartEvent, CartSnapshot},
};
use storage::SlotStore;
use tracing::{debug, info, warn};

pub const DEFAULT_STORAGE_KEY: &str = "onyx-booking-cart";

/// Anything that accepts selected offerings. Producers (wizard, package
/// tiers) only need this, not the whole store.
pub trait CartSink {
    /// Returns `false` when an item with the same id is already present.
    fn add_item(&mut self, item: CartItem) -> bool;
}

/// Result of decoding the persisted slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Empty,
    Restored(Vec<CartItem>),
    Discarded { reason: String },
}

pub fn decode_persisted(raw: Option<&str>) -> LoadOutcome {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return LoadOutcome::Empty;
    };

    match serde_json::from_str::<Vec<CartItem>>(raw) {
        Ok(items) => LoadOutcome::Restored(dedupe_first_seen(items)),
        Err(err) => LoadOutcome::Discarded {
            reason: err.to_string(),
        },
    }
}

fn dedupe_first_seen(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Single source of truth for the selected offerings, mirrored to one storage
/// slot after every change.
pub struct CartStore<S: SlotStore> {
    store: S,
    key: String,
    items: Vec<CartItem>,
    subscribers: Vec<Sender<CartEvent>>,
}

impl<S: SlotStore> CartStore<S> {
    pub fn open(store: S) -> Self {
        Self::open_with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn open_with_key(store: S, key: impl Into<String>) -> Self {
        let mut cart = Self {
            store,
            key: key.into(),
            items: Vec::new(),
            subscribers: Vec::new(),
        };
        cart.items = cart.load().unwrap_or_default();
        cart
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.price)).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == *id)
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::of(&self.items)
    }

    /// Receives one event per effective mutation. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<CartEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn add_item(&mut self, item: CartItem) -> bool {
        if self.contains(item.id.as_str()) {
            debug!(id = %item.id, "cart already holds item; add ignored");
            return false;
        }

        debug!(id = %item.id, price = item.price, "adding cart item");
        self.items.push(item.clone());
        self.persist();
        let snapshot = self.snapshot();
        self.publish(CartEvent::ItemAdded { item, snapshot });
        true
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != *id);
        if self.items.len() == before {
            return false;
        }

        debug!(id, "removed cart item");
        self.persist();
        let snapshot = self.snapshot();
        self.publish(CartEvent::ItemRemoved {
            id: ItemId::new(id),
            snapshot,
        });
        true
    }

    pub fn clear_cart(&mut self) {
        debug!(count = self.items.len(), "clearing cart");
        self.items.clear();
        self.persist();
        self.publish(CartEvent::Cleared {
            snapshot: CartSnapshot::default(),
        });
    }

    /// Replaces in-memory state with whatever the slot holds now. Returns
    /// `false` and keeps the current items when the slot cannot be read.
    pub fn reload(&mut self) -> bool {
        let Some(items) = self.load() else {
            return false;
        };
        self.items = items;
        let snapshot = self.snapshot();
        self.publish(CartEvent::Restored { snapshot });
        true
    }

    /// `None` when the slot could not be read at all. Empty and corrupt slots
    /// both yield an empty list.
    fn load(&self) -> Option<Vec<CartItem>> {
        let raw = match self.store.read(&self.key) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read persisted cart");
                return None;
            }
        };

        let items = match decode_persisted(raw.as_deref()) {
            LoadOutcome::Empty => Vec::new(),
            LoadOutcome::Restored(items) => {
                info!(key = %self.key, count = items.len(), "restored persisted cart");
                items
            }
            LoadOutcome::Discarded { reason } => {
                warn!(key = %self.key, %reason, "discarding corrupt persisted cart");
                if let Err(err) = self.store.remove(&self.key) {
                    warn!(key = %self.key, error = %err, "failed to remove corrupt cart slot");
                }
                Vec::new()
            }
        };
        Some(items)
    }

    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.items) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to serialize cart");
                return;
            }
        };
        if let Err(err) = self.store.write(&self.key, &serialized) {
            warn!(key = %self.key, error = %err, "failed to persist cart; keeping in-memory state");
        }
    }

    fn publish(&mut self, event: CartEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl<S: SlotStore> CartSink for CartStore<S> {
    fn add_item(&mut self, item: CartItem) -> bool {
        CartStore::add_item(self, item)
    }
}

#[cfg(test)]
#[path = "tests/cart_tests.rs"]
mod tests;

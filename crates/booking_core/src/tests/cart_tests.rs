use super::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::domain::{CATEGORY_BOOKING, CATEGORY_DETAILING};
use storage::{FileSlotStore, MemorySlotStore, StorageError};

fn item(id: &str, price: u32) -> CartItem {
    CartItem::new(id, format!("Item {id}"), price, CATEGORY_DETAILING)
}

fn ids<S: SlotStore>(cart: &CartStore<S>) -> Vec<&str> {
    cart.items().iter().map(|item| item.id.as_str()).collect()
}

/// Storage that refuses every operation, like a browser with storage disabled.
struct DisabledStore;

impl SlotStore for DisabledStore {
    fn read(&self, key: &str) -> storage::Result<Option<String>> {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "storage disabled",
        })
    }

    fn write(&self, key: &str, _value: &str) -> storage::Result<()> {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "quota exceeded",
        })
    }

    fn remove(&self, key: &str) -> storage::Result<()> {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "storage disabled",
        })
    }
}

/// Memory-backed slots whose reads can be switched off after the cart opens.
#[derive(Clone, Default)]
struct FlakyReadStore {
    inner: MemorySlotStore,
    reads_fail: Arc<AtomicBool>,
}

impl SlotStore for FlakyReadStore {
    fn read(&self, key: &str) -> storage::Result<Option<String>> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Poisoned);
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> storage::Result<()> {
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> storage::Result<()> {
        self.inner.remove(key)
    }
}

#[test]
fn starts_empty_without_persisted_state() {
    let cart = CartStore::open(MemorySlotStore::new());
    assert!(cart.is_empty());
    assert_eq!(cart.total(), 0);
    assert_eq!(cart.storage_key(), "onyx-booking-cart");
}

#[test]
fn add_is_idempotent_per_id_and_keeps_first_seen_order() {
    let mut cart = CartStore::open(MemorySlotStore::new());

    assert!(cart.add_item(item("b", 10)));
    assert!(cart.add_item(item("a", 20)));
    assert!(!cart.add_item(CartItem::new("b", "Replacement", 999, CATEGORY_BOOKING)));
    assert!(cart.add_item(item("c", 30)));
    assert!(!cart.add_item(item("a", 20)));

    assert_eq!(ids(&cart), vec!["b", "a", "c"]);
    assert_eq!(cart.items()[0].name, "Item b", "first write wins");
    assert_eq!(cart.total(), 60);
}

#[test]
fn remove_then_add_restores_entry() {
    let mut cart = CartStore::open(MemorySlotStore::new());
    cart.add_item(item("gold-package", 1500));
    cart.add_item(item("platinum-package", 2650));

    assert!(cart.remove_item("gold-package"));
    assert!(!cart.remove_item("gold-package"));
    assert_eq!(ids(&cart), vec!["platinum-package"]);

    assert!(cart.add_item(item("gold-package", 1500)));
    assert_eq!(ids(&cart), vec!["platinum-package", "gold-package"]);
    assert_eq!(cart.total(), 4150);
}

#[test]
fn clear_empties_cart_and_slot() {
    let slots = MemorySlotStore::new();
    let mut cart = CartStore::open(slots.clone());
    cart.add_item(item("a", 5));
    cart.clear_cart();

    assert!(cart.is_empty());
    assert_eq!(cart.total(), 0);
    assert_eq!(
        slots.read(DEFAULT_STORAGE_KEY).expect("read").as_deref(),
        Some("[]")
    );
}

#[test]
fn total_tracks_every_mutation() {
    let mut cart = CartStore::open(MemorySlotStore::new());
    let expected = |cart: &CartStore<MemorySlotStore>| -> u64 {
        cart.items().iter().map(|item| u64::from(item.price)).sum()
    };

    cart.add_item(item("a", 1500));
    assert_eq!(cart.total(), expected(&cart));
    cart.add_item(item("b", 2650));
    assert_eq!(cart.total(), expected(&cart));
    cart.remove_item("a");
    assert_eq!(cart.total(), expected(&cart));
    cart.add_item(item("c", 0));
    assert_eq!(cart.total(), 2650);
    cart.clear_cart();
    assert_eq!(cart.total(), 0);
}

#[test]
fn every_mutation_writes_the_full_list() {
    let slots = MemorySlotStore::new();
    let mut cart = CartStore::open(slots.clone());

    cart.add_item(item("a", 1));
    cart.add_item(item("b", 2));
    let stored: Vec<CartItem> = serde_json::from_str(
        &slots
            .read(DEFAULT_STORAGE_KEY)
            .expect("read")
            .expect("slot written"),
    )
    .expect("decode");
    assert_eq!(stored, cart.items());

    cart.remove_item("a");
    let stored: Vec<CartItem> = serde_json::from_str(
        &slots
            .read(DEFAULT_STORAGE_KEY)
            .expect("read")
            .expect("slot written"),
    )
    .expect("decode");
    assert_eq!(stored, vec![item("b", 2)]);
}

#[test]
fn reopening_restores_identical_items() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cart = CartStore::open(FileSlotStore::new(dir.path()));
    cart.add_item(CartItem::new("gold-package", "Gold Package", 1500, CATEGORY_DETAILING));
    cart.add_item(CartItem::new(
        "platinum-suv-2025-06-01",
        "Platinum Package (SUV)",
        2650,
        CATEGORY_BOOKING,
    ));
    let written = cart.items().to_vec();
    drop(cart);

    let reopened = CartStore::open(FileSlotStore::new(dir.path()));
    assert_eq!(reopened.items(), written.as_slice());
    assert_eq!(reopened.total(), 4150);
}

#[test]
fn malformed_slot_yields_empty_cart_and_is_removed() {
    for raw in ["{not json", r#"{"id":"a"}"#, "42", r#"[{"id":"a","price":"free"}]"#] {
        let slots = MemorySlotStore::with_slot(DEFAULT_STORAGE_KEY, raw).expect("seed");
        let cart = CartStore::open(slots.clone());

        assert!(cart.is_empty(), "expected empty cart for {raw:?}");
        assert_eq!(
            slots.read(DEFAULT_STORAGE_KEY).expect("read"),
            None,
            "corrupt slot should be removed for {raw:?}"
        );
    }
}

#[test]
fn restored_duplicates_are_collapsed() {
    let raw = serde_json::to_string(&vec![item("a", 1), item("b", 2), item("a", 3)]).expect("json");
    let cart =
        CartStore::open(MemorySlotStore::with_slot(DEFAULT_STORAGE_KEY, &raw).expect("seed"));

    assert_eq!(ids(&cart), vec!["a", "b"]);
    assert_eq!(cart.total(), 3);
}

#[test]
fn decode_distinguishes_empty_restored_and_discarded() {
    assert_eq!(decode_persisted(None), LoadOutcome::Empty);
    assert_eq!(decode_persisted(Some("  ")), LoadOutcome::Empty);
    assert_eq!(decode_persisted(Some("[]")), LoadOutcome::Restored(Vec::new()));
    assert!(matches!(
        decode_persisted(Some("null")),
        LoadOutcome::Discarded { .. }
    ));
}

#[test]
fn storage_failures_never_reach_the_caller() {
    let mut cart = CartStore::open(DisabledStore);
    assert!(cart.is_empty());

    assert!(cart.add_item(item("a", 100)));
    assert!(cart.remove_item("a"));
    cart.add_item(item("b", 7));
    cart.clear_cart();
    cart.add_item(item("c", 9));

    assert_eq!(ids(&cart), vec!["c"]);
    assert_eq!(cart.total(), 9);
}

#[test]
fn subscribers_see_count_after_each_effective_change() {
    let mut cart = CartStore::open(MemorySlotStore::new());
    let badge = cart.subscribe();

    cart.add_item(item("a", 10));
    cart.add_item(item("a", 10));
    cart.add_item(item("b", 5));
    cart.remove_item("missing");
    cart.remove_item("a");
    cart.clear_cart();

    let counts: Vec<usize> = badge
        .try_iter()
        .map(|event| event.snapshot().item_count)
        .collect();
    assert_eq!(counts, vec![1, 2, 1, 0]);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let mut cart = CartStore::open(MemorySlotStore::new());
    let dropped = cart.subscribe();
    let kept = cart.subscribe();
    drop(dropped);

    cart.add_item(item("a", 1));

    assert_eq!(cart.subscribers.len(), 1);
    assert!(matches!(
        kept.try_recv().expect("event"),
        CartEvent::ItemAdded { .. }
    ));
}

#[test]
fn reload_picks_up_writes_from_another_instance() {
    let slots = MemorySlotStore::new();
    let mut first = CartStore::open(slots.clone());
    let mut second = CartStore::open(slots.clone());

    second.add_item(item("from-other-tab", 40));
    assert!(first.is_empty(), "no live cross-instance sync");

    let events = first.subscribe();
    assert!(first.reload());
    assert_eq!(ids(&first), vec!["from-other-tab"]);
    assert_eq!(
        events.try_recv().expect("event"),
        CartEvent::Restored {
            snapshot: CartSnapshot {
                item_count: 1,
                total: 40
            }
        }
    );
}

#[test]
fn failed_reload_keeps_items_and_stored_copy() {
    let store = FlakyReadStore::default();
    let mut cart = CartStore::open(store.clone());
    cart.add_item(item("a", 10));
    cart.add_item(item("b", 20));
    let events = cart.subscribe();

    store.reads_fail.store(true, Ordering::SeqCst);
    assert!(!cart.reload());
    assert_eq!(ids(&cart), vec!["a", "b"]);
    assert!(events.try_recv().is_err(), "no restore event on failed read");

    cart.add_item(item("c", 30));
    store.reads_fail.store(false, Ordering::SeqCst);
    let reopened = CartStore::open(store);
    assert_eq!(ids(&reopened), vec!["a", "b", "c"]);
    assert_eq!(reopened.total(), 60);
}

#[test]
fn custom_storage_key_is_isolated() {
    let slots = MemorySlotStore::new();
    let mut default_cart = CartStore::open(slots.clone());
    let mut other_cart = CartStore::open_with_key(slots.clone(), "other-cart");

    default_cart.add_item(item("a", 1));
    other_cart.add_item(item("b", 2));

    assert_eq!(ids(&CartStore::open(slots.clone())), vec!["a"]);
    assert_eq!(ids(&CartStore::open_with_key(slots, "other-cart")), vec!["b"]);
}

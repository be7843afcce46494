//! Cart
//!
//! The cart state manager: line items in insertion order, derived totals and the
//! panel visibility flag. Every change to the items is written through to the
//! [`PersistentStore`] under [`CART_STORAGE_KEY`].

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, info, warn};

use crate::{
    pricing::{item_count, total_price},
    store::{CART_STORAGE_KEY, PersistentStore},
};

pub mod line_item;

pub use line_item::CartLineItem;

/// Shopping cart
#[derive(Debug)]
pub struct Cart {
    items: Vec<CartLineItem>,
    is_open: bool,
    currency: &'static Currency,
    store: PersistentStore,
}

impl Cart {
    /// Restore the cart persisted in `store`, or start with an empty cart.
    ///
    /// A missing or unreadable document, or one with duplicate line ids, yields an
    /// empty cart. Lines with a zero quantity or a negative price are dropped.
    pub fn load(store: PersistentStore, currency: &'static Currency) -> Self {
        let items = store
            .load::<Vec<CartLineItem>>(CART_STORAGE_KEY)
            .and_then(restorable)
            .unwrap_or_default();

        debug!(items = items.len(), "cart restored");

        Self {
            items,
            is_open: false,
            currency,
            store,
        }
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line item by id.
    pub fn get(&self, item_id: &str) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Number of distinct line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price times quantity, recomputed on every call.
    pub fn total(&self) -> Decimal {
        total_price(&self.items)
    }

    /// [`Cart::total`] in the cart currency.
    pub fn total_money(&self) -> Money<'static, Currency> {
        Money::from_decimal(self.total(), self.currency)
    }

    /// Sum of quantities, recomputed on every call.
    pub fn item_count(&self) -> u64 {
        item_count(&self.items)
    }

    /// Whether the cart panel is showing.
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Show or hide the cart panel. Not persisted.
    pub fn set_open(&mut self, open: bool) {
        self.is_open = open;
    }

    /// Currency used to display prices.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Copy of the current line items.
    pub fn snapshot(&self) -> Vec<CartLineItem> {
        self.items.clone()
    }

    /// Add an item, merging quantities with an existing line of the same id.
    ///
    /// Opens the cart panel. Items with a zero quantity are ignored.
    pub fn add_item(&mut self, item: CartLineItem) {
        if item.quantity == 0 {
            debug!(item_id = %item.id, "ignoring zero quantity");

            return;
        }

        info!(
            event = "add_to_cart",
            item_id = %item.id,
            item_name = %item.name,
            item_variant = item.variant.as_deref(),
            price = %item.price,
            quantity = item.quantity,
        );

        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }

        self.is_open = true;
        self.persist();
    }

    /// Replace the quantity of a line item in place.
    ///
    /// Quantities below one are ignored; use [`Cart::remove_item`] to drop a line.
    pub fn update_quantity(&mut self, item_id: &str, new_quantity: i64) {
        if new_quantity < 1 {
            debug!(item_id, new_quantity, "ignoring non-positive quantity");

            return;
        }

        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);

        let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) else {
            return;
        };

        item.quantity = quantity;

        info!(
            event = "update_cart",
            item_id,
            item_name = %item.name,
            item_variant = item.variant.as_deref(),
            price = %item.price,
            quantity,
        );

        self.persist();
    }

    /// Remove the line item with the given id, if present.
    pub fn remove_item(&mut self, item_id: &str) {
        let before = self.items.len();

        self.items.retain(|item| item.id != item_id);

        if self.items.len() != before {
            info!(event = "remove_from_cart", item_id);

            self.persist();
        }
    }

    /// Remove every line item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        self.store.save(CART_STORAGE_KEY, &self.items);
    }
}

fn restorable(items: Vec<CartLineItem>) -> Option<Vec<CartLineItem>> {
    {
        let mut seen = FxHashSet::default();

        for item in &items {
            if !seen.insert(item.id.as_str()) {
                warn!(item_id = %item.id, "discarding persisted cart with duplicate line ids");

                return None;
            }
        }
    }

    let restored = items
        .into_iter()
        .filter(|item| {
            let valid = item.quantity > 0 && !item.price.is_sign_negative();

            if !valid {
                warn!(
                    item_id = %item.id,
                    quantity = item.quantity,
                    price = %item.price,
                    "dropping invalid persisted line item"
                );
            }

            valid
        })
        .collect();

    Some(restored)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::store::{MemoryStorage, MockStorage, Storage, StorageError};

    use super::*;

    fn open_cart(storage: Arc<dyn Storage>) -> Cart {
        Cart::load(PersistentStore::new(storage), USD)
    }

    fn item(id: &str, price: i64, quantity: u32) -> CartLineItem {
        CartLineItem::new(id, format!("Product {id}"), Decimal::from(price), quantity)
    }

    #[test]
    fn new_cart_is_empty_and_closed() {
        let cart = open_cart(Arc::new(MemoryStorage::new()));

        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert_eq!(cart.currency(), USD);
    }

    #[test]
    fn add_item_merges_same_id() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("p1-red", 10, 2));
        cart.add_item(item("p1-red", 10, 3));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("p1-red").map(|line| line.quantity), Some(5));
        assert_eq!(cart.total(), Decimal::from(50));
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn add_item_appends_in_insertion_order_and_opens_panel() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("b", 1, 1));
        cart.add_item(item("a", 2, 1));
        cart.add_item(item("b", 1, 1));

        let ids: Vec<&str> = cart.items().iter().map(|line| line.id.as_str()).collect();

        assert_eq!(ids, ["b", "a"]);
        assert!(cart.is_open());
    }

    #[test]
    fn update_quantity_ignores_non_positive_values() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("p1", 10, 2));

        let before = cart.snapshot();

        cart.update_quantity("p1", 0);
        cart.update_quantity("p1", -1);

        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn update_quantity_replaces_in_place() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("a", 10, 1));
        cart.add_item(item("b", 5, 1));
        cart.update_quantity("a", 4);

        assert_eq!(cart.items().first().map(|line| line.quantity), Some(4));
        assert_eq!(cart.total(), Decimal::from(45));
    }

    #[test]
    fn remove_item_drops_exactly_one_entry() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("a", 10, 1));
        cart.add_item(item("b", 5, 2));

        cart.remove_item("missing");
        assert_eq!(cart.len(), 2);

        cart.remove_item("a");
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), Decimal::from(10));
    }

    #[test]
    fn clear_zeroes_totals() {
        let mut cart = open_cart(Arc::new(MemoryStorage::new()));

        cart.add_item(item("a", 10, 1));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn mutations_are_written_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut cart = open_cart(storage.clone());

        cart.add_item(item("a", 10, 1));
        cart.add_item(item("b", 5, 2));
        cart.update_quantity("b", 3);

        let restored = open_cart(storage);

        assert_eq!(restored.items(), cart.items());
        assert!(!restored.is_open(), "open flag is not persisted");
    }

    #[test]
    fn set_open_does_not_write() {
        let mut storage = MockStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().never();

        let mut cart = open_cart(Arc::new(storage));

        cart.set_open(true);
        cart.set_open(false);

        assert!(!cart.is_open());
    }

    #[test]
    fn corrupt_document_restores_empty_cart() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set_item(CART_STORAGE_KEY, "not json")?;

        assert!(open_cart(storage).is_empty());

        Ok(())
    }

    #[test]
    fn add_item_ignores_zero_quantity() {
        let mut storage = MockStorage::new();

        storage.expect_get_item().returning(|_| Ok(None));
        storage.expect_set_item().never();

        let mut cart = open_cart(Arc::new(storage));

        cart.add_item(item("a", 10, 0));

        assert!(cart.is_empty());
        assert!(!cart.is_open(), "an ignored add does not open the panel");
    }

    #[test]
    fn invalid_lines_are_dropped_on_restore() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set_item(
            CART_STORAGE_KEY,
            r#"[{"id":"a","name":"A","price":"1","quantity":2},{"id":"b","name":"B","price":"1","quantity":0},{"id":"c","name":"C","price":"-3","quantity":1}]"#,
        )?;

        let cart = open_cart(storage);
        let ids: Vec<&str> = cart.items().iter().map(|line| line.id.as_str()).collect();

        assert_eq!(ids, ["a"]);
        assert_eq!(cart.item_count(), 2);

        Ok(())
    }

    #[test]
    fn duplicate_ids_restore_empty_cart() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set_item(
            CART_STORAGE_KEY,
            r#"[{"id":"a","name":"A","price":"1","quantity":1},{"id":"a","name":"A","price":"1","quantity":2}]"#,
        )?;

        assert!(open_cart(storage).is_empty());

        Ok(())
    }

    #[test]
    fn unavailable_storage_keeps_working_in_memory() {
        let mut storage = MockStorage::new();

        storage
            .expect_get_item()
            .returning(|_| Err(StorageError::Unavailable));
        storage
            .expect_set_item()
            .times(2)
            .returning(|_, _| Err(StorageError::Unavailable));

        let mut cart = open_cart(Arc::new(storage));

        cart.add_item(item("a", 10, 1));
        cart.add_item(item("a", 10, 1));

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Decimal::from(20));
    }

    #[test]
    fn quota_exhaustion_keeps_in_memory_state() {
        let mut cart = open_cart(Arc::new(MemoryStorage::with_quota(16)));

        cart.add_item(item("a-very-long-product-id", 10, 1));

        assert_eq!(cart.len(), 1);
    }
}

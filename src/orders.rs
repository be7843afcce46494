//! Orders
//!
//! Synthetic orders created by a successful checkout and the persisted list they are
//! appended to.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    cart::CartLineItem,
    checkout::payment::PaymentReceipt,
    pricing::total_price,
    store::{ORDERS_STORAGE_KEY, PersistentStore},
};

/// Generated order id (`order_…`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Generate a fresh order id
    pub fn generate() -> Self {
        Self(format!("order_{}", Uuid::now_v7().simple()))
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Fulfilment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid and awaiting fulfilment
    Processing,
}

/// Order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Order id
    pub id: OrderId,

    /// When the order was placed
    pub created_at: Timestamp,

    /// Cart contents at the time of payment
    pub items: Vec<CartLineItem>,

    /// Sum of the line totals
    pub total: Decimal,

    /// Approved payment
    pub payment: PaymentReceipt,

    /// Fulfilment status
    pub status: OrderStatus,
}

impl Order {
    /// Create a processing order for a snapshot of the cart
    pub fn new(items: Vec<CartLineItem>, payment: PaymentReceipt) -> Self {
        Self {
            id: OrderId::generate(),
            created_at: Timestamp::now(),
            total: total_price(&items),
            items,
            payment,
            status: OrderStatus::Processing,
        }
    }
}

/// Persisted list of placed orders
#[derive(Debug, Clone)]
pub struct OrderBook {
    store: PersistentStore,
}

impl OrderBook {
    /// Create an order book over the given store
    pub fn new(store: PersistentStore) -> Self {
        Self { store }
    }

    /// Every persisted order, oldest first
    pub fn orders(&self) -> Vec<Order> {
        self.store
            .load::<Vec<Order>>(ORDERS_STORAGE_KEY)
            .unwrap_or_default()
    }

    /// Look up an order by id
    pub fn find(&self, id: &OrderId) -> Option<Order> {
        self.orders().into_iter().find(|order| &order.id == id)
    }

    /// Append an order to the persisted list.
    ///
    /// Returns whether the list was written.
    pub fn append(&self, order: &Order) -> bool {
        let mut orders = self.orders();

        orders.push(order.clone());

        self.store.save(ORDERS_STORAGE_KEY, &orders)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        checkout::{contact::ContactDetails, payment::PaymentMethod},
        store::{MemoryStorage, Storage},
    };

    use super::*;

    fn order() -> Order {
        let items = vec![
            CartLineItem::new("p1-red", "Filter", Decimal::from(10), 2),
            CartLineItem::new("p2", "Valve", Decimal::new(250, 2), 4),
        ];

        let payment = PaymentReceipt::approved(
            total_price(&items),
            USD,
            PaymentMethod::Card,
            ContactDetails::with_email("jane@example.com"),
        );

        Order::new(items, payment)
    }

    #[test]
    fn new_order_is_processing_with_snapshot_total() {
        let order = order();

        assert!(order.id.as_str().starts_with("order_"));
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total, Decimal::from(30));
        assert_eq!(order.payment.amount, 3_000);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
    }

    #[test]
    fn append_preserves_existing_orders() {
        let book = OrderBook::new(PersistentStore::new(Arc::new(MemoryStorage::new())));
        let first = order();
        let second = order();

        assert!(book.append(&first), "first append should persist");
        assert!(book.append(&second), "second append should persist");

        assert_eq!(book.orders(), vec![first.clone(), second]);
        assert_eq!(book.find(&first.id), Some(first));
    }

    #[test]
    fn corrupt_order_list_reads_as_empty() -> TestResult {
        let storage = Arc::new(MemoryStorage::new());

        storage.set_item(ORDERS_STORAGE_KEY, "{oops")?;

        let book = OrderBook::new(PersistentStore::new(storage));

        assert!(book.orders().is_empty());

        Ok(())
    }

    #[test]
    fn serializes_with_camel_case_keys() -> TestResult {
        let json = serde_json::to_value(order())?;

        assert!(json.get("createdAt").is_some());
        assert_eq!(json.get("status"), Some(&serde_json::json!("processing")));
        assert_eq!(
            json.pointer("/payment/paymentMethod"),
            Some(&serde_json::json!("card"))
        );

        Ok(())
    }
}

//! In-process OrderStore used for local development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::Order;
use crate::ports::{OrderStore, RepositoryResult};

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|order| (order.reference.clone(), order))
            .collect();
        Self {
            orders: RwLock::new(orders),
        }
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Order>> {
        Ok(self.orders.read().await.get(reference).cloned())
    }

    async fn set_paid_if_pending(&self, reference: &str) -> RepositoryResult<bool> {
        // The write lock makes check-and-set atomic per store.
        let mut orders = self.orders.write().await;
        Ok(orders
            .get_mut(reference)
            .map(Order::mark_paid)
            .unwrap_or(false))
    }

    async fn set_failed_if_pending(&self, reference: &str) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().await;
        Ok(orders
            .get_mut(reference)
            .map(Order::mark_failed)
            .unwrap_or(false))
    }

    async fn attach_transaction(&self, reference: &str, transaction_id: &str) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().await;
        Ok(match orders.get_mut(reference) {
            Some(order) => {
                order.attach_transaction(transaction_id);
                true
            }
            None => false,
        })
    }

    async fn insert_pending(&self, order: &Order) -> RepositoryResult<bool> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.reference) {
            return Ok(false);
        }
        orders.insert(order.reference.clone(), order.clone());
        Ok(true)
    }

    async fn ping(&self) -> RepositoryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;
    use std::sync::Arc;

    fn order(reference: &str) -> Order {
        Order::pending(
            reference.to_string(),
            50000,
            "COP".to_string(),
            "a@b.com".to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_on_reference() {
        let store = InMemoryOrderStore::new();
        assert!(store.insert_pending(&order("ORDER-0001")).await.unwrap());
        assert!(!store.insert_pending(&order("ORDER-0001")).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_set_paid_transitions_once() {
        let store = InMemoryOrderStore::with_orders([order("ORDER-0001")]);

        assert!(store.set_paid_if_pending("ORDER-0001").await.unwrap());
        assert!(!store.set_paid_if_pending("ORDER-0001").await.unwrap());

        let stored = store.find_by_reference("ORDER-0001").await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_set_paid_unknown_reference() {
        let store = InMemoryOrderStore::new();
        assert!(!store.set_paid_if_pending("ORDER-404").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_only_from_pending() {
        let store = InMemoryOrderStore::with_orders([order("ORDER-0001"), order("ORDER-0002")]);
        store.set_paid_if_pending("ORDER-0002").await.unwrap();

        assert!(store.set_failed_if_pending("ORDER-0001").await.unwrap());
        assert!(!store.set_failed_if_pending("ORDER-0002").await.unwrap());
        assert!(!store.set_paid_if_pending("ORDER-0001").await.unwrap());

        let paid = store.find_by_reference("ORDER-0002").await.unwrap().unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_attach_transaction_after_payment() {
        let store = InMemoryOrderStore::with_orders([order("ORDER-0001")]);
        store.set_paid_if_pending("ORDER-0001").await.unwrap();

        assert!(store.attach_transaction("ORDER-0001", "15113-1").await.unwrap());
        assert!(!store.attach_transaction("ORDER-404", "15113-2").await.unwrap());

        let stored = store.find_by_reference("ORDER-0001").await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.transaction_id.as_deref(), Some("15113-1"));
    }

    #[tokio::test]
    async fn test_concurrent_set_paid_transitions_exactly_once() {
        let store = Arc::new(InMemoryOrderStore::with_orders([order("ORDER-0001")]));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.set_paid_if_pending("ORDER-0001").await.unwrap() })
            })
            .collect();

        let mut transitions = 0;
        for handle in handles {
            if handle.await.unwrap() {
                transitions += 1;
            }
        }
        assert_eq!(transitions, 1);
    }
}

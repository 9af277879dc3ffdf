//! In-memory customer store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;
use domain::store::{CustomerStore, Result, StoreError};
use domain::Customer;
use tokio::sync::RwLock;

/// In-memory customer store with a unique email constraint.
#[derive(Clone, Default)]
pub struct InMemoryCustomerStore {
    customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerStore {
    /// Creates a new empty customer store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of customers stored.
    pub async fn count(&self) -> usize {
        self.customers.read().await.len()
    }

    /// Removes all customers.
    pub async fn clear(&self) {
        self.customers.write().await.clear();
    }
}

fn email_taken(customers: &HashMap<CustomerId, Customer>, email: &str, except: CustomerId) -> bool {
    customers
        .values()
        .any(|c| c.id != except && c.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn insert(&self, customer: Customer) -> Result<()> {
        let mut customers = self.customers.write().await;

        if email_taken(&customers, &customer.email, customer.id) {
            return Err(StoreError::DuplicateEmail(customer.email));
        }

        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn get(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        let mut all: Vec<_> = customers.values().cloned().collect();
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }

    async fn update(&self, customer: Customer) -> Result<()> {
        let mut customers = self.customers.write().await;

        if !customers.contains_key(&customer.id) {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: customer.id.to_string(),
            });
        }
        if email_taken(&customers, &customer.email, customer.id) {
            return Err(StoreError::DuplicateEmail(customer.email));
        }

        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn delete(&self, id: CustomerId) -> Result<()> {
        let mut customers = self.customers.write().await;
        match customers.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity: "customer",
                id: id.to_string(),
            }),
        }
    }
}

//! Customer record service.

use chrono::Utc;
use common::CustomerId;
use serde::Deserialize;

use crate::customer::Customer;
use crate::error::DomainError;
use crate::store::{CustomerStore, StoreError};

use super::{BulkItemError, BulkOutcome};

/// Payload for registering a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Partial update of a customer's identity fields.
///
/// The activity profile is derived state and cannot be patched here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Service for managing customer records.
pub struct CustomerService<C: CustomerStore> {
    customers: C,
}

impl<C: CustomerStore> CustomerService<C> {
    /// Creates a new customer service over the given store.
    pub fn new(customers: C) -> Self {
        Self { customers }
    }

    /// Registers a new customer.
    ///
    /// A duplicate contact address surfaces as
    /// [`DomainError::EmailAlreadyExists`], distinct from other
    /// failures.
    #[tracing::instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: NewCustomer) -> Result<Customer, DomainError> {
        let mut customer = Customer::new(new.name, new.email);
        customer.phone = new.phone;

        match self.customers.insert(customer.clone()).await {
            Ok(()) => {
                tracing::info!(customer_id = %customer.id, "customer created");
                Ok(customer)
            }
            Err(StoreError::DuplicateEmail(email)) => {
                Err(DomainError::EmailAlreadyExists(email))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Registers a batch of customers, isolating per-item failures.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn bulk_create(&self, batch: Vec<NewCustomer>) -> BulkOutcome<Customer> {
        let mut outcome = BulkOutcome::new();

        for (index, new) in batch.into_iter().enumerate() {
            match self.create(new).await {
                Ok(customer) => outcome.created.push(customer),
                Err(e) => outcome.errors.push(BulkItemError {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        let summary = outcome.summary();
        tracing::info!(
            created = summary.created,
            failed = summary.failed,
            "bulk customer creation finished"
        );
        outcome
    }

    /// Retrieves a customer by ID.
    pub async fn get(&self, id: CustomerId) -> Result<Customer, DomainError> {
        self.customers
            .get(id)
            .await?
            .ok_or(DomainError::CustomerNotFound(id))
    }

    /// Lists all customers.
    pub async fn list(&self) -> Result<Vec<Customer>, DomainError> {
        Ok(self.customers.list().await?)
    }

    /// Patches a customer's identity fields.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: CustomerId,
        update: UpdateCustomer,
    ) -> Result<Customer, DomainError> {
        let mut customer = self.get(id).await?;

        if let Some(name) = update.name {
            customer.name = name;
        }
        if let Some(email) = update.email {
            customer.email = email;
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone);
        }
        customer.updated_at = Utc::now();

        match self.customers.update(customer.clone()).await {
            Ok(()) => Ok(customer),
            Err(StoreError::DuplicateEmail(email)) => {
                Err(DomainError::EmailAlreadyExists(email))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Deletes a customer by ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<(), DomainError> {
        match self.customers.delete(id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => Err(DomainError::CustomerNotFound(id)),
            Err(other) => Err(other.into()),
        }
    }
}

//! Customer model and derived activity profile.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::rules::RuleField;

/// A customer's derived activity metrics, used as rule-evaluation inputs.
///
/// The profile is never authored directly: it is always the result of
/// folding the customer's full transaction history through
/// [`crate::stats::recompute_profile`]. `last_active` stays `None` until
/// the first recompute runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityProfile {
    /// Sum of all transaction amounts.
    pub total_spend: Money,

    /// Number of transactions.
    pub visit_count: u64,

    /// Timestamp of the most recent transaction.
    pub last_active: Option<DateTime<Utc>>,
}

impl ActivityProfile {
    /// Resolves the numeric value a rule clause compares against.
    ///
    /// Returns `None` when the underlying field is not available
    /// (no recompute has run yet), which the rule engine treats as a
    /// non-matching clause rather than an error.
    pub fn field_value(&self, field: RuleField, now: DateTime<Utc>) -> Option<f64> {
        match field {
            RuleField::TotalSpend => Some(self.total_spend.as_dollars()),
            RuleField::VisitCount => Some(self.visit_count as f64),
            RuleField::DaysSinceLastActive => self.last_active.map(|last| {
                // Ceiling of absolute elapsed days, at millisecond resolution.
                let elapsed_ms = (now - last).num_milliseconds().abs();
                (elapsed_ms as f64 / 86_400_000.0).ceil()
            }),
        }
    }
}

/// A customer: identity plus the derived activity profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,

    /// Display name, used when rendering message bodies.
    pub name: String,

    /// Contact address; unique across customers.
    pub email: String,

    /// Optional phone number.
    pub phone: Option<String>,

    /// Derived activity metrics.
    pub activity: ActivityProfile,

    /// When the customer was registered.
    pub created_at: DateTime<Utc>,

    /// When the customer record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new customer with an empty activity profile.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new(),
            name: name.into(),
            email: email.into(),
            phone: None,
            activity: ActivityProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

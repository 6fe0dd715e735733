//! Fill and commission notifications.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::bracket::OrderSide;
use crate::domain::shared::VenueTime;

/// Venue-assigned unique identifier of one execution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Create a new execution id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A (possibly redelivered) execution notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    /// Unique execution id.
    pub execution_id: ExecutionId,
    /// Order reference of the filled order.
    pub order_ref: String,
    /// Venue-local symbol of the traded contract.
    pub local_symbol: String,
    /// Side of the execution.
    pub side: OrderSide,
    /// Executed quantity.
    pub quantity: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Venue time of the execution.
    pub time: VenueTime,
}

/// A (possibly redelivered) commission notification for one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReport {
    /// Execution the commission belongs to.
    pub execution_id: ExecutionId,
    /// Commission charged.
    pub commission: Decimal,
    /// Commission currency.
    pub currency: String,
}

/// What the session knows about one execution.
///
/// Created on the first notification for an execution; a later notification
/// of the other kind only fills in the missing half.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Execution details.
    pub fill: Option<FillReport>,
    /// Commission charged.
    pub commission: Option<CommissionReport>,
}

impl ExecutionRecord {
    /// Record started from a fill notification.
    #[must_use]
    pub const fn from_fill(fill: FillReport) -> Self {
        Self {
            fill: Some(fill),
            commission: None,
        }
    }

    /// Record started from a commission notification.
    #[must_use]
    pub const fn from_commission(commission: CommissionReport) -> Self {
        Self {
            fill: None,
            commission: Some(commission),
        }
    }

    /// Returns true once both halves are known.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.fill.is_some() && self.commission.is_some()
    }
}

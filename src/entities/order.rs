//! Order entity - A customer's purchase of a single product.
//!
//! Orders move forward through `Pending -> Processing -> Shipped -> Delivered`,
//! and may be cancelled from any state that is not terminal. The transition
//! rules live on [`OrderStatus`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lifecycle state of an order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum OrderStatus {
    /// Created, not yet worked on
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Being picked and packed
    #[sea_orm(string_value = "Processing")]
    Processing,
    /// Handed to the carrier
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    /// Received by the customer (terminal)
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    /// Closed without delivery, or refunded (terminal)
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Stored and displayed name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Delivered and Cancelled accept no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position along the fulfilment chain; `None` for Cancelled.
    const fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::Processing => Some(1),
            Self::Shipped => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Whether an order in this state may move to `next`.
    ///
    /// Forward moves along the chain are allowed (including skipping steps),
    /// Cancelled is reachable from every non-terminal state, and nothing leaves
    /// a terminal state.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown order status '{other}'"
            ))),
        }
    }
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer who placed the order
    pub customer_id: i64,
    /// Ordered product (re-pointed when a replacement is offered)
    pub product_id: i64,
    /// Units ordered
    pub quantity: i32,
    /// Amount charged in dollars
    pub total_price: f64,
    /// Current lifecycle state
    pub status: OrderStatus,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Carrier tracking number, once shipped
    pub tracking_number: Option<String>,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One order may have several returns
    #[sea_orm(has_many = "super::order_return::Entity")]
    Returns,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_return::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Returns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

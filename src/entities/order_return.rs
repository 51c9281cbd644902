//! Return entity - A return request raised against one order.
//!
//! Return status evolves on its own (`Pending -> Approved | Rejected -> Processed`);
//! its effect on the parent order is applied when the return is created.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Review state of a return.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReturnStatus {
    /// Awaiting review
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Accepted by staff
    #[sea_orm(string_value = "Approved")]
    Approved,
    /// Declined by staff
    #[sea_orm(string_value = "Rejected")]
    Rejected,
    /// Fully handled (terminal)
    #[sea_orm(string_value = "Processed")]
    Processed,
}

impl ReturnStatus {
    /// Stored and displayed name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Processed => "Processed",
        }
    }

    /// Pending may be approved or rejected; either decision may then be processed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
                | (Self::Approved | Self::Rejected, Self::Processed)
        )
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReturnStatus {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "processed" => Ok(Self::Processed),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown return status '{other}'"
            ))),
        }
    }
}

/// Return database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "returns")]
pub struct Model {
    /// Unique identifier for the return
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order being returned
    pub order_id: i64,
    /// Replacement product, when one was offered
    pub product_id: Option<i64>,
    /// Customer-supplied reason
    pub reason: String,
    /// Review state
    pub status: ReturnStatus,
    /// Whether the order was refunded
    pub issued_refunds: bool,
    /// Whether a replacement product was offered
    pub offered_replacement: bool,
    /// When the return was raised
    pub return_date: DateTimeUtc,
}

/// Defines relationships between Return and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each return belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_status_transitions() {
        assert!(ReturnStatus::Pending.can_transition_to(ReturnStatus::Approved));
        assert!(ReturnStatus::Pending.can_transition_to(ReturnStatus::Rejected));
        assert!(ReturnStatus::Approved.can_transition_to(ReturnStatus::Processed));
        assert!(ReturnStatus::Rejected.can_transition_to(ReturnStatus::Processed));

        assert!(!ReturnStatus::Pending.can_transition_to(ReturnStatus::Processed));
        assert!(!ReturnStatus::Approved.can_transition_to(ReturnStatus::Rejected));
        assert!(!ReturnStatus::Processed.can_transition_to(ReturnStatus::Pending));
    }
}

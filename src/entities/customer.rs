//! Customer entity - Buyers and their membership tier.
//!
//! The membership tier decides which tier-restricted promotions apply to the
//! customer's orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Loyalty tier of a customer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MembershipTier {
    /// Default tier
    #[sea_orm(string_value = "Normal")]
    Normal,
    /// Paid tier
    #[sea_orm(string_value = "Premium")]
    Premium,
    /// Top tier
    #[sea_orm(string_value = "Gold")]
    Gold,
}

impl MembershipTier {
    /// Stored and displayed name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Premium => "Premium",
            Self::Gold => "Gold",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MembershipTier {
    type Err = crate::errors::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "premium" => Ok(Self::Premium),
            "gold" => Ok(Self::Gold),
            other => Err(crate::errors::Error::validation(format!(
                "Unknown membership tier '{other}' (expected Normal, Premium or Gold)"
            ))),
        }
    }
}

/// Customer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    /// Unique identifier for the customer
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Contact email, unique across customers
    #[sea_orm(unique)]
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional postal address
    pub address: Option<String>,
    /// Loyalty tier
    pub membership_tier: MembershipTier,
}

/// Defines relationships between Customer and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One customer places many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Promotion entity - Time-boxed percentage discounts on a set of products.
//!
//! A promotion may be restricted to one membership tier; when `user_tier` is
//! `None` it applies to every customer. Products are linked through
//! [`super::promotion_product`].

use super::customer::MembershipTier;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Promotion database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    /// Unique identifier for the promotion
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Summer Sale")
    pub name: String,
    /// Discount percentage in `[0, 100]`
    pub discount_percent: f64,
    /// First instant the promotion is active
    pub start_date: DateTimeUtc,
    /// Last instant the promotion is active
    pub end_date: DateTimeUtc,
    /// Restrict to one membership tier, or `None` for everyone
    pub user_tier: Option<MembershipTier>,
}

impl Model {
    /// True when `now` falls inside the inclusive `[start_date, end_date]` window.
    #[must_use]
    pub fn is_active_at(&self, now: DateTimeUtc) -> bool {
        self.start_date <= now && now <= self.end_date
    }

    /// True when a customer of `tier` is eligible.
    #[must_use]
    pub fn applies_to(&self, tier: MembershipTier) -> bool {
        self.user_tier.is_none_or(|required| required == tier)
    }
}

/// Defines relationships between Promotion and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Links to products
    #[sea_orm(has_many = "super::promotion_product::Entity")]
    PromotionProducts,
}

impl Related<super::promotion_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionProducts.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::promotion_product::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::promotion_product::Relation::Promotion.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

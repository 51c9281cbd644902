//! Product entity - Sellable catalog items.
//!
//! Products belong to a subcategory, carry their own percentage discount, may be
//! linked to any number of promotions, and are stocked per warehouse through the
//! inventory ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Stratocaster")
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// List price in dollars, never negative
    pub price: f64,
    /// Subcategory this product is filed under
    pub subcategory_id: i64,
    /// Product-level discount percentage in `[0, 100]`
    pub discount: f64,
    /// Optional technical specifications
    pub specifications: Option<String>,
    /// Optional path or URL of the product image
    pub image_url: Option<String>,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one subcategory
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id"
    )]
    Subcategory,
    /// One product has many inventory rows (one per warehouse)
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
    /// Links to promotions
    #[sea_orm(has_many = "super::promotion_product::Entity")]
    PromotionProducts,
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subcategory.def()
    }
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        super::promotion_product::Relation::Promotion.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::promotion_product::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

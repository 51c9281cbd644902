//! Join entity linking promotions and products.
//!
//! Neither side owns the link: rows are written and removed by the promotion
//! and product operations that change the association.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Promotion/product link
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotion_products")]
pub struct Model {
    /// Linked promotion
    #[sea_orm(primary_key, auto_increment = false)]
    pub promotion_id: i64,
    /// Linked product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
}

/// Both sides of the link
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The promotion side
    #[sea_orm(
        belongs_to = "super::promotion::Entity",
        from = "Column::PromotionId",
        to = "super::promotion::Column::Id",
        on_delete = "Cascade"
    )]
    Promotion,
    /// The product side
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::promotion::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Promotion.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Promotion business logic - Time-boxed discounts linked to products.
//!
//! A promotion is active on the closed interval `[start_date, end_date]`. When it
//! names a membership tier only customers of that tier receive it. Orders use
//! [`best_discount_for`] to pick the largest applicable discount.

use crate::{
    entities::{
        MembershipTier, Product, Promotion, PromotionProduct, product, promotion,
        promotion_product,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// Input for [`create_promotion`].
#[derive(Debug, Clone)]
pub struct NewPromotion {
    /// Display name
    pub name: String,
    /// Discount percentage in `[0, 100]`
    pub discount_percent: f64,
    /// First instant the promotion applies
    pub start_date: DateTime<Utc>,
    /// Last instant the promotion applies
    pub end_date: DateTime<Utc>,
    /// Restrict to one tier; `None` applies to everyone
    pub user_tier: Option<MembershipTier>,
    /// Products covered by the promotion
    pub product_ids: Vec<i64>,
}

/// Partial update for [`update_promotion`]. Links are changed with
/// [`set_promotion_products`].
#[derive(Debug, Clone, Default)]
pub struct PromotionChanges {
    /// New name
    pub name: Option<String>,
    /// New discount percentage
    pub discount_percent: Option<f64>,
    /// New start
    pub start_date: Option<DateTime<Utc>>,
    /// New end
    pub end_date: Option<DateTime<Utc>>,
    /// `Some(None)` lifts the tier restriction
    pub user_tier: Option<Option<MembershipTier>>,
}

fn validate_promotion(
    name: &str,
    discount_percent: f64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Promotion name cannot be empty"));
    }
    if !discount_percent.is_finite() || !(0.0..=100.0).contains(&discount_percent) {
        return Err(Error::InvalidAmount {
            field: "discount_percent",
            value: discount_percent,
        });
    }
    if start_date > end_date {
        return Err(Error::validation("Promotion start date must not be after its end date"));
    }
    Ok(())
}

async fn write_links<C>(db: &C, promotion_id: i64, product_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    let unique: BTreeSet<i64> = product_ids.iter().copied().collect();
    for product_id in unique {
        Product::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("Product", product_id))?;
        promotion_product::ActiveModel {
            promotion_id: Set(promotion_id),
            product_id: Set(product_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// Creates a promotion and links it to its products in one transaction.
///
/// # Errors
/// `Validation` / `InvalidAmount` for bad fields; `NotFound` when a product id
/// does not exist (nothing is written).
#[instrument(skip(db, new), fields(name = %new.name))]
pub async fn create_promotion(db: &DatabaseConnection, new: NewPromotion) -> Result<promotion::Model> {
    validate_promotion(&new.name, new.discount_percent, new.start_date, new.end_date)?;

    let txn = db.begin().await?;
    let promotion = promotion::ActiveModel {
        name: Set(new.name.trim().to_string()),
        discount_percent: Set(new.discount_percent),
        start_date: Set(new.start_date),
        end_date: Set(new.end_date),
        user_tier: Set(new.user_tier),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_links(&txn, promotion.id, &new.product_ids).await?;
    txn.commit().await?;

    info!(
        "Created promotion '{}' (ID: {}) at {}% for {} products",
        promotion.name,
        promotion.id,
        promotion.discount_percent,
        new.product_ids.len()
    );
    Ok(promotion)
}

/// Retrieves a promotion by id.
pub async fn get_promotion<C>(db: &C, promotion_id: i64) -> Result<promotion::Model>
where
    C: ConnectionTrait,
{
    Promotion::find_by_id(promotion_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Promotion", promotion_id))
}

/// Lists promotions, most recent start first.
pub async fn list_promotions(db: &DatabaseConnection) -> Result<Vec<promotion::Model>> {
    Promotion::find()
        .order_by_desc(promotion::Column::StartDate)
        .order_by_asc(promotion::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Products linked to a promotion, alphabetically.
pub async fn products_for_promotion(
    db: &DatabaseConnection,
    promotion_id: i64,
) -> Result<Vec<product::Model>> {
    let promotion = get_promotion(db, promotion_id).await?;
    promotion
        .find_related(Product)
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update, re-validating the merged promotion.
#[instrument(skip(db, changes))]
pub async fn update_promotion(
    db: &DatabaseConnection,
    promotion_id: i64,
    changes: PromotionChanges,
) -> Result<promotion::Model> {
    let existing = get_promotion(db, promotion_id).await?;

    let name = changes
        .name
        .map_or_else(|| existing.name.clone(), |n| n.trim().to_string());
    let discount_percent = changes.discount_percent.unwrap_or(existing.discount_percent);
    let start_date = changes.start_date.unwrap_or(existing.start_date);
    let end_date = changes.end_date.unwrap_or(existing.end_date);
    let user_tier = changes.user_tier.unwrap_or(existing.user_tier);
    validate_promotion(&name, discount_percent, start_date, end_date)?;

    let mut active: promotion::ActiveModel = existing.into();
    active.name = Set(name);
    active.discount_percent = Set(discount_percent);
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.user_tier = Set(user_tier);
    let updated = active.update(db).await?;
    info!("Updated promotion '{}' (ID: {})", updated.name, updated.id);
    Ok(updated)
}

/// Replaces the set of products linked to a promotion.
#[instrument(skip(db))]
pub async fn set_promotion_products(
    db: &DatabaseConnection,
    promotion_id: i64,
    product_ids: &[i64],
) -> Result<()> {
    let txn = db.begin().await?;
    get_promotion(&txn, promotion_id).await?;
    PromotionProduct::delete_many()
        .filter(promotion_product::Column::PromotionId.eq(promotion_id))
        .exec(&txn)
        .await?;
    write_links(&txn, promotion_id, product_ids).await?;
    txn.commit().await?;
    info!(
        "Promotion {} now covers {} products",
        promotion_id,
        product_ids.len()
    );
    Ok(())
}

/// Deletes a promotion and its product links.
#[instrument(skip(db))]
pub async fn delete_promotion(db: &DatabaseConnection, promotion_id: i64) -> Result<promotion::Model> {
    let txn = db.begin().await?;
    let promotion = get_promotion(&txn, promotion_id).await?;
    PromotionProduct::delete_many()
        .filter(promotion_product::Column::PromotionId.eq(promotion_id))
        .exec(&txn)
        .await?;
    Promotion::delete_by_id(promotion_id).exec(&txn).await?;
    txn.commit().await?;
    info!("Deleted promotion '{}' (ID: {})", promotion.name, promotion.id);
    Ok(promotion)
}

/// Promotions linked to a product that are active at `now` and apply to `tier`.
pub async fn active_promotions_for_product<C>(
    db: &C,
    product_id: i64,
    tier: MembershipTier,
    now: DateTime<Utc>,
) -> Result<Vec<promotion::Model>>
where
    C: ConnectionTrait,
{
    let linked = Promotion::find()
        .inner_join(PromotionProduct)
        .filter(promotion_product::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    Ok(linked
        .into_iter()
        .filter(|p| p.is_active_at(now) && p.applies_to(tier))
        .collect())
}

/// Largest applicable promotion discount for a product, 0 when none applies.
pub async fn best_discount_for<C>(
    db: &C,
    product_id: i64,
    tier: MembershipTier,
    now: DateTime<Utc>,
) -> Result<f64>
where
    C: ConnectionTrait,
{
    Ok(active_promotions_for_product(db, product_id, tier, now)
        .await?
        .iter()
        .map(|p| p.discount_percent)
        .fold(0.0, f64::max))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    fn window(name: &str, percent: f64, product_ids: Vec<i64>) -> NewPromotion {
        let now = Utc::now();
        NewPromotion {
            name: name.to_string(),
            discount_percent: percent,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            user_tier: None,
            product_ids,
        }
    }

    #[test]
    fn test_active_window_is_inclusive() {
        let start = Utc::now();
        let promotion = promotion::Model {
            id: 1,
            name: "Flash".to_string(),
            discount_percent: 10.0,
            start_date: start,
            end_date: start + Duration::hours(2),
            user_tier: Some(MembershipTier::Gold),
        };
        assert!(promotion.is_active_at(start));
        assert!(promotion.is_active_at(start + Duration::hours(2)));
        assert!(!promotion.is_active_at(start - Duration::seconds(1)));
        assert!(!promotion.is_active_at(start + Duration::hours(3)));
        assert!(promotion.applies_to(MembershipTier::Gold));
        assert!(!promotion.applies_to(MembershipTier::Normal));
    }

    #[tokio::test]
    async fn test_create_promotion_validation() -> Result<()> {
        let (db, product, _warehouse) = setup_with_stock_location().await?;

        let result = create_promotion(&db, window("Too much", 120.0, vec![product.id])).await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));

        let mut backwards = window("Backwards", 10.0, vec![product.id]);
        std::mem::swap(&mut backwards.start_date, &mut backwards.end_date);
        let result = create_promotion(&db, backwards).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_promotion(&db, window("Ghost", 10.0, vec![product.id, 999])).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert!(list_promotions(&db).await?.is_empty());
        assert_eq!(PromotionProduct::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_best_discount_respects_tier_and_window() -> Result<()> {
        let (db, product, _warehouse) = setup_with_stock_location().await?;
        let now = Utc::now();

        create_promotion(&db, window("Everyone", 10.0, vec![product.id])).await?;
        let mut gold = window("Gold only", 25.0, vec![product.id]);
        gold.user_tier = Some(MembershipTier::Gold);
        create_promotion(&db, gold).await?;
        let mut expired = window("Expired", 50.0, vec![product.id]);
        expired.start_date = now - Duration::days(10);
        expired.end_date = now - Duration::days(5);
        create_promotion(&db, expired).await?;

        assert_eq!(
            best_discount_for(&db, product.id, MembershipTier::Normal, now).await?,
            10.0
        );
        assert_eq!(
            best_discount_for(&db, product.id, MembershipTier::Gold, now).await?,
            25.0
        );
        let active = active_promotions_for_product(&db, product.id, MembershipTier::Gold, now).await?;
        assert_eq!(active.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_products_and_delete() -> Result<()> {
        let (db, product, _warehouse) = setup_with_stock_location().await?;
        let other = create_test_product(&db, "Bass", product.subcategory_id).await?;
        let promotion = create_promotion(&db, window("Spring", 15.0, vec![product.id])).await?;

        set_promotion_products(&db, promotion.id, &[other.id, other.id]).await?;
        let linked = products_for_promotion(&db, promotion.id).await?;
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, other.id);

        let updated = update_promotion(
            &db,
            promotion.id,
            PromotionChanges {
                discount_percent: Some(20.0),
                user_tier: Some(Some(MembershipTier::Premium)),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.discount_percent, 20.0);
        assert_eq!(updated.user_tier, Some(MembershipTier::Premium));

        delete_promotion(&db, promotion.id).await?;
        assert_eq!(PromotionProduct::find().count(&db).await?, 0);
        Ok(())
    }
}

//! Order business logic - Placing orders and moving them through their workflow.
//!
//! Status changes go through [`update_status`], which applies the rules on
//! [`OrderStatus::can_transition_to`] and writes with a compare-and-swap on the
//! current status so two concurrent updates cannot both succeed from the same
//! starting point.

use crate::{
    core::{catalog, customer, promotion},
    entities::{Order, OrderStatus, Return, order, order_return},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Input for [`create_order`].
#[derive(Debug, Clone, Copy)]
pub struct NewOrder {
    /// Buying customer
    pub customer_id: i64,
    /// Ordered product
    pub product_id: i64,
    /// Units ordered, must be positive
    pub quantity: i32,
}

/// Rounds a monetary amount to cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Order total after the product's own discount and a promotion discount.
///
/// Both discounts are percentages and compound. The result is rounded to cents.
#[must_use]
pub fn compute_total(unit_price: f64, product_discount: f64, promotion_discount: f64, quantity: i32) -> f64 {
    let unit = unit_price * (1.0 - product_discount / 100.0) * (1.0 - promotion_discount / 100.0);
    round_cents(unit * f64::from(quantity))
}

/// Places an order, pricing it with the best promotion available to the
/// customer's membership tier right now.
///
/// # Errors
/// `Validation` for a non-positive quantity; `NotFound` for an unknown customer
/// or product.
#[instrument(skip(db))]
pub async fn create_order(db: &DatabaseConnection, new: NewOrder) -> Result<order::Model> {
    if new.quantity <= 0 {
        return Err(Error::validation("Order quantity must be greater than zero"));
    }

    let customer = customer::get_customer(db, new.customer_id).await?;
    let product = catalog::get_product(db, new.product_id).await?;
    let now = Utc::now();
    let promotion_discount =
        promotion::best_discount_for(db, product.id, customer.membership_tier, now).await?;
    let total_price = compute_total(product.price, product.discount, promotion_discount, new.quantity);

    let order = order::ActiveModel {
        customer_id: Set(customer.id),
        product_id: Set(product.id),
        quantity: Set(new.quantity),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending),
        order_date: Set(now),
        tracking_number: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created order #{} for customer '{}': {} x '{}' = {:.2}",
        order.id, customer.name, order.quantity, product.name, order.total_price
    );
    Ok(order)
}

/// Retrieves an order by id.
pub async fn get_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))
}

/// Lists orders newest first, optionally only those in one status.
pub async fn list_orders(
    db: &DatabaseConnection,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status.as_str()));
    }
    query
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists a customer's orders newest first.
pub async fn list_orders_for_customer(
    db: &DatabaseConnection,
    customer_id: i64,
) -> Result<Vec<order::Model>> {
    customer::get_customer(db, customer_id).await?;
    Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Writes `next` if the order is still in `current`. Returns false when another
/// writer moved it first.
pub(crate) async fn swap_status<C>(
    db: &C,
    order_id: i64,
    current: OrderStatus,
    next: OrderStatus,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(next.as_str()))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(current.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Moves an order to a new status.
///
/// Re-applying the current status is a no-op.
///
/// # Errors
/// `InvalidTransition` when the move is backwards or leaves a terminal state.
#[instrument(skip(db))]
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i64,
    next: OrderStatus,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let order = get_order(&txn, order_id).await?;
    if order.status == next {
        return Ok(order);
    }
    if !order.status.can_transition_to(next) {
        return Err(Error::InvalidTransition {
            from: order.status.to_string(),
            to: next.to_string(),
        });
    }

    if !swap_status(&txn, order_id, order.status, next).await? {
        let latest = get_order(&txn, order_id).await?;
        return Err(Error::InvalidTransition {
            from: latest.status.to_string(),
            to: next.to_string(),
        });
    }
    let updated = get_order(&txn, order_id).await?;
    txn.commit().await?;

    info!("Order #{} moved from {} to {}", order_id, order.status, updated.status);
    Ok(updated)
}

/// Cancels an order that has not reached a terminal state.
pub async fn cancel_order(db: &DatabaseConnection, order_id: i64) -> Result<order::Model> {
    update_status(db, order_id, OrderStatus::Cancelled).await
}

/// Sets or clears (empty string) the carrier tracking number.
#[instrument(skip(db))]
pub async fn set_tracking_number(
    db: &DatabaseConnection,
    order_id: i64,
    tracking_number: &str,
) -> Result<order::Model> {
    let order = get_order(db, order_id).await?;
    let tracking_number = tracking_number.trim();

    let mut active: order::ActiveModel = order.into();
    active.tracking_number = Set((!tracking_number.is_empty()).then(|| tracking_number.to_string()));
    let updated = active.update(db).await?;
    info!(
        "Order #{} tracking number set to {:?}",
        updated.id, updated.tracking_number
    );
    Ok(updated)
}

/// Deletes an order together with its returns.
///
/// Returns the deleted order and the number of returns removed with it.
#[instrument(skip(db))]
pub async fn delete_order(db: &DatabaseConnection, order_id: i64) -> Result<(order::Model, u64)> {
    let txn = db.begin().await?;
    let order = get_order(&txn, order_id).await?;
    let returns = Return::delete_many()
        .filter(order_return::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    Order::delete_by_id(order_id).exec(&txn).await?;
    txn.commit().await?;

    info!(
        "Deleted order #{} and {} returns",
        order.id, returns.rows_affected
    );
    Ok((order, returns.rows_affected))
}

/// Renders a plain-text invoice for an order.
pub async fn render_invoice(db: &DatabaseConnection, order_id: i64) -> Result<String> {
    let order = get_order(db, order_id).await?;
    let customer = customer::get_customer(db, order.customer_id).await?;
    let product = catalog::get_product(db, order.product_id).await?;

    let mut lines = vec![
        format!("Invoice for order #{}", order.id),
        format!("Date: {}", order.order_date.format("%Y-%m-%d %H:%M UTC")),
        format!("Customer: {} <{}>", customer.name, customer.email),
    ];
    if let Some(address) = &customer.address {
        lines.push(format!("Ship to: {address}"));
    }
    lines.push(format!(
        "Item: {} x {} @ ${:.2} (list)",
        order.quantity, product.name, product.price
    ));
    lines.push(format!("Total: ${:.2}", order.total_price));
    lines.push(format!("Status: {}", order.status));
    if let Some(tracking) = &order.tracking_number {
        lines.push(format!("Tracking: {tracking}"));
    }
    lines.push("Thank you for your purchase!".to_string());
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::promotion::NewPromotion;
    use crate::entities::MembershipTier;
    use crate::test_utils::*;
    use chrono::Duration;

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(100.0, 0.0, 0.0, 2), 200.0);
        assert_eq!(compute_total(100.0, 10.0, 0.0, 1), 90.0);
        assert_eq!(compute_total(100.0, 10.0, 50.0, 3), 135.0);
        assert_eq!(compute_total(19.99, 0.0, 15.0, 1), 16.99);
        assert_eq!(compute_total(10.0, 100.0, 0.0, 5), 0.0);
    }

    #[tokio::test]
    async fn test_create_order_applies_best_tier_promotion() -> Result<()> {
        let (db, product, _warehouse) = setup_with_stock_location().await?;
        let normal = create_test_customer(&db, "normal@example.com", MembershipTier::Normal).await?;
        let gold = create_test_customer(&db, "gold@example.com", MembershipTier::Gold).await?;
        let now = Utc::now();
        promotion::create_promotion(
            &db,
            NewPromotion {
                name: "Gold week".to_string(),
                discount_percent: 20.0,
                start_date: now - Duration::days(1),
                end_date: now + Duration::days(6),
                user_tier: Some(MembershipTier::Gold),
                product_ids: vec![product.id],
            },
        )
        .await?;

        let plain = create_order(
            &db,
            NewOrder {
                customer_id: normal.id,
                product_id: product.id,
                quantity: 2,
            },
        )
        .await?;
        assert_eq!(plain.total_price, 200.0);
        assert_eq!(plain.status, OrderStatus::Pending);

        let discounted = create_order(
            &db,
            NewOrder {
                customer_id: gold.id,
                product_id: product.id,
                quantity: 2,
            },
        )
        .await?;
        assert_eq!(discounted.total_price, 160.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_validation() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;

        let result = create_order(
            db,
            NewOrder {
                customer_id: fixture.customer.id,
                product_id: fixture.product.id,
                quantity: 0,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_order(
            db,
            NewOrder {
                customer_id: 999,
                product_id: fixture.product.id,
                quantity: 1,
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Customer", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_forward_only() -> Result<()> {
        let fixture = setup_with_order().await?;
        let (db, order_id) = (&fixture.db, fixture.order.id);

        let shipped = update_status(db, order_id, OrderStatus::Shipped).await?;
        assert_eq!(shipped.status, OrderStatus::Shipped);

        let same = update_status(db, order_id, OrderStatus::Shipped).await?;
        assert_eq!(same.status, OrderStatus::Shipped);

        let result = update_status(db, order_id, OrderStatus::Processing).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        update_status(db, order_id, OrderStatus::Delivered).await?;
        let result = cancel_order(db, order_id).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        assert_eq!(get_order(db, order_id).await?.status, OrderStatus::Delivered);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_by_status() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        let second = create_order(
            db,
            NewOrder {
                customer_id: fixture.customer.id,
                product_id: fixture.product.id,
                quantity: 1,
            },
        )
        .await?;
        cancel_order(db, second.id).await?;

        assert_eq!(list_orders(db, None).await?.len(), 2);
        let pending = list_orders(db, Some(OrderStatus::Pending)).await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, fixture.order.id);
        assert_eq!(
            list_orders_for_customer(db, fixture.customer.id).await?.len(),
            2
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_tracking_number_and_invoice() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;

        let tracked = set_tracking_number(db, fixture.order.id, " 1Z999 ").await?;
        assert_eq!(tracked.tracking_number.as_deref(), Some("1Z999"));

        let invoice = render_invoice(db, fixture.order.id).await?;
        assert!(invoice.contains(&format!("Invoice for order #{}", fixture.order.id)));
        assert!(invoice.contains(&fixture.product.name));
        assert!(invoice.contains("Tracking: 1Z999"));

        let cleared = set_tracking_number(db, fixture.order.id, "").await?;
        assert_eq!(cleared.tracking_number, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_order_removes_returns() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        crate::core::returns::create_return(
            db,
            crate::core::returns::NewReturn::new(fixture.order.id, "Arrived scratched"),
        )
        .await?;

        let (deleted, returns_removed) = delete_order(db, fixture.order.id).await?;
        assert_eq!(deleted.id, fixture.order.id);
        assert_eq!(returns_removed, 1);
        assert_eq!(Return::find().count(db).await?, 0);
        Ok(())
    }
}

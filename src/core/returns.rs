//! Return workflow - Return requests and their effect on the parent order.
//!
//! Creating a return is the only place a return touches its order: a refund
//! cancels the order and a replacement re-points it at the new product. Both
//! effects share the transaction that inserts the return, so a rejected request
//! leaves the order exactly as it was.

use crate::{
    core::{catalog, order as orders},
    entities::{OrderStatus, Return, ReturnStatus, order, order_return},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// Input for [`create_return`].
#[derive(Debug, Clone)]
pub struct NewReturn {
    /// Order being returned
    pub order_id: i64,
    /// Why the customer is returning it
    pub reason: String,
    /// Refund the order; forces it to `Cancelled`
    pub issued_refunds: bool,
    /// Ship a replacement; requires `new_product_id`
    pub offered_replacement: bool,
    /// Replacement product
    pub new_product_id: Option<i64>,
}

impl NewReturn {
    /// A plain return with neither refund nor replacement.
    #[must_use]
    pub fn new(order_id: i64, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
            issued_refunds: false,
            offered_replacement: false,
            new_product_id: None,
        }
    }
}

/// Result of [`create_return`].
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    /// The inserted return
    pub return_record: order_return::Model,
    /// The parent order after the return was applied
    pub order: order::Model,
}

/// Raises a return against an order and applies its effect on the order.
///
/// # Errors
/// `NotFound` for an unknown order or replacement product; `Validation` for a
/// blank reason or a replacement without a product. Nothing is written on error.
#[instrument(skip(db, new), fields(order_id = new.order_id))]
pub async fn create_return(db: &DatabaseConnection, new: NewReturn) -> Result<ReturnOutcome> {
    let reason = new.reason.trim();
    if reason.is_empty() {
        return Err(Error::validation("Return reason cannot be empty"));
    }

    let txn = db.begin().await?;
    let order = orders::get_order(&txn, new.order_id).await?;

    let replacement = if new.offered_replacement {
        let product_id = new.new_product_id.ok_or_else(|| {
            Error::validation("A replacement return needs the replacement product")
        })?;
        Some(catalog::get_product(&txn, product_id).await?)
    } else {
        None
    };

    let return_record = order_return::ActiveModel {
        order_id: Set(order.id),
        product_id: Set(replacement.as_ref().map(|p| p.id)),
        reason: Set(reason.to_string()),
        status: Set(ReturnStatus::Pending),
        issued_refunds: Set(new.issued_refunds),
        offered_replacement: Set(new.offered_replacement),
        return_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let previous_status = order.status;
    let order = if new.issued_refunds || replacement.is_some() {
        let mut active: order::ActiveModel = order.into();
        if new.issued_refunds {
            // A refund closes the order whatever state it reached.
            active.status = Set(OrderStatus::Cancelled);
        }
        if let Some(product) = &replacement {
            active.product_id = Set(product.id);
        }
        active.update(&txn).await?
    } else {
        order
    };

    txn.commit().await?;

    info!(
        "Created return #{} for order #{} (refund: {}, replacement: {:?}); order {} -> {}",
        return_record.id,
        order.id,
        return_record.issued_refunds,
        return_record.product_id,
        previous_status,
        order.status
    );
    Ok(ReturnOutcome {
        return_record,
        order,
    })
}

/// Retrieves a return by id.
pub async fn get_return<C>(db: &C, return_id: i64) -> Result<order_return::Model>
where
    C: ConnectionTrait,
{
    Return::find_by_id(return_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Return", return_id))
}

/// Lists returns newest first, optionally only those in one status.
pub async fn list_returns(
    db: &DatabaseConnection,
    status: Option<ReturnStatus>,
) -> Result<Vec<order_return::Model>> {
    let mut query = Return::find();
    if let Some(status) = status {
        query = query.filter(order_return::Column::Status.eq(status.as_str()));
    }
    query
        .order_by_desc(order_return::Column::ReturnDate)
        .order_by_desc(order_return::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists the returns raised against one order.
pub async fn list_returns_for_order(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<order_return::Model>> {
    orders::get_order(db, order_id).await?;
    Return::find()
        .filter(order_return::Column::OrderId.eq(order_id))
        .order_by_asc(order_return::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a return to its next review state. The parent order is not touched.
///
/// # Errors
/// `InvalidTransition` unless the move is `Pending -> Approved | Rejected` or
/// `Approved | Rejected -> Processed`.
#[instrument(skip(db))]
pub async fn update_return_status(
    db: &DatabaseConnection,
    return_id: i64,
    next: ReturnStatus,
) -> Result<order_return::Model> {
    let txn = db.begin().await?;
    let existing = get_return(&txn, return_id).await?;
    if !existing.status.can_transition_to(next) {
        return Err(Error::InvalidTransition {
            from: existing.status.to_string(),
            to: next.to_string(),
        });
    }

    let result = Return::update_many()
        .col_expr(order_return::Column::Status, Expr::value(next.as_str()))
        .filter(order_return::Column::Id.eq(return_id))
        .filter(order_return::Column::Status.eq(existing.status.as_str()))
        .exec(&txn)
        .await?;
    if result.rows_affected != 1 {
        let latest = get_return(&txn, return_id).await?;
        return Err(Error::InvalidTransition {
            from: latest.status.to_string(),
            to: next.to_string(),
        });
    }
    let updated = get_return(&txn, return_id).await?;
    txn.commit().await?;

    info!("Return #{} moved from {} to {}", updated.id, existing.status, updated.status);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_refund_cancels_order_from_any_state() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        orders::update_status(db, fixture.order.id, OrderStatus::Delivered).await?;

        let outcome = create_return(
            db,
            NewReturn {
                issued_refunds: true,
                ..NewReturn::new(fixture.order.id, "Changed my mind")
            },
        )
        .await?;
        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        assert_eq!(outcome.return_record.status, ReturnStatus::Pending);
        assert_eq!(
            orders::get_order(db, fixture.order.id).await?.status,
            OrderStatus::Cancelled
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_without_product_is_rejected() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;

        let result = create_return(
            db,
            NewReturn {
                offered_replacement: true,
                ..NewReturn::new(fixture.order.id, "Wrong colour")
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_return(
            db,
            NewReturn {
                offered_replacement: true,
                issued_refunds: true,
                new_product_id: Some(999),
                ..NewReturn::new(fixture.order.id, "Wrong colour")
            },
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        assert_eq!(Return::find().count(db).await?, 0);
        let order = orders::get_order(db, fixture.order.id).await?;
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.product_id, fixture.product.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_replacement_repoints_order() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        let replacement =
            create_test_product(db, "Replacement", fixture.product.subcategory_id).await?;

        let outcome = create_return(
            db,
            NewReturn {
                offered_replacement: true,
                new_product_id: Some(replacement.id),
                ..NewReturn::new(fixture.order.id, "Dead on arrival")
            },
        )
        .await?;
        assert_eq!(outcome.order.product_id, replacement.id);
        assert_eq!(outcome.order.status, OrderStatus::Pending);
        assert_eq!(outcome.return_record.product_id, Some(replacement.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_return_status_is_independent_of_order() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        let outcome = create_return(db, NewReturn::new(fixture.order.id, "Too small")).await?;
        let return_id = outcome.return_record.id;

        let result = update_return_status(db, return_id, ReturnStatus::Processed).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        update_return_status(db, return_id, ReturnStatus::Approved).await?;
        let processed = update_return_status(db, return_id, ReturnStatus::Processed).await?;
        assert_eq!(processed.status, ReturnStatus::Processed);

        assert_eq!(
            orders::get_order(db, fixture.order.id).await?.status,
            OrderStatus::Pending
        );
        assert_eq!(list_returns_for_order(db, fixture.order.id).await?.len(), 1);
        assert_eq!(list_returns(db, Some(ReturnStatus::Pending)).await?.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_conflicting_reviews_only_one_wins() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        let outcome = create_return(db, NewReturn::new(fixture.order.id, "Scratched")).await?;
        let return_id = outcome.return_record.id;

        let (approved, rejected) = tokio::join!(
            update_return_status(db, return_id, ReturnStatus::Approved),
            update_return_status(db, return_id, ReturnStatus::Rejected)
        );
        assert_eq!(
            u8::from(approved.is_ok()) + u8::from(rejected.is_ok()),
            1,
            "exactly one review may succeed"
        );
        let loser = if approved.is_ok() { rejected } else { approved };
        assert!(matches!(loser, Err(Error::InvalidTransition { .. })));

        let stored = get_return(db, return_id).await?;
        assert!(matches!(
            stored.status,
            ReturnStatus::Approved | ReturnStatus::Rejected
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_reason_rejected() -> Result<()> {
        let fixture = setup_with_order().await?;
        let result = create_return(&fixture.db, NewReturn::new(fixture.order.id, "  ")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}

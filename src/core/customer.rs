//! Customer records and membership tiers.

use crate::{
    entities::{Customer, MembershipTier, Order, customer, order},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Input for [`create_customer`].
#[derive(Debug, Clone)]
pub struct NewCustomer {
    /// Full name
    pub name: String,
    /// Contact email, must be unique
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional postal address
    pub address: Option<String>,
    /// Loyalty tier
    pub membership_tier: MembershipTier,
}

/// Creates a customer.
///
/// # Errors
/// `Validation` for a blank name, an email without `@`, or an email already in use.
#[instrument(skip(db, new), fields(email = %new.email))]
pub async fn create_customer(db: &DatabaseConnection, new: NewCustomer) -> Result<customer::Model> {
    let name = new.name.trim();
    let email = new.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    if !email.contains('@') {
        return Err(Error::validation(format!("'{email}' is not a valid email address")));
    }

    let taken = Customer::find()
        .filter(customer::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::validation(format!(
            "A customer with email '{email}' already exists"
        )));
    }

    let customer = customer::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email),
        phone: Set(new.phone.filter(|p| !p.trim().is_empty())),
        address: Set(new.address.filter(|a| !a.trim().is_empty())),
        membership_tier: Set(new.membership_tier),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created customer '{}' (ID: {}, tier {})",
        customer.name, customer.id, customer.membership_tier
    );
    Ok(customer)
}

/// Retrieves a customer by id.
pub async fn get_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Customer", customer_id))
}

/// Lists customers alphabetically by name.
pub async fn list_customers(db: &DatabaseConnection) -> Result<Vec<customer::Model>> {
    Customer::find()
        .order_by_asc(customer::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a customer to another membership tier.
#[instrument(skip(db))]
pub async fn update_membership_tier(
    db: &DatabaseConnection,
    customer_id: i64,
    tier: MembershipTier,
) -> Result<customer::Model> {
    let existing = get_customer(db, customer_id).await?;
    let previous = existing.membership_tier;

    let mut active: customer::ActiveModel = existing.into();
    active.membership_tier = Set(tier);
    let updated = active.update(db).await?;
    info!(
        "Customer '{}' moved from {} to {}",
        updated.name, previous, updated.membership_tier
    );
    Ok(updated)
}

/// Deletes a customer without orders.
///
/// # Errors
/// `Validation` while any order still references the customer.
#[instrument(skip(db))]
pub async fn delete_customer(db: &DatabaseConnection, customer_id: i64) -> Result<customer::Model> {
    let customer = get_customer(db, customer_id).await?;

    let orders = Order::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .count(db)
        .await?;
    if orders > 0 {
        return Err(Error::validation(format!(
            "Customer '{}' still has {orders} orders",
            customer.name
        )));
    }

    Customer::delete_by_id(customer_id).exec(db).await?;
    info!("Deleted customer '{}' (ID: {})", customer.name, customer.id);
    Ok(customer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn new_customer(email: &str) -> NewCustomer {
        NewCustomer {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            phone: None,
            address: Some(String::new()),
            membership_tier: MembershipTier::Normal,
        }
    }

    #[tokio::test]
    async fn test_create_customer_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_customer(&db, new_customer("not-an-email")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut blank = new_customer("ada@example.com");
        blank.name = "  ".to_string();
        let result = create_customer(&db, blank).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let created = create_customer(&db, new_customer("Ada@Example.com")).await?;
        assert_eq!(created.email, "ada@example.com");
        assert_eq!(created.address, None);

        let duplicate = create_customer(&db, new_customer("ada@example.com")).await;
        assert!(matches!(duplicate, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_membership_tier() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_customer(&db, new_customer("ada@example.com")).await?;

        let updated = update_membership_tier(&db, customer.id, MembershipTier::Gold).await?;
        assert_eq!(updated.membership_tier, MembershipTier::Gold);
        assert_eq!(
            get_customer(&db, customer.id).await?.membership_tier,
            MembershipTier::Gold
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_customer_rejected_with_orders() -> Result<()> {
        let fixture = setup_with_order().await?;

        let result = delete_customer(&fixture.db, fixture.customer.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let lonely = create_customer(&fixture.db, new_customer("solo@example.com")).await?;
        delete_customer(&fixture.db, lonely.id).await?;
        let missing = get_customer(&fixture.db, lonely.id).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }
}

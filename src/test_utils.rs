//! Shared test utilities for shop-admin.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        access::{self, NewAdminUser},
        catalog::{self, NewProduct, SubcategoryRef},
        customer::{self, NewCustomer},
        inventory,
        order::{self, NewOrder},
    },
    entities::{self, MembershipTier, Role, role},
    errors::{Error, Result},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Password given to every admin created by [`create_test_admin`].
pub const TEST_PASSWORD: &str = "hunter2-but-longer";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Sets up a database with a "Guitars" category holding an "Electric" subcategory.
/// Returns (db, category, subcategory).
pub async fn setup_with_catalog() -> Result<(
    DatabaseConnection,
    entities::category::Model,
    entities::subcategory::Model,
)> {
    let db = setup_test_db().await?;
    let category = catalog::create_category(&db, "Guitars").await?;
    let subcategory = catalog::create_subcategory(&db, category.id, "Electric").await?;
    Ok((db, category, subcategory))
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * price: 100.0
/// * discount: 0
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    subcategory_id: i64,
) -> Result<entities::product::Model> {
    catalog::create_product(
        db,
        NewProduct::new(name, 100.0, SubcategoryRef::Id(subcategory_id)),
    )
    .await
}

/// Creates a warehouse at `location`.
pub async fn create_test_warehouse(
    db: &DatabaseConnection,
    location: &str,
) -> Result<entities::warehouse::Model> {
    inventory::create_warehouse(db, location).await
}

/// Sets up a catalog with one product ("Stratocaster", 100.0) and one warehouse ("Main").
/// Returns (db, product, warehouse) for inventory and pricing tests.
pub async fn setup_with_stock_location() -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::warehouse::Model,
)> {
    let (db, _category, subcategory) = setup_with_catalog().await?;
    let product = create_test_product(&db, "Stratocaster", subcategory.id).await?;
    let warehouse = create_test_warehouse(&db, "Main").await?;
    Ok((db, product, warehouse))
}

/// Creates a customer named after the email's local part.
pub async fn create_test_customer(
    db: &DatabaseConnection,
    email: &str,
    tier: MembershipTier,
) -> Result<entities::customer::Model> {
    let name = email.split('@').next().unwrap_or(email);
    customer::create_customer(
        db,
        NewCustomer {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            address: Some("1 Test Street".to_string()),
            membership_tier: tier,
        },
    )
    .await
}

/// Everything an order test needs.
pub struct OrderFixture {
    /// Database connection
    pub db: DatabaseConnection,
    /// Normal-tier customer who placed the order
    pub customer: entities::customer::Model,
    /// Ordered product (price 100.0)
    pub product: entities::product::Model,
    /// A pending order for one unit
    pub order: entities::order::Model,
}

/// Sets up a catalog, a customer and one pending order for a single unit.
pub async fn setup_with_order() -> Result<OrderFixture> {
    let (db, product, _warehouse) = setup_with_stock_location().await?;
    let customer = create_test_customer(&db, "buyer@example.com", MembershipTier::Normal).await?;
    let order = order::create_order(
        &db,
        NewOrder {
            customer_id: customer.id,
            product_id: product.id,
            quantity: 1,
        },
    )
    .await?;
    Ok(OrderFixture {
        db,
        customer,
        product,
        order,
    })
}

/// Creates an admin holding the role named `role_name`, with password
/// [`TEST_PASSWORD`] and an optional linked Discord id.
pub async fn create_test_admin(
    db: &DatabaseConnection,
    username: &str,
    role_name: &str,
    discord_id: Option<&str>,
) -> Result<entities::admin_user::Model> {
    let role = Role::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Role", role_name))?;
    access::create_admin_user(
        db,
        NewAdminUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: TEST_PASSWORD.to_string(),
            role_id: role.id,
            discord_id: discord_id.map(str::to_string),
        },
    )
    .await
}

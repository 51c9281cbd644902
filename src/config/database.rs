//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. The only
//! constraint that cannot be expressed on an entity, the composite uniqueness of
//! `(product_id, warehouse_id)` in the inventory ledger, is added as a separate index.

use crate::entities::{
    ActivityLog, AdminUser, Category, Customer, Inventory, Order, Permission, Product, Promotion,
    PromotionProduct, Return, Role, RolePermission, Subcategory, Warehouse, inventory,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_admin.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a local `SQLite` file that is created on first use.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For file-backed `SQLite` URLs the parent directory is created first so a fresh
/// checkout can start without any manual setup.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_parent_dir(&database_url)?;
    debug!("Connecting to {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

fn ensure_sqlite_parent_dir(url: &str) -> Result<()> {
    let Some(path) = url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.contains(":memory:") {
        return Ok(());
    }
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables (if missing) plus the inventory pair index.
///
/// Tables are created parents-first so foreign keys always point at an existing table.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Subcategory).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Warehouse).await?;
    create_table(db, &schema, Inventory).await?;
    create_table(db, &schema, Customer).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, Return).await?;
    create_table(db, &schema, Promotion).await?;
    create_table(db, &schema, PromotionProduct).await?;
    create_table(db, &schema, Role).await?;
    create_table(db, &schema, Permission).await?;
    create_table(db, &schema, RolePermission).await?;
    create_table(db, &schema, AdminUser).await?;
    create_table(db, &schema, ActivityLog).await?;

    let pair_index = Index::create()
        .name("idx_inventory_product_warehouse")
        .table(Inventory)
        .col(inventory::Column::ProductId)
        .col(inventory::Column::WarehouseId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&pair_index)).await?;

    info!("Database tables ensured.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{CategoryModel, InventoryModel, ProductModel, RoleModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<ProductModel> = Product::find().limit(1).all(&db).await?;
        let _: Vec<InventoryModel> = Inventory::find().limit(1).all(&db).await?;
        let _: Vec<RoleModel> = Role::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_memory_url_needs_no_directory() -> Result<()> {
        ensure_sqlite_parent_dir("sqlite::memory:")?;
        ensure_sqlite_parent_dir("postgres://localhost/shop")?;
        Ok(())
    }
}

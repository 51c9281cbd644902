//! Inventory ledger - Stock quantities per (product, warehouse) pair.
//!
//! Every change goes through [`adjust`] (relative) or [`set_quantity`]
//! (absolute). Both run in one transaction and never leave a quantity below
//! zero. When a change takes an existing row under [`LOW_STOCK_THRESHOLD`] the
//! returned [`Adjustment`] carries a [`LowStockAlert`]; the alert is advisory and
//! never turns the operation into an error. The first stocking of a pair creates
//! the row and is not checked.

use crate::{
    core::catalog,
    entities::{Inventory, Product, Warehouse, inventory, product, warehouse},
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Quantities strictly below this raise a [`LowStockAlert`].
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Advisory signal that a ledger row fell below [`LOW_STOCK_THRESHOLD`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockAlert {
    /// Product running low
    pub product_id: i64,
    /// Its name, for display
    pub product_name: String,
    /// Warehouse holding the stock
    pub warehouse_id: i64,
    /// Warehouse location, for display
    pub warehouse_location: String,
    /// Quantity after the change
    pub quantity: i32,
}

impl std::fmt::Display for LowStockAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Low stock: '{}' has only {} left at '{}'",
            self.product_name, self.quantity, self.warehouse_location
        )
    }
}

/// Outcome of a ledger change.
#[derive(Debug, Clone)]
pub struct Adjustment {
    /// The ledger row after the change
    pub inventory: inventory::Model,
    /// Quantity before the change (0 when the row was just created)
    pub previous_quantity: i32,
    /// Set when an existing row ended below the threshold
    pub low_stock: Option<LowStockAlert>,
}

/// A ledger row joined with the names an admin reads.
#[derive(Debug, Clone)]
pub struct InventoryLine {
    /// Ledger row id
    pub id: i64,
    /// Product id
    pub product_id: i64,
    /// Product name
    pub product_name: String,
    /// Warehouse id
    pub warehouse_id: i64,
    /// Warehouse location
    pub warehouse_location: String,
    /// Units on hand
    pub quantity: i32,
}

impl InventoryLine {
    /// True when this row is below [`LOW_STOCK_THRESHOLD`].
    #[must_use]
    pub const fn is_low(&self) -> bool {
        self.quantity < LOW_STOCK_THRESHOLD
    }
}

fn low_stock_check(
    product: &product::Model,
    warehouse: &warehouse::Model,
    quantity: i32,
) -> Option<LowStockAlert> {
    if quantity >= LOW_STOCK_THRESHOLD {
        return None;
    }
    let alert = LowStockAlert {
        product_id: product.id,
        product_name: product.name.clone(),
        warehouse_id: warehouse.id,
        warehouse_location: warehouse.location.clone(),
        quantity,
    };
    warn!(
        product_id = product.id,
        warehouse_id = warehouse.id,
        quantity,
        "{alert}"
    );
    Some(alert)
}

/// Creates a warehouse.
#[instrument(skip(db))]
pub async fn create_warehouse(db: &DatabaseConnection, location: &str) -> Result<warehouse::Model> {
    let location = location.trim();
    if location.is_empty() {
        return Err(Error::validation("Warehouse location cannot be empty"));
    }
    let warehouse = warehouse::ActiveModel {
        location: Set(location.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created warehouse '{}' (ID: {})", warehouse.location, warehouse.id);
    Ok(warehouse)
}

/// Lists warehouses alphabetically by location.
pub async fn list_warehouses(db: &DatabaseConnection) -> Result<Vec<warehouse::Model>> {
    Warehouse::find()
        .order_by_asc(warehouse::Column::Location)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a warehouse by id.
pub async fn get_warehouse<C>(db: &C, warehouse_id: i64) -> Result<warehouse::Model>
where
    C: ConnectionTrait,
{
    Warehouse::find_by_id(warehouse_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Warehouse", warehouse_id))
}

/// Finds a warehouse by its exact location.
pub async fn find_warehouse_by_location(
    db: &DatabaseConnection,
    location: &str,
) -> Result<Option<warehouse::Model>> {
    Warehouse::find()
        .filter(warehouse::Column::Location.eq(location.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds the ledger row for a (product, warehouse) pair.
pub async fn find_inventory<C>(
    db: &C,
    product_id: i64,
    warehouse_id: i64,
) -> Result<Option<inventory::Model>>
where
    C: ConnectionTrait,
{
    Inventory::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .filter(inventory::Column::WarehouseId.eq(warehouse_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a ledger row by id.
pub async fn get_inventory(db: &DatabaseConnection, inventory_id: i64) -> Result<inventory::Model> {
    Inventory::find_by_id(inventory_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Inventory", inventory_id))
}

/// Adds `delta` (possibly negative) to the stock of a product in a warehouse.
///
/// Creates the ledger row on first use. The update is a single
/// `quantity = quantity + delta` statement guarded by `quantity >= -delta`, so
/// two concurrent withdrawals can never take the row below zero. Two concurrent
/// first stockings of the same pair both land on the one row.
///
/// # Errors
/// `NotFound` for an unknown product or warehouse; `NegativeStock` when the
/// result would be negative.
#[instrument(skip(db))]
pub async fn adjust(
    db: &DatabaseConnection,
    product_id: i64,
    warehouse_id: i64,
    delta: i32,
) -> Result<Adjustment> {
    let txn = db.begin().await?;

    let product = catalog::get_product(&txn, product_id).await?;
    let warehouse = get_warehouse(&txn, warehouse_id).await?;

    let (inventory, previous_quantity, existed) =
        match find_inventory(&txn, product_id, warehouse_id).await? {
            Some(row) => {
                let previous = row.quantity;
                (add_to_row(&txn, row, delta).await?, previous, true)
            }
            None => stock_new_pair(&txn, product_id, warehouse_id, delta).await?,
        };

    txn.commit().await?;

    info!(
        "Adjusted '{}' at '{}': {} -> {} ({:+})",
        product.name, warehouse.location, previous_quantity, inventory.quantity, delta
    );
    let low_stock = if existed {
        low_stock_check(&product, &warehouse, inventory.quantity)
    } else {
        None
    };
    Ok(Adjustment {
        inventory,
        previous_quantity,
        low_stock,
    })
}

/// Applies `quantity = quantity + delta` to a row, refusing to go below zero.
async fn add_to_row<C>(db: &C, row: inventory::Model, delta: i32) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    let negative = Error::NegativeStock {
        current: row.quantity,
        delta,
    };
    if row.quantity.checked_add(delta).is_none_or(|q| q < 0) {
        return Err(negative);
    }
    let floor = delta.checked_neg().ok_or(negative)?;

    let result = Inventory::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).add(delta),
        )
        .filter(inventory::Column::Id.eq(row.id))
        .filter(inventory::Column::Quantity.gte(floor))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::NegativeStock {
            current: row.quantity,
            delta,
        });
    }

    Inventory::find_by_id(row.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Inventory", row.id))
}

/// Creates the ledger row for a pair seen without stock.
///
/// If another writer created the row in the meantime, the insert is skipped
/// on the unique (product, warehouse) index and `delta` is added to that row.
/// Returns the row, the quantity before the change, and whether the row
/// already existed.
async fn stock_new_pair<C>(
    db: &C,
    product_id: i64,
    warehouse_id: i64,
    delta: i32,
) -> Result<(inventory::Model, i32, bool)>
where
    C: ConnectionTrait,
{
    if delta < 0 {
        return Err(Error::NegativeStock { current: 0, delta });
    }

    let inserted = Inventory::insert(inventory::ActiveModel {
        product_id: Set(product_id),
        warehouse_id: Set(warehouse_id),
        quantity: Set(delta),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([inventory::Column::ProductId, inventory::Column::WarehouseId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    let row = find_inventory(db, product_id, warehouse_id)
        .await?
        .ok_or_else(|| Error::not_found("Inventory", format!("{product_id}/{warehouse_id}")))?;
    if inserted == 1 {
        return Ok((row, 0, false));
    }

    warn!(
        "Ledger row for product {} at warehouse {} appeared concurrently; adding to it",
        product_id, warehouse_id
    );
    let previous = row.quantity;
    Ok((add_to_row(db, row, delta).await?, previous, true))
}

/// Overwrites the quantity of an existing ledger row.
///
/// # Errors
/// `NotFound` when the row does not exist; `NegativeStock` for a negative quantity.
#[instrument(skip(db))]
pub async fn set_quantity(
    db: &DatabaseConnection,
    inventory_id: i64,
    quantity: i32,
) -> Result<Adjustment> {
    let txn = db.begin().await?;

    let row = Inventory::find_by_id(inventory_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Inventory", inventory_id))?;
    if quantity < 0 {
        return Err(Error::NegativeStock {
            current: row.quantity,
            delta: quantity.saturating_sub(row.quantity),
        });
    }
    let product = catalog::get_product(&txn, row.product_id).await?;
    let warehouse = get_warehouse(&txn, row.warehouse_id).await?;

    let previous_quantity = row.quantity;
    let mut active: inventory::ActiveModel = row.into();
    active.quantity = Set(quantity);
    let inventory = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Set '{}' at '{}': {} -> {}",
        product.name, warehouse.location, previous_quantity, quantity
    );
    let low_stock = low_stock_check(&product, &warehouse, inventory.quantity);
    Ok(Adjustment {
        inventory,
        previous_quantity,
        low_stock,
    })
}

/// Lists every ledger row with product name and warehouse location, ordered by
/// product name then location.
pub async fn list_inventory(db: &DatabaseConnection) -> Result<Vec<InventoryLine>> {
    let rows = Inventory::find().all(db).await?;
    let products: HashMap<i64, String> = Product::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    let warehouses: HashMap<i64, String> = Warehouse::find()
        .all(db)
        .await?
        .into_iter()
        .map(|w| (w.id, w.location))
        .collect();

    let mut lines: Vec<InventoryLine> = rows
        .into_iter()
        .map(|row| InventoryLine {
            id: row.id,
            product_id: row.product_id,
            product_name: products.get(&row.product_id).cloned().unwrap_or_default(),
            warehouse_id: row.warehouse_id,
            warehouse_location: warehouses
                .get(&row.warehouse_id)
                .cloned()
                .unwrap_or_default(),
            quantity: row.quantity,
        })
        .collect();
    lines.sort_by(|a, b| {
        a.product_name
            .cmp(&b.product_name)
            .then_with(|| a.warehouse_location.cmp(&b.warehouse_location))
    });
    Ok(lines)
}

/// Ledger rows currently below [`LOW_STOCK_THRESHOLD`], lowest first.
pub async fn low_stock_items(db: &DatabaseConnection) -> Result<Vec<InventoryLine>> {
    let mut low: Vec<InventoryLine> = list_inventory(db)
        .await?
        .into_iter()
        .filter(InventoryLine::is_low)
        .collect();
    low.sort_by_key(|line| line.quantity);
    Ok(low)
}

/// Removes every ledger row of a product. Used inside product deletion.
pub async fn delete_inventory_for_product<C>(db: &C, product_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Inventory::delete_many()
        .filter(inventory::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

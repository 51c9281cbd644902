//! Stock Discord commands - `warehouse` and `inventory`.
//!
//! Quantities live in the inventory ledger, one row per (product, warehouse)
//! pair. Every command requires `manage_inventory`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{autocomplete, guard},
        },
        core::{
            auth::permissions,
            catalog,
            inventory::{self, Adjustment},
            report,
        },
        entities::{ProductModel, WarehouseModel},
        errors::{Error, Result},
    };
    use sea_orm::DatabaseConnection;

    const REPORT_TOP_PRODUCTS: usize = 5;

    async fn resolve_pair(
        db: &DatabaseConnection,
        product_name: &str,
        location: &str,
    ) -> Result<(ProductModel, WarehouseModel)> {
        let product = catalog::get_product_by_name(db, product_name).await?;
        let warehouse = inventory::find_warehouse_by_location(db, location)
            .await?
            .ok_or_else(|| Error::not_found("Warehouse", location.trim()))?;
        Ok((product, warehouse))
    }

    fn adjustment_message(product: &str, location: &str, adjustment: &Adjustment) -> String {
        let mut text = format!(
            "📦 **{product}** at **{location}**: {} → **{}**",
            adjustment.previous_quantity, adjustment.inventory.quantity
        );
        if let Some(alert) = &adjustment.low_stock {
            text.push_str(&format!("\n⚠️ {alert}"));
        }
        text
    }

    /// Parent command for warehouses.
    #[poise::command(slash_command, subcommands("warehouse_add", "warehouse_list"))]
    pub async fn warehouse(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Warehouse management command. Available subcommands:\n\
            `/warehouse add` - Add a warehouse location\n\
            `/warehouse list` - List warehouses";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a warehouse location.
    #[poise::command(slash_command, rename = "add")]
    pub async fn warehouse_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Location (e.g., 'Main Store')"] location: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_INVENTORY).await?
        else {
            return Ok(());
        };

        match inventory::create_warehouse(&ctx.data().database, &location).await {
            Ok(warehouse) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Added warehouse '{}'", warehouse.location),
                )
                .await;
                ctx.say(format!("✅ Warehouse **{}** added.", warehouse.location))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists warehouses.
    #[poise::command(slash_command, rename = "list")]
    pub async fn warehouse_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_INVENTORY)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let warehouses = inventory::list_warehouses(&ctx.data().database).await?;
        let lines: Vec<String> = warehouses
            .iter()
            .map(|w| format!("• {} (id {})", w.location, w.id))
            .collect();
        ctx.say(guard::format_list("**Warehouses**", &lines, "No warehouses yet."))
            .await?;
        Ok(())
    }

    /// Parent command for the stock ledger.
    #[poise::command(
        slash_command,
        subcommands(
            "inventory_adjust",
            "inventory_set",
            "inventory_list",
            "inventory_low",
            "inventory_report"
        )
    )]
    pub async fn inventory(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Inventory command. Available subcommands:\n\
            `/inventory adjust` - Add or remove units at a warehouse\n\
            `/inventory set` - Set the exact quantity of an existing row\n\
            `/inventory list` - Show every stock row\n\
            `/inventory low` - Show rows below the low-stock threshold\n\
            `/inventory report` - Stock per category and best-stocked products";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds (positive) or removes (negative) units of a product at a warehouse.
    #[poise::command(slash_command, rename = "adjust")]
    pub async fn inventory_adjust(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "Warehouse location"]
        #[autocomplete = "autocomplete::autocomplete_warehouse"]
        warehouse: String,
        #[description = "Change in units, e.g. 10 or -3"] delta: i32,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_INVENTORY).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let (product, warehouse) = resolve_pair(db, &product, &warehouse).await?;
            let adjustment = inventory::adjust(db, product.id, warehouse.id, delta).await?;
            Ok::<_, Error>((product, warehouse, adjustment))
        }
        .await;

        match result {
            Ok((product, warehouse, adjustment)) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!(
                        "Adjusted '{}' at '{}' by {delta:+}",
                        product.name, warehouse.location
                    ),
                )
                .await;
                ctx.say(adjustment_message(&product.name, &warehouse.location, &adjustment))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Overwrites the quantity of an existing stock row.
    #[poise::command(slash_command, rename = "set")]
    pub async fn inventory_set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "Warehouse location"]
        #[autocomplete = "autocomplete::autocomplete_warehouse"]
        warehouse: String,
        #[description = "New quantity, zero or more"] quantity: i32,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_INVENTORY).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let (product, warehouse) = resolve_pair(db, &product, &warehouse).await?;
            let row = inventory::find_inventory(db, product.id, warehouse.id)
                .await?
                .ok_or_else(|| {
                    Error::not_found(
                        "Inventory",
                        format!("{} at {}", product.name, warehouse.location),
                    )
                })?;
            let adjustment = inventory::set_quantity(db, row.id, quantity).await?;
            Ok::<_, Error>((product, warehouse, adjustment))
        }
        .await;

        match result {
            Ok((product, warehouse, adjustment)) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!(
                        "Set '{}' at '{}' to {quantity}",
                        product.name, warehouse.location
                    ),
                )
                .await;
                ctx.say(adjustment_message(&product.name, &warehouse.location, &adjustment))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Shows every stock row.
    #[poise::command(slash_command, rename = "list")]
    pub async fn inventory_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_INVENTORY)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = inventory::list_inventory(&ctx.data().database)
            .await?
            .iter()
            .map(|line| {
                format!(
                    "• {} @ {}: {}{}",
                    line.product_name,
                    line.warehouse_location,
                    line.quantity,
                    if line.is_low() { " ⚠️" } else { "" }
                )
            })
            .collect();
        ctx.say(guard::format_list("**Inventory**", &lines, "No stock recorded yet."))
            .await?;
        Ok(())
    }

    /// Shows stock rows below the low-stock threshold, lowest first.
    #[poise::command(slash_command, rename = "low")]
    pub async fn inventory_low(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_INVENTORY)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = inventory::low_stock_items(&ctx.data().database)
            .await?
            .iter()
            .map(|line| {
                format!(
                    "• {} @ {}: {}",
                    line.product_name, line.warehouse_location, line.quantity
                )
            })
            .collect();
        let header = format!(
            "**Low stock (below {})**",
            inventory::LOW_STOCK_THRESHOLD
        );
        ctx.say(guard::format_list(&header, &lines, "Nothing is running low."))
            .await?;
        Ok(())
    }

    /// Stock per category and the best-stocked products.
    #[poise::command(slash_command, rename = "report")]
    pub async fn inventory_report(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_INVENTORY)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let report = report::inventory_report(&ctx.data().database, REPORT_TOP_PRODUCTS).await?;
        ctx.say(format!("```\n{}\n```", report::format_inventory_report(&report)))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

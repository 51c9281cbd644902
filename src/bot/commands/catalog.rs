//! Catalog Discord commands - `category` and `product`.
//!
//! Categories group subcategories, and every product is filed under exactly one
//! subcategory. All commands here require `manage_products`.

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
            catalog::{self, NewProduct, ProductChanges, ProductFilter, SubcategoryRef},
            import,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::info;

    async fn category_id_by_name(ctx: poise::Context<'_, BotData, Error>, name: &str) -> Result<i64> {
        catalog::find_category_by_name(&ctx.data().database, name.trim())
            .await?
            .map(|c| c.id)
            .ok_or_else(|| Error::not_found("Category", name.trim()))
    }

    /// Parent command for categories and subcategories.
    #[poise::command(
        slash_command,
        subcommands(
            "category_add",
            "category_list",
            "category_delete",
            "category_sub_add",
            "category_sub_list"
        )
    )]
    pub async fn category(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Category management command. Available subcommands:\n\
            `/category add` - Add a category\n\
            `/category list` - List categories\n\
            `/category delete` - Delete an empty category\n\
            `/category sub_add` - Add a subcategory\n\
            `/category sub_list` - List subcategories";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a category.
    #[poise::command(slash_command, rename = "add")]
    pub async fn category_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category name (e.g., 'Guitars')"] name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };

        match catalog::create_category(&ctx.data().database, &name).await {
            Ok(category) => {
                guard::log_activity(ctx, &principal, format!("Added category '{}'", category.name))
                    .await;
                ctx.say(format!("✅ Category **{}** added.", category.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists categories alphabetically.
    #[poise::command(slash_command, rename = "list")]
    pub async fn category_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PRODUCTS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let categories = catalog::list_categories(&ctx.data().database).await?;
        let lines: Vec<String> = categories
            .iter()
            .map(|c| format!("• {} (id {})", c.name, c.id))
            .collect();
        ctx.say(guard::format_list("**Categories**", &lines, "No categories yet."))
            .await?;
        Ok(())
    }

    /// Deletes a category that has no subcategories.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn category_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to delete"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };

        let result = async {
            let id = category_id_by_name(ctx, &name).await?;
            catalog::delete_category(&ctx.data().database, id).await
        }
        .await;

        match result {
            Ok(category) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Deleted category '{}'", category.name),
                )
                .await;
                ctx.say(format!("🗑️ Category **{}** deleted.", category.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Adds a subcategory under an existing category.
    #[poise::command(slash_command, rename = "sub_add")]
    pub async fn category_sub_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Parent category"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: String,
        #[description = "Subcategory name (e.g., 'Electric')"] name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };

        let result = async {
            let category_id = category_id_by_name(ctx, &category).await?;
            catalog::create_subcategory(&ctx.data().database, category_id, &name).await
        }
        .await;

        match result {
            Ok(subcategory) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Added subcategory '{}' to '{}'", subcategory.name, category.trim()),
                )
                .await;
                ctx.say(format!(
                    "✅ Subcategory **{}** added to **{}**.",
                    subcategory.name,
                    category.trim()
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists subcategories, optionally only those of one category.
    #[poise::command(slash_command, rename = "sub_list")]
    pub async fn category_sub_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this category"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: Option<String>,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PRODUCTS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let category_id = match category.as_deref() {
            Some(name) => match category_id_by_name(ctx, name).await {
                Ok(id) => Some(id),
                Err(e) => return guard::report_failure(ctx, e).await,
            },
            None => None,
        };

        let subcategories = catalog::list_subcategories(&ctx.data().database, category_id).await?;
        let lines: Vec<String> = subcategories
            .iter()
            .map(|s| format!("• {} (id {})", s.name, s.id))
            .collect();
        ctx.say(guard::format_list("**Subcategories**", &lines, "No subcategories found."))
            .await?;
        Ok(())
    }

    /// Parent command for products.
    #[poise::command(
        slash_command,
        subcommands(
            "product_add",
            "product_list",
            "product_show",
            "product_update",
            "product_delete",
            "product_import"
        )
    )]
    pub async fn product(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Product management command. Available subcommands:\n\
            `/product add` - Add a product\n\
            `/product list` - List products, optionally by category or subcategory\n\
            `/product show` - Show one product\n\
            `/product update` - Change a product's fields\n\
            `/product delete` - Delete a product and its stock rows\n\
            `/product import` - Bulk-create products from a CSV file";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a product to a subcategory.
    #[poise::command(slash_command, rename = "add")]
    pub async fn product_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product name"] name: String,
        #[description = "List price (e.g., 1299.99)"] price: f64,
        #[description = "Subcategory to file it under"]
        #[autocomplete = "autocomplete::autocomplete_subcategory_name"]
        subcategory: String,
        #[description = "Discount percentage, 0-100. Defaults to 0."] discount: Option<f64>,
        #[description = "Short description"] description: Option<String>,
        #[description = "Technical specifications"] specifications: Option<String>,
        #[description = "Image path or URL"] image_url: Option<String>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };

        let new = NewProduct {
            description,
            discount: discount.unwrap_or(0.0),
            specifications,
            image_url,
            ..NewProduct::new(name, price, SubcategoryRef::Name(subcategory))
        };

        match catalog::create_product(&ctx.data().database, new).await {
            Ok(product) => {
                guard::log_activity(ctx, &principal, format!("Added product '{}'", product.name))
                    .await;
                ctx.say(format!(
                    "✅ Product **{}** added at **${:.2}** (id {}).",
                    product.name, product.price, product.id
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists products with their subcategory and category.
    #[poise::command(slash_command, rename = "list")]
    pub async fn product_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this category"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        category: Option<String>,
        #[description = "Only this subcategory (wins over category)"]
        #[autocomplete = "autocomplete::autocomplete_subcategory_name"]
        subcategory: Option<String>,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PRODUCTS)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let db = &ctx.data().database;

        let filter = async {
            let category_id = match category.as_deref() {
                Some(name) => Some(category_id_by_name(ctx, name).await?),
                None => None,
            };
            let subcategory_id = match subcategory {
                Some(name) => Some(
                    catalog::resolve_subcategory(db, &SubcategoryRef::Name(name))
                        .await?
                        .id,
                ),
                None => None,
            };
            Ok::<_, Error>(ProductFilter {
                category_id,
                subcategory_id,
            })
        }
        .await;
        let filter = match filter {
            Ok(filter) => filter,
            Err(e) => return guard::report_failure(ctx, e).await,
        };

        let details = catalog::list_product_details(db, filter).await?;
        let lines: Vec<String> = details
            .iter()
            .map(|d| {
                format!(
                    "• **{}** ${:.2}{} ({} / {})",
                    d.product.name,
                    d.product.price,
                    if d.product.discount > 0.0 {
                        format!(" (-{}%)", d.product.discount)
                    } else {
                        String::new()
                    },
                    d.category_name,
                    d.subcategory_name
                )
            })
            .collect();
        ctx.say(guard::format_list("**Products**", &lines, "No products found."))
            .await?;
        Ok(())
    }

    /// Shows every field of one product.
    #[poise::command(slash_command, rename = "show")]
    pub async fn product_show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to show"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PRODUCTS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let product = match catalog::get_product_by_name(&ctx.data().database, &name).await {
            Ok(product) => product,
            Err(e) => return guard::report_failure(ctx, e).await,
        };

        let mut text = format!(
            "**{}** (id {})\nPrice: ${:.2}\nDiscount: {}%",
            product.name, product.id, product.price, product.discount
        );
        if let Some(description) = &product.description {
            text.push_str(&format!("\nDescription: {description}"));
        }
        if let Some(specifications) = &product.specifications {
            text.push_str(&format!("\nSpecifications: {specifications}"));
        }
        if let Some(image_url) = &product.image_url {
            text.push_str(&format!("\nImage: {image_url}"));
        }
        ctx.say(text).await?;
        Ok(())
    }

    /// Updates the given fields of a product; omitted fields stay unchanged.
    #[poise::command(slash_command, rename = "update")]
    pub async fn product_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to update"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New price"] price: Option<f64>,
        #[description = "New discount percentage, 0-100"] discount: Option<f64>,
        #[description = "Move to this subcategory"]
        #[autocomplete = "autocomplete::autocomplete_subcategory_name"]
        subcategory: Option<String>,
        #[description = "New description (empty clears it)"] description: Option<String>,
        #[description = "New specifications (empty clears them)"] specifications: Option<String>,
        #[description = "New image path or URL (empty clears it)"] image_url: Option<String>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let changes = ProductChanges {
            name: new_name,
            description,
            price,
            subcategory: subcategory.map(SubcategoryRef::Name),
            discount,
            specifications,
            image_url,
        };

        let result = async {
            let existing = catalog::get_product_by_name(db, &name).await?;
            catalog::update_product(db, existing.id, changes).await
        }
        .await;

        match result {
            Ok(product) => {
                guard::log_activity(ctx, &principal, format!("Updated product '{}'", product.name))
                    .await;
                ctx.say(format!(
                    "✅ Product **{}** updated: ${:.2}, {}% off.",
                    product.name, product.price, product.discount
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes a product along with its stock rows and promotion links.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn product_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product to delete"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let existing = catalog::get_product_by_name(db, &name).await?;
            catalog::delete_product(db, existing.id).await
        }
        .await;

        match result {
            Ok(deletion) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Deleted product '{}'", deletion.product.name),
                )
                .await;
                ctx.say(format!(
                    "🗑️ Product **{}** deleted ({} stock rows removed).",
                    deletion.product.name, deletion.inventory_rows_removed
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Creates products from an uploaded CSV file.
    ///
    /// Required columns: `name`, `price`, `subcategory_name`. Optional:
    /// `description`, `discount`, `specifications`. Nothing is created unless
    /// every row is valid.
    #[poise::command(slash_command, rename = "import")]
    pub async fn product_import(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "CSV file with a header row"] file: serenity::Attachment,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PRODUCTS).await?
        else {
            return Ok(());
        };
        let options = ctx.data().import_options();

        if file.size as usize > options.max_bytes {
            return guard::report_failure(
                ctx,
                Error::validation(format!(
                    "File is {} bytes; the limit is {} bytes",
                    file.size, options.max_bytes
                )),
            )
            .await;
        }

        ctx.defer().await?;
        let bytes = file.download().await?;
        info!("Importing products from '{}' ({} bytes)", file.filename, bytes.len());

        match import::import_products_csv(&ctx.data().database, &bytes, &options).await {
            Ok(created) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Imported {} products from '{}'", created.len(), file.filename),
                )
                .await;
                ctx.say(format!(
                    "✅ Imported {} products from `{}`.",
                    created.len(),
                    file.filename
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;

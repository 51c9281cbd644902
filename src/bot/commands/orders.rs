//! Sales Discord commands - `customer` and `order`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::choices::{OrderStatusChoice, TierChoice},
            handlers::{autocomplete, guard},
        },
        core::{
            auth::permissions,
            catalog,
            customer::{self, NewCustomer},
            order::{self, NewOrder},
            report,
        },
        entities::{MembershipTier, OrderModel, OrderStatus},
        errors::{Error, Result},
    };

    fn order_line(order: &OrderModel) -> String {
        let tracking = order
            .tracking_number
            .as_deref()
            .map_or_else(String::new, |t| format!(", tracking {t}"));
        format!(
            "• #{} customer {} product {} x{}: ${:.2} [{}]{} ({})",
            order.id,
            order.customer_id,
            order.product_id,
            order.quantity,
            order.total_price,
            order.status,
            tracking,
            order.order_date.format("%Y-%m-%d")
        )
    }

    /// Parent command for customers.
    #[poise::command(
        slash_command,
        subcommands("customer_add", "customer_list", "customer_tier", "customer_delete")
    )]
    pub async fn customer(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Customer management command. Available subcommands:\n\
            `/customer add` - Register a customer\n\
            `/customer list` - List customers\n\
            `/customer tier` - Change a customer's membership tier\n\
            `/customer delete` - Delete a customer without orders";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Registers a customer.
    #[poise::command(slash_command, rename = "add")]
    pub async fn customer_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Full name"] name: String,
        #[description = "Email address (must be unique)"] email: String,
        #[description = "Membership tier. Defaults to Normal."] tier: Option<TierChoice>,
        #[description = "Phone number"] phone: Option<String>,
        #[description = "Postal address"] address: Option<String>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_CUSTOMERS).await?
        else {
            return Ok(());
        };

        let new = NewCustomer {
            name,
            email,
            phone,
            address,
            membership_tier: tier.map_or(MembershipTier::Normal, MembershipTier::from),
        };

        match customer::create_customer(&ctx.data().database, new).await {
            Ok(customer) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Added customer '{}' (id {})", customer.name, customer.id),
                )
                .await;
                ctx.say(format!(
                    "✅ Customer **{}** <{}> added with id {} ({}).",
                    customer.name, customer.email, customer.id, customer.membership_tier
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists customers.
    #[poise::command(slash_command, rename = "list")]
    pub async fn customer_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_CUSTOMERS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = customer::list_customers(&ctx.data().database)
            .await?
            .iter()
            .map(|c| {
                format!(
                    "• #{} {} <{}> [{}]",
                    c.id, c.name, c.email, c.membership_tier
                )
            })
            .collect();
        ctx.say(guard::format_list("**Customers**", &lines, "No customers yet."))
            .await?;
        Ok(())
    }

    /// Changes a customer's membership tier.
    #[poise::command(slash_command, rename = "tier")]
    pub async fn customer_tier(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
        #[description = "New tier"] tier: TierChoice,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_CUSTOMERS).await?
        else {
            return Ok(());
        };

        match customer::update_membership_tier(&ctx.data().database, customer_id, tier.into()).await
        {
            Ok(customer) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!(
                        "Set tier of customer {} to {}",
                        customer.id, customer.membership_tier
                    ),
                )
                .await;
                ctx.say(format!(
                    "✅ **{}** is now **{}**.",
                    customer.name, customer.membership_tier
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes a customer who has no orders.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn customer_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_CUSTOMERS).await?
        else {
            return Ok(());
        };

        match customer::delete_customer(&ctx.data().database, customer_id).await {
            Ok(customer) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Deleted customer '{}' (id {})", customer.name, customer.id),
                )
                .await;
                ctx.say(format!("🗑️ Customer **{}** deleted.", customer.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Parent command for orders.
    #[poise::command(
        slash_command,
        subcommands(
            "order_create",
            "order_list",
            "order_status",
            "order_cancel",
            "order_tracking",
            "order_invoice",
            "order_delete",
            "order_summary"
        )
    )]
    pub async fn order(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Order management command. Available subcommands:\n\
            `/order create` - Place an order for a customer\n\
            `/order list` - List orders, optionally by status or customer\n\
            `/order status` - Move an order along its workflow\n\
            `/order cancel` - Cancel an order\n\
            `/order tracking` - Set or clear the tracking number\n\
            `/order invoice` - Show the invoice\n\
            `/order delete` - Delete an order and its returns\n\
            `/order summary` - Counts per status and revenue";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Places an order priced with discounts and the best tier promotion.
    #[poise::command(slash_command, rename = "create")]
    pub async fn order_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Customer id"] customer_id: i64,
        #[description = "Product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        product: String,
        #[description = "Units ordered. Defaults to 1."] quantity: Option<i32>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let product = catalog::get_product_by_name(db, &product).await?;
            order::create_order(
                db,
                NewOrder {
                    customer_id,
                    product_id: product.id,
                    quantity: quantity.unwrap_or(1),
                },
            )
            .await
        }
        .await;

        match result {
            Ok(order) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Created order #{} for customer {}", order.id, order.customer_id),
                )
                .await;
                ctx.say(format!(
                    "✅ Order **#{}** placed: {} x **{}** = **${:.2}**.",
                    order.id,
                    order.quantity,
                    product.trim(),
                    order.total_price
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists orders, newest first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn order_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this status"] status: Option<OrderStatusChoice>,
        #[description = "Only this customer id"] customer_id: Option<i64>,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_ORDERS)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let db = &ctx.data().database;

        let orders = match customer_id {
            Some(customer_id) => order::list_orders_for_customer(db, customer_id)
                .await
                .map(|orders| {
                    let status = status.map(OrderStatus::from);
                    orders
                        .into_iter()
                        .filter(|o| status.is_none_or(|s| o.status == s))
                        .collect::<Vec<_>>()
                }),
            None => order::list_orders(db, status.map(Into::into)).await,
        };
        let orders = match orders {
            Ok(orders) => orders,
            Err(e) => return guard::report_failure(ctx, e).await,
        };

        let lines: Vec<String> = orders.iter().map(order_line).collect();
        ctx.say(guard::format_list("**Orders**", &lines, "No orders found."))
            .await?;
        Ok(())
    }

    /// Moves an order to another status.
    ///
    /// Orders only move forward along Pending → Processing → Shipped →
    /// Delivered. Cancelled is reachable until the order is delivered.
    #[poise::command(slash_command, rename = "status")]
    pub async fn order_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
        #[description = "New status"] status: OrderStatusChoice,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await?
        else {
            return Ok(());
        };

        match order::update_status(&ctx.data().database, order_id, status.into()).await {
            Ok(order) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Set order #{} to {}", order.id, order.status),
                )
                .await;
                ctx.say(format!("✅ Order **#{}** is now **{}**.", order.id, order.status))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Cancels an order that is not yet delivered.
    #[poise::command(slash_command, rename = "cancel")]
    pub async fn order_cancel(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await?
        else {
            return Ok(());
        };

        match order::cancel_order(&ctx.data().database, order_id).await {
            Ok(order) => {
                guard::log_activity(ctx, &principal, format!("Cancelled order #{}", order.id))
                    .await;
                ctx.say(format!("🚫 Order **#{}** cancelled.", order.id))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Sets the carrier tracking number; leave it empty to clear it.
    #[poise::command(slash_command, rename = "tracking")]
    pub async fn order_tracking(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
        #[description = "Tracking number (omit to clear)"] tracking_number: Option<String>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await?
        else {
            return Ok(());
        };

        let tracking_number = tracking_number.unwrap_or_default();
        match order::set_tracking_number(&ctx.data().database, order_id, &tracking_number).await {
            Ok(order) => {
                let shown = order.tracking_number.as_deref().unwrap_or("none");
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Set tracking of order #{} to {shown}", order.id),
                )
                .await;
                ctx.say(format!("✅ Tracking for **#{}**: {shown}", order.id))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Shows the invoice of an order.
    #[poise::command(slash_command, rename = "invoice")]
    pub async fn order_invoice(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_ORDERS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        match order::render_invoice(&ctx.data().database, order_id).await {
            Ok(invoice) => {
                ctx.say(format!("```\n{invoice}\n```")).await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes an order together with its returns.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn order_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await?
        else {
            return Ok(());
        };

        match order::delete_order(&ctx.data().database, order_id).await {
            Ok((order, returns_removed)) => {
                guard::log_activity(ctx, &principal, format!("Deleted order #{}", order.id))
                    .await;
                ctx.say(format!(
                    "🗑️ Order **#{}** deleted ({returns_removed} returns removed).",
                    order.id
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Order counts per status and revenue from orders that are not cancelled.
    #[poise::command(slash_command, rename = "summary")]
    pub async fn order_summary(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_ORDERS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let summary = report::order_summary(&ctx.data().database).await?;
        ctx.say(format!("```\n{}\n```", report::format_order_summary(&summary)))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

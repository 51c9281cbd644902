//! Returns Discord commands - `/return create|list|status`.
//!
//! The function is named `return_request` because `return` is a keyword; the
//! slash command is registered as `/return`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::choices::ReturnStatusChoice,
            handlers::{autocomplete, guard},
        },
        core::{
            auth::permissions,
            catalog,
            returns::{self, NewReturn},
        },
        entities::{ReturnModel, ReturnStatus},
        errors::{Error, Result},
    };

    fn return_line(record: &ReturnModel) -> String {
        let mut outcome = Vec::new();
        if record.issued_refunds {
            outcome.push("refunded".to_string());
        }
        if record.offered_replacement {
            outcome.push(
                record
                    .product_id
                    .map_or_else(|| "replacement".to_string(), |id| format!("replaced by product {id}")),
            );
        }
        let outcome = if outcome.is_empty() {
            String::new()
        } else {
            format!(" ({})", outcome.join(", "))
        };
        format!(
            "• #{} order #{} [{}]{}: {} ({})",
            record.id,
            record.order_id,
            record.status,
            outcome,
            record.reason,
            record.return_date.format("%Y-%m-%d")
        )
    }

    /// Parent command for returns.
    #[poise::command(
        slash_command,
        rename = "return",
        subcommands("return_create", "return_list", "return_status")
    )]
    pub async fn return_request(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Returns command. Available subcommands:\n\
            `/return create` - Record a return, optionally refunding or replacing\n\
            `/return list` - List returns, optionally by status or order\n\
            `/return status` - Review a return";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records a return against an order.
    ///
    /// A refund cancels the order. A replacement points the order at the
    /// replacement product.
    #[poise::command(slash_command, rename = "create")]
    pub async fn return_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Order id"] order_id: i64,
        #[description = "Why the customer is returning it"] reason: String,
        #[description = "Refund the order (cancels it)"] refund: Option<bool>,
        #[description = "Replacement product"]
        #[autocomplete = "autocomplete::autocomplete_product_name"]
        replacement: Option<String>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_RETURNS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let new_product_id = match replacement.as_deref() {
                Some(name) => Some(catalog::get_product_by_name(db, name).await?.id),
                None => None,
            };
            let new = NewReturn {
                issued_refunds: refund.unwrap_or(false),
                offered_replacement: new_product_id.is_some(),
                new_product_id,
                ..NewReturn::new(order_id, reason)
            };
            returns::create_return(db, new).await
        }
        .await;

        match result {
            Ok(outcome) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!(
                        "Recorded return #{} for order #{}",
                        outcome.return_record.id, outcome.order.id
                    ),
                )
                .await;
                ctx.say(format!(
                    "✅ Return **#{}** recorded. Order **#{}** is **{}**.",
                    outcome.return_record.id, outcome.order.id, outcome.order.status
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists returns, newest first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn return_list(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only this status"] status: Option<ReturnStatusChoice>,
        #[description = "Only this order id"] order_id: Option<i64>,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_RETURNS)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let db = &ctx.data().database;

        let records = match order_id {
            Some(order_id) => returns::list_returns_for_order(db, order_id)
                .await
                .map(|records| {
                    let status = status.map(ReturnStatus::from);
                    records
                        .into_iter()
                        .filter(|r| status.is_none_or(|s| r.status == s))
                        .collect::<Vec<_>>()
                }),
            None => returns::list_returns(db, status.map(Into::into)).await,
        };
        let records = match records {
            Ok(records) => records,
            Err(e) => return guard::report_failure(ctx, e).await,
        };

        let lines: Vec<String> = records.iter().map(return_line).collect();
        ctx.say(guard::format_list("**Returns**", &lines, "No returns found."))
            .await?;
        Ok(())
    }

    /// Moves a return to another review status.
    #[poise::command(slash_command, rename = "status")]
    pub async fn return_status(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Return id"] return_id: i64,
        #[description = "New status"] status: ReturnStatusChoice,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_RETURNS).await?
        else {
            return Ok(());
        };

        match returns::update_return_status(&ctx.data().database, return_id, status.into()).await {
            Ok(record) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Set return #{} to {}", record.id, record.status),
                )
                .await;
                ctx.say(format!("✅ Return **#{}** is now **{}**.", record.id, record.status))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;

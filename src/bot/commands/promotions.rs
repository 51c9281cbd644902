//! Promotion Discord commands - `/promotion create|list|products|update|delete`.

use crate::errors::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Parses a `YYYY-MM-DD` day. The start of a window is midnight, the end is the
/// last second of the day, so a single-day promotion covers the whole day.
fn parse_day(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let day = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        Error::validation(format!("'{}' is not a date in YYYY-MM-DD form", value.trim()))
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| Error::validation("Invalid time of day"))?;
    Ok(day.and_time(time).and_utc())
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{parse_day, split_names};
    use crate::{
        bot::{
            BotData,
            commands::choices::TierChoice,
            handlers::{autocomplete, guard},
        },
        core::{
            auth::permissions,
            catalog,
            promotion::{self, NewPromotion, PromotionChanges},
        },
        entities::PromotionModel,
        errors::{Error, Result},
    };
    use sea_orm::DatabaseConnection;

    async fn product_ids_by_name(db: &DatabaseConnection, names: &[String]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(catalog::get_product_by_name(db, name).await?.id);
        }
        Ok(ids)
    }

    async fn promotion_by_name(db: &DatabaseConnection, name: &str) -> Result<PromotionModel> {
        promotion::list_promotions(db)
            .await?
            .into_iter()
            .find(|p| p.name == name.trim())
            .ok_or_else(|| Error::not_found("Promotion", name.trim()))
    }

    fn promotion_line(p: &PromotionModel) -> String {
        format!(
            "• **{}** {}% off, {} to {} ({})",
            p.name,
            p.discount_percent,
            p.start_date.format("%Y-%m-%d"),
            p.end_date.format("%Y-%m-%d"),
            p.user_tier
                .map_or_else(|| "all tiers".to_string(), |tier| format!("{tier} only"))
        )
    }

    /// Parent command for promotions.
    #[poise::command(
        slash_command,
        subcommands(
            "promotion_create",
            "promotion_list",
            "promotion_products",
            "promotion_update",
            "promotion_delete"
        )
    )]
    pub async fn promotion(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Promotion command. Available subcommands:\n\
            `/promotion create` - Create a time-boxed discount for some products\n\
            `/promotion list` - List promotions\n\
            `/promotion products` - Show the products a promotion covers\n\
            `/promotion update` - Change a promotion\n\
            `/promotion delete` - Delete a promotion";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a promotion covering the listed products.
    #[poise::command(slash_command, rename = "create")]
    pub async fn promotion_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Promotion name"] name: String,
        #[description = "Discount percentage, 0-100"] discount: f64,
        #[description = "First day, YYYY-MM-DD"] start: String,
        #[description = "Last day, YYYY-MM-DD"] end: String,
        #[description = "Comma-separated product names"] products: String,
        #[description = "Only for this membership tier"] tier: Option<TierChoice>,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PROMOTIONS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let new = NewPromotion {
                name,
                discount_percent: discount,
                start_date: parse_day(&start, false)?,
                end_date: parse_day(&end, true)?,
                user_tier: tier.map(Into::into),
                product_ids: product_ids_by_name(db, &split_names(&products)).await?,
            };
            promotion::create_promotion(db, new).await
        }
        .await;

        match result {
            Ok(created) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Created promotion '{}'", created.name),
                )
                .await;
                ctx.say(format!("✅ Promotion created:\n{}", promotion_line(&created)))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists promotions, most recent start first.
    #[poise::command(slash_command, rename = "list")]
    pub async fn promotion_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PROMOTIONS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = promotion::list_promotions(&ctx.data().database)
            .await?
            .iter()
            .map(promotion_line)
            .collect();
        ctx.say(guard::format_list("**Promotions**", &lines, "No promotions yet."))
            .await?;
        Ok(())
    }

    /// Shows the products a promotion covers.
    #[poise::command(slash_command, rename = "products")]
    pub async fn promotion_products(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Promotion"]
        #[autocomplete = "autocomplete::autocomplete_promotion_name"]
        name: String,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_PROMOTIONS)
            .await?
            .is_none()
        {
            return Ok(());
        }
        let db = &ctx.data().database;

        let result = async {
            let found = promotion_by_name(db, &name).await?;
            promotion::products_for_promotion(db, found.id).await
        }
        .await;

        match result {
            Ok(products) => {
                let lines: Vec<String> = products
                    .iter()
                    .map(|p| format!("• {} (${:.2})", p.name, p.price))
                    .collect();
                let header = format!("**Products in '{}'**", name.trim());
                ctx.say(guard::format_list(&header, &lines, "No products linked."))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Changes a promotion. Omitted fields stay unchanged; `products` replaces
    /// the whole product list.
    #[poise::command(slash_command, rename = "update")]
    pub async fn promotion_update(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Promotion"]
        #[autocomplete = "autocomplete::autocomplete_promotion_name"]
        name: String,
        #[description = "New name"] new_name: Option<String>,
        #[description = "New discount percentage"] discount: Option<f64>,
        #[description = "New first day, YYYY-MM-DD"] start: Option<String>,
        #[description = "New last day, YYYY-MM-DD"] end: Option<String>,
        #[description = "Restrict to this tier"] tier: Option<TierChoice>,
        #[description = "Open to every tier"] all_tiers: Option<bool>,
        #[description = "Comma-separated product names (replaces the list)"] products: Option<
            String,
        >,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PROMOTIONS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let existing = promotion_by_name(db, &name).await?;
            let user_tier = if all_tiers.unwrap_or(false) {
                Some(None)
            } else {
                tier.map(|t| Some(t.into()))
            };
            let changes = PromotionChanges {
                name: new_name,
                discount_percent: discount,
                start_date: start.as_deref().map(|s| parse_day(s, false)).transpose()?,
                end_date: end.as_deref().map(|s| parse_day(s, true)).transpose()?,
                user_tier,
            };
            let product_ids = match products.as_deref() {
                Some(list) => Some(product_ids_by_name(db, &split_names(list)).await?),
                None => None,
            };
            let updated = promotion::update_promotion(db, existing.id, changes).await?;
            if let Some(product_ids) = product_ids {
                promotion::set_promotion_products(db, updated.id, &product_ids).await?;
            }
            Ok::<_, Error>(updated)
        }
        .await;

        match result {
            Ok(updated) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Updated promotion '{}'", updated.name),
                )
                .await;
                ctx.say(format!("✅ Promotion updated:\n{}", promotion_line(&updated)))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes a promotion and its product links.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn promotion_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Promotion"]
        #[autocomplete = "autocomplete::autocomplete_promotion_name"]
        name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_PROMOTIONS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let existing = promotion_by_name(db, &name).await?;
            promotion::delete_promotion(db, existing.id).await
        }
        .await;

        match result {
            Ok(deleted) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Deleted promotion '{}'", deleted.name),
                )
                .await;
                ctx.say(format!("🗑️ Promotion **{}** deleted.", deleted.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_day_bounds() {
        let start = parse_day("2025-03-01", false).unwrap();
        let end = parse_day(" 2025-03-01 ", true).unwrap();
        assert_eq!(start.hour(), 0);
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert!(start < end);
    }

    #[test]
    fn test_parse_day_rejects_other_formats() {
        let err = parse_day("03/01/2025", false).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_split_names_trims_and_skips_blanks() {
        assert_eq!(
            split_names(" Stratocaster, ,Telecaster ,"),
            vec!["Stratocaster".to_string(), "Telecaster".to_string()]
        );
    }
}

//! Autocomplete handlers for Discord slash command parameters.
//!
//! Each handler loads the candidate names, keeps those containing the partial
//! input (case-insensitive) and returns at most 25, Discord's limit.

use crate::{
    bot::BotData,
    core::{access, catalog, inventory, promotion},
    errors::Error,
};

const DISCORD_CHOICE_LIMIT: usize = 25;

fn matching(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.dedup();
    matching.truncate(DISCORD_CHOICE_LIMIT);
    matching
}

/// Provides autocomplete suggestions for product names.
pub async fn autocomplete_product_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(products) = catalog::list_products(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(products.into_iter().map(|p| p.name), partial)
}

/// Provides autocomplete suggestions for category names.
pub async fn autocomplete_category_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(categories) = catalog::list_categories(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(categories.into_iter().map(|c| c.name), partial)
}

/// Provides autocomplete suggestions for subcategory names across all categories.
pub async fn autocomplete_subcategory_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(subcategories) = catalog::list_subcategories(&ctx.data().database, None).await else {
        return Vec::new();
    };
    matching(subcategories.into_iter().map(|s| s.name), partial)
}

/// Provides autocomplete suggestions for warehouse locations.
pub async fn autocomplete_warehouse(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(warehouses) = inventory::list_warehouses(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(warehouses.into_iter().map(|w| w.location), partial)
}

/// Provides autocomplete suggestions for role names.
pub async fn autocomplete_role_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(roles) = access::list_roles_with_permissions(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(roles.into_iter().map(|r| r.role.name), partial)
}

/// Provides autocomplete suggestions for promotion names.
pub async fn autocomplete_promotion_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(promotions) = promotion::list_promotions(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(promotions.into_iter().map(|p| p.name), partial)
}

/// Provides autocomplete suggestions for permission names.
#[allow(clippy::unused_async)]
pub async fn autocomplete_permission(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching(
        crate::core::auth::permissions::ALL
            .iter()
            .map(|p| (*p).to_string()),
        partial,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_is_case_insensitive_sorted_and_capped() {
        let names = vec![
            "Telecaster".to_string(),
            "stratocaster".to_string(),
            "Bass".to_string(),
        ];
        assert_eq!(
            matching(names, "CASTER"),
            vec!["Telecaster".to_string(), "stratocaster".to_string()]
        );

        let many = (0..40).map(|i| format!("Item {i:02}"));
        assert_eq!(matching(many, "item").len(), DISCORD_CHOICE_LIMIT);
    }
}

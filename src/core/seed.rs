//! Creates the catalog skeleton and warehouses listed in `config.toml`.
//!
//! Seeding only adds what is missing, so it runs on every start.

use crate::{
    config::AppConfig,
    core::{catalog, inventory},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::info;

/// Counts of rows created by [`seed_from_config`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// New categories
    pub categories: usize,
    /// New subcategories
    pub subcategories: usize,
    /// New warehouses
    pub warehouses: usize,
}

/// Creates missing categories, subcategories and warehouses from the config.
pub async fn seed_from_config(db: &DatabaseConnection, config: &AppConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for category_config in &config.categories {
        let category = match catalog::find_category_by_name(db, category_config.name.trim()).await? {
            Some(existing) => existing,
            None => {
                report.categories += 1;
                catalog::create_category(db, &category_config.name).await?
            }
        };

        let existing: Vec<String> = catalog::list_subcategories(db, Some(category.id))
            .await?
            .into_iter()
            .map(|s| s.name)
            .collect();
        for name in &category_config.subcategories {
            if !existing.iter().any(|e| e == name.trim()) {
                catalog::create_subcategory(db, category.id, name).await?;
                report.subcategories += 1;
            }
        }
    }

    for warehouse_config in &config.warehouses {
        if inventory::find_warehouse_by_location(db, &warehouse_config.location)
            .await?
            .is_none()
        {
            inventory::create_warehouse(db, &warehouse_config.location).await?;
            report.warehouses += 1;
        }
    }

    info!(
        "Seeded {} categories, {} subcategories, {} warehouses from config",
        report.categories, report.subcategories, report.warehouses
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{CategoryConfig, WarehouseConfig};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config = AppConfig {
            categories: vec![CategoryConfig {
                name: "Guitars".to_string(),
                subcategories: vec!["Electric".to_string(), "Acoustic".to_string()],
            }],
            warehouses: vec![WarehouseConfig {
                location: "Main".to_string(),
            }],
            ..Default::default()
        };

        let first = seed_from_config(&db, &config).await?;
        assert_eq!(
            first,
            SeedReport {
                categories: 1,
                subcategories: 2,
                warehouses: 1
            }
        );

        let second = seed_from_config(&db, &config).await?;
        assert_eq!(second, SeedReport::default());
        assert_eq!(catalog::list_subcategories(&db, None).await?.len(), 2);
        Ok(())
    }
}

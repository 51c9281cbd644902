//! Report generation business logic.
//!
//! Aggregates stock per category and per product, and order counts and revenue
//! per status. Aggregation happens in memory over the ledger rows, which keeps the
//! queries portable across backends. The `format_*` helpers render the reports
//! as plain text for the console.

use crate::{
    entities::{Category, Inventory, Order, OrderStatus, Product, Subcategory},
    errors::Result,
};
use sea_orm::{DatabaseConnection, EntityTrait, Iterable};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Total stock held for one category across all its products and warehouses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryStock {
    /// Category name
    pub category_name: String,
    /// Sum of ledger quantities
    pub total_stock: i64,
}

/// Total stock held for one product across all warehouses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductStock {
    /// Product id
    pub product_id: i64,
    /// Product name
    pub product_name: String,
    /// Sum of ledger quantities
    pub total_stock: i64,
}

/// Stock overview returned by [`inventory_report`].
#[derive(Debug, Clone, Default)]
pub struct InventoryReport {
    /// Per-category totals, alphabetical
    pub by_category: Vec<CategoryStock>,
    /// Best-stocked products, most stock first
    pub top_products: Vec<ProductStock>,
}

/// Order overview returned by [`order_summary`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    /// Number of orders per status, in workflow order
    pub counts: Vec<(OrderStatus, u64)>,
    /// Number of orders overall
    pub total_orders: u64,
    /// Sum of `total_price` over orders that are not cancelled
    pub revenue: f64,
}

/// Total ledger quantity per product, alphabetical. Products without ledger rows
/// are listed with zero stock.
pub async fn stock_by_product(db: &DatabaseConnection) -> Result<Vec<ProductStock>> {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    for row in Inventory::find().all(db).await? {
        *totals.entry(row.product_id).or_default() += i64::from(row.quantity);
    }

    let mut stock: Vec<ProductStock> = Product::find()
        .all(db)
        .await?
        .into_iter()
        .map(|product| ProductStock {
            product_id: product.id,
            total_stock: totals.get(&product.id).copied().unwrap_or_default(),
            product_name: product.name,
        })
        .collect();
    stock.sort_by(|a, b| a.product_name.cmp(&b.product_name));
    Ok(stock)
}

/// Stock per category plus the `top_n` best-stocked products.
///
/// Ties in the product ranking are broken by name.
pub async fn inventory_report(db: &DatabaseConnection, top_n: usize) -> Result<InventoryReport> {
    let products = stock_by_product(db).await?;

    let subcategory_of: HashMap<i64, i64> = Product::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.subcategory_id))
        .collect();
    let category_of: HashMap<i64, i64> = Subcategory::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.category_id))
        .collect();

    let mut category_totals: HashMap<i64, i64> = HashMap::new();
    for line in &products {
        if let Some(category_id) = subcategory_of
            .get(&line.product_id)
            .and_then(|s| category_of.get(s))
        {
            *category_totals.entry(*category_id).or_default() += line.total_stock;
        }
    }

    let mut by_category: Vec<CategoryStock> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|category| CategoryStock {
            total_stock: category_totals.get(&category.id).copied().unwrap_or_default(),
            category_name: category.name,
        })
        .collect();
    by_category.sort_by(|a, b| a.category_name.cmp(&b.category_name));

    let mut top_products = products;
    top_products.sort_by(|a, b| {
        b.total_stock
            .cmp(&a.total_stock)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    top_products.truncate(top_n);

    Ok(InventoryReport {
        by_category,
        top_products,
    })
}

/// Order counts per status and revenue from orders that were not cancelled.
pub async fn order_summary(db: &DatabaseConnection) -> Result<OrderSummary> {
    let orders = Order::find().all(db).await?;

    let mut per_status: HashMap<OrderStatus, u64> = HashMap::new();
    let mut revenue = 0.0;
    for order in &orders {
        *per_status.entry(order.status).or_default() += 1;
        if order.status != OrderStatus::Cancelled {
            revenue += order.total_price;
        }
    }

    Ok(OrderSummary {
        counts: OrderStatus::iter()
            .map(|status| (status, per_status.get(&status).copied().unwrap_or_default()))
            .collect(),
        total_orders: orders.len() as u64,
        revenue: crate::core::order::round_cents(revenue),
    })
}

/// Renders an [`InventoryReport`] as plain text.
#[must_use]
pub fn format_inventory_report(report: &InventoryReport) -> String {
    let mut out = String::from("Stock by category\n");
    if report.by_category.is_empty() {
        out.push_str("  (no categories)\n");
    }
    for line in &report.by_category {
        let _ = writeln!(out, "  {}: {}", line.category_name, line.total_stock);
    }
    out.push_str("\nTop products by stock\n");
    if report.top_products.is_empty() {
        out.push_str("  (no products)\n");
    }
    for (rank, line) in report.top_products.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}: {}", rank + 1, line.product_name, line.total_stock);
    }
    out
}

/// Renders an [`OrderSummary`] as plain text.
#[must_use]
pub fn format_order_summary(summary: &OrderSummary) -> String {
    let mut out = format!("Orders: {}\n", summary.total_orders);
    for (status, count) in &summary.counts {
        let _ = writeln!(out, "  {status}: {count}");
    }
    let _ = write!(out, "Revenue (excluding cancelled): ${:.2}", summary.revenue);
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{catalog, inventory, order};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_inventory_report() -> Result<()> {
        let (db, _guitars, electric) = setup_with_catalog().await?;
        let drums = catalog::create_category(&db, "Drums").await?;
        let kits = catalog::create_subcategory(&db, drums.id, "Kits").await?;
        let main = create_test_warehouse(&db, "Main").await?;
        let annex = create_test_warehouse(&db, "Annex").await?;

        let strat = create_test_product(&db, "Strat", electric.id).await?;
        let tele = create_test_product(&db, "Tele", electric.id).await?;
        let kit = create_test_product(&db, "Kit", kits.id).await?;
        create_test_product(&db, "Unstocked", electric.id).await?;

        inventory::adjust(&db, strat.id, main.id, 10).await?;
        inventory::adjust(&db, strat.id, annex.id, 5).await?;
        inventory::adjust(&db, tele.id, main.id, 15).await?;
        inventory::adjust(&db, kit.id, main.id, 2).await?;

        let report = inventory_report(&db, 2).await?;
        assert_eq!(
            report.by_category,
            vec![
                CategoryStock {
                    category_name: "Drums".to_string(),
                    total_stock: 2
                },
                CategoryStock {
                    category_name: "Guitars".to_string(),
                    total_stock: 30
                },
            ]
        );
        let top: Vec<_> = report
            .top_products
            .iter()
            .map(|p| (p.product_name.as_str(), p.total_stock))
            .collect();
        assert_eq!(top, vec![("Strat", 15), ("Tele", 15)]);

        let text = format_inventory_report(&report);
        assert!(text.contains("Guitars: 30"));
        assert!(text.contains("1. Strat: 15"));

        let per_product = stock_by_product(&db).await?;
        assert_eq!(per_product.len(), 4);
        assert!(per_product.iter().any(|p| p.product_name == "Unstocked" && p.total_stock == 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_order_summary_excludes_cancelled_revenue() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;
        let second = order::create_order(
            db,
            order::NewOrder {
                customer_id: fixture.customer.id,
                product_id: fixture.product.id,
                quantity: 3,
            },
        )
        .await?;
        order::cancel_order(db, second.id).await?;

        let summary = order_summary(db).await?;
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.revenue, fixture.order.total_price);
        let cancelled = summary
            .counts
            .iter()
            .find(|(status, _)| *status == OrderStatus::Cancelled)
            .map(|(_, count)| *count);
        assert_eq!(cancelled, Some(1));
        assert!(format_order_summary(&summary).contains("Cancelled: 1"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_store_reports() -> Result<()> {
        let db = setup_test_db().await?;
        let report = inventory_report(&db, 5).await?;
        assert!(report.by_category.is_empty());
        assert!(report.top_products.is_empty());

        let summary = order_summary(&db).await?;
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.revenue, 0.0);
        assert_eq!(summary.counts.len(), 5);
        Ok(())
    }
}

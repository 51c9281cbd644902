//! Catalog business logic - Categories, subcategories and products.
//!
//! Products are always filed under a subcategory, which callers may reference
//! either by id or by name ([`SubcategoryRef`]). An unresolvable reference is a
//! validation failure rather than a store error, so the console can report it
//! to the user. Deleting a product removes its inventory rows and promotion
//! links in the same transaction.

use crate::{
    entities::{
        Category, Order, Product, PromotionProduct, Return, Subcategory, category, order,
        order_return, product, promotion_product, subcategory,
    },
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument};

/// How a caller refers to a subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubcategoryRef {
    /// By primary key
    Id(i64),
    /// By display name (first match by id when names repeat across categories)
    Name(String),
}

impl std::fmt::Display for SubcategoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// List price, must be finite and non-negative
    pub price: f64,
    /// Subcategory to file the product under
    pub subcategory: SubcategoryRef,
    /// Discount percentage in `[0, 100]`
    pub discount: f64,
    /// Optional technical specifications
    pub specifications: Option<String>,
    /// Optional image path or URL
    pub image_url: Option<String>,
}

impl NewProduct {
    /// A product with only the required fields set and no discount.
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64, subcategory: SubcategoryRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            subcategory,
            discount: 0.0,
            specifications: None,
            image_url: None,
        }
    }
}

/// Partial update for [`update_product`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    /// New name
    pub name: Option<String>,
    /// New description (empty string clears it)
    pub description: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// Move to another subcategory
    pub subcategory: Option<SubcategoryRef>,
    /// New discount percentage
    pub discount: Option<f64>,
    /// New specifications (empty string clears them)
    pub specifications: Option<String>,
    /// New image path (empty string clears it)
    pub image_url: Option<String>,
}

/// Narrowing for [`filter_products`]. The subcategory wins when both are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    /// Only products whose subcategory belongs to this category
    pub category_id: Option<i64>,
    /// Only products in this subcategory
    pub subcategory_id: Option<i64>,
}

/// A product together with the names along its catalog path.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    /// The product itself
    pub product: product::Model,
    /// Name of its subcategory
    pub subcategory_name: String,
    /// Name of the parent category
    pub category_name: String,
}

/// Result of [`delete_product`].
#[derive(Debug, Clone)]
pub struct ProductDeletion {
    /// The product as it was before deletion
    pub product: product::Model,
    /// Number of inventory rows removed with it
    pub inventory_rows_removed: u64,
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates the product fields shared by creation, update and bulk import.
///
/// # Errors
/// Returns `Validation` for a blank name and `InvalidAmount` for a negative or
/// non-finite price, or a discount outside `[0, 100]`.
pub fn validate_product_fields(name: &str, price: f64, discount: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount {
            field: "price",
            value: price,
        });
    }
    if !discount.is_finite() || !(0.0..=100.0).contains(&discount) {
        return Err(Error::InvalidAmount {
            field: "discount",
            value: discount,
        });
    }
    Ok(())
}

/// Creates a category with a unique name.
#[instrument(skip(db))]
pub async fn create_category(db: &DatabaseConnection, name: &str) -> Result<category::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if find_category_by_name(db, name).await?.is_some() {
        return Err(Error::validation(format!("Category '{name}' already exists")));
    }

    let category = category::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created category '{}' (ID: {})", category.name, category.id);
    Ok(category)
}

/// Finds a category by its exact name.
pub async fn find_category_by_name<C>(db: &C, name: &str) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all categories alphabetically.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes an empty category.
///
/// # Errors
/// `NotFound` when the category does not exist; `Validation` while it still has
/// subcategories.
#[instrument(skip(db))]
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Category", category_id))?;

    let children = Subcategory::find()
        .filter(subcategory::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    if children > 0 {
        return Err(Error::validation(format!(
            "Category '{}' still has {children} subcategories",
            category.name
        )));
    }

    Category::delete_by_id(category_id).exec(db).await?;
    info!("Deleted category '{}' (ID: {})", category.name, category.id);
    Ok(category)
}

/// Creates a subcategory under an existing category. Names are unique per category.
#[instrument(skip(db))]
pub async fn create_subcategory(
    db: &DatabaseConnection,
    category_id: i64,
    name: &str,
) -> Result<subcategory::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Subcategory name cannot be empty"));
    }

    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Category", category_id))?;

    let duplicate = Subcategory::find()
        .filter(subcategory::Column::CategoryId.eq(category_id))
        .filter(subcategory::Column::Name.eq(name))
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(Error::validation(format!(
            "Subcategory '{name}' already exists in this category"
        )));
    }

    let subcategory = subcategory::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(category_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created subcategory '{}' (ID: {}) under category_id {}",
        subcategory.name, subcategory.id, category_id
    );
    Ok(subcategory)
}

/// Lists subcategories alphabetically, optionally limited to one category.
pub async fn list_subcategories(
    db: &DatabaseConnection,
    category_id: Option<i64>,
) -> Result<Vec<subcategory::Model>> {
    let mut query = Subcategory::find();
    if let Some(category_id) = category_id {
        query = query.filter(subcategory::Column::CategoryId.eq(category_id));
    }
    query
        .order_by_asc(subcategory::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves a subcategory reference.
///
/// # Errors
/// An unresolvable reference yields `Validation`, not `NotFound`: it is bad
/// input to the operation that carried it.
pub async fn resolve_subcategory<C>(db: &C, reference: &SubcategoryRef) -> Result<subcategory::Model>
where
    C: ConnectionTrait,
{
    let found = match reference {
        SubcategoryRef::Id(id) => Subcategory::find_by_id(*id).one(db).await?,
        SubcategoryRef::Name(name) => {
            Subcategory::find()
                .filter(subcategory::Column::Name.eq(name.trim()))
                .order_by_asc(subcategory::Column::Id)
                .one(db)
                .await?
        }
    };
    found.ok_or_else(|| Error::validation(format!("Subcategory '{reference}' not found")))
}

/// Creates a product after validating its fields and resolving its subcategory.
///
/// Generic over the connection so bulk import can call it inside its transaction.
pub async fn create_product<C>(db: &C, new: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    validate_product_fields(&new.name, new.price, new.discount)?;
    let subcategory = resolve_subcategory(db, &new.subcategory).await?;

    let now = chrono::Utc::now().naive_utc();
    let product = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(clean_optional(new.description)),
        price: Set(new.price),
        subcategory_id: Set(subcategory.id),
        discount: Set(new.discount),
        specifications: Set(clean_optional(new.specifications)),
        image_url: Set(clean_optional(new.image_url)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created product '{}' (ID: {}) in subcategory '{}'",
        product.name, product.id, subcategory.name
    );
    Ok(product)
}

/// Retrieves a product by id.
///
/// # Errors
/// `NotFound` when no product has this id.
pub async fn get_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Product", product_id))
}

/// Finds a product by its exact name.
pub async fn find_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name.trim()))
        .order_by_asc(product::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by its exact name.
///
/// # Errors
/// `NotFound` when no product has this name.
pub async fn get_product_by_name(db: &DatabaseConnection, name: &str) -> Result<product::Model> {
    find_product_by_name(db, name)
        .await?
        .ok_or_else(|| Error::not_found("Product", name.trim()))
}

/// Lists all products alphabetically.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists products narrowed by category and/or subcategory.
pub async fn filter_products(
    db: &DatabaseConnection,
    filter: ProductFilter,
) -> Result<Vec<product::Model>> {
    let query = match (filter.subcategory_id, filter.category_id) {
        (Some(subcategory_id), _) => {
            Product::find().filter(product::Column::SubcategoryId.eq(subcategory_id))
        }
        (None, Some(category_id)) => Product::find()
            .inner_join(Subcategory)
            .filter(subcategory::Column::CategoryId.eq(category_id)),
        (None, None) => Product::find(),
    };
    query
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists products with their subcategory and category names.
pub async fn list_product_details(
    db: &DatabaseConnection,
    filter: ProductFilter,
) -> Result<Vec<ProductDetails>> {
    let products = filter_products(db, filter).await?;
    let subcategories: HashMap<i64, subcategory::Model> = Subcategory::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();
    let categories: HashMap<i64, String> = Category::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(products
        .into_iter()
        .map(|product| {
            let subcategory = subcategories.get(&product.subcategory_id);
            let subcategory_name = subcategory.map_or_else(|| "?".to_string(), |s| s.name.clone());
            let category_name = subcategory
                .and_then(|s| categories.get(&s.category_id))
                .cloned()
                .unwrap_or_else(|| "?".to_string());
            ProductDetails {
                product,
                subcategory_name,
                category_name,
            }
        })
        .collect())
}

/// Applies a partial update to a product, re-validating the merged result.
#[instrument(skip(db, changes))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductChanges,
) -> Result<product::Model> {
    let existing = get_product(db, product_id).await?;

    let name = changes
        .name
        .map_or_else(|| existing.name.clone(), |n| n.trim().to_string());
    let price = changes.price.unwrap_or(existing.price);
    let discount = changes.discount.unwrap_or(existing.discount);
    validate_product_fields(&name, price, discount)?;

    let subcategory_id = match &changes.subcategory {
        Some(reference) => resolve_subcategory(db, reference).await?.id,
        None => existing.subcategory_id,
    };

    let mut product: product::ActiveModel = existing.into();
    product.name = Set(name);
    product.price = Set(price);
    product.discount = Set(discount);
    product.subcategory_id = Set(subcategory_id);
    if let Some(description) = changes.description {
        product.description = Set(clean_optional(Some(description)));
    }
    if let Some(specifications) = changes.specifications {
        product.specifications = Set(clean_optional(Some(specifications)));
    }
    if let Some(image_url) = changes.image_url {
        product.image_url = Set(clean_optional(Some(image_url)));
    }
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = product.update(db).await?;
    info!("Updated product '{}' (ID: {})", updated.name, updated.id);
    Ok(updated)
}

/// Deletes a product together with its inventory rows and promotion links.
///
/// All three deletes share one transaction, so either the product and
/// everything referencing it disappears or nothing changes.
///
/// # Errors
/// `Validation` while any order or return still references the product.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<ProductDeletion> {
    let txn = db.begin().await?;

    let product = get_product(&txn, product_id).await?;
    let orders = Order::find()
        .filter(order::Column::ProductId.eq(product_id))
        .count(&txn)
        .await?;
    let returns = Return::find()
        .filter(order_return::Column::ProductId.eq(product_id))
        .count(&txn)
        .await?;
    if orders + returns > 0 {
        return Err(Error::validation(format!(
            "Product '{}' is still referenced by {orders} orders and {returns} returns",
            product.name
        )));
    }

    let inventory_rows_removed =
        crate::core::inventory::delete_inventory_for_product(&txn, product_id).await?;
    PromotionProduct::delete_many()
        .filter(promotion_product::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    Product::delete_by_id(product_id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        "Deleted product '{}' (ID: {}) and {} inventory rows",
        product.name, product.id, inventory_rows_removed
    );
    Ok(ProductDeletion {
        product,
        inventory_rows_removed,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Inventory;
    use crate::test_utils::*;

    #[test]
    fn test_validate_product_fields() {
        assert!(validate_product_fields("Strat", 999.0, 10.0).is_ok());
        assert!(validate_product_fields("Free pick", 0.0, 0.0).is_ok());
        assert!(validate_product_fields("Max", 1.0, 100.0).is_ok());

        assert!(matches!(
            validate_product_fields("  ", 1.0, 0.0),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            validate_product_fields("Strat", -1.0, 0.0),
            Err(Error::InvalidAmount { field: "price", .. })
        ));
        assert!(matches!(
            validate_product_fields("Strat", f64::NAN, 0.0),
            Err(Error::InvalidAmount { field: "price", .. })
        ));
        assert!(matches!(
            validate_product_fields("Strat", 1.0, 100.5),
            Err(Error::InvalidAmount { field: "discount", .. })
        ));
        assert!(matches!(
            validate_product_fields("Strat", 1.0, -0.1),
            Err(Error::InvalidAmount { field: "discount", .. })
        ));
    }

    #[tokio::test]
    async fn test_category_names_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_category(&db, "Guitars").await?;

        let result = create_category(&db, " Guitars ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_category(&db, "").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_subcategory_requires_existing_category() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_subcategory(&db, 42, "Electric").await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Category", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_by_subcategory_name_and_id() -> Result<()> {
        let (db, _category, subcategory) = setup_with_catalog().await?;

        let by_name = create_product(
            &db,
            NewProduct::new("Stratocaster", 1199.0, SubcategoryRef::Name("Electric".to_string())),
        )
        .await?;
        assert_eq!(by_name.subcategory_id, subcategory.id);
        assert_eq!(by_name.discount, 0.0);

        let by_id = create_product(
            &db,
            NewProduct::new("Telecaster", 1099.0, SubcategoryRef::Id(subcategory.id)),
        )
        .await?;
        assert_eq!(by_id.subcategory_id, subcategory.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_unresolvable_subcategory_is_validation() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;

        let result = create_product(
            &db,
            NewProduct::new("Ukulele", 50.0, SubcategoryRef::Name("Ukuleles".to_string())),
        )
        .await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert!(list_products(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_partial() -> Result<()> {
        let (db, category, subcategory) = setup_with_catalog().await?;
        let acoustic = create_subcategory(&db, category.id, "Acoustic").await?;
        let product = create_test_product(&db, "Dreadnought", subcategory.id).await?;

        let updated = update_product(
            &db,
            product.id,
            ProductChanges {
                price: Some(450.0),
                discount: Some(15.0),
                subcategory: Some(SubcategoryRef::Name("Acoustic".to_string())),
                description: Some("Solid spruce top".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "Dreadnought");
        assert_eq!(updated.price, 450.0);
        assert_eq!(updated.discount, 15.0);
        assert_eq!(updated.subcategory_id, acoustic.id);
        assert_eq!(updated.description.as_deref(), Some("Solid spruce top"));

        let rejected = update_product(
            &db,
            product.id,
            ProductChanges {
                discount: Some(150.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(rejected, Err(Error::InvalidAmount { .. })));
        assert_eq!(get_product(&db, product.id).await?.discount, 15.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_products_by_category_and_subcategory() -> Result<()> {
        let (db, guitars, electric) = setup_with_catalog().await?;
        let acoustic = create_subcategory(&db, guitars.id, "Acoustic").await?;
        let drums = create_category(&db, "Drums").await?;
        let kits = create_subcategory(&db, drums.id, "Kits").await?;

        create_test_product(&db, "Strat", electric.id).await?;
        create_test_product(&db, "Dreadnought", acoustic.id).await?;
        create_test_product(&db, "Five-piece kit", kits.id).await?;

        let guitars_only = filter_products(
            &db,
            ProductFilter {
                category_id: Some(guitars.id),
                subcategory_id: None,
            },
        )
        .await?;
        let names: Vec<_> = guitars_only.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Dreadnought", "Strat"]);

        let kits_only = filter_products(
            &db,
            ProductFilter {
                category_id: Some(guitars.id),
                subcategory_id: Some(kits.id),
            },
        )
        .await?;
        assert_eq!(kits_only.len(), 1);
        assert_eq!(kits_only[0].name, "Five-piece kit");

        let details = list_product_details(&db, ProductFilter::default()).await?;
        let kit = details.iter().find(|d| d.product.name == "Five-piece kit").unwrap();
        assert_eq!(kit.category_name, "Drums");
        assert_eq!(kit.subcategory_name, "Kits");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_cascades_inventory() -> Result<()> {
        let (db, _category, subcategory) = setup_with_catalog().await?;
        let product = create_test_product(&db, "Strat", subcategory.id).await?;
        let other = create_test_product(&db, "Tele", subcategory.id).await?;
        let main = create_test_warehouse(&db, "Main").await?;
        let annex = create_test_warehouse(&db, "Annex").await?;

        crate::core::inventory::adjust(&db, product.id, main.id, 10).await?;
        crate::core::inventory::adjust(&db, product.id, annex.id, 4).await?;
        crate::core::inventory::adjust(&db, other.id, main.id, 7).await?;

        let deletion = delete_product(&db, product.id).await?;
        assert_eq!(deletion.inventory_rows_removed, 2);
        assert_eq!(deletion.product.id, product.id);

        let orphans = Inventory::find()
            .filter(crate::entities::inventory::Column::ProductId.eq(product.id))
            .count(&db)
            .await?;
        assert_eq!(orphans, 0);
        assert_eq!(Inventory::find().count(&db).await?, 1);

        let missing = get_product(&db, product.id).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_with_orders_is_rejected() -> Result<()> {
        let fixture = setup_with_order().await?;
        let db = &fixture.db;

        let result = delete_product(db, fixture.product.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assert_eq!(get_product(db, fixture.product.id).await?.id, fixture.product.id);
        let invoice = crate::core::order::render_invoice(db, fixture.order.id).await?;
        assert!(invoice.contains(&fixture.product.name));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_product(&db, 999).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Product", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_rejected_while_not_empty() -> Result<()> {
        let (db, category, _subcategory) = setup_with_catalog().await?;
        let result = delete_category(&db, category.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let empty = create_category(&db, "Keyboards").await?;
        delete_category(&db, empty.id).await?;
        assert_eq!(list_categories(&db).await?.len(), 1);
        Ok(())
    }
}

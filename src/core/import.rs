//! Bulk product import from CSV.
//!
//! The payload must have a header row naming at least `name`, `price` and
//! `subcategory_name`; `description`, `specifications` and `discount` are
//! optional. Header names are matched case-insensitively.
//!
//! Import is all-or-nothing: every product is inserted inside one transaction
//! and the first bad row aborts the whole file with [`Error::ImportRow`], whose
//! `row` is the 1-based data row (the header is not counted).

use crate::{
    config::settings::{DEFAULT_IMPORT_MAX_BYTES, ImportConfig},
    core::catalog::{self, NewProduct, SubcategoryRef},
    entities::product,
    errors::{Error, Result},
};
use csv::{ReaderBuilder, StringRecord, Trim};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

const REQUIRED_COLUMNS: [&str; 3] = ["name", "price", "subcategory_name"];

/// Limits applied before any row is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Largest accepted payload in bytes
    pub max_bytes: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_IMPORT_MAX_BYTES,
        }
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
        }
    }
}

/// Column positions resolved from the header row.
struct Columns {
    name: usize,
    price: usize,
    subcategory_name: usize,
    description: Option<usize>,
    specifications: Option<usize>,
    discount: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| position(column).is_none())
            .collect();
        if let (Some(name), Some(price), Some(subcategory_name)) = (
            position("name"),
            position("price"),
            position("subcategory_name"),
        ) {
            Ok(Self {
                name,
                price,
                subcategory_name,
                description: position("description"),
                specifications: position("specifications"),
                discount: position("discount"),
            })
        } else {
            Err(Error::validation(format!(
                "CSV is missing required columns: {}",
                missing.join(", ")
            )))
        }
    }
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or_default().trim()
}

fn optional_field(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .map(|i| field(record, i))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Turns one data row into a [`NewProduct`], or the reason it is unusable.
fn parse_row(record: &StringRecord, columns: &Columns) -> std::result::Result<NewProduct, String> {
    let name = field(record, columns.name);
    if name.is_empty() {
        return Err("name is required".to_string());
    }

    let price_text = field(record, columns.price);
    if price_text.is_empty() {
        return Err("price is required".to_string());
    }
    let price: f64 = price_text
        .parse()
        .map_err(|_| format!("price '{price_text}' is not a number"))?;

    let subcategory_name = field(record, columns.subcategory_name);
    if subcategory_name.is_empty() {
        return Err("subcategory_name is required".to_string());
    }

    let discount = match optional_field(record, columns.discount) {
        Some(text) => text
            .parse()
            .map_err(|_| format!("discount '{text}' is not a number"))?,
        None => 0.0,
    };

    catalog::validate_product_fields(name, price, discount).map_err(|e| e.to_string())?;

    Ok(NewProduct {
        name: name.to_string(),
        description: optional_field(record, columns.description),
        price,
        subcategory: SubcategoryRef::Name(subcategory_name.to_string()),
        discount,
        specifications: optional_field(record, columns.specifications),
        image_url: None,
    })
}

/// Imports products from CSV bytes.
///
/// Returns the inserted products in file order. On any error nothing from the
/// file is committed.
///
/// # Errors
/// `Validation` for an empty or oversized payload or missing header columns;
/// `ImportRow` for the first row that fails to parse or validate.
#[instrument(skip(db, bytes, options), fields(size = bytes.len()))]
pub async fn import_products_csv(
    db: &DatabaseConnection,
    bytes: &[u8],
    options: &ImportOptions,
) -> Result<Vec<product::Model>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::validation("The uploaded CSV file is empty"));
    }
    if bytes.len() > options.max_bytes {
        return Err(Error::validation(format!(
            "The uploaded CSV file is {} bytes, the limit is {} bytes",
            bytes.len(),
            options.max_bytes
        )));
    }

    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);
    let columns = Columns::from_headers(reader.headers()?)?;

    let txn = db.begin().await?;
    let mut inserted = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record.map_err(|e| Error::ImportRow {
            row,
            reason: e.to_string(),
        })?;
        let new = parse_row(&record, &columns).map_err(|reason| {
            warn!(row, %reason, "Rejecting CSV import");
            Error::ImportRow { row, reason }
        })?;

        let product = catalog::create_product(&txn, new)
            .await
            .map_err(|e| match e {
                e if e.is_validation() || e.is_not_found() => {
                    warn!(row, reason = %e, "Rejecting CSV import");
                    Error::ImportRow {
                        row,
                        reason: e.to_string(),
                    }
                }
                other => other,
            })?;
        inserted.push(product);
    }

    if inserted.is_empty() {
        return Err(Error::validation("The uploaded CSV file has no data rows"));
    }
    txn.commit().await?;

    info!("Imported {} products from CSV", inserted.len());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    #![allow(clippy::panic)]
    use super::*;
    use crate::core::catalog::list_products;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_import_valid_file() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;
        let csv = b"name,price,subcategory_name,description,discount\n\
Stratocaster,1199.00,Electric,Alder body,10\n\
Telecaster, 1099 ,Electric,,\n\
Jazzmaster,1299.5,Electric,Offset,0\n";

        let products = import_products_csv(&db, csv, &ImportOptions::default()).await?;
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].name, "Stratocaster");
        assert_eq!(products[0].discount, 10.0);
        assert_eq!(products[1].price, 1099.0);
        assert_eq!(products[1].description, None);
        assert_eq!(list_products(&db).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_one_bad_row_rejects_whole_file() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;
        let csv = b"name,price,subcategory_name\n\
Stratocaster,1199,Electric\n\
Telecaster,-5,Electric\n\
Jazzmaster,1299,Electric\n";

        let result = import_products_csv(&db, csv, &ImportOptions::default()).await;
        assert!(matches!(result, Err(Error::ImportRow { row: 2, .. })));
        assert!(list_products(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_subcategory_reports_row() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;
        let csv = b"name,price,subcategory_name\nStratocaster,1199,Electric\nCajon,150,Percussion\n";

        let result = import_products_csv(&db, csv, &ImportOptions::default()).await;
        match result {
            Err(Error::ImportRow { row, reason }) => {
                assert_eq!(row, 2);
                assert!(reason.contains("Percussion"));
            }
            other => panic!("expected ImportRow, got {other:?}"),
        }
        assert!(list_products(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_numbers_and_blank_fields() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;
        let options = ImportOptions::default();

        let result =
            import_products_csv(&db, b"name,price,subcategory_name\nStrat,abc,Electric\n", &options).await;
        assert!(matches!(result, Err(Error::ImportRow { row: 1, .. })));

        let result = import_products_csv(
            &db,
            b"name,price,subcategory_name,discount\nStrat,10,Electric,101\n",
            &options,
        )
        .await;
        assert!(matches!(result, Err(Error::ImportRow { row: 1, .. })));

        let result =
            import_products_csv(&db, b"name,price,subcategory_name\n ,10,Electric\n", &options).await;
        assert!(matches!(result, Err(Error::ImportRow { row: 1, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_prechecks() -> Result<()> {
        let (db, _category, _subcategory) = setup_with_catalog().await?;

        let result = import_products_csv(&db, b"", &ImportOptions::default()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = import_products_csv(&db, b"name,price\nStrat,10\n", &ImportOptions::default()).await;
        match result {
            Err(Error::Validation { message }) => assert!(message.contains("subcategory_name")),
            other => panic!("expected Validation, got {other:?}"),
        }

        let tiny = ImportOptions { max_bytes: 8 };
        let result =
            import_products_csv(&db, b"name,price,subcategory_name\nStrat,10,Electric\n", &tiny).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}

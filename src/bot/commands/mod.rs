//! Discord command implementations organized by area.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Account linking commands
pub mod account;

/// Administration commands (roles, admin accounts, activity log)
pub mod admin;

/// Catalog commands (categories, subcategories, products, bulk import)
pub mod catalog;

/// Fixed-choice parameter types
pub mod choices;

/// General utility commands
pub mod general;

/// Stock commands (warehouses and the inventory ledger)
pub mod inventory;

/// Customer and order commands
pub mod orders;

/// Promotion commands
pub mod promotions;

/// Return commands
pub mod returns;

// Export commands
pub use account::*;
pub use admin::*;
pub use catalog::*;
pub use general::*;
pub use inventory::*;
pub use orders::*;
pub use promotions::*;
pub use returns::*;

//! Core layer - Framework-agnostic business logic
//!
//! Every operation takes an explicit database handle and returns
//! [`crate::errors::Result`]. Nothing here knows about Discord; the bot layer
//! checks permissions, calls into these modules and formats the results.

/// Role, permission and admin account management
pub mod access;
/// Audit trail of admin actions
pub mod activity;
/// Authentication and permission checks
pub mod auth;
/// Categories, subcategories and products
pub mod catalog;
/// Customer records
pub mod customer;
/// Bulk CSV product import
pub mod import;
/// Stock ledger per product and warehouse
pub mod inventory;
/// Orders and their status workflow
pub mod order;
/// Time-boxed product discounts
pub mod promotion;
/// Stock and order reports
pub mod report;
/// Return requests and their effect on orders
pub mod returns;
/// Startup seeding from `config.toml`
pub mod seed;

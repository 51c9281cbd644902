//! Unified error type for the back-office.
//!
//! Every fallible operation in `core` returns [`Result`]. The variants fall into
//! four groups: validation failures (bad input, nothing written), missing
//! entities, authorization failures, and store failures (the surrounding
//! transaction is rolled back). The console layer uses the `is_*` helpers to
//! decide which errors are reported back to the caller and which are logged.

use thiserror::Error;

/// All errors produced by the back-office.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input field.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of what was wrong
        message: String,
    },

    /// Numeric input outside its allowed range (negative price, discount above 100, ...).
    #[error("Invalid value for {field}: {value}")]
    InvalidAmount {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// An inventory adjustment would take a quantity below zero.
    #[error("Insufficient stock: current quantity {current}, adjustment {delta}")]
    NegativeStock {
        /// Quantity before the adjustment
        current: i32,
        /// Requested change
        delta: i32,
    },

    /// A status change that the workflow does not allow.
    #[error("Cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// A bulk import row failed validation. `row` is 1-based and excludes the header.
    #[error("Import failed at row {row}: {reason}")]
    ImportRow {
        /// 1-based data row index
        row: usize,
        /// Why the row was rejected
        reason: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of entity (e.g. "Product")
        entity: &'static str,
        /// Id or name used for the lookup
        key: String,
    },

    /// The caller is not linked to any admin account.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The caller's role lacks the required permission.
    #[error("Missing permission '{permission}'")]
    Forbidden {
        /// Name of the permission that was required
        permission: String,
    },

    /// The change would leave no holder of a superadmin role.
    #[error("At least one SuperAdmin must remain")]
    LastSuperAdmin,

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Store failure; the current unit of work is rolled back.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// CSV payload could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Password hashing or hash parsing failed.
    #[error("Password hash error: {message}")]
    PasswordHash {
        /// Message from the hasher
        message: String,
    },

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise failure in the console layer.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for building a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// True for input problems that left the store untouched.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::NegativeStock { .. }
                | Self::InvalidTransition { .. }
                | Self::ImportRow { .. }
        )
    }

    /// True when a referenced entity was missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for authentication and permission failures.
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::Forbidden { .. } | Self::LastSuperAdmin
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::validation("bad").is_validation());
        assert!(Error::ImportRow { row: 2, reason: "x".to_string() }.is_validation());
        assert!(Error::not_found("Product", 7).is_not_found());
        assert!(Error::Unauthenticated.is_authorization());
        assert!(Error::LastSuperAdmin.is_authorization());
        assert!(!Error::Unauthenticated.is_validation());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::not_found("Warehouse", "Main");
        assert_eq!(err.to_string(), "Warehouse 'Main' not found");

        let err = Error::ImportRow {
            row: 3,
            reason: "price must not be negative".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Import failed at row 3: price must not be negative"
        );
    }
}

/// Database configuration and connection management
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;

/// Bootstrap admin account from environment variables
pub mod admins;

pub use settings::AppConfig;

//! Bot layer - Discord admin console
//!
//! Every staff action is a slash command. Handlers start with an explicit
//! permission guard ([`handlers::guard::require_permission`]), call into
//! [`crate::core`], record the action in the activity log and reply.

/// Discord command implementations (catalog, inventory, orders, returns, promotions, admin)
pub mod commands;
/// Discord interaction handlers (autocomplete, permission guard)
pub mod handlers;

use crate::{config::AppConfig, core::import::ImportOptions, errors::Error};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the loaded configuration
/// that commands need to access.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings loaded from `config.toml`
    pub config: AppConfig,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection and settings.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        Self { database, config }
    }

    /// Bulk import limits derived from the settings.
    #[must_use]
    pub fn import_options(&self) -> ImportOptions {
        ImportOptions::from(&self.config.import)
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().qualified_name, error);
            let reply = poise::CreateReply::default()
                .content("❌ Something went wrong while running this command. It has been logged.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send error message: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every slash command the console registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        commands::ping(),
        commands::help(),
        commands::account(),
        commands::category(),
        commands::product(),
        commands::warehouse(),
        commands::inventory(),
        commands::customer(),
        commands::order(),
        commands::return_request(),
        commands::promotion(),
        commands::role(),
        commands::admin(),
        commands::activity(),
    ]
}

/// Connects to Discord and serves the console until the client stops.
///
/// # Errors
/// Returns the serenity error when the client cannot be built or stops with an error.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<(), serenity::Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISCORD_DESCRIPTION_LIMIT: usize = 100;

    fn check_descriptions(command: &poise::Command<BotData, Error>) {
        let length = command.description.as_deref().map_or(0, |d| d.chars().count());
        assert!(
            length <= DISCORD_DESCRIPTION_LIMIT,
            "/{} description is {length} chars",
            command.qualified_name
        );
        for parameter in &command.parameters {
            let length = parameter.description.as_deref().map_or(0, |d| d.chars().count());
            assert!(
                length <= DISCORD_DESCRIPTION_LIMIT,
                "/{} option '{}' description is {length} chars",
                command.qualified_name,
                parameter.name
            );
        }
        command.subcommands.iter().for_each(check_descriptions);
    }

    #[test]
    fn test_command_descriptions_fit_discord_limit() {
        let commands = all_commands();
        assert!(!commands.is_empty());
        commands.iter().for_each(check_descriptions);
    }
}

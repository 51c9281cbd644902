//! General Discord commands - ping and help.
//! These commands need no permission and touch no data.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Shop Admin Help**\n\
        Link your Discord account once with `/account link`, then every command \
        checks your role's permissions.\n\n\
        **Catalog** (`manage_products`)\n\
        • `/category add|list|delete`, `/category sub_add|sub_list`\n\
        • `/product add|list|show|update|delete|import`\n\n\
        **Stock** (`manage_inventory`)\n\
        • `/warehouse add|list`\n\
        • `/inventory adjust|set|list|low|report`\n\n\
        **Sales** (`manage_customers`, `manage_orders`, `manage_returns`, `manage_promotions`)\n\
        • `/customer add|list|tier|delete`\n\
        • `/order create|list|status|cancel|tracking|invoice|delete|summary`\n\
        • `/return create|list|status`\n\
        • `/promotion create|list|products|delete`\n\n\
        **Administration** (`manage_roles`, `manage_users`, `view_activity_logs`)\n\
        • `/role create|list|grant|revoke|delete`\n\
        • `/admin create|list|set_role|delete`\n\
        • `/activity`\n\n\
        **Utility**\n\
        • `/account link|whoami`, `/ping`, `/help`";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

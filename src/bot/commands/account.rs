//! Account Discord commands - linking a Discord user to an admin account.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::guard},
        core::auth,
        errors::{Error, Result},
    };

    /// Parent command for the caller's own admin account.
    #[poise::command(slash_command, subcommands("account_link", "account_whoami"))]
    pub async fn account(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Use `/account link` to sign in or `/account whoami` to check your role.")
            .await?;
        Ok(())
    }

    /// Links your Discord account to an admin account.
    ///
    /// The reply is only visible to you, and the password is never stored.
    #[poise::command(slash_command, rename = "link", ephemeral)]
    pub async fn account_link(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Admin username"] username: String,
        #[description = "Admin password"] password: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let discord_id = ctx.author().id.to_string();

        match auth::link_discord_account(db, &username, &password, &discord_id).await {
            Ok(principal) => {
                guard::log_activity(ctx, &principal, "Linked Discord account").await;
                guard::reply_private(
                    ctx,
                    format!(
                        "✅ Linked to admin **{}** (role: {}).",
                        principal.username, principal.role_name
                    ),
                )
                .await
            }
            Err(Error::Unauthenticated) => {
                guard::reply_private(ctx, "❌ Invalid username or password.").await
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Shows which admin account and role you act as.
    #[poise::command(slash_command, rename = "whoami", ephemeral)]
    pub async fn account_whoami(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        match auth::resolve_principal(db, &ctx.author().id.to_string()).await {
            Ok(principal) => {
                let note = if principal.is_superadmin {
                    " (all permissions)"
                } else {
                    ""
                };
                guard::reply_private(
                    ctx,
                    format!(
                        "You are **{}** with role **{}**{note}.",
                        principal.username, principal.role_name
                    ),
                )
                .await
            }
            Err(Error::Unauthenticated) => {
                guard::reply_private(ctx, "Your Discord account is not linked. Use `/account link`.")
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

// Re-export all commands
pub use inner::*;

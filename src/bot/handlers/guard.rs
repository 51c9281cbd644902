//! Permission guard and reply helpers shared by every command.
//!
//! A handler starts with
//!
//! ```ignore
//! let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ORDERS).await? else {
//!     return Ok(());
//! };
//! ```
//!
//! so that an unlinked or unauthorized caller gets an ephemeral explanation and
//! the handler stops before touching the store.

use crate::{
    bot::BotData,
    core::{activity, auth, auth::Principal},
    errors::{Error, Result},
};
use tracing::warn;

/// Sends an ephemeral reply visible only to the caller.
pub async fn reply_private(ctx: poise::Context<'_, BotData, Error>, content: impl Into<String>) -> Result<()> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Resolves the caller and checks `permission`.
///
/// Returns `Ok(None)` after replying when the caller has not linked an admin
/// account or lacks the permission. Store failures propagate.
pub async fn require_permission(
    ctx: poise::Context<'_, BotData, Error>,
    permission: &str,
) -> Result<Option<Principal>> {
    let db = &ctx.data().database;
    let discord_id = ctx.author().id.to_string();

    match auth::require(db, &discord_id, permission).await {
        Ok(principal) => Ok(Some(principal)),
        Err(Error::Unauthenticated) => {
            reply_private(
                ctx,
                "🔒 Your Discord account is not linked to an admin account. Use `/account link` first.",
            )
            .await?;
            Ok(None)
        }
        Err(Error::Forbidden { permission }) => {
            reply_private(
                ctx,
                format!("⛔ You need the `{permission}` permission to do that."),
            )
            .await?;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Replies with the message of a user-facing error, or propagates anything else.
///
/// Validation, not-found and authorization errors are the caller's to fix and
/// are shown to them; every other error goes to the framework error handler.
pub async fn report_failure(ctx: poise::Context<'_, BotData, Error>, error: Error) -> Result<()> {
    if error.is_validation() || error.is_not_found() || error.is_authorization() {
        reply_private(ctx, format!("❌ {error}")).await
    } else {
        Err(error)
    }
}

/// Appends an activity log entry for a completed action.
///
/// A failed write is logged and does not fail the command, whose change has
/// already been committed.
pub async fn log_activity(
    ctx: poise::Context<'_, BotData, Error>,
    principal: &Principal,
    action: impl Into<String>,
) {
    if let Err(e) = activity::record(&ctx.data().database, principal.admin_id, action).await {
        warn!(
            "Failed to record activity for admin '{}': {}",
            principal.username, e
        );
    }
}

const DISCORD_MESSAGE_LIMIT: usize = 1900;

/// Joins `lines` under `header`, cutting off before Discord's message limit.
#[must_use]
pub fn format_list(header: &str, lines: &[String], empty: &str) -> String {
    if lines.is_empty() {
        return format!("{header}\n{empty}");
    }
    let mut out = String::from(header);
    for (shown, line) in lines.iter().enumerate() {
        if out.len() + line.len() + 1 > DISCORD_MESSAGE_LIMIT {
            out.push_str(&format!("\n…and {} more", lines.len() - shown));
            break;
        }
        out.push('\n');
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_list_handles_empty_and_overflow() {
        assert_eq!(format_list("**Items**", &[], "(none)"), "**Items**\n(none)");

        let lines: Vec<String> = (0..500).map(|i| format!("• item number {i}")).collect();
        let out = format_list("**Items**", &lines, "(none)");
        assert!(out.len() < 2000);
        assert!(out.contains("more"));
        assert!(out.starts_with("**Items**\n• item number 0"));
    }
}

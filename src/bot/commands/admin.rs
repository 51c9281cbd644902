//! Administration Discord commands - `role`, `admin` and `activity`.
//!
//! Roles bundle permissions, admin accounts hold one role each, and every
//! completed action lands in the activity log shown by `/activity`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{autocomplete, guard},
        },
        core::{
            access::{self, AdminSummary, NewAdminUser, RoleSummary},
            activity,
            auth::permissions,
        },
        errors::{Error, Result},
    };
    use sea_orm::DatabaseConnection;

    const ACTIVITY_DEFAULT_LIMIT: u64 = 20;
    const ACTIVITY_MAX_LIMIT: u64 = 100;

    async fn role_by_name(db: &DatabaseConnection, name: &str) -> Result<RoleSummary> {
        access::list_roles_with_permissions(db)
            .await?
            .into_iter()
            .find(|r| r.role.name == name.trim())
            .ok_or_else(|| Error::not_found("Role", name.trim()))
    }

    async fn admin_by_username(db: &DatabaseConnection, username: &str) -> Result<AdminSummary> {
        access::list_admin_users(db)
            .await?
            .into_iter()
            .find(|a| a.admin.username == username.trim())
            .ok_or_else(|| Error::not_found("Admin user", username.trim()))
    }

    /// Parent command for roles.
    #[poise::command(
        slash_command,
        subcommands(
            "role_create",
            "role_list",
            "role_grant",
            "role_revoke",
            "role_delete"
        )
    )]
    pub async fn role(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Role management command. Available subcommands:\n\
            `/role create` - Create a role without permissions\n\
            `/role list` - List roles and their permissions\n\
            `/role grant` - Give a role a permission\n\
            `/role revoke` - Take a permission from a role\n\
            `/role delete` - Delete a role nobody holds";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates a role with no permissions.
    #[poise::command(slash_command, rename = "create")]
    pub async fn role_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role name (e.g., 'Warehouse Staff')"] name: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ROLES).await?
        else {
            return Ok(());
        };

        match access::create_role(&ctx.data().database, &name).await {
            Ok(role) => {
                guard::log_activity(ctx, &principal, format!("Created role '{}'", role.name))
                    .await;
                ctx.say(format!("✅ Role **{}** created.", role.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists roles and their permissions.
    #[poise::command(slash_command, rename = "list")]
    pub async fn role_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_ROLES)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = access::list_roles_with_permissions(&ctx.data().database)
            .await?
            .iter()
            .map(|summary| {
                let granted = if summary.role.is_superadmin {
                    "all permissions".to_string()
                } else if summary.permissions.is_empty() {
                    "no permissions".to_string()
                } else {
                    summary.permissions.join(", ")
                };
                format!("• **{}**: {granted}", summary.role.name)
            })
            .collect();
        ctx.say(guard::format_list("**Roles**", &lines, "No roles defined."))
            .await?;
        Ok(())
    }

    /// Grants a permission to a role.
    #[poise::command(slash_command, rename = "grant")]
    pub async fn role_grant(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role"]
        #[autocomplete = "autocomplete::autocomplete_role_name"]
        role: String,
        #[description = "Permission"]
        #[autocomplete = "autocomplete::autocomplete_permission"]
        permission: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ROLES).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let summary = role_by_name(db, &role).await?;
            access::grant_permission(db, summary.role.id, permission.trim()).await
        }
        .await;

        match result {
            Ok(()) => {
                let action = format!("Granted '{}' to role '{}'", permission.trim(), role.trim());
                guard::log_activity(ctx, &principal, action.clone()).await;
                ctx.say(format!("✅ {action}.")).await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Revokes a permission from a role.
    #[poise::command(slash_command, rename = "revoke")]
    pub async fn role_revoke(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role"]
        #[autocomplete = "autocomplete::autocomplete_role_name"]
        role: String,
        #[description = "Permission"]
        #[autocomplete = "autocomplete::autocomplete_permission"]
        permission: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ROLES).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let summary = role_by_name(db, &role).await?;
            access::revoke_permission(db, summary.role.id, permission.trim()).await
        }
        .await;

        match result {
            Ok(()) => {
                let action = format!("Revoked '{}' from role '{}'", permission.trim(), role.trim());
                guard::log_activity(ctx, &principal, action.clone()).await;
                ctx.say(format!("✅ {action}.")).await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes a role that no admin holds.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn role_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role"]
        #[autocomplete = "autocomplete::autocomplete_role_name"]
        role: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_ROLES).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let summary = role_by_name(db, &role).await?;
            access::delete_role(db, summary.role.id).await
        }
        .await;

        match result {
            Ok(deleted) => {
                guard::log_activity(ctx, &principal, format!("Deleted role '{}'", deleted.name))
                    .await;
                ctx.say(format!("🗑️ Role **{}** deleted.", deleted.name))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Parent command for admin accounts.
    #[poise::command(
        slash_command,
        subcommands("admin_create", "admin_list", "admin_set_role", "admin_delete")
    )]
    pub async fn admin(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Admin account command. Available subcommands:\n\
            `/admin create` - Create an admin account\n\
            `/admin list` - List admin accounts\n\
            `/admin set_role` - Change an admin's role\n\
            `/admin delete` - Delete an admin account";
        ctx.say(help_text).await?;
        Ok(())
    }

    /// Creates an admin account. The reply is only visible to you.
    #[poise::command(slash_command, rename = "create", ephemeral)]
    pub async fn admin_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Login name"] username: String,
        #[description = "Contact email"] email: String,
        #[description = "Initial password"] password: String,
        #[description = "Role"]
        #[autocomplete = "autocomplete::autocomplete_role_name"]
        role: String,
        #[description = "Discord user to link right away"] discord_user: Option<
            poise::serenity_prelude::User,
        >,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_USERS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let summary = role_by_name(db, &role).await?;
            let new = NewAdminUser {
                username,
                email,
                password,
                role_id: summary.role.id,
                discord_id: discord_user.map(|user| user.id.to_string()),
            };
            let created = access::create_admin_user(db, new).await?;
            Ok::<_, Error>((created, summary.role.name))
        }
        .await;

        match result {
            Ok((created, role_name)) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Created admin '{}' with role '{role_name}'", created.username),
                )
                .await;
                guard::reply_private(
                    ctx,
                    format!("✅ Admin **{}** created with role **{role_name}**.", created.username),
                )
                .await
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Lists admin accounts with their roles.
    #[poise::command(slash_command, rename = "list")]
    pub async fn admin_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if guard::require_permission(ctx, permissions::MANAGE_USERS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let lines: Vec<String> = access::list_admin_users(&ctx.data().database)
            .await?
            .iter()
            .map(|a| {
                let linked = a
                    .admin
                    .discord_id
                    .as_deref()
                    .map_or_else(|| "not linked".to_string(), |id| format!("<@{id}>"));
                format!(
                    "• **{}** <{}> [{}] {linked}",
                    a.admin.username, a.admin.email, a.role_name
                )
            })
            .collect();
        ctx.say(guard::format_list("**Admins**", &lines, "No admin accounts."))
            .await?;
        Ok(())
    }

    /// Moves an admin to another role.
    #[poise::command(slash_command, rename = "set_role")]
    pub async fn admin_set_role(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Admin username"] username: String,
        #[description = "New role"]
        #[autocomplete = "autocomplete::autocomplete_role_name"]
        role: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_USERS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let target = admin_by_username(db, &username).await?;
            let summary = role_by_name(db, &role).await?;
            let updated = access::change_admin_role(db, target.admin.id, summary.role.id).await?;
            Ok::<_, Error>((updated, summary.role.name))
        }
        .await;

        match result {
            Ok((updated, role_name)) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Moved admin '{}' to role '{role_name}'", updated.username),
                )
                .await;
                ctx.say(format!(
                    "✅ **{}** now has role **{role_name}**.",
                    updated.username
                ))
                .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Deletes an admin account and its activity history.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn admin_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Admin username"] username: String,
    ) -> Result<()> {
        let Some(principal) = guard::require_permission(ctx, permissions::MANAGE_USERS).await?
        else {
            return Ok(());
        };
        let db = &ctx.data().database;

        let result = async {
            let target = admin_by_username(db, &username).await?;
            access::delete_admin_user(db, target.admin.id).await
        }
        .await;

        match result {
            Ok(deleted) => {
                guard::log_activity(
                    ctx,
                    &principal,
                    format!("Deleted admin '{}'", deleted.username),
                )
                .await;
                ctx.say(format!("🗑️ Admin **{}** deleted.", deleted.username))
                    .await?;
                Ok(())
            }
            Err(e) => guard::report_failure(ctx, e).await,
        }
    }

    /// Shows the most recent admin actions.
    #[poise::command(slash_command)]
    pub async fn activity(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "How many entries to show (default 20, max 100)"] limit: Option<u64>,
    ) -> Result<()> {
        if guard::require_permission(ctx, permissions::VIEW_ACTIVITY_LOGS)
            .await?
            .is_none()
        {
            return Ok(());
        }

        let limit = limit
            .unwrap_or(ACTIVITY_DEFAULT_LIMIT)
            .clamp(1, ACTIVITY_MAX_LIMIT);
        let lines: Vec<String> = activity::recent(&ctx.data().database, limit)
            .await?
            .iter()
            .map(|entry| {
                format!(
                    "• {} **{}**: {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    if entry.username.is_empty() {
                        "(deleted)"
                    } else {
                        entry.username.as_str()
                    },
                    entry.action
                )
            })
            .collect();
        ctx.say(guard::format_list("**Recent activity**", &lines, "No activity yet."))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

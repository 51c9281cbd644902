//! Role, permission and admin account management.
//!
//! The store always keeps at least one role flagged `is_superadmin` and, once
//! any admin exists, at least one admin holding such a role. Operations that
//! would break either rule fail with [`Error::LastSuperAdmin`].

use crate::{
    config::admins::BootstrapAdmin,
    core::auth::{hash_password, permissions},
    entities::{
        ActivityLog, AdminUser, Permission, Role, RolePermission, activity_log, admin_user,
        permission, role, role_permission,
    },
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Name of the seeded all-permissions role.
pub const SUPERADMIN_ROLE: &str = "SuperAdmin";
/// Name of the seeded day-to-day role.
pub const ADMIN_ROLE: &str = "Admin";

/// A role with the names of its permissions.
#[derive(Debug, Clone)]
pub struct RoleSummary {
    /// The role
    pub role: role::Model,
    /// Permission names, sorted
    pub permissions: Vec<String>,
}

/// An admin account with its role name.
#[derive(Debug, Clone)]
pub struct AdminSummary {
    /// The account
    pub admin: admin_user::Model,
    /// Name of the account's role
    pub role_name: String,
}

/// Input for [`create_admin_user`].
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    /// Login name, unique
    pub username: String,
    /// Contact email, unique
    pub email: String,
    /// Plain-text password; only its hash is stored
    pub password: String,
    /// Role to assign
    pub role_id: i64,
    /// Discord account to link right away
    pub discord_id: Option<String>,
}

async fn find_role_by_name<C>(db: &C, name: &str) -> Result<Option<role::Model>>
where
    C: ConnectionTrait,
{
    Role::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn find_permission<C>(db: &C, name: &str) -> Result<Option<permission::Model>>
where
    C: ConnectionTrait,
{
    Permission::find()
        .filter(permission::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn link_permission<C>(db: &C, role_id: i64, permission_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let existing = RolePermission::find_by_id((role_id, permission_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }
    role_permission::ActiveModel {
        role_id: Set(role_id),
        permission_id: Set(permission_id),
    }
    .insert(db)
    .await?;
    Ok(true)
}

async fn get_role<C>(db: &C, role_id: i64) -> Result<role::Model>
where
    C: ConnectionTrait,
{
    Role::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Role", role_id))
}

async fn get_admin<C>(db: &C, admin_id: i64) -> Result<admin_user::Model>
where
    C: ConnectionTrait,
{
    AdminUser::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Admin user", admin_id))
}

/// Number of admins whose role is flagged `is_superadmin`.
pub async fn count_superadmin_holders<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    AdminUser::find()
        .inner_join(Role)
        .filter(role::Column::IsSuperadmin.eq(true))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Creates the permission catalog and the `SuperAdmin` and `Admin` roles.
///
/// Safe to run on every start: existing rows are left alone and missing links
/// are added.
#[instrument(skip(db))]
pub async fn seed_access_control(db: &DatabaseConnection) -> Result<()> {
    let txn = db.begin().await?;

    let mut permission_ids = HashMap::new();
    for name in permissions::ALL {
        let permission = match find_permission(&txn, name).await? {
            Some(existing) => existing,
            None => {
                permission::ActiveModel {
                    name: Set(name.to_string()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };
        permission_ids.insert(name, permission.id);
    }

    if find_role_by_name(&txn, SUPERADMIN_ROLE).await?.is_none() {
        role::ActiveModel {
            name: Set(SUPERADMIN_ROLE.to_string()),
            is_superadmin: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        info!("Seeded role '{SUPERADMIN_ROLE}'");
    }

    let admin_role = match find_role_by_name(&txn, ADMIN_ROLE).await? {
        Some(existing) => existing,
        None => {
            info!("Seeded role '{ADMIN_ROLE}'");
            role::ActiveModel {
                name: Set(ADMIN_ROLE.to_string()),
                is_superadmin: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };
    for (name, permission_id) in &permission_ids {
        if *name != permissions::MANAGE_ROLES {
            link_permission(&txn, admin_role.id, *permission_id).await?;
        }
    }

    txn.commit().await?;
    Ok(())
}

/// Creates a role without permissions.
#[instrument(skip(db))]
pub async fn create_role(db: &DatabaseConnection, name: &str) -> Result<role::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Role name cannot be empty"));
    }
    if find_role_by_name(db, name).await?.is_some() {
        return Err(Error::validation(format!("Role '{name}' already exists")));
    }
    let role = role::ActiveModel {
        name: Set(name.to_string()),
        is_superadmin: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created role '{}' (ID: {})", role.name, role.id);
    Ok(role)
}

/// Grants a permission to a role. Granting twice is a no-op.
#[instrument(skip(db))]
pub async fn grant_permission(db: &DatabaseConnection, role_id: i64, permission_name: &str) -> Result<()> {
    let role = get_role(db, role_id).await?;
    let permission = find_permission(db, permission_name)
        .await?
        .ok_or_else(|| Error::not_found("Permission", permission_name))?;
    if link_permission(db, role.id, permission.id).await? {
        info!("Granted '{}' to role '{}'", permission.name, role.name);
    }
    Ok(())
}

/// Revokes a permission from a role. Revoking a permission the role lacks is a no-op.
#[instrument(skip(db))]
pub async fn revoke_permission(db: &DatabaseConnection, role_id: i64, permission_name: &str) -> Result<()> {
    let role = get_role(db, role_id).await?;
    let permission = find_permission(db, permission_name)
        .await?
        .ok_or_else(|| Error::not_found("Permission", permission_name))?;
    let result = RolePermission::delete_by_id((role.id, permission.id))
        .exec(db)
        .await?;
    if result.rows_affected > 0 {
        info!("Revoked '{}' from role '{}'", permission.name, role.name);
    }
    Ok(())
}

/// Lists roles alphabetically with their permission names.
pub async fn list_roles_with_permissions(db: &DatabaseConnection) -> Result<Vec<RoleSummary>> {
    let roles = Role::find()
        .order_by_asc(role::Column::Name)
        .find_with_related(Permission)
        .all(db)
        .await?;
    let mut summaries: Vec<RoleSummary> = roles
        .into_iter()
        .map(|(role, permissions)| {
            let mut permissions: Vec<String> = permissions.into_iter().map(|p| p.name).collect();
            permissions.sort();
            RoleSummary { role, permissions }
        })
        .collect();
    summaries.sort_by(|a, b| a.role.name.cmp(&b.role.name));
    Ok(summaries)
}

/// Deletes a role that no admin holds.
///
/// # Errors
/// `Validation` while admins hold the role; `LastSuperAdmin` when it is the only
/// superadmin role.
#[instrument(skip(db))]
pub async fn delete_role(db: &DatabaseConnection, role_id: i64) -> Result<role::Model> {
    let txn = db.begin().await?;
    let role = get_role(&txn, role_id).await?;

    let holders = AdminUser::find()
        .filter(admin_user::Column::RoleId.eq(role_id))
        .count(&txn)
        .await?;
    if holders > 0 {
        return Err(Error::validation(format!(
            "Role '{}' is still assigned to {holders} admin users",
            role.name
        )));
    }
    if role.is_superadmin {
        let superadmin_roles = Role::find()
            .filter(role::Column::IsSuperadmin.eq(true))
            .count(&txn)
            .await?;
        if superadmin_roles <= 1 {
            return Err(Error::LastSuperAdmin);
        }
    }

    RolePermission::delete_many()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .exec(&txn)
        .await?;
    Role::delete_by_id(role_id).exec(&txn).await?;
    txn.commit().await?;

    info!("Deleted role '{}' (ID: {})", role.name, role.id);
    Ok(role)
}

/// Creates an admin account with a hashed password.
#[instrument(skip(db, new), fields(username = %new.username))]
pub async fn create_admin_user(db: &DatabaseConnection, new: NewAdminUser) -> Result<admin_user::Model> {
    let username = new.username.trim();
    let email = new.email.trim().to_lowercase();
    if username.is_empty() {
        return Err(Error::validation("Username cannot be empty"));
    }
    if !email.contains('@') {
        return Err(Error::validation(format!("'{email}' is not a valid email address")));
    }
    if new.password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }
    let role = get_role(db, new.role_id).await?;

    let clash = AdminUser::find()
        .filter(
            admin_user::Column::Username
                .eq(username)
                .or(admin_user::Column::Email.eq(email.as_str())),
        )
        .one(db)
        .await?;
    if clash.is_some() {
        return Err(Error::validation(
            "An admin with this username or email already exists",
        ));
    }

    let discord_id = new
        .discord_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    if let Some(discord_id) = discord_id.as_deref() {
        let holder = AdminUser::find()
            .filter(admin_user::Column::DiscordId.eq(discord_id))
            .one(db)
            .await?;
        if let Some(holder) = holder {
            return Err(Error::validation(format!(
                "Discord account is already linked to admin '{}'",
                holder.username
            )));
        }
    }

    let admin = admin_user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(hash_password(&new.password)?),
        role_id: Set(role.id),
        discord_id: Set(discord_id),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(
        "Created admin '{}' (ID: {}) with role '{}'",
        admin.username, admin.id, role.name
    );
    Ok(admin)
}

/// Lists admin accounts alphabetically with their role names.
pub async fn list_admin_users(db: &DatabaseConnection) -> Result<Vec<AdminSummary>> {
    let rows = AdminUser::find()
        .order_by_asc(admin_user::Column::Username)
        .find_also_related(Role)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(admin, role)| AdminSummary {
            admin,
            role_name: role.map(|r| r.name).unwrap_or_default(),
        })
        .collect())
}

/// Assigns another role to an admin.
///
/// # Errors
/// `LastSuperAdmin` when this would demote the only superadmin holder.
#[instrument(skip(db))]
pub async fn change_admin_role(
    db: &DatabaseConnection,
    admin_id: i64,
    role_id: i64,
) -> Result<admin_user::Model> {
    let txn = db.begin().await?;
    let admin = get_admin(&txn, admin_id).await?;
    let current = get_role(&txn, admin.role_id).await?;
    let next = get_role(&txn, role_id).await?;

    if current.is_superadmin && !next.is_superadmin && count_superadmin_holders(&txn).await? <= 1 {
        return Err(Error::LastSuperAdmin);
    }

    let mut active: admin_user::ActiveModel = admin.into();
    active.role_id = Set(next.id);
    let admin = active.update(&txn).await?;
    txn.commit().await?;

    info!(
        "Admin '{}' moved from role '{}' to '{}'",
        admin.username, current.name, next.name
    );
    Ok(admin)
}

/// Deletes an admin account and its activity entries.
///
/// # Errors
/// `LastSuperAdmin` when the account is the only superadmin holder.
#[instrument(skip(db))]
pub async fn delete_admin_user(db: &DatabaseConnection, admin_id: i64) -> Result<admin_user::Model> {
    let txn = db.begin().await?;
    let admin = get_admin(&txn, admin_id).await?;
    let role = get_role(&txn, admin.role_id).await?;

    if role.is_superadmin && count_superadmin_holders(&txn).await? <= 1 {
        return Err(Error::LastSuperAdmin);
    }

    ActivityLog::delete_many()
        .filter(activity_log::Column::AdminUserId.eq(admin_id))
        .exec(&txn)
        .await?;
    AdminUser::delete_by_id(admin_id).exec(&txn).await?;
    txn.commit().await?;

    info!("Deleted admin '{}' (ID: {})", admin.username, admin.id);
    Ok(admin)
}

/// Creates the first SuperAdmin account when the store has no admins yet.
///
/// Returns the new account, or `None` when admins already exist.
#[instrument(skip(db, bootstrap), fields(username = %bootstrap.username))]
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    bootstrap: &BootstrapAdmin,
) -> Result<Option<admin_user::Model>> {
    if AdminUser::find().count(db).await? > 0 {
        return Ok(None);
    }
    let superadmin = find_role_by_name(db, SUPERADMIN_ROLE)
        .await?
        .ok_or_else(|| Error::not_found("Role", SUPERADMIN_ROLE))?;

    let admin = create_admin_user(
        db,
        NewAdminUser {
            username: bootstrap.username.clone(),
            email: bootstrap.email.clone(),
            password: bootstrap.password.clone(),
            role_id: superadmin.id,
            discord_id: bootstrap.discord_id.clone(),
        },
    )
    .await?;
    info!("Bootstrapped SuperAdmin '{}'", admin.username);
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        seed_access_control(&db).await?;

        assert_eq!(
            Permission::find().count(&db).await?,
            permissions::ALL.len() as u64
        );
        let roles = list_roles_with_permissions(&db).await?;
        assert_eq!(roles.len(), 2);

        let admin = roles.iter().find(|r| r.role.name == ADMIN_ROLE).unwrap();
        assert_eq!(admin.permissions.len(), permissions::ALL.len() - 1);
        assert!(!admin.permissions.iter().any(|p| p == permissions::MANAGE_ROLES));

        let superadmin = roles.iter().find(|r| r.role.name == SUPERADMIN_ROLE).unwrap();
        assert!(superadmin.role.is_superadmin);
        Ok(())
    }

    #[tokio::test]
    async fn test_grant_and_revoke() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let role = create_role(&db, "Warehouse").await?;

        grant_permission(&db, role.id, permissions::MANAGE_INVENTORY).await?;
        grant_permission(&db, role.id, permissions::MANAGE_INVENTORY).await?;
        assert!(crate::core::auth::role_has_permission(&db, role.id, "manage_inventory").await?);

        revoke_permission(&db, role.id, permissions::MANAGE_INVENTORY).await?;
        assert!(!crate::core::auth::role_has_permission(&db, role.id, "manage_inventory").await?);

        let unknown = grant_permission(&db, role.id, "launch_rockets").await;
        assert!(matches!(unknown, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_last_superadmin_cannot_be_removed_or_demoted() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let root = create_test_admin(&db, "root", SUPERADMIN_ROLE, None).await?;
        let admin_role = find_role_by_name(&db, ADMIN_ROLE).await?.unwrap();

        let result = delete_admin_user(&db, root.id).await;
        assert!(matches!(result, Err(Error::LastSuperAdmin)));
        let result = change_admin_role(&db, root.id, admin_role.id).await;
        assert!(matches!(result, Err(Error::LastSuperAdmin)));

        let second = create_test_admin(&db, "root2", SUPERADMIN_ROLE, None).await?;
        let demoted = change_admin_role(&db, root.id, admin_role.id).await?;
        assert_eq!(demoted.role_id, admin_role.id);

        let result = delete_admin_user(&db, second.id).await;
        assert!(matches!(result, Err(Error::LastSuperAdmin)));
        assert_eq!(count_superadmin_holders(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_role_rules() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let superadmin = find_role_by_name(&db, SUPERADMIN_ROLE).await?.unwrap();
        let result = delete_role(&db, superadmin.id).await;
        assert!(matches!(result, Err(Error::LastSuperAdmin)));

        let temp = create_role(&db, "Temp").await?;
        grant_permission(&db, temp.id, permissions::MANAGE_ORDERS).await?;
        let holder = create_test_admin(&db, "temp", "Temp", None).await?;
        let result = delete_role(&db, temp.id).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        delete_admin_user(&db, holder.id).await?;
        delete_role(&db, temp.id).await?;
        assert_eq!(RolePermission::find().filter(role_permission::Column::RoleId.eq(temp.id)).count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_admin_user_validation() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let role = find_role_by_name(&db, ADMIN_ROLE).await?.unwrap();
        let new = |username: &str, email: &str| NewAdminUser {
            username: username.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role_id: role.id,
            discord_id: None,
        };

        let created = create_admin_user(&db, new("carol", "carol@example.com")).await?;
        assert_ne!(created.password_hash, TEST_PASSWORD);

        let result = create_admin_user(&db, new("carol", "other@example.com")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        let result = create_admin_user(&db, new("dave", "no-at-sign")).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let listed = list_admin_users(&db).await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].role_name, ADMIN_ROLE);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_admin_user_rejects_linked_discord_id() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let role = find_role_by_name(&db, ADMIN_ROLE).await?.unwrap();
        let new = |username: &str, discord_id: &str| NewAdminUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: TEST_PASSWORD.to_string(),
            role_id: role.id,
            discord_id: Some(discord_id.to_string()),
        };

        create_admin_user(&db, new("erin", "42")).await?;
        let err = create_admin_user(&db, new("frank", " 42 ")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("erin"));

        let listed = list_admin_users(&db).await?;
        assert_eq!(listed.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() -> Result<()> {
        let db = setup_test_db().await?;
        seed_access_control(&db).await?;
        let bootstrap = BootstrapAdmin {
            username: "owner".to_string(),
            email: "owner@example.com".to_string(),
            password: "s3cret-pass".to_string(),
            discord_id: Some("777".to_string()),
        };

        let created = ensure_bootstrap_admin(&db, &bootstrap).await?.unwrap();
        assert_eq!(created.discord_id.as_deref(), Some("777"));
        let principal = crate::core::auth::resolve_principal(&db, "777").await?;
        assert!(principal.is_superadmin);

        assert!(ensure_bootstrap_admin(&db, &bootstrap).await?.is_none());
        Ok(())
    }
}

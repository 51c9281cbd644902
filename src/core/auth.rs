//! Authentication and permission checks for the admin console.
//!
//! An admin is identified by the Discord account linked to their
//! [`AdminUser`](crate::entities::AdminUser) row. Every console command first
//! calls [`require`], which resolves the caller to a [`Principal`] and checks a
//! single named permission. Roles flagged `is_superadmin` pass every check.

use crate::{
    entities::{AdminUser, Permission, Role, RolePermission, admin_user, permission, role, role_permission},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument, warn};

/// Names of the permissions a role can hold.
pub mod permissions {
    /// Create, edit and delete catalog entries, including bulk import
    pub const MANAGE_PRODUCTS: &str = "manage_products";
    /// Adjust stock and manage warehouses
    pub const MANAGE_INVENTORY: &str = "manage_inventory";
    /// Place orders and change their status
    pub const MANAGE_ORDERS: &str = "manage_orders";
    /// Raise and review returns
    pub const MANAGE_RETURNS: &str = "manage_returns";
    /// Create and edit promotions
    pub const MANAGE_PROMOTIONS: &str = "manage_promotions";
    /// Create and edit customers
    pub const MANAGE_CUSTOMERS: &str = "manage_customers";
    /// Read the activity log
    pub const VIEW_ACTIVITY_LOGS: &str = "view_activity_logs";
    /// Create roles and change their permissions
    pub const MANAGE_ROLES: &str = "manage_roles";
    /// Create, re-role and delete admin accounts
    pub const MANAGE_USERS: &str = "manage_users";

    /// Every permission known to the console.
    pub const ALL: [&str; 9] = [
        MANAGE_PRODUCTS,
        MANAGE_INVENTORY,
        MANAGE_ORDERS,
        MANAGE_RETURNS,
        MANAGE_PROMOTIONS,
        MANAGE_CUSTOMERS,
        VIEW_ACTIVITY_LOGS,
        MANAGE_ROLES,
        MANAGE_USERS,
    ];
}

/// An authenticated admin and the role they act under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Admin user id
    pub admin_id: i64,
    /// Admin username
    pub username: String,
    /// Role id
    pub role_id: i64,
    /// Role name
    pub role_name: String,
    /// Whether the role passes every permission check
    pub is_superadmin: bool,
}

impl Principal {
    fn from_models(admin: &admin_user::Model, role: &role::Model) -> Self {
        Self {
            admin_id: admin.id,
            username: admin.username.clone(),
            role_id: role.id,
            role_name: role.name.clone(),
            is_superadmin: role.is_superadmin,
        }
    }
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a stored PHC string.
///
/// A malformed stored hash is an error; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| Error::PasswordHash {
        message: e.to_string(),
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn principal_for<C>(db: &C, admin: &admin_user::Model) -> Result<Principal>
where
    C: ConnectionTrait,
{
    let role = Role::find_by_id(admin.role_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Role", admin.role_id))?;
    Ok(Principal::from_models(admin, &role))
}

/// Resolves the admin linked to a Discord user.
///
/// # Errors
/// `Unauthenticated` when no admin is linked to `discord_id`.
pub async fn resolve_principal(db: &DatabaseConnection, discord_id: &str) -> Result<Principal> {
    let admin = AdminUser::find()
        .filter(admin_user::Column::DiscordId.eq(discord_id))
        .one(db)
        .await?
        .ok_or(Error::Unauthenticated)?;
    principal_for(db, &admin).await
}

/// Verifies a username and password.
///
/// # Errors
/// `Unauthenticated` for an unknown username or a wrong password alike.
#[instrument(skip(db, password))]
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<admin_user::Model> {
    let Some(admin) = AdminUser::find()
        .filter(admin_user::Column::Username.eq(username.trim()))
        .one(db)
        .await?
    else {
        warn!("Login attempt for unknown admin");
        return Err(Error::Unauthenticated);
    };

    if verify_password(password, &admin.password_hash)? {
        Ok(admin)
    } else {
        warn!("Wrong password for admin '{}'", admin.username);
        Err(Error::Unauthenticated)
    }
}

/// Links a Discord account to an admin after checking their credentials.
///
/// The Discord id is moved off any other admin it was linked to.
#[instrument(skip(db, password))]
pub async fn link_discord_account(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    discord_id: &str,
) -> Result<Principal> {
    let admin = authenticate(db, username, password).await?;

    let txn = db.begin().await?;
    move_discord_link(&txn, admin.id, discord_id).await?;
    let admin = AdminUser::find_by_id(admin.id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Admin user", admin.id))?;
    let principal = principal_for(&txn, &admin).await?;
    txn.commit().await?;

    info!("Linked Discord account to admin '{}'", admin.username);
    Ok(principal)
}

/// Clears `discord_id` from every other admin and sets it on `admin_id`.
///
/// Run inside a transaction; a failed link must leave the previous holder linked.
async fn move_discord_link<C>(db: &C, admin_id: i64, discord_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    AdminUser::update_many()
        .col_expr(admin_user::Column::DiscordId, Expr::value(Option::<String>::None))
        .filter(admin_user::Column::DiscordId.eq(discord_id))
        .filter(admin_user::Column::Id.ne(admin_id))
        .exec(db)
        .await?;

    let linked = AdminUser::update_many()
        .col_expr(admin_user::Column::DiscordId, Expr::value(discord_id))
        .filter(admin_user::Column::Id.eq(admin_id))
        .exec(db)
        .await?;
    if linked.rows_affected == 0 {
        return Err(Error::not_found("Admin user", admin_id));
    }
    Ok(())
}

/// Whether a role holds a permission by name, ignoring the superadmin flag.
pub async fn role_has_permission<C>(db: &C, role_id: i64, permission_name: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = RolePermission::find()
        .inner_join(Permission)
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(permission::Column::Name.eq(permission_name))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Checks that a principal may use a permission.
///
/// # Errors
/// `Forbidden` naming the permission when the role lacks it.
pub async fn authorize(db: &DatabaseConnection, principal: &Principal, permission: &str) -> Result<()> {
    if principal.is_superadmin || role_has_permission(db, principal.role_id, permission).await? {
        debug!("'{}' granted '{}'", principal.username, permission);
        return Ok(());
    }
    warn!(
        "'{}' (role '{}') denied '{}'",
        principal.username, principal.role_name, permission
    );
    Err(Error::Forbidden {
        permission: permission.to_string(),
    })
}

/// Resolves the caller and checks one permission.
pub async fn require(db: &DatabaseConnection, discord_id: &str, permission: &str) -> Result<Principal> {
    let principal = resolve_principal(db, discord_id).await?;
    authorize(db, &principal, permission).await?;
    Ok(principal)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::access;
    use crate::test_utils::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
        assert!(verify_password("x", "not a hash").is_err());
    }

    #[test]
    fn test_permission_catalog_is_unique() {
        let mut names = permissions::ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), permissions::ALL.len());
    }

    #[tokio::test]
    async fn test_authorize_by_role_permissions() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;
        let clerk_role = access::create_role(&db, "Clerk").await?;
        access::grant_permission(&db, clerk_role.id, permissions::MANAGE_INVENTORY).await?;
        create_test_admin(&db, "clerk", "Clerk", Some("111")).await?;

        let clerk = resolve_principal(&db, "111").await?;
        assert!(!clerk.is_superadmin);
        authorize(&db, &clerk, permissions::MANAGE_INVENTORY).await?;

        let denied = authorize(&db, &clerk, permissions::MANAGE_ROLES).await;
        assert!(matches!(
            denied,
            Err(Error::Forbidden { ref permission }) if permission == "manage_roles"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_superadmin_passes_every_check() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;
        create_test_admin(&db, "root", access::SUPERADMIN_ROLE, Some("1")).await?;

        for permission in permissions::ALL {
            require(&db, "1", permission).await?;
        }
        require(&db, "1", "some_future_permission").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_seeded_admin_role_cannot_manage_roles() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;
        create_test_admin(&db, "manager", access::ADMIN_ROLE, Some("2")).await?;

        require(&db, "2", permissions::MANAGE_USERS).await?;
        let result = require(&db, "2", permissions::MANAGE_ROLES).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_unlinked_discord_user_is_unauthenticated() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;

        let result = require(&db, "404", permissions::MANAGE_ORDERS).await;
        assert!(matches!(result, Err(Error::Unauthenticated)));
        Ok(())
    }

    #[tokio::test]
    async fn test_link_discord_account() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;
        create_test_admin(&db, "alice", access::ADMIN_ROLE, None).await?;
        create_test_admin(&db, "bob", access::ADMIN_ROLE, Some("42")).await?;

        let wrong = link_discord_account(&db, "alice", "wrong", "42").await;
        assert!(matches!(wrong, Err(Error::Unauthenticated)));
        let unknown = link_discord_account(&db, "mallory", TEST_PASSWORD, "42").await;
        assert!(matches!(unknown, Err(Error::Unauthenticated)));

        let principal = link_discord_account(&db, "alice", TEST_PASSWORD, "42").await?;
        assert_eq!(principal.username, "alice");
        assert_eq!(resolve_principal(&db, "42").await?.username, "alice");

        let bob = AdminUser::find()
            .filter(admin_user::Column::Username.eq("bob"))
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(bob.discord_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_link_keeps_previous_holder() -> Result<()> {
        let db = setup_test_db().await?;
        access::seed_access_control(&db).await?;
        let bob = create_test_admin(&db, "bob", access::ADMIN_ROLE, Some("42")).await?;

        let txn = db.begin().await?;
        let result = move_discord_link(&txn, 999, "42").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        drop(txn);

        assert_eq!(resolve_principal(&db, "42").await?.admin_id, bob.id);
        Ok(())
    }
}

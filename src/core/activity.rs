//! Append-only audit trail of admin actions.

use crate::{
    entities::{ActivityLog, AdminUser, activity_log},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::debug;

/// A log entry with the acting admin's username.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    /// Entry id
    pub id: i64,
    /// Username of the admin, empty if the account is gone
    pub username: String,
    /// What was done
    pub action: String,
    /// When it was done
    pub timestamp: DateTime<Utc>,
}

/// Appends an entry for `admin_user_id`.
pub async fn record<C>(db: &C, admin_user_id: i64, action: impl Into<String>) -> Result<activity_log::Model>
where
    C: ConnectionTrait,
{
    let action = action.into();
    if action.trim().is_empty() {
        return Err(Error::validation("Activity action cannot be empty"));
    }
    let entry = activity_log::ActiveModel {
        admin_user_id: Set(admin_user_id),
        action: Set(action),
        timestamp: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!("Activity #{} by admin {}: {}", entry.id, admin_user_id, entry.action);
    Ok(entry)
}

/// The `limit` most recent entries, newest first.
pub async fn recent(db: &DatabaseConnection, limit: u64) -> Result<Vec<ActivityEntry>> {
    let rows = ActivityLog::find()
        .order_by_desc(activity_log::Column::Timestamp)
        .order_by_desc(activity_log::Column::Id)
        .limit(limit)
        .find_also_related(AdminUser)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(entry, admin)| ActivityEntry {
            id: entry.id,
            username: admin.map(|a| a.username).unwrap_or_default(),
            action: entry.action,
            timestamp: entry.timestamp,
        })
        .collect())
}

//! Notification repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist scheduler-produced reminders.
//! - Keep scans idempotent through the dedup unique index.
//!
//! # Invariants
//! - `insert_if_absent` never duplicates a
//!   `(reference_type, reference_uuid, notification_type, scheduled_date)`
//!   tuple, including under concurrent scan invocations.

use super::{
    date_to_db, ensure_migrated, parse_db_date, parse_db_uuid, RepoError, RepoResult,
    TableRequirement,
};
use crate::model::notification::{
    Notification, NotificationId, NotificationPriority, NotificationStatus, NotificationType,
    ReferenceType,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    uuid,
    reference_type,
    reference_uuid,
    notification_type,
    scheduled_date,
    priority,
    status,
    message
FROM notifications";

/// Repository interface for notifications.
pub trait NotificationRepository {
    /// Inserts unless the dedup tuple already exists; returns whether a row
    /// was written.
    fn insert_if_absent(&self, notification: &Notification) -> RepoResult<bool>;
    /// Pending notifications scheduled on or before `date`.
    fn list_due(&self, date: NaiveDate) -> RepoResult<Vec<Notification>>;
    fn mark_sent(&self, id: NotificationId) -> RepoResult<()>;
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Binds to a migrated connection; rejects unmigrated schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(
            conn,
            &[TableRequirement {
                table: "notifications",
                columns: &[
                    "uuid",
                    "reference_type",
                    "reference_uuid",
                    "notification_type",
                    "scheduled_date",
                    "priority",
                    "status",
                    "message",
                ],
            }],
        )?;
        Ok(Self { conn })
    }

    fn transition_status(
        &self,
        id: NotificationId,
        from: &'static str,
        to: &'static str,
    ) -> RepoResult<()> {
        // The status guard keeps concurrent transitions of one row from
        // double-applying.
        let changed = self.conn.execute(
            "UPDATE notifications
             SET
                status = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2
               AND status = ?3;",
            params![to, id.to_string(), from],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "notification",
                id,
            });
        }

        Ok(())
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert_if_absent(&self, notification: &Notification) -> RepoResult<bool> {
        notification.validate()?;

        let changed = self.conn.execute(
            "INSERT INTO notifications (
                uuid,
                reference_type,
                reference_uuid,
                notification_type,
                scheduled_date,
                priority,
                status,
                message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (reference_type, reference_uuid, notification_type, scheduled_date)
                DO NOTHING;",
            params![
                notification.uuid.to_string(),
                notification.reference_type.as_db(),
                notification.reference_uuid.to_string(),
                notification.notification_type.as_db(),
                date_to_db(notification.scheduled_date),
                notification.priority.as_db(),
                notification.status.as_db(),
                notification.message.as_str(),
            ],
        )?;

        Ok(changed == 1)
    }

    fn list_due(&self, date: NaiveDate) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE status = 'pending'
               AND scheduled_date <= ?1
             ORDER BY scheduled_date ASC, priority DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([date_to_db(date)])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn mark_sent(&self, id: NotificationId) -> RepoResult<()> {
        self.transition_status(id, "pending", "sent")
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        self.transition_status(id, "sent", "read")
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let uuid_text: String = row.get("uuid")?;
    let reference_text: String = row.get("reference_uuid")?;
    let scheduled_text: String = row.get("scheduled_date")?;

    let reference_type_text: String = row.get("reference_type")?;
    let reference_type = ReferenceType::parse_db(&reference_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reference type `{reference_type_text}` in notifications.reference_type"
        ))
    })?;

    let type_text: String = row.get("notification_type")?;
    let notification_type = NotificationType::parse_db(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification type `{type_text}` in notifications.notification_type"
        ))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = NotificationPriority::parse_db(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in notifications.priority"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = NotificationStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in notifications.status"
        ))
    })?;

    let notification = Notification {
        uuid: parse_db_uuid(&uuid_text, "notifications", "uuid")?,
        reference_type,
        reference_uuid: parse_db_uuid(&reference_text, "notifications", "reference_uuid")?,
        notification_type,
        scheduled_date: parse_db_date(&scheduled_text, "notifications", "scheduled_date")?,
        priority,
        status,
        message: row.get("message")?,
    };
    notification.validate()?;
    Ok(notification)
}

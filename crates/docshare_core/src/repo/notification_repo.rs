//! Notification repository contracts and SQLite implementation.
//!
//! # Invariants
//! - "Oldest" means smallest `sent_at`, ties broken by smallest `id`.
//! - The per-user cap is enforced by callers through
//!   `delete_oldest_by_user`; the table itself is unbounded.

use crate::model::document::DocumentId;
use crate::model::notification::{Notification, NotificationId};
use crate::model::user::UserId;
use crate::repo::{ensure_changed, int_to_bool, RepoResult};
use rusqlite::{params, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str =
    "SELECT id, user_id, message, document_id, is_read, sent_at FROM notifications";

pub trait NotificationRepository {
    fn create(
        &self,
        user_id: UserId,
        message: &str,
        document_id: Option<DocumentId>,
    ) -> RepoResult<NotificationId>;
    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// Newest first.
    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<Notification>>;
    fn count_by_user(&self, user_id: UserId) -> RepoResult<i64>;
    /// Deletes up to `count` oldest rows for the user; returns rows removed.
    fn delete_oldest_by_user(&self, user_id: UserId, count: i64) -> RepoResult<usize>;
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
}

pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create(
        &self,
        user_id: UserId,
        message: &str,
        document_id: Option<DocumentId>,
    ) -> RepoResult<NotificationId> {
        self.conn.execute(
            "INSERT INTO notifications (user_id, message, document_id) VALUES (?1, ?2, ?3);",
            params![user_id, message, document_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_notification_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_by_user(&self, user_id: UserId) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL} WHERE user_id = ?1 ORDER BY sent_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn count_by_user(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?)
    }

    fn delete_oldest_by_user(&self, user_id: UserId, count: i64) -> RepoResult<usize> {
        if count <= 0 {
            return Ok(0);
        }
        Ok(self.conn.execute(
            "DELETE FROM notifications
             WHERE id IN (
                SELECT id FROM notifications
                WHERE user_id = ?1
                ORDER BY sent_at ASC, id ASC
                LIMIT ?2
             );",
            params![user_id, count],
        )?)
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE notifications SET is_read = 1 WHERE id = ?1;", [id])?;
        ensure_changed(changed, "notification", id)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        document_id: row.get(3)?,
        is_read: int_to_bool(row.get(4)?, "notifications.is_read")?,
        sent_at: row.get(5)?,
    })
}

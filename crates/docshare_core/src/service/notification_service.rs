//! Per-user notification inbox.
//!
//! # Responsibility
//! - Read and acknowledge notifications for the calling user.
//! - Deliver new notifications while holding each inbox under its cap.
//!
//! # Invariants
//! - After `push_capped`, a user holds at most `cap` notifications.
//! - Eviction removes the oldest rows first (`sent_at`, then `id`).

use crate::model::document::DocumentId;
use crate::model::notification::{Notification, NotificationId};
use crate::model::user::{Actor, UserId};
use crate::repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
use crate::service::{not_found, ServiceError, ServiceResult};
use log::debug;
use rusqlite::Connection;

pub struct NotificationService<R: NotificationRepository> {
    repo: R,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list(&self, actor: &Actor) -> ServiceResult<Vec<Notification>> {
        Ok(self.repo.list_by_user(actor.user_id)?)
    }

    /// Only the recipient may acknowledge a notification.
    pub fn mark_read(&self, actor: &Actor, id: NotificationId) -> ServiceResult<()> {
        let notification = self
            .repo
            .get(id)?
            .ok_or_else(|| not_found("notification", id))?;
        if notification.user_id != actor.user_id {
            return Err(ServiceError::Forbidden(
                "notification belongs to another user".to_string(),
            ));
        }
        Ok(self.repo.mark_read(id)?)
    }
}

/// Inserts one notification, first evicting the oldest rows so the inbox
/// stays within `cap`.
pub fn push_capped(
    conn: &Connection,
    cap: u32,
    user_id: UserId,
    message: &str,
    document_id: Option<DocumentId>,
) -> ServiceResult<NotificationId> {
    let repo = SqliteNotificationRepository::new(conn);
    let cap = i64::from(cap.max(1));
    let current = repo.count_by_user(user_id)?;
    if current >= cap {
        let evicted = repo.delete_oldest_by_user(user_id, current - cap + 1)?;
        debug!("event=notification_evict module=service status=ok user_id={user_id} evicted={evicted}");
    }
    Ok(repo.create(user_id, message, document_id)?)
}

use crate::model::document::DocumentId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type NotificationId = i64;

/// Upper bound on stored notifications per user.
pub const DEFAULT_MAX_NOTIFICATIONS_PER_USER: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub message: String,
    /// Cleared when the referenced document is deleted.
    pub document_id: Option<DocumentId>,
    pub is_read: bool,
    pub sent_at: i64,
}

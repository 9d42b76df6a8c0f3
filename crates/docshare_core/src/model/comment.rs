use crate::model::document::DocumentId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type CommentId = i64;

pub const MIN_RATING: i64 = 0;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub content: String,
    pub rating: i64,
    pub created_at: i64,
}

/// Comment joined with its author's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

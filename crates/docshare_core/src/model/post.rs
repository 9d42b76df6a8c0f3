use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type PostId = i64;
pub type PostCommentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub created_at: i64,
    pub view_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    pub id: PostCommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostCommentView {
    #[serde(flatten)]
    pub comment: PostComment,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

//! Document comments with ratings.
//!
//! # Invariants
//! - Ratings are within `0..=5`.
//! - Creating a comment bumps the author's `comment_count` and checks the
//!   commenter badge in the same commit.

use crate::db::write_transaction;
use crate::model::badge::COMMENTER_BADGE;
use crate::model::comment::{Comment, CommentId, CommentView, MAX_RATING, MIN_RATING};
use crate::model::document::DocumentId;
use crate::model::user::Actor;
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::badge_service::award_on_threshold;
use crate::service::{
    not_found, require_owner_or_admin, required_text, ServiceError, ServiceResult,
};
use log::info;
use rusqlite::Connection;

pub struct CommentService<'a> {
    conn: &'a Connection,
}

impl<'a> CommentService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list_by_document(&self, document_id: DocumentId) -> ServiceResult<Vec<CommentView>> {
        Ok(SqliteCommentRepository::new(self.conn).list_by_document(document_id)?)
    }

    pub fn create(
        &self,
        actor: &Actor,
        document_id: DocumentId,
        content: &str,
        rating: i64,
    ) -> ServiceResult<Comment> {
        let content = required_text(content, "comment content")?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ServiceError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        if SqliteDocumentRepository::new(self.conn)
            .get(document_id)?
            .is_none()
        {
            return Err(not_found("document", document_id));
        }

        let tx = write_transaction(self.conn)?;
        let comments = SqliteCommentRepository::new(&tx);
        let id = comments.create(document_id, actor.user_id, &content, rating)?;
        let count = SqliteUserRepository::new(&tx).increment_comment_count(actor.user_id)?;
        award_on_threshold(&tx, actor.user_id, &COMMENTER_BADGE, count)?;
        let comment = comments.get(id)?.ok_or_else(|| not_found("comment", id))?;
        tx.commit()?;

        info!(
            "event=comment_create module=service status=ok comment_id={id} document_id={document_id}"
        );
        Ok(comment)
    }

    pub fn delete(&self, actor: &Actor, id: CommentId) -> ServiceResult<()> {
        let comments = SqliteCommentRepository::new(self.conn);
        let comment = comments.get(id)?.ok_or_else(|| not_found("comment", id))?;
        require_owner_or_admin(actor, comment.user_id)?;
        comments.delete(id)?;
        info!("event=comment_delete module=service status=ok comment_id={id}");
        Ok(())
    }
}

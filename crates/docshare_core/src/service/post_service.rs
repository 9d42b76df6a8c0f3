//! Discussion posts and post comments.

use crate::model::post::{Post, PostComment, PostCommentId, PostCommentView, PostId, PostSummary};
use crate::model::user::Actor;
use crate::repo::post_repo::{
    PostCommentRepository, PostRepository, SqlitePostCommentRepository, SqlitePostRepository,
};
use crate::service::{not_found, require_owner_or_admin, required_text, ServiceResult};
use log::info;
use rusqlite::Connection;

pub struct PostService<'a> {
    conn: &'a Connection,
}

impl<'a> PostService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn posts(&self) -> SqlitePostRepository<'a> {
        SqlitePostRepository::new(self.conn)
    }

    fn comments(&self) -> SqlitePostCommentRepository<'a> {
        SqlitePostCommentRepository::new(self.conn)
    }

    pub fn list(&self) -> ServiceResult<Vec<PostSummary>> {
        Ok(self.posts().list()?)
    }

    /// Counts as a view.
    pub fn get(&self, id: PostId) -> ServiceResult<PostSummary> {
        self.posts().increment_view_count(id)?;
        self.posts().get(id)?.ok_or_else(|| not_found("post", id))
    }

    pub fn create(&self, actor: &Actor, title: &str, content: &str) -> ServiceResult<Post> {
        let title = required_text(title, "post title")?;
        let content = required_text(content, "post content")?;
        let id = self.posts().create(actor.user_id, &title, &content)?;
        info!("event=post_create module=service status=ok post_id={id}");
        self.posts()
            .get(id)?
            .map(|summary| summary.post)
            .ok_or_else(|| not_found("post", id))
    }

    pub fn delete(&self, actor: &Actor, id: PostId) -> ServiceResult<()> {
        let post = self.posts().get(id)?.ok_or_else(|| not_found("post", id))?;
        require_owner_or_admin(actor, post.post.user_id)?;
        self.posts().delete(id)?;
        info!("event=post_delete module=service status=ok post_id={id}");
        Ok(())
    }

    pub fn list_comments(&self, post_id: PostId) -> ServiceResult<Vec<PostCommentView>> {
        Ok(self.comments().list_by_post(post_id)?)
    }

    pub fn create_comment(
        &self,
        actor: &Actor,
        post_id: PostId,
        content: &str,
    ) -> ServiceResult<PostComment> {
        let content = required_text(content, "comment content")?;
        if self.posts().get(post_id)?.is_none() {
            return Err(not_found("post", post_id));
        }
        let id = self.comments().create(post_id, actor.user_id, &content)?;
        self.comments()
            .get(id)?
            .ok_or_else(|| not_found("post comment", id))
    }

    pub fn delete_comment(&self, actor: &Actor, id: PostCommentId) -> ServiceResult<()> {
        let comment = self
            .comments()
            .get(id)?
            .ok_or_else(|| not_found("post comment", id))?;
        require_owner_or_admin(actor, comment.user_id)?;
        self.comments().delete(id)?;
        Ok(())
    }
}

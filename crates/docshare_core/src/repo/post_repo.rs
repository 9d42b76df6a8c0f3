//! Discussion posts and their comment threads.

use crate::model::post::{
    Post, PostComment, PostCommentId, PostCommentView, PostId, PostSummary,
};
use crate::model::user::UserId;
use crate::repo::{ensure_changed, RepoResult};
use rusqlite::{params, Connection, Row};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.user_id, p.created_at, p.view_count";
const POST_COMMENT_COLUMNS: &str = "pc.id, pc.post_id, pc.user_id, pc.content, pc.created_at";

pub trait PostRepository {
    fn create(&self, user_id: UserId, title: &str, content: &str) -> RepoResult<PostId>;
    fn get(&self, id: PostId) -> RepoResult<Option<PostSummary>>;
    /// Newest first with author name and comment count.
    fn list(&self) -> RepoResult<Vec<PostSummary>>;
    fn delete(&self, id: PostId) -> RepoResult<()>;
    fn increment_view_count(&self, id: PostId) -> RepoResult<()>;
}

pub trait PostCommentRepository {
    fn create(&self, post_id: PostId, user_id: UserId, content: &str) -> RepoResult<PostCommentId>;
    fn get(&self, id: PostCommentId) -> RepoResult<Option<PostComment>>;
    /// Oldest first, reading order of a thread.
    fn list_by_post(&self, post_id: PostId) -> RepoResult<Vec<PostCommentView>>;
    fn delete(&self, id: PostCommentId) -> RepoResult<()>;
}

pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn summaries(&self, tail_sql: &str, id: Option<PostId>) -> RepoResult<Vec<PostSummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COLUMNS},
                u.full_name,
                (SELECT COUNT(*) FROM post_comments pc WHERE pc.post_id = p.id)
             FROM posts p
             JOIN users u ON u.id = p.user_id
             {tail_sql};"
        ))?;
        let mut rows = match id {
            Some(id) => stmt.query([id])?,
            None => stmt.query([])?,
        };
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(PostSummary {
                post: parse_post_row(row)?,
                author_name: row.get(6)?,
                comment_count: row.get(7)?,
            });
        }
        Ok(posts)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create(&self, user_id: UserId, title: &str, content: &str) -> RepoResult<PostId> {
        self.conn.execute(
            "INSERT INTO posts (title, content, user_id) VALUES (?1, ?2, ?3);",
            params![title, content, user_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: PostId) -> RepoResult<Option<PostSummary>> {
        Ok(self.summaries("WHERE p.id = ?1", Some(id))?.pop())
    }

    fn list(&self) -> RepoResult<Vec<PostSummary>> {
        self.summaries("ORDER BY p.created_at DESC, p.id DESC", None)
    }

    fn delete(&self, id: PostId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM posts WHERE id = ?1;", [id])?;
        ensure_changed(changed, "post", id)
    }

    fn increment_view_count(&self, id: PostId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1;",
            [id],
        )?;
        ensure_changed(changed, "post", id)
    }
}

pub struct SqlitePostCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostCommentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PostCommentRepository for SqlitePostCommentRepository<'_> {
    fn create(&self, post_id: PostId, user_id: UserId, content: &str) -> RepoResult<PostCommentId> {
        self.conn.execute(
            "INSERT INTO post_comments (post_id, user_id, content) VALUES (?1, ?2, ?3);",
            params![post_id, user_id, content],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: PostCommentId) -> RepoResult<Option<PostComment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COMMENT_COLUMNS} FROM post_comments pc WHERE pc.id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_post_comment_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_by_post(&self, post_id: PostId) -> RepoResult<Vec<PostCommentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {POST_COMMENT_COLUMNS}, u.full_name, u.avatar_url
             FROM post_comments pc
             JOIN users u ON u.id = pc.user_id
             WHERE pc.post_id = ?1
             ORDER BY pc.created_at ASC, pc.id ASC;"
        ))?;
        let mut rows = stmt.query([post_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(PostCommentView {
                comment: parse_post_comment_row(row)?,
                author_name: row.get(5)?,
                author_avatar_url: row.get(6)?,
            });
        }
        Ok(comments)
    }

    fn delete(&self, id: PostCommentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM post_comments WHERE id = ?1;", [id])?;
        ensure_changed(changed, "post comment", id)
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        view_count: row.get(5)?,
    })
}

fn parse_post_comment_row(row: &Row<'_>) -> RepoResult<PostComment> {
    Ok(PostComment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
    })
}

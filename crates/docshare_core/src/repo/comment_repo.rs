use crate::model::comment::{Comment, CommentId, CommentView};
use crate::model::document::DocumentId;
use crate::model::user::UserId;
use crate::repo::{ensure_changed, RepoResult};
use rusqlite::{params, Connection, Row};

const COMMENT_COLUMNS: &str = "c.id, c.document_id, c.user_id, c.content, c.rating, c.created_at";

pub trait CommentRepository {
    fn create(
        &self,
        document_id: DocumentId,
        user_id: UserId,
        content: &str,
        rating: i64,
    ) -> RepoResult<CommentId>;
    fn get(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Newest first, joined with the author's display fields.
    fn list_by_document(&self, document_id: DocumentId) -> RepoResult<Vec<CommentView>>;
    fn delete(&self, id: CommentId) -> RepoResult<()>;
    fn count_by_user(&self, user_id: UserId) -> RepoResult<i64>;
}

pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create(
        &self,
        document_id: DocumentId,
        user_id: UserId,
        content: &str,
        rating: i64,
    ) -> RepoResult<CommentId> {
        self.conn.execute(
            "INSERT INTO comments (document_id, user_id, content, rating)
             VALUES (?1, ?2, ?3, ?4);",
            params![document_id, user_id, content, rating],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_comment_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_by_document(&self, document_id: DocumentId) -> RepoResult<Vec<CommentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS}, u.full_name, u.avatar_url
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.document_id = ?1
             ORDER BY c.created_at DESC, c.id DESC;"
        ))?;
        let mut rows = stmt.query([document_id])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(CommentView {
                comment: parse_comment_row(row)?,
                author_name: row.get(6)?,
                author_avatar_url: row.get(7)?,
            });
        }
        Ok(comments)
    }

    fn delete(&self, id: CommentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1;", [id])?;
        ensure_changed(changed, "comment", id)
    }

    fn count_by_user(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        document_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        rating: row.get(4)?,
        created_at: row.get(5)?,
    })
}

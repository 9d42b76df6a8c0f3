//! Interaction log and content-based recommendation query.
//!
//! # Invariants
//! - Recommendations come from categories the user interacted with and never
//!   include a document the user already interacted with.
//! - Only approved, unlocked documents are recommended.

use crate::model::document::{Document, DocumentId};
use crate::model::user::UserId;
use crate::repo::document_repo::{parse_document_at, DOCUMENT_COLUMNS};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

pub trait RecommendationRepository {
    fn record_interaction(&self, user_id: UserId, document_id: DocumentId) -> RepoResult<i64>;
    fn interaction_count(&self, user_id: UserId) -> RepoResult<i64>;
    fn recommended_for(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<Document>>;
}

pub struct SqliteRecommendationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecommendationRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecommendationRepository for SqliteRecommendationRepository<'_> {
    fn record_interaction(&self, user_id: UserId, document_id: DocumentId) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO recommendations (user_id, document_id) VALUES (?1, ?2);",
            params![user_id, document_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn interaction_count(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM recommendations WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?)
    }

    fn recommended_for(&self, user_id: UserId, limit: u32) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS}
             FROM documents d
             WHERE d.is_approved = 1
               AND d.is_lock = 0
               AND d.category_id IN (
                    SELECT seen.category_id
                    FROM recommendations r
                    JOIN documents seen ON seen.id = r.document_id
                    WHERE r.user_id = ?1
               )
               AND d.id NOT IN (
                    SELECT r.document_id FROM recommendations r WHERE r.user_id = ?1
               )
             ORDER BY d.download_count DESC, d.uploaded_at DESC, d.id DESC
             LIMIT ?2;"
        ))?;
        let mut rows = stmt.query(params![user_id, i64::from(limit)])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_at(row, 0)?);
        }
        Ok(documents)
    }
}

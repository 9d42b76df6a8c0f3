//! Per-user document action ledger (`Upload`, `Download`, `Library`).
//!
//! # Invariants
//! - The table key is `(user_id, document_id, action_type)`; `add` is an
//!   insert-or-ignore and reports whether a new row was written.

use crate::model::document::{DocumentAction, DocumentId, UserDocument, UserDocumentEntry};
use crate::model::user::UserId;
use crate::repo::document_repo::{parse_document_at, DOCUMENT_COLUMNS};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

pub trait UserDocumentRepository {
    /// Returns `true` when the row was newly inserted.
    fn add(&self, user_id: UserId, document_id: DocumentId, action: DocumentAction)
        -> RepoResult<bool>;
    fn get(
        &self,
        user_id: UserId,
        document_id: DocumentId,
        action: DocumentAction,
    ) -> RepoResult<Option<UserDocument>>;
    /// Newest first.
    fn list_by_user_action(
        &self,
        user_id: UserId,
        action: DocumentAction,
    ) -> RepoResult<Vec<UserDocumentEntry>>;
    /// Returns `true` when a row was removed.
    fn remove(&self, user_id: UserId, document_id: DocumentId, action: DocumentAction)
        -> RepoResult<bool>;
    fn count_by_action(&self, action: DocumentAction) -> RepoResult<i64>;
    fn count_by_user_action(&self, user_id: UserId, action: DocumentAction) -> RepoResult<i64>;
}

pub struct SqliteUserDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserDocumentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserDocumentRepository for SqliteUserDocumentRepository<'_> {
    fn add(
        &self,
        user_id: UserId,
        document_id: DocumentId,
        action: DocumentAction,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO user_documents (user_id, document_id, action_type)
             VALUES (?1, ?2, ?3);",
            params![user_id, document_id, action.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn get(
        &self,
        user_id: UserId,
        document_id: DocumentId,
        action: DocumentAction,
    ) -> RepoResult<Option<UserDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT added_at FROM user_documents
             WHERE user_id = ?1 AND document_id = ?2 AND action_type = ?3;",
        )?;
        let mut rows = stmt.query(params![user_id, document_id, action.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(UserDocument {
                user_id,
                document_id,
                action,
                added_at: row.get(0)?,
            })),
            None => Ok(None),
        }
    }

    fn list_by_user_action(
        &self,
        user_id: UserId,
        action: DocumentAction,
    ) -> RepoResult<Vec<UserDocumentEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT ud.action_type, ud.added_at, {DOCUMENT_COLUMNS}
             FROM user_documents ud
             JOIN documents d ON d.id = ud.document_id
             WHERE ud.user_id = ?1 AND ud.action_type = ?2
             ORDER BY ud.added_at DESC, d.id DESC;"
        ))?;
        let mut rows = stmt.query(params![user_id, action.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let action_text: String = row.get(0)?;
            let action = DocumentAction::parse(&action_text).ok_or_else(|| {
                RepoError::InvalidData(format!("unknown action_type `{action_text}`"))
            })?;
            entries.push(UserDocumentEntry {
                action,
                added_at: row.get(1)?,
                document: parse_document_at(row, 2)?,
            });
        }
        Ok(entries)
    }

    fn remove(
        &self,
        user_id: UserId,
        document_id: DocumentId,
        action: DocumentAction,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM user_documents
             WHERE user_id = ?1 AND document_id = ?2 AND action_type = ?3;",
            params![user_id, document_id, action.as_str()],
        )?;
        Ok(changed > 0)
    }

    fn count_by_action(&self, action: DocumentAction) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM user_documents WHERE action_type = ?1;",
            [action.as_str()],
            |row| row.get(0),
        )?)
    }

    fn count_by_user_action(&self, user_id: UserId, action: DocumentAction) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM user_documents WHERE user_id = ?1 AND action_type = ?2;",
            params![user_id, action.as_str()],
            |row| row.get(0),
        )?)
    }
}

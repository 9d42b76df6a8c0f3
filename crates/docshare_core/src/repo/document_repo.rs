//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist document metadata and moderation flags.
//! - Serve listing, paged search, related-document and top-download queries.
//!
//! # Invariants
//! - Search only returns approved documents.
//! - Related and top-downloaded lists only return approved, unlocked rows.
//! - Every ordering ends with `id` so pagination is deterministic.

use crate::model::category::CategoryId;
use crate::model::document::{
    Document, DocumentId, DocumentListing, DocumentPatch, DocumentSearchQuery, NewDocument,
};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, ensure_changed, int_to_bool, like_pattern, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub(crate) const DOCUMENT_COLUMNS: &str = "d.id,
    d.title,
    d.description,
    d.file_url,
    d.file_type,
    d.file_size,
    d.cover_image_url,
    d.category_id,
    d.uploaded_by,
    d.uploaded_at,
    d.download_count,
    d.points_required,
    d.is_approved,
    d.is_lock";

const DOCUMENT_COLUMN_COUNT: usize = 14;

const LISTING_FROM_SQL: &str = "FROM documents d
    JOIN categories c ON c.id = d.category_id
    JOIN users u ON u.id = d.uploaded_by";

pub trait DocumentRepository {
    fn create(&self, document: &NewDocument) -> RepoResult<DocumentId>;
    fn get(&self, id: DocumentId) -> RepoResult<Option<Document>>;
    fn get_by_title(&self, title: &str) -> RepoResult<Option<Document>>;
    fn get_listing(&self, id: DocumentId) -> RepoResult<Option<DocumentListing>>;
    /// Every document regardless of moderation state, newest first.
    fn list(&self) -> RepoResult<Vec<DocumentListing>>;
    fn update(&self, id: DocumentId, patch: &DocumentPatch) -> RepoResult<()>;
    fn delete(&self, id: DocumentId) -> RepoResult<()>;
    fn list_pending(&self) -> RepoResult<Vec<DocumentListing>>;
    fn approve(&self, id: DocumentId) -> RepoResult<()>;
    fn set_lock(&self, id: DocumentId, locked: bool) -> RepoResult<()>;
    fn increment_download_count(&self, id: DocumentId) -> RepoResult<()>;
    /// Returns one page of approved documents plus the unpaged match count.
    fn search_paged(&self, query: &DocumentSearchQuery)
        -> RepoResult<(Vec<DocumentListing>, i64)>;
    fn count_by_uploader(&self, user_id: UserId) -> RepoResult<i64>;
    fn count_by_category(&self, category_id: CategoryId) -> RepoResult<i64>;
    fn list_by_uploader(&self, user_id: UserId) -> RepoResult<Vec<Document>>;
    fn top_downloaded(&self, limit: u32) -> RepoResult<Vec<DocumentListing>>;
    fn related(&self, document: &Document, count: u32) -> RepoResult<Vec<DocumentListing>>;
    fn count(&self) -> RepoResult<i64>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_documents(
        &self,
        sql: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_at(row, 0)?);
        }
        Ok(documents)
    }

    fn query_listings(
        &self,
        tail_sql: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<DocumentListing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS}, c.name, u.email {LISTING_FROM_SQL} {tail_sql};"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut listings = Vec::new();
        while let Some(row) = rows.next()? {
            listings.push(DocumentListing {
                document: parse_document_at(row, 0)?,
                category_name: row.get(DOCUMENT_COLUMN_COUNT)?,
                uploader_email: row.get(DOCUMENT_COLUMN_COUNT + 1)?,
            });
        }
        Ok(listings)
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create(&self, document: &NewDocument) -> RepoResult<DocumentId> {
        self.conn.execute(
            "INSERT INTO documents (
                title,
                description,
                file_url,
                file_type,
                file_size,
                cover_image_url,
                category_id,
                uploaded_by,
                points_required
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                document.title.as_str(),
                document.description.as_str(),
                document.file_url.as_str(),
                document.file_type.as_str(),
                document.file_size,
                document.cover_image_url.as_str(),
                document.category_id,
                document.uploaded_by,
                document.points_required,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        let mut documents = self.query_documents(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.id = ?1;"),
            vec![Value::Integer(id)],
        )?;
        Ok(documents.pop())
    }

    fn get_by_title(&self, title: &str) -> RepoResult<Option<Document>> {
        let mut documents = self.query_documents(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents d WHERE d.title = ?1;"),
            vec![Value::Text(title.trim().to_string())],
        )?;
        Ok(documents.pop())
    }

    fn get_listing(&self, id: DocumentId) -> RepoResult<Option<DocumentListing>> {
        let mut listings = self.query_listings("WHERE d.id = ?1", vec![Value::Integer(id)])?;
        Ok(listings.pop())
    }

    fn list(&self) -> RepoResult<Vec<DocumentListing>> {
        self.query_listings("ORDER BY d.uploaded_at DESC, d.id DESC", Vec::new())
    }

    fn update(&self, id: DocumentId, patch: &DocumentPatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents
             SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                category_id = COALESCE(?4, category_id),
                points_required = COALESCE(?5, points_required),
                file_url = COALESCE(?6, file_url),
                file_type = COALESCE(?7, file_type),
                file_size = COALESCE(?8, file_size),
                cover_image_url = COALESCE(?9, cover_image_url)
             WHERE id = ?1;",
            params![
                id,
                patch.title.as_deref(),
                patch.description.as_deref(),
                patch.category_id,
                patch.points_required,
                patch.file_url.as_deref(),
                patch.file_type.as_deref(),
                patch.file_size,
                patch.cover_image_url.as_deref(),
            ],
        )?;
        ensure_changed(changed, "document", id)
    }

    fn delete(&self, id: DocumentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?1;", [id])?;
        ensure_changed(changed, "document", id)
    }

    fn list_pending(&self) -> RepoResult<Vec<DocumentListing>> {
        self.query_listings(
            "WHERE d.is_approved = 0 ORDER BY d.uploaded_at ASC, d.id ASC",
            Vec::new(),
        )
    }

    fn approve(&self, id: DocumentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("UPDATE documents SET is_approved = 1 WHERE id = ?1;", [id])?;
        ensure_changed(changed, "document", id)
    }

    fn set_lock(&self, id: DocumentId, locked: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET is_lock = ?2 WHERE id = ?1;",
            params![id, bool_to_int(locked)],
        )?;
        ensure_changed(changed, "document", id)
    }

    fn increment_download_count(&self, id: DocumentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET download_count = download_count + 1 WHERE id = ?1;",
            [id],
        )?;
        ensure_changed(changed, "document", id)
    }

    fn search_paged(
        &self,
        query: &DocumentSearchQuery,
    ) -> RepoResult<(Vec<DocumentListing>, i64)> {
        let mut where_sql = String::from("WHERE d.is_approved = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(keyword) = query.keyword.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                bind_values.push(Value::Text(like_pattern(keyword)));
                let index = bind_values.len();
                where_sql.push_str(&format!(
                    " AND (d.title LIKE ?{index} ESCAPE '\\' OR d.description LIKE ?{index} ESCAPE '\\')"
                ));
            }
        }

        if let Some(category_id) = query.category_id {
            bind_values.push(Value::Integer(category_id));
            where_sql.push_str(&format!(" AND d.category_id = ?{}", bind_values.len()));
        }

        if let Some(file_type) = query.file_type.as_deref().map(str::trim) {
            if !file_type.is_empty() {
                let normalized = file_type.trim_start_matches('.').to_ascii_lowercase();
                bind_values.push(Value::Text(normalized));
                where_sql.push_str(&format!(" AND lower(d.file_type) = ?{}", bind_values.len()));
            }
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM documents d {where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let limit_index = bind_values.len() + 1;
        let offset_index = bind_values.len() + 2;
        bind_values.push(Value::Integer(i64::from(query.page_size)));
        bind_values.push(Value::Integer(
            i64::try_from(query.offset()).unwrap_or(i64::MAX),
        ));

        let items = self.query_listings(
            &format!(
                "{where_sql} ORDER BY {} LIMIT ?{limit_index} OFFSET ?{offset_index}",
                query.sort.order_by_sql()
            ),
            bind_values,
        )?;
        Ok((items, total))
    }

    fn count_by_uploader(&self, user_id: UserId) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE uploaded_by = ?1;",
            [user_id],
            |row| row.get(0),
        )?)
    }

    fn count_by_category(&self, category_id: CategoryId) -> RepoResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE category_id = ?1;",
            [category_id],
            |row| row.get(0),
        )?)
    }

    fn list_by_uploader(&self, user_id: UserId) -> RepoResult<Vec<Document>> {
        self.query_documents(
            &format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents d
                 WHERE d.uploaded_by = ?1
                 ORDER BY d.uploaded_at DESC, d.id DESC;"
            ),
            vec![Value::Integer(user_id)],
        )
    }

    fn top_downloaded(&self, limit: u32) -> RepoResult<Vec<DocumentListing>> {
        self.query_listings(
            "WHERE d.is_approved = 1 AND d.is_lock = 0
             ORDER BY d.download_count DESC, d.id ASC
             LIMIT ?1",
            vec![Value::Integer(i64::from(limit))],
        )
    }

    fn related(&self, document: &Document, count: u32) -> RepoResult<Vec<DocumentListing>> {
        self.query_listings(
            "WHERE d.category_id = ?1
               AND d.id <> ?2
               AND d.is_approved = 1
               AND d.is_lock = 0
             ORDER BY d.download_count DESC, d.id ASC
             LIMIT ?3",
            vec![
                Value::Integer(document.category_id),
                Value::Integer(document.id),
                Value::Integer(i64::from(count)),
            ],
        )
    }

    fn count(&self) -> RepoResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get(0))?)
    }
}

/// Parses the `DOCUMENT_COLUMNS` projection starting at column `offset`.
pub(crate) fn parse_document_at(row: &Row<'_>, offset: usize) -> RepoResult<Document> {
    Ok(Document {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        file_url: row.get(offset + 3)?,
        file_type: row.get(offset + 4)?,
        file_size: row.get(offset + 5)?,
        cover_image_url: row.get(offset + 6)?,
        category_id: row.get(offset + 7)?,
        uploaded_by: row.get(offset + 8)?,
        uploaded_at: row.get(offset + 9)?,
        download_count: row.get(offset + 10)?,
        points_required: row.get(offset + 11)?,
        is_approved: int_to_bool(row.get(offset + 12)?, "documents.is_approved")?,
        is_lock: int_to_bool(row.get(offset + 13)?, "documents.is_lock")?,
    })
}

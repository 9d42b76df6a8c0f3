use crate::model::category::{Category, CategoryId, CategoryPatch};
use crate::repo::{ensure_changed, RepoResult};
use rusqlite::{params, Connection, Row};

pub trait CategoryRepository {
    fn create(&self, name: &str, kind: Option<&str>) -> RepoResult<CategoryId>;
    fn get(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    fn get_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    fn list(&self) -> RepoResult<Vec<Category>>;
    fn update(&self, id: CategoryId, patch: &CategoryPatch) -> RepoResult<()>;
    /// Fails with `RepoError::Constraint` while documents reference the row.
    fn delete(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create(&self, name: &str, kind: Option<&str>) -> RepoResult<CategoryId> {
        self.conn.execute(
            "INSERT INTO categories (name, kind) VALUES (?1, ?2);",
            params![name, kind],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind FROM categories WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind FROM categories WHERE name = ?1;")?;
        let mut rows = stmt.query([name.trim()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_category_row(row)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, kind FROM categories ORDER BY name COLLATE NOCASE, id;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn update(&self, id: CategoryId, patch: &CategoryPatch) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE categories
             SET name = COALESCE(?2, name), kind = COALESCE(?3, kind)
             WHERE id = ?1;",
            params![id, patch.name.as_deref(), patch.kind.as_deref()],
        )?;
        ensure_changed(changed, "category", id)
    }

    fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id])?;
        ensure_changed(changed, "category", id)
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
    })
}

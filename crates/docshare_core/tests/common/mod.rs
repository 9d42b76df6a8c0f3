#![allow(dead_code)]

use docshare_core::db::open_db_in_memory;
use docshare_core::model::category::CategoryId;
use docshare_core::model::document::Document;
use docshare_core::repo::category_repo::SqliteCategoryRepository;
use docshare_core::repo::user_repo::SqliteUserRepository;
use docshare_core::{
    Actor, CategoryService, DocumentService, FileStore, RegisterRequest, UploadDocumentRequest,
    UploadFile, UserService,
};
use rusqlite::Connection;
use tempfile::TempDir;

pub struct Fixture {
    pub conn: Connection,
    pub store: FileStore,
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            conn: open_db_in_memory().unwrap(),
            store: FileStore::new(dir.path()),
            dir,
        }
    }

    pub fn users(&self) -> UserService<SqliteUserRepository<'_>> {
        UserService::new(SqliteUserRepository::new(&self.conn))
    }

    pub fn categories(&self) -> CategoryService<SqliteCategoryRepository<'_>> {
        CategoryService::new(SqliteCategoryRepository::new(&self.conn))
    }

    pub fn documents(&self) -> DocumentService<'_> {
        DocumentService::new(&self.conn, &self.store)
    }

    /// Registers `name` as `<name>@example.com` with uid `<name>-uid`.
    pub fn register(&self, name: &str) -> Actor {
        self.users()
            .register(&RegisterRequest {
                email: format!("{name}@example.com"),
                full_name: format!("{name} Tester"),
                external_uid: format!("{name}-uid"),
            })
            .unwrap();
        self.users().resolve_actor(&format!("{name}-uid")).unwrap()
    }

    pub fn admin(&self) -> Actor {
        let actor = self.register("admin");
        self.users().bootstrap_admin(actor.user_id).unwrap();
        self.users().resolve_actor("admin-uid").unwrap()
    }

    pub fn category(&self, admin: &Actor, name: &str) -> CategoryId {
        self.categories().create(admin, name, None).unwrap().id
    }

    pub fn upload(
        &self,
        actor: &Actor,
        title: &str,
        category_id: CategoryId,
        points_required: i64,
    ) -> Document {
        self.documents()
            .upload(actor, &upload_request(title, category_id, points_required))
            .unwrap()
            .document
    }

    /// Uploads a PDF and approves it as `admin`.
    pub fn approved_upload(
        &self,
        admin: &Actor,
        actor: &Actor,
        title: &str,
        category_id: CategoryId,
        points_required: i64,
    ) -> Document {
        let document = self.upload(actor, title, category_id, points_required);
        self.documents().approve(admin, document.id).unwrap();
        document
    }

    pub fn points(&self, user_id: i64) -> i64 {
        self.conn
            .query_row("SELECT points FROM users WHERE id = ?1;", [user_id], |row| {
                row.get(0)
            })
            .unwrap()
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn stored_files(&self, dir: &str) -> usize {
        match std::fs::read_dir(self.dir.path().join(dir)) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub fn upload_request(
    title: &str,
    category_id: CategoryId,
    points_required: i64,
) -> UploadDocumentRequest {
    UploadDocumentRequest {
        title: title.to_string(),
        description: format!("{title} description"),
        category_id,
        points_required,
        file: pdf(&format!("{title}.pdf")),
        cover: None,
    }
}

pub fn pdf(name: &str) -> UploadFile {
    UploadFile::new(name, b"%PDF-1.4 test body".to_vec())
}

//! Personal shelves derived from the document action ledger.

use crate::model::document::{DocumentAction, DocumentId, UserDocumentEntry};
use crate::model::user::Actor;
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
use crate::repo::user_document_repo::{SqliteUserDocumentRepository, UserDocumentRepository};
use crate::service::{not_found, ServiceError, ServiceResult};
use log::info;
use rusqlite::Connection;

pub struct LibraryService<'a> {
    conn: &'a Connection,
}

impl<'a> LibraryService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn ledger(&self) -> SqliteUserDocumentRepository<'a> {
        SqliteUserDocumentRepository::new(self.conn)
    }

    pub fn uploads(&self, actor: &Actor) -> ServiceResult<Vec<UserDocumentEntry>> {
        Ok(self
            .ledger()
            .list_by_user_action(actor.user_id, DocumentAction::Upload)?)
    }

    pub fn downloads(&self, actor: &Actor) -> ServiceResult<Vec<UserDocumentEntry>> {
        Ok(self
            .ledger()
            .list_by_user_action(actor.user_id, DocumentAction::Download)?)
    }

    pub fn library(&self, actor: &Actor) -> ServiceResult<Vec<UserDocumentEntry>> {
        Ok(self
            .ledger()
            .list_by_user_action(actor.user_id, DocumentAction::Library)?)
    }

    pub fn add_to_library(&self, actor: &Actor, document_id: DocumentId) -> ServiceResult<()> {
        if SqliteDocumentRepository::new(self.conn)
            .get(document_id)?
            .is_none()
        {
            return Err(not_found("document", document_id));
        }
        if !self
            .ledger()
            .add(actor.user_id, document_id, DocumentAction::Library)?
        {
            return Err(ServiceError::Conflict(
                "document already in library".to_string(),
            ));
        }
        info!(
            "event=library_add module=service status=ok user_id={} document_id={document_id}",
            actor.user_id
        );
        Ok(())
    }

    pub fn remove_from_library(&self, actor: &Actor, document_id: DocumentId) -> ServiceResult<()> {
        if !self
            .ledger()
            .remove(actor.user_id, document_id, DocumentAction::Library)?
        {
            return Err(not_found("library entry", document_id));
        }
        Ok(())
    }
}

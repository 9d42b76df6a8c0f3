//! Document use-case service.
//!
//! # Responsibility
//! - Upload, update, and delete documents together with their stored files.
//! - Gate downloads and previews on moderation state and point balance.
//! - Moderation (approve, lock) with uploader notifications.
//! - Paged search, related documents, and site statistics.
//!
//! # Invariants
//! - Each multi-table sequence commits once; a failed upload removes the
//!   files it saved.
//! - A refused download changes no state.
//! - A `(user, document, Download)` ledger row is written at most once, while
//!   the download counter grows on every successful download.

use crate::db::write_transaction;
use crate::model::badge::UPLOADER_BADGE;
use crate::model::category::CategoryId;
use crate::model::document::{
    Document, DocumentAction, DocumentId, DocumentListing, DocumentPage, DocumentPatch,
    DocumentSearchQuery, NewDocument, Statistics, DEFAULT_RELATED_COUNT, MAX_PAGE_SIZE,
};
use crate::model::notification::DEFAULT_MAX_NOTIFICATIONS_PER_USER;
use crate::model::user::{Actor, Level, UserId};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
use crate::repo::follow_repo::{FollowRepository, SqliteFollowRepository};
use crate::repo::recommendation_repo::{RecommendationRepository, SqliteRecommendationRepository};
use crate::repo::user_document_repo::{SqliteUserDocumentRepository, UserDocumentRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::service::badge_service::award_on_threshold;
use crate::service::notification_service::push_capped;
use crate::service::{
    not_found, require_admin, require_owner_or_admin, required_text, ServiceError, ServiceResult,
    UnavailableReason,
};
use crate::storage::{FileStore, StoredFile, UploadFile, DEFAULT_COVER_URL};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;

/// Points credited to the uploader for every accepted upload.
pub const UPLOAD_REWARD_POINTS: i64 = 10;

/// Upload with file payload. The uploader is the calling actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDocumentRequest {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub points_required: i64,
    pub file: UploadFile,
    pub cover: Option<UploadFile>,
}

/// Metadata-only registration for a file already in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDocumentRequest {
    pub title: String,
    pub description: String,
    pub category_id: CategoryId,
    pub points_required: i64,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub points_required: Option<i64>,
    pub file: Option<UploadFile>,
    pub cover: Option<UploadFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub document: Document,
    pub points: i64,
    pub level: Level,
    pub notified_followers: usize,
    pub badge_awarded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    /// `application/<file_type>`.
    pub content_type: String,
    /// `<title>.<file_type>`.
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Pdf(Vec<u8>),
    /// Only PDF documents can be previewed.
    Unsupported { file_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub upload_count: usize,
    pub uploads: Vec<Document>,
}

pub struct DocumentService<'a> {
    conn: &'a Connection,
    store: &'a FileStore,
    notification_cap: u32,
}

impl<'a> DocumentService<'a> {
    pub fn new(conn: &'a Connection, store: &'a FileStore) -> Self {
        Self {
            conn,
            store,
            notification_cap: DEFAULT_MAX_NOTIFICATIONS_PER_USER,
        }
    }

    pub fn with_notification_cap(mut self, cap: u32) -> Self {
        self.notification_cap = cap.max(1);
        self
    }

    fn documents(&self) -> SqliteDocumentRepository<'a> {
        SqliteDocumentRepository::new(self.conn)
    }

    /// Every document with its uploader's email, newest first.
    pub fn list_all(&self) -> ServiceResult<Vec<DocumentListing>> {
        Ok(self.documents().list()?)
    }

    pub fn get(&self, id: DocumentId) -> ServiceResult<DocumentListing> {
        self.documents()
            .get_listing(id)?
            .ok_or_else(|| not_found("document", id))
    }

    pub fn create_metadata(
        &self,
        actor: &Actor,
        request: &CreateDocumentRequest,
    ) -> ServiceResult<Document> {
        let title = required_text(&request.title, "title")?;
        validate_points_required(request.points_required)?;
        self.ensure_title_free(&title, None)?;
        self.ensure_category(request.category_id)?;

        let id = self.documents().create(&NewDocument {
            title,
            description: request.description.trim().to_string(),
            file_url: required_text(&request.file_url, "file url")?,
            file_type: request.file_type.trim().trim_start_matches('.').to_ascii_lowercase(),
            file_size: request.file_size.max(0),
            cover_image_url: DEFAULT_COVER_URL.to_string(),
            category_id: request.category_id,
            uploaded_by: actor.user_id,
            points_required: request.points_required,
        })?;
        info!("event=document_create module=service status=ok document_id={id}");
        self.documents().get(id)?.ok_or_else(|| not_found("document", id))
    }

    /// Stores the file, records the document, rewards the uploader, notifies
    /// followers, and checks the uploader badge, all in one commit.
    pub fn upload(
        &self,
        actor: &Actor,
        request: &UploadDocumentRequest,
    ) -> ServiceResult<UploadOutcome> {
        info!(
            "event=document_upload module=service status=start user_id={} category_id={}",
            actor.user_id, request.category_id
        );
        let title = required_text(&request.title, "title")?;
        validate_points_required(request.points_required)?;
        let category_name = self.ensure_category(request.category_id)?;
        self.ensure_title_free(&title, None)?;
        SqliteUserRepository::new(self.conn)
            .get(actor.user_id)?
            .ok_or_else(|| not_found("user", actor.user_id))?;

        let file = self.store.save_document(&request.file)?;
        let cover = match &request.cover {
            Some(cover) => match self.store.save_cover(cover) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    self.store.delete(&file.relative_url);
                    return Err(err.into());
                }
            },
            None => None,
        };

        let new_document = NewDocument {
            title,
            description: request.description.trim().to_string(),
            file_url: file.relative_url.clone(),
            file_type: file.file_type.clone(),
            file_size: file.size,
            cover_image_url: cover
                .as_ref()
                .map_or_else(|| DEFAULT_COVER_URL.to_string(), |c| c.relative_url.clone()),
            category_id: request.category_id,
            uploaded_by: actor.user_id,
            points_required: request.points_required,
        };

        match self.commit_upload(&new_document, &category_name) {
            Ok(outcome) => {
                info!(
                    "event=document_upload module=service status=ok user_id={} document_id={} notified={} badge_awarded={}",
                    actor.user_id,
                    outcome.document.id,
                    outcome.notified_followers,
                    outcome.badge_awarded
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    "event=document_upload module=service status=error user_id={} code={}",
                    actor.user_id,
                    err.code()
                );
                self.discard(&file, cover.as_ref());
                Err(err)
            }
        }
    }

    fn commit_upload(
        &self,
        new_document: &NewDocument,
        category_name: &str,
    ) -> ServiceResult<UploadOutcome> {
        let tx = write_transaction(self.conn)?;
        let uploader = new_document.uploaded_by;

        let documents = SqliteDocumentRepository::new(&tx);
        let document_id = documents.create(new_document)?;
        SqliteUserDocumentRepository::new(&tx).add(uploader, document_id, DocumentAction::Upload)?;
        let (points, level) =
            SqliteUserRepository::new(&tx).update_points(uploader, UPLOAD_REWARD_POINTS)?;

        let followers = SqliteFollowRepository::new(&tx)
            .followers_of_upload(uploader, new_document.category_id)?;
        let message = format!(
            "New document '{}' uploaded in {}.",
            new_document.title, category_name
        );
        for follower in &followers {
            push_capped(&tx, self.notification_cap, *follower, &message, Some(document_id))?;
        }
        info!(
            "event=notification_fanout module=service status=ok document_id={document_id} recipients={}",
            followers.len()
        );

        let upload_count = documents.count_by_uploader(uploader)?;
        let badge_awarded = award_on_threshold(&tx, uploader, &UPLOADER_BADGE, upload_count)?;

        let document = documents
            .get(document_id)?
            .ok_or_else(|| not_found("document", document_id))?;
        tx.commit()?;

        Ok(UploadOutcome {
            document,
            points,
            level,
            notified_followers: followers.len(),
            badge_awarded,
        })
    }

    /// Owner or admin may edit. Replaced files are removed after the commit.
    pub fn update(
        &self,
        actor: &Actor,
        id: DocumentId,
        request: &UpdateDocumentRequest,
    ) -> ServiceResult<Document> {
        let current = self
            .documents()
            .get(id)?
            .ok_or_else(|| not_found("document", id))?;
        require_owner_or_admin(actor, current.uploaded_by)?;

        let title = match request.title.as_deref() {
            Some(title) => {
                let title = required_text(title, "title")?;
                self.ensure_title_free(&title, Some(id))?;
                Some(title)
            }
            None => None,
        };
        if let Some(category_id) = request.category_id {
            self.ensure_category(category_id)?;
        }
        if let Some(points_required) = request.points_required {
            validate_points_required(points_required)?;
        }

        let file = match &request.file {
            Some(upload) => Some(self.store.save_document(upload)?),
            None => None,
        };
        let cover = match &request.cover {
            Some(upload) => match self.store.save_cover(upload) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    if let Some(file) = &file {
                        self.store.delete(&file.relative_url);
                    }
                    return Err(err.into());
                }
            },
            None => None,
        };

        let patch = DocumentPatch {
            title,
            description: request.description.as_deref().map(|d| d.trim().to_string()),
            category_id: request.category_id,
            points_required: request.points_required,
            file_url: file.as_ref().map(|f| f.relative_url.clone()),
            file_type: file.as_ref().map(|f| f.file_type.clone()),
            file_size: file.as_ref().map(|f| f.size),
            cover_image_url: cover.as_ref().map(|c| c.relative_url.clone()),
        };

        if let Err(err) = self.documents().update(id, &patch) {
            if let Some(file) = &file {
                self.store.delete(&file.relative_url);
            }
            if let Some(cover) = &cover {
                self.store.delete(&cover.relative_url);
            }
            return Err(err.into());
        }

        if file.is_some() {
            self.store.delete(&current.file_url);
        }
        if cover.is_some() {
            self.store.delete(&current.cover_image_url);
        }
        info!("event=document_update module=service status=ok document_id={id}");
        self.documents().get(id)?.ok_or_else(|| not_found("document", id))
    }

    /// Removes the row (dependent rows cascade) and then its files.
    pub fn delete(&self, actor: &Actor, id: DocumentId) -> ServiceResult<()> {
        let document = self
            .documents()
            .get(id)?
            .ok_or_else(|| not_found("document", id))?;
        require_owner_or_admin(actor, document.uploaded_by)?;

        self.documents().delete(id)?;
        self.store.delete(&document.file_url);
        self.store.delete(&document.cover_image_url);
        info!("event=document_delete module=service status=ok document_id={id}");
        Ok(())
    }

    /// Paged search over approved documents.
    pub fn search(&self, query: &DocumentSearchQuery) -> ServiceResult<DocumentPage> {
        if query.page < 1 {
            return Err(ServiceError::Validation("page must be at least 1".to_string()));
        }
        if query.page_size < 1 || query.page_size > MAX_PAGE_SIZE {
            return Err(ServiceError::Validation(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let (items, total) = self.documents().search_paged(query)?;
        Ok(DocumentPage {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    pub fn pending(&self, actor: &Actor) -> ServiceResult<Vec<DocumentListing>> {
        require_admin(actor)?;
        Ok(self.documents().list_pending()?)
    }

    pub fn approve(&self, actor: &Actor, id: DocumentId) -> ServiceResult<()> {
        require_admin(actor)?;
        let tx = write_transaction(self.conn)?;
        let documents = SqliteDocumentRepository::new(&tx);
        let document = documents
            .get(id)?
            .ok_or_else(|| not_found("document", id))?;
        documents.approve(id)?;
        push_capped(
            &tx,
            self.notification_cap,
            document.uploaded_by,
            &format!("Your document '{}' has been approved.", document.title),
            Some(id),
        )?;
        tx.commit()?;
        info!("event=document_approve module=service status=ok document_id={id}");
        Ok(())
    }

    pub fn set_lock(&self, actor: &Actor, id: DocumentId, locked: bool) -> ServiceResult<()> {
        require_admin(actor)?;
        let tx = write_transaction(self.conn)?;
        let documents = SqliteDocumentRepository::new(&tx);
        let document = documents
            .get(id)?
            .ok_or_else(|| not_found("document", id))?;
        documents.set_lock(id, locked)?;
        let verb = if locked { "locked" } else { "unlocked" };
        push_capped(
            &tx,
            self.notification_cap,
            document.uploaded_by,
            &format!("Your document '{}' has been {verb}.", document.title),
            Some(id),
        )?;
        tx.commit()?;
        info!("event=document_lock module=service status=ok document_id={id} locked={locked}");
        Ok(())
    }

    /// Charges the caller and returns the file.
    ///
    /// Approval, lock and file presence are checked up front. The balance is
    /// checked inside the write transaction, before any row changes.
    pub fn download(&self, actor: &Actor, id: DocumentId) -> ServiceResult<DownloadedFile> {
        let document = self.available_document(id)?;
        let bytes = self.store.read(&document.file_url)?;

        let tx = write_transaction(self.conn)?;
        let users = SqliteUserRepository::new(&tx);
        // Read under the write lock so concurrent downloads see each other's charge.
        let user = users
            .get(actor.user_id)?
            .ok_or_else(|| not_found("user", actor.user_id))?;
        if user.points < document.points_required {
            info!(
                "event=document_download module=service status=error document_id={id} user_id={} code=insufficient_points",
                user.id
            );
            return Err(ServiceError::InsufficientPoints {
                required: document.points_required,
                available: user.points,
            });
        }
        if document.points_required > 0 {
            users.update_points(user.id, -document.points_required)?;
        }
        SqliteDocumentRepository::new(&tx).increment_download_count(id)?;
        SqliteUserDocumentRepository::new(&tx).add(user.id, id, DocumentAction::Download)?;
        SqliteRecommendationRepository::new(&tx).record_interaction(user.id, id)?;
        tx.commit()?;

        info!(
            "event=document_download module=service status=ok document_id={id} user_id={} charged={}",
            user.id, document.points_required
        );
        Ok(DownloadedFile {
            bytes,
            content_type: format!("application/{}", document.file_type),
            file_name: format!("{}.{}", document.title, document.file_type),
        })
    }

    pub fn preview(&self, id: DocumentId) -> ServiceResult<Preview> {
        let document = self.available_document(id)?;
        if !document.file_type.eq_ignore_ascii_case("pdf") {
            return Ok(Preview::Unsupported {
                file_type: document.file_type,
            });
        }
        Ok(Preview::Pdf(self.store.read(&document.file_url)?))
    }

    /// Documents uploaded by `user_id`; the id must be positive.
    pub fn upload_count(&self, user_id: UserId) -> ServiceResult<UploadSummary> {
        if user_id <= 0 {
            return Err(ServiceError::Validation("invalid user id".to_string()));
        }
        let uploads = self.documents().list_by_uploader(user_id)?;
        Ok(UploadSummary {
            upload_count: uploads.len(),
            uploads,
        })
    }

    /// The most downloaded visible document, if any.
    pub fn top_downloaded(&self) -> ServiceResult<Option<DocumentListing>> {
        Ok(self.documents().top_downloaded(1)?.into_iter().next())
    }

    pub fn statistics(&self) -> ServiceResult<Statistics> {
        Ok(Statistics {
            total_users: SqliteUserRepository::new(self.conn).count()?,
            total_documents: self.documents().count()?,
            total_downloads: SqliteUserDocumentRepository::new(self.conn)
                .count_by_action(DocumentAction::Download)?,
        })
    }

    /// Visible documents sharing the category of `id`, most downloaded first.
    /// An unknown id yields an empty list.
    pub fn related(&self, id: DocumentId, count: Option<u32>) -> ServiceResult<Vec<DocumentListing>> {
        let Some(document) = self.documents().get(id)? else {
            return Ok(Vec::new());
        };
        let count = count.unwrap_or(DEFAULT_RELATED_COUNT).min(MAX_PAGE_SIZE);
        Ok(self.documents().related(&document, count)?)
    }

    fn available_document(&self, id: DocumentId) -> ServiceResult<Document> {
        let document = self
            .documents()
            .get(id)?
            .ok_or_else(|| not_found("document", id))?;
        let reason = if !document.is_approved {
            Some(UnavailableReason::NotApproved)
        } else if document.is_lock {
            Some(UnavailableReason::Locked)
        } else if !self.store.exists(&document.file_url) {
            Some(UnavailableReason::FileMissing)
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ServiceError::DocumentUnavailable { id, reason }),
            None => Ok(document),
        }
    }

    fn ensure_category(&self, category_id: CategoryId) -> ServiceResult<String> {
        SqliteCategoryRepository::new(self.conn)
            .get(category_id)?
            .map(|category| category.name)
            .ok_or_else(|| ServiceError::Validation(format!("unknown category {category_id}")))
    }

    fn ensure_title_free(&self, title: &str, except: Option<DocumentId>) -> ServiceResult<()> {
        match self.documents().get_by_title(title)? {
            Some(existing) if Some(existing.id) != except => Err(ServiceError::Conflict(
                "a document with this title already exists".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn discard(&self, file: &StoredFile, cover: Option<&StoredFile>) {
        self.store.delete(&file.relative_url);
        if let Some(cover) = cover {
            self.store.delete(&cover.relative_url);
        }
    }
}

fn validate_points_required(points_required: i64) -> ServiceResult<()> {
    if points_required < 0 {
        return Err(ServiceError::Validation(
            "points required cannot be negative".to_string(),
        ));
    }
    Ok(())
}

//! Shared documents and per-user document actions.
//!
//! # Responsibility
//! - Describe document metadata rows and the `user_documents` action ledger.
//! - Parse and normalize paged-search parameters.
//!
//! # Invariants
//! - Only approved documents are visible to search.
//! - A `(user_id, document_id, action)` triple exists at most once.

use crate::model::category::CategoryId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type DocumentId = i64;

/// Default number of related documents returned per lookup.
pub const DEFAULT_RELATED_COUNT: u32 = 4;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    /// Store-relative path such as `Files/<uuid>_<name>.pdf`.
    pub file_url: String,
    /// Lowercase extension without the dot.
    pub file_type: String,
    pub file_size: i64,
    pub cover_image_url: String,
    pub category_id: CategoryId,
    pub uploaded_by: UserId,
    pub uploaded_at: i64,
    pub download_count: i64,
    pub points_required: i64,
    pub is_approved: bool,
    pub is_lock: bool,
}

/// Insert payload for a document row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub cover_image_url: String,
    pub category_id: CategoryId,
    pub uploaded_by: UserId,
    pub points_required: i64,
}

/// Metadata patch. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub points_required: Option<i64>,
    pub file_url: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub cover_image_url: Option<String>,
}

/// Document row joined with display fields for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentListing {
    #[serde(flatten)]
    pub document: Document,
    pub category_name: String,
    pub uploader_email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentAction {
    Upload,
    Download,
    Library,
}

impl DocumentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Download => "Download",
            Self::Library => "Library",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Upload" => Some(Self::Upload),
            "Download" => Some(Self::Download),
            "Library" => Some(Self::Library),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    pub user_id: UserId,
    pub document_id: DocumentId,
    pub action: DocumentAction,
    pub added_at: i64,
}

/// `UserDocument` row with the document it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDocumentEntry {
    pub action: DocumentAction,
    pub added_at: i64,
    pub document: Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DocumentSort {
    #[default]
    UploadedAtDesc,
    UploadedAtAsc,
    DownloadCountDesc,
    TitleAsc,
    TitleDesc,
}

impl DocumentSort {
    /// Parses a sort key case-insensitively. Unknown keys fall back to the
    /// newest-first default; `UploadAt` is accepted as an alias.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "uploadedat_asc" | "uploadat_asc" => Self::UploadedAtAsc,
            "downloadcount_desc" => Self::DownloadCountDesc,
            "title_asc" => Self::TitleAsc,
            "title_desc" => Self::TitleDesc,
            _ => Self::UploadedAtDesc,
        }
    }

    pub(crate) fn order_by_sql(self) -> &'static str {
        match self {
            Self::UploadedAtDesc => "d.uploaded_at DESC, d.id DESC",
            Self::UploadedAtAsc => "d.uploaded_at ASC, d.id ASC",
            Self::DownloadCountDesc => "d.download_count DESC, d.id DESC",
            Self::TitleAsc => "d.title COLLATE NOCASE ASC, d.id ASC",
            Self::TitleDesc => "d.title COLLATE NOCASE DESC, d.id DESC",
        }
    }
}

/// Paged search request over approved documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSearchQuery {
    pub keyword: Option<String>,
    pub category_id: Option<CategoryId>,
    pub file_type: Option<String>,
    pub sort: DocumentSort,
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
}

impl Default for DocumentSearchQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            category_id: None,
            file_type: None,
            sort: DocumentSort::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DocumentSearchQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentPage {
    pub items: Vec<DocumentListing>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Site-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total_users: i64,
    pub total_documents: i64,
    pub total_downloads: i64,
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentAction, DocumentListing, DocumentSearchQuery, DocumentSort};

    #[test]
    fn sort_parse_defaults_to_newest_first() {
        assert_eq!(DocumentSort::parse(None), DocumentSort::UploadedAtDesc);
        assert_eq!(DocumentSort::parse(Some("bogus")), DocumentSort::UploadedAtDesc);
        assert_eq!(
            DocumentSort::parse(Some("UploadAt_desc")),
            DocumentSort::UploadedAtDesc
        );
    }

    #[test]
    fn sort_parse_accepts_known_keys_case_insensitively() {
        assert_eq!(
            DocumentSort::parse(Some("UploadedAt_Asc")),
            DocumentSort::UploadedAtAsc
        );
        assert_eq!(DocumentSort::parse(Some("uploadat_asc")), DocumentSort::UploadedAtAsc);
        assert_eq!(
            DocumentSort::parse(Some("DownloadCount_desc")),
            DocumentSort::DownloadCountDesc
        );
        assert_eq!(DocumentSort::parse(Some("title_asc")), DocumentSort::TitleAsc);
        assert_eq!(DocumentSort::parse(Some(" TITLE_DESC ")), DocumentSort::TitleDesc);
    }

    #[test]
    fn offset_uses_one_based_pages() {
        let mut query = DocumentSearchQuery {
            page: 3,
            page_size: 20,
            ..DocumentSearchQuery::default()
        };
        assert_eq!(query.offset(), 40);
        query.page = 0;
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn action_parse_rejects_unknown_text() {
        assert_eq!(DocumentAction::parse("Library"), Some(DocumentAction::Library));
        assert_eq!(DocumentAction::parse("library"), None);
    }

    #[test]
    fn listing_serializes_document_fields_inline() {
        let listing = DocumentListing {
            document: Document {
                id: 3,
                title: "Algebra".to_string(),
                description: String::new(),
                file_url: "Files/a.pdf".to_string(),
                file_type: "pdf".to_string(),
                file_size: 12,
                cover_image_url: "ImageCovers/cat.jpg".to_string(),
                category_id: 1,
                uploaded_by: 2,
                uploaded_at: 0,
                download_count: 0,
                points_required: 5,
                is_approved: true,
                is_lock: false,
            },
            category_name: "Math".to_string(),
            uploader_email: "a@example.com".to_string(),
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["title"], "Algebra");
        assert_eq!(value["category_name"], "Math");
        assert!(value.get("document").is_none());
    }
}

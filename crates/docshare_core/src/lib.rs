//! Core domain logic for the docshare document-sharing backend.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::{Actor, Level};
pub use repo::{RepoError, RepoResult};
pub use service::badge_service::{award_on_threshold, BadgeService};
pub use service::category_service::CategoryService;
pub use service::comment_service::CommentService;
pub use service::document_service::{
    CreateDocumentRequest, DocumentService, DownloadedFile, Preview, UpdateDocumentRequest,
    UploadDocumentRequest, UploadOutcome, UPLOAD_REWARD_POINTS,
};
pub use service::follow_service::FollowService;
pub use service::library_service::LibraryService;
pub use service::notification_service::{push_capped, NotificationService};
pub use service::post_service::PostService;
pub use service::recommendation_service::RecommendationService;
pub use service::user_service::{RegisterRequest, UserService};
pub use service::{ServiceError, ServiceResult, UnavailableReason};
pub use storage::{FileStore, StorageError, StoredFile, UploadFile};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Validate caller input and authorization before touching storage.
//! - Orchestrate multi-table sequences (upload, download, fan-out) inside one
//!   write transaction.
//!
//! # Invariants
//! - Every service API returns `ServiceResult`; raw SQLite errors never leak
//!   past this layer untyped.
//! - Admin-only and owner-or-admin checks happen before any write.

use crate::db::DbError;
use crate::model::user::{Actor, UserId};
use crate::repo::RepoError;
use crate::storage::StorageError;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub mod badge_service;
pub mod category_service;
pub mod comment_service;
pub mod document_service;
pub mod follow_service;
pub mod library_service;
pub mod notification_service;
pub mod post_service;
pub mod recommendation_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why a download or preview was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    NotApproved,
    Locked,
    FileMissing,
}

impl Display for UnavailableReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotApproved => "not approved",
            Self::Locked => "locked",
            Self::FileMissing => "file missing on server",
        })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("insufficient points: required {required}, available {available}")]
    InsufficientPoints { required: i64, available: i64 },
    #[error("document {id} is unavailable: {reason}")]
    DocumentUnavailable { id: i64, reason: UnavailableReason },
    #[error(transparent)]
    Repo(RepoError),
    #[error(transparent)]
    Storage(StorageError),
}

impl ServiceError {
    /// Stable machine-readable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::InsufficientPoints { .. } => "insufficient_points",
            Self::DocumentUnavailable { .. } => "document_unavailable",
            Self::Repo(_) => "repository",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Constraint(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::RejectedExtension { .. }
            | StorageError::EmptyUpload(_)
            | StorageError::UnsafePath(_) => Self::Validation(value.to_string()),
            io @ StorageError::Io { .. } => Self::Storage(io),
        }
    }
}

pub(crate) fn require_admin(actor: &Actor) -> ServiceResult<()> {
    if actor.is_admin {
        return Ok(());
    }
    Err(ServiceError::Forbidden("admin role required".to_string()))
}

pub(crate) fn require_owner_or_admin(actor: &Actor, owner: UserId) -> ServiceResult<()> {
    if actor.can_act_for(owner) {
        return Ok(());
    }
    Err(ServiceError::Forbidden(
        "only the owner or an admin may do this".to_string(),
    ))
}

/// Trims `value` and rejects it when blank.
pub(crate) fn required_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn not_found(entity: &'static str, id: i64) -> ServiceError {
    ServiceError::NotFound { entity, id }
}

#[cfg(test)]
mod tests {
    use super::{required_text, ServiceError};
    use crate::repo::RepoError;
    use crate::storage::StorageError;

    #[test]
    fn repo_errors_map_to_semantic_variants() {
        let not_found: ServiceError = RepoError::NotFound {
            entity: "user",
            id: 7,
        }
        .into();
        assert_eq!(not_found.code(), "not_found");

        let conflict: ServiceError = RepoError::Constraint("UNIQUE".to_string()).into();
        assert_eq!(conflict.code(), "conflict");

        let invalid: ServiceError = RepoError::InvalidData("bad".to_string()).into();
        assert_eq!(invalid.code(), "repository");
    }

    #[test]
    fn rejected_uploads_are_validation_errors() {
        let err: ServiceError = StorageError::EmptyUpload("a.pdf".to_string()).into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("  title ", "title").unwrap(), "title");
        assert!(matches!(
            required_text("   ", "title"),
            Err(ServiceError::Validation(_))
        ));
    }
}

//! Filesystem storage for uploaded documents and cover images.
//!
//! # Responsibility
//! - Validate upload names and payloads before anything touches disk.
//! - Map store-relative urls (`Files/...`, `ImageCovers/...`) to paths under
//!   one root directory.
//!
//! # Invariants
//! - Relative urls never escape the store root.
//! - The default cover is shared by many documents and is never deleted.

use std::path::PathBuf;
use thiserror::Error;

mod file_store;

pub use file_store::{FileStore, StoredFile, UploadFile};

pub const DOCUMENTS_DIR: &str = "Files";
pub const COVERS_DIR: &str = "ImageCovers";
pub const DEFAULT_COVER_URL: &str = "ImageCovers/cat.jpg";

pub const ALLOWED_DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];
pub const ALLOWED_COVER_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "tiff", "tif", "heic", "heif"];

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io failure at `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("file extension `{extension}` is not allowed; expected one of {allowed}")]
    RejectedExtension { extension: String, allowed: String },
    #[error("uploaded file `{0}` is empty")]
    EmptyUpload(String),
    #[error("unsafe storage path `{0}`")]
    UnsafePath(String),
}

/// Lowercase extension of `file_name` without the dot, if it has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    let base = base_name(file_name);
    let (stem, extension) = base.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Final path component of a client-supplied name, accepting either separator.
pub(crate) fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

pub(crate) fn check_extension(file_name: &str, allowed: &[&str]) -> StorageResult<String> {
    let extension = file_extension(file_name).unwrap_or_default();
    if allowed.contains(&extension.as_str()) {
        return Ok(extension);
    }
    Err(StorageError::RejectedExtension {
        extension,
        allowed: allowed.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        base_name, check_extension, file_extension, StorageError, ALLOWED_COVER_EXTENSIONS,
        ALLOWED_DOCUMENT_EXTENSIONS,
    };

    #[test]
    fn extension_is_lowercased_and_dotless() {
        assert_eq!(file_extension("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(".hidden"), None);
    }

    #[test]
    fn base_name_strips_client_directories() {
        assert_eq!(base_name("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(base_name("../../etc/passwd"), "passwd");
        assert_eq!(base_name("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn document_extensions_are_whitelisted() {
        assert_eq!(check_extension("a.DOCX", ALLOWED_DOCUMENT_EXTENSIONS).unwrap(), "docx");
        assert!(matches!(
            check_extension("a.exe", ALLOWED_DOCUMENT_EXTENSIONS),
            Err(StorageError::RejectedExtension { .. })
        ));
        assert!(check_extension("cover.HEIC", ALLOWED_COVER_EXTENSIONS).is_ok());
        assert!(check_extension("cover.pdf", ALLOWED_COVER_EXTENSIONS).is_err());
    }
}

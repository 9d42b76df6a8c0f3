use crate::storage::{
    base_name, check_extension, StorageError, StorageResult, ALLOWED_COVER_EXTENSIONS,
    ALLOWED_DOCUMENT_EXTENSIONS, COVERS_DIR, DEFAULT_COVER_URL, DOCUMENTS_DIR,
};
use log::{info, warn};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Client-supplied file: original name plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of persisting an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Store-relative url with forward slashes, e.g. `Files/<uuid>_report.pdf`.
    pub relative_url: String,
    /// Lowercase extension without the dot.
    pub file_type: String,
    pub size: i64,
}

/// Filesystem-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Saves a `.pdf`, `.docx` or `.txt` upload under `Files/`.
    pub fn save_document(&self, upload: &UploadFile) -> StorageResult<StoredFile> {
        self.save_into(DOCUMENTS_DIR, upload, ALLOWED_DOCUMENT_EXTENSIONS)
    }

    /// Saves an image upload under `ImageCovers/`.
    pub fn save_cover(&self, upload: &UploadFile) -> StorageResult<StoredFile> {
        self.save_into(COVERS_DIR, upload, ALLOWED_COVER_EXTENSIONS)
    }

    pub fn read(&self, relative_url: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(relative_url)?;
        std::fs::read(&path).map_err(|source| StorageError::Io { path, source })
    }

    /// Whether the url is safe and names an existing regular file.
    pub fn exists(&self, relative_url: &str) -> bool {
        self.resolve(relative_url)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Best-effort removal. Missing files and failures are logged, never
    /// returned; the default cover is skipped.
    pub fn delete(&self, relative_url: &str) {
        if relative_url == DEFAULT_COVER_URL || relative_url.trim().is_empty() {
            return;
        }
        let path = match self.resolve(relative_url) {
            Ok(path) => path,
            Err(err) => {
                warn!("event=file_delete module=storage status=error error={err}");
                return;
            }
        };
        match std::fs::remove_file(&path) {
            Ok(()) => info!("event=file_delete module=storage status=ok"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                "event=file_delete module=storage status=error path={} error={err}",
                path.display()
            ),
        }
    }

    fn save_into(
        &self,
        dir: &str,
        upload: &UploadFile,
        allowed: &[&str],
    ) -> StorageResult<StoredFile> {
        let file_type = check_extension(&upload.file_name, allowed)?;
        if upload.bytes.is_empty() {
            return Err(StorageError::EmptyUpload(base_name(&upload.file_name).to_string()));
        }

        let target_dir = self.root.join(dir);
        std::fs::create_dir_all(&target_dir).map_err(|source| StorageError::Io {
            path: target_dir.clone(),
            source,
        })?;

        let stored_name = format!("{}_{}", Uuid::new_v4(), base_name(&upload.file_name));
        let path = target_dir.join(&stored_name);
        std::fs::write(&path, &upload.bytes).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            "event=file_save module=storage status=ok dir={dir} file_type={file_type} size={}",
            upload.bytes.len()
        );
        Ok(StoredFile {
            relative_url: format!("{dir}/{stored_name}"),
            file_type,
            size: i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX),
        })
    }

    fn resolve(&self, relative_url: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(relative_url.trim());
        let is_plain = !relative_url.trim().is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::UnsafePath(relative_url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStore, UploadFile};
    use crate::storage::{StorageError, DEFAULT_COVER_URL};

    #[test]
    fn resolve_rejects_traversal_and_absolute_paths() {
        let store = FileStore::new("/tmp/docshare-store");
        assert!(matches!(
            store.read("../secret.txt"),
            Err(StorageError::UnsafePath(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd"),
            Err(StorageError::UnsafePath(_))
        ));
        assert!(matches!(store.read(""), Err(StorageError::UnsafePath(_))));
    }

    #[test]
    fn empty_upload_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store
            .save_document(&UploadFile::new("empty.pdf", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, StorageError::EmptyUpload(_)));
        assert!(!dir.path().join("Files").exists());
    }

    #[test]
    fn default_cover_survives_delete() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join(DEFAULT_COVER_URL);
        std::fs::create_dir_all(cover.parent().unwrap()).unwrap();
        std::fs::write(&cover, b"cat").unwrap();

        let store = FileStore::new(dir.path());
        store.delete(DEFAULT_COVER_URL);
        assert!(cover.exists());
    }
}

//! Attachment files on local disk.
//!
//! Files live flat in the upload directory as `<uuid>-<original name>` and are
//! published under `/uploads/`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use shared::Attachment;
use uuid::Uuid;

use crate::error::Result;

/// URL prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub url: String,
    pub size: i64,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile> {
        self.ensure_dir().await?;
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        tracing::debug!(file = %stored_name, size = bytes.len(), "stored upload");
        Ok(StoredFile {
            url: format!("{UPLOADS_ROUTE}/{stored_name}"),
            size: bytes.len() as i64,
        })
    }

    /// Map a public URL back to a path inside the upload directory.
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOADS_ROUTE)?.trim_start_matches('/');
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == ".." {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Delete the file behind `url`. A file that is already gone is not an error.
    pub async fn remove(&self, url: &str) -> Result<()> {
        let Some(path) = self.path_for_url(url) else {
            tracing::warn!(url, "attachment url outside upload directory");
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the files of deleted attachments, logging failures.
    pub async fn remove_all(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = self.remove(&attachment.file_url).await {
                tracing::warn!(file = %attachment.file_url, error = %e, "failed to remove attachment file");
            }
        }
    }
}

/// Keep only the final path component and drop characters that are awkward
/// in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// MIME type from the upload if given, otherwise guessed from the extension.
pub fn mime_type_for(name: &str, declared: Option<&str>) -> String {
    match declared {
        Some(declared) if !declared.is_empty() => declared.to_string(),
        _ => mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\my file.txt"), "my_file.txt");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for("a.png", None), "image/png");
        assert_eq!(mime_type_for("a.png", Some("text/plain")), "text/plain");
        assert_eq!(mime_type_for("blob", None), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path().join("uploads"));

        let stored = store.save("notes.txt", b"hello").await.unwrap();
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with("-notes.txt"));
        assert_eq!(stored.size, 5);

        let path = store.path_for_url(&stored.url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        store.remove(&stored.url).await.unwrap();
        assert!(!path.exists());
        store.remove(&stored.url).await.unwrap();
    }

    #[test]
    fn test_path_for_url_rejects_escapes() {
        let store = UploadStore::new("/srv/uploads");
        assert!(store.path_for_url("/uploads/../secret").is_none());
        assert!(store.path_for_url("/elsewhere/file").is_none());
        assert_eq!(
            store.path_for_url("/uploads/a.txt"),
            Some(PathBuf::from("/srv/uploads/a.txt"))
        );
    }
}

//! Internal module for writing attachments to disk.

use crate::error::{Error, Result};
use crate::gateway::Attachment;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fallback name for attachments whose part carried no usable filename.
const UNNAMED_ATTACHMENT: &str = "attachment.bin";

/// Writes an attachment into `dir`, creating the directory (and all
/// ancestors) if absent.
///
/// An existing file at the destination is overwritten: last write wins, and
/// two attachments with the same name in the same directory collapse to one
/// file. Integrators needing a collision policy should rename before saving.
pub(crate) fn save_attachment(attachment: &Attachment, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(safe_filename(&attachment.filename));

    fs::write(&path, &attachment.content).map_err(|source| Error::SaveAttachment {
        path: path.clone(),
        source,
    })?;

    debug!(
        path = %path.display(),
        bytes = attachment.content.len(),
        "Saved attachment"
    );

    Ok(path)
}

/// Keeps the written file inside the destination directory.
///
/// Path separators are replaced and an empty name gets a stable placeholder;
/// everything else is preserved as sent.
fn safe_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        UNNAMED_ATTACHMENT.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_creates_directory_tree() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("RQ").join("12345");

        let att = Attachment::new("a.pdf", b"content".to_vec());
        let path = save_attachment(&att, &dest).unwrap();

        assert_eq!(path, dest.join("a.pdf"));
        assert_eq!(fs::read(&path).unwrap(), b"content");
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempdir().unwrap();

        let first = Attachment::new("a.pdf", b"old".to_vec());
        let second = Attachment::new("a.pdf", b"new".to_vec());

        save_attachment(&first, dir.path()).unwrap();
        let path = save_attachment(&second, dir.path()).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_path_separators_are_neutralized() {
        let dir = tempdir().unwrap();

        let att = Attachment::new("../escape.txt", b"x".to_vec());
        let path = save_attachment(&att, dir.path()).unwrap();

        assert_eq!(path.parent().unwrap(), dir.path());
        assert_eq!(path.file_name().unwrap(), ".._escape.txt");
    }

    #[test]
    fn test_empty_filename_gets_placeholder() {
        let dir = tempdir().unwrap();

        let att = Attachment::new("", b"x".to_vec());
        let path = save_attachment(&att, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), UNNAMED_ATTACHMENT);
    }

    #[test]
    fn test_unwritable_destination_is_storage_error() {
        let dir = tempdir().unwrap();
        // A file where the directory should go
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();

        let att = Attachment::new("a.pdf", b"x".to_vec());
        let err = save_attachment(&att, &blocker).unwrap_err();

        assert_eq!(err.category(), crate::error::ErrorCategory::Storage);
        assert!(!err.is_fatal());
    }
}

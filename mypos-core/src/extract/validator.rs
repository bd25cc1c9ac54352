//! Per-file validation
//!
//! Checks run in a fixed order: extension, metadata, size, readability. The
//! first failing check decides the reason. Nothing here touches the file
//! beyond `stat` and `open`.

use super::category::Category;
use super::config::{normalize_extension, ResolvedRules};
use super::record::{RejectReason, RejectedFile};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A file that passed validation and is ready to be hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub path: PathBuf,
    pub category: Category,
    pub size_bytes: u64,
    pub extension: String,
}

/// Lower-cased extension of `path` with a leading dot, if it has one
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(normalize_extension)
}

/// Validate `path` against `rules`.
///
/// Rejections carry `path` exactly as given; the scanner passes absolute paths
/// and rewrites them relative to the root afterwards.
pub fn validate(
    path: &Path,
    category: Category,
    rules: &ResolvedRules,
) -> std::result::Result<ValidatedFile, RejectedFile> {
    let extension = file_extension(path);
    let reject = |reason| RejectedFile::new(path, category, reason).with_extension(extension.clone());

    let ext = match extension.as_deref() {
        Some(ext) if rules.allows_extension(ext) => ext.to_string(),
        _ => return Err(reject(RejectReason::UnsupportedExtension)),
    };

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => return Err(reject(RejectReason::Unreadable).with_detail(e.to_string())),
    };

    if !metadata.is_file() {
        return Err(reject(RejectReason::Unreadable).with_detail("not a regular file"));
    }

    let size = metadata.len();
    if size == 0 {
        return Err(reject(RejectReason::EmptyFile).with_size(0));
    }
    if size > rules.max_size_bytes {
        return Err(reject(RejectReason::FileTooLarge).with_size(size));
    }

    if let Err(e) = File::open(path) {
        return Err(reject(RejectReason::Unreadable)
            .with_size(size)
            .with_detail(e.to_string()));
    }

    Ok(ValidatedFile {
        path: path.to_path_buf(),
        category,
        size_bytes: size,
        extension: ext,
    })
}

/// Cheap re-check used for misplaced-file suggestions: extension and size only
pub fn would_accept(extension: Option<&str>, size_bytes: Option<u64>, rules: &ResolvedRules) -> bool {
    let ext_ok = extension.map(|e| rules.allows_extension(e)).unwrap_or(false);
    let size_ok = size_bytes
        .map(|s| s > 0 && s <= rules.max_size_bytes)
        .unwrap_or(false);
    ext_ok && size_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn rules(max: u64) -> ResolvedRules {
        ResolvedRules {
            allowed_extensions: vec![".markdown".into(), ".md".into()],
            max_size_bytes: max,
        }
    }

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn test_accepts_markdown() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.md", b"# Title\n");

        let validated = validate(&path, Category::Note, &rules(100)).unwrap();
        assert_eq!(validated.size_bytes, 8);
        assert_eq!(validated.extension, ".md");
        assert_eq!(validated.category, Category::Note);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "A.MarkDown", b"text");

        let validated = validate(&path, Category::Document, &rules(100)).unwrap();
        assert_eq!(validated.extension, ".markdown");
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "report.txt", b"text");

        let rejected = validate(&path, Category::Document, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::UnsupportedExtension);
        assert_eq!(rejected.extension.as_deref(), Some(".txt"));
    }

    #[test]
    fn test_rejects_missing_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "README", b"text");

        let rejected = validate(&path, Category::Document, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::UnsupportedExtension);
        assert!(rejected.extension.is_none());
    }

    #[test]
    fn test_extension_checked_before_size() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.txt", b"");

        let rejected = validate(&path, Category::Note, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::UnsupportedExtension);
    }

    #[test]
    fn test_rejects_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.md", b"");

        let rejected = validate(&path, Category::Conversation, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::EmptyFile);
        assert_eq!(rejected.size_bytes, Some(0));
    }

    #[test]
    fn test_size_boundary() {
        let dir = TempDir::new().unwrap();
        let exact = write(&dir, "exact.md", &[b'x'; 64]);
        let over = write(&dir, "over.md", &[b'x'; 65]);

        assert!(validate(&exact, Category::Note, &rules(64)).is_ok());

        let rejected = validate(&over, Category::Note, &rules(64)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::FileTooLarge);
        assert_eq!(rejected.size_bytes, Some(65));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.md");

        let rejected = validate(&path, Category::Note, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::Unreadable);
        assert!(rejected.detail.is_some());
    }

    #[test]
    fn test_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.md");
        fs::create_dir(&path).unwrap();

        let rejected = validate(&path, Category::Note, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::Unreadable);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("dangling.md");
        std::os::unix::fs::symlink(dir.path().join("nowhere.md"), &link).unwrap();

        let rejected = validate(&link, Category::Note, &rules(100)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::Unreadable);
    }

    #[test]
    fn test_would_accept() {
        let r = rules(10);
        assert!(would_accept(Some(".md"), Some(10), &r));
        assert!(!would_accept(Some(".md"), Some(11), &r));
        assert!(!would_accept(Some(".txt"), Some(5), &r));
        assert!(!would_accept(None, Some(5), &r));
        assert!(!would_accept(Some(".md"), None, &r));
    }
}

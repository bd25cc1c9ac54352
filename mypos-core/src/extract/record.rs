use super::category::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An accepted, hashed source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the scan root
    pub path: PathBuf,
    pub category: Category,
    /// Byte length at scan time
    pub size_bytes: u64,
    /// SHA-256 of the full content (lowercase hex)
    pub content_hash: String,
    /// Lower-cased extension including the leading dot
    pub extension: String,
}

/// Why a candidate file was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RejectReason {
    UnsupportedExtension,
    EmptyFile,
    FileTooLarge,
    Unreadable,
}

impl RejectReason {
    pub fn description(&self) -> &'static str {
        match self {
            RejectReason::UnsupportedExtension => "unsupported extension",
            RejectReason::EmptyFile => "empty file",
            RejectReason::FileTooLarge => "file too large",
            RejectReason::Unreadable => "unreadable",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A candidate that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedFile {
    /// Path relative to the scan root
    pub path: PathBuf,
    pub category: Category,
    pub reason: RejectReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Underlying I/O error text, for `Unreadable`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Another category whose rules would accept this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_category: Option<Category>,
}

impl RejectedFile {
    pub fn new(path: impl Into<PathBuf>, category: Category, reason: RejectReason) -> Self {
        Self {
            path: path.into(),
            category,
            reason,
            size_bytes: None,
            extension: None,
            detail: None,
            suggested_category: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_suggestion(mut self, category: Option<Category>) -> Self {
        self.suggested_category = category;
        self
    }
}

/// A file whose content matched an already accepted record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateFile {
    /// Path relative to the scan root
    pub path: PathBuf,
    pub category: Category,
    pub content_hash: String,
    /// Path of the record that was kept
    pub original: PathBuf,
}

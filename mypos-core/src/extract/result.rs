use super::category::Category;
use super::record::{DuplicateFile, FileRecord, RejectReason, RejectedFile};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output of one scan: accepted records, rejections and duplicates, each in
/// traversal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Canonical scan root; record paths are relative to it
    pub root: PathBuf,
    records: Vec<FileRecord>,
    rejected: Vec<RejectedFile>,
    duplicates: Vec<DuplicateFile>,
    /// Set when the scan stopped scheduling files before reaching the end
    pub cancelled: bool,
}

/// Summary counts for a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub accepted: BTreeMap<Category, usize>,
    pub rejected: BTreeMap<RejectReason, usize>,
    pub duplicates: usize,
    pub total_bytes: u64,
}

impl ScanStats {
    pub fn accepted_total(&self) -> usize {
        self.accepted.values().sum()
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

impl ScanResult {
    pub(crate) fn new(
        root: PathBuf,
        records: Vec<FileRecord>,
        rejected: Vec<RejectedFile>,
        duplicates: Vec<DuplicateFile>,
        cancelled: bool,
    ) -> Self {
        Self {
            root,
            records,
            rejected,
            duplicates,
            cancelled,
        }
    }

    /// Unique accepted records
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Files that failed validation
    pub fn rejected(&self) -> &[RejectedFile] {
        &self.rejected
    }

    /// Files dropped because their content was already accepted
    pub fn duplicates(&self) -> &[DuplicateFile] {
        &self.duplicates
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Records of one category, in traversal order
    pub fn records_in(&self, category: Category) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Rejected files for which another category was suggested
    pub fn misplaced(&self) -> impl Iterator<Item = &RejectedFile> {
        self.rejected.iter().filter(|r| r.suggested_category.is_some())
    }

    /// Look up a record by content hash
    pub fn find_by_hash(&self, hash: &str) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.content_hash == hash)
    }

    /// Join a root-relative path onto the scan root
    pub fn absolute_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected.is_empty() && self.duplicates.is_empty()
    }

    pub fn stats(&self) -> ScanStats {
        let mut stats = ScanStats::default();

        for category in Category::ALL {
            stats.accepted.insert(category, 0);
        }
        for record in &self.records {
            *stats.accepted.entry(record.category).or_default() += 1;
            stats.total_bytes += record.size_bytes;
        }
        for rejected in &self.rejected {
            *stats.rejected.entry(rejected.reason).or_default() += 1;
        }
        stats.duplicates = self.duplicates.len();

        stats
    }

    /// Export to pretty JSON for the Transform stage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, category: Category, hash: &str, size: u64) -> FileRecord {
        FileRecord {
            path: PathBuf::from(path),
            category,
            size_bytes: size,
            content_hash: hash.to_string(),
            extension: ".md".to_string(),
        }
    }

    fn sample() -> ScanResult {
        ScanResult::new(
            PathBuf::from("/input"),
            vec![
                record("conversations/c.md", Category::Conversation, "aa", 10),
                record("notes/a.md", Category::Note, "bb", 20),
                record("notes/b.md", Category::Note, "cc", 30),
            ],
            vec![
                RejectedFile::new("documents/r.txt", Category::Document, RejectReason::UnsupportedExtension),
                RejectedFile::new("notes/big.md", Category::Note, RejectReason::FileTooLarge)
                    .with_suggestion(Some(Category::Document)),
            ],
            vec![DuplicateFile {
                path: PathBuf::from("notes/sub/a.md"),
                category: Category::Note,
                content_hash: "bb".to_string(),
                original: PathBuf::from("notes/a.md"),
            }],
            false,
        )
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.accepted[&Category::Note], 2);
        assert_eq!(stats.accepted[&Category::Document], 0);
        assert_eq!(stats.accepted_total(), 3);
        assert_eq!(stats.rejected_total(), 2);
        assert_eq!(stats.rejected[&RejectReason::FileTooLarge], 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.total_bytes, 60);
    }

    #[test]
    fn test_records_in_category() {
        let result = sample();
        let notes: Vec<_> = result.records_in(Category::Note).map(|r| r.path.clone()).collect();
        assert_eq!(notes, vec![PathBuf::from("notes/a.md"), PathBuf::from("notes/b.md")]);
    }

    #[test]
    fn test_misplaced_and_lookup() {
        let result = sample();
        assert_eq!(result.misplaced().count(), 1);
        assert_eq!(
            result.find_by_hash("cc").map(|r| r.path.as_path()),
            Some(Path::new("notes/b.md"))
        );
        assert_eq!(result.absolute_path(Path::new("notes/a.md")), PathBuf::from("/input/notes/a.md"));
    }

    #[test]
    fn test_json_export() {
        let result = sample();
        let json = result.to_json().unwrap();
        assert!(json.contains("\"content_hash\": \"bb\""));
        assert!(json.contains("\"original\": \"notes/a.md\""));

        let parsed = ScanResult::from_json(&json).unwrap();
        assert_eq!(parsed, result);
    }
}

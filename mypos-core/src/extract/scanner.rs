//! Directory scanner
//!
//! Walks the three category directories under the root in name order, runs
//! every candidate through validation and hashing on a rayon pool, then folds
//! the per-file outcomes back in discovery order so the first copy of any
//! content always wins.

use super::category::{classify, Category};
use super::config::{ResolvedRules, ScanConfig};
use super::hasher::hash_file_with_size;
use super::record::{DuplicateFile, FileRecord, RejectReason, RejectedFile};
use super::result::ScanResult;
use super::validator::{validate, would_accept, ValidatedFile};
use crate::{ExtractError, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Shared flag that stops a running scan from scheduling further files.
///
/// Files already being validated or hashed finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Something found while walking, in traversal order
#[derive(Debug)]
enum Discovered {
    File { path: PathBuf, category: Category },
    /// Rejected during the walk (walker error or unrepresentable path)
    Rejected(RejectedFile),
}

/// Result of processing one discovered entry
#[derive(Debug)]
enum Outcome {
    Accepted(FileRecord),
    Rejected(RejectedFile),
    Skipped,
}

/// Scans a root directory into a [`ScanResult`]
#[derive(Debug)]
pub struct Scanner {
    root: PathBuf,
    config: ScanConfig,
    rules: BTreeMap<Category, ResolvedRules>,
    cancel: Option<CancelFlag>,
}

impl Scanner {
    /// Create a scanner; fails if the configuration is unusable
    pub fn new(root: impl Into<PathBuf>, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let rules = config.rule_table();

        Ok(Self {
            root: root.into(),
            config,
            rules,
            cancel: None,
        })
    }

    /// Attach a cancellation flag
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Run the scan
    pub fn scan(&self) -> Result<ScanResult> {
        let root = resolve_root(&self.root)?;
        tracing::info!("Scanning directory: {:?}", root);

        let discovered = self.discover(&root)?;
        tracing::info!("Found {} candidate files", discovered.len());

        let outcomes = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| self.process_all(&discovered, &root))
            }
            None => self.process_all(&discovered, &root),
        };

        let result = self.assemble(root, outcomes);
        let stats = result.stats();

        if result.cancelled {
            tracing::warn!("Scan cancelled before all files were processed");
        }
        tracing::info!(
            "Accepted {} files ({} bytes), rejected {}, {} duplicates",
            stats.accepted_total(),
            stats.total_bytes,
            stats.rejected_total(),
            stats.duplicates
        );

        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|c| c.is_cancelled()).unwrap_or(false)
    }

    /// Walk the category directories in name order
    fn discover(&self, root: &Path) -> Result<Vec<Discovered>> {
        let mut discovered = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() != 1
                    || e.file_name()
                        .to_str()
                        .and_then(Category::from_dir_name)
                        .is_some()
            });

        for entry in walker {
            if self.is_cancelled() {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        tracing::warn!(
                            "Skipping filesystem loop at {:?} (points back to {:?})",
                            err.path(),
                            ancestor
                        );
                        continue;
                    }
                    let Some(path) = err.path() else {
                        tracing::warn!("Walk error without path: {}", err);
                        continue;
                    };
                    if path == root {
                        return Err(ExtractError::invalid_root(root, err.to_string()));
                    }
                    match walk_error_category(path, root) {
                        Some(category) => {
                            tracing::warn!("Cannot read {:?}: {}", path, err);
                            let rejected = RejectedFile::new(
                                lossy_relative(path, root),
                                category,
                                RejectReason::Unreadable,
                            )
                            .with_detail(err.to_string());
                            discovered.push(Discovered::Rejected(rejected));
                        }
                        None => {
                            tracing::debug!("Walk error outside category directories at {:?}: {}", path, err)
                        }
                    }
                    continue;
                }
            };

            let Some(category) = classify(entry.path(), root) else {
                continue;
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            if file_type.is_symlink() {
                // Only reached when links are not followed
                if fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false) {
                    tracing::debug!("Not following symlinked directory {:?}", entry.path());
                    continue;
                }
            } else if !file_type.is_file() {
                tracing::debug!("Skipping special file {:?}", entry.path());
                continue;
            }

            // Records carry UTF-8 paths; anything else cannot be reported faithfully
            if relative(entry.path(), root).to_str().is_none() {
                tracing::warn!("Path is not valid UTF-8: {:?}", entry.path());
                let rejected = RejectedFile::new(
                    lossy_relative(entry.path(), root),
                    category,
                    RejectReason::Unreadable,
                )
                .with_detail("path is not valid UTF-8");
                discovered.push(Discovered::Rejected(rejected));
                continue;
            }

            discovered.push(Discovered::File {
                path: entry.into_path(),
                category,
            });
        }

        Ok(discovered)
    }

    fn process_all(&self, discovered: &[Discovered], root: &Path) -> Vec<Outcome> {
        discovered
            .par_iter()
            .map(|item| {
                if self.is_cancelled() {
                    return Outcome::Skipped;
                }
                match item {
                    Discovered::File { path, category } => self.process_file(path, *category, root),
                    Discovered::Rejected(rejected) => Outcome::Rejected(rejected.clone()),
                }
            })
            .collect()
    }

    /// Validate and hash a single file
    fn process_file(&self, path: &Path, category: Category, root: &Path) -> Outcome {
        let rules = &self.rules[&category];

        match validate(path, category, rules) {
            Ok(validated) => self.hash_validated(validated, root),
            Err(mut rejected) => {
                if matches!(
                    rejected.reason,
                    RejectReason::UnsupportedExtension | RejectReason::FileTooLarge
                ) {
                    if rejected.size_bytes.is_none() {
                        if let Some(size) = regular_file_size(path) {
                            rejected = rejected.with_size(size);
                        }
                    }
                    let suggestion = self.suggest_category(&rejected);
                    rejected = rejected.with_suggestion(suggestion);
                }
                rejected.path = relative(path, root);
                Outcome::Rejected(rejected)
            }
        }
    }

    /// Hash a validated file; content that no longer matches the validated size is unreadable
    fn hash_validated(&self, validated: ValidatedFile, root: &Path) -> Outcome {
        let path = relative(&validated.path, root);

        match hash_file_with_size(&validated.path, validated.size_bytes) {
            Ok(content_hash) => Outcome::Accepted(FileRecord {
                path,
                category: validated.category,
                size_bytes: validated.size_bytes,
                content_hash,
                extension: validated.extension,
            }),
            Err(e) => {
                tracing::warn!("Failed to hash {:?}: {}", validated.path, e);
                Outcome::Rejected(
                    RejectedFile::new(path, validated.category, RejectReason::Unreadable)
                        .with_size(validated.size_bytes)
                        .with_extension(Some(validated.extension))
                        .with_detail(e.to_string()),
                )
            }
        }
    }

    /// First other category whose rules accept the file
    fn suggest_category(&self, rejected: &RejectedFile) -> Option<Category> {
        Category::SUGGESTION_ORDER
            .into_iter()
            .filter(|category| *category != rejected.category)
            .find(|category| {
                would_accept(
                    rejected.extension.as_deref(),
                    rejected.size_bytes,
                    &self.rules[category],
                )
            })
    }

    /// Fold outcomes in discovery order, keeping the first record per hash
    fn assemble(&self, root: PathBuf, outcomes: Vec<Outcome>) -> ScanResult {
        let mut records = Vec::new();
        let mut rejected = Vec::new();
        let mut duplicates = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut skipped = false;

        for outcome in outcomes {
            match outcome {
                Outcome::Accepted(record) => {
                    if let Some(original) = seen.get(&record.content_hash) {
                        tracing::debug!("Duplicate {:?} of {:?}", record.path, original);
                        duplicates.push(DuplicateFile {
                            path: record.path,
                            category: record.category,
                            content_hash: record.content_hash,
                            original: original.clone(),
                        });
                    } else {
                        seen.insert(record.content_hash.clone(), record.path.clone());
                        records.push(record);
                    }
                }
                Outcome::Rejected(file) => {
                    tracing::debug!("Rejected {:?}: {}", file.path, file.reason);
                    rejected.push(file);
                }
                Outcome::Skipped => skipped = true,
            }
        }

        let cancelled = skipped || self.is_cancelled();
        ScanResult::new(root, records, rejected, duplicates, cancelled)
    }
}

/// Scan `root` with `config` in one call
pub fn scan_directory(root: impl Into<PathBuf>, config: ScanConfig) -> Result<ScanResult> {
    Scanner::new(root, config)?.scan()
}

/// Check the root exists and is a directory, then canonicalize it
fn resolve_root(root: &Path) -> Result<PathBuf> {
    let metadata = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ExtractError::invalid_root(root, "does not exist"));
        }
        Err(e) => return Err(ExtractError::invalid_root(root, e.to_string())),
    };

    if !metadata.is_dir() {
        return Err(ExtractError::invalid_root(root, "is not a directory"));
    }

    let canonical =
        fs::canonicalize(root).map_err(|e| ExtractError::invalid_root(root, e.to_string()))?;
    if canonical.to_str().is_none() {
        return Err(ExtractError::invalid_root(root, "path is not valid UTF-8"));
    }

    Ok(canonical)
}

/// Category for a path the walker could not read: anything under a category
/// directory, or the category directory itself
fn walk_error_category(path: &Path, root: &Path) -> Option<Category> {
    classify(path, root).or_else(|| {
        let rel = path.strip_prefix(root).ok()?;
        let mut components = rel.components();
        let first = components.next()?.as_os_str().to_str()?;
        match components.next() {
            None => Category::from_dir_name(first),
            Some(_) => None,
        }
    })
}

fn relative(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Root-relative path with invalid UTF-8 replaced, safe to serialize
fn lossy_relative(path: &Path, root: &Path) -> PathBuf {
    PathBuf::from(relative(path, root).to_string_lossy().into_owned())
}

fn regular_file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}

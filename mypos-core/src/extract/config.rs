use super::category::Category;
use crate::{ExtractError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default per-file size ceiling (10 MiB)
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Size ceiling applied to notes by default (2 KiB)
pub const NOTE_MAX_SIZE_BYTES: u64 = 2 * 1024;

/// Extensions accepted by default
pub const DEFAULT_EXTENSIONS: &[&str] = &[".md", ".markdown"];

/// Configuration for a single scan
///
/// `max_size_bytes` bounds every category. A category override can only
/// lower it; notes are capped at [`NOTE_MAX_SIZE_BYTES`] until the global
/// ceiling is set explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScanConfigFile")]
pub struct ScanConfig {
    /// Maximum file size in bytes for every category
    pub max_size_bytes: u64,
    /// Accepted extensions, unless a category overrides them
    pub allowed_extensions: Vec<String>,
    /// Descend into symlinked directories
    pub follow_symlinks: bool,
    /// Worker threads for validation and hashing (`None` = rayon default)
    pub threads: Option<usize>,
    /// Per-category overrides
    pub categories: BTreeMap<Category, CategoryRules>,
}

/// On-disk shape of [`ScanConfig`]; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanConfigFile {
    max_size_bytes: Option<u64>,
    allowed_extensions: Option<Vec<String>>,
    follow_symlinks: bool,
    threads: Option<usize>,
    categories: Option<BTreeMap<Category, CategoryRules>>,
}

impl From<ScanConfigFile> for ScanConfig {
    fn from(file: ScanConfigFile) -> Self {
        let mut config = ScanConfig::default().with_follow_symlinks(file.follow_symlinks);

        if let Some(size) = file.max_size_bytes {
            config = config.with_max_size_bytes(size);
        }
        if let Some(extensions) = file.allowed_extensions {
            config = config.with_extensions(extensions);
        }
        if let Some(threads) = file.threads {
            config = config.with_threads(threads);
        }
        // An explicit table replaces the defaults, including the note cap
        if let Some(categories) = file.categories {
            config.categories = categories;
        }

        config
    }
}

/// Per-category overrides; unset fields fall back to the global values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRules {
    pub allowed_extensions: Option<Vec<String>>,
    pub max_size_bytes: Option<u64>,
}

impl CategoryRules {
    pub fn with_max_size_bytes(mut self, size: u64) -> Self {
        self.max_size_bytes = Some(size);
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = Some(extensions);
        self
    }
}

/// Effective rules for one category after applying overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRules {
    /// Normalized extensions (lower case, leading dot)
    pub allowed_extensions: Vec<String>,
    pub max_size_bytes: u64,
}

impl ResolvedRules {
    /// Check a normalized extension against the allow-list
    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions.iter().any(|e| e == extension)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            Category::Note,
            CategoryRules::default().with_max_size_bytes(NOTE_MAX_SIZE_BYTES),
        );

        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            follow_symlinks: false,
            threads: None,
            categories,
        }
    }
}

impl ScanConfig {
    /// Create a new ScanConfig with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size ceiling for every category
    ///
    /// Clears per-category size overrides set so far, the default note cap
    /// included. Add tighter category limits afterwards with
    /// [`with_category_rules`](Self::with_category_rules).
    pub fn with_max_size_bytes(mut self, size: u64) -> Self {
        self.max_size_bytes = size;
        for rules in self.categories.values_mut() {
            rules.max_size_bytes = None;
        }
        self
    }

    /// Replace the global extension allow-list
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allowed_extensions = extensions;
        self
    }

    /// Add an extension to the global allow-list
    pub fn add_extension<S: Into<String>>(mut self, extension: S) -> Self {
        self.allowed_extensions.push(extension.into());
        self
    }

    /// Enable/disable following symlinked directories
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Bound the worker pool
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set overrides for one category
    pub fn with_category_rules(mut self, category: Category, rules: CategoryRules) -> Self {
        self.categories.insert(category, rules);
        self
    }

    /// Drop all per-category overrides
    pub fn without_category_rules(mut self) -> Self {
        self.categories.clear();
        self
    }

    /// Effective rules for `category`
    pub fn rules_for(&self, category: Category) -> ResolvedRules {
        let overrides = self.categories.get(&category);

        let extensions = overrides
            .and_then(|r| r.allowed_extensions.as_ref())
            .unwrap_or(&self.allowed_extensions);

        let mut allowed_extensions: Vec<String> =
            extensions.iter().map(|e| normalize_extension(e)).collect();
        allowed_extensions.sort();
        allowed_extensions.dedup();

        let max_size_bytes = match overrides.and_then(|r| r.max_size_bytes) {
            Some(size) => size.min(self.max_size_bytes),
            None => self.max_size_bytes,
        };

        ResolvedRules {
            allowed_extensions,
            max_size_bytes,
        }
    }

    /// Resolve the rule table for every category
    pub fn rule_table(&self) -> BTreeMap<Category, ResolvedRules> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.rules_for(c)))
            .collect()
    }

    /// Reject configurations that would make every file fail
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(ExtractError::Config("threads must be at least 1".into()));
        }

        for (category, rules) in self.rule_table() {
            if rules.max_size_bytes == 0 {
                return Err(ExtractError::Config(format!(
                    "max_size_bytes for {} must be greater than 0",
                    category
                )));
            }
            if rules.allowed_extensions.is_empty() {
                return Err(ExtractError::Config(format!(
                    "allowed_extensions for {} must not be empty",
                    category
                )));
            }
            if let Some(bad) = rules.allowed_extensions.iter().find(|e| e.len() < 2) {
                return Err(ExtractError::Config(format!(
                    "invalid extension {:?} for {}",
                    bad, category
                )));
            }
        }

        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ScanConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Export to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Lower-case an extension and make sure it carries a leading dot
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.max_size_bytes, DEFAULT_MAX_SIZE_BYTES);
        assert!(!config.follow_symlinks);
        assert!(config.threads.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_rule_table() {
        let table = ScanConfig::default().rule_table();
        assert_eq!(table[&Category::Note].max_size_bytes, NOTE_MAX_SIZE_BYTES);
        assert_eq!(table[&Category::Document].max_size_bytes, DEFAULT_MAX_SIZE_BYTES);
        assert_eq!(
            table[&Category::Conversation].allowed_extensions,
            vec![".markdown".to_string(), ".md".to_string()]
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = ScanConfig::new()
            .with_max_size_bytes(4096)
            .add_extension("TXT")
            .with_follow_symlinks(true)
            .with_threads(2)
            .without_category_rules();

        assert_eq!(config.max_size_bytes, 4096);
        assert!(config.follow_symlinks);
        assert_eq!(config.threads, Some(2));
        assert!(config.rules_for(Category::Note).allows_extension(".txt"));
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 4096);
    }

    #[test]
    fn test_global_ceiling_replaces_note_cap() {
        let config = ScanConfig::new().with_max_size_bytes(4096);
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 4096);
        assert_eq!(config.rules_for(Category::Document).max_size_bytes, 4096);

        let config = ScanConfig::new().with_max_size_bytes(256);
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 256);
    }

    #[test]
    fn test_category_override_cannot_exceed_global() {
        let config = ScanConfig::new()
            .with_max_size_bytes(1000)
            .with_category_rules(Category::Note, CategoryRules::default().with_max_size_bytes(5000))
            .with_category_rules(Category::Document, CategoryRules::default().with_max_size_bytes(10));

        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 1000);
        assert_eq!(config.rules_for(Category::Document).max_size_bytes, 10);
        assert_eq!(config.rules_for(Category::Conversation).max_size_bytes, 1000);
    }

    #[test]
    fn test_category_override_extensions() {
        let config = ScanConfig::new().with_category_rules(
            Category::Document,
            CategoryRules::default().with_extensions(vec!["txt".into()]),
        );

        let docs = config.rules_for(Category::Document);
        assert!(docs.allows_extension(".txt"));
        assert!(!docs.allows_extension(".md"));
        assert!(config.rules_for(Category::Conversation).allows_extension(".md"));
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("md"), ".md");
        assert_eq!(normalize_extension(".MarkDown"), ".markdown");
        assert_eq!(normalize_extension("  .MD "), ".md");
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let config = ScanConfig::new().with_max_size_bytes(0).without_category_rules();
        assert!(matches!(config.validate(), Err(ExtractError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_extensions() {
        let config = ScanConfig::new().with_extensions(vec![]);
        assert!(matches!(config.validate(), Err(ExtractError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bare_dot() {
        let config = ScanConfig::new().with_extensions(vec![".".into()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = ScanConfig::new().with_threads(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = ScanConfig::from_json_str(
            r#"{
                "max_size_bytes": 1000,
                "categories": { "document": { "allowed_extensions": ["md", "txt"] } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.max_size_bytes, 1000);
        assert!(!config.follow_symlinks);
        assert!(config.rules_for(Category::Document).allows_extension(".txt"));
        // Explicit table replaces the default note cap
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 1000);
    }

    #[test]
    fn test_from_json_global_ceiling_applies_to_notes() {
        let config = ScanConfig::from_json_str(r#"{ "max_size_bytes": 4096 }"#).unwrap();
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, 4096);

        let config = ScanConfig::from_json_str(r#"{ "follow_symlinks": true }"#).unwrap();
        assert_eq!(config.rules_for(Category::Note).max_size_bytes, NOTE_MAX_SIZE_BYTES);
        assert_eq!(config.allowed_extensions, ScanConfig::default().allowed_extensions);
    }

    #[test]
    fn test_json_roundtrip_preserves_overrides() {
        let config = ScanConfig::default();
        let parsed = ScanConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            ScanConfig::from_json_str("{ not json"),
            Err(ExtractError::Serialization(_))
        ));
    }
}

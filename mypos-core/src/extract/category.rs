use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Content category, derived from the top-level subdirectory of the scan root.
///
/// Variants are declared in the order their directories sort by name, which is
/// also the order the scanner visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Files under `conversations/`
    Conversation,
    /// Files under `documents/`
    Document,
    /// Files under `notes/`
    Note,
}

impl Category {
    /// All categories in traversal order
    pub const ALL: [Category; 3] = [Category::Conversation, Category::Document, Category::Note];

    /// Order in which other categories are tried when suggesting a new home
    /// for a rejected file
    pub const SUGGESTION_ORDER: [Category; 3] =
        [Category::Note, Category::Document, Category::Conversation];

    /// Name of the top-level directory holding this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Conversation => "conversations",
            Category::Document => "documents",
            Category::Note => "notes",
        }
    }

    /// Singular, human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Category::Conversation => "conversation",
            Category::Document => "document",
            Category::Note => "note",
        }
    }

    /// Look up a category by its exact directory name (case-sensitive)
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classify `path` by the first component below `root`.
///
/// Returns `None` when the path is not under `root`, when the first component
/// is not one of the category directory names, or when the path *is* that
/// component (a file named `notes` at the root is not inside `notes/`).
pub fn classify(path: &Path, root: &Path) -> Option<Category> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();

    let first = match components.next()? {
        Component::Normal(name) => name.to_str()?,
        _ => return None,
    };
    components.next()?;

    Category::from_dir_name(first)
}

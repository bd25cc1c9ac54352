//! my-position core library
//!
//! The Extract stage of the my-position pipeline: scans an input directory of
//! conversations, notes and documents and produces a validated, deduplicated
//! inventory for the later stages. Nothing here modifies the input tree.

pub mod error;
pub mod extract;

pub use error::{ExtractError, Result};
pub use extract::{
    classify, scan_directory, CancelFlag, Category, CategoryRules, DuplicateFile, FileRecord,
    RejectReason, RejectedFile, ScanConfig, ScanResult, ScanStats, Scanner,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

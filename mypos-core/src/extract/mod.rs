//! Extract stage
//!
//! Turns an input tree into a deduplicated inventory of source files:
//! - Path classification (`conversations/`, `notes/`, `documents/`)
//! - Per-category validation (extension, size, readability)
//! - SHA-256 content hashing
//! - Ordered scanning with first-wins deduplication

mod category;
mod config;
mod hasher;
mod record;
mod result;
mod scanner;
mod validator;

pub use category::{classify, Category};
pub use config::{
    normalize_extension, CategoryRules, ResolvedRules, ScanConfig, DEFAULT_EXTENSIONS,
    DEFAULT_MAX_SIZE_BYTES, NOTE_MAX_SIZE_BYTES,
};
pub use hasher::{
    hash_bytes, hash_file, hash_file_with_size, hash_reader, HASH_BUFFER_SIZE, HASH_HEX_LEN,
};
pub use record::{DuplicateFile, FileRecord, RejectReason, RejectedFile};
pub use result::{ScanResult, ScanStats};
pub use scanner::{scan_directory, CancelFlag, Scanner};
pub use validator::{file_extension, validate, would_accept, ValidatedFile};

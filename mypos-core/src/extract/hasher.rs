//! Content hashing
//!
//! SHA-256 over the full file content, streamed through a fixed buffer so
//! memory use does not grow with file size.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer used while hashing (8 KiB)
pub const HASH_BUFFER_SIZE: usize = 8 * 1024;

/// Length of a hex-encoded content hash
pub const HASH_HEX_LEN: usize = 64;

/// Compute SHA-256 of in-memory data and return as hex string
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash everything `reader` yields, returning the hex digest and byte count
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
        total += read as u64;
    }

    Ok((hex::encode(hasher.finalize()), total))
}

/// Hash the file at `path`
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    let (hash, _) = hash_reader(file)?;
    Ok(hash)
}

/// Hash the file at `path`, failing unless it holds exactly `expected_size` bytes.
///
/// Reads at most one byte past `expected_size`, so a file that grows while
/// it is hashed cannot blow past the size ceiling it was validated against.
pub fn hash_file_with_size(path: &Path, expected_size: u64) -> io::Result<String> {
    let file = File::open(path)?;
    let (hash, read) = hash_reader(file.take(expected_size.saturating_add(1)))?;

    if read != expected_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "file changed while hashing: expected {} bytes, read {}",
                expected_size,
                if read > expected_size {
                    format!("more than {}", expected_size)
                } else {
                    read.to_string()
                }
            ),
        ));
    }

    Ok(hash)
}

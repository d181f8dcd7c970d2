//! Loading a settlement export from disk.
//!
//! The engine itself only sees text; this module owns the size ceiling and
//! the UTF-8 check so that oversized or binary uploads are rejected before
//! any parsing happens.

use std::io::Read;
use std::path::Path;

use settlement_core::error::{LedgerError, Result};
use tracing::{debug, warn};

/// Read `path` as UTF-8 text, refusing files larger than `max_bytes`.
pub fn read_ledger_file(path: &Path, max_bytes: u64) -> Result<String> {
    let file_read = |source: std::io::Error| LedgerError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(file_read)?;
    let size = file.metadata().map_err(file_read)?.len();
    if size > max_bytes {
        warn!(
            "Rejecting {}: {} bytes exceeds limit of {}",
            path.display(),
            size,
            max_bytes
        );
        return Err(LedgerError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }

    // Bound the read as well, in case the file grows after the stat.
    let mut bytes = Vec::with_capacity(size as usize);
    file.take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(file_read)?;
    if bytes.len() as u64 > max_bytes {
        return Err(LedgerError::FileTooLarge {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            limit: max_bytes,
        });
    }

    debug!("Read {} bytes from {}", bytes.len(), path.display());

    String::from_utf8(bytes).map_err(|_| LedgerError::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

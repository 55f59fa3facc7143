//! Record file reader
//!
//! A record file holds one record per line. A trailing `\r` is dropped so
//! CRLF files hash the same as LF files, and empty lines are skipped. The
//! remaining bytes are used verbatim; no text decoding is applied.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Split raw file contents into records
pub fn parse_records(data: &[u8]) -> Vec<Vec<u8>> {
    data.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(<[u8]>::to_vec)
        .collect()
}

/// Read and split a record file
pub fn read_records(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    let records = parse_records(&data);
    debug!(path = %path.display(), bytes = data.len(), records = records.len(), "Loaded records");
    Ok(records)
}

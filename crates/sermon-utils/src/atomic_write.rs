//! Atomic file writes: temp file in the target directory, fsync, rename.
//!
//! Content is written byte-for-byte. Readers never observe a partially written
//! stage artifact, and concurrent runs targeting the same directory cannot
//! interleave their bytes.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

/// Atomically write `content` to `path`, replacing any existing file.
///
/// Parent directories are created as needed.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    write_bytes_atomic(path, content.as_bytes())
}

/// Binary counterpart of [`write_file_atomic`], used for packaged documents.
pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<()> {
    let temp_file = write_temp_sibling(path, content)?;
    temp_file
        .persist(path.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Failed to atomically write file: {path}"))?;
    Ok(())
}

/// Atomically write `content` to `path`, failing if `path` already exists.
///
/// Used for append-only stores where one record must never replace another.
pub fn write_new_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    let temp_file = write_temp_sibling(path, content.as_bytes())?;
    temp_file
        .persist_noclobber(path.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .with_context(|| format!("Refusing to overwrite existing file: {path}"))?;
    Ok(())
}

fn write_temp_sibling(path: &Utf8Path, content: &[u8]) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(content)
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    Ok(temp_file)
}

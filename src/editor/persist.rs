//! Persistence targets for exported documents and saved images.
//!
//! A save goes either through a host-provided [`SavePicker`] (interactive)
//! or to a timestamped file in the cache directory (non-interactive).
//! Writes are atomic: bytes land in a temporary file in the target
//! directory, which is then renamed into place. A picked destination is
//! replaced; a cache file never is.

// ============================================================================
// Imports
// ============================================================================

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tempfile::NamedTempFile;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Timestamp format for cache file names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Highest `_<n>` suffix tried when a cache file name is taken.
const MAX_NAME_SUFFIX: u32 = 999;

// ============================================================================
// SaveRequest
// ============================================================================

/// What the host's save dialog should offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Suggested file name, without extension.
    pub suggested_name: String,
    /// Label of the single offered file type.
    pub type_label: String,
    /// Extension of the offered file type, including the leading dot.
    pub extension: String,
}

impl SaveRequest {
    /// Creates a save request.
    #[must_use]
    pub fn new(
        suggested_name: impl Into<String>,
        type_label: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            suggested_name: suggested_name.into(),
            type_label: type_label.into(),
            extension: extension.into(),
        }
    }

    /// Suggested file name including the extension.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}", self.suggested_name, self.extension)
    }
}

// ============================================================================
// SavePicker
// ============================================================================

/// Native save dialog provided by the host.
#[async_trait]
pub trait SavePicker: Send + Sync {
    /// Asks the user for a destination.
    ///
    /// Returns `Ok(None)` if the user dismissed the dialog.
    ///
    /// # Errors
    ///
    /// Platform failures showing the dialog.
    async fn pick_save_file(&self, request: &SaveRequest) -> Result<Option<PathBuf>>;
}

// ============================================================================
// SaveOutcome
// ============================================================================

/// Result of a save that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    /// Bytes were written to the path.
    Written(PathBuf),
    /// The user dismissed the picker.
    Cancelled,
}

// ============================================================================
// Functions
// ============================================================================

/// Builds `<stem>_<yyyyMMdd_HHmmss>` from the local time.
#[must_use]
pub(crate) fn timestamped_stem(stem: &str) -> String {
    format!("{stem}_{}", Local::now().format(TIMESTAMP_FORMAT))
}

/// `<dir>/<stem><extension>`, or `<dir>/<stem>_<n><extension>` for `n > 0`.
fn numbered_path(dir: &Path, stem: &str, n: u32, extension: &str) -> PathBuf {
    if n == 0 {
        dir.join(format!("{stem}{extension}"))
    } else {
        dir.join(format!("{stem}_{n}{extension}"))
    }
}

/// Writes `bytes` to a synced temporary file in `dir`, creating `dir`.
fn stage(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Atomically writes `bytes` to `path`, creating missing parent directories.
///
/// An existing file at `path` is replaced.
///
/// # Errors
///
/// - [`Error::Io`] if the directory cannot be created or the write fails
pub(crate) async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<()> {
    let path = path.to_path_buf();
    let len = bytes.len();

    let written = path.clone();
    run_blocking(move || {
        let dir = match written.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file = stage(&dir, &bytes)?;
        file.persist(&written).map_err(|e| Error::Io(e.error))?;
        Ok(())
    })
    .await?;

    info!(path = %path.display(), len, "File written");
    Ok(())
}

/// Atomically writes `bytes` to a new timestamped file in `dir`.
///
/// Never replaces an existing file: if `<stem>_<timestamp><extension>` is
/// taken, `_1`, `_2`, ... are appended to the stem.
///
/// # Errors
///
/// - [`Error::Io`] if the write fails or no free name is found
pub(crate) async fn write_timestamped(
    dir: &Path,
    stem: &str,
    extension: &str,
    bytes: Vec<u8>,
) -> Result<PathBuf> {
    let dir = dir.to_path_buf();
    let stem = timestamped_stem(stem);
    let extension = extension.to_string();
    let len = bytes.len();

    let path = run_blocking(move || {
        let mut file = stage(&dir, &bytes)?;
        for n in 0..=MAX_NAME_SUFFIX {
            let candidate = numbered_path(&dir, &stem, n, &extension);
            match file.persist_noclobber(&candidate) {
                Ok(_) => return Ok(candidate),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    trace!(path = %candidate.display(), "Name taken");
                    file = e.file;
                }
                Err(e) => return Err(Error::Io(e.error)),
            }
        }
        Err(Error::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {stem}{extension}"),
        )))
    })
    .await?;

    info!(path = %path.display(), len, "File written");
    Ok(path)
}

/// Saves through the picker if one is present, else into `cache_dir`.
///
/// # Errors
///
/// - Picker failures
/// - [`Error::Io`] on write failure
pub(crate) async fn save_bytes(
    picker: Option<&dyn SavePicker>,
    request: &SaveRequest,
    cache_dir: &Path,
    bytes: Vec<u8>,
) -> Result<SaveOutcome> {
    let path = match picker {
        Some(picker) => match picker.pick_save_file(request).await? {
            Some(path) => path,
            None => {
                debug!(name = %request.file_name(), "Save dialog dismissed");
                return Ok(SaveOutcome::Cancelled);
            }
        },
        None => {
            let path = write_timestamped(
                cache_dir,
                &request.suggested_name,
                &request.extension,
                bytes,
            )
            .await?;
            return Ok(SaveOutcome::Written(path));
        }
    };

    write_atomic(&path, bytes).await?;
    Ok(SaveOutcome::Written(path))
}

// ============================================================================
// Tests
// ============================================================================

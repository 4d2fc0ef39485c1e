//! Writing the converted payload to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::types::{Error, Format};

/// Turn a user-supplied title into a single path component.
///
/// Separators and control characters become `_`; a title that is empty after
/// trimming yields `None`.
pub fn sanitize_title(title: &str) -> Option<String> {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" => None,
        "." | ".." => Some(cleaned.replace('.', "_")),
        _ => Some(cleaned),
    }
}

/// `<dir>/<title>.<format>`.
pub fn output_path(dir: &Path, title: &str, format: Format) -> Result<PathBuf, Error> {
    let name = sanitize_title(title).ok_or(Error::EmptyTitle)?;
    Ok(dir.join(format!("{name}.{}", format.extension())))
}

/// A download being written to a temporary file next to its final path.
///
/// Dropping it without [`PendingDownload::persist`] removes the temporary
/// file, so an aborted transfer never leaves a truncated file behind.
pub struct PendingDownload {
    tmp: NamedTempFile,
    out: PathBuf,
    force: bool,
}

impl PendingDownload {
    /// Reserve `<dir>/<title>.<format>`.
    ///
    /// # Errors
    ///
    /// `Error::OutputExists` if the target exists and `force` is false,
    /// `Error::Io` if the directory or temporary file cannot be created.
    pub fn create(dir: &Path, title: &str, format: Format, force: bool) -> Result<Self, Error> {
        let out = output_path(dir, title, format)?;
        if !force && out.exists() {
            return Err(Error::OutputExists(out));
        }
        fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        Ok(Self { tmp, out, force })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.tmp.write_all(chunk)?;
        Ok(())
    }

    /// Final path once persisted.
    pub fn target(&self) -> &Path {
        &self.out
    }

    /// Flush, sync and rename into place.
    pub fn persist(mut self) -> Result<PathBuf, Error> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;
        persist_tempfile(self.tmp, &self.out, self.force)
    }
}

/// Atomically write `data` as `<dir>/<title>.<format>`.
///
/// # Errors
///
/// Same as [`PendingDownload::create`] and [`PendingDownload::persist`].
pub fn save_download(
    dir: &Path,
    title: &str,
    format: Format,
    data: &[u8],
    force: bool,
) -> Result<PathBuf, Error> {
    let mut pending = PendingDownload::create(dir, title, format, force)?;
    pending.write_chunk(data)?;
    pending.persist()
}

fn persist_tempfile(tmp: NamedTempFile, out: &Path, force: bool) -> Result<PathBuf, Error> {
    let tmp_path = tmp.into_temp_path();

    if out.exists() {
        if force {
            fs::remove_file(out)?;
        } else {
            return Err(Error::OutputExists(out.to_path_buf()));
        }
    }

    tmp_path.persist(out).map_err(|e| Error::Io(e.error))?;
    Ok(out.to_path_buf())
}

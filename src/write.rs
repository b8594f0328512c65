//! Backup-then-write persistence.
//!
//! The destination is only touched after a verified backup of its current
//! bytes exists. Both files are written atomically (tempfile + fsync +
//! rename), so a crash leaves either the old or the new content in place.

use crate::error::PatchError;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

/// Suffix appended to the file name of a backup.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub target: PathBuf,
    pub backup: PathBuf,
    pub bytes_written: usize,
}

/// Sibling backup path: `SalaryAdmin.tsx` becomes `SalaryAdmin.tsx.bak`.
pub fn backup_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Back up `path` to its default sibling, then overwrite it with `new_content`.
pub fn write_with_backup(path: &Path, new_content: &str) -> Result<WriteOutcome, PatchError> {
    let backup = backup_path_for(path, DEFAULT_BACKUP_SUFFIX);
    write_with_backup_to(path, &backup, new_content)
}

/// Back up `path` to `backup`, then overwrite `path` with `new_content`.
///
/// - `path` missing or unreadable: [`PatchError::NotFound`], nothing written.
/// - `backup` names the destination itself, cannot be written, or does not
///   read back identically: [`PatchError::BackupFailed`] /
///   [`PatchError::BackupMismatch`], the destination is never touched.
/// - destination cannot be written: [`PatchError::WriteFailed`], the backup
///   stays in place.
///
/// Both files keep the permission bits of the original.
pub fn write_with_backup_to(
    path: &Path,
    backup: &Path,
    new_content: &str,
) -> Result<WriteOutcome, PatchError> {
    write_with_backup_using(path, backup, new_content, atomic_write)
}

/// Backup-then-write with the destination write supplied by the caller.
fn write_with_backup_using<W>(
    path: &Path,
    backup: &Path,
    new_content: &str,
    write_destination: W,
) -> Result<WriteOutcome, PatchError>
where
    W: FnOnce(&Path, &[u8], &fs::Permissions) -> io::Result<()>,
{
    let not_found = |source: io::Error| PatchError::NotFound {
        path: path.to_path_buf(),
        source,
    };
    let original = fs::read(path).map_err(not_found)?;
    let permissions = fs::metadata(path).map_err(not_found)?.permissions();

    let backup_failed = |source: io::Error| PatchError::BackupFailed {
        path: path.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    };

    if same_file(path, backup) {
        return Err(backup_failed(io::Error::new(
            io::ErrorKind::InvalidInput,
            "backup path is the destination itself",
        )));
    }

    atomic_write(backup, &original, &permissions).map_err(backup_failed)?;

    let written = fs::read(backup).map_err(backup_failed)?;
    if written.len() != original.len() || xxh3_64(&written) != xxh3_64(&original) {
        return Err(PatchError::BackupMismatch {
            backup: backup.to_path_buf(),
        });
    }
    tracing::info!(backup = %backup.display(), bytes = original.len(), "backup written");

    let write_failed = |source: io::Error| PatchError::WriteFailed {
        path: path.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    };

    write_destination(path, new_content.as_bytes(), &permissions).map_err(write_failed)?;

    // Update mtime so file watchers and incremental builds notice the change
    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(write_failed)?;

    tracing::info!(path = %path.display(), bytes = new_content.len(), "document written");

    Ok(WriteOutcome {
        target: path.to_path_buf(),
        backup: backup.to_path_buf(),
        bytes_written: new_content.len(),
    })
}

/// Whether `backup` resolves to `path`. `path` is known to exist.
fn same_file(path: &Path, backup: &Path) -> bool {
    if path == backup {
        return true;
    }
    match (fs::canonicalize(path), fs::canonicalize(backup)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Atomic file write: tempfile + fsync + rename, with `permissions` applied
/// before the rename.
fn atomic_write(path: &Path, content: &[u8], permissions: &fs::Permissions) -> io::Result<()> {
    // Tempfile in the same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().set_permissions(permissions.clone())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

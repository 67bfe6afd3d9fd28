//! Move an existing project directory out of the way.
//!
//! The directory is renamed to `<backup_root>/<name>_backup_<unix millis>`.
//! When the backup root sits on another file system the rename cannot work,
//! so the tree is copied and the original removed only after the copy
//! completed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::{FileSystemError, FsOperation};

/// Default location for backups: the platform temp directory.
pub fn default_backup_root() -> PathBuf {
    std::env::temp_dir()
}

/// Backup path for `name` under `root` at `millis` since the Unix epoch.
pub fn backup_path(root: &Path, name: &str, millis: u128) -> PathBuf {
    root.join(format!("{name}_backup_{millis}"))
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Move `dir` into `backup_root`, returning where it went.
///
/// Never overwrites: if the timestamped name is taken, the timestamp is
/// bumped until a free name is found.
#[instrument(skip_all, fields(dir = %dir.display(), root = %backup_root.display()))]
pub fn backup_directory(dir: &Path, backup_root: &Path) -> Result<PathBuf, FileSystemError> {
    let name = dir
        .file_name()
        .map_or_else(|| "project".into(), |n| n.to_string_lossy().into_owned());

    fs::create_dir_all(backup_root)
        .map_err(|e| FileSystemError::new(FsOperation::CreateDir, backup_root, e))?;

    let mut millis = now_millis();
    let mut target = backup_path(backup_root, &name, millis);
    while target.exists() {
        millis += 1;
        target = backup_path(backup_root, &name, millis);
    }

    match fs::rename(dir, &target) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            warn!("backup root is on another device, copying instead");
            copy_tree(dir, &target)?;
            fs::remove_dir_all(dir)
                .map_err(|e| FileSystemError::new(FsOperation::Remove, dir, e))?;
        }
        Err(e) => return Err(FileSystemError::new(FsOperation::Move, dir, e)),
    }

    info!(backup = %target.display(), "directory backed up");
    Ok(target)
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), FileSystemError> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            FileSystemError::new(FsOperation::Copy, path, e.into())
        })?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| FileSystemError::new(FsOperation::CreateDir, &dest, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)
                .map_err(|e| FileSystemError::new(FsOperation::Copy, entry.path(), e))?;
        }
    }
    debug!(from = %from.display(), to = %to.display(), "tree copied");
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) -> Result<(), FileSystemError> {
    let target =
        fs::read_link(link).map_err(|e| FileSystemError::new(FsOperation::Read, link, e))?;
    std::os::unix::fs::symlink(&target, dest)
        .map_err(|e| FileSystemError::new(FsOperation::Copy, link, e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, dest: &Path) -> Result<(), FileSystemError> {
    fs::copy(link, dest)
        .map(|_| ())
        .map_err(|e| FileSystemError::new(FsOperation::Copy, link, e))
}

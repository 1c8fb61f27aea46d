//! Filesystem utilities.

use std::fs;
use std::path::Path;

use crate::core::error::{Error, Result};

/// Recursively copy a directory.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    copy_dir_filtered(src, dst, &[], false)
}

/// Recursively copy a directory, skipping entries whose names end with one
/// of `excludes` (case-insensitive) and, when `skip_dirs` is set, all
/// subdirectories.
///
/// The destination must not already exist; an existing destination fails
/// with [`Error::AlreadyExists`].
pub fn copy_dir_filtered(src: &Path, dst: &Path, excludes: &[&str], skip_dirs: bool) -> Result<()> {
    if dst.exists() {
        return Err(Error::AlreadyExists {
            path: dst.to_path_buf(),
        });
    }
    copy_dir_inner(src, dst, excludes, skip_dirs)
}

fn copy_dir_inner(src: &Path, dst: &Path, excludes: &[&str], skip_dirs: bool) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::io(dst, e))?;

    for entry in fs::read_dir(src).map_err(|e| Error::io(src, e))? {
        let entry = entry.map_err(|e| Error::io(src, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_excluded(&name, excludes) {
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let ty = entry.file_type().map_err(|e| Error::io(&src_path, e))?;

        if ty.is_dir() {
            if skip_dirs {
                continue;
            }
            copy_dir_inner(&src_path, &dst_path, excludes, skip_dirs)?;
        } else {
            fs::copy(&src_path, &dst_path).map_err(|e| Error::io(&src_path, e))?;
        }
    }
    Ok(())
}

fn is_excluded(name: &str, excludes: &[&str]) -> bool {
    let lower = name.to_lowercase();
    excludes.iter().any(|e| lower.ends_with(&e.to_lowercase()))
}

/// Copy a single file into a directory, creating the directory if needed.
pub fn copy_file_into(src: &Path, dst_dir: &Path) -> Result<()> {
    ensure_dir(dst_dir)?;
    let name = src.file_name().ok_or_else(|| Error::NotFound {
        path: src.to_path_buf(),
    })?;
    fs::copy(src, dst_dir.join(name)).map_err(|e| Error::io(src, e))?;
    Ok(())
}

/// Remove a directory tree, clearing the read-only bit and retrying once
/// per entry that refuses deletion. Exported trees frequently carry
/// read-only binary artifacts.
pub fn force_remove_dir_all(path: &Path) -> Result<()> {
    if fs::remove_dir_all(path).is_ok() {
        return Ok(());
    }

    for entry in walkdir::WalkDir::new(path).contents_first(false) {
        let entry = entry.map_err(|e| {
            Error::io(path, e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("walk failed")
            }))
        })?;
        let mut perms = entry
            .metadata()
            .map_err(|e| {
                Error::io(entry.path(), e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("metadata failed")
                }))
            })?
            .permissions();
        if perms.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            fs::set_permissions(entry.path(), perms).map_err(|e| Error::io(entry.path(), e))?;
        }
    }

    fs::remove_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        force_remove_dir_all(path)?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

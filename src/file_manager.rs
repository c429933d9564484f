//! # File Management Module
//!
//! Filesystem helpers shared by the tool wrappers and the Plex organizer.
//!
//! ## Responsibilities:
//! - Resolve input paths to absolute form and check they exist
//! - Resolve output paths against the working directory, refuse to clobber
//!   existing files unless asked, create missing parent directories
//! - Recursive file discovery with `walkdir`
//! - Moving files, falling back to copy + delete across filesystems
//!
//! ## Operations:
//! - `resolve_input()`: absolute, existing input path or `FileNotFound`
//! - `prepare_output()`: absolute output path or `FileExists`
//! - `find_files()`: every regular file under a directory
//! - `move_file()`: rename with cross-device fallback

use crate::error::{Result, ToolkitError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Make `path` absolute relative to the current working directory
    pub fn absolute(path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(std::env::current_dir()?.join(path))
        }
    }

    /// Absolute path of an input that must already exist
    pub fn resolve_input(path: &Path) -> Result<PathBuf> {
        let absolute = Self::absolute(path)?;
        if !absolute.exists() {
            return Err(ToolkitError::FileNotFound(absolute));
        }
        Ok(absolute)
    }

    /// Absolute path of an existing directory, used for structural preconditions
    pub fn resolve_dir(path: &Path) -> Result<PathBuf> {
        let absolute = Self::resolve_input(path)?;
        if !absolute.is_dir() {
            return Err(ToolkitError::Validation(format!(
                "Not a directory: {}",
                absolute.display()
            )));
        }
        Ok(absolute)
    }

    /// Resolve an output path, refusing an existing file unless `overwrite`,
    /// and create its parent directories.
    pub async fn prepare_output(path: &Path, overwrite: bool) -> Result<PathBuf> {
        let absolute = Self::absolute(path)?;
        if absolute.exists() && !overwrite {
            return Err(ToolkitError::FileExists(absolute));
        }
        if let Some(parent) = absolute.parent() {
            if !parent.exists() {
                debug!("Creating output directory: {}", parent.display());
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(absolute)
    }

    /// Find all regular files under a directory
    pub fn find_files(dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    /// Whether a directory exists and has no entries
    pub async fn is_empty_dir(dir: &Path) -> Result<bool> {
        let mut entries = fs::read_dir(dir).await?;
        Ok(entries.next_entry().await?.is_none())
    }

    /// Move a file, copying then deleting when a plain rename is not possible
    pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
        match fs::rename(from, to).await {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                debug!(
                    "Rename {} -> {} failed ({}), trying copy",
                    from.display(),
                    to.display(),
                    rename_err
                );
                fs::copy(from, to).await?;
                if let Err(e) = fs::remove_file(from).await {
                    // The source is still in place, so drop the copy.
                    let _ = fs::remove_file(to).await;
                    return Err(e.into());
                }
                Ok(())
            }
        }
    }
}

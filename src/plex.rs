//! # Plex Bonus-Content Organizer
//!
//! Sorts extras (trailers, deleted scenes, ...) into the folder names Plex
//! recognizes next to a movie.
//!
//! ## Responsibilities:
//! - Fixed layout table: folder display name <-> filename suffix token
//! - `ensure_folders()`: create every layout folder under a destination root
//! - `move_files()`: move `*-<suffix>.<ext>` files from a source tree into
//!   their folder
//! - `prune_empty()`: delete layout folders left empty
//! - `organize()`: the three phases in order
//!
//! ## Policy:
//! - Every phase is idempotent; running it twice changes nothing the second time
//! - A missing source/destination root is a hard error; everything else is
//!   recorded per file and the phase continues
//! - No match for a suffix is logged as a warning
//! - A destination file that already exists is skipped, never overwritten
//!
//! ## Example:
//! ```ignore
//! let organizer = PlexOrganizer::new(config.bonus_extensions.clone());
//! let report = organizer.organize(Path::new("/downloads/X"), Path::new("/plex/movies/X")).await?;
//! println!("{}", report.moves.summary.format_summary());
//! ```

use crate::error::{Result, ToolkitError};
use crate::file_manager::FileManager;
use crate::progress::BatchSummary;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One entry of the layout table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlexFolder {
    /// Folder name Plex expects
    pub name: &'static str,
    /// Token that ends the file stem, after a dash
    pub suffix: &'static str,
}

/// Plex local-extras folders and their filename suffixes
pub const PLEX_LAYOUT: &[PlexFolder] = &[
    PlexFolder { name: "Behind The Scenes", suffix: "behindthescenes" },
    PlexFolder { name: "Deleted Scenes", suffix: "deleted" },
    PlexFolder { name: "Featurettes", suffix: "featurette" },
    PlexFolder { name: "Interviews", suffix: "interview" },
    PlexFolder { name: "Scenes", suffix: "scene" },
    PlexFolder { name: "Shorts", suffix: "short" },
    PlexFolder { name: "Trailers", suffix: "trailer" },
    PlexFolder { name: "Other", suffix: "other" },
];

/// A single planned or performed move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of the move phase
#[derive(Debug, Default, Clone, Serialize)]
pub struct MoveReport {
    pub moved: Vec<FileMove>,
    pub summary: BatchSummary,
    pub dry_run: bool,
}

impl MoveReport {
    pub fn moved_count(&self) -> usize {
        self.moved.len()
    }
}

/// Outcome of all three phases
#[derive(Debug, Default, Clone, Serialize)]
pub struct OrganizeReport {
    pub created: Vec<PathBuf>,
    pub moves: MoveReport,
    pub pruned: Vec<PathBuf>,
}

/// Moves bonus content according to a layout table
pub struct PlexOrganizer {
    layout: &'static [PlexFolder],
    /// Longest first, so `en.srt` wins over `srt`
    extensions: Vec<String>,
    dry_run: bool,
}

impl PlexOrganizer {
    pub fn new(extensions: Vec<String>) -> Self {
        Self::with_layout(PLEX_LAYOUT, extensions)
    }

    pub fn with_layout(layout: &'static [PlexFolder], extensions: Vec<String>) -> Self {
        let mut extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        extensions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        extensions.dedup();

        Self {
            layout,
            extensions,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn layout(&self) -> &'static [PlexFolder] {
        self.layout
    }

    /// Layout entry whose `-<suffix>.<ext>` pattern `file_name` matches
    pub fn match_file(&self, file_name: &str) -> Option<&'static PlexFolder> {
        let lower = file_name.to_ascii_lowercase();
        for ext in &self.extensions {
            let Some(stem) = lower.strip_suffix(ext.as_str()).and_then(|s| s.strip_suffix('.')) else {
                continue;
            };
            // The stem has to be longer than "-<suffix>" itself.
            return self.layout.iter().find(|folder| {
                stem.strip_suffix(folder.suffix)
                    .and_then(|s| s.strip_suffix('-'))
                    .is_some_and(|rest| !rest.is_empty())
            });
        }
        None
    }

    /// Create every layout folder under `dest_root`; existing ones are fine
    pub async fn ensure_folders(&self, dest_root: &Path) -> Result<Vec<PathBuf>> {
        let dest_root = FileManager::resolve_dir(dest_root)?;
        let mut created = Vec::new();

        for folder in self.layout {
            let path = dest_root.join(folder.name);
            if path.is_dir() {
                debug!("Folder already exists: {}", path.display());
                continue;
            }
            if path.exists() {
                return Err(ToolkitError::Validation(format!(
                    "{} exists but is not a directory",
                    path.display()
                )));
            }
            tokio::fs::create_dir(&path).await?;
            info!("Created {}", path.display());
            created.push(path);
        }

        Ok(created)
    }

    /// Move every matching file under `source_root` into its folder under `dest_root`
    pub async fn move_files(&self, source_root: &Path, dest_root: &Path) -> Result<MoveReport> {
        let source_root = FileManager::resolve_dir(source_root)?;
        let dest_root = FileManager::resolve_dir(dest_root)?;
        let mut report = MoveReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        let files = FileManager::find_files(&source_root);
        for folder in self.layout {
            let target_dir = dest_root.join(folder.name);
            let matches: Vec<&PathBuf> = files
                .iter()
                .filter(|f| {
                    // Suffixes and extensions are ASCII; lossy names still match.
                    f.file_name()
                        .and_then(|n| self.match_file(&n.to_string_lossy()))
                        .is_some_and(|m| m.suffix == folder.suffix)
                })
                .filter(|f| f.parent() != Some(target_dir.as_path()))
                .collect();

            if matches.is_empty() {
                warn!(
                    "No '-{}' files found under {}",
                    folder.suffix,
                    source_root.display()
                );
                continue;
            }

            for from in matches {
                let Some(file_name) = from.file_name() else {
                    continue;
                };
                let to = target_dir.join(file_name);
                let label = from.display().to_string();

                if to.exists() {
                    report.summary.add_error(label, &ToolkitError::FileExists(to));
                    continue;
                }
                if self.dry_run {
                    info!("Would move {} -> {}", from.display(), to.display());
                    report.summary.add_success(label);
                    report.moved.push(FileMove { from: from.clone(), to });
                    continue;
                }
                if !target_dir.is_dir() {
                    report.summary.add_failure(
                        label,
                        format!("destination folder {} does not exist", target_dir.display()),
                    );
                    continue;
                }

                match FileManager::move_file(from, &to).await {
                    Ok(()) => {
                        info!("Moved {} -> {}", from.display(), to.display());
                        report.summary.add_success(label);
                        report.moved.push(FileMove { from: from.clone(), to });
                    }
                    Err(e) => report.summary.add_error(label, &e),
                }
            }
        }

        info!(
            "{} {} file(s) into {}",
            if self.dry_run { "Would move" } else { "Moved" },
            report.moved_count(),
            dest_root.display()
        );
        Ok(report)
    }

    /// Delete layout folders under `dest_root` that exist and are empty
    pub async fn prune_empty(&self, dest_root: &Path) -> Result<Vec<PathBuf>> {
        let dest_root = FileManager::resolve_dir(dest_root)?;
        let mut removed = Vec::new();

        for folder in self.layout {
            let path = dest_root.join(folder.name);
            if !path.is_dir() {
                continue;
            }
            match FileManager::is_empty_dir(&path).await {
                Ok(true) => {
                    if self.dry_run {
                        info!("Would remove empty {}", path.display());
                    } else {
                        tokio::fs::remove_dir(&path).await?;
                        info!("Removed empty {}", path.display());
                    }
                    removed.push(path);
                }
                Ok(false) => debug!("Keeping non-empty {}", path.display()),
                Err(e) => warn!("Could not read {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    /// Ensure folders, move files, prune what stayed empty
    pub async fn organize(&self, source_root: &Path, dest_root: &Path) -> Result<OrganizeReport> {
        // Both roots are checked up front so nothing is created for a bad source.
        FileManager::resolve_dir(source_root)?;
        FileManager::resolve_dir(dest_root)?;

        let created = if self.dry_run {
            Vec::new()
        } else {
            self.ensure_folders(dest_root).await?
        };
        let moves = self.move_files(source_root, dest_root).await?;
        let pruned = if self.dry_run {
            Vec::new()
        } else {
            self.prune_empty(dest_root).await?
        };

        Ok(OrganizeReport {
            created,
            moves,
            pruned,
        })
    }
}

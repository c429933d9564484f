//! # MKV Track Extraction Module
//!
//! Dumps Matroska tracks with `mkvextract`.
//!
//! ## Responsibilities:
//! - Single track: `mkvextract <base>.mkv tracks <track>:<base>.<ext>`
//! - Several tracks of one file, the track number embedded in each name
//! - The same track from several files
//!
//! The output lands next to the input. `<ext>` may carry a language, as in
//! `en.srt`, so `Movie.mkv` track 2 with `en.srt` becomes `Movie.en.srt`.

use crate::args;
use crate::error::{Result, ToolkitError};
use crate::file_manager::FileManager;
use crate::process::run_process;
use crate::progress::{BatchSummary, ProgressManager};
use crate::tool_resolver::{Tool, ToolPathResolver};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

const TOOL: &str = "mkvextract";

/// Split `Movie.mkv` (or `Movie`) into the `.mkv` input and the bare base path
///
/// Works on the raw file name, so names that are not valid UTF-8 survive intact.
pub fn split_mkv_path(input: &Path) -> (PathBuf, PathBuf) {
    let is_mkv = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mkv"));
    if is_mkv {
        (input.to_path_buf(), input.with_extension(""))
    } else {
        (with_suffix(input, "mkv"), input.to_path_buf())
    }
}

/// Append `.<extension>` to a base path without touching dots already in it
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix.trim_start_matches('.'));
    PathBuf::from(name)
}

/// Handle to a resolved mkvextract binary
#[derive(Debug, Clone)]
pub struct MkvExtract {
    path: PathBuf,
    overwrite: bool,
}

impl MkvExtract {
    pub fn new(path: PathBuf, overwrite: bool) -> Self {
        Self { path, overwrite }
    }

    /// Locate mkvextract, failing with `MissingDependency` if it is not installed
    pub fn from_resolver(resolver: &ToolPathResolver, overwrite: bool) -> Result<Self> {
        Ok(Self::new(resolver.require(Tool::MkvExtract)?, overwrite))
    }

    pub fn extract_args(input: &Path, track: u32, output: &Path) -> Vec<OsString> {
        let mut target = OsString::from(format!("{}:", track));
        target.push(output.as_os_str());
        args![input, "tracks", target]
    }

    async fn extract_to(&self, input: &Path, track: u32, output: PathBuf) -> Result<PathBuf> {
        if !input.exists() {
            return Err(ToolkitError::FileNotFound(input.to_path_buf()));
        }
        if output.exists() && !self.overwrite {
            return Err(ToolkitError::FileExists(output));
        }

        run_process(&self.path, &Self::extract_args(input, track, &output))
            .await?
            .into_result(TOOL)?;

        info!("Extracted track {} of {} -> {}", track, input.display(), output.display());
        Ok(output)
    }

    /// Extract `track` of `input` into `<base>.<extension>`
    pub async fn extract_track(&self, input: &Path, track: u32, extension: &str) -> Result<PathBuf> {
        let (mkv, base) = split_mkv_path(input);
        self.extract_to(&mkv, track, with_suffix(&base, extension)).await
    }

    /// Extract several tracks of one file into `<base>.<track>.<extension>` each
    pub async fn extract_tracks(
        &self,
        input: &Path,
        tracks: &[u32],
        extension: &str,
        show_progress: bool,
    ) -> Result<BatchSummary> {
        let (mkv, base) = split_mkv_path(input);
        FileManager::resolve_input(&mkv)?;

        let progress = ProgressManager::new(tracks.len() as u64, show_progress);
        let mut summary = BatchSummary::new();

        for &track in tracks {
            let output = with_suffix(&base, &format!("{}.{}", track, extension.trim_start_matches('.')));
            let label = format!("track {} -> {}", track, output.display());
            match self.extract_to(&mkv, track, output).await {
                Ok(_) => summary.add_success(label.clone()),
                Err(e) => summary.add_error(label.clone(), &e),
            }
            progress.update(&label);
        }

        progress.finish(&summary.format_summary());
        Ok(summary)
    }

    /// Extract the same track from every file in `inputs`
    pub async fn extract_from_files(
        &self,
        inputs: &[PathBuf],
        track: u32,
        extension: &str,
        show_progress: bool,
    ) -> BatchSummary {
        let progress = ProgressManager::new(inputs.len() as u64, show_progress);
        let mut summary = BatchSummary::new();

        for input in inputs {
            let label = format!("{} track {}", input.display(), track);
            match self.extract_track(input, track, extension).await {
                Ok(output) => summary.add_success(output.display().to_string()),
                Err(e) => summary.add_error(label.clone(), &e),
            }
            progress.update(&label);
        }

        progress.finish(&summary.format_summary());
        summary
    }
}

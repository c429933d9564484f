//! # FFprobe Wrapper Module
//!
//! Runs ffprobe with JSON output and turns the result into stream metadata.
//!
//! ## Responsibilities:
//! - Always invoke as `ffprobe -v error -of json <args>`
//! - Keep the raw process result next to the parsed payload so a failed or
//!   unparsable probe can still be diagnosed
//! - Version lookup (`program_version.version`)
//! - Stream enumeration with per-type indices, optionally filtered
//! - Single-stream lookup delegated to `-select_streams`
//!
//! ## Failure handling:
//! `run()` never fails on a bad exit code or bad JSON: it returns a
//! `ProbeOutcome` with `parsed == None`. The typed helpers turn that into
//! `ToolFailed` (non-zero exit, stderr attached) or `Parse` (exit 0 but no
//! usable JSON).

use crate::args;
use crate::error::{Result, ToolkitError};
use crate::file_manager::FileManager;
use crate::process::{run_process, ProcessResult};
use crate::progress::{BatchSummary, ProgressManager};
use crate::streams::{build_stream_infos, RawProbeOutput, StreamCollection, StreamFilter, StreamInfo};
use crate::tool_resolver::{Tool, ToolPathResolver};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TOOL: &str = "ffprobe";

/// Result of one ffprobe run
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// Parsed stdout; `None` on non-zero exit or malformed/empty JSON
    pub parsed: Option<serde_json::Value>,
    pub process: ProcessResult,
}

impl ProbeOutcome {
    /// Parsed payload, or the error explaining why there is none
    pub fn into_payload(self) -> Result<serde_json::Value> {
        if let Some(value) = self.parsed {
            return Ok(value);
        }
        match self.process {
            ProcessResult::Failure(output) => Err(ToolkitError::ToolFailed {
                tool: TOOL.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim_end().to_string(),
            }),
            ProcessResult::Success(_) => Err(ToolkitError::Parse {
                tool: TOOL.to_string(),
                message: "empty or malformed JSON on stdout".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionOutput {
    program_version: ProgramVersion,
}

#[derive(Debug, Deserialize)]
struct ProgramVersion {
    version: String,
}

/// Handle to a resolved ffprobe binary
#[derive(Debug, Clone)]
pub struct Ffprobe {
    path: PathBuf,
}

impl Ffprobe {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Locate ffprobe, failing with `MissingDependency` if it is not installed
    pub fn from_resolver(resolver: &ToolPathResolver) -> Result<Self> {
        Ok(Self::new(resolver.require(Tool::Ffprobe)?))
    }

    /// Full argument list for a probe: fixed flags first
    pub fn probe_args(extra: Vec<OsString>) -> Vec<OsString> {
        let mut args = args!["-v", "error", "-of", "json"];
        args.extend(extra);
        args
    }

    /// Run ffprobe with `extra` arguments and try to parse its JSON output
    pub async fn run(&self, extra: Vec<OsString>) -> Result<ProbeOutcome> {
        let process = run_process(&self.path, &Self::probe_args(extra)).await?;

        let parsed = if process.is_success() {
            match serde_json::from_str::<serde_json::Value>(&process.output().stdout) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Could not parse ffprobe output: {}", e);
                    None
                }
            }
        } else {
            warn!(
                "ffprobe exited with code {}: {}",
                process.exit_code(),
                process.output().stderr.trim_end()
            );
            None
        };

        Ok(ProbeOutcome { parsed, process })
    }

    /// ffprobe's own version string
    pub async fn version(&self) -> Result<String> {
        let payload = self.run(args!["-show_program_version"]).await?.into_payload()?;
        let version: VersionOutput = serde_json::from_value(payload).map_err(|e| ToolkitError::Parse {
            tool: TOOL.to_string(),
            message: format!("missing program_version.version: {}", e),
        })?;
        Ok(version.program_version.version)
    }

    async fn probe_streams(&self, file: &Path, select: Option<String>) -> Result<RawProbeOutput> {
        let mut extra = args!["-show_streams"];
        if let Some(spec) = select {
            extra.extend(args!["-select_streams", spec]);
        }
        extra.push(file.as_os_str().to_os_string());

        let payload = self.run(extra).await?.into_payload()?;
        serde_json::from_value(payload).map_err(|e| ToolkitError::Parse {
            tool: TOOL.to_string(),
            message: format!("unexpected streams layout: {}", e),
        })
    }

    /// Every stream of `file` matching `filter`, in file order
    pub async fn streams(&self, file: &Path, filter: StreamFilter) -> Result<Vec<StreamInfo>> {
        let file = FileManager::resolve_input(file)?;
        let raw = self.probe_streams(&file, None).await?;
        let streams = build_stream_infos(&file, raw.streams, filter);
        debug!("{}: {} {:?} streams", file.display(), streams.len(), filter);
        Ok(streams)
    }

    /// The `index`-th stream of the filtered type, or `None` if there is no such stream.
    ///
    /// With `StreamFilter::All` the index is absolute.
    pub async fn stream(&self, file: &Path, index: u32, filter: StreamFilter) -> Result<Option<StreamInfo>> {
        let file = FileManager::resolve_input(file)?;

        if filter == StreamFilter::All {
            // A lone probed stream cannot tell its type index; count over the whole file.
            let raw = self.probe_streams(&file, None).await?;
            return Ok(build_stream_infos(&file, raw.streams, filter)
                .into_iter()
                .find(|s| s.index == index));
        }

        let raw = self.probe_streams(&file, Some(filter.select_spec(index))).await?;
        Ok(raw
            .streams
            .into_iter()
            .find(|s| filter.matches(s.codec_type))
            .map(|s| StreamInfo::from_raw(&file, s, index)))
    }

    /// Probe several files, continuing past files that fail
    pub async fn collect(
        &self,
        files: &[PathBuf],
        filter: StreamFilter,
        show_progress: bool,
    ) -> (StreamCollection, BatchSummary) {
        let progress = ProgressManager::new(files.len() as u64, show_progress && files.len() > 1);
        let mut collection = StreamCollection::new();
        let mut summary = BatchSummary::new();

        for file in files {
            let label = file.display().to_string();
            match self.streams(file, filter).await {
                Ok(streams) => {
                    let key = FileManager::absolute(file).unwrap_or_else(|_| file.clone());
                    collection.insert(key, streams);
                    summary.add_success(label.clone());
                }
                Err(e) => summary.add_error(label.clone(), &e),
            }
            progress.update(&label);
        }

        progress.finish(&summary.format_summary());
        info!("Probed {} files, {} streams", summary.succeeded.len(), collection.len());
        (collection, summary)
    }
}

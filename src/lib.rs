//! # Media Toolkit Library
//!
//! Public API behind the `media-toolkit` binary.
//!
//! ## Responsibilities:
//! - Wrap ffprobe, ffmpeg and mkvextract: build arguments, run them, parse output
//! - Model the streams of a media file with per-type indices
//! - Organize Plex bonus content into its fixed folder layout
//!
//! ## Module layout:
//! - `config`: user settings, validation, JSON load/save
//! - `error`: `ToolkitError` for every expected failure
//! - `tool_resolver`: where the external binaries live
//! - `process`: spawn one tool, drain stdout/stderr concurrently
//! - `ffprobe` / `ffmpeg` / `mkvextract`: the three tool wrappers
//! - `streams`: stream descriptors, filters, collections
//! - `plex`: bonus-content layout table and organizer phases
//! - `file_manager`: path resolution, discovery, moves
//! - `progress`: progress bars and per-item batch summaries
//! - `json_output`: machine-readable command results
//! - `toolkit`: `MediaToolkit`, a config bound to the wrappers
//!
//! ## Usage:
//! ```no_run
//! use media_toolkit::{Config, MediaToolkit, StreamFilter};
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let toolkit = MediaToolkit::new(Config::default())?;
//! let subtitles = toolkit
//!     .ffprobe()?
//!     .streams(Path::new("Movie.mkv"), StreamFilter::Subtitle)
//!     .await?;
//! for stream in &subtitles {
//!     println!("{} {:?}", stream.map_spec(0, true), stream.language);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod ffprobe;
pub mod file_manager;
pub mod json_output;
pub mod mkvextract;
pub mod plex;
pub mod process;
pub mod progress;
pub mod streams;
pub mod tool_resolver;
pub mod toolkit;
pub mod utils;

#[cfg(all(test, unix))]
mod test_support;

pub use config::Config;
pub use error::ToolkitError;
pub use process::{ProcessOutput, ProcessResult};
pub use progress::BatchSummary;
pub use streams::{CodecType, StreamCollection, StreamFilter, StreamInfo, StreamRef};
pub use toolkit::MediaToolkit;

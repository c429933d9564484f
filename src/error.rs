//! # Error Types Module
//!
//! Defines the typed errors raised by the library side of the toolkit.
//!
//! ## Responsibilities:
//! - `ToolkitError` enum categorizing every expected failure mode
//! - Descriptive messages naming the file, track or tool involved
//! - Automatic conversion from I/O and JSON errors through `thiserror`
//!
//! ## Categories:
//! - `MissingDependency`: external tool not found (raised before any spawn)
//! - `FileNotFound` / `FileExists` / `Validation`: invalid input
//! - `ToolFailed`: external tool exited non-zero, carries raw stderr
//! - `Parse`: tool output was empty or malformed JSON
//!
//! The binary wraps these in `anyhow` for reporting. Batch loops match on
//! `FileExists` to skip an item instead of aborting.
//!
//! ## Example:
//! ```ignore
//! if !input.exists() {
//!     return Err(ToolkitError::FileNotFound(input.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;

/// Custom error types for tool invocation and file organization
#[derive(thiserror::Error, Debug)]
pub enum ToolkitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dependency missing: {0} is not installed or not on PATH")]
    MissingDependency(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Output file already exists: {} (use --overwrite to replace it)", .0.display())]
    FileExists(PathBuf),

    #[error("{tool} exited with code {exit_code}: {stderr}")]
    ToolFailed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ToolkitError {
    /// Whether a batch loop may skip the item and keep going
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::FileExists(_))
    }
}

pub type Result<T> = std::result::Result<T, ToolkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_message_keeps_stderr() {
        let err = ToolkitError::ToolFailed {
            tool: "ffmpeg".to_string(),
            exit_code: 1,
            stderr: "Stream map '0:a:3' matches no streams.".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("code 1"));
        assert!(msg.contains("matches no streams"));
    }

    #[test]
    fn test_only_file_exists_is_skippable() {
        assert!(ToolkitError::FileExists(PathBuf::from("a.srt")).is_skippable());
        assert!(!ToolkitError::FileNotFound(PathBuf::from("a.mkv")).is_skippable());
        assert!(!ToolkitError::MissingDependency("mkvextract".into()).is_skippable());
    }
}

//! # JSON Output Module
//!
//! Structured results on stdout for scripts that drive the toolkit.
//!
//! ## Responsibilities:
//! - One JSON object per command, tagged by `type`
//! - Reuses the library's own result types (streams, batch summaries,
//!   organizer reports) so text and JSON output never drift apart
//!
//! ## Message types:
//! - `version`, `tools`: tool information
//! - `streams`, `stream`: probe results
//! - `exported`, `batch`: extraction results
//! - `folders`, `moves`, `pruned`, `organize`: Plex organizer phases
//! - `config_written`, `config`, `config_valid`: config file commands
//! - `error`: a failure, with the message chain

use crate::config::Config;
use crate::plex::{MoveReport, OrganizeReport};
use crate::progress::BatchSummary;
use crate::streams::{StreamCollection, StreamInfo};
use serde::Serialize;
use std::path::PathBuf;

/// Availability of one external tool
#[derive(Debug, Serialize)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
}

/// JSON message printed on stdout
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Version {
        version: String,
    },

    Tools {
        tools: Vec<ToolStatus>,
    },

    Streams {
        files: StreamCollection,
        summary: BatchSummary,
    },

    Stream {
        stream: Option<StreamInfo>,
    },

    Exported {
        output: PathBuf,
    },

    Batch {
        summary: BatchSummary,
    },

    Folders {
        created: Vec<PathBuf>,
    },

    Moves {
        report: MoveReport,
    },

    Pruned {
        removed: Vec<PathBuf>,
    },

    Organize {
        report: OrganizeReport,
    },

    ConfigWritten {
        path: PathBuf,
    },

    Config {
        path: PathBuf,
        config: Config,
    },

    ConfigValid {
        path: PathBuf,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

impl JsonMessage {
    /// Serialize to a single line
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"serialization failed: {}"}}"#, e)
        })
    }

    /// Print the message on stdout
    pub fn emit(&self) {
        println!("{}", self.to_line());
    }

    pub fn error(error: &anyhow::Error) -> Self {
        let details: Vec<String> = error.chain().skip(1).map(|e| e.to_string()).collect();
        Self::Error {
            message: error.to_string(),
            details: if details.is_empty() {
                None
            } else {
                Some(details.join(": "))
            },
        }
    }
}

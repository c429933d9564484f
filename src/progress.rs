//! # Progress Tracking and Batch Summary Module
//!
//! Feedback for multi-item operations (several tracks, files or streams).
//!
//! ## Responsibilities:
//! - Progress bar with `indicatif` while a batch runs
//! - `BatchSummary`: per-item outcome of a continue-on-error loop
//! - Final one-line report of succeeded/skipped/failed items
//!
//! ## Batch semantics:
//! A failed item is recorded and the loop moves on. Only structural
//! preconditions (missing tool, missing root folder) abort a whole batch.
//!
//! ## Example:
//! ```ignore
//! let progress = ProgressManager::new(files.len() as u64, !config.json_output);
//! let mut summary = BatchSummary::new();
//! for file in files {
//!     match extract(file).await {
//!         Ok(out) => summary.add_success(out.display().to_string()),
//!         Err(e) => summary.add_error(file.display().to_string(), &e),
//!     }
//!     progress.update(&file.display().to_string());
//! }
//! progress.finish(&summary.format_summary());
//! ```

use crate::error::ToolkitError;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Manages progress reporting for batch operations
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar; a hidden one when `visible` is false
    pub fn new(total_items: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_items);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// One item that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub item: String,
    pub reason: String,
}

/// Outcome of a continue-on-error batch
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    pub skipped: Vec<ItemOutcome>,
    pub failed: Vec<ItemOutcome>,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    pub fn add_skipped(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(ItemOutcome {
            item: item.into(),
            reason: reason.into(),
        });
    }

    pub fn add_failure(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(ItemOutcome {
            item: item.into(),
            reason: reason.into(),
        });
    }

    /// Record an error as skipped or failed depending on its kind
    pub fn add_error(&mut self, item: impl Into<String>, error: &ToolkitError) {
        let item = item.into();
        if error.is_skippable() {
            warn!("Skipping {}: {}", item, error);
            self.add_skipped(item, error.to_string());
        } else {
            warn!("Failed {}: {}", item, error);
            self.add_failure(item, error.to_string());
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} | Succeeded: {} | Skipped: {} | Failed: {}",
            self.total(),
            self.succeeded.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

//! # Toolkit Entry Point
//!
//! Ties a validated `Config` to the tool wrappers. Each accessor resolves its
//! binary on demand, so a command only fails on the tools it actually needs.

use crate::config::Config;
use crate::error::Result;
use crate::ffmpeg::Ffmpeg;
use crate::ffprobe::Ffprobe;
use crate::json_output::ToolStatus;
use crate::mkvextract::MkvExtract;
use crate::plex::PlexOrganizer;
use crate::tool_resolver::{Tool, ToolPathResolver};

/// Configured access to every wrapper
pub struct MediaToolkit {
    config: Config,
    resolver: ToolPathResolver,
}

impl MediaToolkit {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let resolver = ToolPathResolver::new(&config);
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether progress bars should be drawn
    pub fn show_progress(&self) -> bool {
        !self.config.json_output
    }

    pub fn ffprobe(&self) -> Result<Ffprobe> {
        Ffprobe::from_resolver(&self.resolver)
    }

    pub fn ffmpeg(&self) -> Result<Ffmpeg> {
        Ffmpeg::from_resolver(&self.resolver)
    }

    pub fn mkvextract(&self) -> Result<MkvExtract> {
        MkvExtract::from_resolver(&self.resolver, self.config.overwrite)
    }

    pub fn organizer(&self) -> PlexOrganizer {
        PlexOrganizer::new(self.config.bonus_extensions.clone()).dry_run(self.config.dry_run)
    }

    pub fn tools_report(&self) -> String {
        self.resolver.get_tools_report()
    }

    pub fn tool_statuses(&self) -> Vec<ToolStatus> {
        Tool::ALL
            .iter()
            .map(|&tool| ToolStatus {
                name: tool.name(),
                path: self.resolver.resolve_tool(tool),
            })
            .collect()
    }
}

//! # Tool Path Resolver
//!
//! Finds the external binaries the toolkit drives:
//! - An explicit override from the config file
//! - A tools directory named by `MEDIA_TOOLKIT_TOOLS_DIR`
//! - The system `PATH`

use crate::config::Config;
use crate::error::{Result, ToolkitError};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "MEDIA_TOOLKIT_TOOLS_DIR";

/// External tools the toolkit wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Ffmpeg,
    Ffprobe,
    MkvExtract,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Ffmpeg, Tool::Ffprobe, Tool::MkvExtract];

    /// Executable name without platform extension
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
            Tool::MkvExtract => "mkvextract",
        }
    }

    fn install_hint(&self) -> &'static str {
        match self {
            Tool::Ffmpeg | Tool::Ffprobe => {
                if cfg!(target_os = "windows") {
                    "winget install Gyan.FFmpeg"
                } else if cfg!(target_os = "macos") {
                    "brew install ffmpeg"
                } else {
                    "sudo apt-get install ffmpeg"
                }
            }
            Tool::MkvExtract => {
                if cfg!(target_os = "windows") {
                    "winget install MoritzBunkus.MKVToolNix"
                } else if cfg!(target_os = "macos") {
                    "brew install mkvtoolnix"
                } else {
                    "sudo apt-get install mkvtoolnix"
                }
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tool path resolver honoring config overrides and a tools directory
pub struct ToolPathResolver {
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
    mkvextract: Option<PathBuf>,
    /// Directory searched before `PATH`
    tools_dir: Option<PathBuf>,
    /// Replacement for the `PATH` variable; `None` uses the environment
    search_path: Option<OsString>,
}

impl ToolPathResolver {
    /// Create a resolver from the overrides in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            mkvextract: config.mkvextract_path.clone(),
            tools_dir: Self::detect_tools_dir(),
            search_path: None,
        }
    }

    /// Search these directories (same syntax as `PATH`) instead of `PATH`
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Look in `dir` before `PATH`, as `MEDIA_TOOLKIT_TOOLS_DIR` does
    pub fn with_tools_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.tools_dir = dir;
        self
    }

    fn detect_tools_dir() -> Option<PathBuf> {
        let dir = PathBuf::from(env::var_os(TOOLS_DIR_ENV)?);
        debug!("Checking {}: {:?}", TOOLS_DIR_ENV, dir);
        if dir.is_dir() {
            Some(dir)
        } else {
            warn!("{} does not point to a directory: {}", TOOLS_DIR_ENV, dir.display());
            None
        }
    }

    fn override_for(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Ffmpeg => self.ffmpeg.as_deref(),
            Tool::Ffprobe => self.ffprobe.as_deref(),
            Tool::MkvExtract => self.mkvextract.as_deref(),
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool: Tool) -> Option<PathBuf> {
        if let Some(path) = self.override_for(tool) {
            if path.is_file() {
                debug!("Using configured {}: {:?}", tool, path);
                return Some(path.to_path_buf());
            }
            warn!("Configured path for {} does not exist: {}", tool, path.display());
        }

        if let Some(ref tools_dir) = self.tools_dir {
            let extension = if cfg!(windows) { ".exe" } else { "" };
            let bundled = tools_dir.join(format!("{}{}", tool.name(), extension));
            if bundled.is_file() {
                debug!("Using bundled {}: {:?}", tool, bundled);
                return Some(bundled);
            }
        }

        let found = match self.search_path {
            Some(ref paths) => env::current_dir()
                .ok()
                .and_then(|cwd| which::which_in(tool.name(), Some(paths), cwd).ok()),
            None => which::which(tool.name()).ok(),
        };
        if let Some(ref path) = found {
            debug!("Using system {}: {:?}", tool, path);
        }
        found
    }

    /// Resolve a tool or fail with `MissingDependency` before anything is spawned
    pub fn require(&self, tool: Tool) -> Result<PathBuf> {
        self.resolve_tool(tool).ok_or_else(|| {
            ToolkitError::MissingDependency(format!(
                "{} (install with: {})",
                tool,
                tool.install_hint()
            ))
        })
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self) -> String {
        let mut report = String::from("Tool availability:\n");
        if let Some(ref dir) = self.tools_dir {
            report.push_str(&format!("Tools dir: {}\n", dir.display()));
        }

        for tool in Tool::ALL {
            match self.resolve_tool(tool) {
                Some(path) => report.push_str(&format!("  ✅ {} -> {}\n", tool, path.display())),
                None => report.push_str(&format!(
                    "  ❌ {} (install with: {})\n",
                    tool,
                    tool.install_hint()
                )),
            }
        }

        report
    }
}

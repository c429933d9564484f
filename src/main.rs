//! # Media Toolkit - Main Entry Point
//!
//! ## Responsibilities:
//! - Parse the command line with `clap`
//! - Set up `tracing` logging on stderr (INFO, DEBUG with `--verbose`, `RUST_LOG` wins)
//! - Load the config file and apply CLI overrides
//! - Dispatch to the library and print the result as text or JSON
//!
//! ## Exit status:
//! - 0 when the command succeeded, including batches that only skipped items
//! - 1 on an error, or when any item of a batch failed
//!
//! ## Example:
//! ```bash
//! media-toolkit streams Movie.mkv --type subtitle
//! media-toolkit mkv-track Movie.mkv 2 en.srt
//! media-toolkit plex organize ./downloads ./Movies/Movie --dry-run
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use media_toolkit::ffmpeg::StreamSource;
use media_toolkit::json_output::JsonMessage;
use media_toolkit::plex::MoveReport;
use media_toolkit::{
    BatchSummary, CodecType, Config, MediaToolkit, StreamCollection, StreamFilter, StreamInfo, StreamRef,
};

#[derive(Parser)]
#[command(name = "media-toolkit")]
#[command(author, version, about = "Inspect, extract and organize media with ffmpeg, ffprobe and mkvextract")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Tool(ToolCommands),

    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ToolCommands {
    /// Display the ffprobe version
    Version,

    /// Check that the external tools are available
    Tools,

    /// List the streams of one or more files
    Streams {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Stream type: all, video, audio, subtitle, data
        #[arg(short = 't', long = "type", default_value = "all")]
        stream_type: StreamFilter,

        /// Only streams tagged with this language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show a single stream
    Stream {
        file: PathBuf,

        /// Index among streams of `--type`, absolute for `all`
        index: u32,

        /// Stream type: all, video, audio, subtitle, data
        #[arg(short = 't', long = "type", default_value = "all")]
        stream_type: StreamFilter,
    },

    /// Copy one stream into its own file
    Export {
        file: PathBuf,

        /// Index among streams of `--type`, absolute for `all`
        index: u32,

        output: PathBuf,

        /// Stream type: all, video, audio, subtitle, data
        #[arg(short = 't', long = "type", default_value = "all")]
        stream_type: StreamFilter,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Copy every matching stream of the given files into a directory
    ExportAll {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory receiving the exported streams
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Stream type: all, video, audio, subtitle, data
        #[arg(short = 't', long = "type", default_value = "all")]
        stream_type: StreamFilter,

        #[arg(short, long)]
        language: Option<String>,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Add streams from other files to a primary file's video
    Add {
        primary: PathBuf,

        output: PathBuf,

        /// Video source as `path[,language[,title]]`
        #[arg(long = "video", value_name = "SOURCE")]
        videos: Vec<String>,

        /// Audio source as `path[,language[,title]]`
        #[arg(long = "audio", value_name = "SOURCE")]
        audios: Vec<String>,

        /// Subtitle source as `path[,language[,title]]`
        #[arg(long = "subtitle", value_name = "SOURCE")]
        subtitles: Vec<String>,

        /// Stop at the end of the shortest stream
        #[arg(long)]
        shortest: bool,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Extract one track of an MKV file into `<base>.<ext>`
    MkvTrack {
        file: PathBuf,

        track: u32,

        /// Output extension, may carry a language (`en.srt`)
        ext: String,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Extract several tracks of an MKV file into `<base>.<track>.<ext>`
    MkvTracks {
        file: PathBuf,

        ext: String,

        #[arg(required = true)]
        tracks: Vec<u32>,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Extract the same track from several MKV files
    MkvBatch {
        ext: String,

        track: u32,

        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        overwrite: OverwriteArg,
    },

    /// Organize bonus content into Plex folders
    #[command(subcommand)]
    Plex(PlexCommands),
}

#[derive(Args)]
struct OverwriteArg {
    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,
}

#[derive(Args)]
struct PlexArgs {
    /// Show what would be done without touching the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Bonus extension to match, repeatable (replaces the configured list)
    #[arg(short, long = "extension", value_name = "EXT")]
    extensions: Vec<String>,
}

#[derive(Subcommand)]
enum PlexCommands {
    /// Create the bonus-content folders
    Folders { dest: PathBuf },

    /// Move bonus files into their folders
    Move {
        source: PathBuf,
        dest: PathBuf,
        #[command(flatten)]
        args: PlexArgs,
    },

    /// Remove bonus-content folders that are empty
    Prune {
        dest: PathBuf,
        #[command(flatten)]
        args: PlexArgs,
    },

    /// Create folders, move files, then prune empty folders
    Organize {
        source: PathBuf,
        dest: PathBuf,
        #[command(flatten)]
        args: PlexArgs,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Check the config file
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            if json {
                JsonMessage::error(&e).emit();
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    cli.config
        .clone()
        .or_else(Config::default_path)
        .context("No config directory on this platform, pass --config")
}

/// Run the command; `Ok(false)` means a batch finished with failures
async fn run(cli: Cli) -> Result<bool> {
    let command = match cli.command {
        Commands::Config(ref command) => return run_config(&config_path(&cli)?, command, cli.json).await,
        Commands::Tool(command) => command,
    };

    let mut config = match &cli.config {
        Some(path) if !path.exists() => anyhow::bail!("Config file not found: {}", path.display()),
        Some(path) => Config::from_file(path).await?,
        None => match Config::default_path() {
            Some(path) => Config::from_file(&path).await?,
            None => Config::default(),
        },
    };
    config.json_output |= cli.json;
    apply_overrides(&mut config, &command);
    debug!("Effective config: {:?}", config);

    let toolkit = MediaToolkit::new(config)?;
    let json = toolkit.config().json_output;
    let progress = toolkit.show_progress();
    let overwrite = toolkit.config().overwrite;

    match command {
        ToolCommands::Version => {
            let version = toolkit.ffprobe()?.version().await?;
            if json {
                JsonMessage::Version { version }.emit();
            } else {
                println!("{}", version);
            }
            Ok(true)
        }

        ToolCommands::Tools => {
            let tools = toolkit.tool_statuses();
            let all_found = tools.iter().all(|t| t.path.is_some());
            if json {
                JsonMessage::Tools { tools }.emit();
            } else {
                print!("{}", toolkit.tools_report());
            }
            Ok(all_found)
        }

        ToolCommands::Streams { files, stream_type, language } => {
            let (mut collection, summary) = toolkit.ffprobe()?.collect(&files, stream_type, progress).await;
            if let Some(language) = language {
                collection = collection.filter_language(&language);
            }
            if json {
                let ok = !summary.has_failures();
                JsonMessage::Streams {
                    files: collection,
                    summary,
                }
                .emit();
                Ok(ok)
            } else {
                print_collection(&collection);
                Ok(finish_batch(&summary, false))
            }
        }

        ToolCommands::Stream { file, index, stream_type } => {
            let stream = toolkit.ffprobe()?.stream(&file, index, stream_type).await?;
            if stream.is_none() {
                warn!("No {:?} stream {} in {}", stream_type, index, file.display());
            }
            if json {
                JsonMessage::Stream { stream }.emit();
            } else if let Some(stream) = stream {
                println!("{}", format_stream(&stream));
            }
            Ok(true)
        }

        ToolCommands::Export {
            file, index, output, stream_type, ..
        } => {
            let stream_ref = match stream_type.codec_type() {
                Some(codec_type) => StreamRef::typed(&file, codec_type, index),
                None => StreamRef::absolute(&file, index),
            };
            let output = toolkit.ffmpeg()?.export_stream(&stream_ref, &output, overwrite).await?;
            if json {
                JsonMessage::Exported { output }.emit();
            } else {
                println!("{}", output.display());
            }
            Ok(true)
        }

        ToolCommands::ExportAll {
            files,
            out_dir,
            stream_type,
            language,
            ..
        } => {
            let ffprobe = toolkit.ffprobe()?;
            let ffmpeg = toolkit.ffmpeg()?;
            let (mut collection, mut summary) = ffprobe.collect(&files, stream_type, progress).await;
            if let Some(language) = language {
                collection = collection.filter_language(&language);
            }
            info!("Exporting {} stream(s) into {}", collection.len(), out_dir.display());

            let exported = ffmpeg.export_collection(&collection, &out_dir, overwrite, progress).await?;
            // Probe failures stay in the report next to the export outcomes.
            summary.succeeded = exported.succeeded;
            summary.skipped.extend(exported.skipped);
            summary.failed.extend(exported.failed);
            Ok(finish_batch(&summary, json))
        }

        ToolCommands::Add {
            primary,
            output,
            videos,
            audios,
            subtitles,
            ..
        } => {
            let mut sources = Vec::new();
            for (codec_type, specs) in [
                (CodecType::Video, &videos),
                (CodecType::Audio, &audios),
                (CodecType::Subtitle, &subtitles),
            ] {
                for spec in specs {
                    sources.push(StreamSource::parse(codec_type, spec)?);
                }
            }

            let output = toolkit
                .ffmpeg()?
                .add_streams(&primary, &sources, &output, overwrite, toolkit.config().shortest)
                .await?;
            if json {
                JsonMessage::Exported { output }.emit();
            } else {
                println!("{}", output.display());
            }
            Ok(true)
        }

        ToolCommands::MkvTrack { file, track, ext, .. } => {
            let output = toolkit.mkvextract()?.extract_track(&file, track, &ext).await?;
            if json {
                JsonMessage::Exported { output }.emit();
            } else {
                println!("{}", output.display());
            }
            Ok(true)
        }

        ToolCommands::MkvTracks { file, ext, tracks, .. } => {
            let summary = toolkit
                .mkvextract()?
                .extract_tracks(&file, &tracks, &ext, progress)
                .await?;
            Ok(finish_batch(&summary, json))
        }

        ToolCommands::MkvBatch { ext, track, files, .. } => {
            let summary = toolkit
                .mkvextract()?
                .extract_from_files(&files, track, &ext, progress)
                .await;
            Ok(finish_batch(&summary, json))
        }

        ToolCommands::Plex(command) => run_plex(&toolkit, command, json).await,
    }
}

/// Fold per-command flags into the loaded config
fn apply_overrides(config: &mut Config, command: &ToolCommands) {
    match command {
        ToolCommands::Export { overwrite, .. }
        | ToolCommands::ExportAll { overwrite, .. }
        | ToolCommands::MkvTrack { overwrite, .. }
        | ToolCommands::MkvTracks { overwrite, .. }
        | ToolCommands::MkvBatch { overwrite, .. } => config.overwrite |= overwrite.overwrite,
        ToolCommands::Add {
            overwrite, shortest, ..
        } => {
            config.overwrite |= overwrite.overwrite;
            config.shortest |= *shortest;
        }
        ToolCommands::Plex(
            PlexCommands::Move { args, .. } | PlexCommands::Prune { args, .. } | PlexCommands::Organize { args, .. },
        ) => {
            config.dry_run |= args.dry_run;
            if !args.extensions.is_empty() {
                config.bonus_extensions = args.extensions.clone();
            }
        }
        _ => {}
    }
}

async fn run_plex(toolkit: &MediaToolkit, command: PlexCommands, json: bool) -> Result<bool> {
    let organizer = toolkit.organizer();

    match command {
        PlexCommands::Folders { dest } => {
            let created = organizer.ensure_folders(&dest).await?;
            if json {
                JsonMessage::Folders { created }.emit();
            } else {
                println!("Created {} folder(s) under {}", created.len(), dest.display());
            }
            Ok(true)
        }

        PlexCommands::Move { source, dest, .. } => {
            let report = organizer.move_files(&source, &dest).await?;
            let ok = !report.summary.has_failures();
            if json {
                JsonMessage::Moves { report }.emit();
            } else {
                print_moves(&report);
            }
            Ok(ok)
        }

        PlexCommands::Prune { dest, args } => {
            let removed = organizer.prune_empty(&dest).await?;
            if json {
                JsonMessage::Pruned { removed }.emit();
            } else {
                let verb = if args.dry_run { "Would remove" } else { "Removed" };
                println!("{} {} empty folder(s)", verb, removed.len());
            }
            Ok(true)
        }

        PlexCommands::Organize { source, dest, .. } => {
            let report = organizer.organize(&source, &dest).await?;
            let ok = !report.moves.summary.has_failures();
            if json {
                JsonMessage::Organize { report }.emit();
            } else {
                println!("Created {} folder(s)", report.created.len());
                print_moves(&report.moves);
                println!("Removed {} empty folder(s)", report.pruned.len());
            }
            Ok(ok)
        }
    }
}

async fn run_config(path: &Path, command: &ConfigCommands, json: bool) -> Result<bool> {
    let path = path.to_path_buf();
    match command {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("Config file already exists: {} (use --force)", path.display());
            }
            Config::default().save_to_file(&path).await?;
            info!("Wrote default config to {}", path.display());
            if json {
                JsonMessage::ConfigWritten { path }.emit();
            } else {
                println!("{}", path.display());
            }
        }
        ConfigCommands::Show => {
            let config = Config::from_file(&path).await?;
            if json {
                JsonMessage::Config { path, config }.emit();
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        ConfigCommands::Validate => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::from_file(&path).await?;
            if json {
                JsonMessage::ConfigValid { path }.emit();
            } else {
                println!("Config is valid: {}", path.display());
            }
        }
    }
    Ok(true)
}

/// Print the summary; returns false when any item failed
fn finish_batch(summary: &BatchSummary, json: bool) -> bool {
    if json {
        JsonMessage::Batch {
            summary: summary.clone(),
        }
        .emit();
    } else {
        for item in &summary.succeeded {
            println!("{}", item);
        }
        for outcome in &summary.failed {
            eprintln!("Failed {}: {}", outcome.item, outcome.reason);
        }
        eprintln!("{}", summary.format_summary());
    }
    !summary.has_failures()
}

fn format_stream(stream: &StreamInfo) -> String {
    let mut line = format!(
        "#{:<3} {}:{:<3} {:<10}",
        stream.index,
        stream.codec_type.letter(),
        stream.type_index,
        stream.codec_name
    );
    if let Some(ref language) = stream.language {
        line.push_str(&format!(" [{}]", language));
    }
    if let Some(ref title) = stream.title {
        line.push_str(&format!(" \"{}\"", title));
    }
    if stream.is_default() {
        line.push_str(" default");
    }
    if stream.is_forced() {
        line.push_str(" forced");
    }
    line
}

fn print_collection(collection: &StreamCollection) {
    for file in collection.files() {
        println!("{}", file.display());
        for stream in collection.get(file).unwrap_or_default() {
            println!("  {}", format_stream(stream));
        }
    }
}

fn print_moves(report: &MoveReport) {
    let verb = if report.dry_run { "Would move" } else { "Moved" };
    for file_move in &report.moved {
        println!("{} {} -> {}", verb, file_move.from.display(), file_move.to.display());
    }
    for outcome in &report.summary.skipped {
        println!("Skipped {}: {}", outcome.item, outcome.reason);
    }
    for outcome in &report.summary.failed {
        eprintln!("Failed {}: {}", outcome.item, outcome.reason);
    }
    println!("{} {} file(s)", verb, report.moved_count());
}

//! # FFmpeg Wrapper Module
//!
//! Stream-level remuxing with ffmpeg. Nothing is ever re-encoded: every
//! mapped stream is copied (`-c copy`).
//!
//! ## Responsibilities:
//! - Export one stream of a container to its own file
//! - Bulk export of a `StreamCollection` into a directory
//! - Add external audio/subtitle/video streams to a primary file, tagging
//!   each new stream with language and title metadata
//!
//! ## Invocation shape:
//! - Always `ffmpeg -v error -hide_banner <args>`
//! - Export: `-i <input> -y -map <spec> -c copy <output>` where `<spec>` is
//!   `0:<letter>:<type_index>` or `0:<absolute_index>`
//! - Add: one `-i` per input, `-map 0:v:0`, one `-map <n>:<letter>:0` per source,
//!   `-metadata:s:<letter>:<pos>` per tag, `-shortest` only on request
//!
//! ## Overwrite policy:
//! Outputs are resolved against the working directory. An existing output is
//! refused with `FileExists` unless overwrite was requested, so batch callers
//! can skip it and carry on.

use crate::args;
use crate::error::{Result, ToolkitError};
use crate::file_manager::FileManager;
use crate::process::{run_process, ProcessResult};
use crate::progress::{BatchSummary, ProgressManager};
use crate::streams::{CodecType, StreamCollection, StreamInfo, StreamRef};
use crate::tool_resolver::{Tool, ToolPathResolver};
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const TOOL: &str = "ffmpeg";

/// An external file contributing one stream to `Ffmpeg::add_streams`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub path: PathBuf,
    pub codec_type: CodecType,
    pub language: Option<String>,
    pub title: Option<String>,
}

impl StreamSource {
    pub fn new(path: impl Into<PathBuf>, codec_type: CodecType) -> Self {
        Self {
            path: path.into(),
            codec_type,
            language: None,
            title: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Parse `path[,language[,title]]`; the title may itself contain commas
    pub fn parse(codec_type: CodecType, spec: &str) -> Result<Self> {
        let mut parts = spec.splitn(3, ',');
        let path = parts.next().unwrap_or_default().trim();
        if path.is_empty() {
            return Err(ToolkitError::Validation(format!("Missing file in stream source '{}'", spec)));
        }

        let mut source = Self::new(path, codec_type);
        if let Some(language) = parts.next().map(str::trim).filter(|l| !l.is_empty()) {
            source = source.with_language(language);
        }
        if let Some(title) = parts.next().map(str::trim).filter(|t| !t.is_empty()) {
            source = source.with_title(title);
        }
        Ok(source)
    }
}

/// Output file name for every stream of `collection`, in iteration order.
///
/// A default name claimed by streams of more than one input gets the input's
/// parent folder name in front. A name that still clashes is an `Err`
/// describing the clash, so no export silently lands on another's output.
pub fn plan_output_names(collection: &StreamCollection) -> Vec<(&StreamInfo, std::result::Result<String, String>)> {
    let mut claimed_by: HashMap<String, HashSet<&Path>> = HashMap::new();
    for stream in collection.iter() {
        claimed_by
            .entry(stream.default_output_name())
            .or_default()
            .insert(stream.source_file.as_path());
    }

    let mut taken: HashMap<String, &Path> = HashMap::new();
    collection
        .iter()
        .map(|stream| {
            let default_name = stream.default_output_name();
            let name = if claimed_by.get(&default_name).map_or(0, HashSet::len) > 1 {
                let parent = stream
                    .source_file
                    .parent()
                    .and_then(Path::file_name)
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{}.{}", parent, default_name)
            } else {
                default_name
            };

            let planned = match taken.get(name.as_str()) {
                Some(owner) => Err(format!(
                    "output name {} is already used by {}",
                    name,
                    owner.display()
                )),
                None => {
                    taken.insert(name.clone(), stream.source_file.as_path());
                    Ok(name)
                }
            };
            (stream, planned)
        })
        .collect()
}

/// Handle to a resolved ffmpeg binary
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    path: PathBuf,
}

impl Ffmpeg {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Locate ffmpeg, failing with `MissingDependency` if it is not installed
    pub fn from_resolver(resolver: &ToolPathResolver) -> Result<Self> {
        Ok(Self::new(resolver.require(Tool::Ffmpeg)?))
    }

    /// Run ffmpeg with the fixed quiet flags followed by `extra`
    pub async fn run(&self, extra: Vec<OsString>) -> Result<ProcessResult> {
        let mut args = args!["-v", "error", "-hide_banner"];
        args.extend(extra);
        run_process(&self.path, &args).await
    }

    /// Arguments copying the stream addressed by `stream` into `output`
    pub fn export_args(stream: &StreamRef, output: &Path) -> Vec<OsString> {
        args![
            "-i",
            &stream.input,
            "-y",
            "-map",
            stream.map_spec(0),
            "-c",
            "copy",
            output,
        ]
    }

    /// Copy one stream into `output` without re-encoding
    pub async fn export_stream(&self, stream: &StreamRef, output: &Path, overwrite: bool) -> Result<PathBuf> {
        let input = FileManager::resolve_input(&stream.input)?;
        let output = FileManager::prepare_output(output, overwrite).await?;
        let stream = StreamRef {
            input,
            ..stream.clone()
        };

        debug!(
            "Exporting {} from {} to {}",
            stream.map_spec(0),
            stream.input.display(),
            output.display()
        );
        self.run(Self::export_args(&stream, &output))
            .await?
            .into_result(TOOL)?;

        info!("Exported {} -> {}", stream.map_spec(0), output.display());
        Ok(output)
    }

    /// Export every stream in `collection` into `out_dir`.
    ///
    /// Outputs are named `<stem>.<type>.<type_index>[.<lang>].<ext>`, prefixed
    /// with the parent folder when two inputs share a stem. Existing outputs
    /// are skipped, name clashes and tool errors are failures, the loop always
    /// continues.
    pub async fn export_collection(
        &self,
        collection: &StreamCollection,
        out_dir: &Path,
        overwrite: bool,
        show_progress: bool,
    ) -> Result<BatchSummary> {
        let out_dir = FileManager::absolute(out_dir)?;
        tokio::fs::create_dir_all(&out_dir).await?;

        let progress = ProgressManager::new(collection.len() as u64, show_progress);
        let mut summary = BatchSummary::new();

        for (stream, planned) in plan_output_names(collection) {
            let name = match planned {
                Ok(name) => name,
                Err(clash) => {
                    let label = format!("{} stream {}", stream.source_file.display(), stream.index);
                    warn!("Failed {}: {}", label, clash);
                    summary.add_failure(label.clone(), clash);
                    progress.update(&label);
                    continue;
                }
            };

            let output = out_dir.join(name);
            let label = output.display().to_string();
            match self.export_stream(&stream.to_ref(true), &output, overwrite).await {
                Ok(_) => summary.add_success(label.clone()),
                Err(e) => summary.add_error(label.clone(), &e),
            }
            progress.update(&label);
        }

        progress.finish(&summary.format_summary());
        Ok(summary)
    }

    /// Arguments muxing `primary`'s video with one stream from each source
    pub fn add_args(primary: &Path, sources: &[StreamSource], output: &Path, shortest: bool) -> Vec<OsString> {
        let mut args = args!["-i", primary];
        for source in sources {
            args.extend(args!["-i", &source.path]);
        }
        // Only the first video stream of the primary, so added video metadata lands at position 1.
        args.extend(args!["-y", "-map", "0:v:0"]);

        for (n, source) in sources.iter().enumerate() {
            args.extend(args!["-map", format!("{}:{}:0", n + 1, source.codec_type.letter())]);
        }
        args.extend(args!["-c", "copy"]);

        // Output position within each type; the primary's video stream comes first.
        let mut positions: HashMap<CodecType, u32> = HashMap::new();
        positions.insert(CodecType::Video, 1);
        for source in sources {
            let counter = positions.entry(source.codec_type).or_insert(0);
            let stream_spec = format!("-metadata:s:{}:{}", source.codec_type.letter(), counter);
            *counter += 1;

            if let Some(ref language) = source.language {
                args.extend(args![&stream_spec, format!("language={}", language)]);
            }
            if let Some(ref title) = source.title {
                args.extend(args![&stream_spec, format!("title={}", title)]);
            }
        }

        if shortest {
            args.push("-shortest".into());
        }
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// Add one stream from each source to `primary`, writing `output`
    pub async fn add_streams(
        &self,
        primary: &Path,
        sources: &[StreamSource],
        output: &Path,
        overwrite: bool,
        shortest: bool,
    ) -> Result<PathBuf> {
        if sources.is_empty() {
            return Err(ToolkitError::Validation("No streams to add".to_string()));
        }

        let primary = FileManager::resolve_input(primary)?;
        let mut resolved = Vec::with_capacity(sources.len());
        for source in sources {
            if !matches!(
                source.codec_type,
                CodecType::Video | CodecType::Audio | CodecType::Subtitle
            ) {
                return Err(ToolkitError::Validation(format!(
                    "Cannot add a {} stream from {}",
                    source.codec_type,
                    source.path.display()
                )));
            }
            resolved.push(StreamSource {
                path: FileManager::resolve_input(&source.path)?,
                ..source.clone()
            });
        }
        let output = FileManager::prepare_output(output, overwrite).await?;

        if !shortest {
            debug!("Output length follows the longest input (no -shortest)");
        }
        self.run(Self::add_args(&primary, &resolved, &output, shortest))
            .await?
            .into_result(TOOL)?;

        info!(
            "Added {} stream(s) to {} -> {}",
            resolved.len(),
            primary.display(),
            output.display()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{build_stream_infos, RawProbeOutput, StreamFilter};

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_export_args_by_type() {
        let stream = StreamRef::typed(Path::new("Movie.mkv"), CodecType::Subtitle, 1);
        assert_eq!(
            strings(Ffmpeg::export_args(&stream, Path::new("out.srt"))),
            ["-i", "Movie.mkv", "-y", "-map", "0:s:1", "-c", "copy", "out.srt"]
        );
    }

    #[test]
    fn test_export_args_absolute() {
        let stream = StreamRef::absolute(Path::new("Movie.mkv"), 4);
        let args = strings(Ffmpeg::export_args(&stream, Path::new("out.mka")));
        assert_eq!(args[4], "0:4");
    }

    #[test]
    fn test_add_args_positions_and_metadata() {
        let sources = vec![
            StreamSource::new("eng.ac3", CodecType::Audio).with_language("eng").with_title("Surround"),
            StreamSource::new("ita.aac", CodecType::Audio).with_language("ita"),
            StreamSource::new("eng.srt", CodecType::Subtitle).with_language("eng"),
        ];
        let args = strings(Ffmpeg::add_args(Path::new("Movie.mp4"), &sources, Path::new("Out.mkv"), false));

        assert_eq!(
            args,
            [
                "-i", "Movie.mp4", "-i", "eng.ac3", "-i", "ita.aac", "-i", "eng.srt",
                "-y", "-map", "0:v:0", "-map", "1:a:0", "-map", "2:a:0", "-map", "3:s:0",
                "-c", "copy",
                "-metadata:s:a:0", "language=eng",
                "-metadata:s:a:0", "title=Surround",
                "-metadata:s:a:1", "language=ita",
                "-metadata:s:s:0", "language=eng",
                "Out.mkv",
            ]
        );
    }

    #[test]
    fn test_add_args_maps_single_primary_video() {
        // A primary carrying cover art still contributes one video stream, so the
        // added camera angle is video position 1.
        let sources = vec![StreamSource::new("cam.mp4", CodecType::Video).with_title("Cam")];
        let args = strings(Ffmpeg::add_args(Path::new("Movie.mp4"), &sources, Path::new("Out.mkv"), false));

        assert_eq!(
            args,
            [
                "-i", "Movie.mp4", "-i", "cam.mp4",
                "-y", "-map", "0:v:0", "-map", "1:v:0",
                "-c", "copy",
                "-metadata:s:v:1", "title=Cam",
                "Out.mkv",
            ]
        );
        assert!(!args.contains(&"0:v".to_string()));
    }

    #[test]
    fn test_add_args_shortest_is_explicit() {
        let sources = vec![StreamSource::new("cam.mp4", CodecType::Video).with_language("und")];
        let args = strings(Ffmpeg::add_args(Path::new("Movie.mp4"), &sources, Path::new("Out.mkv"), true));
        assert!(args.contains(&"-metadata:s:v:1".to_string()));
        assert_eq!(args[args.len() - 2], "-shortest");

        let args = strings(Ffmpeg::add_args(Path::new("Movie.mp4"), &sources, Path::new("Out.mkv"), false));
        assert!(!args.contains(&"-shortest".to_string()));
    }

    fn audio_collection(files: &[&str]) -> StreamCollection {
        let mut collection = StreamCollection::new();
        for file in files {
            let raw: RawProbeOutput = serde_json::from_str(
                r#"{ "streams": [ { "index": 0, "codec_type": "audio", "codec_name": "aac" } ] }"#,
            )
            .unwrap();
            let path = PathBuf::from(file);
            let streams = build_stream_infos(&path, raw.streams, StreamFilter::All);
            collection.insert(path, streams);
        }
        collection
    }

    #[test]
    fn test_plan_names_unique_stems_unchanged() {
        let collection = audio_collection(&["/media/a/Movie.mkv", "/media/b/Other.mkv"]);
        let names: Vec<String> = plan_output_names(&collection)
            .into_iter()
            .map(|(_, name)| name.unwrap())
            .collect();
        assert_eq!(names, ["Movie.audio.0.aac", "Other.audio.0.aac"]);
    }

    #[test]
    fn test_plan_names_same_stem_gets_parent_prefix() {
        let collection = audio_collection(&["/media/a/Movie.mkv", "/media/b/Movie.mkv"]);
        let names: Vec<String> = plan_output_names(&collection)
            .into_iter()
            .map(|(_, name)| name.unwrap())
            .collect();
        assert_eq!(names, ["a.Movie.audio.0.aac", "b.Movie.audio.0.aac"]);
    }

    #[test]
    fn test_plan_names_unresolvable_clash_is_error() {
        let collection = audio_collection(&["/x/disc/Movie.mkv", "/y/disc/Movie.mkv"]);
        let planned = plan_output_names(&collection);
        assert_eq!(planned[0].1.as_deref(), Ok("disc.Movie.audio.0.aac"));
        let clash = planned[1].1.as_ref().unwrap_err();
        assert!(clash.contains("/x/disc/Movie.mkv"));
    }

    #[test]
    fn test_stream_source_parse() {
        let source = StreamSource::parse(CodecType::Audio, "commentary.aac,eng,Director, with cast").unwrap();
        assert_eq!(source.path, PathBuf::from("commentary.aac"));
        assert_eq!(source.language.as_deref(), Some("eng"));
        assert_eq!(source.title.as_deref(), Some("Director, with cast"));

        let bare = StreamSource::parse(CodecType::Subtitle, "subs.srt").unwrap();
        assert!(bare.language.is_none() && bare.title.is_none());

        assert!(StreamSource::parse(CodecType::Audio, ",eng").is_err());
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::super::*;
        use super::audio_collection;
        use crate::streams::{build_stream_infos, RawProbeOutput, StreamFilter};
        use crate::test_support::{fake_tool, recorded_args};
        use tempfile::TempDir;

        fn setup(body: &str) -> (TempDir, Ffmpeg, PathBuf) {
            let dir = TempDir::new().unwrap();
            let tool = fake_tool(dir.path(), "ffmpeg", body);
            let movie = dir.path().join("Movie.mkv");
            std::fs::write(&movie, "").unwrap();
            (dir, Ffmpeg::new(tool), movie)
        }

        #[tokio::test]
        async fn test_export_refuses_existing_output() {
            let (dir, ffmpeg, movie) = setup("exit 0");
            let output = dir.path().join("existing.srt");
            std::fs::write(&output, "keep me").unwrap();

            let stream = StreamRef::typed(&movie, CodecType::Subtitle, 0);
            let err = ffmpeg.export_stream(&stream, &output, false).await.unwrap_err();
            assert!(matches!(err, ToolkitError::FileExists(_)));
            assert!(!dir.path().join("ffmpeg.args").exists());
            assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");
        }

        #[tokio::test]
        async fn test_export_creates_destination_dir() {
            let (dir, ffmpeg, movie) = setup("exit 0");
            let output = dir.path().join("tracks").join("Movie.eng.srt");

            let stream = StreamRef::typed(&movie, CodecType::Subtitle, 0);
            let written = ffmpeg.export_stream(&stream, &output, false).await.unwrap();
            assert_eq!(written, output);
            assert!(dir.path().join("tracks").is_dir());

            let args = recorded_args(dir.path(), "ffmpeg");
            assert_eq!(&args[..3], &["-v", "error", "-hide_banner"]);
            assert!(args.contains(&"0:s:0".to_string()));
        }

        #[tokio::test]
        async fn test_export_failure_carries_stderr() {
            let (dir, ffmpeg, movie) = setup("echo \"Stream map '0:a:9' matches no streams.\" >&2; exit 1");
            let stream = StreamRef::typed(&movie, CodecType::Audio, 9);
            let err = ffmpeg
                .export_stream(&stream, &dir.path().join("out.aac"), false)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("matches no streams"));
        }

        #[tokio::test]
        async fn test_add_requires_sources_and_inputs() {
            let (dir, ffmpeg, movie) = setup("exit 0");
            let output = dir.path().join("out.mkv");

            let err = ffmpeg.add_streams(&movie, &[], &output, false, false).await.unwrap_err();
            assert!(matches!(err, ToolkitError::Validation(_)));

            let missing = vec![StreamSource::new(dir.path().join("nope.aac"), CodecType::Audio)];
            let err = ffmpeg.add_streams(&movie, &missing, &output, false, false).await.unwrap_err();
            assert!(matches!(err, ToolkitError::FileNotFound(_)));
        }

        #[tokio::test]
        async fn test_export_collection_skips_existing() {
            let (dir, ffmpeg, movie) = setup("exit 0");
            let raw: RawProbeOutput = serde_json::from_str(
                r#"{ "streams": [
                    { "index": 0, "codec_type": "audio", "codec_name": "aac", "tags": { "language": "eng" } },
                    { "index": 1, "codec_type": "subtitle", "codec_name": "subrip" }
                ] }"#,
            )
            .unwrap();
            let mut collection = StreamCollection::new();
            collection.insert(movie.clone(), build_stream_infos(&movie, raw.streams, StreamFilter::All));

            let out_dir = dir.path().join("out");
            std::fs::create_dir(&out_dir).unwrap();
            std::fs::write(out_dir.join("Movie.subtitle.0.srt"), "").unwrap();

            let summary = ffmpeg
                .export_collection(&collection, &out_dir, false, false)
                .await
                .unwrap();
            assert_eq!(summary.succeeded.len(), 1);
            assert_eq!(summary.skipped.len(), 1);
            assert!(summary.succeeded[0].ends_with("Movie.audio.0.eng.aac"));
        }

        #[tokio::test]
        async fn test_export_collection_same_stem_inputs_both_exported() {
            let (dir, ffmpeg, _movie) = setup("exit 0");
            let a = dir.path().join("a").join("Movie.mkv");
            let b = dir.path().join("b").join("Movie.mkv");
            for input in [&a, &b] {
                std::fs::create_dir_all(input.parent().unwrap()).unwrap();
                std::fs::write(input, "").unwrap();
            }
            let collection = audio_collection(&[a.to_str().unwrap(), b.to_str().unwrap()]);

            let out_dir = dir.path().join("out");
            let summary = ffmpeg
                .export_collection(&collection, &out_dir, false, false)
                .await
                .unwrap();
            assert_eq!(summary.succeeded.len(), 2);
            assert!(summary.skipped.is_empty());
            assert!(!summary.has_failures());
            assert!(summary.succeeded[0].ends_with("a.Movie.audio.0.aac"));
            assert!(summary.succeeded[1].ends_with("b.Movie.audio.0.aac"));
        }
    }
}

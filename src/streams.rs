//! # Stream Metadata Module
//!
//! Object model for the streams ffprobe reports inside a container.
//!
//! ## Responsibilities:
//! - `CodecType` / `StreamFilter`: stream categories and user-facing filters
//! - `StreamInfo`: one stream with its per-type index, language and title
//! - `StreamRef`: the minimum needed to address a stream for ffmpeg `-map`
//! - `StreamCollection`: streams of several files, filterable by type/language
//!
//! ## Type index:
//! ffprobe only reports the absolute stream index. The per-type index
//! (the N in `0:a:N`) is computed here by counting streams of the same
//! codec type in file order, starting at 0, fresh for every probe.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Category of a stream as reported by ffprobe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CodecType {
    /// Stream specifier letter used by ffmpeg and ffprobe.
    ///
    /// `Unknown` has no specifier; its `u` is only for listings.
    pub fn letter(&self) -> char {
        match self {
            CodecType::Video => 'v',
            CodecType::Audio => 'a',
            CodecType::Subtitle => 's',
            CodecType::Data => 'd',
            CodecType::Attachment => 't',
            CodecType::Unknown => 'u',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecType::Video => "video",
            CodecType::Audio => "audio",
            CodecType::Subtitle => "subtitle",
            CodecType::Data => "data",
            CodecType::Attachment => "attachment",
            CodecType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "video" | "v" => Ok(CodecType::Video),
            "audio" | "a" => Ok(CodecType::Audio),
            "subtitle" | "s" => Ok(CodecType::Subtitle),
            "data" | "d" => Ok(CodecType::Data),
            "attachment" | "t" => Ok(CodecType::Attachment),
            other => Err(format!(
                "unknown stream type '{}' (expected video, audio, subtitle, data or attachment)",
                other
            )),
        }
    }
}

/// Which streams an enumeration or lookup considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFilter {
    #[default]
    All,
    Video,
    Audio,
    Subtitle,
    Data,
}

impl StreamFilter {
    pub fn codec_type(&self) -> Option<CodecType> {
        match self {
            StreamFilter::All => None,
            StreamFilter::Video => Some(CodecType::Video),
            StreamFilter::Audio => Some(CodecType::Audio),
            StreamFilter::Subtitle => Some(CodecType::Subtitle),
            StreamFilter::Data => Some(CodecType::Data),
        }
    }

    pub fn matches(&self, codec_type: CodecType) -> bool {
        self.codec_type().map_or(true, |t| t == codec_type)
    }

    /// Argument for ffprobe `-select_streams`: `a:2`, or the absolute index for `All`
    pub fn select_spec(&self, index: u32) -> String {
        match self.codec_type() {
            Some(t) => format!("{}:{}", t.letter(), index),
            None => index.to_string(),
        }
    }
}

impl FromStr for StreamFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(StreamFilter::All);
        }
        match CodecType::from_str(s)? {
            CodecType::Video => Ok(StreamFilter::Video),
            CodecType::Audio => Ok(StreamFilter::Audio),
            CodecType::Subtitle => Ok(StreamFilter::Subtitle),
            CodecType::Data => Ok(StreamFilter::Data),
            other => Err(format!("'{}' streams cannot be used as a filter", other)),
        }
    }
}

/// One element of ffprobe's `streams` array
#[derive(Debug, Clone, Deserialize)]
pub struct RawStream {
    pub index: u32,
    #[serde(default)]
    pub codec_type: CodecType,
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub disposition: BTreeMap<String, serde_json::Value>,
}

/// Top-level ffprobe output as far as stream probing is concerned
#[derive(Debug, Clone, Deserialize)]
pub struct RawProbeOutput {
    #[serde(default)]
    pub streams: Vec<RawStream>,
}

/// A single stream of a media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamInfo {
    pub source_file: PathBuf,
    /// Absolute stream index within the file
    pub index: u32,
    pub codec_type: CodecType,
    pub codec_name: String,
    /// Position among streams of the same codec type, 0-based
    pub type_index: u32,
    pub language: Option<String>,
    pub title: Option<String>,
    pub disposition: BTreeMap<String, serde_json::Value>,
    pub tags: BTreeMap<String, String>,
}

fn tag_value(tags: &BTreeMap<String, String>, key: &str) -> Option<String> {
    tags.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
}

impl StreamInfo {
    pub fn from_raw(source_file: &Path, raw: RawStream, type_index: u32) -> Self {
        Self {
            source_file: source_file.to_path_buf(),
            index: raw.index,
            codec_type: raw.codec_type,
            codec_name: raw.codec_name.unwrap_or_else(|| "unknown".to_string()),
            type_index,
            language: tag_value(&raw.tags, "language"),
            title: tag_value(&raw.tags, "title"),
            disposition: raw.disposition,
            tags: raw.tags,
        }
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == CodecType::Video
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type == CodecType::Audio
    }

    pub fn is_subtitle(&self) -> bool {
        self.codec_type == CodecType::Subtitle
    }

    fn disposition_flag(&self, name: &str) -> bool {
        self.disposition
            .get(name)
            .and_then(|v| v.as_i64())
            .is_some_and(|v| v != 0)
    }

    pub fn is_default(&self) -> bool {
        self.disposition_flag("default")
    }

    pub fn is_forced(&self) -> bool {
        self.disposition_flag("forced")
    }

    /// Language tag matches `language`, ignoring case
    pub fn has_language(&self, language: &str) -> bool {
        self.language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(language))
    }

    /// ffmpeg `-map` spec: `<input>:<letter>:<type_index>` or `<input>:<index>`
    pub fn map_spec(&self, input_index: usize, by_type: bool) -> String {
        self.to_ref(by_type).map_spec(input_index)
    }

    /// Address this stream by per-type index (`by_type`) or absolute index.
    ///
    /// An unrecognized codec type has no ffmpeg specifier letter, so it is
    /// always addressed by absolute index.
    pub fn to_ref(&self, by_type: bool) -> StreamRef {
        if by_type && self.codec_type != CodecType::Unknown {
            StreamRef::typed(&self.source_file, self.codec_type, self.type_index)
        } else {
            StreamRef::absolute(&self.source_file, self.index)
        }
    }

    /// File extension suited to a raw copy of this stream
    pub fn suggested_extension(&self) -> &'static str {
        match self.codec_name.as_str() {
            "subrip" | "srt" => "srt",
            "ass" | "ssa" => "ass",
            "webvtt" => "vtt",
            "mov_text" => "srt",
            "hdmv_pgs_subtitle" => "sup",
            "aac" => "aac",
            "ac3" => "ac3",
            "eac3" => "eac3",
            "dts" => "dts",
            "truehd" => "thd",
            "flac" => "flac",
            "opus" => "opus",
            "mp3" => "mp3",
            "vorbis" => "ogg",
            "h264" => "h264",
            "hevc" => "hevc",
            "av1" => "ivf",
            _ => "mkv",
        }
    }

    /// `<stem>.<type>.<type_index>[.<lang>].<ext>`
    pub fn default_output_name(&self) -> String {
        let stem = self
            .source_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stream".to_string());
        let mut name = format!("{}.{}.{}", stem, self.codec_type, self.type_index);
        if let Some(ref language) = self.language {
            name.push('.');
            name.push_str(language);
        }
        name.push('.');
        name.push_str(self.suggested_extension());
        name
    }
}

/// Turn raw ffprobe streams into `StreamInfo`s, keeping those that match `filter`.
///
/// Type indices count every stream of a type, including ones the filter drops,
/// so they stay valid `-map` positions.
pub fn build_stream_infos(source_file: &Path, raw: Vec<RawStream>, filter: StreamFilter) -> Vec<StreamInfo> {
    let mut counters: HashMap<CodecType, u32> = HashMap::new();
    let mut streams = Vec::new();

    for stream in raw {
        let counter = counters.entry(stream.codec_type).or_insert(0);
        let type_index = *counter;
        *counter += 1;

        if filter.matches(stream.codec_type) {
            streams.push(StreamInfo::from_raw(source_file, stream, type_index));
        }
    }

    streams
}

/// Enough information to address one stream of a file for `-map`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRef {
    pub input: PathBuf,
    /// `None` addresses the stream by absolute index
    pub codec_type: Option<CodecType>,
    pub index: u32,
}

impl StreamRef {
    pub fn typed(input: &Path, codec_type: CodecType, type_index: u32) -> Self {
        Self {
            input: input.to_path_buf(),
            codec_type: Some(codec_type),
            index: type_index,
        }
    }

    pub fn absolute(input: &Path, index: u32) -> Self {
        Self {
            input: input.to_path_buf(),
            codec_type: None,
            index,
        }
    }

    pub fn map_spec(&self, input_index: usize) -> String {
        match self.codec_type {
            Some(t) => format!("{}:{}:{}", input_index, t.letter(), self.index),
            None => format!("{}:{}", input_index, self.index),
        }
    }
}

impl From<&StreamInfo> for StreamRef {
    fn from(stream: &StreamInfo) -> Self {
        stream.to_ref(true)
    }
}

/// Streams of several files, keyed by source path
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamCollection {
    files: BTreeMap<PathBuf, Vec<StreamInfo>>,
}

impl StreamCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_file: PathBuf, streams: Vec<StreamInfo>) {
        self.files.insert(source_file, streams);
    }

    pub fn get(&self, source_file: &Path) -> Option<&[StreamInfo]> {
        self.files.get(source_file).map(Vec::as_slice)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamInfo> {
        self.files.values().flatten()
    }

    /// Total number of streams across all files
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_by_type(&self, codec_type: CodecType) -> usize {
        self.iter().filter(|s| s.codec_type == codec_type).count()
    }

    fn retain(&self, keep: impl Fn(&StreamInfo) -> bool) -> Self {
        let files = self
            .files
            .iter()
            .map(|(path, streams)| {
                let kept = streams.iter().filter(|s| keep(s)).cloned().collect();
                (path.clone(), kept)
            })
            .collect();
        Self { files }
    }

    pub fn filter_type(&self, filter: StreamFilter) -> Self {
        self.retain(|s| filter.matches(s.codec_type))
    }

    pub fn filter_language(&self, language: &str) -> Self {
        self.retain(|s| s.has_language(language))
    }
}

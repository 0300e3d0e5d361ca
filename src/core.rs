use std::sync::Arc;

#[cfg(feature = "cobalt")]
use crate::cobalt::CobaltExtractor;
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
#[cfg(feature = "ytdlp")]
use crate::ytdlp::YtDlpExtractor;
use serde::{Deserialize, Serialize};
pub use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use url::Url;

/// Supported extraction backends
#[derive(
    EnumIter, Display, EnumString, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Copy,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local `yt-dlp` executable
    #[cfg(feature = "ytdlp")]
    #[strum(to_string = "ytdlp", serialize = "yt-dlp")]
    YtDlp,
    /// Remote cobalt conversion API
    #[cfg(feature = "cobalt")]
    Cobalt,
}

impl Backend {
    pub fn extractor(&self, config: &ResolverConfig) -> Result<Arc<dyn Extractor>> {
        match self {
            #[cfg(feature = "ytdlp")]
            Backend::YtDlp => Ok(Arc::new(YtDlpExtractor::new(config))),
            #[cfg(feature = "cobalt")]
            Backend::Cobalt => Ok(Arc::new(CobaltExtractor::new(config)?)),
        }
    }
}

/// Output container the caller asked for
#[derive(
    EnumIter,
    Display,
    EnumString,
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
)]
pub enum MediaFormat {
    #[default]
    #[serde(rename = "mp3", alias = "audio")]
    #[strum(to_string = "mp3", serialize = "audio")]
    Audio,
    #[serde(rename = "mp4", alias = "video")]
    #[strum(to_string = "mp4", serialize = "video")]
    Video,
}

/// Which tracks an encoded stream carries
#[derive(EnumIter, Display, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    AudioOnly,
    VideoOnly,
    AudioVideo,
}

impl MediaKind {
    pub fn has_audio(&self) -> bool {
        matches!(self, MediaKind::AudioOnly | MediaKind::AudioVideo)
    }
}

/// One concretely downloadable encoded stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub stream_url: String,
    pub media_kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate_kbps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_rank: Option<i64>,
}

impl Variant {
    pub fn new(stream_url: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            stream_url: stream_url.into(),
            media_kind,
            audio_bitrate_kbps: None,
            video_codec: None,
            quality_rank: None,
        }
    }

    /// Set audio bitrate in kbit/s
    pub fn with_audio_bitrate(mut self, kbps: f64) -> Self {
        self.audio_bitrate_kbps = Some(kbps);
        self
    }

    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = Some(codec.into());
        self
    }

    /// Set an explicit rank; higher ranks win during selection
    pub fn with_quality_rank(mut self, rank: i64) -> Self {
        self.quality_rank = Some(rank);
        self
    }
}

pub const DEFAULT_TITLE: &str = "No Title";

/// Everything a backend knows about one piece of media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail_url: String,
    pub variants: Vec<Variant>,
}

impl MediaInfo {
    pub fn new(title: Option<String>, thumbnail_url: Option<String>) -> Self {
        Self {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            thumbnail_url: thumbnail_url.unwrap_or_default(),
            variants: Vec::new(),
        }
    }

    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }
}

/// A caller's request: which page, which container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRequest {
    pub source_url: String,
    #[serde(default)]
    pub desired_format: MediaFormat,
}

impl MediaRequest {
    pub fn new(source_url: impl Into<String>, desired_format: MediaFormat) -> Self {
        Self {
            source_url: source_url.into(),
            desired_format,
        }
    }

    /// Parse the source URL, accepting only absolute http(s) URLs with a host
    pub fn validate(&self) -> std::result::Result<Url, ResolveError> {
        let raw = self.source_url.trim();
        if raw.is_empty() {
            return Err(ResolveError::missing_url());
        }
        let url = Url::parse(raw).map_err(|_| ResolveError::invalid_url())?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
            _ => Err(ResolveError::invalid_url()),
        }
    }
}

/// Successful resolution: the media, the chosen stream and who provided it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub info: MediaInfo,
    pub selected: Variant,
    pub backend: String,
}

pub type ResolutionResult = std::result::Result<Resolution, ResolveError>;

/// Trait for turning a page URL into the set of already-encoded variants
///
/// Implementations perform a single outbound query per call and keep no
/// per-request state, so one instance can serve concurrent requests.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Query the source for everything it can serve for `url`.
    /// An empty variant list is a valid answer.
    async fn extract(&self, url: &Url) -> Result<MediaInfo>;
}

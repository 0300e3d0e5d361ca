use serde::{Deserialize, Serialize};

/// Subset of the info dictionary printed by `yt-dlp --dump-single-json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoDict {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    /// Stream picked by the `-f` expression, when a single one was requested
    pub url: Option<String>,
    pub format_id: Option<String>,
    pub acodec: Option<String>,
    pub vcodec: Option<String>,
    pub abr: Option<f64>,
    /// Available formats, ordered worst to best by yt-dlp
    pub formats: Option<Vec<Format>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    pub format_id: Option<String>,
    pub url: Option<String>,
    /// `"none"` when the stream carries no audio
    pub acodec: Option<String>,
    /// `"none"` when the stream carries no video
    pub vcodec: Option<String>,
    /// Average audio bitrate in kbit/s
    pub abr: Option<f64>,
    /// `mhtml` for storyboard images, which are not media streams
    pub protocol: Option<String>,
}

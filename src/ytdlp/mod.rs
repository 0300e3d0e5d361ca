use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::config::ResolverConfig;
use crate::core::{Extractor, MediaInfo};
use crate::error::Result;

pub mod core;
pub mod types;

pub use self::core::{classify_failure, dump_info, info_to_media, media_kind};
pub use types::{Format, InfoDict};

/// Local extractor backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    path: PathBuf,
    format: String,
    timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            path: config.ytdlp_path.clone(),
            format: config.ytdlp_format.clone(),
            timeout: config.backend_timeout,
        }
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract(&self, url: &Url) -> Result<MediaInfo> {
        let info = dump_info(&self.path, &self.format, url, self.timeout).await?;
        let media = info_to_media(info);
        tracing::debug!(
            backend = self.name(),
            variants = media.variants.len(),
            "yt-dlp listed formats"
        );
        Ok(media)
    }
}

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::core::{Backend, IntoEnumIterator};

pub const DEFAULT_YTDLP_FORMAT: &str = "best[ext=mp4]/best";
pub const DEFAULT_COBALT_ENDPOINT: &str = "https://api.cobalt.tools/api/json";
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_PORT: u16 = 5001;

/// Everything the resolver and its backends need, handed over at construction
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Backends in priority order
    pub backends: Vec<Backend>,
    pub ytdlp_path: PathBuf,
    /// yt-dlp format expression for the preferred progressive stream
    pub ytdlp_format: String,
    pub cobalt_endpoint: Url,
    pub cobalt_api_key: Option<String>,
    /// Upper bound for a single backend call
    pub backend_timeout: Duration,
    /// Race the first two backends instead of trying them one by one
    pub race_top_two: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backends: Backend::iter().collect(),
            ytdlp_path: PathBuf::from("yt-dlp"),
            ytdlp_format: DEFAULT_YTDLP_FORMAT.to_string(),
            cobalt_endpoint: Url::parse(DEFAULT_COBALT_ENDPOINT)
                .expect("default cobalt endpoint is a valid URL"),
            cobalt_api_key: None,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
            race_top_two: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            cors: true,
        }
    }
}

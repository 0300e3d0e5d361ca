use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mp3mate::config::{
    DEFAULT_BACKEND_TIMEOUT, DEFAULT_COBALT_ENDPOINT, DEFAULT_YTDLP_FORMAT, ResolverConfig,
    ServerConfig,
};
use mp3mate::{Backend, Resolver, server};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "mp3mate",
    about = "Serve direct mp3/mp4 stream links for video page URLs",
    long_about = "Runs an HTTP endpoint that turns a video page URL into a direct stream URL.\n\
    Backends are tried in order until one returns a stream matching the requested format.\n\n\
    Examples:\n\
      mp3mate                                        # yt-dlp, then cobalt, on 127.0.0.1:5001\n\
      mp3mate -b cobalt -b ytdlp                     # prefer the remote API\n\
      mp3mate --bind 0.0.0.0:8080 --timeout-secs 5   # public listener, tighter timeout\n\
      mp3mate --race                                 # race the first two backends"
)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "MP3MATE_BIND", default_value = "127.0.0.1:5001")]
    bind: SocketAddr,

    /// Backends in priority order (repeatable)
    #[arg(short = 'b', long = "backend", env = "MP3MATE_BACKENDS", value_delimiter = ',')]
    backends: Vec<Backend>,

    /// Path to the yt-dlp executable
    #[arg(long, env = "MP3MATE_YTDLP", default_value = "yt-dlp")]
    ytdlp_path: PathBuf,

    /// yt-dlp format expression for the preferred progressive stream
    #[arg(long, env = "MP3MATE_YTDLP_FORMAT", default_value = DEFAULT_YTDLP_FORMAT)]
    ytdlp_format: String,

    /// Conversion API endpoint
    #[arg(long, env = "MP3MATE_COBALT_ENDPOINT", default_value = DEFAULT_COBALT_ENDPOINT)]
    cobalt_endpoint: Url,

    /// Conversion API key, sent as `Authorization: Api-Key <key>`
    #[arg(long, env = "MP3MATE_COBALT_API_KEY", hide_env_values = true)]
    cobalt_api_key: Option<String>,

    /// Per-backend timeout in seconds
    #[arg(long, env = "MP3MATE_TIMEOUT_SECS", default_value_t = DEFAULT_BACKEND_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Race the first two backends instead of trying them in turn
    #[arg(long, env = "MP3MATE_RACE")]
    race: bool,

    /// Disable permissive CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "MP3MATE_LOG", default_value = "info")]
    log_level: String,
}

impl Args {
    fn resolver_config(&self) -> ResolverConfig {
        let defaults = ResolverConfig::default();
        ResolverConfig {
            backends: if self.backends.is_empty() {
                defaults.backends
            } else {
                self.backends.clone()
            },
            ytdlp_path: self.ytdlp_path.clone(),
            ytdlp_format: self.ytdlp_format.clone(),
            cobalt_endpoint: self.cobalt_endpoint.clone(),
            cobalt_api_key: self.cobalt_api_key.clone(),
            backend_timeout: Duration::from_secs(self.timeout_secs.max(1)),
            race_top_two: self.race,
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            cors: !self.no_cors,
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = args.resolver_config();
    let resolver = Resolver::from_config(&config).context("Failed to set up backends")?;
    tracing::info!(
        backends = ?resolver.backend_names(),
        timeout = ?config.backend_timeout,
        race = config.race_top_two,
        "Resolver ready"
    );

    server::serve(&args.server_config(), resolver)
        .await
        .with_context(|| format!("Server on {} failed", args.bind))?;
    Ok(())
}

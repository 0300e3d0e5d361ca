#[cfg(not(any(feature = "ytdlp", feature = "cobalt")))]
compile_error!("enable at least one backend feature: `ytdlp` or `cobalt`");

#[cfg(feature = "cobalt")]
pub mod cobalt;
pub mod config;
pub mod core;
pub mod error;
mod http;
pub mod resolver;
pub mod select;
pub mod server;
#[cfg(feature = "ytdlp")]
pub mod ytdlp;

#[cfg(feature = "cobalt")]
pub use cobalt::CobaltExtractor;
pub use config::{ResolverConfig, ServerConfig};
pub use crate::core::{
    Backend, Extractor, MediaFormat, MediaInfo, MediaKind, MediaRequest, Resolution,
    ResolutionResult, Variant,
};
pub use error::{ErrorKind, ExtractionError, ExtractionErrorKind, NoMatchingVariant, ResolveError};
pub use resolver::Resolver;
pub use select::select;
#[cfg(feature = "ytdlp")]
pub use ytdlp::YtDlpExtractor;

/// Resolve `url` into a stream of `format` with the default backend chain
pub async fn resolve(url: &str, format: MediaFormat) -> ResolutionResult {
    let resolver = Resolver::from_config(&ResolverConfig::default()).map_err(|e| {
        tracing::error!("Failed to build resolver: {}", e);
        ResolveError::unresolvable()
    })?;
    resolver.resolve(&MediaRequest::new(url, format)).await
}

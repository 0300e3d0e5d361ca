//! Resolution: run the configured backends in priority order until one of
//! them yields a variant that fits the request.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::select_ok;
use thiserror::Error;
use url::Url;

use crate::config::{DEFAULT_BACKEND_TIMEOUT, ResolverConfig};
use crate::core::{Extractor, MediaFormat, MediaRequest, Resolution, ResolutionResult};
use crate::error::{ExtractionError, NoMatchingVariant, ResolveError, Result};
use crate::select::select;

/// Why a single backend did not produce a resolution. Never shown to callers.
#[derive(Error, Debug)]
enum BackendFailure {
    #[error("{0} ({kind})", kind = .0.kind())]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    NoMatch(#[from] NoMatchingVariant),
}

pub struct Resolver {
    backends: Vec<Arc<dyn Extractor>>,
    timeout: Duration,
    race_top_two: bool,
}

impl Resolver {
    /// Create a resolver over `backends`, highest priority first
    pub fn new(backends: Vec<Arc<dyn Extractor>>) -> Self {
        Self {
            backends,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            race_top_two: false,
        }
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let backends = config
            .backends
            .iter()
            .map(|b| b.extractor(config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(backends)
            .with_timeout(config.backend_timeout)
            .with_racing(config.race_top_two))
    }

    /// Bound every backend call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Race the two highest priority backends and keep the first success
    pub fn with_racing(mut self, race_top_two: bool) -> Self {
        self.race_top_two = race_top_two;
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Resolve `request` to a single stream.
    ///
    /// Invalid input is rejected before any backend is contacted. Backend
    /// errors and format mismatches only move on to the next backend; the
    /// caller sees `Unresolvable` once every backend has been tried.
    pub async fn resolve(&self, request: &MediaRequest) -> ResolutionResult {
        let url = request.validate()?;
        let format = request.desired_format;

        let mut remaining = self.backends.as_slice();
        if self.race_top_two && remaining.len() >= 2 {
            let (pair, rest) = remaining.split_at(2);
            let attempts = pair
                .iter()
                .map(|backend| Box::pin(self.attempt(backend.as_ref(), &url, format)));
            // dropping the losing attempt cancels its in-flight call
            if let Ok((resolution, _)) = select_ok(attempts).await {
                return Ok(resolution);
            }
            remaining = rest;
        }

        for backend in remaining {
            if let Ok(resolution) = self.attempt(backend.as_ref(), &url, format).await {
                return Ok(resolution);
            }
        }

        tracing::error!(
            %url,
            %format,
            backends = self.backends.len(),
            "no backend could resolve the request"
        );
        Err(ResolveError::unresolvable())
    }

    async fn attempt(
        &self,
        backend: &dyn Extractor,
        url: &Url,
        format: MediaFormat,
    ) -> std::result::Result<Resolution, BackendFailure> {
        tracing::debug!(backend = backend.name(), %url, %format, "trying backend");
        let outcome = self.try_backend(backend, url, format).await;
        match &outcome {
            Ok(resolution) => tracing::info!(
                backend = backend.name(),
                kind = %resolution.selected.media_kind,
                variants = resolution.info.variants.len(),
                "resolved"
            ),
            Err(failure) => tracing::warn!(
                backend = backend.name(),
                %failure,
                "backend could not resolve, falling back"
            ),
        }
        outcome
    }

    async fn try_backend(
        &self,
        backend: &dyn Extractor,
        url: &Url,
        format: MediaFormat,
    ) -> std::result::Result<Resolution, BackendFailure> {
        let info = tokio::time::timeout(self.timeout, backend.extract(url))
            .await
            .map_err(|_| ExtractionError::RequestTimeout(self.timeout))??;
        let selected = select(&info.variants, format)?.clone();
        Ok(Resolution {
            info,
            selected,
            backend: backend.name().to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::{MediaInfo, MediaKind, Variant};
    use crate::error::{ErrorKind, ExtractionErrorKind, UNRESOLVABLE_MESSAGE};

    pub const INTERNAL_DETAIL: &str = "secret backend stack trace";

    #[derive(Clone)]
    pub enum Outcome {
        Media(MediaInfo),
        Fail(ExtractionErrorKind),
    }

    /// Scripted backend that records every call in a shared log
    pub struct FakeExtractor {
        pub name: &'static str,
        pub outcome: Outcome,
        pub delay: Option<Duration>,
        pub calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FakeExtractor {
        pub fn new(
            name: &'static str,
            outcome: Outcome,
            calls: &Arc<Mutex<Vec<&'static str>>>,
        ) -> Self {
            Self {
                name,
                outcome,
                delay: None,
                calls: Arc::clone(calls),
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl Extractor for FakeExtractor {
        fn name(&self) -> &str {
            self.name
        }

        async fn extract(&self, _url: &Url) -> Result<MediaInfo> {
            self.calls.lock().unwrap().push(self.name);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Outcome::Media(info) => Ok(info.clone()),
                Outcome::Fail(ExtractionErrorKind::Transient) => {
                    Err(ExtractionError::Unavailable(INTERNAL_DETAIL.to_string()))
                }
                Outcome::Fail(ExtractionErrorKind::NotFound) => {
                    Err(ExtractionError::NotFound(INTERNAL_DETAIL.to_string()))
                }
                Outcome::Fail(ExtractionErrorKind::MalformedResponse) => {
                    Err(ExtractionError::InvalidResponse(INTERNAL_DETAIL.to_string()))
                }
            }
        }
    }

    pub fn media(title: &str, variants: Vec<Variant>) -> Outcome {
        Outcome::Media(MediaInfo::new(Some(title.to_string()), None).with_variants(variants))
    }

    pub fn calls() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn resolver(backends: Vec<FakeExtractor>) -> Resolver {
        Resolver::new(
            backends
                .into_iter()
                .map(|b| Arc::new(b) as Arc<dyn Extractor>)
                .collect(),
        )
    }

    const VIDEO_URL: &str = "https://youtube.com/watch?v=abc123";

    #[tokio::test]
    async fn test_falls_back_after_transient_error() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new("a", Outcome::Fail(ExtractionErrorKind::Transient), &log),
            FakeExtractor::new(
                "b",
                media("From B", vec![Variant::new("b-av", MediaKind::AudioVideo)]),
                &log,
            ),
        ]);

        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Video))
            .await
            .unwrap();
        assert_eq!(resolution.backend, "b");
        assert_eq!(resolution.info.title, "From B");
        assert_eq!(resolution.selected.stream_url, "b-av");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_not_found_and_malformed_also_fall_back() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new("a", Outcome::Fail(ExtractionErrorKind::NotFound), &log),
            FakeExtractor::new(
                "b",
                Outcome::Fail(ExtractionErrorKind::MalformedResponse),
                &log,
            ),
            FakeExtractor::new(
                "c",
                media("C", vec![Variant::new("c-av", MediaKind::AudioVideo)]),
                &log,
            ),
        ]);
        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Audio))
            .await
            .unwrap();
        assert_eq!(resolution.backend, "c");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_no_matching_variant_falls_back() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new(
                "a",
                media("A", vec![Variant::new("a-v", MediaKind::VideoOnly)]),
                &log,
            ),
            FakeExtractor::new(
                "b",
                media(
                    "B",
                    vec![Variant::new("b-a", MediaKind::AudioOnly).with_audio_bitrate(128.0)],
                ),
                &log,
            ),
        ]);
        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Audio))
            .await
            .unwrap();
        assert_eq!(resolution.selected.stream_url, "b-a");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new(
                "a",
                media("A", vec![Variant::new("a-av", MediaKind::AudioVideo)]),
                &log,
            ),
            FakeExtractor::new("b", Outcome::Fail(ExtractionErrorKind::Transient), &log),
        ]);
        resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Video))
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_unresolvable_and_generic() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new("a", Outcome::Fail(ExtractionErrorKind::Transient), &log),
            FakeExtractor::new("b", media("B", vec![]), &log),
            FakeExtractor::new("c", Outcome::Fail(ExtractionErrorKind::NotFound), &log),
        ]);
        let err = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Audio))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unresolvable);
        assert_eq!(err.message, UNRESOLVABLE_MESSAGE);
        assert!(!err.to_string().contains(INTERNAL_DETAIL));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_no_backends_is_unresolvable() {
        let err = resolver(vec![])
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Audio))
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::unresolvable());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_backends() {
        let log = calls();
        let resolver = resolver(vec![FakeExtractor::new(
            "a",
            media("A", vec![Variant::new("a-av", MediaKind::AudioVideo)]),
            &log,
        )]);

        let err = resolver
            .resolve(&MediaRequest::new("", MediaFormat::Audio))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = resolver
            .resolve(&MediaRequest::new("watch?v=abc123", MediaFormat::Audio))
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::invalid_url());

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_and_falls_back() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new(
                "slow",
                media("Slow", vec![Variant::new("slow-av", MediaKind::AudioVideo)]),
                &log,
            )
            .delayed(Duration::from_secs(30)),
            FakeExtractor::new(
                "fast",
                media("Fast", vec![Variant::new("fast-av", MediaKind::AudioVideo)]),
                &log,
            ),
        ])
        .with_timeout(Duration::from_millis(50));

        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Video))
            .await
            .unwrap();
        assert_eq!(resolution.backend, "fast");
        assert_eq!(*log.lock().unwrap(), vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_mp3_example_picks_highest_bitrate() {
        let log = calls();
        let resolver = resolver(vec![FakeExtractor::new(
            "a",
            media(
                "Song",
                vec![
                    Variant::new("a128", MediaKind::AudioOnly).with_audio_bitrate(128.0),
                    Variant::new("a256", MediaKind::AudioOnly).with_audio_bitrate(256.0),
                    Variant::new("av", MediaKind::AudioVideo),
                ],
            ),
            &log,
        )]);
        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Audio))
            .await
            .unwrap();
        assert_eq!(resolution.selected.stream_url, "a256");
        assert_eq!(resolution.selected.audio_bitrate_kbps, Some(256.0));
    }

    #[tokio::test]
    async fn test_racing_takes_first_success() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new(
                "slow",
                media("Slow", vec![Variant::new("slow-av", MediaKind::AudioVideo)]),
                &log,
            )
            .delayed(Duration::from_secs(5)),
            FakeExtractor::new(
                "fast",
                media("Fast", vec![Variant::new("fast-av", MediaKind::AudioVideo)]),
                &log,
            ),
        ])
        .with_racing(true);

        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Video))
            .await
            .unwrap();
        assert_eq!(resolution.backend, "fast");
    }

    #[tokio::test]
    async fn test_racing_falls_back_to_remaining_backends() {
        let log = calls();
        let resolver = resolver(vec![
            FakeExtractor::new("a", Outcome::Fail(ExtractionErrorKind::Transient), &log),
            FakeExtractor::new("b", Outcome::Fail(ExtractionErrorKind::NotFound), &log),
            FakeExtractor::new(
                "c",
                media("C", vec![Variant::new("c-av", MediaKind::AudioVideo)]),
                &log,
            ),
        ])
        .with_racing(true);

        let resolution = resolver
            .resolve(&MediaRequest::new(VIDEO_URL, MediaFormat::Video))
            .await
            .unwrap();
        assert_eq!(resolution.backend, "c");
        assert_eq!(log.lock().unwrap().len(), 3);
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use crate::config::ResolverConfig;
use crate::core::{Extractor, MediaInfo};
use crate::error::Result;
use crate::http::{build_client, post_json};

pub mod core;
pub mod types;

pub use self::core::{interpret, response_to_media};
pub use types::{CobaltRequest, CobaltResponse, CobaltStatus, PickerItem};

/// Remote extractor backed by a cobalt-compatible conversion API
#[derive(Debug, Clone)]
pub struct CobaltExtractor {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl CobaltExtractor {
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.backend_timeout)?,
            endpoint: config.cobalt_endpoint.clone(),
            api_key: config.cobalt_api_key.clone(),
            timeout: config.backend_timeout,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key
            && let Ok(value) = HeaderValue::from_str(&format!("Api-Key {key}"))
        {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }
}

#[async_trait]
impl Extractor for CobaltExtractor {
    fn name(&self) -> &str {
        "cobalt"
    }

    async fn extract(&self, url: &Url) -> Result<MediaInfo> {
        let body = CobaltRequest {
            url: url.as_str(),
            is_no_tt: true,
        };
        let (status, bytes) = post_json(
            &self.client,
            self.endpoint.as_str(),
            &body,
            self.headers(),
            self.timeout,
        )
        .await?;
        tracing::debug!(backend = self.name(), %status, "conversion API answered");
        interpret(status, &bytes, self.endpoint.as_str())
    }
}

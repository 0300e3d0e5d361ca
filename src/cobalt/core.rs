use std::path::Path;

use reqwest::StatusCode;

use crate::cobalt::types::{CobaltResponse, CobaltStatus, PickerItem};
use crate::core::{MediaInfo, MediaKind, Variant};
use crate::error::{ExtractionError, Result};

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Message carried by an error answer, if the service gave one
fn error_message(resp: &CobaltResponse) -> Option<String> {
    if let Some(text) = non_empty(&resp.text) {
        return Some(text.to_string());
    }
    match resp.error.as_ref()? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Object(obj) => obj
            .get("code")
            .and_then(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn picker_variant(item: &PickerItem) -> Option<Variant> {
    let url = non_empty(&item.url)?;
    match item.kind.as_deref() {
        Some("video") | Some("gif") | None => Some(Variant::new(url, MediaKind::AudioVideo)),
        _ => None,
    }
}

fn title_from_filename(filename: &Option<String>) -> Option<String> {
    let name = non_empty(filename)?;
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// Map a decoded service answer to media info or a classified failure
pub fn response_to_media(resp: CobaltResponse) -> Result<MediaInfo> {
    let mut variants = Vec::new();
    let mut thumbnail = non_empty(&resp.thumb).map(str::to_string);

    match resp.status {
        CobaltStatus::Error => {
            return Err(match error_message(&resp) {
                Some(message) => ExtractionError::NotFound(message),
                None => ExtractionError::InvalidResponse(
                    "error status without a message".to_string(),
                ),
            });
        }
        CobaltStatus::RateLimit => {
            return Err(ExtractionError::RateLimited(
                error_message(&resp).unwrap_or_else(|| "rate limited".to_string()),
            ));
        }
        CobaltStatus::Redirect
        | CobaltStatus::Stream
        | CobaltStatus::Tunnel
        | CobaltStatus::Success => {
            let url = non_empty(&resp.url).ok_or_else(|| {
                ExtractionError::InvalidResponse("stream answer without url".to_string())
            })?;
            variants.push(Variant::new(url, MediaKind::AudioVideo));
        }
        CobaltStatus::Picker => {
            let items = resp.picker.as_deref().unwrap_or_default();
            if let Some(first_thumb) = items.first().and_then(|i| non_empty(&i.thumb)) {
                thumbnail = Some(first_thumb.to_string());
            }
            variants.extend(items.iter().filter_map(picker_variant));
        }
        CobaltStatus::Unknown => {
            return Err(ExtractionError::InvalidResponse(
                "unrecognized status".to_string(),
            ));
        }
    }

    if let Some(audio) = non_empty(&resp.audio) {
        variants.push(Variant::new(audio, MediaKind::AudioOnly));
    }

    Ok(MediaInfo::new(title_from_filename(&resp.filename), thumbnail).with_variants(variants))
}

/// Interpret a raw HTTP answer from the service
pub fn interpret(status: StatusCode, body: &[u8], url: &str) -> Result<MediaInfo> {
    let http_error = || ExtractionError::HttpError {
        status: status.as_u16(),
        url: url.to_string(),
    };

    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        return Err(http_error());
    }

    match serde_json::from_slice::<CobaltResponse>(body) {
        Ok(resp) => response_to_media(resp),
        Err(e) if status.is_success() => Err(ExtractionError::from(e)),
        Err(_) => Err(http_error()),
    }
}

use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use url::Url;

use crate::core::{MediaInfo, MediaKind, Variant};
use crate::error::{ExtractionError, ExtractionErrorKind, Result, status_kind};
use crate::ytdlp::types::{Format, InfoDict};

static HTTP_STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"HTTP Error (\d{3})").expect("valid HTTP status regex"));

/// Classify a stream from yt-dlp's codec fields. `"none"` means absent;
/// a missing field means unknown and is assumed present.
pub fn media_kind(acodec: Option<&str>, vcodec: Option<&str>) -> Option<MediaKind> {
    let has_audio = acodec != Some("none");
    let has_video = vcodec != Some("none");
    match (has_audio, has_video) {
        (true, true) => Some(MediaKind::AudioVideo),
        (true, false) => Some(MediaKind::AudioOnly),
        (false, true) => Some(MediaKind::VideoOnly),
        (false, false) => None,
    }
}

fn to_variant(
    url: Option<&str>,
    acodec: Option<&str>,
    vcodec: Option<&str>,
    abr: Option<f64>,
) -> Option<Variant> {
    let url = url.filter(|u| !u.is_empty())?;
    let kind = media_kind(acodec, vcodec)?;
    let mut variant = Variant::new(url, kind);
    if let Some(abr) = abr.filter(|a| *a > 0.0)
        && kind.has_audio()
    {
        variant = variant.with_audio_bitrate(abr);
    }
    if let Some(codec) = vcodec.filter(|c| *c != "none") {
        variant = variant.with_video_codec(codec);
    }
    Some(variant)
}

fn format_variant(format: &Format) -> Option<Variant> {
    if format.protocol.as_deref() == Some("mhtml") {
        return None;
    }
    to_variant(
        format.url.as_deref(),
        format.acodec.as_deref(),
        format.vcodec.as_deref(),
        format.abr,
    )
}

/// Turn an info dictionary into media info.
///
/// The stream chosen by the `-f` expression is listed first, followed by the
/// remaining formats best first, so first-listed tie-breaks follow yt-dlp's
/// own preference.
pub fn info_to_media(info: InfoDict) -> MediaInfo {
    let formats = info.formats.unwrap_or_default();
    let chosen_id = info.format_id.as_deref();

    let mut variants = Vec::with_capacity(formats.len() + 1);
    let chosen = formats
        .iter()
        .find(|f| chosen_id.is_some() && f.format_id.as_deref() == chosen_id)
        .and_then(format_variant)
        .or_else(|| {
            to_variant(
                info.url.as_deref(),
                info.acodec.as_deref(),
                info.vcodec.as_deref(),
                info.abr,
            )
        });
    if let Some(chosen) = chosen {
        variants.push(chosen);
    }

    for variant in formats.iter().rev().filter_map(format_variant) {
        if !variants.iter().any(|v| v.stream_url == variant.stream_url) {
            variants.push(variant);
        }
    }

    MediaInfo::new(info.title, info.thumbnail).with_variants(variants)
}

fn last_error_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .map(|l| l.trim_start_matches("ERROR:").trim())
        .unwrap_or_else(|| stderr.trim())
}

/// Map a failed yt-dlp run to an extraction error based on its stderr
pub fn classify_failure(stderr: &str) -> ExtractionError {
    let message = last_error_line(stderr).to_string();

    if let Some(status) = HTTP_STATUS_RE
        .captures(stderr)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
    {
        return match status_kind(status) {
            ExtractionErrorKind::NotFound => ExtractionError::NotFound(message),
            _ if status == 429 => ExtractionError::RateLimited(message),
            ExtractionErrorKind::Transient => ExtractionError::Unavailable(message),
            ExtractionErrorKind::MalformedResponse => ExtractionError::InvalidResponse(message),
        };
    }

    let lower = stderr.to_lowercase();
    let gone = [
        "unsupported url",
        "video unavailable",
        "private video",
        "is not a valid url",
        "no video formats",
        "does not exist",
        "has been removed",
    ];
    if gone.iter().any(|needle| lower.contains(needle)) {
        return ExtractionError::NotFound(message);
    }

    ExtractionError::Unavailable(message)
}

/// Run yt-dlp once for `url` and parse its JSON dump.
///
/// The child is killed if this future is dropped or the timeout elapses.
pub async fn dump_info(
    ytdlp: &Path,
    format: &str,
    url: &Url,
    timeout: Duration,
) -> Result<InfoDict> {
    let socket_timeout = timeout.as_secs().max(1).to_string();
    let mut cmd = Command::new(ytdlp);
    cmd.args([
        "--dump-single-json",
        "--skip-download",
        "--no-playlist",
        "--no-warnings",
        "--quiet",
        "--socket-timeout",
        socket_timeout.as_str(),
        "-f",
        format,
    ])
    .arg(url.as_str())
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ExtractionError::RequestTimeout(timeout))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(&stderr));
    }

    let info: InfoDict = serde_json::from_slice(&output.stdout)?;
    Ok(info)
}

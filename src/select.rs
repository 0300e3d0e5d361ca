//! Variant selection: pick one stream out of everything a backend offers.
//!
//! Selection is a pure function of the variant list and the requested format.
//! Equal candidates resolve to the one listed first.

use std::cmp::Ordering;

use crate::core::{MediaFormat, MediaKind, Variant};
use crate::error::NoMatchingVariant;

/// Acceptable kinds for a format, most preferred first
fn preference(format: MediaFormat) -> &'static [MediaKind] {
    match format {
        // a combined stream still carries the audio track
        MediaFormat::Audio => &[MediaKind::AudioOnly, MediaKind::AudioVideo],
        MediaFormat::Video => &[MediaKind::AudioVideo, MediaKind::VideoOnly],
    }
}

/// Present values beat absent ones
fn cmp_present<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Variant, b: &Variant, format: MediaFormat) -> Ordering {
    let by_rank = cmp_present(a.quality_rank, b.quality_rank);
    if by_rank != Ordering::Equal || format != MediaFormat::Audio {
        return by_rank;
    }
    cmp_present(a.audio_bitrate_kbps, b.audio_bitrate_kbps)
}

/// Best variant of exactly `kind`, or `None` if there is none
fn best_of_kind(variants: &[Variant], kind: MediaKind, format: MediaFormat) -> Option<&Variant> {
    variants
        .iter()
        .filter(|v| v.media_kind == kind)
        .fold(None, |best: Option<&Variant>, v| match best {
            // only a strictly better candidate displaces an earlier one
            Some(b) if compare(v, b, format) != Ordering::Greater => Some(b),
            _ => Some(v),
        })
}

/// Pick the single best variant for `format`.
///
/// Audio requests take the highest ranked audio-only stream, falling back to a
/// combined stream. Video requests take the highest ranked combined stream,
/// falling back to a video-only stream. Video-only streams never satisfy an
/// audio request.
pub fn select(
    variants: &[Variant],
    format: MediaFormat,
) -> std::result::Result<&Variant, NoMatchingVariant> {
    preference(format)
        .iter()
        .find_map(|kind| best_of_kind(variants, *kind, format))
        .ok_or(NoMatchingVariant { format })
}

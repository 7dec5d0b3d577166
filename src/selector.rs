//! Format selection: turns the provider's variant list into a short menu
//!
//! The menu lists combined (audio+video) variants first, then video-only
//! variants that will be merged with the best audio stream, then audio-only
//! variants. Each bucket is deduplicated on (label, container) keeping the
//! first occurrence.

use crate::extractor::models::StreamVariant;
use crate::utils::config::SelectionPolicy;
use crate::utils::error::{Result, VidgrabError};
use std::collections::HashSet;
use tracing::debug;

/// Which bucket a menu entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    Combined,
    /// Needs a separate audio download and a mux step
    VideoOnly,
    AudioOnly,
}

/// One entry of the format menu
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChoice {
    pub label: String,
    pub kind: ChoiceKind,
    pub variant: StreamVariant,
}

/// Rank of a quality label; higher is better, unknown labels rank 0.
///
/// A frame-rate suffix is ignored, so `1080p60` ranks as `1080p`.
pub fn quality_rank(label: &str) -> u8 {
    let base = match label.find('p') {
        Some(pos) if label[..pos].chars().all(|c| c.is_ascii_digit()) => &label[..=pos],
        _ => label,
    };

    match base {
        "2160p" | "hd2160" => 8,
        "1440p" | "hd1440" => 7,
        "1080p" | "hd1080" => 6,
        "720p" | "hd720" => 5,
        "480p" | "large" => 4,
        "360p" | "medium" => 3,
        "240p" | "small" => 2,
        "144p" | "tiny" => 1,
        _ => 0,
    }
}

/// Human readable size, `Unknown size` when missing
pub fn format_file_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    match bytes {
        None | Some(0) => "Unknown size".to_string(),
        Some(bytes) => {
            let mut size = bytes as f64;
            let mut unit = 0;
            while size >= 1024.0 && unit < UNITS.len() - 1 {
                size /= 1024.0;
                unit += 1;
            }
            format!("{:.2} {}", size, UNITS[unit])
        }
    }
}

fn dedup_key(variant: &StreamVariant) -> (String, String) {
    (variant.label().to_string(), variant.container.clone())
}

fn dedup<'a>(variants: Vec<&'a StreamVariant>) -> Vec<&'a StreamVariant> {
    let mut seen = HashSet::new();
    variants
        .into_iter()
        .filter(|v| seen.insert(dedup_key(v)))
        .collect()
}

fn sort_by_rank(variants: &mut [&StreamVariant]) {
    // sort_by_key is stable: equal ranks keep provider order
    variants.sort_by_key(|v| std::cmp::Reverse(quality_rank(v.label())));
}

/// Build the ordered, deduplicated format menu.
///
/// Fails with `EmptySelection` when nothing downloadable remains.
pub fn build_menu(
    variants: &[StreamVariant],
    policy: &SelectionPolicy,
) -> Result<Vec<SelectionChoice>> {
    debug!("Analyzing {} formats", variants.len());

    let mut combined: Vec<&StreamVariant> = variants.iter().filter(|v| v.is_combined()).collect();
    let mut video_only: Vec<&StreamVariant> = variants
        .iter()
        .filter(|v| v.is_video_only() && v.quality_label.is_some())
        .collect();
    let audio_only: Vec<&StreamVariant> = variants.iter().filter(|v| v.is_audio_only()).collect();

    sort_by_rank(&mut combined);
    sort_by_rank(&mut video_only);

    let combined = dedup(combined);
    let mut video_only = dedup(video_only);
    video_only.truncate(policy.video_only_limit);
    let mut audio_only = dedup(audio_only);
    audio_only.truncate(policy.audio_only_limit);

    debug!(
        "Combined: {}, video-only: {}, audio: {}",
        combined.len(),
        video_only.len(),
        audio_only.len()
    );

    let mut menu = Vec::with_capacity(combined.len() + video_only.len() + audio_only.len());

    for variant in combined {
        menu.push(SelectionChoice {
            label: format!(
                "{} ({}) - {}",
                variant.label(),
                variant.container,
                format_file_size(variant.size)
            ),
            kind: ChoiceKind::Combined,
            variant: variant.clone(),
        });
    }

    for variant in video_only {
        menu.push(SelectionChoice {
            label: format!(
                "{} ({}) - {} (merged with best audio)",
                variant.label(),
                variant.container,
                format_file_size(variant.size)
            ),
            kind: ChoiceKind::VideoOnly,
            variant: variant.clone(),
        });
    }

    for variant in audio_only {
        menu.push(SelectionChoice {
            label: format!(
                "Audio ({}) - {}",
                variant.container,
                format_file_size(variant.size)
            ),
            kind: ChoiceKind::AudioOnly,
            variant: variant.clone(),
        });
    }

    if menu.is_empty() {
        return Err(VidgrabError::EmptySelection);
    }

    debug!("{} options available", menu.len());
    Ok(menu)
}

/// Audio-only variant with the highest bit rate; ties keep the first seen
pub fn best_audio(variants: &[StreamVariant]) -> Option<&StreamVariant> {
    variants
        .iter()
        .filter(|v| v.is_audio_only())
        .fold(None, |best: Option<&StreamVariant>, candidate| match best {
            Some(current)
                if current.audio_bitrate.unwrap_or(0.0)
                    >= candidate.audio_bitrate.unwrap_or(0.0) =>
            {
                Some(current)
            }
            _ => Some(candidate),
        })
}

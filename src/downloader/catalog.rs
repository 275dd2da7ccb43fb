// Stream catalog: one ranked menu row per (height, fps, container)
//
// Raw yt-dlp formats contain many near-duplicates (same resolution offered
// at several bitrates or through several protocols). The catalog keeps the
// highest-bitrate variant per slot and orders rows best-first.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::models::{QualityOption, QualitySlot, StreamVariant};

pub const AUDIO_ONLY_LABEL: &str = "Audio only";

fn bitrate(variant: &StreamVariant) -> f32 {
    variant.tbr.unwrap_or(0.0)
}

fn audio_bitrate(variant: &StreamVariant) -> f32 {
    variant.abr.or(variant.tbr).unwrap_or(0.0)
}

/// Best pure-audio variant by audio bitrate
pub fn best_audio(formats: &[StreamVariant]) -> Option<&StreamVariant> {
    formats
        .iter()
        .filter(|f| f.is_pure_audio())
        .max_by(|a, b| {
            audio_bitrate(a)
                .partial_cmp(&audio_bitrate(b))
                .unwrap_or(Ordering::Equal)
        })
}

/// Build the ranked quality menu for a list of formats.
///
/// Returns a single audio-only row when no format carries video.
pub fn build_catalog(formats: &[StreamVariant]) -> Vec<QualityOption> {
    let mut slots: HashMap<QualitySlot, &StreamVariant> = HashMap::new();

    for variant in formats.iter().filter(|f| f.has_video()) {
        let slot = match QualitySlot::of(variant) {
            Some(s) => s,
            None => continue,
        };
        match slots.get(&slot) {
            Some(kept) if bitrate(kept) >= bitrate(variant) => {}
            _ => {
                slots.insert(slot, variant);
            }
        }
    }

    if slots.is_empty() {
        tracing::debug!(formats = formats.len(), "no video formats, offering audio only");
        return vec![QualityOption {
            label: AUDIO_ONLY_LABEL.to_string(),
            variant: best_audio(formats).cloned(),
        }];
    }

    let mut rows: Vec<(QualitySlot, &StreamVariant)> = slots.into_iter().collect();
    rows.sort_by(|(a, _), (b, _)| {
        b.height
            .cmp(&a.height)
            .then(b.fps.cmp(&a.fps))
            .then(a.container.rank().cmp(&b.container.rank()))
            .then_with(|| a.container.to_string().cmp(&b.container.to_string()))
    });

    tracing::debug!(formats = formats.len(), rows = rows.len(), "catalog built");

    rows.into_iter()
        .map(|(slot, variant)| QualityOption {
            label: slot.label(),
            variant: Some(variant.clone()),
        })
        .collect()
}

// FormatSelector - turns a menu choice into a yt-dlp format expression
//
// yt-dlp grammar: `/` separates alternatives tried left to right,
// `+` merges streams into one file.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::catalog::best_audio;
use super::models::StreamVariant;

/// Maximum number of dubbed audio tracks merged into one file
pub const MAX_AUDIO_TRACKS: usize = 6;

pub const AUDIO_ONLY_SELECTOR: &str = "bestaudio/best";

/// Format expression plus the yt-dlp switches it depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSelection {
    pub format_spec: String,
    /// Several audio streams are merged (`--audio-multistreams`)
    pub audio_multistreams: bool,
    /// No video stream requested
    pub audio_only: bool,
}

pub struct FormatSelector;

impl FormatSelector {
    /// Build the selector for a chosen video variant (`None` = audio only)
    pub fn build(chosen: Option<&StreamVariant>, formats: &[StreamVariant]) -> FormatSelection {
        let chosen = match chosen {
            Some(c) => c,
            None => {
                return FormatSelection {
                    format_spec: AUDIO_ONLY_SELECTOR.to_string(),
                    audio_multistreams: false,
                    audio_only: true,
                }
            }
        };

        let dubs = Self::audio_per_language(formats);
        if dubs.len() > 1 {
            let mut spec = chosen.format_id.clone();
            for track in dubs.iter().take(MAX_AUDIO_TRACKS) {
                spec.push('+');
                spec.push_str(&track.format_id);
            }
            spec.push_str("/best");
            tracing::debug!(tracks = dubs.len().min(MAX_AUDIO_TRACKS), spec = %spec, "multi-dub selector");
            return FormatSelection {
                format_spec: spec,
                audio_multistreams: true,
                audio_only: false,
            };
        }

        let fallback = match chosen.height {
            Some(h) => format!("bestvideo[height<={}]+bestaudio/best", h),
            None => "bestvideo+bestaudio/best".to_string(),
        };

        let primary = match best_audio(formats) {
            Some(audio) => format!("{}+{}", chosen.format_id, audio.format_id),
            None => chosen.format_id.clone(),
        };

        FormatSelection {
            format_spec: format!("{}/{}", primary, fallback),
            audio_multistreams: false,
            audio_only: false,
        }
    }

    /// Best pure-audio variant of every language, highest bitrate first.
    /// Empty unless at least one language tag is present.
    fn audio_per_language(formats: &[StreamVariant]) -> Vec<&StreamVariant> {
        let mut best: HashMap<&str, &StreamVariant> = HashMap::new();
        for f in formats.iter().filter(|f| f.is_pure_audio()) {
            let lang = match f.language.as_deref() {
                Some(l) => l,
                None => continue,
            };
            match best.get(lang) {
                Some(kept) if abr(kept) >= abr(f) => {}
                _ => {
                    best.insert(lang, f);
                }
            }
        }

        let mut tracks: Vec<&StreamVariant> = best.into_values().collect();
        tracks.sort_by(|a, b| {
            abr(b)
                .partial_cmp(&abr(a))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.language.cmp(&b.language))
        });
        tracks
    }
}

fn abr(f: &StreamVariant) -> f32 {
    f.abr.or(f.tbr).unwrap_or(0.0)
}

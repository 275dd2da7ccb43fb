// Common data models for the downloader

use serde::Deserialize;
use std::fmt;

use super::errors::DownloadError;

// yt-dlp fields are loosely typed: nulls, empty strings and floats where
// integers are expected all occur in the wild
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            _ => String::new(),
        })
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(Value::deserialize(d)?.as_f64().map(|v| v as u32))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(Value::deserialize(d)?.as_f64().map(|v| v as u64))
    }

    pub fn opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
        Ok(Value::deserialize(d)?.as_f64().map(|v| v as f32))
    }
}

/// One entry of yt-dlp's `formats` array
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamVariant {
    /// Format ID (e.g., "137", "251")
    #[serde(deserialize_with = "lenient::string")]
    pub format_id: String,
    /// File extension (mp4, webm, m4a)
    #[serde(deserialize_with = "lenient::string")]
    pub ext: String,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub width: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_u32")]
    pub height: Option<u32>,
    #[serde(deserialize_with = "lenient::opt_f32")]
    pub fps: Option<f32>,
    /// Video codec (avc1, vp9, av01, none)
    #[serde(deserialize_with = "lenient::opt_string")]
    pub vcodec: Option<String>,
    /// Audio codec (mp4a, opus, none)
    #[serde(deserialize_with = "lenient::opt_string")]
    pub acodec: Option<String>,
    /// File size in bytes
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    #[serde(deserialize_with = "lenient::opt_u64")]
    pub filesize_approx: Option<u64>,
    /// Total bitrate in kbps
    #[serde(deserialize_with = "lenient::opt_f32")]
    pub tbr: Option<f32>,
    /// Audio bitrate in kbps
    #[serde(deserialize_with = "lenient::opt_f32")]
    pub abr: Option<f32>,
    /// Audio language tag (e.g., "en", "de-DE")
    #[serde(deserialize_with = "lenient::opt_string")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub format_note: Option<String>,
}

fn codec_present(codec: &Option<String>) -> bool {
    codec
        .as_deref()
        .map_or(false, |c| !c.is_empty() && c != "none")
}

impl StreamVariant {
    /// Get effective file size (exact or approximate)
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    pub fn has_video(&self) -> bool {
        codec_present(&self.vcodec)
    }

    pub fn has_audio(&self) -> bool {
        codec_present(&self.acodec)
    }

    /// Audio stream without a video track
    pub fn is_pure_audio(&self) -> bool {
        !self.has_video() && self.has_audio()
    }

    /// Frame rate rounded to whole frames, 30 when unknown
    pub fn rounded_fps(&self) -> u32 {
        match self.fps {
            Some(fps) if fps > 0.0 => fps.round() as u32,
            _ => 30,
        }
    }

    pub fn container(&self) -> Container {
        Container::detect(&self.ext, self.vcodec.as_deref())
    }
}

/// Output container of a stream, ordered by menu preference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    Webm,
    Mp4,
    Mkv,
    Other(String),
    Unknown,
}

impl Container {
    /// Declared extension first, codec hints second
    pub fn detect(ext: &str, vcodec: Option<&str>) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "webm" => return Self::Webm,
            "mp4" => return Self::Mp4,
            "mkv" => return Self::Mkv,
            _ => {}
        }

        let codec = vcodec.unwrap_or("").to_ascii_lowercase();
        if codec.starts_with("vp9") || codec.starts_with("vp09") || codec.starts_with("av01") {
            return Self::Webm;
        }

        if ext.is_empty() || ext == "unknown_video" || ext == "none" {
            Self::Unknown
        } else {
            Self::Other(ext.to_ascii_lowercase())
        }
    }

    /// Lower sorts first
    pub fn rank(&self) -> u8 {
        match self {
            Self::Webm => 0,
            Self::Mp4 => 1,
            Self::Mkv => 2,
            Self::Other(_) => 3,
            Self::Unknown => 4,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webm => write!(f, "webm"),
            Self::Mp4 => write!(f, "mp4"),
            Self::Mkv => write!(f, "mkv"),
            Self::Other(ext) => write!(f, "{}", ext),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// Key of one user-selectable menu row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualitySlot {
    pub height: u32,
    pub fps: u32,
    pub container: Container,
}

impl QualitySlot {
    pub fn of(variant: &StreamVariant) -> Option<Self> {
        Some(Self {
            height: variant.height?,
            fps: variant.rounded_fps(),
            container: variant.container(),
        })
    }

    pub fn label(&self) -> String {
        if self.fps == 30 {
            format!("{}p [{}]", self.height, self.container)
        } else {
            format!("{}p{} [{}]", self.height, self.fps, self.container)
        }
    }
}

/// A row of the quality menu. `variant == None` means audio only.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityOption {
    pub label: String,
    pub variant: Option<StreamVariant>,
}

impl QualityOption {
    pub fn is_audio_only(&self) -> bool {
        self.variant.as_ref().map_or(true, |v| !v.has_video())
    }
}

/// Playlist descriptor for playlist URLs
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistInfo {
    pub title: String,
    pub count: usize,
}

/// Metadata returned by the extractor for one URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
    pub webpage_url: String,
    pub original_url: String,
    pub formats: Vec<StreamVariant>,
    /// Languages with uploaded subtitles
    pub subtitles: Vec<String>,
    /// Languages with automatic captions
    pub automatic_captions: Vec<String>,
    pub playlist: Option<PlaylistInfo>,
}

impl MediaInfo {
    /// Parse `--dump-single-json` output. Playlists without top-level formats
    /// take formats and subtitles from their first entry.
    pub fn from_ytdlp_json(stdout: &[u8]) -> Result<Self, DownloadError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: serde_json::Value = serde_json::from_str(json_str.trim())
            .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

        let entries = json["entries"].as_array();
        let first_entry = entries.and_then(|e| e.iter().find(|v| v.is_object()));

        let playlist = entries.map(|e| PlaylistInfo {
            title: json["title"].as_str().unwrap_or("Playlist").to_string(),
            count: json["playlist_count"]
                .as_u64()
                .map(|c| c as usize)
                .unwrap_or(e.len()),
        });

        let mut source = &json;
        if json["formats"].as_array().map_or(true, |f| f.is_empty()) {
            if let Some(entry) = first_entry {
                source = entry;
            }
        }

        let formats = match source["formats"].as_array() {
            Some(list) => list
                .iter()
                .filter_map(|f| StreamVariant::deserialize(f).ok())
                .collect(),
            None if playlist.is_some() => Vec::new(),
            None => {
                return Err(DownloadError::ParseError(
                    "No formats array in JSON".to_string(),
                ))
            }
        };

        let languages = |v: &serde_json::Value| -> Vec<String> {
            let mut langs: Vec<String> = v
                .as_object()
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            langs.sort();
            langs
        };

        Ok(Self {
            id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            uploader: source["uploader"].as_str().unwrap_or("Unknown").to_string(),
            duration_seconds: source["duration"].as_f64().unwrap_or(0.0) as u64,
            webpage_url: json["webpage_url"].as_str().unwrap_or("").to_string(),
            original_url: json["original_url"].as_str().unwrap_or("").to_string(),
            formats,
            subtitles: languages(&source["subtitles"]),
            automatic_captions: languages(&source["automatic_captions"]),
            playlist,
        })
    }

    pub fn is_playlist(&self) -> bool {
        self.playlist.is_some()
    }

    pub fn has_subtitles(&self) -> bool {
        !self.subtitles.is_empty() || !self.automatic_captions.is_empty()
    }

    /// URL to hand to the downloader: canonical page, then original, then fallback
    pub fn download_url<'a>(&'a self, fallback: &'a str) -> &'a str {
        if !self.webpage_url.is_empty() {
            &self.webpage_url
        } else if !self.original_url.is_empty() {
            &self.original_url
        } else {
            fallback
        }
    }

    /// Duration as `H:MM:SS` or `M:SS`
    pub fn duration_label(&self) -> String {
        let secs = self.duration_seconds;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{}:{:02}", m, s)
        }
    }
}

/// Everything the backend needs to run one download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    /// yt-dlp format selector expression
    pub format: String,
    /// yt-dlp output template
    pub output_template: String,
    pub proxy: Option<String>,
    pub ffmpeg_location: Option<String>,
    pub merge_output_format: Option<String>,
    pub subtitles: bool,
    pub audio_multistreams: bool,
    pub extract_audio: bool,
    pub playlist: bool,
}

impl DownloadRequest {
    /// yt-dlp arguments for this request, URL last
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.output_template.clone(),
            "--newline".to_string(),
            "--no-warnings".to_string(),
        ];

        args.push(if self.playlist { "--yes-playlist" } else { "--no-playlist" }.to_string());

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
            args.push("--no-check-certificates".to_string());
        }

        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.clone());
        }

        if self.extract_audio {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                "192K".to_string(),
            ]);
        } else {
            if let Some(container) = &self.merge_output_format {
                args.push("--merge-output-format".to_string());
                args.push(container.clone());
            }
            if self.audio_multistreams {
                args.push("--audio-multistreams".to_string());
            }
            if self.subtitles {
                args.extend([
                    "--write-subs".to_string(),
                    "--write-auto-subs".to_string(),
                    "--sub-langs".to_string(),
                    "all".to_string(),
                    "--embed-subs".to_string(),
                ]);
            }
        }

        args.push(self.url.clone());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_detection() {
        assert_eq!(Container::detect("webm", Some("vp9")), Container::Webm);
        assert_eq!(Container::detect("MP4", Some("avc1.640028")), Container::Mp4);
        assert_eq!(Container::detect("", Some("av01.0.08M.08")), Container::Webm);
        assert_eq!(Container::detect("3gp", Some("mp4v")), Container::Other("3gp".to_string()));
        assert_eq!(Container::detect("", None), Container::Unknown);
    }

    #[test]
    fn test_slot_label_omits_standard_fps() {
        let slot = QualitySlot { height: 720, fps: 30, container: Container::Mp4 };
        assert_eq!(slot.label(), "720p [mp4]");
        let slot = QualitySlot { height: 1080, fps: 60, container: Container::Webm };
        assert_eq!(slot.label(), "1080p60 [webm]");
    }

    #[test]
    fn test_parse_single_video() {
        let json = br#"{
            "id": "abc123",
            "title": "Test clip",
            "duration": 125.0,
            "webpage_url": "https://www.youtube.com/watch?v=abc123",
            "subtitles": {"en": [], "de": []},
            "automatic_captions": {"fr": []},
            "formats": [
                {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 130.5, "language": "en"},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "fps": 29.97, "tbr": 4400.1, "filesize_approx": 12345.0}
            ]
        }"#;
        let info = MediaInfo::from_ytdlp_json(json).unwrap();
        assert_eq!(info.title, "Test clip");
        assert_eq!(info.duration_label(), "2:05");
        assert_eq!(info.subtitles, vec!["de".to_string(), "en".to_string()]);
        assert_eq!(info.automatic_captions, vec!["fr".to_string()]);
        assert!(info.playlist.is_none());
        assert_eq!(info.formats.len(), 2);
        assert!(info.formats[0].is_pure_audio());
        assert_eq!(info.formats[0].language.as_deref(), Some("en"));
        assert_eq!(info.formats[1].rounded_fps(), 30);
        assert_eq!(info.formats[1].effective_size(), Some(12345));
    }

    #[test]
    fn test_parse_tolerates_loose_format_fields() {
        let json = br#"{
            "id": "x", "title": "Loose",
            "formats": [
                {"format_id": null, "ext": "mp4", "vcodec": "avc1", "height": 720.0, "width": null,
                 "filesize": 1048576.0, "language": "", "fps": null},
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"}
            ]
        }"#;
        let info = MediaInfo::from_ytdlp_json(json).unwrap();
        assert_eq!(info.formats.len(), 2);

        let video = &info.formats[0];
        assert_eq!(video.format_id, "");
        assert_eq!(video.height, Some(720));
        assert_eq!(video.width, None);
        assert_eq!(video.filesize, Some(1_048_576));
        assert_eq!(video.language, None);
        assert_eq!(video.rounded_fps(), 30);
        assert!(!info.formats[1].has_video() && !info.formats[1].has_audio());
    }

    #[test]
    fn test_parse_playlist_takes_first_entry_formats() {
        let json = br#"{
            "id": "PL1",
            "title": "My list",
            "playlist_count": 12,
            "webpage_url": "https://www.youtube.com/playlist?list=PL1",
            "entries": [
                {"id": "v1", "title": "First", "duration": 3700, "formats": [
                    {"format_id": "22", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 720}
                ]}
            ]
        }"#;
        let info = MediaInfo::from_ytdlp_json(json).unwrap();
        assert_eq!(info.playlist, Some(PlaylistInfo { title: "My list".to_string(), count: 12 }));
        assert_eq!(info.formats.len(), 1);
        assert_eq!(info.duration_label(), "1:01:40");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            MediaInfo::from_ytdlp_json(b"not json"),
            Err(DownloadError::ParseError(_))
        ));
    }

    #[test]
    fn test_download_url_fallbacks() {
        let mut info = MediaInfo::default();
        assert_eq!(info.download_url("https://x"), "https://x");
        info.original_url = "https://orig".to_string();
        assert_eq!(info.download_url("https://x"), "https://orig");
        info.webpage_url = "https://page".to_string();
        assert_eq!(info.download_url("https://x"), "https://page");
    }

    #[test]
    fn test_request_args_video_with_proxy() {
        let req = DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            format: "137+140/best".to_string(),
            output_template: "./%(title)s.%(ext)s".to_string(),
            proxy: Some("http://127.0.0.1:8888".to_string()),
            ffmpeg_location: Some("/usr/bin/ffmpeg".to_string()),
            merge_output_format: Some("mkv".to_string()),
            subtitles: true,
            audio_multistreams: false,
            extract_audio: false,
            playlist: false,
        };
        let args = req.to_args();
        assert_eq!(&args[..2], &["-f".to_string(), "137+140/best".to_string()]);
        assert!(args.contains(&"--no-check-certificates".to_string()));
        assert!(args.contains(&"--embed-subs".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(!args.contains(&"-x".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn test_request_args_audio_only() {
        let req = DownloadRequest {
            url: "u".to_string(),
            format: "bestaudio/best".to_string(),
            output_template: "t".to_string(),
            proxy: None,
            ffmpeg_location: None,
            merge_output_format: Some("mkv".to_string()),
            subtitles: true,
            audio_multistreams: false,
            extract_audio: true,
            playlist: true,
        };
        let args = req.to_args();
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--yes-playlist".to_string()));
        assert!(!args.contains(&"--merge-output-format".to_string()));
        assert!(!args.contains(&"--embed-subs".to_string()));
        assert!(!args.contains(&"--proxy".to_string()));
    }
}

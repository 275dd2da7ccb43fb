// yt-dlp `--newline` output parsing for terminal status lines

use regex::Regex;

/// What a single yt-dlp stdout line tells us
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A new file is being written
    Destination(String),
    /// Transfer progress of the current file
    Progress { percent: f32, status: String },
    /// Streams are being merged by ffmpeg
    Merging,
    /// Audio is being extracted/converted
    ExtractingAudio,
    /// Subtitles are being embedded
    EmbeddingSubtitles,
    AlreadyDownloaded,
}

/// Parse yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_ytdlp_progress(line: &str) -> Option<ProgressEvent> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+/s|Unknown speed))?(?:\s+ETA\s+(\S+))?(?:\s+\(frag\s+(\d+)/(\d+)\))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger\]\s+Merging").unwrap();
        static ref EXTRACT_RE: Regex = Regex::new(r"\[ExtractAudio\]\s+Destination").unwrap();
        static ref EMBED_RE: Regex = Regex::new(r"\[EmbedSubtitle\]").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str()).unwrap_or("?");
        let eta = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        let status = match (caps.get(5), caps.get(6)) {
            (Some(fc), Some(ft)) => format!(
                "{:5.1}% of {} @ {} ETA {} (frag {}/{})",
                percent,
                size,
                speed,
                eta,
                fc.as_str(),
                ft.as_str()
            ),
            _ if !eta.is_empty() => format!("{:5.1}% of {} @ {} ETA {}", percent, size, speed, eta),
            _ => format!("{:5.1}% of {} @ {}", percent, size, speed),
        };

        return Some(ProgressEvent::Progress { percent, status });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("file");
        // Just the file name, not the full path
        let short_name = filename
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(filename);
        return Some(ProgressEvent::Destination(short_name.to_string()));
    }

    if MERGE_RE.is_match(line) {
        return Some(ProgressEvent::Merging);
    }

    if EXTRACT_RE.is_match(line) {
        return Some(ProgressEvent::ExtractingAudio);
    }

    if EMBED_RE.is_match(line) {
        return Some(ProgressEvent::EmbeddingSubtitles);
    }

    if ALREADY_RE.is_match(line) {
        return Some(ProgressEvent::AlreadyDownloaded);
    }

    None
}

// InfoExtractor trait and common types

use async_trait::async_trait;
use std::fmt;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadRequest, MediaInfo};
use crate::downloader::progress::ProgressEvent;

/// How yt-dlp is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorMode {
    /// Python module (`python3 -m yt_dlp`)
    Python,
    /// Standalone `yt-dlp` binary
    Cli,
    /// Python first, binary as fallback
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Configuration for one extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub mode: ExtractorMode,
    /// HTTP proxy URL; certificate checks are disabled when set
    pub proxy: Option<String>,
    /// yt-dlp socket timeout in seconds
    pub timeout_seconds: u32,
    /// Extract a whole playlist (only its first item's formats are read)
    pub playlist: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Auto,
            proxy: None,
            timeout_seconds: 30,
            playlist: false,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_mode(mut self, mode: ExtractorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_playlist(mut self, playlist: bool) -> Self {
        self.playlist = playlist;
        self
    }

    /// yt-dlp arguments for a metadata-only run, URL last
    pub fn probe_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.timeout_seconds.to_string(),
        ];

        if self.playlist {
            // Formats of the first item are enough for the menu
            args.extend([
                "--yes-playlist".to_string(),
                "--playlist-items".to_string(),
                "1".to_string(),
            ]);
        } else {
            args.push("--no-playlist".to_string());
        }

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
            args.push("--no-check-certificates".to_string());
        }

        args.push(url.to_string());
        args
    }
}

/// Receives parsed yt-dlp progress while a download runs
pub type ProgressCallback<'a> = &'a (dyn Fn(ProgressEvent) + Send + Sync);

/// A way of running yt-dlp
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    fn is_available(&self) -> bool;

    /// Fetch metadata without downloading
    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<MediaInfo, DownloadError>;

    /// Download and merge; blocks until yt-dlp exits
    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), DownloadError>;
}

// Python InfoExtractor - uses `python3 -m yt_dlp`
//
// Matches the embedded-library usage of yt-dlp most closely and is what
// the dependency installer provides via pip.

use async_trait::async_trait;

use super::traits::{ExtractorConfig, InfoExtractor, ProgressCallback};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadRequest, MediaInfo};
use crate::downloader::tools::{python_cmd, python_has_module};
use crate::downloader::utils::{run_capture, run_streaming};

/// Python-based extractor using the yt_dlp module
pub struct PythonInfoExtractor {
    python_cmd: String,
}

impl PythonInfoExtractor {
    pub fn new() -> Self {
        Self {
            python_cmd: python_cmd(),
        }
    }

    fn with_module(args: Vec<String>) -> Vec<String> {
        let mut full = vec!["-m".to_string(), "yt_dlp".to_string()];
        full.extend(args);
        full
    }
}

impl Default for PythonInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for PythonInfoExtractor {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    fn is_available(&self) -> bool {
        python_has_module(&self.python_cmd, "yt_dlp")
    }

    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<MediaInfo, DownloadError> {
        let args = Self::with_module(config.probe_args(url));
        let stdout = run_capture(&self.python_cmd, args).await?;
        MediaInfo::from_ytdlp_json(&stdout)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), DownloadError> {
        let args = Self::with_module(request.to_args());
        run_streaming(&self.python_cmd, args, on_progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_prefix() {
        let args = PythonInfoExtractor::with_module(vec!["--version".to_string()]);
        assert_eq!(args, vec!["-m", "yt_dlp", "--version"]);
    }
}

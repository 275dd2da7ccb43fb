// CLI InfoExtractor - uses the native `yt-dlp` binary
//
// No Python dependency; used when the module is missing or as a fallback.

use async_trait::async_trait;

use super::traits::{ExtractorConfig, InfoExtractor, ProgressCallback};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadRequest, MediaInfo};
use crate::downloader::tools::find_ytdlp;
use crate::downloader::utils::{command_succeeds, run_capture, run_streaming};

/// CLI-based extractor using the yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
}

impl CliInfoExtractor {
    pub fn new() -> Self {
        Self {
            ytdlp_path: find_ytdlp(),
        }
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: path.into(),
        }
    }
}

impl Default for CliInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        command_succeeds(&self.ytdlp_path, &["--version"])
    }

    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<MediaInfo, DownloadError> {
        let stdout = run_capture(&self.ytdlp_path, config.probe_args(url)).await?;
        MediaInfo::from_ytdlp_json(&stdout)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), DownloadError> {
        run_streaming(&self.ytdlp_path, request.to_args(), on_progress).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    /// Writes an executable stand-in for yt-dlp that prints `body`
    fn fake_ytdlp(dir: &std::path::Path, body: &str) -> String {
        let path = dir.join("yt-dlp");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{}", body).unwrap();
        drop(file);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ytfetch-cli-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_extract_parses_binary_output() {
        let dir = scratch_dir("extract");
        let script = r#"cat <<'EOF'
{"id": "abc", "title": "Fake", "duration": 61, "webpage_url": "https://www.youtube.com/watch?v=abc",
 "formats": [{"format_id": "18", "ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360}]}
EOF"#;
        let extractor = CliInfoExtractor::with_path(fake_ytdlp(&dir, script));
        assert!(extractor.is_available());

        let info = extractor
            .extract("https://www.youtube.com/watch?v=abc", &ExtractorConfig::default())
            .await
            .unwrap();
        assert_eq!(info.title, "Fake");
        assert_eq!(info.formats.len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_extract_surfaces_certificate_failure() {
        let dir = scratch_dir("cert");
        let script = "echo 'ERROR: [SSL: CERTIFICATE_VERIFY_FAILED] certificate verify failed' >&2\nexit 1";
        let extractor = CliInfoExtractor::with_path(fake_ytdlp(&dir, script));
        let err = extractor
            .extract("u", &ExtractorConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_certificate_error());
        let _ = std::fs::remove_dir_all(&dir);
    }
}

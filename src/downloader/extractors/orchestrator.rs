// InfoExtractor Orchestrator - mode selection and tool fallback
//
// Auto mode prefers the Python module and falls back to the binary. A
// fallback only happens when the tool itself failed (missing, could not be
// started); site errors from yt-dlp are returned as-is so the caller can
// react to them (e.g. certificate failures behind a proxy).

use async_trait::async_trait;

use super::cli::CliInfoExtractor;
use super::python::PythonInfoExtractor;
use super::traits::{ExtractorConfig, ExtractorMode, InfoExtractor, ProgressCallback};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadRequest, MediaInfo};

/// Runs yt-dlp through whichever extractor is available
pub struct InfoExtractorOrchestrator {
    mode: ExtractorMode,
    extractors: Vec<Box<dyn InfoExtractor>>,
}

impl InfoExtractorOrchestrator {
    pub fn new(mode: ExtractorMode) -> Self {
        let python: Box<dyn InfoExtractor> = Box::new(PythonInfoExtractor::new());
        let cli: Box<dyn InfoExtractor> = Box::new(CliInfoExtractor::new());
        let extractors = match mode {
            ExtractorMode::Python => vec![python],
            ExtractorMode::Cli => vec![cli],
            ExtractorMode::Auto => vec![python, cli],
        };
        Self::with_extractors(mode, extractors)
    }

    /// Use an explicit, ordered list of extractors
    pub fn with_extractors(mode: ExtractorMode, extractors: Vec<Box<dyn InfoExtractor>>) -> Self {
        Self { mode, extractors }
    }

    pub fn mode(&self) -> ExtractorMode {
        self.mode
    }

    /// Available extractors in preference order
    fn candidates(&self) -> Vec<&dyn InfoExtractor> {
        self.extractors
            .iter()
            .map(|e| e.as_ref())
            .filter(|e| e.is_available())
            .collect()
    }

    fn no_tool_error(&self) -> DownloadError {
        DownloadError::ToolNotFound(format!(
            "no yt-dlp available for mode '{}' (install with: pip install yt-dlp)",
            self.mode
        ))
    }
}

fn is_tool_failure(e: &DownloadError) -> bool {
    matches!(e, DownloadError::ToolNotFound(_) | DownloadError::ExecutionError(_))
}

#[async_trait]
impl InfoExtractor for InfoExtractorOrchestrator {
    fn name(&self) -> &'static str {
        "orchestrator"
    }

    fn is_available(&self) -> bool {
        self.extractors.iter().any(|e| e.is_available())
    }

    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<MediaInfo, DownloadError> {
        let mut last_error = self.no_tool_error();

        for extractor in self.candidates() {
            tracing::info!(extractor = extractor.name(), url, proxy = ?config.proxy, "extracting");
            match extractor.extract(url, config).await {
                Ok(info) => {
                    tracing::info!(extractor = extractor.name(), formats = info.formats.len(), "extraction succeeded");
                    return Ok(info);
                }
                Err(e) if is_tool_failure(&e) => {
                    tracing::warn!(extractor = extractor.name(), error = %e, "extractor failed, trying next");
                    last_error = e;
                }
                Err(e) => {
                    tracing::warn!(extractor = extractor.name(), error = %e, "extraction failed");
                    return Err(e);
                }
            }
        }

        Err(last_error)
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(), DownloadError> {
        let mut last_error = self.no_tool_error();

        for extractor in self.candidates() {
            match extractor.download(request, on_progress).await {
                Ok(()) => return Ok(()),
                Err(e) if is_tool_failure(&e) => {
                    tracing::warn!(extractor = extractor.name(), error = %e, "download tool failed, trying next");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        available: bool,
        result: Result<MediaInfo, DownloadError>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InfoExtractor for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn extract(&self, _url: &str, _config: &ExtractorConfig) -> Result<MediaInfo, DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn download(&self, _request: &DownloadRequest, _on_progress: ProgressCallback<'_>) -> Result<(), DownloadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map(|_| ())
        }
    }

    fn scripted(name: &'static str, available: bool, result: Result<MediaInfo, DownloadError>) -> (Box<dyn InfoExtractor>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(Scripted { name, available, result, calls: calls.clone() }), calls)
    }

    fn info(title: &str) -> MediaInfo {
        MediaInfo { title: title.to_string(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_falls_back_on_tool_failure() {
        let (python, python_calls) = scripted("py", true, Err(DownloadError::ToolNotFound("python3".into())));
        let (cli, cli_calls) = scripted("cli", true, Ok(info("from cli")));
        let orchestrator = InfoExtractorOrchestrator::with_extractors(ExtractorMode::Auto, vec![python, cli]);

        let result = orchestrator.extract("u", &ExtractorConfig::default()).await.unwrap();
        assert_eq!(result.title, "from cli");
        assert_eq!(python_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cli_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_site_error_is_not_retried() {
        let (python, _) = scripted("py", true, Err(DownloadError::Certificate("bad cert".into())));
        let (cli, cli_calls) = scripted("cli", true, Ok(info("unused")));
        let orchestrator = InfoExtractorOrchestrator::with_extractors(ExtractorMode::Auto, vec![python, cli]);

        let err = orchestrator.extract("u", &ExtractorConfig::default()).await.unwrap_err();
        assert!(err.is_certificate_error());
        assert_eq!(cli_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_extractors_are_skipped() {
        let (python, python_calls) = scripted("py", false, Ok(info("unused")));
        let (cli, _) = scripted("cli", true, Ok(info("cli")));
        let orchestrator = InfoExtractorOrchestrator::with_extractors(ExtractorMode::Auto, vec![python, cli]);

        assert!(orchestrator.is_available());
        let noop = |_: crate::downloader::progress::ProgressEvent| {};
        orchestrator.download(&sample_request(), &noop).await.unwrap();
        assert_eq!(python_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let (cli, _) = scripted("cli", false, Ok(info("unused")));
        let orchestrator = InfoExtractorOrchestrator::with_extractors(ExtractorMode::Cli, vec![cli]);
        assert!(!orchestrator.is_available());
        let err = orchestrator.extract("u", &ExtractorConfig::default()).await.unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    fn sample_request() -> DownloadRequest {
        DownloadRequest {
            url: "u".into(),
            format: "bestaudio/best".into(),
            output_template: "%(title)s.%(ext)s".into(),
            proxy: None,
            ffmpeg_location: None,
            merge_output_format: None,
            subtitles: false,
            audio_multistreams: false,
            extract_audio: true,
            playlist: false,
        }
    }
}

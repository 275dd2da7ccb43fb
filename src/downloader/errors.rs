// Error types for extraction and download

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DownloadError {
    /// Network timeout while connecting to YouTube
    #[error("Network timeout: the site is not responding")]
    NetworkTimeout,

    /// YouTube blocked the request (429, bot detection, etc.)
    #[error(
        "YouTube is temporarily throttling requests from your IP address.\n\
         This usually resolves on its own in a few hours.\n\
         Try again later, or route through a proxy/VPN."
    )]
    BlockedByYouTube,

    /// TLS certificate validation failed (usually an intercepting proxy)
    #[error("Certificate verification failed: {0}")]
    Certificate(String),

    /// yt-dlp or python not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Cancelled from the keyboard
    #[error("Interrupted by user")]
    Interrupted,

    /// Unknown error with details
    #[error("{0}")]
    Unknown(String),
}

impl DownloadError {
    pub fn is_certificate_error(&self) -> bool {
        matches!(self, Self::Certificate(_))
    }
}

fn looks_like_certificate_failure(lower: &str) -> bool {
    lower.contains("certificate_verify_failed")
        || lower.contains("certificate verify failed")
        || lower.contains("self signed certificate")
        || lower.contains("self-signed certificate")
        || lower.contains("sslcertverificationerror")
        || lower.contains("unable to get local issuer certificate")
}

// Classifies raw stderr text from yt-dlp
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        // Certificate failures come first: they decide the proxy fallback
        if looks_like_certificate_failure(&lower) {
            return Self::Certificate(first_error_line(&s));
        }

        // IP blocking detection
        if (lower.contains("timeout") || lower.contains("timed out")) && lower.contains("youtube.com") {
            return Self::BlockedByYouTube;
        }

        // Generic network timeout
        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        // Explicit blocks
        if lower.contains("429") || lower.contains("not a bot") || lower.contains("blocked") {
            return Self::BlockedByYouTube;
        }

        // Tool not found
        if lower.contains("no module named") || lower.contains("no such file") || lower.contains("command not found") {
            return Self::ToolNotFound(s);
        }

        // Invalid URLs
        if lower.contains("invalid url") || lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidUrl(first_error_line(&s));
        }

        Self::Unknown(s.trim().to_string())
    }
}

/// First `ERROR:` line of yt-dlp stderr, or the first non-empty line
fn first_error_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| s.lines().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("")
        .to_string()
}

// Failure diagnostics - maps yt-dlp error text to a reason and a hint

/// Why a site refused to hand out a video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// DRM-protected or paid content; permanent
    DrmProtected,
    MembersOnly,
    /// SABR streaming protection hides the formats
    SabrStreaming,
    /// Proof-of-origin token required
    PoTokenRequired,
    AgeRestricted,
    PrivateVideo,
    VideoUnavailable,
    GeoBlocked,
    RateLimited,
    BotDetection,
    /// TLS interception without a trusted certificate
    CertificateRejected,
    Http403Forbidden,
    NetworkTimeout,
    Unknown,
}

// Checked in order; the first reason with a matching pattern wins
const PATTERNS: &[(BlockingReason, &[&str])] = &[
    (
        BlockingReason::DrmProtected,
        &[
            "drm protected",
            "drm-protected",
            "protected by drm",
            "widevine",
            "playready",
            "fairplay",
            "requires purchase",
            "youtube premium",
        ],
    ),
    (
        BlockingReason::MembersOnly,
        &["members only", "members-only", "join this channel", "available to members"],
    ),
    (BlockingReason::SabrStreaming, &["sabr"]),
    (BlockingReason::PoTokenRequired, &["po token", "proof of origin"]),
    (
        BlockingReason::AgeRestricted,
        &["age-restricted", "sign in to confirm your age"],
    ),
    (BlockingReason::PrivateVideo, &["private video", "video is private"]),
    (
        BlockingReason::VideoUnavailable,
        &["video unavailable", "video has been removed", "no longer available"],
    ),
    (
        BlockingReason::GeoBlocked,
        &["not available in your country", "blocked in your country", "geo restrict"],
    ),
    (
        BlockingReason::RateLimited,
        &["429", "rate limit", "too many requests"],
    ),
    (
        BlockingReason::BotDetection,
        &["not a bot", "captcha", "unusual traffic"],
    ),
    (
        BlockingReason::CertificateRejected,
        &["certificate_verify_failed", "certificate verify failed", "self signed certificate"],
    ),
    (BlockingReason::Http403Forbidden, &["403", "forbidden"]),
    (
        BlockingReason::NetworkTimeout,
        &["timed out", "timeout", "connection refused", "network is unreachable"],
    ),
];

impl BlockingReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::SabrStreaming => "SABR streaming protection active",
            Self::PoTokenRequired => "Proof of Origin token required",
            Self::AgeRestricted => "Age-restricted content",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::GeoBlocked => "Geographic restriction",
            Self::RateLimited => "Rate limited",
            Self::BotDetection => "Bot detection triggered",
            Self::CertificateRejected => "TLS certificate rejected",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::NetworkTimeout => "Network timeout",
            Self::Unknown => "Unknown error",
        }
    }

    /// Nothing the user can change will make this work
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    pub fn proxy_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::GeoBlocked
                | Self::NetworkTimeout
                | Self::RateLimited
                | Self::BotDetection
        )
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DrmProtected => Some("This content is protected and cannot be downloaded as a file."),
            Self::MembersOnly => Some("Only channel members can access this video."),
            Self::SabrStreaming | Self::PoTokenRequired => {
                Some("Update yt-dlp (pip install -U yt-dlp) or try the audio-only option.")
            }
            Self::AgeRestricted | Self::PrivateVideo => {
                Some("This video needs a signed-in account to access.")
            }
            Self::VideoUnavailable => Some("The video was removed or made private."),
            Self::GeoBlocked => Some("Try a proxy or VPN in a region where the video is available."),
            Self::RateLimited | Self::BotDetection => {
                Some("Wait a few minutes, or switch network/proxy, then try again.")
            }
            Self::CertificateRejected => Some("The proxy intercepts TLS; retry without it."),
            Self::Http403Forbidden => Some("Update yt-dlp, or try again through a different network."),
            Self::NetworkTimeout => Some("Check your connection and try again."),
            Self::Unknown => None,
        }
    }
}

/// Classify yt-dlp error text; `None` for empty input
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();
    let reason = PATTERNS
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(reason, _)| *reason)
        .unwrap_or(BlockingReason::Unknown);
    Some(reason)
}

/// Multi-line report: reason, hint and the proxy in use
pub fn describe_failure(error: &str, proxy: Option<&str>) -> String {
    let reason = match diagnose_error(error) {
        Some(r) => r,
        None => return "Unknown error".to_string(),
    };

    let mut report = reason.description().to_string();
    if let Some(hint) = reason.suggestion() {
        report.push_str("\n    ");
        report.push_str(hint);
    }

    if !reason.is_permanent() {
        match proxy {
            Some(p) => report.push_str(&format!("\n    Proxy in use: {}", p)),
            None if reason.proxy_might_help() => report.push_str("\n    No proxy active."),
            None => {}
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_detection() {
        assert_eq!(
            diagnose_error("ERROR: HTTP Error 403: Forbidden"),
            Some(BlockingReason::Http403Forbidden)
        );
    }

    #[test]
    fn test_sabr_and_po_token() {
        assert_eq!(
            diagnose_error("YouTube is forcing SABR streaming for this client"),
            Some(BlockingReason::SabrStreaming)
        );
        assert_eq!(
            diagnose_error("mweb client https formats require a GVS PO Token"),
            Some(BlockingReason::PoTokenRequired)
        );
    }

    #[test]
    fn test_certificate_detection() {
        assert_eq!(
            diagnose_error("[SSL: CERTIFICATE_VERIFY_FAILED] certificate verify failed"),
            Some(BlockingReason::CertificateRejected)
        );
    }

    #[test]
    fn test_specific_beats_generic() {
        // DRM text wins over the generic 403
        assert_eq!(
            diagnose_error("HTTP Error 403: This video is DRM protected"),
            Some(BlockingReason::DrmProtected)
        );
        assert_eq!(diagnose_error("Read timed out."), Some(BlockingReason::NetworkTimeout));
    }

    #[test]
    fn test_drm_needs_the_whole_phrase() {
        // "drm" inside other words must not hide the real reason
        assert_eq!(
            diagnose_error("ERROR: HTTP Error 403: Forbidden (ipv6 ANDRMX edge)"),
            Some(BlockingReason::Http403Forbidden)
        );
        assert_eq!(
            diagnose_error("ERROR: [youtube] abc: This video is DRM-protected"),
            Some(BlockingReason::DrmProtected)
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(diagnose_error("something odd"), Some(BlockingReason::Unknown));
        assert_eq!(diagnose_error("   "), None);
    }

    #[test]
    fn test_describe_failure_mentions_proxy() {
        let report = describe_failure("HTTP Error 429: Too Many Requests", Some("http://127.0.0.1:8888"));
        assert!(report.starts_with("Rate limited"));
        assert!(report.contains("Proxy in use: http://127.0.0.1:8888"));

        let report = describe_failure("Video unavailable", Some("http://127.0.0.1:8888"));
        assert!(!report.contains("Proxy in use"));
    }
}

// Runtime configuration read from the environment (there are no CLI flags)

use crate::downloader::extractors::{ExtractorConfig, ExtractorMode};
use crate::downloader::url::UrlPolicy;

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8888";
pub const DEFAULT_PROBE_URL: &str = "http://www.gstatic.com/generate_204";
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 2;

/// Proxy probe settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Candidate endpoint; `None` skips the probe entirely
    pub endpoint: Option<String>,
    /// Health check URL fetched through the proxy
    pub probe_url: String,
    pub probe_timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_PROXY_URL.to_string()),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub proxy: ProxyConfig,
    pub url_policy: UrlPolicy,
    pub extractor: ExtractorConfig,
    /// Container used when merging video and audio
    pub merge_output_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            url_policy: UrlPolicy::default(),
            extractor: ExtractorConfig::default(),
            merge_output_format: "mkv".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(proxy) = get("YTFETCH_PROXY") {
            config.proxy.endpoint = match proxy.to_ascii_lowercase().as_str() {
                "off" | "none" | "direct" => None,
                _ => Some(proxy),
            };
        }

        if let Some(url) = get("YTFETCH_PROBE_URL") {
            config.proxy.probe_url = url;
        }

        if let Some(secs) = get("YTFETCH_PROBE_TIMEOUT").and_then(|v| v.parse::<u64>().ok()) {
            config.proxy.probe_timeout_secs = secs.max(1);
        }

        if let Some(policy) = get("YTFETCH_URL_POLICY") {
            match policy.to_ascii_lowercase().as_str() {
                "video" => config.url_policy = UrlPolicy::VideoOnly,
                "playlist" => config.url_policy = UrlPolicy::KeepPlaylist,
                other => tracing::warn!(value = other, "ignoring unknown YTFETCH_URL_POLICY"),
            }
        }

        if let Some(mode) = get("YTFETCH_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "python" => config.extractor = config.extractor.with_mode(ExtractorMode::Python),
                "cli" => config.extractor = config.extractor.with_mode(ExtractorMode::Cli),
                "auto" => config.extractor = config.extractor.with_mode(ExtractorMode::Auto),
                other => tracing::warn!(value = other, "ignoring unknown YTFETCH_MODE"),
            }
        }

        if let Some(secs) = get("YTFETCH_SOCKET_TIMEOUT").and_then(|v| v.parse::<u32>().ok()) {
            config.extractor = config.extractor.with_timeout(secs);
        }

        config
    }
}

// Local proxy reachability probe

use std::time::Duration;

use crate::config::ProxyConfig;

/// Check once whether the configured proxy forwards traffic.
///
/// Returns the proxy endpoint when the health check answers 200/204 through
/// it, `None` otherwise. Certificates are not verified: the proxy may be a
/// local intercepting proxy with a self-signed certificate. Never fails.
pub async fn probe_proxy(config: &ProxyConfig) -> Option<String> {
    let endpoint = config.endpoint.as_deref()?;
    tracing::debug!(proxy = endpoint, probe = %config.probe_url, "probing proxy");

    let proxy = match reqwest::Proxy::all(endpoint) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(proxy = endpoint, error = %e, "invalid proxy URL");
            return None;
        }
    };

    let client = match reqwest::Client::builder()
        .proxy(proxy)
        .danger_accept_invalid_certs(true)
        .timeout(Duration::from_secs(config.probe_timeout_secs))
        .connect_timeout(Duration::from_secs(config.probe_timeout_secs))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build proxy client");
            return None;
        }
    };

    match client.get(&config.probe_url).send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            if status == 200 || status == 204 {
                tracing::info!(proxy = endpoint, status, "proxy available");
                Some(endpoint.to_string())
            } else {
                tracing::info!(proxy = endpoint, status, "proxy answered with unexpected status");
                None
            }
        }
        Err(e) => {
            tracing::info!(proxy = endpoint, error = %e, "proxy unavailable");
            None
        }
    }
}

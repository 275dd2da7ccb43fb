// URL normalization: canonical watch URLs without tracking parameters

use url::{form_urlencoded, Url};

const SHORT_LINK_HOSTS: [&str; 2] = ["youtu.be", "www.youtu.be"];

/// Which query parameters survive normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlPolicy {
    /// Keep only the video identifier (`v`)
    VideoOnly,
    /// Keep the video identifier and the playlist (`list`)
    #[default]
    KeepPlaylist,
}

impl UrlPolicy {
    fn keeps(&self, key: &str) -> bool {
        match self {
            Self::VideoOnly => key == "v",
            Self::KeepPlaylist => key == "v" || key == "list",
        }
    }
}

/// `youtu.be/x` or `www.youtube.com/watch?...`: a dotted host with no scheme
fn looks_like_bare_host(raw: &str) -> bool {
    let host = raw.split(['/', '?', '#']).next().unwrap_or("");
    !raw.contains("://") && host.contains('.') && !host.contains(char::is_whitespace)
}

/// Query filtering for input the URL parser rejects
fn filter_raw_query(raw: &str, policy: UrlPolicy) -> String {
    let (base, query) = match raw.split_once('?') {
        Some(parts) => parts,
        None => return raw.to_string(),
    };

    let mut kept = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (k, v) in form_urlencoded::parse(query.as_bytes()).filter(|(k, _)| policy.keeps(k)) {
        kept.append_pair(&k, &v);
        any = true;
    }

    if any {
        format!("{}?{}", base, kept.finish())
    } else {
        base.to_string()
    }
}

/// Canonicalize a user-typed URL.
///
/// Short links become `https://www.youtube.com/watch?v=<id>`; everything else
/// keeps scheme, host and path and loses every query parameter the policy does
/// not keep. A missing scheme defaults to https. Input that still does not
/// parse only has its query filtered.
pub fn normalize_url(raw: &str, policy: UrlPolicy) -> String {
    let raw = raw.trim();
    let parsed = Url::parse(raw).or_else(|e| {
        if looks_like_bare_host(raw) {
            Url::parse(&format!("https://{}", raw))
        } else {
            Err(e)
        }
    });
    let mut parsed = match parsed {
        Ok(u) => u,
        Err(_) => return filter_raw_query(raw, policy),
    };

    let mut kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| policy.keeps(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let is_short_link = parsed
        .host_str()
        .map_or(false, |h| SHORT_LINK_HOSTS.contains(&h.to_ascii_lowercase().as_str()));

    if is_short_link {
        let video_id = parsed
            .path_segments()
            .and_then(|mut s| s.next())
            .unwrap_or("")
            .to_string();
        let canonical = match Url::parse("https://www.youtube.com/watch") {
            Ok(u) => u,
            Err(_) => return raw.to_string(),
        };
        parsed = canonical;
        kept.retain(|(k, _)| k != "v");
        if !video_id.is_empty() {
            kept.insert(0, ("v".to_string(), video_id));
        }
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }

    parsed.to_string()
}

/// Whether the (normalized) URL points at a playlist
pub fn is_playlist_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.query_pairs().any(|(k, _)| k == "list"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_with_tracking() {
        assert_eq!(
            normalize_url("https://youtu.be/abc123?si=xyz", UrlPolicy::default()),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn test_short_link_www_and_whitespace() {
        assert_eq!(
            normalize_url("  http://www.youtu.be/dQw4w9WgXcQ\n", UrlPolicy::VideoOnly),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_tracking_params_removed() {
        let url = "https://www.youtube.com/watch?si=campaign&v=abc123&feature=share&t=42";
        assert_eq!(
            normalize_url(url, UrlPolicy::VideoOnly),
            "https://www.youtube.com/watch?v=abc123"
        );
    }

    #[test]
    fn test_playlist_policy() {
        let url = "https://www.youtube.com/watch?v=abc123&list=PLxyz&index=3&pp=foo";
        assert_eq!(
            normalize_url(url, UrlPolicy::KeepPlaylist),
            "https://www.youtube.com/watch?v=abc123&list=PLxyz"
        );
        assert_eq!(
            normalize_url(url, UrlPolicy::VideoOnly),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert!(is_playlist_url(&normalize_url(url, UrlPolicy::KeepPlaylist)));
        assert!(!is_playlist_url("https://www.youtube.com/watch?v=abc123"));
    }

    #[test]
    fn test_no_kept_params_drops_query() {
        assert_eq!(
            normalize_url("https://vimeo.com/12345?share=copy", UrlPolicy::default()),
            "https://vimeo.com/12345"
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "https://youtu.be/abc123?si=xyz",
            "https://www.youtube.com/watch?v=abc123&list=PL1&si=1",
            "https://www.youtube.com/playlist?list=PL1&si=2",
            "https://example.com/video",
            "youtu.be/abc123?si=xyz",
            "www.youtube.com/watch?v=abc123&si=xyz",
            "not a url",
            "not a url?v=1&si=2",
        ];
        for policy in [UrlPolicy::VideoOnly, UrlPolicy::KeepPlaylist] {
            for input in inputs {
                let once = normalize_url(input, policy);
                assert_eq!(normalize_url(&once, policy), once, "input: {}", input);
            }
        }
    }

    #[test]
    fn test_missing_scheme() {
        assert_eq!(
            normalize_url("youtu.be/abc123?si=xyz", UrlPolicy::VideoOnly),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            normalize_url("www.youtube.com/watch?v=abc123&si=xyz", UrlPolicy::VideoOnly),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            normalize_url("youtube.com/watch?v=abc123&list=PL1&si=xyz", UrlPolicy::KeepPlaylist),
            "https://youtube.com/watch?v=abc123&list=PL1"
        );
    }

    #[test]
    fn test_unparseable_query_is_still_filtered() {
        let cleaned = normalize_url("not a url?v=1&si=2", UrlPolicy::VideoOnly);
        assert_eq!(cleaned, "not a url?v=1");
        assert!(!cleaned.contains("si="));
    }

    #[test]
    fn test_unparseable_is_trimmed() {
        assert_eq!(normalize_url("  hello world ", UrlPolicy::default()), "hello world");
    }
}

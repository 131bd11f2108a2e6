//! Fixed probe endpoints and the server roster.
//!
//! Everything the collector talks to is defined here, ordered and
//! constant for the process lifetime.

use crate::errors::NetTestError;
use url::Url;

/// Endpoint for ping, jitter and packet probes.
pub(crate) static PROBE_URL: &str = "https://httpbin.org/get";

/// Fixed 1 MiB payload for the download measurement.
pub(crate) static DOWNLOAD_URL: &str = "https://httpbin.org/bytes/1048576";

/// Upload sink; the payload is generated locally.
pub(crate) static UPLOAD_URL: &str = "https://httpbin.org/post";
pub(crate) const UPLOAD_BYTES: usize = 512 * 1024;

/// Domains resolved by the DNS test, in order.
pub(crate) static DNS_DOMAINS: [&str; 3] =
    ["google.com", "github.com", "microsoft.com"];

/// One entry of the server roster.
#[derive(Debug, Clone, Copy)]
pub struct ProbeTarget {
    pub name: &'static str,
    pub host: &'static str,
    pub location: &'static str,
}

/// The fixed roster probed by the server test, in display order.
pub(crate) static SERVER_ROSTER: [ProbeTarget; 6] = [
    ProbeTarget { name: "Google DNS", host: "8.8.8.8", location: "Global" },
    ProbeTarget { name: "Cloudflare", host: "1.1.1.1", location: "Global" },
    ProbeTarget {
        name: "Microsoft",
        host: "microsoft.com",
        location: "United States",
    },
    ProbeTarget {
        name: "GitHub",
        host: "github.com",
        location: "United States",
    },
    ProbeTarget {
        name: "Amazon",
        host: "amazon.com",
        location: "United States",
    },
    ProbeTarget { name: "HiNet", host: "hinet.net", location: "Taiwan" },
];

/// Promote a bare host to an HTTPS URL.
///
/// Hosts that already carry a scheme or a path are used as-is; anything
/// that fails to parse afterwards is a programmer error, the one failure
/// a probe is allowed to surface.
pub(crate) fn probe_url(host: &str) -> Result<Url, NetTestError> {
    let candidate = if host.contains("://") || host.contains('/') {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    Url::parse(&candidate).map_err(|err| NetTestError::invalid_target(host, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_is_promoted_to_https() {
        assert_eq!(probe_url("github.com").unwrap().as_str(), "https://github.com/");
    }

    #[test]
    fn test_ip_host_is_promoted_to_https() {
        assert_eq!(probe_url("8.8.8.8").unwrap().as_str(), "https://8.8.8.8/");
    }

    #[test]
    fn test_full_url_is_kept() {
        let url = probe_url("https://example.com/status").unwrap();
        assert_eq!(url.as_str(), "https://example.com/status");
    }

    #[test]
    fn test_unparseable_target_is_rejected() {
        assert!(probe_url("http://").is_err());
    }

    #[test]
    fn test_roster_is_six_entries_in_display_order() {
        assert_eq!(SERVER_ROSTER.len(), 6);
        assert_eq!(SERVER_ROSTER[0].name, "Google DNS");
        assert_eq!(SERVER_ROSTER[5].name, "HiNet");
    }
}

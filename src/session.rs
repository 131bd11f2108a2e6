//! Test orchestration.
//!
//! A [`TestSession`] owns the ordered execution of every test type: the
//! fixed probe counts, the inter-probe pacing, progress reporting, the
//! per-test busy flag, and the accumulation of results into the session
//! [`ResultStore`]. One session maps to one user session; construct it in
//! `main` and drive it from whichever interface layer is active.

use crate::errors::NetTestError;
use crate::probe::collector::SampleCollector;
use crate::probe::targets::{self, ProbeTarget};
use crate::progress::{ProgressCallback, ProgressEvent, TestKind};
use crate::results::{
    DnsResult, JitterResult, PacketResult, ResultStore, ServerResult,
    SpeedResult, TargetOutcome, TargetStatus,
};
use crate::stats;
use log::{info, warn};
use std::sync::Arc;
use tokio::time::sleep;

/// Probe counts and pacing. The delays between probes throttle the
/// request rate and are part of the measurement contract, not tuning.
mod pacing {
    use std::time::Duration;

    pub const PING_PROBES: usize = 5;
    pub const PING_DELAY: Duration = Duration::from_millis(100);

    pub const JITTER_PROBES: usize = 20;
    pub const JITTER_DELAY: Duration = Duration::from_millis(50);

    pub const PACKET_PROBES: usize = 100;
    pub const PACKET_DELAY: Duration = Duration::from_millis(20);

    pub const SERVER_DELAY: Duration = Duration::from_millis(200);

    /// Pause between the sub-tests of the full run.
    pub const FULL_TEST_PAUSE: Duration = Duration::from_secs(1);
}

/// Download, upload, then the ping probes.
const SPEED_STEPS: usize = 2 + pacing::PING_PROBES;

/// Resolver identity reported by the DNS test. Lookups go through the
/// system configuration, so there is no fixed server name to report.
const DNS_SERVER_LABEL: &str = "system default";

/// Live view of one roster entry, updated as the server test walks the
/// roster.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub target: ProbeTarget,
    pub status: TargetStatus,
    pub ping_ms: Option<f64>,
}

/// Session-scoped orchestrator for all test types.
pub struct TestSession {
    collector: SampleCollector,
    store: ResultStore,
    roster: Vec<RosterEntry>,
    busy: [bool; TestKind::COUNT],
    progress: Arc<dyn ProgressCallback>,
}

impl TestSession {
    pub fn new(progress: Arc<dyn ProgressCallback>) -> Self {
        Self::with_collector(SampleCollector::new(), progress)
    }

    pub fn with_collector(
        collector: SampleCollector,
        progress: Arc<dyn ProgressCallback>,
    ) -> Self {
        let roster = targets::SERVER_ROSTER
            .iter()
            .map(|target| RosterEntry {
                target: *target,
                status: TargetStatus::Untested,
                ping_ms: None,
            })
            .collect();

        TestSession {
            collector,
            store: ResultStore::new(),
            roster,
            busy: [false; TestKind::COUNT],
            progress,
        }
    }

    /// The accumulated results of this session.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn is_busy(&self, kind: TestKind) -> bool {
        self.busy[kind.index()]
    }

    /// Run one test kind to completion.
    pub async fn run(&mut self, kind: TestKind) -> Result<(), NetTestError> {
        match kind {
            TestKind::Speed => self.run_speed_test().await,
            TestKind::Jitter => self.run_jitter_test().await,
            TestKind::Packet => self.run_packet_test().await,
            TestKind::Servers => self.run_server_test().await,
            TestKind::Dns => self.run_dns_test().await,
            TestKind::Full => self.run_full_test().await,
        }
    }

    /// Download, upload, then five averaged ping probes.
    pub async fn run_speed_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Speed)?;
        let outcome = self.speed_test_body().await;
        self.finish(TestKind::Speed, outcome)
    }

    /// Twenty latency probes reduced to average and maximum consecutive
    /// difference.
    pub async fn run_jitter_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Jitter)?;
        let outcome = self.jitter_test_body().await;
        self.finish(TestKind::Jitter, outcome)
    }

    /// One hundred packet-like probes reduced to a loss rate.
    pub async fn run_packet_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Packet)?;
        let outcome = self.packet_test_body().await;
        self.finish(TestKind::Packet, outcome)
    }

    /// One reachability probe per roster entry.
    pub async fn run_server_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Servers)?;
        let outcome = self.server_test_body().await;
        self.finish(TestKind::Servers, outcome)
    }

    /// Timed lookups of the fixed domains, averaged.
    pub async fn run_dns_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Dns)?;
        let outcome = self.dns_test_body().await;
        self.finish(TestKind::Dns, outcome)
    }

    /// All five tests in fixed order with a pause between each.
    ///
    /// Sub-test failures are notified individually and do not stop the
    /// sequence; whatever completed stays in the store.
    pub async fn run_full_test(&mut self) -> Result<(), NetTestError> {
        self.begin(TestKind::Full)?;
        let outcome = self.full_test_body().await;
        self.finish(TestKind::Full, outcome)
    }

    /// Mark `kind` running, rejecting re-entrant invocation.
    fn begin(&mut self, kind: TestKind) -> Result<(), NetTestError> {
        if self.busy[kind.index()] {
            return Err(NetTestError::busy(kind));
        }

        self.busy[kind.index()] = true;
        info!("starting {} test", kind.label());
        self.emit(ProgressEvent::TestStarted { kind });

        Ok(())
    }

    /// Restore idle state on every exit path and surface failures as a
    /// single notification naming the test.
    fn finish(
        &mut self,
        kind: TestKind,
        outcome: Result<(), NetTestError>,
    ) -> Result<(), NetTestError> {
        self.busy[kind.index()] = false;

        match outcome {
            Ok(()) => {
                info!("{} test complete", kind.label());
                self.emit(ProgressEvent::TestCompleted {
                    kind,
                    results: self.store.clone(),
                });
                Ok(())
            }
            Err(err) => {
                warn!("{} test failed: {}", kind.label(), err);
                self.emit(ProgressEvent::TestFailed {
                    kind,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        self.progress.on_progress(event);
    }

    fn iteration(&self, kind: TestKind, current: usize, total: usize) {
        self.emit(ProgressEvent::Iteration { kind, current, total });
    }

    async fn speed_test_body(&mut self) -> Result<(), NetTestError> {
        let download = self.collector.measure_download().await;
        self.iteration(TestKind::Speed, 1, SPEED_STEPS);

        let upload = self.collector.measure_upload().await;
        self.iteration(TestKind::Speed, 2, SPEED_STEPS);

        let mut pings = Vec::with_capacity(pacing::PING_PROBES);
        for i in 0..pacing::PING_PROBES {
            let sample = self.collector.probe_latency().await;
            pings.push(sample.value);
            self.iteration(TestKind::Speed, 3 + i, SPEED_STEPS);
            sleep(pacing::PING_DELAY).await;
        }

        let ping_ms = stats::mean(&pings);
        if download.is_simulated() || upload.is_simulated() {
            info!("transfer measurements include substituted samples");
        }
        info!(
            "speed: download={:.2} Mbps, upload={:.2} Mbps, ping={:.0} ms",
            download.value, upload.value, ping_ms
        );

        self.store.speed =
            Some(SpeedResult::new(download.value, upload.value, ping_ms));

        Ok(())
    }

    async fn jitter_test_body(&mut self) -> Result<(), NetTestError> {
        let mut samples = Vec::with_capacity(pacing::JITTER_PROBES);

        for i in 0..pacing::JITTER_PROBES {
            let sample = self.collector.probe_jitter().await;
            samples.push(sample.value);
            self.iteration(TestKind::Jitter, i + 1, pacing::JITTER_PROBES);
            sleep(pacing::JITTER_DELAY).await;
        }

        let average = stats::jitter_mean(&samples);
        let maximum = stats::jitter_max(&samples);
        info!("jitter: average={:.2} ms, maximum={:.2} ms", average, maximum);

        self.store.jitter = Some(JitterResult::new(average, maximum));

        Ok(())
    }

    async fn packet_test_body(&mut self) -> Result<(), NetTestError> {
        let mut successful = 0usize;

        for i in 0..pacing::PACKET_PROBES {
            if self.collector.probe_packet().await {
                successful += 1;
            }
            self.iteration(TestKind::Packet, i + 1, pacing::PACKET_PROBES);
            sleep(pacing::PACKET_DELAY).await;
        }

        let loss = stats::loss_rate_percent(pacing::PACKET_PROBES, successful);
        info!(
            "packet: {}/{} delivered, loss={:.2}%",
            successful,
            pacing::PACKET_PROBES,
            loss
        );

        self.store.packet =
            Some(PacketResult::new(loss, pacing::PACKET_PROBES, successful));

        Ok(())
    }

    async fn server_test_body(&mut self) -> Result<(), NetTestError> {
        let total = self.roster.len();
        let mut outcomes = Vec::with_capacity(total);

        for index in 0..total {
            self.update_roster(index, TargetStatus::Testing, None);

            let host = self.roster[index].target.host;
            let probed = self.collector.probe_target(host).await?;

            let (status, ping_ms) = match probed {
                Some(sample) => (TargetStatus::Online, Some(sample.value)),
                None => (TargetStatus::Offline, None),
            };
            self.update_roster(index, status, ping_ms);

            let entry = &self.roster[index];
            outcomes.push(TargetOutcome {
                name: entry.target.name.to_string(),
                ping_ms: entry.ping_ms,
                status: entry.status,
            });

            self.iteration(TestKind::Servers, index + 1, total);
            sleep(pacing::SERVER_DELAY).await;
        }

        self.store.servers = Some(ServerResult::new(outcomes));

        Ok(())
    }

    async fn dns_test_body(&mut self) -> Result<(), NetTestError> {
        let total = targets::DNS_DOMAINS.len();
        let mut lookups = Vec::with_capacity(total);

        for (i, domain) in targets::DNS_DOMAINS.iter().enumerate() {
            let sample = self.collector.probe_dns(domain).await;
            lookups.push(sample.value);
            self.iteration(TestKind::Dns, i + 1, total);
        }

        let average = stats::mean(&lookups);
        info!("dns: average lookup {:.0} ms", average);

        self.store.dns = Some(DnsResult::new(average, DNS_SERVER_LABEL));

        Ok(())
    }

    async fn full_test_body(&mut self) -> Result<(), NetTestError> {
        absorb_sub_test(self.run_speed_test().await);
        sleep(pacing::FULL_TEST_PAUSE).await;

        absorb_sub_test(self.run_jitter_test().await);
        sleep(pacing::FULL_TEST_PAUSE).await;

        absorb_sub_test(self.run_packet_test().await);
        sleep(pacing::FULL_TEST_PAUSE).await;

        absorb_sub_test(self.run_server_test().await);
        sleep(pacing::FULL_TEST_PAUSE).await;

        absorb_sub_test(self.run_dns_test().await);

        Ok(())
    }

    fn update_roster(
        &mut self,
        index: usize,
        status: TargetStatus,
        ping_ms: Option<f64>,
    ) {
        self.roster[index].status = status;
        self.roster[index].ping_ms = ping_ms;
        self.emit(ProgressEvent::TargetUpdate { index, status, ping_ms });
    }
}

/// Sub-test failures are already notified by `finish`; the full sequence
/// keeps going past them.
fn absorb_sub_test(outcome: Result<(), NetTestError>) {
    if let Err(err) = outcome {
        warn!("continuing full test after failure: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every event for later assertions.
    struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        fn new() -> Arc<Self> {
            Arc::new(RecordingProgress { events: Mutex::new(Vec::new()) })
        }

        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }

        fn started_kinds(&self) -> Vec<TestKind> {
            self.events()
                .iter()
                .filter_map(|event| match event {
                    ProgressEvent::TestStarted { kind } => Some(*kind),
                    _ => None,
                })
                .collect()
        }
    }

    impl ProgressCallback for RecordingProgress {
        fn on_progress(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn simulated_session(progress: Arc<RecordingProgress>) -> TestSession {
        TestSession::with_collector(SampleCollector::simulated_only(), progress)
    }

    #[test]
    fn test_reentrant_invocation_is_rejected() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.begin(TestKind::Jitter).unwrap();
        assert!(session.is_busy(TestKind::Jitter));

        let rejected = session.begin(TestKind::Jitter);
        assert!(rejected.is_err());

        // A different kind is not excluded.
        session.begin(TestKind::Packet).unwrap();
    }

    #[test]
    fn test_finish_clears_busy_on_both_outcomes() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.begin(TestKind::Speed).unwrap();
        session.finish(TestKind::Speed, Ok(())).unwrap();
        assert!(!session.is_busy(TestKind::Speed));

        session.begin(TestKind::Speed).unwrap();
        let failure = session.finish(
            TestKind::Speed,
            Err(NetTestError::orchestration(TestKind::Speed, "boom")),
        );
        assert!(failure.is_err());
        assert!(!session.is_busy(TestKind::Speed));

        let failed_events: Vec<_> = progress
            .events()
            .into_iter()
            .filter(|event| matches!(event, ProgressEvent::TestFailed { .. }))
            .collect();
        assert_eq!(failed_events.len(), 1);
        match &failed_events[0] {
            ProgressEvent::TestFailed { kind, message } => {
                assert_eq!(*kind, TestKind::Speed);
                assert!(message.contains("speed test failed"));
            }
            _ => unreachable!(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_test_records_fallback_metrics() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_speed_test().await.unwrap();

        let speed = session.store().speed.as_ref().unwrap();
        assert!((20.0..100.0).contains(&speed.download_mbps));
        assert!((10.0..70.0).contains(&speed.upload_mbps));
        assert!((10.0..60.0).contains(&speed.ping_ms));
        assert!(!session.is_busy(TestKind::Speed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_test_emits_monotonic_progress() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_jitter_test().await.unwrap();

        let jitter = session.store().jitter.as_ref().unwrap();
        assert!(jitter.average_ms >= 0.0);
        assert!(jitter.maximum_ms >= jitter.average_ms);

        let iterations: Vec<(usize, usize)> = progress
            .events()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Iteration { kind: TestKind::Jitter, current, total } => {
                    Some((*current, *total))
                }
                _ => None,
            })
            .collect();

        assert_eq!(iterations.len(), 20);
        assert_eq!(iterations.first(), Some(&(1, 20)));
        assert_eq!(iterations.last(), Some(&(20, 20)));
        assert!(iterations.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_packet_test_counts_one_hundred_probes() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_packet_test().await.unwrap();

        let packet = session.store().packet.as_ref().unwrap();
        assert_eq!(packet.total, 100);
        assert!(packet.successful <= 100);
        assert!((0.0..=100.0).contains(&packet.loss_rate_percent));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_test_walks_the_roster_in_order() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_server_test().await.unwrap();

        let servers = session.store().servers.as_ref().unwrap();
        assert_eq!(servers.results.len(), 6);
        assert_eq!(servers.results[0].name, "Google DNS");

        // Nothing is reachable without a network; offline targets carry
        // no substituted ping.
        for outcome in &servers.results {
            assert_eq!(outcome.status, TargetStatus::Offline);
            assert_eq!(outcome.ping_ms, None);
        }

        // Each target goes through Testing before settling.
        let updates: Vec<(usize, TargetStatus)> = progress
            .events()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::TargetUpdate { index, status, .. } => {
                    Some((*index, *status))
                }
                _ => None,
            })
            .collect();
        assert_eq!(updates.len(), 12);
        assert_eq!(updates[0], (0, TargetStatus::Testing));
        assert_eq!(updates[1], (0, TargetStatus::Offline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dns_test_averages_the_fixed_domains() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_dns_test().await.unwrap();

        let dns = session.store().dns.as_ref().unwrap();
        assert!((5.0..25.0).contains(&dns.response_time_ms));
        assert_eq!(dns.server, "system default");
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_test_runs_sub_tests_in_fixed_order() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_full_test().await.unwrap();

        assert_eq!(
            progress.started_kinds(),
            vec![
                TestKind::Full,
                TestKind::Speed,
                TestKind::Jitter,
                TestKind::Packet,
                TestKind::Servers,
                TestKind::Dns,
            ]
        );

        let store = session.store();
        assert!(store.speed.is_some());
        assert!(store.jitter.is_some());
        assert!(store.packet.is_some());
        assert!(store.servers.is_some());
        assert!(store.dns.is_some());

        // Every flag is back to idle.
        for kind in [
            TestKind::Speed,
            TestKind::Jitter,
            TestKind::Packet,
            TestKind::Servers,
            TestKind::Dns,
            TestKind::Full,
        ] {
            assert!(!session.is_busy(kind));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rerun_replaces_the_previous_result() {
        let progress = RecordingProgress::new();
        let mut session = simulated_session(Arc::clone(&progress));

        session.run_jitter_test().await.unwrap();
        let first = session.store().jitter.clone().unwrap();

        session.run_jitter_test().await.unwrap();
        let second = session.store().jitter.clone().unwrap();

        assert!(second.timestamp >= first.timestamp);
    }
}

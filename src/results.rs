//! Session result store and per-test result types.
//!
//! Each test writes exactly one result into the store; a re-run replaces
//! the previous one. The store lives for one session, is never persisted
//! across runs of the binary, and serializes to the export snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the speed test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedResult {
    /// Download throughput in Mbps
    pub download_mbps: f64,
    /// Upload throughput in Mbps
    pub upload_mbps: f64,
    /// Average latency over the ping probes in milliseconds
    pub ping_ms: f64,
    /// When the test finished
    pub timestamp: DateTime<Utc>,
}

impl SpeedResult {
    pub fn new(download_mbps: f64, upload_mbps: f64, ping_ms: f64) -> Self {
        Self { download_mbps, upload_mbps, ping_ms, timestamp: Utc::now() }
    }
}

/// Outcome of the jitter test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JitterResult {
    /// Mean of consecutive absolute latency differences in milliseconds
    pub average_ms: f64,
    /// Largest consecutive absolute difference in milliseconds
    pub maximum_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl JitterResult {
    pub fn new(average_ms: f64, maximum_ms: f64) -> Self {
        Self { average_ms, maximum_ms, timestamp: Utc::now() }
    }
}

/// Outcome of the packet loss test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketResult {
    /// Lost share of all attempts, 0-100
    pub loss_rate_percent: f64,
    /// Attempts issued
    pub total: usize,
    /// Attempts that counted as delivered
    pub successful: usize,
    pub timestamp: DateTime<Utc>,
}

impl PacketResult {
    pub fn new(loss_rate_percent: f64, total: usize, successful: usize) -> Self {
        Self { loss_rate_percent, total, successful, timestamp: Utc::now() }
    }
}

/// Reachability state of one roster target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    /// Not probed yet this session
    Untested,
    /// Probe in flight
    Testing,
    Online,
    Offline,
}

/// Per-target outcome of the server roster test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub name: String,
    /// Elapsed milliseconds for reachable targets, absent for offline ones
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ping_ms: Option<f64>,
    pub status: TargetStatus,
}

/// Outcome of the server roster test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerResult {
    /// One outcome per roster entry, in roster order
    pub results: Vec<TargetOutcome>,
    pub timestamp: DateTime<Utc>,
}

impl ServerResult {
    pub fn new(results: Vec<TargetOutcome>) -> Self {
        Self { results, timestamp: Utc::now() }
    }
}

/// Outcome of the DNS test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsResult {
    /// Average lookup time over the fixed domains in milliseconds
    pub response_time_ms: f64,
    /// Which resolver answered
    pub server: String,
    pub timestamp: DateTime<Utc>,
}

impl DnsResult {
    pub fn new(response_time_ms: f64, server: impl Into<String>) -> Self {
        Self { response_time_ms, server: server.into(), timestamp: Utc::now() }
    }
}

/// All results of one session, one optional slot per test type.
///
/// The struct-of-optionals shape gives report building compile-time
/// exhaustiveness; there is no way to record a result the report cannot
/// render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultStore {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<SpeedResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<JitterResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packet: Option<PacketResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<ServerResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no test has recorded a result yet.
    pub fn is_empty(&self) -> bool {
        self.speed.is_none()
            && self.jitter.is_none()
            && self.packet.is_none()
            && self.servers.is_none()
            && self.dns.is_none()
    }

    /// Deterministic export file name for a snapshot taken at `when`.
    pub fn export_file_name(when: DateTime<Utc>) -> String {
        format!("network-test-report-{}.json", when.format("%Y-%m-%d"))
    }
}

//! Three-tier grading of measured metrics.
//!
//! Each metric has its own fixed thresholds mapping a numeric value to one
//! of three qualitative grades. The classification is total: every finite
//! input lands in exactly one tier, boundaries included in the better tier.

use serde::Serialize;

/// Qualitative grade for a single metric or the composite score.
///
/// Variants are ordered from worst to best for correct derived Ord behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Outside the acceptable range for this metric
    Bad,
    /// Usable but degraded
    Warning,
    /// Within the comfortable range
    Good,
}

impl Grade {
    /// Lowercase label used by the rendering layer and serialized output.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Good => "good",
            Grade::Warning => "warning",
            Grade::Bad => "bad",
        }
    }
}

/// Metric thresholds. Speed grades on a lower bound (faster is better),
/// everything else on an upper bound (lower is better).
mod thresholds {
    /// Minimum Mbps for a good / warning speed grade.
    pub const SPEED_GOOD: f64 = 50.0;
    pub const SPEED_WARNING: f64 = 10.0;

    /// Maximum milliseconds for a good / warning latency grade.
    pub const PING_GOOD: f64 = 30.0;
    pub const PING_WARNING: f64 = 100.0;

    /// Maximum milliseconds for a good / warning jitter grade.
    pub const JITTER_GOOD: f64 = 5.0;
    pub const JITTER_WARNING: f64 = 15.0;

    /// Maximum loss percentage for a good / warning packet grade.
    pub const LOSS_GOOD: f64 = 0.1;
    pub const LOSS_WARNING: f64 = 1.0;

    /// Maximum milliseconds for a good / warning DNS grade.
    pub const DNS_GOOD: f64 = 20.0;
    pub const DNS_WARNING: f64 = 50.0;

    /// Minimum composite score for a good / warning grade.
    pub const SCORE_GOOD: u8 = 80;
    pub const SCORE_WARNING: u8 = 60;
}

/// Grade a download or upload speed in Mbps.
pub fn grade_speed(mbps: f64) -> Grade {
    if mbps >= thresholds::SPEED_GOOD {
        Grade::Good
    } else if mbps >= thresholds::SPEED_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

/// Grade a latency value in milliseconds.
pub fn grade_ping(ms: f64) -> Grade {
    if ms <= thresholds::PING_GOOD {
        Grade::Good
    } else if ms <= thresholds::PING_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

/// Grade a jitter value (average or maximum) in milliseconds.
pub fn grade_jitter(ms: f64) -> Grade {
    if ms <= thresholds::JITTER_GOOD {
        Grade::Good
    } else if ms <= thresholds::JITTER_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

/// Grade a packet loss rate in percent.
pub fn grade_packet_loss(percent: f64) -> Grade {
    if percent <= thresholds::LOSS_GOOD {
        Grade::Good
    } else if percent <= thresholds::LOSS_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

/// Grade a DNS lookup time in milliseconds.
pub fn grade_dns(ms: f64) -> Grade {
    if ms <= thresholds::DNS_GOOD {
        Grade::Good
    } else if ms <= thresholds::DNS_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

/// Grade the 0-100 composite quality score.
pub fn grade_score(score: u8) -> Grade {
    if score >= thresholds::SCORE_GOOD {
        Grade::Good
    } else if score >= thresholds::SCORE_WARNING {
        Grade::Warning
    } else {
        Grade::Bad
    }
}

//! Composite network quality score.
//!
//! The score starts at 100 and takes fixed deductions for each populated
//! result category; categories that were never run contribute nothing.
//! Deductions are additive and order-independent, and the result is
//! floored at 0, so the score is a pure function of the store's current
//! contents.

use crate::results::ResultStore;

/// Deductions per category. Within a category the larger deduction wins;
/// across categories they stack.
mod deductions {
    /// Download below 10 / below 50 Mbps.
    pub const DOWNLOAD_SLOW: i32 = 20;
    pub const DOWNLOAD_MODERATE: i32 = 10;

    /// Ping above 100 / above 50 ms.
    pub const PING_HIGH: i32 = 15;
    pub const PING_ELEVATED: i32 = 8;

    /// Average jitter above 10 / above 5 ms.
    pub const JITTER_HIGH: i32 = 15;
    pub const JITTER_ELEVATED: i32 = 8;

    /// Packet loss above 1 / above 0.1 percent.
    pub const LOSS_HIGH: i32 = 20;
    pub const LOSS_ELEVATED: i32 = 10;
}

/// Derive the 0-100 composite score from whatever the store holds.
pub fn composite_score(store: &ResultStore) -> u8 {
    let mut score: i32 = 100;

    if let Some(speed) = &store.speed {
        if speed.download_mbps < 10.0 {
            score -= deductions::DOWNLOAD_SLOW;
        } else if speed.download_mbps < 50.0 {
            score -= deductions::DOWNLOAD_MODERATE;
        }

        if speed.ping_ms > 100.0 {
            score -= deductions::PING_HIGH;
        } else if speed.ping_ms > 50.0 {
            score -= deductions::PING_ELEVATED;
        }
    }

    if let Some(jitter) = &store.jitter {
        if jitter.average_ms > 10.0 {
            score -= deductions::JITTER_HIGH;
        } else if jitter.average_ms > 5.0 {
            score -= deductions::JITTER_ELEVATED;
        }
    }

    if let Some(packet) = &store.packet {
        if packet.loss_rate_percent > 1.0 {
            score -= deductions::LOSS_HIGH;
        } else if packet.loss_rate_percent > 0.1 {
            score -= deductions::LOSS_ELEVATED;
        }
    }

    score.max(0) as u8
}

//! Report assembly: itemized view, JSON export, share digest.
//!
//! A report is always derived from the store as it is right now; nothing
//! here caches or accumulates across runs.

use crate::errors::NetTestError;
use crate::grading::{
    grade_dns, grade_jitter, grade_packet_loss, grade_ping, grade_score,
    grade_speed, Grade,
};
use crate::results::ResultStore;
use crate::scoring::composite_score;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use std::path::{Path, PathBuf};

/// One line of the itemized report.
#[derive(Debug, Clone)]
pub struct ReportItem {
    pub label: &'static str,
    /// Unit-formatted value, e.g. "83.24 Mbps"
    pub value: String,
    pub grade: Grade,
}

/// Builds the three report forms from a result store.
pub struct ReportBuilder<'a> {
    store: &'a ResultStore,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(store: &'a ResultStore) -> Self {
        ReportBuilder { store }
    }

    /// Itemized view in display order: speed metrics, jitter metrics,
    /// packet loss, DNS time, then the composite score. Only categories
    /// present in the store appear; the score always does.
    pub fn items(&self) -> Vec<ReportItem> {
        let mut items = Vec::new();

        if let Some(speed) = &self.store.speed {
            items.push(ReportItem {
                label: "Download speed",
                value: format_mbps(speed.download_mbps),
                grade: grade_speed(speed.download_mbps),
            });
            items.push(ReportItem {
                label: "Upload speed",
                value: format_mbps(speed.upload_mbps),
                grade: grade_speed(speed.upload_mbps),
            });
            items.push(ReportItem {
                label: "Ping",
                value: format_ms(speed.ping_ms),
                grade: grade_ping(speed.ping_ms),
            });
        }

        if let Some(jitter) = &self.store.jitter {
            items.push(ReportItem {
                label: "Average jitter",
                value: format_ms_precise(jitter.average_ms),
                grade: grade_jitter(jitter.average_ms),
            });
            items.push(ReportItem {
                label: "Maximum jitter",
                value: format_ms_precise(jitter.maximum_ms),
                grade: grade_jitter(jitter.maximum_ms),
            });
        }

        if let Some(packet) = &self.store.packet {
            items.push(ReportItem {
                label: "Packet loss",
                value: format_percent(packet.loss_rate_percent),
                grade: grade_packet_loss(packet.loss_rate_percent),
            });
        }

        if let Some(dns) = &self.store.dns {
            items.push(ReportItem {
                label: "DNS lookup time",
                value: format_ms(dns.response_time_ms),
                grade: grade_dns(dns.response_time_ms),
            });
        }

        let score = composite_score(self.store);
        items.push(ReportItem {
            label: "Overall quality score",
            value: format!("{}/100", score),
            grade: grade_score(score),
        });

        items
    }

    /// Console rendering of the itemized view.
    pub fn render_plain(&self) -> String {
        let mut lines = vec!["Network Test Report".bold().white().to_string()];

        for item in self.items() {
            lines.push(format!(
                "{} {} {}",
                format!("{}:", item.label).bold().white(),
                grade_colored(&item.value, item.grade),
                format!("[{}]", item.grade.label()).dimmed()
            ));
        }

        lines.join("\n")
    }

    /// Serialized snapshot of the whole store.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.store)
    }

    /// Write the snapshot into `dir` under its deterministic name and
    /// return the full path.
    pub fn write_export(&self, dir: &Path) -> Result<PathBuf, NetTestError> {
        let path = dir.join(ResultStore::export_file_name(Utc::now()));
        let json = self.to_json().map_err(|err| {
            NetTestError::new(
                crate::errors::ErrorKind::Io,
                format!("cannot serialize report: {}", err),
            )
        })?;

        std::fs::write(&path, json).map_err(|err| {
            NetTestError::io(
                format!("cannot write report to {}", path.display()),
                err,
            )
        })?;

        Ok(path)
    }

    /// Condensed plain-text digest for sharing: speed, jitter and packet
    /// categories plus a timestamp footer.
    pub fn share_text(&self) -> String {
        self.share_text_at(Utc::now())
    }

    fn share_text_at(&self, when: DateTime<Utc>) -> String {
        let mut text = String::from("🌐 Network Test Report\n\n");

        if let Some(speed) = &self.store.speed {
            text.push_str("📊 Speed test:\n");
            text.push_str(&format!(
                "• Download: {}\n",
                format_mbps(speed.download_mbps)
            ));
            text.push_str(&format!(
                "• Upload: {}\n",
                format_mbps(speed.upload_mbps)
            ));
            text.push_str(&format!("• Ping: {}\n\n", format_ms(speed.ping_ms)));
        }

        if let Some(jitter) = &self.store.jitter {
            text.push_str("📈 Jitter test:\n");
            text.push_str(&format!(
                "• Average jitter: {}\n\n",
                format_ms_precise(jitter.average_ms)
            ));
        }

        if let Some(packet) = &self.store.packet {
            text.push_str("📦 Packet test:\n");
            text.push_str(&format!(
                "• Loss rate: {}\n\n",
                format_percent(packet.loss_rate_percent)
            ));
        }

        text.push_str(&format!(
            "Tested at: {}\n",
            when.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        text.push_str(concat!("Tool: ", env!("CARGO_PKG_NAME")));

        text
    }
}

/// Color a formatted value by its grade.
pub(crate) fn grade_colored(value: &str, grade: Grade) -> ColoredString {
    match grade {
        Grade::Good => value.green(),
        Grade::Warning => value.yellow(),
        Grade::Bad => value.red(),
    }
}

pub(crate) fn format_mbps(mbps: f64) -> String {
    format!("{:.2} Mbps", mbps)
}

pub(crate) fn format_ms(ms: f64) -> String {
    format!("{:.0} ms", ms)
}

pub(crate) fn format_ms_precise(ms: f64) -> String {
    format!("{:.2} ms", ms)
}

pub(crate) fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

//! Dashboard rendering with ratatui widgets.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::state::DashboardState;
use crate::grading::Grade;
use crate::report::{format_ms, ReportBuilder};
use crate::results::TargetStatus;

/// Terminal color for a grade.
fn grade_color(grade: Grade) -> Color {
    match grade {
        Grade::Good => Color::Green,
        Grade::Warning => Color::Yellow,
        Grade::Bad => Color::Red,
    }
}

fn status_color(status: TargetStatus) -> Color {
    match status {
        TargetStatus::Online => Color::Green,
        TargetStatus::Offline => Color::Red,
        TargetStatus::Testing => Color::Yellow,
        TargetStatus::Untested => Color::DarkGray,
    }
}

fn status_label(status: TargetStatus) -> &'static str {
    match status {
        TargetStatus::Online => "online",
        TargetStatus::Offline => "offline",
        TargetStatus::Testing => "testing",
        TargetStatus::Untested => "untested",
    }
}

/// Status bar text for the current state.
pub(crate) fn status_text(state: &DashboardState) -> String {
    if state.finished {
        return "Done. Press any key to exit.".to_string();
    }

    if let Some(kind) = state.active {
        let progress = state.progress[kind.index()];
        if progress.total > 0 {
            return format!(
                "Running {} test ({}/{})...",
                kind.label(),
                progress.current,
                progress.total
            );
        }
        return format!("Running {} test...", kind.label());
    }

    "Idle.".to_string()
}

/// Render one frame of the dashboard.
pub fn render_frame(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with client info
            Constraint::Min(10),   // Metrics and roster
            Constraint::Length(3), // Active test gauge
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    render_body(frame, chunks[1], state);
    render_gauge(frame, chunks[2], state);
    render_status_bar(frame, chunks[3], state);
}

fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(Span::styled(
        concat!("net-vitals ", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];

    if let Some(client) = &state.client {
        let mut parts = Vec::new();
        if let Some(ip) = &client.ip {
            parts.push(format!("IP {}", ip));
        }
        if let Some(org) = &client.org {
            parts.push(org.clone());
        }
        if let Some(location) = client.location() {
            parts.push(location);
        }
        if let Some(connection) = &client.connection_type {
            parts.push(connection.clone());
        }
        if !parts.is_empty() {
            lines.push(Line::from(Span::styled(
                parts.join(" · "),
                Style::default().fg(Color::Cyan),
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_body(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_metrics(frame, columns[0], state);
    render_roster(frame, columns[1], state);
}

fn render_metrics(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default().borders(Borders::ALL).title("Results");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = Vec::new();

    if state.results.is_empty() {
        lines.push(Line::from(Span::styled(
            "No results yet.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for item in ReportBuilder::new(&state.results).items() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:<22}", item.label),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    item.value.clone(),
                    Style::default().fg(grade_color(item.grade)),
                ),
            ]));
        }
    }

    if let Some(notice) = &state.notice {
        lines.push(Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_roster(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default().borders(Borders::ALL).title("Servers");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = state
        .roster
        .iter()
        .map(|row| {
            let ping = match row.ping_ms {
                Some(ping_ms) => format_ms(ping_ms),
                None => "--".to_string(),
            };
            Line::from(vec![
                Span::styled(
                    format!("{:<12}", row.name),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<15}", row.location),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:>8}  ", ping), Style::default()),
                Span::styled(
                    status_label(row.status),
                    Style::default().fg(status_color(row.status)),
                ),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_gauge(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let Some(kind) = state.active else {
        frame.render_widget(Block::default(), area);
        return;
    };

    let progress = state.progress[kind.index()];
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("{} test", kind.label())),
        )
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(progress.percent().min(100));

    frame.render_widget(gauge, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let style = if state.finished {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };

    frame.render_widget(Paragraph::new(status_text(state)).style(style), area);
}

mod errors;
mod grading;
mod probe;
mod progress;
mod report;
mod results;
mod scoring;
mod session;
mod stats;
mod tui;
mod userinfo;

use crate::errors::{exit_codes, ErrorKind, NetTestError};
use crate::progress::{
    NullProgress, ProgressCallback, ProgressEvent, TestKind,
};
use crate::report::ReportBuilder;
use crate::results::{ResultStore, TargetStatus};
use crate::session::TestSession;
use crate::tui::controller::TuiController;
use crate::tui::display_mode::OutputMode;
use clap::{Parser, Subcommand};
use colored::Colorize;
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print the final results as a JSON snapshot instead of a report
    #[arg(long, global = true)]
    json: bool,

    /// Write the JSON report file into DIR (default: working directory)
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "."
    )]
    export: Option<PathBuf>,

    /// Print the plain-text share digest after the run
    #[arg(long, global = true)]
    share: bool,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Download, upload and averaged ping measurement
    Speed,
    /// Latency variability over twenty probes
    Jitter,
    /// Packet-loss style reachability sampling
    Packet,
    /// Reachability of the fixed server roster
    Servers,
    /// Lookup timing through the system resolver
    Dns,
    /// Every test in sequence, then the full report
    Full,
}

impl Command {
    fn kind(self) -> TestKind {
        match self {
            Command::Speed => TestKind::Speed,
            Command::Jitter => TestKind::Jitter,
            Command::Packet => TestKind::Packet,
            Command::Servers => TestKind::Servers,
            Command::Dns => TestKind::Dns,
            Command::Full => TestKind::Full,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    match run(cli).await {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), NetTestError> {
    let kind = cli.command.map(Command::kind).unwrap_or(TestKind::Full);
    let mode = OutputMode::detect(cli.json, std::io::stdout().is_terminal());

    let store = match mode {
        OutputMode::Tui => run_with_dashboard(kind).await?,
        OutputMode::Plain => run_with_console(kind).await?,
        OutputMode::Json => run_silently(kind).await?,
    };

    let builder = ReportBuilder::new(&store);

    match mode {
        OutputMode::Json => {
            let json = builder.to_json().map_err(|err| {
                NetTestError::new(
                    ErrorKind::Io,
                    format!("cannot serialize results: {}", err),
                )
            })?;
            println!("{}", json);
        }
        OutputMode::Plain => println!("\n{}", builder.render_plain()),
        // The dashboard already showed the report.
        OutputMode::Tui => {}
    }

    if let Some(dir) = &cli.export {
        let path = builder.write_export(dir)?;
        eprintln!("report written to {}", path.display());
    }

    if cli.share {
        println!("\n{}", builder.share_text());
    }

    Ok(())
}

/// Run behind the live dashboard, restoring the terminal on every path.
async fn run_with_dashboard(kind: TestKind) -> Result<ResultStore, NetTestError> {
    // Look the client up before the terminal is taken over.
    let client = userinfo::fetch_client_info().await;

    let mut controller = TuiController::new();
    if let Some(client) = client {
        controller.set_client_info(client);
    }
    controller
        .init()
        .map_err(|err| NetTestError::io("cannot initialize terminal", err))?;

    let session = TestSession::new(controller.progress_callback());
    let mut task = tokio::spawn(async move {
        let mut session = session;
        let outcome = session.run(kind).await;
        (session, outcome)
    });

    let driven = drive_dashboard(&mut controller, &mut task).await;

    controller
        .cleanup()
        .map_err(|err| NetTestError::io("cannot restore terminal", err))?;

    let (session, outcome) = driven?;
    outcome?;

    Ok(session.store().clone())
}

/// Render on a fixed cadence until the session task ends, then hold the
/// final frame until a key is pressed.
async fn drive_dashboard(
    controller: &mut TuiController,
    task: &mut JoinHandle<(TestSession, Result<(), NetTestError>)>,
) -> Result<(TestSession, Result<(), NetTestError>), NetTestError> {
    let mut ticker = tokio::time::interval(Duration::from_millis(100));

    loop {
        ticker.tick().await;
        controller
            .render()
            .map_err(|err| NetTestError::io("terminal rendering failed", err))?;

        if quit_requested() {
            task.abort();
            return Err(NetTestError::new(
                ErrorKind::Orchestration,
                "aborted by user",
            ));
        }

        if task.is_finished() {
            break;
        }
    }

    let joined = task.await.map_err(|err| {
        NetTestError::new(
            ErrorKind::Orchestration,
            format!("test task failed: {}", err),
        )
    })?;

    controller.mark_finished();
    controller
        .render()
        .map_err(|err| NetTestError::io("terminal rendering failed", err))?;
    wait_for_key();

    Ok(joined)
}

/// Drain pending input; true when the user asked to quit.
fn quit_requested() -> bool {
    while let Ok(true) = crossterm::event::poll(Duration::ZERO) {
        let Ok(event) = crossterm::event::read() else {
            return false;
        };

        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let ctrl_c = key.code == KeyCode::Char('c')
                && key.modifiers.contains(KeyModifiers::CONTROL);
            if ctrl_c || key.code == KeyCode::Char('q') {
                return true;
            }
        }
    }

    false
}

fn wait_for_key() {
    loop {
        match crossterm::event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => break,
            Ok(_) => continue,
            Err(_) => break,
        }
    }
}

/// Line-oriented run for pipes and dumb terminals.
async fn run_with_console(kind: TestKind) -> Result<ResultStore, NetTestError> {
    if let Some(client) = userinfo::fetch_client_info().await {
        if let Some(ip) = &client.ip {
            println!("{} {}", "Your IP:".bold().white(), ip.bright_blue());
        }
        if let Some(org) = &client.org {
            println!("{} {}", "ISP:".bold().white(), org.bright_blue());
        }
        if let Some(location) = client.location() {
            println!(
                "{} {}",
                "Location:".bold().white(),
                location.bright_blue()
            );
        }
        if let Some(connection) = &client.connection_type {
            println!(
                "{} {}",
                "Connection:".bold().white(),
                connection.bright_blue()
            );
        }
    }

    let mut session = TestSession::new(Arc::new(ConsoleProgress));
    session.run(kind).await?;
    debug_assert!(!session.is_busy(kind));

    Ok(session.store().clone())
}

/// No progress output at all; used for `--json`.
async fn run_silently(kind: TestKind) -> Result<ResultStore, NetTestError> {
    let mut session = TestSession::new(Arc::new(NullProgress));
    session.run(kind).await?;

    Ok(session.store().clone())
}

/// Prints one line per completed step.
struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::TestStarted { kind } => {
                println!("{} {} test...", "▶".bright_blue(), kind.label());
            }
            ProgressEvent::TargetUpdate { index, status, ping_ms } => {
                if status == TargetStatus::Testing {
                    return;
                }
                let name = probe::targets::SERVER_ROSTER
                    .get(index)
                    .map(|target| target.name)
                    .unwrap_or("?");
                let ping = ping_ms
                    .map(report::format_ms)
                    .unwrap_or_else(|| "--".to_string());
                let status = match status {
                    TargetStatus::Online => "online".green(),
                    TargetStatus::Offline => "offline".red(),
                    _ => "untested".dimmed(),
                };
                println!("  {:<12} {:>8}  {}", name, ping, status);
            }
            ProgressEvent::TestCompleted { kind, .. } => {
                println!("{} {} test complete", "✓".green(), kind.label());
            }
            ProgressEvent::TestFailed { message, .. } => {
                eprintln!("{} {}", "✗".red(), message);
            }
            ProgressEvent::Iteration { .. } => {}
        }
    }
}

mod cli;
mod config;
mod core;
mod error;
mod logging;
mod output;
mod session;
mod tui;

use crate::cli::{Cli, Commands, ExportKind};
use crate::config::Settings;
use crate::core::models::ItemStatus;
use crate::core::resolver::parse_identifier_list;
use crate::core::stats::{self, SortOrder};
use crate::core::transcript::parse_video_inputs;
use crate::core::{Progress, Reporter, export, extract_video_id};
use crate::error::{Error, Provider, Result};
use crate::output::print_table;
use crate::session::Session;
use crate::tui::{App, EventHandler, init as tui_init, restore as tui_restore, ui};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Some(Commands::Tui) | None => {
            logging::init_file(&settings.data_dir)?;
            run_tui(settings).await?;
        }
        Some(command) => {
            logging::init_stderr()?;
            run_cli(command, settings).await?;
        }
    }

    Ok(())
}

async fn run_cli(command: Commands, settings: Settings) -> Result<()> {
    let mut session = Session::open(settings)?;

    match command {
        Commands::Keys => run_cli_keys(&mut session).await,
        Commands::Login { key } => {
            session.refresh_keys().await?;
            session.login(&key)?;
            println!("Access granted.");
            Ok(())
        }
        Commands::Logout => {
            session.logout()?;
            println!("Stored keys, login and results cleared.");
            Ok(())
        }
        Commands::Analyze {
            channels,
            days,
            sort,
            min_views,
        } => run_cli_analyze(&mut session, channels, days, sort, min_views).await,
        Commands::Growth { channels, days } => run_cli_growth(&mut session, channels, days).await,
        Commands::Videos {
            urls,
            file,
            report_dir,
        } => run_cli_videos(&mut session, urls, file, report_dir).await,
        Commands::Summarize { video, transcript } => {
            run_cli_summarize(&mut session, video, transcript).await
        }
        Commands::Export { kind, output } => run_cli_export(&session, kind, &output),
        Commands::Tui => Ok(()),
    }
}

/// Refresh keys from the sheet and make sure the stored login still holds.
async fn unlock(session: &mut Session) -> Result<()> {
    session.refresh_keys().await?;
    session.require_access()
}

/// Echo flow progress to stderr. The printer ends once the reporter and its clones are dropped.
fn cli_reporter() -> (Reporter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            match update {
                Progress::Status(message) | Progress::Log(message) => eprintln!("{message}"),
                Progress::Fraction(_) | Progress::KeyIndex { .. } => {}
            }
        }
    });
    (Reporter::new(tx), printer)
}

/// Wait for the printer to drain what the flow reported.
async fn finish_printer(printer: JoinHandle<()>) {
    if let Err(err) = printer.await {
        warn!(error = %err, "progress printer stopped abnormally");
    }
}

async fn run_cli_keys(session: &mut Session) -> Result<()> {
    let sheet = session.refresh_keys().await?;
    let rows: Vec<Vec<String>> = [Provider::YouTube, Provider::Ai]
        .into_iter()
        .map(|provider| {
            let (pool, _) = session.state.pool(provider);
            let active = session
                .state
                .active_key_index(provider)
                .map(|index| format!("#{}", index + 1))
                .unwrap_or_else(|| "-".to_string());
            vec![provider.to_string(), pool.len().to_string(), active]
        })
        .collect();

    print_table(&["Provider", "Keys", "Active"], &rows);
    println!();
    println!("Access keys loaded: {}", sheet.access_keys.len());
    println!(
        "Logged in: {}",
        if session.gate.is_authenticated() { "yes" } else { "no" }
    );
    Ok(())
}

async fn run_cli_analyze(
    session: &mut Session,
    channels: Vec<String>,
    days: Option<u32>,
    sort: SortOrder,
    min_views: Option<u64>,
) -> Result<()> {
    unlock(session).await?;
    let identifiers = parse_identifier_list(&channels.join("\n"))?;
    let days = days.unwrap_or(session.settings.analysis.timeframe_days);
    let min_views = min_views.unwrap_or(session.settings.analysis.min_views);

    let (reporter, printer) = cli_reporter();
    let analyzer = session.analyzer().with_reporter(reporter);
    let result = analyzer.analyze_channels(&identifiers, days).await;
    drop(analyzer);
    finish_printer(printer).await;
    session.save()?;
    session.state.results = result?;
    session.save()?;

    let shown = stats::view_results(&session.state.results, sort, min_views);
    if shown.is_empty() {
        println!("No outstanding videos found.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = shown
        .iter()
        .enumerate()
        .map(|(index, video)| {
            vec![
                (index + 1).to_string(),
                video.video.title.clone(),
                video.channel_name.clone(),
                video.video.view_count.to_string(),
                format!("{:.2}x", video.ratio),
                video.url(),
            ]
        })
        .collect();
    print_table(&["#", "Title", "Channel", "Views", "Ratio", "URL"], &rows);

    for video in &shown {
        println!();
        println!("{}", video.video.title);
        println!(
            "{}",
            textwrap::indent(
                &textwrap::fill(&export::markdown_to_plain(&video.comments_summary), 96),
                "  "
            )
        );
    }
    Ok(())
}

async fn run_cli_growth(session: &mut Session, channels: Vec<String>, days: Option<u32>) -> Result<()> {
    unlock(session).await?;
    let identifiers = parse_identifier_list(&channels.join("\n"))?;
    let days = days.unwrap_or(session.settings.analysis.growth_timeframe_days);

    let (reporter, printer) = cli_reporter();
    let analyzer = session.analyzer().with_reporter(reporter);
    let result = analyzer.channel_growth(&identifiers, days).await;
    drop(analyzer);
    finish_printer(printer).await;
    session.save()?;
    session.state.growth_results = result?;
    session.state.growth_timeframe_days = days;
    session.save()?;

    let rows: Vec<Vec<String>> = session
        .state
        .growth_results
        .iter()
        .map(|record| {
            vec![
                record.rank.to_string(),
                record.channel_name.clone(),
                format!("{}%", record.growth),
                format!("{:.0}", record.current_period_avg_views),
                format!("{:.0}", record.previous_period_avg_views),
                format!("{}/{}", record.current_video_count, record.previous_video_count),
            ]
        })
        .collect();
    print_table(
        &["#", "Channel", "Growth", "Avg now", "Avg before", "Videos"],
        &rows,
    );
    Ok(())
}

async fn run_cli_videos(
    session: &mut Session,
    mut urls: Vec<String>,
    file: Option<PathBuf>,
    report_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(path) = file {
        let content = tokio::fs::read_to_string(&path).await?;
        urls.extend(parse_video_inputs(&content));
    }
    let urls: Vec<String> = urls.iter().flat_map(|url| parse_video_inputs(url)).collect();
    if urls.is_empty() {
        return Err(Error::validation("Enter at least one video URL"));
    }

    unlock(session).await?;
    let (reporter, printer) = cli_reporter();
    let analyzer = session.analyzer().with_reporter(reporter);
    let result = analyzer.analyze_video_list(&urls).await;
    drop(analyzer);
    finish_printer(printer).await;
    session.save()?;
    let report = result?;
    session.state.video_list = report.items.clone();
    session.save()?;

    let rows: Vec<Vec<String>> = report
        .items
        .iter()
        .map(|item| {
            let (status, note) = match &item.status {
                ItemStatus::Pending => ("pending", String::new()),
                ItemStatus::Completed => ("done", format!("{} comments", item.comments.len())),
                ItemStatus::Failed { reason } => ("failed", reason.clone()),
                ItemStatus::Skipped { reason } => ("skipped", reason.clone()),
            };
            vec![item.title().to_string(), status.to_string(), note]
        })
        .collect();
    print_table(&["Video", "Status", "Details"], &rows);

    if let Some(reason) = &report.aborted {
        warn!(%reason, "video list stopped early");
    }
    if let Some(dir) = report_dir {
        write_reports(&dir, &session.state.video_list)?;
    }
    Ok(())
}

async fn run_cli_summarize(session: &mut Session, video: String, transcript: Option<PathBuf>) -> Result<()> {
    let video_id = extract_video_id(&video).ok_or_else(|| Error::validation("Invalid video URL or ID"))?;
    unlock(session).await?;

    let transcript = match transcript {
        Some(path) => Some(tokio::fs::read_to_string(path).await?),
        None => None,
    };
    let (reporter, printer) = cli_reporter();
    let result = session.summarize_video(&video_id, transcript, reporter).await;
    finish_printer(printer).await;
    let summary = result?;

    println!("{}", textwrap::fill(&export::markdown_to_plain(&summary), 96));
    Ok(())
}

fn run_cli_export(session: &Session, kind: ExportKind, output: &Path) -> Result<()> {
    match kind {
        ExportKind::Videos => session.export_videos(output)?,
        ExportKind::Growth => export::export_growth(
            output,
            &session.state.growth_results,
            session.state.growth_timeframe_days,
        )?,
        ExportKind::Reports => write_reports(output, &session.state.video_list)?,
    }
    println!("Exported to {}", output.display());
    Ok(())
}

fn write_reports(dir: &Path, items: &[crate::core::models::VideoListItem]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0;
    for item in items.iter().filter(|item| item.status == ItemStatus::Completed) {
        let path = export::export_video_report(dir, item)?;
        println!("Report saved to: {}", path.display());
        written += 1;
    }
    if written == 0 {
        return Err(Error::validation("There are no completed videos to export"));
    }
    Ok(())
}

async fn run_tui(settings: Settings) -> Result<()> {
    let mut session = Session::open(settings)?;
    // Keys come from the network, so load them before the terminal switches to raw mode.
    session.refresh_keys().await?;

    let mut terminal = tui_init()?;
    let mut app = App::new(session);
    let event_handler = EventHandler::new();

    let outcome = loop {
        if let Err(err) = terminal.draw(|f| ui::draw(f, &mut app)) {
            break Err(err.into());
        }

        match event_handler.next_event() {
            Ok(event) => {
                if let Err(err) = app.handle_event(event) {
                    break Err(err);
                }
            }
            Err(err) => break Err(err),
        }

        if app.should_quit {
            break Ok(());
        }
    };

    tui_restore()?;
    app.persist();
    outcome
}

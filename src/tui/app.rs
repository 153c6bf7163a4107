use crate::core::analysis::attach_summary;
use crate::core::export;
use crate::core::models::{AnalyzedVideo, ChannelGrowthRecord, ItemStatus, VideoListItem};
use crate::core::resolver::parse_identifier_list;
use crate::core::stats::{self, SortOrder};
use crate::core::transcript::parse_video_inputs;
use crate::core::{Progress, Reporter, TranscriptService, VideoListReport};
use crate::error::{Error, Provider, Result};
use crate::session::Session;
use crate::tui::components::{ContentViewer, InputField, ProgressBar, ResultList, ResultRow};
use crate::tui::events::AppEvent;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::style::Color;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Videos,
    Growth,
    VideoList,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Videos, Tab::Growth, Tab::VideoList];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Videos => "Outlier videos",
            Tab::Growth => "Channel growth",
            Tab::VideoList => "Video list",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Videos => 0,
            Tab::Growth => 1,
            Tab::VideoList => 2,
        }
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Input fields below the tab bar.
    fn field_count(self) -> usize {
        match self {
            Tab::Videos | Tab::Growth => 2,
            Tab::VideoList => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Login,
    Form,
    Processing { task: String },
    Results,
    Viewer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// What a background job hands back. Errors arrive already rendered.
#[derive(Debug)]
pub enum JobOutcome {
    Videos(std::result::Result<Vec<AnalyzedVideo>, String>),
    Growth {
        days: u32,
        result: std::result::Result<Vec<ChannelGrowthRecord>, String>,
    },
    VideoList(std::result::Result<VideoListReport, String>),
    Summary {
        video_id: String,
        result: std::result::Result<String, String>,
    },
}

pub struct App {
    pub screen: Screen,
    pub tab: Tab,
    pub should_quit: bool,
    pub session: Session,

    // Login screen
    pub login_input: InputField,

    // Form screen; focus 0 is the tab bar
    pub focus: usize,
    pub channels_input: InputField,
    pub days_input: InputField,
    pub growth_channels_input: InputField,
    pub growth_days_input: InputField,
    pub urls_input: InputField,

    // Results and viewer
    pub sort: SortOrder,
    pub results: ResultList,
    pub viewer: Option<ContentViewer>,
    pub viewer_height: u16,

    // Processing screen
    pub progress_bar: ProgressBar,
    pub key_indices: [Option<usize>; 2],

    pub notice: Option<Notice>,

    progress_tx: mpsc::UnboundedSender<Progress>,
    progress_rx: mpsc::UnboundedReceiver<Progress>,
    outcome_tx: mpsc::UnboundedSender<JobOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<JobOutcome>,
}

impl App {
    pub fn new(session: Session) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let analysis = &session.settings.analysis;
        let mut days_input = InputField::new("Days", "30");
        days_input.set_value(analysis.timeframe_days.to_string());
        let mut growth_days_input = InputField::new("Days per period", "30");
        growth_days_input.set_value(analysis.growth_timeframe_days.to_string());

        let screen = if session.gate.is_authenticated() {
            Screen::Form
        } else {
            Screen::Login
        };
        let key_indices = [
            session.state.active_key_index(Provider::YouTube),
            session.state.active_key_index(Provider::Ai),
        ];

        let mut app = Self {
            screen,
            tab: Tab::Videos,
            should_quit: false,
            session,

            login_input: InputField::new("Access key", "Enter your access key").masked(),

            focus: 1,
            channels_input: InputField::new("Channels", "@handle, channel URL or name, ..."),
            days_input,
            growth_channels_input: InputField::new("Channels", "@handle, channel URL or name, ..."),
            growth_days_input,
            urls_input: InputField::new("Video URLs", "https://youtu.be/..., https://youtu.be/..."),

            sort: SortOrder::default(),
            results: ResultList::new(Vec::new()),
            viewer: None,
            viewer_height: 0,

            progress_bar: ProgressBar::new(),
            key_indices,

            notice: None,

            progress_tx,
            progress_rx,
            outcome_tx,
            outcome_rx,
        };
        app.login_input.focused = app.screen == Screen::Login;
        app.sync_focus();
        app
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Ok(())
            }
            AppEvent::Tick => {
                self.handle_tick();
                Ok(())
            }
        }
    }

    /// Save state on the way out; failures only get logged.
    pub fn persist(&self) {
        if let Err(err) = self.session.save() {
            error!(error = %err, "failed to save state");
        }
    }

    fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, err: impl std::fmt::Display) {
        self.notice = Some(Notice {
            text: err.to_string(),
            is_error: true,
        });
    }

    fn is_processing(&self) -> bool {
        matches!(self.screen, Screen::Processing { .. })
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('l') if self.screen != Screen::Login && !self.is_processing() => {
                    self.logout();
                    return Ok(());
                }
                _ => {}
            }
        }

        match &self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Form => self.handle_form_key(key),
            Screen::Processing { .. } => {}
            Screen::Results => self.handle_results_key(key),
            Screen::Viewer => self.handle_viewer_key(key),
        }
        Ok(())
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen == Screen::Results {
            self.results.handle_mouse(mouse);
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let input = self.login_input.value.clone();
                match self.session.login(&input) {
                    Ok(()) => {
                        self.login_input.clear();
                        self.login_input.focused = false;
                        self.notice = None;
                        self.screen = Screen::Form;
                        self.focus = 1;
                        self.sync_focus();
                    }
                    Err(err) => self.set_error(err),
                }
            }
            _ => {
                self.login_input.handle_key(key);
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let fields = self.tab.field_count();
        match key.code {
            KeyCode::Tab => {
                self.focus = (self.focus + 1) % (fields + 1);
                self.sync_focus();
            }
            KeyCode::BackTab => {
                self.focus = (self.focus + fields) % (fields + 1);
                self.sync_focus();
            }
            KeyCode::Left if self.focus == 0 => self.switch_tab(self.tab.previous()),
            KeyCode::Right if self.focus == 0 => self.switch_tab(self.tab.next()),
            KeyCode::Char('r') if self.focus == 0 => self.show_results(self.tab),
            KeyCode::Enter if self.focus == 0 => {
                self.focus = 1;
                self.sync_focus();
            }
            KeyCode::Enter => {
                if let Err(err) = self.submit() {
                    self.set_error(err);
                }
            }
            _ => {
                if let Some(input) = self.focused_input() {
                    input.handle_key(key);
                }
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Form;
                self.sync_focus();
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('s') if self.tab == Tab::Videos => {
                self.sort = self.sort.toggle();
                self.refresh_rows();
            }
            KeyCode::Char('e') => match self.export_current() {
                Ok(path) => self.set_notice(format!("Exported to {}", path.display())),
                Err(err) => self.set_error(err),
            },
            KeyCode::Char('t') if self.tab == Tab::Videos => {
                if let Err(err) = self.start_summary() {
                    self.set_error(err);
                }
            }
            _ => {
                self.results.handle_key(key);
            }
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.viewer = None;
                self.screen = Screen::Results;
            }
            _ => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.handle_key(key, self.viewer_height as usize);
                }
            }
        }
    }

    fn handle_tick(&mut self) {
        while let Ok(update) = self.progress_rx.try_recv() {
            match update {
                Progress::Status(status) => self.progress_bar.set_message(status),
                Progress::Log(line) => self.progress_bar.add_log(line),
                Progress::Fraction(value) => self.progress_bar.set_progress(value),
                Progress::KeyIndex { provider, index } => {
                    let slot = match provider {
                        Provider::YouTube => 0,
                        Provider::Ai => 1,
                    };
                    if self.key_indices[slot] != Some(index) {
                        self.progress_bar
                            .add_log(format!("Using {provider} key #{}", index + 1));
                    }
                    self.key_indices[slot] = Some(index);
                }
            }
        }

        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.finish(outcome);
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.focus = 0;
        self.sync_focus();
    }

    fn inputs_mut(&mut self) -> Vec<&mut InputField> {
        match self.tab {
            Tab::Videos => vec![&mut self.channels_input, &mut self.days_input],
            Tab::Growth => vec![&mut self.growth_channels_input, &mut self.growth_days_input],
            Tab::VideoList => vec![&mut self.urls_input],
        }
    }

    fn focused_input(&mut self) -> Option<&mut InputField> {
        let focus = self.focus;
        if focus == 0 {
            return None;
        }
        self.inputs_mut().into_iter().nth(focus - 1)
    }

    fn sync_focus(&mut self) {
        for input in [
            &mut self.channels_input,
            &mut self.days_input,
            &mut self.growth_channels_input,
            &mut self.growth_days_input,
            &mut self.urls_input,
        ] {
            input.focused = false;
        }
        if self.screen == Screen::Form
            && let Some(input) = self.focused_input()
        {
            input.focused = true;
        }
    }

    fn logout(&mut self) {
        if let Err(err) = self.session.logout() {
            warn!(error = %err, "logout could not clear stored state");
        }
        self.results.update_rows(Vec::new());
        self.viewer = None;
        self.key_indices = [None, None];
        self.screen = Screen::Login;
        self.login_input.clear();
        self.login_input.focused = true;
        self.sync_focus();
        self.set_notice("Logged out. Stored keys and results were cleared.");
        info!("logged out");
    }

    fn begin(&mut self, task: impl Into<String>) {
        self.notice = None;
        self.progress_bar.reset();
        self.progress_bar.set_message("Starting...".to_string());
        self.screen = Screen::Processing { task: task.into() };
    }

    fn reporter(&self) -> Reporter {
        Reporter::new(self.progress_tx.clone())
    }

    fn submit(&mut self) -> Result<()> {
        self.session.require_access()?;
        match self.tab {
            Tab::Videos => {
                let identifiers = parse_identifier_list(&self.channels_input.value)?;
                let days = parse_days(&self.days_input.value)?;
                let analyzer = self.session.analyzer().with_reporter(self.reporter());
                let tx = self.outcome_tx.clone();

                self.begin(format!("Outlier videos of {} channel(s), last {days} days", identifiers.len()));
                tokio::spawn(async move {
                    let result = analyzer.analyze_channels(&identifiers, days).await;
                    let _ = tx.send(JobOutcome::Videos(result.map_err(|e| e.to_string())));
                });
            }
            Tab::Growth => {
                let identifiers = parse_identifier_list(&self.growth_channels_input.value)?;
                let days = parse_days(&self.growth_days_input.value)?;
                let analyzer = self.session.analyzer().with_reporter(self.reporter());
                let tx = self.outcome_tx.clone();

                self.begin(format!("Growth of {} channel(s), {days}-day periods", identifiers.len()));
                tokio::spawn(async move {
                    let result = analyzer.channel_growth(&identifiers, days).await;
                    let _ = tx.send(JobOutcome::Growth {
                        days,
                        result: result.map_err(|e| e.to_string()),
                    });
                });
            }
            Tab::VideoList => {
                let urls = parse_video_inputs(&self.urls_input.value);
                if urls.is_empty() {
                    return Err(Error::validation("Enter at least one video URL"));
                }
                let analyzer = self.session.analyzer().with_reporter(self.reporter());
                let tx = self.outcome_tx.clone();

                self.begin(format!("Audience analysis of {} video(s)", urls.len()));
                tokio::spawn(async move {
                    let result = analyzer.analyze_video_list(&urls).await;
                    let _ = tx.send(JobOutcome::VideoList(result.map_err(|e| e.to_string())));
                });
            }
        }
        Ok(())
    }

    fn start_summary(&mut self) -> Result<()> {
        let video = self
            .selected_video()
            .ok_or_else(|| Error::validation("Select a video first"))?;
        let transcripts = TranscriptService::new()?;
        let analyzer = self.session.analyzer().with_reporter(self.reporter());
        let reporter = self.reporter();
        let tx = self.outcome_tx.clone();
        let video_id = video.video.id.clone();
        let title = video.video.title.clone();

        self.begin(format!("Transcript summary of \"{title}\""));
        tokio::spawn(async move {
            reporter.status("Downloading transcript");
            let result = match transcripts.fetch_text(&video_id).await {
                Ok(text) => {
                    reporter.fraction(1, 2);
                    reporter.status("Summarizing transcript");
                    analyzer.summarize_transcript(&title, &text).await
                }
                Err(err) => Err(err),
            };
            let _ = tx.send(JobOutcome::Summary {
                video_id,
                result: result.map_err(|e| e.to_string()),
            });
        });
        Ok(())
    }

    fn finish(&mut self, outcome: JobOutcome) {
        // Cursor moves made by the job are persisted whatever the outcome.
        let outcome = match outcome {
            JobOutcome::Videos(Ok(results)) => {
                self.session.state.results = results;
                Ok((Tab::Videos, None))
            }
            JobOutcome::Growth {
                days,
                result: Ok(records),
            } => {
                self.session.state.growth_results = records;
                self.session.state.growth_timeframe_days = days;
                Ok((Tab::Growth, None))
            }
            JobOutcome::VideoList(Ok(report)) => {
                self.session.state.video_list = report.items;
                Ok((Tab::VideoList, report.aborted))
            }
            JobOutcome::Summary {
                video_id,
                result: Ok(summary),
            } => {
                attach_summary(&mut self.session.state.results, &video_id, &summary);
                self.persist();
                self.show_results(Tab::Videos);
                let position = self
                    .visible_videos()
                    .iter()
                    .position(|video| video.video.id == video_id);
                if let Some(index) = position {
                    self.results.state.select(Some(index));
                    self.open_selected();
                }
                return;
            }
            JobOutcome::Videos(Err(err))
            | JobOutcome::Growth { result: Err(err), .. }
            | JobOutcome::VideoList(Err(err))
            | JobOutcome::Summary { result: Err(err), .. } => Err(err),
        };
        self.persist();

        match outcome {
            Ok((tab, aborted)) => {
                self.show_results(tab);
                if let Some(reason) = aborted {
                    self.set_error(reason);
                }
            }
            Err(err) => {
                error!(error = %err, "job failed");
                self.screen = if self.viewer.is_some() {
                    Screen::Viewer
                } else if self.results.rows.is_empty() {
                    Screen::Form
                } else {
                    Screen::Results
                };
                self.sync_focus();
                self.set_error(err);
            }
        }
    }

    pub fn show_results(&mut self, tab: Tab) {
        self.tab = tab;
        self.viewer = None;
        self.screen = Screen::Results;
        self.results.state.select(Some(0));
        self.refresh_rows();
    }

    fn refresh_rows(&mut self) {
        let rows = match self.tab {
            Tab::Videos => self.visible_videos().iter().map(video_row).collect(),
            Tab::Growth => self.session.state.growth_results.iter().map(growth_row).collect(),
            Tab::VideoList => self.session.state.video_list.iter().map(video_list_row).collect(),
        };
        self.results.update_rows(rows);
    }

    pub fn visible_videos(&self) -> Vec<AnalyzedVideo> {
        stats::view_results(
            &self.session.state.results,
            self.sort,
            self.session.settings.analysis.min_views,
        )
    }

    fn selected_video(&self) -> Option<AnalyzedVideo> {
        let index = self.results.selected()?;
        self.visible_videos().into_iter().nth(index)
    }

    fn open_selected(&mut self) {
        let Some(index) = self.results.selected() else {
            return;
        };
        let page = match self.tab {
            Tab::Videos => self
                .visible_videos()
                .get(index)
                .map(|video| (video.video.title.clone(), video_page(video))),
            Tab::Growth => self
                .session
                .state
                .growth_results
                .get(index)
                .map(|record| (record.channel_name.clone(), growth_page(record, self.session.state.growth_timeframe_days))),
            Tab::VideoList => self
                .session
                .state
                .video_list
                .get(index)
                .map(|item| (item.title().to_string(), video_list_page(item))),
        };

        if let Some((title, content)) = page {
            self.viewer = Some(ContentViewer::new(content, title));
            self.screen = Screen::Viewer;
        }
    }

    fn export_dir(&self) -> Result<PathBuf> {
        let dir = self.session.settings.data_dir.join("exports");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn export_current(&self) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let dir = self.export_dir()?;
        let state = &self.session.state;

        match self.tab {
            Tab::Videos => {
                let path = dir.join(format!("outlier_videos_{stamp}.csv"));
                export::export_videos(&path, &self.visible_videos())?;
                Ok(path)
            }
            Tab::Growth => {
                let path = dir.join(format!("channel_growth_{stamp}.csv"));
                export::export_growth(&path, &state.growth_results, state.growth_timeframe_days)?;
                Ok(path)
            }
            Tab::VideoList => {
                let report_dir = dir.join(format!("video_reports_{stamp}"));
                let completed: Vec<&VideoListItem> = state
                    .video_list
                    .iter()
                    .filter(|item| item.status == ItemStatus::Completed)
                    .collect();
                if completed.is_empty() {
                    return Err(Error::validation("There are no completed videos to export"));
                }
                std::fs::create_dir_all(&report_dir)?;
                for item in completed {
                    export::export_video_report(&report_dir, item)?;
                }
                Ok(report_dir)
            }
        }
    }
}

fn parse_days(input: &str) -> Result<u32> {
    match input.trim().parse::<u32>() {
        Ok(days) if (1..=stats::MAX_DAYS).contains(&days) => Ok(days),
        _ => Err(Error::validation(format!(
            "Days must be a whole number between 1 and {}",
            stats::MAX_DAYS
        ))),
    }
}

fn video_row(video: &AnalyzedVideo) -> ResultRow {
    let mut row = ResultRow::new(
        video.video.title.as_str(),
        format!("{} · {} views", video.channel_name, video.video.view_count),
    )
    .with_badge(format!("{:.2}x", video.ratio), Color::Cyan);
    if video.video_summary.is_some() {
        row.detail.push_str(" · summarized");
    }
    row
}

fn growth_row(record: &ChannelGrowthRecord) -> ResultRow {
    let color = if record.growth.as_f64() >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };
    ResultRow::new(
        record.channel_name.as_str(),
        format!(
            "avg {:.0} vs {:.0} · {}/{} videos",
            record.current_period_avg_views,
            record.previous_period_avg_views,
            record.current_video_count,
            record.previous_video_count
        ),
    )
    .with_badge(format!("{}%", record.growth), color)
}

fn video_list_row(item: &VideoListItem) -> ResultRow {
    let row = ResultRow::new(item.title(), "");
    match &item.status {
        ItemStatus::Pending => row.with_badge("pending", Color::Gray),
        ItemStatus::Completed => ResultRow {
            detail: format!("{} comments", item.comments.len()),
            ..row
        }
        .with_badge("done", Color::Green),
        ItemStatus::Failed { reason } => ResultRow {
            detail: reason.clone(),
            ..row
        }
        .with_badge("failed", Color::Red),
        ItemStatus::Skipped { reason } => ResultRow {
            detail: reason.clone(),
            ..row
        }
        .with_badge("skipped", Color::Yellow),
    }
}

fn wrapped(markdown: &str) -> String {
    textwrap::fill(&export::markdown_to_plain(markdown), 100)
}

fn video_page(video: &AnalyzedVideo) -> String {
    let mut page = format!(
        "Title: {}\nURL: {}\nChannel: {} ({})\nViews: {}\nChannel average: {:.0}\nRatio: {:.2}x\n\nComments summary:\n{}\n",
        video.video.title,
        video.url(),
        video.channel_name,
        video.channel_url(),
        video.video.view_count,
        video.channel_average_views,
        video.ratio,
        wrapped(&video.comments_summary),
    );
    match &video.video_summary {
        Some(summary) => page.push_str(&format!("\nVideo summary:\n{}\n", wrapped(summary))),
        None => page.push_str("\nPress Esc, then t to summarize the transcript.\n"),
    }
    page
}

fn growth_page(record: &ChannelGrowthRecord, days: u32) -> String {
    format!(
        "Rank: {}\nChannel: {} ({})\nGrowth: {}%\n\nLast {days} days:\n  videos {}\n  average views {:.0}\n\nPrevious {days} days:\n  videos {}\n  average views {:.0}\n",
        record.rank,
        record.channel_name,
        record.channel_url(),
        record.growth,
        record.current_video_count,
        record.current_period_avg_views,
        record.previous_video_count,
        record.previous_period_avg_views,
    )
}

fn video_list_page(item: &VideoListItem) -> String {
    match &item.status {
        ItemStatus::Completed => export::video_report_text(item)
            .unwrap_or_else(|err| format!("{}\n\n{err}\n", item.input)),
        ItemStatus::Pending => format!("Input: {}\n\nNot processed yet.\n", item.input),
        ItemStatus::Failed { reason } => format!("Input: {}\n\nFailed:\n{reason}\n", item.input),
        ItemStatus::Skipped { reason } => format!("Input: {}\n\nSkipped:\n{reason}\n", item.input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::access::AccessKey;
    use crate::core::models::Video;
    use crate::core::sheet::KeySheet;
    use crate::session::today;
    use temp_dir::TempDir;

    fn app(dir: &TempDir) -> App {
        let settings = Settings {
            data_dir: dir.path().to_path_buf(),
            config_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let mut session = Session::open(settings).unwrap();
        let sheet = KeySheet {
            youtube_keys: vec!["yt".into()],
            ai_keys: vec!["ai".into()],
            access_keys: vec![AccessKey {
                key: "alpha".into(),
                expiration_date: "31/12/2999".into(),
            }],
        };
        session.apply_sheet(&sheet, today()).unwrap();
        App::new(session)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn analyzed(id: &str, views: u64, ratio: f64) -> AnalyzedVideo {
        AnalyzedVideo {
            video: Video {
                id: id.into(),
                title: format!("Video {id}"),
                view_count: views,
                thumbnail_url: String::new(),
            },
            channel_id: "UC1".into(),
            channel_name: "Chan".into(),
            channel_average_views: 100.0,
            ratio,
            comments_summary: "Mostly positive".into(),
            video_summary: None,
        }
    }

    #[test]
    fn wrong_key_stays_on_login_with_an_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert_eq!(app.screen, Screen::Login);

        type_text(&mut app, "beta");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Login);
        assert!(app.notice.as_ref().is_some_and(|n| n.is_error));

        app.login_input.clear();
        type_text(&mut app, "alpha");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Form);
        assert!(app.channels_input.focused);
    }

    #[test]
    fn tab_bar_switches_tabs_and_inputs_get_typing() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        type_text(&mut app, "alpha");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, 0);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.tab, Tab::VideoList);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.tab, Tab::Growth);

        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "@chan");
        assert_eq!(app.growth_channels_input.value, "@chan");
        assert!(app.channels_input.value.is_empty());
    }

    #[test]
    fn invalid_days_are_reported_without_starting_a_job() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        type_text(&mut app, "alpha");
        press(&mut app, KeyCode::Enter);

        type_text(&mut app, "@chan");
        press(&mut app, KeyCode::Tab);
        app.days_input.clear();
        type_text(&mut app, "0");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen, Screen::Form);
        assert!(app.notice.as_ref().is_some_and(|n| n.text.contains("Days")));
    }

    #[test]
    fn sort_key_reorders_video_results() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        app.session.state.results = vec![analyzed("a", 500, 5.0), analyzed("b", 900, 2.0)];
        app.show_results(Tab::Videos);
        assert_eq!(app.results.rows[0].title, "Video a");

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.sort, SortOrder::Views);
        assert_eq!(app.results.rows[0].title, "Video b");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Viewer);
        let viewer = app.viewer.as_ref().unwrap();
        assert!(viewer.content.contains("Views: 900"));
    }

    #[test]
    fn failed_job_returns_to_the_form_with_the_message() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        type_text(&mut app, "alpha");
        press(&mut app, KeyCode::Enter);
        app.begin("test");

        app.finish(JobOutcome::Growth {
            days: 7,
            result: Err("All YouTube API keys have exhausted their quota (1 tried)".into()),
        });
        assert_eq!(app.screen, Screen::Form);
        assert!(app.notice.as_ref().is_some_and(|n| n.text.contains("quota")));
    }

    #[test]
    fn logout_clears_results_and_returns_to_login() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        type_text(&mut app, "alpha");
        press(&mut app, KeyCode::Enter);
        app.session.state.results = vec![analyzed("a", 500, 5.0)];
        app.show_results(Tab::Videos);

        app.handle_event(AppEvent::Key(KeyEvent::new(
            KeyCode::Char('l'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();
        assert_eq!(app.screen, Screen::Login);
        assert!(app.session.state.results.is_empty());
        assert!(app.results.rows.is_empty());
    }

    #[test]
    fn days_must_be_positive_integers() {
        assert_eq!(parse_days(" 14 ").unwrap(), 14);
        assert!(parse_days("0").is_err());
        assert!(parse_days("3651").is_err());
        assert!(parse_days("two").is_err());
    }
}

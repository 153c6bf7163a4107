use crate::config::Settings;
use crate::core::access::{AccessDenied, AccessGate};
use crate::core::sheet::{self, KeySheet};
use crate::core::analysis::attach_summary;
use crate::core::export;
use crate::core::stats::{self, SortOrder};
use crate::core::{Analyzer, AppState, KvStore, Reporter, SummaryService, TranscriptService, YouTubeClient};
use crate::error::{Error, Result};
use chrono::{Local, NaiveDate};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub type SessionAnalyzer = Analyzer<YouTubeClient, SummaryService>;

/// Settings, persisted state and the login gate for one run of the program.
pub struct Session {
    pub settings: Settings,
    pub store: KvStore,
    pub state: AppState,
    pub gate: AccessGate,
    http: Client,
    youtube: Arc<YouTubeClient>,
    ai: Arc<SummaryService>,
}

impl Session {
    pub fn open(settings: Settings) -> Result<Self> {
        let store = KvStore::open(settings.state_dir())?;
        let state = AppState::load(&store);
        let http = Client::builder().timeout(settings.http.timeout()).build()?;
        let youtube = Arc::new(YouTubeClient::new(&settings.youtube, settings.http.timeout())?);
        let ai = Arc::new(SummaryService::new(&settings.ai));

        Ok(Self {
            settings,
            store,
            state,
            gate: AccessGate::default(),
            http,
            youtube,
            ai,
        })
    }

    /// Load the key sheet, swap in its pools and re-check any stored login.
    pub async fn refresh_keys(&mut self) -> Result<KeySheet> {
        let sheet = sheet::fetch_key_sheet(&self.http, &self.settings.sheet).await?;
        self.apply_sheet(&sheet, today())?;
        Ok(sheet)
    }

    pub fn apply_sheet(&mut self, sheet: &KeySheet, today: NaiveDate) -> Result<()> {
        self.state.reload_keys(sheet);
        self.gate = AccessGate::new(sheet.access_keys.clone());

        if !self.gate.restore(self.state.access_key.as_deref(), today) {
            self.state.access_key = None;
        }
        self.state.save(&self.store)
    }

    pub fn login(&mut self, input: &str) -> Result<()> {
        let key = self.gate.login(input, today())?;
        self.state.access_key = Some(key.key);
        self.state.save(&self.store)?;
        info!("logged in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.state.clear_credentials(&self.store)?;
        self.gate.logout();
        Ok(())
    }

    pub fn require_access(&self) -> Result<()> {
        if self.gate.is_authenticated() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "{} Run `chanscope login <KEY>` first.",
                AccessDenied::NotFound
            )))
        }
    }

    /// An analyzer over the current pools. A flow drawing on an empty pool
    /// fails with `EmptyPool` for that provider only.
    pub fn analyzer(&self) -> SessionAnalyzer {
        Analyzer::new(Arc::clone(&self.youtube), Arc::clone(&self.ai), &self.state)
    }

    /// Summarize a video's transcript and store the summary on the matching
    /// analysis result. `transcript` skips the caption download when given.
    pub async fn summarize_video(
        &mut self,
        video_id: &str,
        transcript: Option<String>,
        reporter: Reporter,
    ) -> Result<String> {
        let text = match transcript {
            Some(text) => text,
            None => {
                reporter.status("Downloading transcript");
                TranscriptService::new()?.fetch_text(video_id).await?
            }
        };
        let title = self
            .state
            .results
            .iter()
            .find(|result| result.video.id == video_id)
            .map(|result| result.video.title.clone())
            .unwrap_or_else(|| video_id.to_string());

        let analyzer = self.analyzer().with_reporter(reporter);
        let result = analyzer.summarize_transcript(&title, &text).await;
        self.save()?;
        let summary = result?;

        if attach_summary(&mut self.state.results, video_id, &summary) {
            self.save()?;
        } else {
            info!(video_id, "video is not among the stored results; summary not attached");
        }
        Ok(summary)
    }

    /// Write the stored analysis the way it is displayed by default: ranked
    /// by view ratio, without videos under the configured view floor.
    pub fn export_videos(&self, path: &Path) -> Result<()> {
        let shown = stats::view_results(
            &self.state.results,
            SortOrder::Ratio,
            self.settings.analysis.min_views,
        );
        export::export_videos(path, &shown)
    }

    pub fn save(&self) -> Result<()> {
        self.state.save(&self.store)
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

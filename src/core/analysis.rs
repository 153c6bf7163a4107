//! The batch operations: outlier analysis across channels, channel growth
//! ranking and the per-video audience analysis of a URL list.

use crate::core::models::{
    AnalyzedVideo, ChannelGrowthRecord, ChannelInfo, ItemStatus, Video, VideoListItem,
};
use crate::core::progress::Reporter;
use crate::core::resolver::resolve_channel;
use crate::core::rotation::{KeyCursor, KeyPool, with_rotation};
use crate::core::stats::{self, Growth, Window};
use crate::core::storage::AppState;
use crate::core::summary::{COMMENTS_DISABLED, SUMMARY_UNAVAILABLE, TextSummarizer};
use crate::core::transcript::extract_video_id;
use crate::core::youtube::VideoSource;
use crate::error::{Error, ErrorKind, Provider, Result};
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

pub const INVALID_VIDEO_URL: &str = "Invalid YouTube video URL";

/// Outcome of a video-list run. `aborted` holds the reason when key
/// exhaustion stopped the batch early.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoListReport {
    pub items: Vec<VideoListItem>,
    pub aborted: Option<String>,
}

pub struct Analyzer<S, A> {
    source: Arc<S>,
    ai: Arc<A>,
    youtube_pool: KeyPool,
    youtube_cursor: KeyCursor,
    ai_pool: KeyPool,
    ai_cursor: KeyCursor,
    reporter: Reporter,
}

impl<S, A> Clone for Analyzer<S, A> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            ai: Arc::clone(&self.ai),
            youtube_pool: self.youtube_pool.clone(),
            youtube_cursor: self.youtube_cursor.clone(),
            ai_pool: self.ai_pool.clone(),
            ai_cursor: self.ai_cursor.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

impl<S: VideoSource, A: TextSummarizer> Analyzer<S, A> {
    /// Uses the session's pools. Cursors are shared with `state`, so key
    /// switches made here show up there.
    pub fn new(source: Arc<S>, ai: Arc<A>, state: &AppState) -> Self {
        Self {
            source,
            ai,
            youtube_pool: state.youtube_pool.clone(),
            youtube_cursor: state.youtube_cursor.clone(),
            ai_pool: state.ai_pool.clone(),
            ai_cursor: state.ai_cursor.clone(),
            reporter: Reporter::silent(),
        }
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    async fn on_youtube<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = with_rotation(&self.youtube_pool, &self.youtube_cursor, work).await;
        self.reporter
            .key_index(Provider::YouTube, self.youtube_cursor.get());
        result
    }

    async fn on_ai<T, F, Fut>(&self, work: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = with_rotation(&self.ai_pool, &self.ai_cursor, work).await;
        self.reporter.key_index(Provider::Ai, self.ai_cursor.get());
        result
    }

    async fn resolve(&self, input: &str) -> Result<Option<ChannelInfo>> {
        let source = &*self.source;
        let resolved = self
            .on_youtube(|key| async move { resolve_channel(source, input, &key).await })
            .await;

        match resolved {
            Ok(Some(channel)) => Ok(Some(channel)),
            Ok(None) => {
                warn!(input, "channel not found");
                self.reporter.log(format!("Channel not found: {input}"));
                Ok(None)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(input, error = %err, "channel lookup returned not found");
                self.reporter.log(format!("Channel not found: {input}"));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn videos_in(&self, channel_id: &str, window: Window) -> Result<Vec<Video>> {
        let source = &*self.source;
        self.on_youtube(|key| async move {
            source
                .videos_in_range(channel_id, window.start, window.end, &key)
                .await
        })
        .await
    }

    /// Highlighted videos of every channel over the trailing `days`, channels processed concurrently.
    pub async fn analyze_channels(&self, identifiers: &[String], days: u32) -> Result<Vec<AnalyzedVideo>> {
        if identifiers.is_empty() {
            return Err(Error::validation("Enter at least one channel"));
        }

        let window = stats::trailing_window(Utc::now(), days)?;
        let total = identifiers.len();
        let finished = AtomicUsize::new(0);
        self.reporter
            .status(format!("Analyzing {total} channel(s) over the last {days} days"));
        self.reporter.fraction(0, total);

        let outcomes = join_all(identifiers.iter().map(|input| {
            let finished = &finished;
            async move {
                let outcome = self.analyze_channel(input, window).await;
                let done = finished.fetch_add(1, Ordering::AcqRel) + 1;
                self.reporter.fraction(done, total);
                outcome
            }
        }))
        .await;

        let mut results = Vec::new();
        for outcome in outcomes {
            results.extend(outcome?);
        }

        info!(channels = total, videos = results.len(), "channel analysis finished");
        self.reporter
            .status(format!("Found {} outstanding video(s)", results.len()));
        Ok(results)
    }

    async fn analyze_channel(&self, input: &str, window: Window) -> Result<Vec<AnalyzedVideo>> {
        let Some(channel) = self.resolve(input).await? else {
            return Ok(Vec::new());
        };
        self.reporter.log(format!("[{}] fetching videos", channel.name));

        let videos = match self.videos_in(&channel.id, window).await {
            Ok(videos) => videos,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(channel = %channel.id, error = %err, "skipping channel");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let highlights = stats::select_outliers(&videos);
        self.reporter.log(format!(
            "[{}] {} video(s), average {:.0} views, {} outlier(s)",
            channel.name,
            videos.len(),
            highlights.average_views,
            highlights.videos.len()
        ));

        let mut analyzed = Vec::with_capacity(highlights.videos.len());
        for video in highlights.videos {
            let comments_summary = self.comment_summary(&channel, &video.id, &video.title).await?;
            analyzed.push(AnalyzedVideo {
                ratio: stats::view_ratio(video.view_count, highlights.average_views),
                channel_id: channel.id.clone(),
                channel_name: channel.name.clone(),
                channel_average_views: highlights.average_views,
                comments_summary,
                video_summary: None,
                video,
            });
        }
        Ok(analyzed)
    }

    async fn comment_summary(&self, channel: &ChannelInfo, video_id: &str, title: &str) -> Result<String> {
        let source = &*self.source;
        let comments = match self
            .on_youtube(|key| async move { source.video_comments(video_id, &key).await })
            .await
        {
            Ok(comments) => comments,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.reporter
                    .log(format!("[{}] comments disabled on \"{title}\"", channel.name));
                return Ok(COMMENTS_DISABLED.to_string());
            }
            Err(err) => return Err(err),
        };

        let ai = &*self.ai;
        let comments = &comments;
        match self
            .on_ai(|key| async move { ai.summarize_comments(comments, &key).await })
            .await
        {
            Ok(summary) => Ok(summary),
            Err(err @ (Error::AllCredentialsExhausted { .. } | Error::EmptyPool { .. })) => Err(err),
            Err(err) => {
                warn!(video_id, error = %err, "comment summary failed");
                self.reporter
                    .log(format!("[{}] AI summary failed: {err}", channel.name));
                Ok(SUMMARY_UNAVAILABLE.to_string())
            }
        }
    }

    /// Period-over-period growth of each channel's average views, ranked.
    pub async fn channel_growth(&self, identifiers: &[String], days: u32) -> Result<Vec<ChannelGrowthRecord>> {
        if identifiers.is_empty() {
            return Err(Error::validation("Enter at least one channel"));
        }

        let windows = stats::growth_windows(Utc::now(), days)?;
        let total = identifiers.len();
        let mut records = Vec::with_capacity(total);
        self.reporter
            .status(format!("Comparing the last {days} days with the {days} days before"));

        for (done, input) in identifiers.iter().enumerate() {
            self.reporter.fraction(done, total);
            let Some(channel) = self.resolve(input).await? else {
                continue;
            };

            let current = self.videos_in(&channel.id, windows.current).await;
            let previous = self.videos_in(&channel.id, windows.previous).await;
            let (current, previous) = match (current, previous) {
                (Ok(current), Ok(previous)) => (current, previous),
                (Err(err), _) | (_, Err(err)) if err.kind() == ErrorKind::NotFound => {
                    warn!(channel = %channel.id, error = %err, "skipping channel");
                    continue;
                }
                (Err(err), _) | (_, Err(err)) => return Err(err),
            };

            let current_avg = stats::average_views(&current);
            let previous_avg = stats::average_views(&previous);
            let growth = Growth::between(current_avg, previous_avg);
            self.reporter
                .log(format!("[{}] growth {growth}%", channel.name));

            records.push(ChannelGrowthRecord {
                rank: 0,
                channel_id: channel.id,
                channel_name: channel.name,
                current_period_avg_views: current_avg,
                previous_period_avg_views: previous_avg,
                growth,
                current_video_count: current.len(),
                previous_video_count: previous.len(),
            });
        }

        self.reporter.fraction(total, total);
        Ok(stats::rank_growth(records))
    }

    /// Details, every comment and an audience insight for each URL, one after another.
    pub async fn analyze_video_list(&self, inputs: &[String]) -> Result<VideoListReport> {
        if inputs.is_empty() {
            return Err(Error::validation("Enter at least one video URL"));
        }

        let mut items: Vec<VideoListItem> = inputs
            .iter()
            .map(|input| VideoListItem {
                input: input.clone(),
                video_id: extract_video_id(input),
                status: ItemStatus::Pending,
                details: None,
                comments: Vec::new(),
                audience_insight: String::new(),
            })
            .collect();
        let total = items.len();
        let mut aborted: Option<String> = None;

        for (index, item) in items.iter_mut().enumerate() {
            self.reporter.fraction(index, total);

            if let Some(reason) = &aborted {
                item.status = ItemStatus::Skipped {
                    reason: reason.clone(),
                };
                continue;
            }

            let Some(video_id) = item.video_id.clone() else {
                self.reporter
                    .log(format!("Skipping invalid URL: {}", item.input));
                item.status = ItemStatus::Failed {
                    reason: INVALID_VIDEO_URL.to_string(),
                };
                continue;
            };

            self.reporter
                .status(format!("({}/{total}) {video_id}", index + 1));
            match self.analyze_video(&video_id, item).await {
                Ok(()) => item.status = ItemStatus::Completed,
                Err(err) => {
                    let reason = err.to_string();
                    warn!(video_id, error = %err, "video analysis failed");
                    self.reporter.log(format!("[{video_id}] {reason}"));
                    if matches!(err, Error::AllCredentialsExhausted { .. }) {
                        aborted = Some(reason.clone());
                    }
                    item.status = ItemStatus::Failed { reason };
                }
            }
        }

        self.reporter.fraction(total, total);
        Ok(VideoListReport { items, aborted })
    }

    async fn analyze_video(&self, video_id: &str, item: &mut VideoListItem) -> Result<()> {
        let source = &*self.source;
        let details = self
            .on_youtube(|key| async move { source.video_details(video_id, &key).await })
            .await?;
        self.reporter
            .log(format!("[{}] fetching comments", details.title));

        let comments = match self
            .on_youtube(|key| async move { source.all_video_comments(video_id, &key).await })
            .await
        {
            Ok(comments) => Some(comments),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => return Err(err),
        };

        let insight = match &comments {
            Some(comments) => {
                self.reporter.log(format!(
                    "[{}] {} comment(s), asking AI for audience insight",
                    details.title,
                    comments.len()
                ));
                let ai = &*self.ai;
                let title = details.title.as_str();
                self.on_ai(|key| async move { ai.audience_insight(title, comments, &key).await })
                    .await?
            }
            None => COMMENTS_DISABLED.to_string(),
        };

        item.comments = comments.unwrap_or_default();
        item.audience_insight = insight;
        item.details = Some(details);
        Ok(())
    }

    pub async fn summarize_transcript(&self, title: &str, transcript: &str) -> Result<String> {
        let ai = &*self.ai;
        self.reporter.status(format!("Summarizing \"{title}\""));
        self.on_ai(|key| async move { ai.summarize_transcript(title, transcript, &key).await })
            .await
    }
}

/// Store a transcript summary on every analyzed copy of the video. Returns whether one matched.
pub fn attach_summary(results: &mut [AnalyzedVideo], video_id: &str, summary: &str) -> bool {
    let mut matched = false;
    for video in results.iter_mut().filter(|video| video.video.id == video_id) {
        video.video_summary = Some(summary.to_string());
        matched = true;
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::VideoDetails;
    use crate::core::sheet::KeySheet;
    use chrono::{DateTime, Duration};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn quota() -> Error {
        Error::api(ErrorKind::QuotaExhausted, "quotaExceeded")
    }

    fn video(id: &str, views: u64) -> Video {
        Video {
            id: id.into(),
            title: format!("Video {id}"),
            view_count: views,
            thumbnail_url: String::new(),
        }
    }

    #[derive(Default)]
    struct FakeSource {
        channels: HashMap<String, ChannelInfo>,
        uploads: HashMap<String, Vec<(DateTime<Utc>, Video)>>,
        comments: HashMap<String, Vec<String>>,
        dead_keys: Vec<String>,
        exhausted_videos: Vec<String>,
        keys_used: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn check(&self, key: &str) -> Result<()> {
            self.keys_used.lock().unwrap().push(key.to_string());
            if self.dead_keys.iter().any(|dead| dead == key) {
                return Err(quota());
            }
            Ok(())
        }

        fn channel(mut self, lookup: &str, id: &str, name: &str) -> Self {
            self.channels.insert(
                lookup.into(),
                ChannelInfo {
                    id: id.into(),
                    name: name.into(),
                },
            );
            self
        }

        fn lookup(&self, lookup: &str, key: &str) -> Result<Option<ChannelInfo>> {
            self.check(key)?;
            Ok(self.channels.get(lookup).cloned())
        }
    }

    impl VideoSource for FakeSource {
        async fn channel_by_id(&self, channel_id: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
            self.lookup(channel_id, api_key)
        }

        async fn channel_by_handle(&self, handle: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
            self.lookup(handle, api_key)
        }

        async fn search_channel(&self, query: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
            self.lookup(query, api_key)
        }

        async fn videos_in_range(
            &self,
            channel_id: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            api_key: &str,
        ) -> Result<Vec<Video>> {
            self.check(api_key)?;
            Ok(self
                .uploads
                .get(channel_id)
                .map(|uploads| {
                    uploads
                        .iter()
                        .filter(|(published, _)| *published >= start && *published < end)
                        .map(|(_, video)| video.clone())
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn video_comments(&self, video_id: &str, api_key: &str) -> Result<Vec<String>> {
            self.check(api_key)?;
            self.comments
                .get(video_id)
                .cloned()
                .ok_or_else(|| Error::not_found("The video has disabled comments."))
        }

        async fn video_details(&self, video_id: &str, api_key: &str) -> Result<VideoDetails> {
            self.check(api_key)?;
            if self.exhausted_videos.iter().any(|id| id == video_id) {
                return Err(quota());
            }
            Ok(VideoDetails {
                id: video_id.into(),
                title: format!("Title {video_id}"),
                ..VideoDetails::default()
            })
        }

        async fn all_video_comments(&self, video_id: &str, api_key: &str) -> Result<Vec<String>> {
            self.video_comments(video_id, api_key).await
        }
    }

    #[derive(Default)]
    struct FakeAi {
        failing: bool,
        out_of_quota: bool,
    }

    impl TextSummarizer for FakeAi {
        async fn summarize_comments(&self, comments: &[String], _api_key: &str) -> Result<String> {
            if self.out_of_quota {
                return Err(quota());
            }
            if self.failing {
                return Err(Error::api(ErrorKind::Fatal, "model overloaded"));
            }
            Ok(format!("{} comments summarized", comments.len()))
        }

        async fn summarize_transcript(&self, title: &str, _transcript: &str, _api_key: &str) -> Result<String> {
            if self.out_of_quota {
                return Err(quota());
            }
            Ok(format!("about {title}"))
        }

        async fn audience_insight(&self, title: &str, comments: &[String], _api_key: &str) -> Result<String> {
            Ok(format!("{title}: {} voices", comments.len()))
        }
    }

    fn state(youtube: &[&str], ai: &[&str]) -> AppState {
        let mut state = AppState::default();
        state.reload_keys(&KeySheet {
            youtube_keys: youtube.iter().map(|k| k.to_string()).collect(),
            ai_keys: ai.iter().map(|k| k.to_string()).collect(),
            access_keys: Vec::new(),
        });
        state
    }

    fn analyzer(source: FakeSource, ai: FakeAi, state: &AppState) -> Analyzer<FakeSource, FakeAi> {
        Analyzer::new(Arc::new(source), Arc::new(ai), state)
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }

    fn outlier_source() -> FakeSource {
        let mut source = FakeSource::default().channel("one", "UC1", "One");
        source.uploads.insert(
            "UC1".into(),
            vec![
                (days_ago(1), video("a", 10)),
                (days_ago(2), video("b", 10)),
                (days_ago(3), video("c", 10)),
                (days_ago(4), video("d", 100)),
                (days_ago(60), video("old", 1_000_000)),
            ],
        );
        source
            .comments
            .insert("d".into(), vec!["great".into(), "meh".into()]);
        source
    }

    #[tokio::test]
    async fn channel_analysis_rotates_past_dead_keys_and_skips_unknown_channels() {
        let mut source = outlier_source();
        source.dead_keys = vec!["yt-dead".into()];
        let state = state(&["yt-dead", "yt-ok"], &["ai"]);
        let analyzer = analyzer(source, FakeAi::default(), &state);

        let results = analyzer
            .analyze_channels(&["@one".into(), "@ghost".into()], 30)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(hit.video.id, "d");
        assert_eq!(hit.channel_average_views, 32.5);
        assert!((hit.ratio - 100.0 / 32.5).abs() < 1e-9);
        assert_eq!(hit.comments_summary, "2 comments summarized");
        assert_eq!(state.youtube_cursor.get(), 1);
    }

    #[tokio::test]
    async fn ai_failures_and_disabled_comments_become_placeholders() {
        let mut source = outlier_source();
        source.comments.clear();
        let state = state(&["yt"], &["ai"]);

        let results = analyzer(source, FakeAi::default(), &state)
            .analyze_channels(&["@one".into()], 30)
            .await
            .unwrap();
        assert_eq!(results[0].comments_summary, COMMENTS_DISABLED);

        let results = analyzer(
            outlier_source(),
            FakeAi {
                failing: true,
                ..FakeAi::default()
            },
            &state,
        )
            .analyze_channels(&["@one".into()], 30)
            .await
            .unwrap();
        assert_eq!(results[0].comments_summary, SUMMARY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn exhausted_or_missing_ai_keys_fail_the_batch() {
        let spent = FakeAi {
            out_of_quota: true,
            ..FakeAi::default()
        };
        let spent_keys = state(&["yt"], &["ai1", "ai2"]);
        let err = analyzer(outlier_source(), spent, &spent_keys)
            .analyze_channels(&["@one".into()], 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AllCredentialsExhausted {
                provider: Provider::Ai,
                tried: 2
            }
        ));

        let no_ai_keys = state(&["yt"], &[]);
        let err = analyzer(outlier_source(), FakeAi::default(), &no_ai_keys)
            .analyze_channels(&["@one".into()], 30)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPool { provider: Provider::Ai }));
    }

    #[tokio::test]
    async fn transcript_summary_needs_only_ai_keys() {
        let state = state(&[], &["ai"]);
        let summary = analyzer(FakeSource::default(), FakeAi::default(), &state)
            .summarize_transcript("Launch day", "hello everyone")
            .await
            .unwrap();
        assert_eq!(summary, "about Launch day");
    }

    #[tokio::test]
    async fn exhausted_youtube_pool_fails_the_batch() {
        let mut source = outlier_source();
        source.dead_keys = vec!["k1".into(), "k2".into()];
        let state = state(&["k1", "k2"], &["ai"]);

        let err = analyzer(source, FakeAi::default(), &state)
            .analyze_channels(&["@one".into()], 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AllCredentialsExhausted {
                provider: Provider::YouTube,
                tried: 2
            }
        ));
    }

    #[tokio::test]
    async fn growth_is_ranked_across_channels() {
        let mut source = FakeSource::default()
            .channel("flat", "UCflat", "Flat")
            .channel("new", "UCnew", "New")
            .channel("up", "UCup", "Up");
        source.uploads.insert(
            "UCflat".into(),
            vec![(days_ago(2), video("f1", 100)), (days_ago(9), video("f0", 100))],
        );
        source
            .uploads
            .insert("UCnew".into(), vec![(days_ago(2), video("n1", 10))]);
        source.uploads.insert(
            "UCup".into(),
            vec![
                (days_ago(1), video("u2", 300)),
                (days_ago(3), video("u1", 100)),
                (days_ago(10), video("u0", 100)),
            ],
        );
        let state = state(&["yt"], &[]);

        let ranked = analyzer(source, FakeAi::default(), &state)
            .channel_growth(
                &["@flat".into(), "@missing".into(), "@new".into(), "@up".into()],
                7,
            )
            .await
            .unwrap();

        let summary: Vec<(usize, &str, Growth, usize, usize)> = ranked
            .iter()
            .map(|r| {
                (
                    r.rank,
                    r.channel_name.as_str(),
                    r.growth,
                    r.current_video_count,
                    r.previous_video_count,
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "New", Growth::Infinite, 1, 0),
                (2, "Up", Growth::Finite(100.0), 2, 1),
                (3, "Flat", Growth::Finite(0.0), 1, 1),
            ]
        );
    }

    #[tokio::test]
    async fn video_list_stops_when_every_key_is_exhausted() {
        let mut source = FakeSource::default();
        source
            .comments
            .insert("aaaaaaaaaaa".into(), vec!["one".into(), "two".into()]);
        source.exhausted_videos = vec!["bbbbbbbbbbb".into()];
        let state = state(&["k1", "k2"], &["ai"]);

        let report = analyzer(source, FakeAi::default(), &state)
            .analyze_video_list(&[
                "not a video".into(),
                "https://youtu.be/aaaaaaaaaaa".into(),
                "https://www.youtube.com/watch?v=bbbbbbbbbbb".into(),
                "https://www.youtube.com/watch?v=ccccccccccc".into(),
            ])
            .await
            .unwrap();

        let exhausted = "All YouTube API keys have exhausted their quota (2 tried)".to_string();
        let statuses: Vec<ItemStatus> = report.items.iter().map(|i| i.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Failed {
                    reason: INVALID_VIDEO_URL.into()
                },
                ItemStatus::Completed,
                ItemStatus::Failed {
                    reason: exhausted.clone()
                },
                ItemStatus::Skipped {
                    reason: exhausted.clone()
                },
            ]
        );
        assert_eq!(report.aborted, Some(exhausted));

        let done = &report.items[1];
        assert_eq!(done.title(), "Title aaaaaaaaaaa");
        assert_eq!(done.comments.len(), 2);
        assert_eq!(done.audience_insight, "Title aaaaaaaaaaa: 2 voices");
    }

    #[tokio::test]
    async fn video_without_comments_still_completes() {
        let state = state(&["yt"], &["ai"]);
        let report = analyzer(FakeSource::default(), FakeAi::default(), &state)
            .analyze_video_list(&["ddddddddddd".into()])
            .await
            .unwrap();

        assert_eq!(report.items[0].status, ItemStatus::Completed);
        assert_eq!(report.items[0].audience_insight, COMMENTS_DISABLED);
        assert_eq!(report.aborted, None);
    }

    #[tokio::test]
    async fn empty_ai_pool_fails_only_the_item() {
        let mut source = FakeSource::default();
        source.comments.insert("eeeeeeeeeee".into(), vec!["hi".into()]);
        let state = state(&["yt"], &[]);

        let report = analyzer(source, FakeAi::default(), &state)
            .analyze_video_list(&["eeeeeeeeeee".into(), "not a video".into()])
            .await
            .unwrap();

        assert!(matches!(report.items[0].status, ItemStatus::Failed { .. }));
        assert!(matches!(report.items[1].status, ItemStatus::Failed { .. }));
        assert_eq!(report.aborted, None);
    }

    #[test]
    fn summaries_attach_to_matching_videos() {
        let mut results = vec![AnalyzedVideo {
            video: video("v1", 5),
            channel_id: "UC".into(),
            channel_name: "c".into(),
            channel_average_views: 1.0,
            ratio: 5.0,
            comments_summary: String::new(),
            video_summary: None,
        }];
        assert!(attach_summary(&mut results, "v1", "short"));
        assert!(!attach_summary(&mut results, "v2", "other"));
        assert_eq!(results[0].video_summary.as_deref(), Some("short"));
    }
}

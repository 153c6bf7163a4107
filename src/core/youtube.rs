use crate::config::YouTubeSettings;
use crate::core::models::{ChannelInfo, Video, VideoDetails};
use crate::error::{Error, ErrorKind, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Comment threads returned by a single request.
pub const COMMENTS_PER_PAGE: usize = 50;
const SEARCH_PAGE_SIZE: &str = "50";
const MAX_COMMENT_PAGE_SIZE: &str = "100";

const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded", "rateLimitExceeded"];
const NOT_FOUND_REASONS: &[&str] = &[
    "commentsDisabled",
    "videoNotFound",
    "channelNotFound",
    "playlistNotFound",
    "notFound",
];

/// Everything the analysis flows need from the video-metadata provider. Each
/// call is made with exactly one API key.
pub trait VideoSource: Send + Sync {
    fn channel_by_id(
        &self,
        channel_id: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Option<ChannelInfo>>> + Send;

    fn channel_by_handle(
        &self,
        handle: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Option<ChannelInfo>>> + Send;

    fn search_channel(
        &self,
        query: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Option<ChannelInfo>>> + Send;

    /// Videos published by the channel between `start` and `end`, newest first.
    fn videos_in_range(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        api_key: &str,
    ) -> impl Future<Output = Result<Vec<Video>>> + Send;

    /// Most relevant top-level comments, at most [`COMMENTS_PER_PAGE`].
    fn video_comments(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn video_details(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<VideoDetails>> + Send;

    /// Every top-level comment, following page tokens up to the configured page limit.
    fn all_video_comments(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: String,
    max_comment_pages: usize,
}

impl YouTubeClient {
    pub fn new(settings: &YouTubeSettings, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            max_comment_pages: settings.max_comment_pages.max(1),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        api_key: &str,
    ) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(endpoint, "YouTube API request");

        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", api_key)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error_body(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn first_channel(&self, params: &[(&str, &str)], api_key: &str) -> Result<Option<ChannelInfo>> {
        let response: ListResponse<ChannelItem> = self.get_json("channels", params, api_key).await?;
        Ok(response.items.into_iter().next().map(|item| ChannelInfo {
            id: item.id,
            name: item.snippet.title,
        }))
    }

    async fn comment_page(
        &self,
        video_id: &str,
        page_size: &str,
        order: &str,
        page_token: Option<&str>,
        api_key: &str,
    ) -> Result<ListResponse<CommentThreadItem>> {
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("order", order),
            ("textFormat", "plainText"),
            ("maxResults", page_size),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }
        self.get_json("commentThreads", &params, api_key).await
    }
}

impl VideoSource for YouTubeClient {
    async fn channel_by_id(&self, channel_id: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
        self.first_channel(&[("part", "snippet"), ("id", channel_id)], api_key)
            .await
    }

    async fn channel_by_handle(&self, handle: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
        self.first_channel(&[("part", "snippet"), ("forHandle", handle)], api_key)
            .await
    }

    async fn search_channel(&self, query: &str, api_key: &str) -> Result<Option<ChannelInfo>> {
        let response: ListResponse<SearchItem> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
                api_key,
            )
            .await?;

        Ok(response.items.into_iter().next().and_then(|item| {
            let id = item.snippet.channel_id.or(item.id.channel_id)?;
            Some(ChannelInfo {
                id,
                name: decode(&item.snippet.channel_title),
            })
        }))
    }

    async fn videos_in_range(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        api_key: &str,
    ) -> Result<Vec<Video>> {
        let published_after = start.to_rfc3339_opts(SecondsFormat::Millis, true);
        let published_before = end.to_rfc3339_opts(SecondsFormat::Millis, true);

        let search: ListResponse<SearchItem> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("order", "date"),
                    ("type", "video"),
                    ("maxResults", SEARCH_PAGE_SIZE),
                    ("publishedAfter", &published_after),
                    ("publishedBefore", &published_before),
                ],
                api_key,
            )
            .await?;

        let ids = video_ids(&search.items);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics"), ("id", &ids)],
                api_key,
            )
            .await?;

        Ok(videos.items.into_iter().map(VideoItem::into_video).collect())
    }

    async fn video_comments(&self, video_id: &str, api_key: &str) -> Result<Vec<String>> {
        let page = self
            .comment_page(video_id, SEARCH_PAGE_SIZE, "relevance", None, api_key)
            .await?;
        let mut comments = page.comment_texts();
        comments.truncate(COMMENTS_PER_PAGE);
        Ok(comments)
    }

    async fn video_details(&self, video_id: &str, api_key: &str) -> Result<VideoDetails> {
        let response: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics"), ("id", video_id)],
                api_key,
            )
            .await?;

        response
            .items
            .into_iter()
            .next()
            .map(VideoItem::into_details)
            .ok_or_else(|| Error::not_found(format!("Video {video_id} was not found")))
    }

    async fn all_video_comments(&self, video_id: &str, api_key: &str) -> Result<Vec<String>> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        for page_number in 0..self.max_comment_pages {
            let page = self
                .comment_page(
                    video_id,
                    MAX_COMMENT_PAGE_SIZE,
                    "time",
                    page_token.as_deref(),
                    api_key,
                )
                .await?;
            comments.extend(page.comment_texts());

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(comments),
            }

            if page_number + 1 == self.max_comment_pages {
                warn!(video_id, pages = self.max_comment_pages, "comment page limit reached");
            }
        }

        Ok(comments)
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn video_ids(items: &[SearchItem]) -> String {
    items
        .iter()
        .filter_map(|item| item.id.video_id.as_deref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Turn a Google API error response into a classified [`Error::Api`].
pub fn classify_error_body(status: u16, body: &str) -> Error {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let detail = envelope.map(|envelope| envelope.error);

    let message = detail
        .as_ref()
        .and_then(|detail| detail.message.clone())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {status}"));

    let reasons: Vec<&str> = detail
        .as_ref()
        .map(|detail| {
            detail
                .errors
                .iter()
                .filter_map(|entry| entry.reason.as_deref())
                .collect()
        })
        .unwrap_or_default();

    let kind = if reasons.iter().any(|reason| QUOTA_REASONS.contains(reason)) {
        ErrorKind::QuotaExhausted
    } else if reasons.iter().any(|reason| NOT_FOUND_REASONS.contains(reason)) || status == 404 {
        ErrorKind::NotFound
    } else if status >= 500 {
        ErrorKind::Transient
    } else {
        ErrorKind::Fatal
    };

    Error::api(kind, message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl ListResponse<CommentThreadItem> {
    fn comment_texts(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|item| decode(&item.snippet.top_level_comment.snippet.text_display))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchId,
    #[serde(default)]
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    channel_title: String,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: Statistics,
}

impl VideoItem {
    fn into_video(self) -> Video {
        Video {
            view_count: parse_count(self.statistics.view_count.as_deref()).unwrap_or(0),
            thumbnail_url: self.snippet.thumbnails.best_url(),
            title: decode(&self.snippet.title),
            id: self.id,
        }
    }

    fn into_details(self) -> VideoDetails {
        VideoDetails {
            comment_count: parse_count(self.statistics.comment_count.as_deref()),
            thumbnail_url: self.snippet.thumbnails.best_url(),
            title: decode(&self.snippet.title),
            description: self.snippet.description,
            tags: self.snippet.tags,
            id: self.id,
        }
    }
}

fn parse_count(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.parse().ok())
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or(self.default.as_ref())
            .map(|thumb| thumb.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadItem {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    reason: Option<String>,
}

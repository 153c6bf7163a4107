use crate::core::stats::Growth;
use serde::{Deserialize, Serialize};

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
pub const CHANNEL_URL: &str = "https://www.youtube.com/channel/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
}

impl ChannelInfo {
    pub fn url(&self) -> String {
        channel_url(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub view_count: u64,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedVideo {
    #[serde(flatten)]
    pub video: Video,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_average_views: f64,
    pub ratio: f64,
    pub comments_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_summary: Option<String>,
}

impl AnalyzedVideo {
    pub fn url(&self) -> String {
        video_url(&self.video.id)
    }

    pub fn channel_url(&self) -> String {
        channel_url(&self.channel_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGrowthRecord {
    pub rank: usize,
    pub channel_id: String,
    pub channel_name: String,
    pub current_period_avg_views: f64,
    pub previous_period_avg_views: f64,
    pub growth: Growth,
    pub current_video_count: usize,
    pub previous_video_count: usize,
}

impl ChannelGrowthRecord {
    pub fn channel_url(&self) -> String {
        channel_url(&self.channel_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Completed,
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoListItem {
    pub input: String,
    pub video_id: Option<String>,
    pub status: ItemStatus,
    pub details: Option<VideoDetails>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub audience_insight: String,
}

impl VideoListItem {
    pub fn title(&self) -> &str {
        self.details
            .as_ref()
            .map(|details| details.title.as_str())
            .unwrap_or(&self.input)
    }

    pub fn url(&self) -> Option<String> {
        self.video_id.as_deref().map(video_url)
    }
}

pub fn video_url(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}

pub fn channel_url(channel_id: &str) -> String {
    format!("{CHANNEL_URL}{channel_id}")
}

use crate::core::models::{AnalyzedVideo, ChannelGrowthRecord, Video};
use crate::error::{self, Error};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A video is highlighted when its views exceed this multiple of the channel average.
pub const OUTLIER_FACTOR: f64 = 1.5;
/// Highlighted videos kept per channel.
pub const TOP_OUTLIERS: usize = 5;

pub fn average_views(videos: &[Video]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    let total: u64 = videos.iter().map(|video| video.view_count).sum();
    total as f64 / videos.len() as f64
}

pub fn view_ratio(views: u64, average: f64) -> f64 {
    if average > 0.0 {
        views as f64 / average
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Highlights {
    pub average_views: f64,
    pub videos: Vec<Video>,
}

/// Videos above [`OUTLIER_FACTOR`] times the mean, most viewed first, at most [`TOP_OUTLIERS`].
pub fn select_outliers(videos: &[Video]) -> Highlights {
    let average = average_views(videos);
    let threshold = average * OUTLIER_FACTOR;

    let mut outliers: Vec<Video> = videos
        .iter()
        .filter(|video| video.view_count as f64 > threshold)
        .cloned()
        .collect();
    outliers.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    outliers.truncate(TOP_OUTLIERS);

    Highlights {
        average_views: average,
        videos: outliers,
    }
}

/// Period-over-period change of average views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    Finite(f64),
    /// Views appeared where the previous period had none.
    Infinite,
}

impl Growth {
    pub fn between(current_avg: f64, previous_avg: f64) -> Self {
        if previous_avg > 0.0 {
            Self::Finite((current_avg - previous_avg) / previous_avg * 100.0)
        } else if current_avg > 0.0 {
            Self::Infinite
        } else {
            Self::Finite(0.0)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Finite(value) => *value,
            Self::Infinite => f64::INFINITY,
        }
    }

    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Infinite, Self::Infinite) => Ordering::Equal,
            (Self::Infinite, Self::Finite(_)) => Ordering::Greater,
            (Self::Finite(_), Self::Infinite) => Ordering::Less,
            (Self::Finite(a), Self::Finite(b)) => a.total_cmp(b),
        }
    }
}

impl fmt::Display for Growth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(value) => write!(f, "{value:.2}"),
            Self::Infinite => f.write_str("Infinity"),
        }
    }
}

impl Serialize for Growth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Finite(value) => serializer.serialize_f64(*value),
            Self::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}

impl<'de> Deserialize<'de> for Growth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self::Finite(value)),
            Raw::Text(text) if text.eq_ignore_ascii_case("infinity") => Ok(Self::Infinite),
            Raw::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid growth value: {text}"
            ))),
        }
    }
}

/// Sort by growth, highest first (ties keep input order), and number the ranks from 1.
pub fn rank_growth(mut records: Vec<ChannelGrowthRecord>) -> Vec<ChannelGrowthRecord> {
    records.sort_by(|a, b| b.growth.total_cmp(&a.growth));
    for (position, record) in records.iter_mut().enumerate() {
        record.rank = position + 1;
    }
    records
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthWindows {
    pub current: Window,
    pub previous: Window,
}

/// Longest analysis timeframe accepted anywhere, in days.
pub const MAX_DAYS: u32 = 3650;

/// The trailing `days` window ending at `now`, and the equally long window right before it.
pub fn growth_windows(now: DateTime<Utc>, days: u32) -> error::Result<GrowthWindows> {
    if days == 0 || days > MAX_DAYS {
        return Err(Error::validation(format!(
            "The timeframe must be between 1 and {MAX_DAYS} days"
        )));
    }
    let out_of_range = || Error::validation("The timeframe reaches past the supported date range");
    let span = Duration::try_days(i64::from(days)).ok_or_else(out_of_range)?;
    let current_start = now.checked_sub_signed(span).ok_or_else(out_of_range)?;
    let previous_start = current_start
        .checked_sub_signed(span)
        .ok_or_else(out_of_range)?;

    Ok(GrowthWindows {
        current: Window {
            start: current_start,
            end: now,
        },
        previous: Window {
            start: previous_start,
            end: current_start,
        },
    })
}

pub fn trailing_window(now: DateTime<Utc>, days: u32) -> error::Result<Window> {
    growth_windows(now, days).map(|windows| windows.current)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    #[default]
    Ratio,
    Views,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ratio => Self::Views,
            Self::Views => Self::Ratio,
        }
    }
}

/// Analysis results as displayed: at least `min_views`, ordered by `sort`.
pub fn view_results(results: &[AnalyzedVideo], sort: SortOrder, min_views: u64) -> Vec<AnalyzedVideo> {
    let mut shown: Vec<AnalyzedVideo> = results
        .iter()
        .filter(|video| video.video.view_count >= min_views)
        .cloned()
        .collect();

    match sort {
        SortOrder::Ratio => shown.sort_by(|a, b| b.ratio.total_cmp(&a.ratio)),
        SortOrder::Views => shown.sort_by(|a, b| b.video.view_count.cmp(&a.video.view_count)),
    }
    shown
}

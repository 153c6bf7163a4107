use crate::error::{Error, Result};
use yt_transcript_rs::{FetchedTranscript, api::YouTubeTranscriptApi};

/// Preferred caption languages, tried in order.
pub const TRANSCRIPT_LANGUAGES: &[&str] = &["en", "vi", "es"];

#[derive(Clone)]
pub struct TranscriptService {
    api: YouTubeTranscriptApi,
}

impl TranscriptService {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::custom(format!("Failed to initialise transcript client: {e}")))?;
        Ok(Self { api })
    }

    pub async fn fetch_text(&self, video_id: &str) -> Result<String> {
        let video_id = sanitize_video_id(video_id)?;
        let transcript = self
            .api
            .fetch_transcript(&video_id, TRANSCRIPT_LANGUAGES, false)
            .await
            .map_err(|e| Error::not_found(format!("Failed to fetch transcript: {e}")))?;
        Ok(Self::plain_text(&transcript))
    }

    /// Caption lines joined with spaces, timestamps dropped.
    pub fn plain_text(transcript: &FetchedTranscript) -> String {
        transcript
            .snippets
            .iter()
            .map(|snippet| snippet.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

const VIDEO_ID_LEN: usize = 11;
const URL_MARKERS: &[&str] = &["youtu.be/", "/embed/", "/shorts/", "/live/", "/v/"];

/// Pull the video id out of any common YouTube video URL, or accept a bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    let raw_id = if let Some(query) = input.split_once('?').map(|(_, query)| query) {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("v="))
            .or_else(|| path_id(input))
    } else {
        path_id(input)
    };

    match raw_id {
        Some(id) => sanitize_video_id(id).ok(),
        None if input.len() == VIDEO_ID_LEN => sanitize_video_id(input).ok(),
        None => None,
    }
}

fn path_id(url: &str) -> Option<&str> {
    URL_MARKERS.iter().find_map(|marker| {
        let (_, rest) = url.split_once(marker)?;
        rest.split(['?', '&', '/', '#']).next()
    })
}

/// Split pasted video links on whitespace and commas.
pub fn parse_video_inputs(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

const MAX_VIDEO_ID_LEN: usize = 128;

/// Ensure a video identifier is safe for downstream use (file names, API calls).
/// Only ASCII alphanumeric characters plus `_` and `-` are allowed.
pub fn sanitize_video_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::validation("Video ID cannot be empty"));
    }

    if trimmed.len() > MAX_VIDEO_ID_LEN {
        return Err(Error::validation("Video ID is unexpectedly long"));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::validation(
            "Video ID contains unsupported characters; expected only letters, numbers, '-' or '_'",
        ));
    }

    Ok(trimmed.to_string())
}

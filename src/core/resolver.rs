use crate::core::models::ChannelInfo;
use crate::core::youtube::VideoSource;
use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref CHANNEL_ID: Regex = Regex::new(r"^UC[\w-]{22,}$").unwrap();
    static ref CHANNEL_URL: Regex =
        Regex::new(r"youtube\.com/(?:channel/(UC[\w-]{22,})|c/([\w-]+)|@([\w.-]+))").unwrap();
    static ref HANDLE: Regex = Regex::new(r"^@([\w.-]+)$").unwrap();
}

/// What kind of lookup a user-supplied channel reference needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    ChannelId(String),
    Handle(String),
    Search(String),
}

impl Identifier {
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        if CHANNEL_ID.is_match(input) {
            return Some(Self::ChannelId(input.to_string()));
        }

        if let Some(captures) = CHANNEL_URL.captures(input) {
            if let Some(id) = captures.get(1) {
                return Some(Self::ChannelId(id.as_str().to_string()));
            }
            if let Some(name) = captures.get(2).or_else(|| captures.get(3)) {
                return Some(Self::Handle(name.as_str().to_string()));
            }
        }

        if let Some(captures) = HANDLE.captures(input) {
            return Some(Self::Handle(captures[1].to_string()));
        }

        Some(Self::Search(input.to_string()))
    }
}

/// Resolve a channel reference with one API key. `Ok(None)` means no such channel.
pub async fn resolve_channel<S: VideoSource>(
    source: &S,
    input: &str,
    api_key: &str,
) -> Result<Option<ChannelInfo>> {
    let Some(identifier) = Identifier::parse(input) else {
        return Ok(None);
    };
    debug!(?identifier, "resolving channel");

    match identifier {
        Identifier::ChannelId(id) => source.channel_by_id(&id, api_key).await,
        Identifier::Handle(handle) => source.channel_by_handle(&handle, api_key).await,
        Identifier::Search(query) => source.search_channel(&query, api_key).await,
    }
}

/// Split a batch of channel references on newlines and commas.
pub fn parse_identifier_list(input: &str) -> Result<Vec<String>> {
    let identifiers: Vec<String> = input
        .split(['\n', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();

    if identifiers.is_empty() {
        return Err(Error::validation("Enter at least one channel"));
    }
    Ok(identifiers)
}

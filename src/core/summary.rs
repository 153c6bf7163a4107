use crate::config::AiSettings;
use crate::error::{Error, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::responses::{
        CreateResponseArgs, EasyInputMessageArgs, InputItem, InputParam, OutputItem,
        OutputMessageContent, Role,
    },
};
use std::future::Future;
use tracing::{debug, warn};

/// Comments fed to the comment summary.
pub const MAX_SUMMARY_COMMENTS: usize = 50;
pub const MAX_COMMENT_CHARS: usize = 8_000;
pub const MAX_TRANSCRIPT_CHARS: usize = 15_000;
/// The audience insight sees more of the thread than the quick summary.
pub const MAX_INSIGHT_CHARS: usize = 30_000;

pub const NO_COMMENTS: &str = "No comments to analyze.";
pub const COMMENTS_DISABLED: &str = "Comments are disabled for this video.";
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable: the AI request failed.";
pub const NO_TRANSCRIPT: &str = "No transcript content to summarize.";

const SYSTEM_PROMPT: &str = "You are a YouTube audience and content analyst. \
Answer in concise, plain prose. Use Markdown only for short lists.";

/// Text generation as the analysis flows need it. Each call uses exactly one API key.
pub trait TextSummarizer: Send + Sync {
    fn summarize_comments(
        &self,
        comments: &[String],
        api_key: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn summarize_transcript(
        &self,
        title: &str,
        transcript: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn audience_insight(
        &self,
        title: &str,
        comments: &[String],
        api_key: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Clone)]
pub struct SummaryService {
    api_base: String,
    model: String,
    max_output_tokens: u32,
}

impl SummaryService {
    pub fn new(settings: &AiSettings) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
            max_output_tokens: settings.max_output_tokens,
        }
    }

    fn client(&self, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&self.api_base);
        Client::with_config(config)
    }

    async fn generate(&self, prompt: String, api_key: &str) -> Result<String> {
        let request = CreateResponseArgs::default()
            .max_output_tokens(self.max_output_tokens)
            .model(&self.model)
            .input(InputParam::Items(vec![
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::System)
                        .content(SYSTEM_PROMPT)
                        .build()?,
                ),
                InputItem::EasyMessage(
                    EasyInputMessageArgs::default()
                        .role(Role::User)
                        .content(prompt)
                        .build()?,
                ),
            ]))
            .build()?;

        debug!(model = %self.model, "AI request");
        let response = self.client(api_key).responses().create(request).await?;

        let mut content = String::new();
        for output in response.output {
            if let OutputItem::Message(message) = output {
                for part in message.content {
                    match part {
                        OutputMessageContent::OutputText(text) => content.push_str(&text.text),
                        other => warn!("Unexpected content type: {other:?}"),
                    }
                }
            }
        }

        let content = content.trim();
        if content.is_empty() {
            return Err(Error::custom("The AI provider returned an empty response"));
        }
        Ok(content.to_string())
    }
}

impl TextSummarizer for SummaryService {
    async fn summarize_comments(&self, comments: &[String], api_key: &str) -> Result<String> {
        match comments_prompt(comments) {
            Some(prompt) => self.generate(prompt, api_key).await,
            None => Ok(NO_COMMENTS.to_string()),
        }
    }

    async fn summarize_transcript(&self, title: &str, transcript: &str, api_key: &str) -> Result<String> {
        match transcript_prompt(title, transcript) {
            Some(prompt) => self.generate(prompt, api_key).await,
            None => Ok(NO_TRANSCRIPT.to_string()),
        }
    }

    async fn audience_insight(&self, title: &str, comments: &[String], api_key: &str) -> Result<String> {
        match insight_prompt(title, comments) {
            Some(prompt) => self.generate(prompt, api_key).await,
            None => Ok(NO_COMMENTS.to_string()),
        }
    }
}

/// At most `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn comments_prompt(comments: &[String]) -> Option<String> {
    if comments.is_empty() {
        return None;
    }
    let joined = comments
        .iter()
        .take(MAX_SUMMARY_COMMENTS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "Analyze and summarize the main topics, the overall sentiment (positive, negative, neutral) \
and any notable debates in the following YouTube comments. What is the audience's general \
reaction? Answer in 3-4 sentences.\n\n---\n{}\n---",
        truncate_chars(&joined, MAX_COMMENT_CHARS)
    ))
}

pub fn transcript_prompt(title: &str, transcript: &str) -> Option<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return None;
    }
    Some(format!(
        "Based on the transcript of the YouTube video titled \"{title}\", summarize its main ideas, \
core message and most notable points in 3-5 sentences, focusing on what the video actually \
conveys.\n\n---\n{}\n---",
        truncate_chars(transcript, MAX_TRANSCRIPT_CHARS)
    ))
}

pub fn insight_prompt(title: &str, comments: &[String]) -> Option<String> {
    if comments.is_empty() {
        return None;
    }
    let joined = comments.join("\n");
    Some(format!(
        "These are the viewer comments on the YouTube video \"{title}\". Describe the audience: \
who they appear to be, what they liked and disliked, the questions and requests they repeat, \
and content ideas a creator could take from them. Use short sections with bullet points.\
\n\n---\n{}\n---",
        truncate_chars(&joined, MAX_INSIGHT_CHARS)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn comment_prompt_uses_the_first_fifty_comments() {
        let comments: Vec<String> = (0..80).map(|i| format!("comment-{i:02}")).collect();
        let prompt = comments_prompt(&comments).unwrap();

        assert!(prompt.contains("comment-49"));
        assert!(!prompt.contains("comment-50"));
    }

    #[test]
    fn comment_prompt_caps_text_length() {
        let comments = vec!["x".repeat(20_000)];
        let prompt = comments_prompt(&comments).unwrap();
        assert_eq!(prompt.matches('x').count(), MAX_COMMENT_CHARS);
    }

    #[test]
    fn transcript_prompt_names_the_video() {
        let prompt = transcript_prompt("Rust in 100 seconds", "hello world").unwrap();
        assert!(prompt.contains("\"Rust in 100 seconds\""));
        assert!(prompt.contains("hello world"));
    }

    #[test]
    fn nothing_to_summarize_yields_no_prompt() {
        assert!(comments_prompt(&[]).is_none());
        assert!(transcript_prompt("t", "  ").is_none());
        assert!(insight_prompt("t", &[]).is_none());
    }
}

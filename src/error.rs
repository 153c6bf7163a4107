use async_openai::error::OpenAIError;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

/// Which credential pool a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Provider {
    #[display("YouTube")]
    YouTube,
    #[display("AI")]
    Ai,
}

/// Classification every provider failure is reduced to. The rotation
/// controller only ever looks at this, never at message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    #[display("quota exhausted")]
    QuotaExhausted,
    #[display("not found")]
    NotFound,
    #[display("transient")]
    Transient,
    #[display("fatal")]
    Fatal,
}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("{message}")]
    Api { kind: ErrorKind, message: String },

    #[display("All {provider} API keys have exhausted their quota ({tried} tried)")]
    AllCredentialsExhausted { provider: Provider, tried: usize },

    #[display("No {provider} API keys are loaded")]
    EmptyPool { provider: Provider },

    #[display("Configuration error: {_0}")]
    Configuration(String),

    #[display("{_0}")]
    Validation(String),

    #[display("IO error: {_0}")]
    #[from]
    Io(std::io::Error),

    #[display("JSON error: {_0}")]
    #[from]
    Json(serde_json::Error),

    #[display("CSV error: {_0}")]
    #[from]
    Csv(csv::Error),

    #[display("HTTP error: {_0}")]
    #[from]
    Http(reqwest::Error),

    #[display("AI provider error: {_0}")]
    #[from]
    OpenAI(OpenAIError),

    #[display("Settings error: {_0}")]
    #[from]
    Settings(config::ConfigError),

    #[display("{_0}")]
    Custom(String),
}

impl std::error::Error for Error {}

impl Error {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    pub fn api(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Api {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::api(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { kind, .. } => *kind,
            Self::Http(error) => classify_transport(error),
            Self::OpenAI(error) => classify_openai(error),
            _ => ErrorKind::Fatal,
        }
    }

    pub fn is_quota(&self) -> bool {
        self.kind() == ErrorKind::QuotaExhausted
    }
}

fn classify_transport(error: &reqwest::Error) -> ErrorKind {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        ErrorKind::Transient
    } else if error
        .status()
        .is_some_and(|status| status.is_server_error())
    {
        ErrorKind::Transient
    } else {
        ErrorKind::Fatal
    }
}

const OPENAI_QUOTA_MARKERS: &[&str] = &[
    "insufficient_quota",
    "rate_limit_exceeded",
    "resource_exhausted",
];

fn classify_openai(error: &OpenAIError) -> ErrorKind {
    match error {
        OpenAIError::ApiError(api) => {
            let markers = format!("{:?} {:?}", api.code, api.r#type).to_ascii_lowercase();
            if OPENAI_QUOTA_MARKERS
                .iter()
                .any(|marker| markers.contains(marker))
            {
                ErrorKind::QuotaExhausted
            } else {
                ErrorKind::Fatal
            }
        }
        OpenAIError::Reqwest(_) => ErrorKind::Transient,
        _ => ErrorKind::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_report_their_own_kind() {
        let err = Error::api(ErrorKind::QuotaExhausted, "quota");
        assert!(err.is_quota());
        assert_eq!(Error::not_found("gone").kind(), ErrorKind::NotFound);
    }

    #[test]
    fn local_errors_are_fatal() {
        assert_eq!(Error::validation("bad").kind(), ErrorKind::Fatal);
        assert_eq!(Error::custom("x").kind(), ErrorKind::Fatal);
    }

    #[test]
    fn exhaustion_message_names_the_provider() {
        let err = Error::AllCredentialsExhausted {
            provider: Provider::YouTube,
            tried: 3,
        };
        assert_eq!(
            err.to_string(),
            "All YouTube API keys have exhausted their quota (3 tried)"
        );
    }
}

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SHEET_URL: &str =
    "https://docs.google.com/spreadsheets/d/1uyjoE9WYJ2SUs0PpULjAQ-T3Ty9AQDIMxr3zBSfcExU/export?format=csv";

const ENV_PREFIX: &str = "CHANSCOPE";
const CONFIG_FILE: &str = "config.yaml";

lazy_static::lazy_static! {
    static ref DATA_FOLDER: Option<PathBuf> = env::var(format!("{ENV_PREFIX}_DATA"))
        .ok()
        .map(PathBuf::from);
    static ref CONFIG_FOLDER: Option<PathBuf> = env::var(format!("{ENV_PREFIX}_CONFIG"))
        .ok()
        .map(PathBuf::from);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sheet: SheetSettings,
    pub youtube: YouTubeSettings,
    pub ai: AiSettings,
    pub http: HttpSettings,
    pub analysis: AnalysisSettings,
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(skip)]
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    pub url: String,
    pub youtube_column: String,
    pub ai_column: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SHEET_URL.to_string(),
            youtube_column: "API Key Youtube".to_string(),
            ai_column: "API Key AI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeSettings {
    pub api_base: String,
    /// Upper bound on comment pages fetched per video in the video-list analysis.
    pub max_comment_pages: usize,
}

impl Default for YouTubeSettings {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            max_comment_pages: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub api_base: String,
    pub model: String,
    pub max_output_tokens: u32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1-mini".to_string(),
            max_output_tokens: 2_048,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub timeframe_days: u32,
    pub growth_timeframe_days: u32,
    pub min_views: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            timeframe_days: 30,
            growth_timeframe_days: 30,
            min_views: 0,
        }
    }
}

impl Settings {
    /// Defaults, then `<config_dir>/config.yaml`, then `CHANSCOPE_*` variables
    /// (`CHANSCOPE_AI__MODEL=...`).
    pub fn load() -> Result<Self> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();

        let source = config::File::from(config_dir.join(CONFIG_FILE))
            .format(config::FileFormat::Yaml)
            .required(false);
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let mut settings: Self = config::Config::builder()
            .add_source(source)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.data_dir = data_dir;
        settings.config_dir = config_dir;
        Ok(settings)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}

pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = DATA_FOLDER.clone() {
        dir
    } else if let Some(dirs) = project_directory() {
        dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = CONFIG_FOLDER.clone() {
        dir
    } else if let Some(dirs) = project_directory() {
        dirs.config_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".config")
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "chanscope", env!("CARGO_PKG_NAME"))
}

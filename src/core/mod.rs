pub mod access;
pub mod analysis;
pub mod export;
pub mod models;
pub mod progress;
pub mod resolver;
pub mod rotation;
pub mod sheet;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod transcript;
pub mod youtube;

pub use access::{AccessGate, AccessKey};
pub use analysis::{Analyzer, VideoListReport};
pub use progress::{Progress, Reporter};
pub use rotation::{KeyCursor, KeyPool};
pub use storage::{AppState, KvStore};
pub use summary::SummaryService;
pub use transcript::{TranscriptService, extract_video_id};
pub use youtube::YouTubeClient;

use crate::core::models::{AnalyzedVideo, ChannelGrowthRecord, VideoListItem};
use crate::core::rotation::{KeyCursor, KeyPool};
use crate::core::sheet::KeySheet;
use crate::error::{Error, Provider, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const ENTRY_SUFFIX: &str = ".json";
const MAX_KEY_LEN: usize = 64;

const YOUTUBE_KEYS: &str = "youtube_keys";
const YOUTUBE_KEY_INDEX: &str = "youtube_key_index";
const AI_KEYS: &str = "ai_keys";
const AI_KEY_INDEX: &str = "ai_key_index";
const ACCESS_KEY: &str = "access_key";
const ANALYSIS_RESULTS: &str = "analysis_results";
const GROWTH_RESULTS: &str = "growth_results";
const GROWTH_TIMEFRAME: &str = "growth_timeframe_days";
const VIDEO_LIST_RESULTS: &str = "video_list_results";

/// Flat key-value store: one JSON file per key inside a private directory.
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_directory(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        let key = sanitize_key(key)?;
        Ok(self.dir.join(format!("{key}{ENTRY_SUFFIX}")))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.entry_path(key)?;
        let content = serde_json::to_string_pretty(value)?;
        fs::write(&path, content)?;
        debug!(key, "state entry written");
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Store keys double as file names, so only ASCII alphanumerics, `_` and `-` pass.
pub fn sanitize_key(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(Error::custom("State key cannot be empty"));
    }
    if trimmed.len() > MAX_KEY_LEN {
        return Err(Error::custom("State key is unexpectedly long"));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        return Err(Error::custom(
            "State key contains unsupported characters; expected only letters, numbers, '-' or '_'",
        ));
    }

    Ok(trimmed)
}

fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o777 != 0o700 {
            permissions.set_mode(0o700);
            fs::set_permissions(path, permissions)?;
        }
    }

    Ok(())
}

/// Everything a session carries between runs.
#[derive(Debug, Clone)]
pub struct AppState {
    pub youtube_pool: KeyPool,
    pub youtube_cursor: KeyCursor,
    pub ai_pool: KeyPool,
    pub ai_cursor: KeyCursor,
    pub access_key: Option<String>,
    pub results: Vec<AnalyzedVideo>,
    pub growth_results: Vec<ChannelGrowthRecord>,
    pub growth_timeframe_days: u32,
    pub video_list: Vec<VideoListItem>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            youtube_pool: KeyPool::empty(Provider::YouTube),
            youtube_cursor: KeyCursor::default(),
            ai_pool: KeyPool::empty(Provider::Ai),
            ai_cursor: KeyCursor::default(),
            access_key: None,
            results: Vec::new(),
            growth_results: Vec::new(),
            growth_timeframe_days: 30,
            video_list: Vec::new(),
        }
    }
}

impl AppState {
    /// Missing entries fall back to defaults; corrupt ones are logged and ignored.
    pub fn load(store: &KvStore) -> Self {
        let defaults = Self::default();

        let youtube_keys: Vec<String> = read_or_default(store, YOUTUBE_KEYS);
        let ai_keys: Vec<String> = read_or_default(store, AI_KEYS);

        Self {
            youtube_pool: KeyPool::new(Provider::YouTube, youtube_keys),
            youtube_cursor: KeyCursor::new(read_or_default(store, YOUTUBE_KEY_INDEX)),
            ai_pool: KeyPool::new(Provider::Ai, ai_keys),
            ai_cursor: KeyCursor::new(read_or_default(store, AI_KEY_INDEX)),
            access_key: read_or_default(store, ACCESS_KEY),
            results: read_or_default(store, ANALYSIS_RESULTS),
            growth_results: read_or_default(store, GROWTH_RESULTS),
            growth_timeframe_days: store
                .get(GROWTH_TIMEFRAME)
                .ok()
                .flatten()
                .unwrap_or(defaults.growth_timeframe_days),
            video_list: read_or_default(store, VIDEO_LIST_RESULTS),
        }
    }

    pub fn save(&self, store: &KvStore) -> Result<()> {
        store.set(YOUTUBE_KEYS, self.youtube_pool.keys())?;
        store.set(YOUTUBE_KEY_INDEX, &self.youtube_cursor.get())?;
        store.set(AI_KEYS, self.ai_pool.keys())?;
        store.set(AI_KEY_INDEX, &self.ai_cursor.get())?;
        match &self.access_key {
            Some(key) => store.set(ACCESS_KEY, key)?,
            None => store.remove(ACCESS_KEY)?,
        }
        store.set(ANALYSIS_RESULTS, &self.results)?;
        store.set(GROWTH_RESULTS, &self.growth_results)?;
        store.set(GROWTH_TIMEFRAME, &self.growth_timeframe_days)?;
        store.set(VIDEO_LIST_RESULTS, &self.video_list)?;
        Ok(())
    }

    /// Forget keys, the access key and every result, in memory and on disk.
    pub fn clear_credentials(&mut self, store: &KvStore) -> Result<()> {
        for key in [
            YOUTUBE_KEYS,
            YOUTUBE_KEY_INDEX,
            AI_KEYS,
            AI_KEY_INDEX,
            ACCESS_KEY,
            ANALYSIS_RESULTS,
            GROWTH_RESULTS,
            GROWTH_TIMEFRAME,
            VIDEO_LIST_RESULTS,
        ] {
            store.remove(key)?;
        }
        *self = Self::default();
        info!("stored credentials and results cleared");
        Ok(())
    }

    /// Swap in freshly loaded key lists. A pool whose keys changed starts over at its first key.
    pub fn reload_keys(&mut self, sheet: &KeySheet) {
        if self.youtube_pool.replace(sheet.youtube_keys.clone()) {
            self.youtube_cursor.set(0);
        }
        if self.ai_pool.replace(sheet.ai_keys.clone()) {
            self.ai_cursor.set(0);
        }
    }

    pub fn pool(&self, provider: Provider) -> (&KeyPool, &KeyCursor) {
        match provider {
            Provider::YouTube => (&self.youtube_pool, &self.youtube_cursor),
            Provider::Ai => (&self.ai_pool, &self.ai_cursor),
        }
    }

    /// Position of the key a pool will try first, as shown to the user.
    pub fn active_key_index(&self, provider: Provider) -> Option<usize> {
        let (pool, cursor) = self.pool(provider);
        (!pool.is_empty()).then(|| cursor.get() % pool.len())
    }
}

fn read_or_default<T: DeserializeOwned + Default>(store: &KvStore, key: &str) -> T {
    match store.get(key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable state entry");
            T::default()
        }
    }
}

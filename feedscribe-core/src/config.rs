use crate::error::ConfigError;
use crate::filter::{ExtensionAllowList, DEFAULT_IMAGE_EXTENSIONS};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Points at an optional TOML file read before environment overrides.
pub const CONFIG_PATH_VAR: &str = "FEEDSCRIBE_CONFIG";

/// Largest page the hot listing serves; there is no pagination.
pub const MAX_FETCH_LIMIT: u32 = 100;

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub collection: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/feedscribe.db".to_string(),
            collection: "posts".to_string(),
            max_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub binary: String,
    pub engine_mode: u8,
    pub page_segmentation_mode: u8,
    pub language: String,
    pub timeout_secs: u64,
}

impl OcrConfig {
    /// Tesseract flags, e.g. `--oem 3 --psm 6 -l eng`.
    pub fn engine_args(&self) -> Vec<String> {
        vec![
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation_mode.to_string(),
            "-l".to_string(),
            self.language.clone(),
        ]
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            engine_mode: 3,
            page_segmentation_mode: 6,
            language: "eng".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub reddit: RedditCredentials,
    pub store: StoreConfig,
    pub ocr: OcrConfig,
    pub subreddit_name: String,
    pub limit: u32,
    pub sleep_seconds: f64,
    pub image_dir: Option<PathBuf>,
    pub download_timeout_secs: u64,
    pub min_text_length: usize,
    pub allowed_extensions: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            reddit: RedditCredentials::default(),
            store: StoreConfig::default(),
            ocr: OcrConfig::default(),
            subreddit_name: "LinkedInLunatics".to_string(),
            limit: 100,
            sleep_seconds: 0.0,
            image_dir: Some(PathBuf::from("data/images")),
            download_timeout_secs: 10,
            min_text_length: 50,
            allowed_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ScraperConfig {
    /// Loads `.env` if present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        check_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source. A TOML file named
    /// by `FEEDSCRIBE_CONFIG` is read first; variables then override it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) if !path.trim().is_empty() => Self::from_toml_file(path.trim())?,
            _ => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CLIENT_ID") {
            self.reddit.client_id = value;
        }
        if let Some(value) = lookup("CLIENT_SECRET") {
            self.reddit.client_secret = value;
        }
        if let Some(value) = lookup("USER_AGENT") {
            self.reddit.user_agent = value;
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.store.database_url = value;
        }
        if let Some(value) = lookup("STORE_COLLECTION") {
            self.store.collection = value;
        }
        if let Some(value) = lookup("SUBREDDIT_NAME") {
            self.subreddit_name = value;
        }
        if let Some(value) = parse_var(lookup, "FETCH_LIMIT")? {
            self.limit = value;
        }
        if let Some(value) = parse_var(lookup, "SLEEP_SECONDS")? {
            self.sleep_seconds = value;
        }
        if let Some(value) = lookup("IMAGE_DIR") {
            // An empty value keeps images in memory only.
            self.image_dir = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        if let Some(value) = parse_var(lookup, "DOWNLOAD_TIMEOUT_SECS")? {
            self.download_timeout_secs = value;
        }
        if let Some(value) = parse_var(lookup, "MIN_TEXT_LENGTH")? {
            self.min_text_length = value;
        }
        if let Some(value) = lookup("TESSERACT_CMD") {
            self.ocr.binary = value;
        }
        if let Some(value) = lookup("OCR_LANGUAGE") {
            self.ocr.language = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (var_name, value) in [
            ("CLIENT_ID", &self.reddit.client_id),
            ("CLIENT_SECRET", &self.reddit.client_secret),
            ("USER_AGENT", &self.reddit.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingEnvironmentVariable {
                    var_name: var_name.to_string(),
                });
            }
        }

        if self.subreddit_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "subreddit name is empty".to_string(),
            });
        }
        if self.limit == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "limit must be at least 1".to_string(),
            });
        }
        if self.limit > MAX_FETCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "limit".to_string(),
                value: self.limit.to_string(),
            });
        }
        if Duration::try_from_secs_f64(self.sleep_seconds).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "sleep_seconds".to_string(),
                value: self.sleep_seconds.to_string(),
            });
        }
        if self.download_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "download_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if !is_identifier(&self.store.collection) {
            return Err(ConfigError::InvalidValue {
                field: "store.collection".to_string(),
                value: self.store.collection.clone(),
            });
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "no allowed image extensions".to_string(),
            });
        }
        Ok(())
    }

    pub fn allow_list(&self) -> ExtensionAllowList {
        ExtensionAllowList::new(&self.allowed_extensions)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Pause between consecutive downloads, if any.
    pub fn sleep_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.sleep_seconds)
            .ok()
            .filter(|pause| !pause.is_zero())
    }
}

/// A missing `.env` is fine; one that fails to parse is not.
fn check_env_file(outcome: Result<PathBuf, dotenvy::Error>) -> Result<(), ConfigError> {
    match outcome {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::EnvFile {
            reason: e.to_string(),
        }),
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw,
            }),
        None => Ok(None),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

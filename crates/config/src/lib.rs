//! Layered configuration for d2c.
//!
//! Values are merged in order, later layers winning:
//!
//! 1. Built-in defaults.
//! 2. A config file (`.toml`, `.yaml`/`.yml` or `.json`, by extension). When no
//!    path is given, `d2c.toml` in the platform config directory is used if it
//!    exists.
//! 3. Environment variables prefixed `D2C_`, with `__` between nested keys
//!    (`D2C_PUBLISH__ON_COLLISION=suffix`).

pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use d2c_archive::{DEFAULT_ARCHIVE_PATH, ListingFormat, PollPolicy};
use d2c_commons::{CollisionPolicy, UploadMode};
use d2c_extract::models::Rendition;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "D2C_";
pub const CONFIG_FILENAME: &str = "d2c.toml";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub commons: CommonsConfig,
    pub publish: PublishConfig,
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_url: String,
    /// Collection prefix for references scraped from the HTML listing.
    pub archive_path: String,
    pub listing: ListingFormat,
    pub page_limit: usize,
    pub user_agent: String,
    pub poll: PollConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://foto.digitalarkivet.no".to_string(),
            archive_path: DEFAULT_ARCHIVE_PATH.to_string(),
            listing: ListingFormat::default(),
            page_limit: 2000,
            user_agent: format!("Digitalarkivet2Commons/{}", env!("CARGO_PKG_VERSION")),
            poll: PollConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
            timeout_secs: policy.timeout.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonsConfig {
    /// `api.php` endpoint.
    pub api_url: String,
    /// Bot password username (`User@BotName`). Uploads are anonymous without it.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for CommonsConfig {
    fn default() -> Self {
        Self { api_url: "https://commons.wikimedia.org/w/api.php".to_string(), username: None, password: None }
    }
}

impl CommonsConfig {
    /// Username and password, if both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub rendition: Rendition,
    /// Edit summary for every upload.
    pub comment: String,
    pub batch_pause_secs: u64,
    pub on_collision: CollisionPolicy,
    /// Send file bytes, or let the repository fetch the download URL.
    pub upload: UploadMode,
    /// Consecutive unreachable-repository failures that end a run.
    pub max_consecutive_failures: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            rendition: Rendition::default(),
            comment: "Transferred from [[Commons:Digitalarkivet|Digitalarkivet]]".to_string(),
            batch_pause_secs: 5,
            on_collision: CollisionPolicy::default(),
            upload: UploadMode::default(),
            max_consecutive_failures: 3,
        }
    }
}

/// Template overrides; `None` keeps the built-in layout.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub description: Option<String>,
    pub filename: Option<String>,
}

impl Config {
    /// `d2c.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("no", "Digitalarkivet2Commons", "d2c").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// The merged layers, before extraction. An explicit `path` must exist.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Invalid(format!("config file {} not found", path.display())))
            },
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_path().filter(|path| path.is_file()),
        };
        if let Some(file) = file {
            debug!(path = %file.display(), "reading config file");
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(&file)),
                Some("json") => figment.merge(Json::file(&file)),
                _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config format: {}", file.display()))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads and validates configuration from every layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path)?)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> { exn::bail!(ErrorKind::Invalid(message.to_string())) };
        if self.archive.base_url.trim().is_empty() {
            return invalid("archive.base_url is empty");
        }
        if self.commons.api_url.trim().is_empty() {
            return invalid("commons.api_url is empty");
        }
        if self.archive.page_limit == 0 {
            return invalid("archive.page_limit must be positive");
        }
        if self.archive.poll.initial_backoff_ms > self.archive.poll.max_backoff_ms {
            return invalid("archive.poll.initial_backoff_ms exceeds max_backoff_ms");
        }
        if self.publish.max_consecutive_failures == 0 {
            return invalid("publish.max_consecutive_failures must be positive");
        }
        if self.commons.username.is_some() != self.commons.password.is_some() {
            return invalid("commons.username and commons.password must be set together");
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let poll = &self.archive.poll;
        PollPolicy {
            initial_backoff: Duration::from_millis(poll.initial_backoff_ms),
            max_backoff: Duration::from_millis(poll.max_backoff_ms),
            timeout: Duration::from_secs(poll.timeout_secs),
        }
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_secs(self.publish.batch_pause_secs)
    }
}

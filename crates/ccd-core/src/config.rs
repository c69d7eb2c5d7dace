//! Adapter configuration.
//!
//! Configuration is read once, when an adapter is constructed, and never
//! changes afterwards. It comes from an optional `ccd.toml` file followed by
//! environment overrides.
//!
//! # Resolution Algorithm
//!
//! 1. `CCD_CONFIG_PATH` environment variable
//! 2. `ccd.toml` in the current directory
//! 3. `ccd.toml` in parent directories (walk up to filesystem root)
//! 4. XDG config directory (`~/.config/ccd/ccd.toml`)
//!
//! A missing file is not an error; defaults apply.
//!
//! # Environment Overrides
//!
//! | variable | field |
//! |----------|-------|
//! | `CCD_VICIDIAL_URL` | `base_url` |
//! | `CCD_VICIDIAL_API_USER` | `api_user` |
//! | `CCD_VICIDIAL_API_KEY` | `api_key` |
//! | `CCD_VICIDIAL_DB` | `database` |
//!
//! # Example
//!
//! ```toml
//! base_url = "https://dialer.example.com"
//! api_user = "ccd_api"
//! api_key = "secret"
//! timeout_secs = 5
//! ```

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Value of the `source` query parameter sent with every request.
pub const DEFAULT_SOURCE_TAG: &str = "CCD_CRM";

/// API user sent when a request does not name one.
pub const DEFAULT_API_USER: &str = "admin";

/// Name of the configuration file searched for on disk.
pub const CONFIG_FILE_NAME: &str = "ccd.toml";

const ENV_CONFIG_PATH: &str = "CCD_CONFIG_PATH";
const ENV_URL: &str = "CCD_VICIDIAL_URL";
const ENV_API_USER: &str = "CCD_VICIDIAL_API_USER";
const ENV_API_KEY: &str = "CCD_VICIDIAL_API_KEY";
const ENV_DATABASE: &str = "CCD_VICIDIAL_DB";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error when reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error when a config file is malformed.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection settings for one telephony server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialerConfig {
    /// Base address of the telephony server. `None` means no server is
    /// configured and every call is answered from fallback data.
    pub base_url: Option<String>,

    /// API user sent when a request does not name one.
    pub api_user: String,

    /// Credential sent when a request does not carry its own `pass`.
    pub api_key: String,

    /// Dialer database name. Informational only.
    pub database: Option<String>,

    /// Value of the `source` query parameter.
    pub source_tag: String,

    /// HTTP client timeout.
    pub timeout_secs: u64,

    /// Extra attempts after a failed request. Zero means a single attempt.
    pub retries: usize,

    /// Interval between polls of a shared feed.
    pub poll_interval_secs: u64,

    /// How long a shared feed serves a cached result.
    pub cache_ttl_secs: u64,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_user: DEFAULT_API_USER.to_string(),
            api_key: String::new(),
            database: None,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            timeout_secs: 10,
            retries: 0,
            poll_interval_secs: 15,
            cache_ttl_secs: 10,
        }
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for DialerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialerConfig")
            .field("base_url", &self.base_url)
            .field("api_user", &self.api_user)
            .field("api_key", &"<redacted>")
            .field("database", &self.database)
            .field("source_tag", &self.source_tag)
            .field("timeout_secs", &self.timeout_secs)
            .field("retries", &self.retries)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .finish()
    }
}

impl DialerConfig {
    /// Loads a config file from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if:
    /// - The file does not exist (`NotFound`)
    /// - The file exists but cannot be read (`Io`)
    /// - The file cannot be parsed as TOML
    /// - The parsed values fail [`Self::validate`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;

        let config: DialerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Finds a config file using the resolution algorithm.
    ///
    /// Returns `Ok(None)` when no file exists anywhere on the search path.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if the current directory cannot be read or
    /// a found file cannot be loaded.
    pub fn resolve() -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let current = std::env::current_dir()?;
        let env_path = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let xdg_path = dirs::config_dir().map(|dir| dir.join("ccd").join(CONFIG_FILE_NAME));

        match resolve_path(&current, env_path, xdg_path) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok(Some((path, config)))
            }
            None => Ok(None),
        }
    }

    /// Builds the effective configuration for this process: the resolved
    /// file (or defaults) with environment overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns `Err(ConfigError)` if a found file cannot be loaded or the
    /// final values fail [`Self::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match Self::resolve()? {
            Some((path, config)) => {
                tracing::debug!(path = %path.display(), "loaded dialer config");
                config
            }
            None => Self::default(),
        };

        let config = base.with_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies environment-style overrides from `lookup`.
    ///
    /// Empty values are ignored, except that an empty `CCD_VICIDIAL_URL`
    /// clears the base URL.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_URL) {
            self.base_url = Some(url).filter(|url| !url.trim().is_empty());
        }
        if let Some(user) = lookup(ENV_API_USER).filter(|v| !v.is_empty()) {
            self.api_user = user;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.database = Some(database);
        }
        self
    }

    /// Sets the base URL, builder style.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the default API credentials, builder style.
    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_user = user.into();
        self.api_key = key.into();
        self
    }

    /// Checks values that would make every request fail.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the source tag or API user is empty,
    /// or if the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_tag.trim().is_empty() {
            return Err(ConfigError::Invalid("source_tag must not be empty".into()));
        }
        if self.api_user.trim().is_empty() {
            return Err(ConfigError::Invalid("api_user must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Returns `true` if a telephony server address is configured.
    pub fn has_server(&self) -> bool {
        self.base_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

// ===== Resolution helpers =====

/// Walks the search path and returns the first existing config file.
fn resolve_path(
    start: &Path,
    env_path: Option<PathBuf>,
    xdg_path: Option<PathBuf>,
) -> Option<PathBuf> {
    // Step 1: Environment variable override
    if let Some(path) = env_path.filter(|path| path.exists()) {
        return Some(path);
    }

    // Steps 2 and 3: current directory, then parents
    for dir in start.ancestors() {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    // Step 4: XDG config directory
    xdg_path.filter(|path| path.exists())
}

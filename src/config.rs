// Client configuration. A `Config` is built once at startup (defaults, then
// an optional JSON file, then environment overrides), validated, and handed
// to `ApiClient`. It is never mutated afterwards.

use crate::api::Operation;
use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

pub const ENV_BASE_URL: &str = "PIXELSTRIP_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "PIXELSTRIP_TIMEOUT_SECS";
pub const ENV_STATUS_POLICY: &str = "PIXELSTRIP_STATUS_POLICY";

/// Endpoint paths, one per operation. Paths are appended verbatim to the
/// base URL, so they should start with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub remove_bg: String,
    pub enhance: String,
    pub enhance_original: String,
    pub add_color_bg: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            remove_bg: "/remove-bg".into(),
            enhance: "/enhance-bg-removed".into(),
            enhance_original: "/enhance-only".into(),
            add_color_bg: "/add-color-background".into(),
        }
    }
}

/// Flags read by the UI layer to decide which actions to offer. The API
/// client itself never checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub enable_enhancement: bool,
    pub enable_background_removal: bool,
    pub enable_color_background: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_enhancement: true,
            enable_background_removal: true,
            enable_color_background: true,
        }
    }
}

/// What to do with a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusPolicy {
    /// Turn it into `ApiError::Status`.
    #[default]
    Strict,
    /// Hand the response back to the caller untouched.
    PassThrough,
}

/// How `submit_enhance` picks its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnhanceRouting {
    /// `enhance` for background-removed input, `enhance_original` otherwise.
    #[default]
    Branching,
    /// Always `enhance`.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the backend, without a trailing slash.
    pub base_url: String,
    pub endpoints: Endpoints,
    pub max_upload_size: u64,
    pub supported_formats: BTreeSet<String>,
    pub features: FeatureFlags,
    pub status_policy: StatusPolicy,
    pub enhance_routing: EnhanceRouting,
    /// Per-request timeout in seconds. `None` or `0` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            endpoints: Endpoints::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            supported_formats: ["image/jpeg", "image/png", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            features: FeatureFlags::default(),
            status_policy: StatusPolicy::default(),
            enhance_routing: EnhanceRouting::default(),
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Defaults overridden by `PIXELSTRIP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Fields not present keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), base_url = %config.base_url, "loaded config file");
        Ok(config)
    }

    /// Config file in the user's config directory if present, otherwise
    /// defaults; environment variables are applied on top either way.
    pub fn discover() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.is_file() => Self::load(path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/pixelstrip/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pixelstrip").join("config.json"))
    }

    /// Apply overrides from a variable lookup. Unset variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            self.timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(raw) = lookup(ENV_STATUS_POLICY) {
            self.status_policy = match raw.trim() {
                "strict" => StatusPolicy::Strict,
                "pass-through" => StatusPolicy::PassThrough,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: ENV_STATUS_POLICY,
                        value: raw,
                    })
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|_| ConfigError::InvalidBaseUrl(self.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }

        let paths = [
            ("remove_bg", &self.endpoints.remove_bg),
            ("enhance", &self.endpoints.enhance),
            ("enhance_original", &self.endpoints.enhance_original),
            ("add_color_bg", &self.endpoints.add_color_bg),
        ];
        for (name, path) in paths {
            if path.is_empty() {
                return Err(ConfigError::EmptyEndpoint(name));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Configured path for an operation, after enhance routing.
    pub fn endpoint(&self, op: Operation) -> &str {
        match op {
            Operation::RemoveBackground => &self.endpoints.remove_bg,
            Operation::Enhance {
                already_background_removed,
            } => match self.enhance_routing {
                EnhanceRouting::Branching if !already_background_removed => {
                    &self.endpoints.enhance_original
                }
                _ => &self.endpoints.enhance,
            },
            Operation::AddColorBackground => &self.endpoints.add_color_bg,
        }
    }

    /// Full request URL. Plain concatenation: no separators are added or
    /// removed.
    pub fn url_for(&self, op: Operation) -> String {
        format!("{}{}", self.base_url, self.endpoint(op))
    }

    /// Upload constraint check for the UI layer. The API client does not
    /// call this.
    pub fn check_upload(&self, size: u64, mime: &str) -> Result<(), ConfigError> {
        if size > self.max_upload_size {
            return Err(ConfigError::UploadTooLarge {
                size,
                max: self.max_upload_size,
            });
        }
        if !self.supported_formats.contains(mime) {
            return Err(ConfigError::UnsupportedFormat(mime.to_string()));
        }
        Ok(())
    }
}

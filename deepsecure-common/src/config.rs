//! Bootstrap configuration and resolution
//!
//! Every setting is resolved field by field with this priority:
//! 1. Command-line override (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! remaining tiers are used. A config file that exists but cannot be parsed
//! is reported as `Error::Config`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const ENV_CONFIG_PATH: &str = "DEEPSECURE_CONFIG";
/// Environment variable for the detection service base URL
pub const ENV_DETECTION_URL: &str = "DEEPSECURE_API_URL";
/// Environment variable for the claim-verification service base URL
pub const ENV_CLAIM_URL: &str = "DEEPSECURE_CLAIM_API_URL";
/// Environment variable for the listen port
pub const ENV_PORT: &str = "DEEPSECURE_PORT";
/// Environment variable for the sample file directory
pub const ENV_SAMPLES_DIR: &str = "DEEPSECURE_SAMPLES_DIR";

/// Bootstrap configuration loaded from TOML file
///
/// All fields are optional; anything left out falls through to the
/// compiled defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Base URL of the detection service (`/detect/{image,video,audio}`)
    #[serde(default)]
    pub detection_base_url: Option<String>,

    /// Base URL of the claim-verification service (`/analyze`)
    #[serde(default)]
    pub claim_base_url: Option<String>,

    /// HTTP listen port
    #[serde(default)]
    pub port: Option<u16>,

    /// Timeout for a single outbound analysis request, in seconds
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Directory holding the "try a sample" media files
    #[serde(default)]
    pub samples_dir: Option<PathBuf>,

    /// Event bus capacity
    #[serde(default)]
    pub event_capacity: Option<usize>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled defaults used when no other tier provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub detection_base_url: String,
    pub claim_base_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub samples_dir: PathBuf,
    pub event_capacity: usize,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            detection_base_url: "http://localhost:8083".to_string(),
            claim_base_url: "https://tracerapi.opulentencounters.com".to_string(),
            port: 5730,
            request_timeout: Duration::from_secs(120),
            samples_dir: default_samples_dir(),
            event_capacity: 100,
            log_level: default_log_level(),
        }
    }
}

fn default_samples_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("deepsecure").join("samples"))
        .unwrap_or_else(|| PathBuf::from("./samples"))
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub detection_base_url: Option<String>,
    pub claim_base_url: Option<String>,
    pub port: Option<u16>,
    pub samples_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub detection_base_url: String,
    pub claim_base_url: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub samples_dir: PathBuf,
    pub event_capacity: usize,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let path = config_file_path(overrides.config_path.as_deref());
        let toml_config = match path {
            Some(ref path) => load_toml_config(path)?.unwrap_or_default(),
            None => {
                warn!("No config directory available on this platform, using defaults");
                TomlConfig::default()
            }
        };

        Self::from_sources(overrides, toml_config, CompiledDefaults::default())
    }

    /// Merge the configuration tiers
    ///
    /// Environment variables are read here; TOML content and defaults are
    /// passed in so callers (and tests) control them directly.
    pub fn from_sources(
        overrides: ConfigOverrides,
        toml_config: TomlConfig,
        defaults: CompiledDefaults,
    ) -> Result<Self> {
        let detection_base_url = overrides
            .detection_base_url
            .or_else(|| env_string(ENV_DETECTION_URL))
            .or(toml_config.detection_base_url)
            .unwrap_or(defaults.detection_base_url);
        let detection_base_url = normalize_base_url(&detection_base_url)?;

        let claim_base_url = overrides
            .claim_base_url
            .or_else(|| env_string(ENV_CLAIM_URL))
            .or(toml_config.claim_base_url)
            .unwrap_or(defaults.claim_base_url);
        let claim_base_url = normalize_base_url(&claim_base_url)?;

        let env_port = match env_string(ENV_PORT) {
            Some(value) => Some(value.parse::<u16>().map_err(|e| {
                Error::Config(format!("Invalid {} '{}': {}", ENV_PORT, value, e))
            })?),
            None => None,
        };
        let port = overrides
            .port
            .or(env_port)
            .or(toml_config.port)
            .unwrap_or(defaults.port);

        let samples_dir = overrides
            .samples_dir
            .or_else(|| env_string(ENV_SAMPLES_DIR).map(PathBuf::from))
            .or(toml_config.samples_dir)
            .unwrap_or(defaults.samples_dir);

        let request_timeout = toml_config
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        if request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let event_capacity = toml_config
            .event_capacity
            .unwrap_or(defaults.event_capacity)
            .max(1);

        let mut logging = toml_config.logging;
        if let Some(level) = overrides.log_level {
            logging.level = level;
        }

        Ok(Self {
            detection_base_url,
            claim_base_url,
            port,
            request_timeout,
            samples_dir,
            event_capacity,
            logging,
        })
    }
}

/// Locate the config file
///
/// CLI path first, then `DEEPSECURE_CONFIG`, then
/// `{config_dir}/deepsecure/config.toml`.
pub fn config_file_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_string(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("deepsecure").join("config.toml"))
}

/// Load a TOML config file
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        warn!("Config file not found: {}, using defaults", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed {}: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed {}: {}", path.display(), e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(Some(config))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Validate a base URL and strip trailing slashes
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::Config(format!(
                "Base URL must start with http:// or https:// and name a host: '{}'",
                url
            ))
        })?;
    if host.is_empty() {
        return Err(Error::Config(format!("Base URL has no host: '{}'", url)));
    }
    Ok(trimmed.to_string())
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

//! Configuration system for the `TaskHUD` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskhud/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use crate::timer::ControllerConfig;

/// Largest accepted `recheck_interval_secs`.
const MAX_RECHECK_SECS: u64 = 59;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    timer: TimerFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_ms: Option<u64>,
}

/// `[timer]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct TimerFileConfig {
    recheck_interval_secs: Option<u64>,
    pomodoro_minutes: Option<u64>,
    event_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct HudConfig {
    /// Base URL of the task API.
    pub api_url: String,
    /// Timeout for a single task API request.
    pub request_timeout: Duration,
    /// Period of the target recheck loop.
    pub recheck_interval: Duration,
    /// Length of the pomodoro target in minutes.
    pub pomodoro_minutes: u64,
    /// Capacity of the host event channel.
    pub event_buffer: usize,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            request_timeout: Duration::from_secs(10),
            recheck_interval: Duration::from_secs(30),
            pomodoro_minutes: 25,
            event_buffer: 64,
        }
    }
}

impl HudConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the default file exists but is malformed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `HudConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Zero intervals and targets are raised
    /// to their minimum (one second, one minute). The recheck interval is
    /// capped at 59 seconds so no tick can step over a target's minute.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            api_url: cli
                .api_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.api_url),
            request_timeout: file
                .api
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
            recheck_interval: cli
                .recheck_interval_secs
                .or(file.timer.recheck_interval_secs)
                .map_or(defaults.recheck_interval, |s| {
                    Duration::from_secs(s.clamp(1, MAX_RECHECK_SECS))
                }),
            pomodoro_minutes: cli
                .pomodoro_minutes
                .or(file.timer.pomodoro_minutes)
                .unwrap_or(defaults.pomodoro_minutes)
                .max(1),
            event_buffer: file
                .timer
                .event_buffer
                .unwrap_or(defaults.event_buffer)
                .max(1),
        }
    }

    /// Build the [`ControllerConfig`] for this configuration.
    #[must_use]
    pub const fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            recheck_interval: self.recheck_interval,
            pomodoro: Duration::from_secs(self.pomodoro_minutes.saturating_mul(60)),
            event_buffer: self.event_buffer,
        }
    }
}

/// Timer command to run.
#[derive(clap::Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Show the task's timer.
    #[default]
    Status,
    /// Start logging.
    Start,
    /// Pause logging.
    Pause,
    /// Stop and save logged time.
    Stop,
    /// Discard pending time.
    Reset,
    /// Arm the pomodoro target.
    Pomodoro,
    /// Attach to the task and report until interrupted.
    Watch,
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Active-task timer with pomodoro targets")]
pub struct CliArgs {
    /// Command to run (default: status).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Task to operate on.
    #[arg(short, long, env = "TASKHUD_TASK")]
    pub task_id: Option<String>,

    /// Base URL of the task API.
    #[arg(long, env = "TASKHUD_API_URL")]
    pub api_url: Option<String>,

    /// Pomodoro length in minutes.
    #[arg(long)]
    pub pomodoro_minutes: Option<u64>,

    /// Seconds between target checks.
    #[arg(long)]
    pub recheck_interval_secs: Option<u64>,

    /// Path to config file (default: `~/.config/taskhud/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKHUD_LOG")]
    pub log_level: String,

    /// Path to log file (default: stderr).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskhud").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

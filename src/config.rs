use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "https://api.twelvelabs.io/v1.3";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 900;
const DEFAULT_WARMUP_DELAY_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SERVER_PORT: u16 = 5001;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the segmentation service.
///
/// Built once at process start and handed to constructors explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key sent to the video-understanding service.
    pub api_key: String,
    /// Index that receives submitted videos.
    pub index_id: String,
    /// Base URL of the video-understanding service.
    pub api_url: String,
    /// Interval between task status polls.
    pub poll_interval: Duration,
    /// Upper bound on how long a task may stay unresolved.
    pub poll_timeout: Duration,
    /// Pause between observing a ready task and issuing the analysis call.
    pub warmup_delay: Duration,
    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
    /// Port the HTTP server listens on.
    pub server_port: u16,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()));

        let poll_interval = load_secs(&get, "VIDSEG_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "VIDSEG_POLL_INTERVAL_SECS".to_string(),
            ));
        }

        Ok(Self {
            api_key: require("TWELVELABS_API_KEY")?,
            index_id: require("TWELVELABS_INDEX_ID")?,
            api_url: get("TWELVELABS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            poll_interval,
            poll_timeout: load_secs(&get, "VIDSEG_POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?,
            warmup_delay: load_secs(&get, "VIDSEG_WARMUP_DELAY_SECS", DEFAULT_WARMUP_DELAY_SECS)?,
            request_timeout: load_secs(
                &get,
                "VIDSEG_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            server_port: get("SERVER_PORT")
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_SERVER_PORT),
        })
    }
}

fn load_secs<G>(get: &G, key: &str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|secs| Duration::from_secs(secs.unwrap_or(default)))
}

/// Copy variables from `.env` in the working directory into the process environment.
///
/// Binaries call this before logging starts so `RUST_LOG` and `VIDSEG_LOG_FILE` can come
/// from the file. Variables already present in the environment are left untouched.
pub fn load_dotenv() -> Option<PathBuf> {
    let path = env::current_dir().ok()?.join(".env");
    load_dotenv_from(&path).then_some(path)
}

/// Copy variables from the env file at `path`, returning whether a file was applied.
pub fn load_dotenv_from(path: &Path) -> bool {
    path.is_file() && dotenvy::from_path(path).is_ok()
}

/// Load configuration from `.env` and the process environment.
pub fn init_config() -> Result<Config, ConfigError> {
    load_dotenv();
    let config = Config::from_env()?;
    tracing::debug!(
        api_url = %config.api_url,
        index_id = %config.index_id,
        poll_interval = ?config.poll_interval,
        poll_timeout = ?config.poll_timeout,
        warmup_delay = ?config.warmup_delay,
        server_port = config.server_port,
        "Loaded configuration"
    );
    Ok(config)
}

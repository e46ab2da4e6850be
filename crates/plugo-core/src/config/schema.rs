//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{observability as obv_keys, venv};
use super::loader::{env_bool, env_optional, env_or, env_u64, expand_user, load_dotenv};
use std::path::PathBuf;
use std::time::Duration;

/// Default environment home, relative to the host's working directory.
pub const DEFAULT_VENV_HOME: &str = "./.plugo/venvs";

const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 900;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// Environment store configuration.
#[derive(Debug, Clone)]
pub struct VenvConfig {
    /// Base directory (already `~`-expanded, not yet created)
    pub home: PathBuf,
    /// Explicit interpreter for `python -m venv`
    pub python: Option<String>,
    /// Timeout for venv creation and pip install; `None` waits forever
    pub tool_timeout: Option<Duration>,
    /// Timeout for the site-packages query; `None` waits forever
    pub query_timeout: Option<Duration>,
}

impl VenvConfig {
    /// Load from the environment (loads `.env` first).
    pub fn from_env() -> Self {
        load_dotenv();
        let home = env_or(venv::PLUGO_VENV_HOME, venv::VENV_HOME_ALIASES, || {
            DEFAULT_VENV_HOME.to_string()
        });
        Self {
            home: expand_user(&PathBuf::from(home)),
            python: env_optional(venv::PLUGO_PYTHON, &[]),
            tool_timeout: secs_to_timeout(env_u64(
                venv::PLUGO_TOOL_TIMEOUT_SECS,
                &[],
                DEFAULT_TOOL_TIMEOUT_SECS,
            )),
            query_timeout: secs_to_timeout(env_u64(
                venv::PLUGO_QUERY_TIMEOUT_SECS,
                &[],
                DEFAULT_QUERY_TIMEOUT_SECS,
            )),
        }
    }
}

impl Default for VenvConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DEFAULT_VENV_HOME),
            python: None,
            tool_timeout: secs_to_timeout(DEFAULT_TOOL_TIMEOUT_SECS),
            query_timeout: secs_to_timeout(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }
}

fn secs_to_timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Observability config: quiet, log_level, log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            load_dotenv();
            Self {
                quiet: env_bool(obv_keys::PLUGO_QUIET, &[], false),
                log_level: env_or(obv_keys::PLUGO_LOG_LEVEL, &[], || "plugo=info".to_string()),
                log_json: env_bool(obv_keys::PLUGO_LOG_JSON, &[], false),
            }
        })
    }
}

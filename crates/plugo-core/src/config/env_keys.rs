//! Environment variable keys and their aliases.
//!
//! Primary variables use the `PLUGO_*` prefix; bare legacy names are still honoured.

/// Plugin environment store
pub mod venv {
    /// Base directory holding one environment per key
    pub const PLUGO_VENV_HOME: &str = "PLUGO_VENV_HOME";
    pub const VENV_HOME_ALIASES: &[&str] = &["VENV_HOME"];

    /// Python used to create new environments (defaults to python3/python on PATH)
    pub const PLUGO_PYTHON: &str = "PLUGO_PYTHON";

    /// Upper bound for venv creation and pip install, in seconds. 0 disables it.
    pub const PLUGO_TOOL_TIMEOUT_SECS: &str = "PLUGO_TOOL_TIMEOUT_SECS";

    /// Upper bound for the site-packages query, in seconds. 0 disables it.
    pub const PLUGO_QUERY_TIMEOUT_SECS: &str = "PLUGO_QUERY_TIMEOUT_SECS";
}

/// Observability and logging
pub mod observability {
    pub const PLUGO_QUIET: &str = "PLUGO_QUIET";
    pub const PLUGO_LOG_LEVEL: &str = "PLUGO_LOG_LEVEL";
    pub const PLUGO_LOG_JSON: &str = "PLUGO_LOG_JSON";
}

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from provisioning or querying a plugin environment.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("{tool} exited with {}: {stderr}", exit_label(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} killed: exceeded timeout of {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("python3 or python not found in PATH (set PLUGO_PYTHON)")]
    InterpreterNotFound,

    #[error("cannot create environment base directory {}: {source}", .path.display())]
    BaseDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EnvError>;

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("code {c}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_message() {
        let e = EnvError::ToolFailed {
            tool: "pip install".into(),
            code: Some(1),
            stderr: "No matching distribution".into(),
        };
        assert_eq!(
            e.to_string(),
            "pip install exited with code 1: No matching distribution"
        );
        let killed = EnvError::ToolFailed {
            tool: "venv".into(),
            code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_sub_second_timeout_message() {
        let e = EnvError::Timeout {
            tool: "site query".into(),
            timeout: Duration::from_millis(200),
        };
        assert_eq!(e.to_string(), "site query killed: exceeded timeout of 200ms");
    }
}

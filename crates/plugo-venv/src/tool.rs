//! External environment tools.
//!
//! [`EnvironmentTool`] is the seam between the manager and whatever actually builds
//! environments. [`PythonVenvTool`] drives `python -m venv` and `pip`.

use plugo_core::config::VenvConfig;
use plugo_core::RequirementSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::{EnvError, Result};
use crate::info_log;
use crate::process::run_checked;

/// Creates environments and installs requirements into them.
///
/// Both operations must be idempotent: `install` is re-run on every `ensure`.
pub trait EnvironmentTool: Send + Sync {
    /// Create a fresh environment at `env_dir`.
    fn create(&self, env_dir: &Path) -> Result<()>;

    /// Install `requirements` using the environment's own `interpreter`.
    fn install(&self, interpreter: &Path, requirements: &RequirementSet) -> Result<()>;
}

/// `python -m venv` + `pip install`.
#[derive(Debug, Clone)]
pub struct PythonVenvTool {
    python: PathBuf,
    timeout: Option<Duration>,
}

impl PythonVenvTool {
    pub fn new(python: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            python: python.into(),
            timeout,
        }
    }

    /// Use `PLUGO_PYTHON` if configured, else the first python on PATH.
    pub fn from_config(cfg: &VenvConfig) -> Result<Self> {
        let python = match cfg.python {
            Some(ref p) => PathBuf::from(p),
            None => which_python()?,
        };
        Ok(Self::new(python, cfg.tool_timeout))
    }

    pub fn python(&self) -> &Path {
        &self.python
    }
}

impl EnvironmentTool for PythonVenvTool {
    fn create(&self, env_dir: &Path) -> Result<()> {
        info_log!("Creating environment {}", env_dir.display());
        let mut cmd = Command::new(&self.python);
        cmd.arg("-m").arg("venv").arg(env_dir);
        run_checked(cmd, "venv", self.timeout)?;
        Ok(())
    }

    fn install(&self, interpreter: &Path, requirements: &RequirementSet) -> Result<()> {
        info_log!(
            "Installing {} requirement(s) with {}",
            requirements.len(),
            interpreter.display()
        );
        let mut cmd = Command::new(interpreter);
        cmd.args(["-m", "pip", "install", "-U", "pip"])
            .args(requirements.iter());
        run_checked(cmd, "pip install", self.timeout)?;
        Ok(())
    }
}

fn which_python() -> Result<PathBuf> {
    ["python3", "python"]
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or(EnvError::InterpreterNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_prefers_explicit_python() {
        let cfg = VenvConfig {
            python: Some("/opt/python/bin/python3.12".into()),
            ..VenvConfig::default()
        };
        let tool = PythonVenvTool::from_config(&cfg).unwrap();
        assert_eq!(tool.python(), Path::new("/opt/python/bin/python3.12"));
    }

    #[cfg(unix)]
    #[test]
    fn test_create_failure_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // `false` ignores its arguments and exits 1
        let tool = PythonVenvTool::new("false", Some(Duration::from_secs(10)));
        let err = tool.create(&tmp.path().join("env")).unwrap_err();
        assert!(matches!(err, EnvError::ToolFailed { ref tool, .. } if tool == "venv"));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_passes_upgrade_and_requirements() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("args.txt");
        let fake = tmp.path().join("python");
        std::fs::write(
            &fake,
            format!("#!/bin/sh\necho \"$@\" > '{}'\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tool = PythonVenvTool::new("unused", None);
        let reqs = RequirementSet::new(["rich", "requests>=2"]);
        tool.install(&fake, &reqs).unwrap();

        let args = std::fs::read_to_string(&log).unwrap();
        assert_eq!(args.trim(), "-m pip install -U pip requests>=2 rich");
    }
}

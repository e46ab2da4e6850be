//! Ensure an environment exists for a key and has its requirements installed.
//!
//! One environment per distinct (name, version, requirement set): the first
//! `ensure` pays for creation and installation, later calls (in this process or
//! the next) find the interpreter on disk and only re-run the installer, which
//! reports "already satisfied". Nothing is rolled back on failure: if install
//! fails after create succeeded, the next `ensure` skips creation and retries
//! the install.

use plugo_core::config::VenvConfig;
use plugo_core::{build_key, PluginIdentity, RequirementSet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnvError, Result};
use crate::info_log;
use crate::lock::KeyLock;
use crate::store::EnvironmentStore;
use crate::tool::{EnvironmentTool, PythonVenvTool};

/// Result of [`EnvironmentManager::ensure`]. A view onto on-disk state, rebuilt
/// on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentDescriptor {
    pub key: String,
    pub dir: PathBuf,
    pub interpreter: PathBuf,
}

pub struct EnvironmentManager {
    store: EnvironmentStore,
    tool: Box<dyn EnvironmentTool>,
}

impl EnvironmentManager {
    /// Base directory and Python from `PLUGO_VENV_HOME` / `VENV_HOME` / `PLUGO_PYTHON`.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&VenvConfig::from_env())
    }

    pub fn from_config(cfg: &VenvConfig) -> Result<Self> {
        let tool = PythonVenvTool::from_config(cfg)?;
        Self::with_tool(&cfg.home, tool)
    }

    /// Use `base` (created if missing) and a custom tool.
    pub fn with_tool(
        base: impl AsRef<Path>,
        tool: impl EnvironmentTool + 'static,
    ) -> Result<Self> {
        let base = base.as_ref();
        fs::create_dir_all(base).map_err(|source| EnvError::BaseDir {
            path: base.to_path_buf(),
            source,
        })?;
        Ok(Self {
            store: EnvironmentStore::new(base),
            tool: Box::new(tool),
        })
    }

    pub fn store(&self) -> &EnvironmentStore {
        &self.store
    }

    /// Create the environment for `key` if its interpreter is missing, then
    /// install `requirements` (skipped when empty).
    pub fn ensure(
        &self,
        key: &str,
        requirements: &RequirementSet,
    ) -> Result<EnvironmentDescriptor> {
        let (dir, interpreter) = self.store.locate(key);
        let _lock = KeyLock::acquire(&self.store.lock_path(key))?;

        if interpreter.exists() {
            tracing::debug!(key, "reusing environment {}", dir.display());
        } else {
            self.tool.create(&dir)?;
        }

        if !requirements.is_empty() {
            self.tool.install(&interpreter, requirements)?;
        }

        info_log!("Environment {} ready at {}", key, dir.display());
        Ok(EnvironmentDescriptor {
            key: key.to_string(),
            dir,
            interpreter,
        })
    }

    /// Derive the key for `plugin` and [`ensure`](Self::ensure) it.
    pub fn ensure_plugin(&self, plugin: &PluginIdentity) -> Result<EnvironmentDescriptor> {
        let key = build_key(&plugin.name, plugin.version.as_deref(), &plugin.requirements);
        self.ensure(key.as_str(), &plugin.requirements)
    }
}

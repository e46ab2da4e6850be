//! Splice an environment's site-packages into the host's module search path.
//!
//! Calling [`PathExposer::expose_to_host`] changes what later in-process plugin
//! loads resolve to: the environment's directories go to the front of the
//! process-wide [`ModuleSearchPath`], shadowing same-named host packages.
//! Repeating the call never duplicates entries.

use plugo_core::config::{set_env_var, VenvConfig};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use crate::error::Result;
use crate::info_log;
use crate::manager::EnvironmentDescriptor;
use crate::process::run_checked;

/// Printed by the environment's interpreter: a JSON array of its existing
/// global and user site-packages directories.
pub const SITE_QUERY: &str = r#"import json, os, site
paths = []
gsp = getattr(site, "getsitepackages", None)
paths.extend(gsp() if gsp else [])
usp = getattr(site, "getusersitepackages", None)
if usp:
    paths.append(usp())
print(json.dumps([p for p in paths if isinstance(p, str) and os.path.isdir(p)]))
"#;

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 60;

/// An ordered search path the host resolves modules against.
pub trait HostSearchPath {
    fn contains(&self, dir: &Path) -> bool;

    /// Put `dir` at index 0.
    fn insert_front(&mut self, dir: PathBuf);
}

/// In-memory search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSearchPath {
    entries: Vec<PathBuf>,
}

impl ModuleSearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// The process-wide search path written by [`PathExposer::expose_to_host`].
    ///
    /// Host plugin loaders are expected to lock it and walk [`entries`](Self::entries)
    /// front to back when resolving a module, so exposed environments shadow
    /// host-side packages.
    pub fn global() -> &'static Mutex<ModuleSearchPath> {
        static GLOBAL: OnceLock<Mutex<ModuleSearchPath>> = OnceLock::new();
        GLOBAL.get_or_init(|| Mutex::new(ModuleSearchPath::new()))
    }
}

impl HostSearchPath for ModuleSearchPath {
    fn contains(&self, dir: &Path) -> bool {
        self.entries.iter().any(|e| e == dir)
    }

    fn insert_front(&mut self, dir: PathBuf) {
        self.entries.insert(0, dir);
    }
}

/// Search path stored in a path-list environment variable such as `PYTHONPATH`,
/// inherited by interpreters the host spawns afterwards.
#[derive(Debug, Clone)]
pub struct EnvVarSearchPath {
    var: String,
}

impl EnvVarSearchPath {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn pythonpath() -> Self {
        Self::new("PYTHONPATH")
    }

    pub fn entries(&self) -> Vec<PathBuf> {
        std::env::var_os(&self.var)
            .map(|v| {
                std::env::split_paths(&v)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl HostSearchPath for EnvVarSearchPath {
    fn contains(&self, dir: &Path) -> bool {
        self.entries().iter().any(|e| e == dir)
    }

    fn insert_front(&mut self, dir: PathBuf) {
        let all: Vec<PathBuf> = std::iter::once(dir).chain(self.entries()).collect();
        match std::env::join_paths(&all).map(OsString::into_string) {
            Ok(Ok(joined)) => set_env_var(&self.var, &joined),
            Ok(Err(_)) => {
                tracing::warn!(var = %self.var, "search path is not valid UTF-8, left unchanged")
            }
            Err(e) => tracing::warn!(var = %self.var, "cannot join search path: {}", e),
        }
    }
}

/// Insert every dir in `dirs` not already in `host` at the front, one after
/// another, so the last new dir ends up first. Returns how many were added.
pub fn splice_dirs(host: &mut dyn HostSearchPath, dirs: &[PathBuf]) -> usize {
    let mut added = 0;
    for dir in dirs {
        if dir.as_os_str().is_empty() || host.contains(dir) {
            continue;
        }
        host.insert_front(dir.clone());
        added += 1;
    }
    added
}

/// Asks an environment's interpreter for its site dirs and splices them into a host path.
#[derive(Debug, Clone)]
pub struct PathExposer {
    timeout: Option<Duration>,
}

impl Default for PathExposer {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)))
    }
}

impl PathExposer {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn from_config(cfg: &VenvConfig) -> Self {
        Self::new(cfg.query_timeout)
    }

    /// Run [`SITE_QUERY`] in the environment. `Ok(None)` when the output is not
    /// a JSON array of strings.
    pub fn query_site_dirs(&self, env: &EnvironmentDescriptor) -> Result<Option<Vec<PathBuf>>> {
        let mut cmd = Command::new(&env.interpreter);
        cmd.arg("-c").arg(SITE_QUERY);
        let out = run_checked(cmd, "site query", self.timeout)?;
        let raw = out.stdout.trim();
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(paths) => Ok(Some(paths.into_iter().map(PathBuf::from).collect())),
            Err(e) => {
                tracing::debug!(
                    key = %env.key,
                    output = raw,
                    "ignoring malformed site query output: {}",
                    e
                );
                Ok(None)
            }
        }
    }

    /// Splice `env`'s site dirs into `host`. Malformed query output changes nothing.
    pub fn expose_to(
        &self,
        env: &EnvironmentDescriptor,
        host: &mut dyn HostSearchPath,
    ) -> Result<()> {
        let Some(dirs) = self.query_site_dirs(env)? else {
            return Ok(());
        };
        let added = splice_dirs(host, &dirs);
        if added > 0 {
            info_log!("Exposed {} site dir(s) from {}", added, env.key);
        }
        Ok(())
    }

    /// [`expose_to`](Self::expose_to) the process-wide [`ModuleSearchPath::global`].
    pub fn expose_to_host(&self, env: &EnvironmentDescriptor) -> Result<()> {
        let Some(dirs) = self.query_site_dirs(env)? else {
            return Ok(());
        };
        let mut host = ModuleSearchPath::global()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        splice_dirs(&mut *host, &dirs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_inserts_each_dir_at_front_once() {
        let mut host = ModuleSearchPath::from_entries(vec![PathBuf::from("/host/lib")]);
        let dirs = vec![
            PathBuf::from("/env/site"),
            PathBuf::from("/host/lib"),
            PathBuf::from("/env/user"),
            PathBuf::from("/env/site"),
            PathBuf::new(),
        ];
        assert_eq!(splice_dirs(&mut host, &dirs), 2);
        assert_eq!(
            host.entries(),
            &[
                PathBuf::from("/env/user"),
                PathBuf::from("/env/site"),
                PathBuf::from("/host/lib"),
            ]
        );
        assert_eq!(splice_dirs(&mut host, &dirs), 0);
        assert_eq!(host.entries().len(), 3);
    }

    #[test]
    fn test_env_var_search_path() {
        let var = "PLUGO_TEST_SEARCH_PATH";
        set_env_var(var, "/already/here");
        let mut host = EnvVarSearchPath::new(var);
        let dirs = vec![
            PathBuf::from("/env/site"),
            PathBuf::from("/already/here"),
            PathBuf::from("/env/user"),
        ];
        assert_eq!(splice_dirs(&mut host, &dirs), 2);
        assert_eq!(
            host.entries(),
            vec![
                PathBuf::from("/env/user"),
                PathBuf::from("/env/site"),
                PathBuf::from("/already/here"),
            ]
        );
        assert_eq!(splice_dirs(&mut host, &dirs), 0);
        plugo_core::config::remove_env_var(var);
        assert!(host.entries().is_empty());
    }

    #[cfg(unix)]
    mod with_fake_interpreter {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Descriptor whose interpreter is a shell script printing `stdout`.
        fn fake_env(root: &Path, stdout: &str) -> EnvironmentDescriptor {
            let dir = root.join("demo-0123456789ab");
            let interpreter = dir.join("bin").join("python");
            std::fs::create_dir_all(interpreter.parent().unwrap()).unwrap();
            let script = format!("#!/bin/sh\ncat <<'EOF'\n{stdout}\nEOF\n");
            std::fs::write(&interpreter, script).unwrap();
            std::fs::set_permissions(&interpreter, std::fs::Permissions::from_mode(0o755)).unwrap();
            EnvironmentDescriptor {
                key: "demo-0123456789ab".into(),
                dir,
                interpreter,
            }
        }

        #[test]
        fn test_expose_inserts_site_dirs_once() {
            let tmp = tempfile::tempdir().unwrap();
            let site = tmp.path().join("site-packages");
            std::fs::create_dir_all(&site).unwrap();
            let listing = serde_json::to_string(&[site.to_str().unwrap()]).unwrap();
            let env = fake_env(tmp.path(), &listing);

            let exposer = PathExposer::default();
            let mut host = ModuleSearchPath::from_entries(vec![PathBuf::from("/host/lib")]);
            exposer.expose_to(&env, &mut host).unwrap();
            assert_eq!(host.entries(), &[site.clone(), PathBuf::from("/host/lib")]);

            exposer.expose_to(&env, &mut host).unwrap();
            assert_eq!(host.entries().len(), 2);
        }

        #[test]
        fn test_malformed_output_is_ignored() {
            let tmp = tempfile::tempdir().unwrap();
            let env = fake_env(tmp.path(), "Traceback (most recent call last):");
            let exposer = PathExposer::default();

            assert_eq!(exposer.query_site_dirs(&env).unwrap(), None);
            let mut host = ModuleSearchPath::new();
            exposer.expose_to(&env, &mut host).unwrap();
            assert!(host.entries().is_empty());
        }

        #[test]
        fn test_expose_to_host_uses_global_path() {
            let tmp = tempfile::tempdir().unwrap();
            let site = tmp.path().join("lib").join("site-packages");
            std::fs::create_dir_all(&site).unwrap();
            let listing = serde_json::to_string(&[site.to_str().unwrap()]).unwrap();
            let env = fake_env(tmp.path(), &listing);

            let exposer = PathExposer::default();
            exposer.expose_to_host(&env).unwrap();
            exposer.expose_to_host(&env).unwrap();

            let global = ModuleSearchPath::global().lock().unwrap();
            assert_eq!(global.entries().iter().filter(|e| **e == site).count(), 1);
            assert_eq!(global.entries().first(), Some(&site));
        }
    }
}

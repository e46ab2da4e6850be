//! Per-plugin isolated Python environments.
//!
//! [`EnvironmentManager::ensure`] creates or reuses the environment for a key and
//! installs its requirements; [`PathExposer`] splices that environment's
//! site-packages into a host search path.

pub mod error;
pub mod expose;
pub mod lock;
pub mod log;
pub mod manager;
pub mod process;
pub mod store;
pub mod tool;

pub use error::{EnvError, Result};
pub use expose::{EnvVarSearchPath, HostSearchPath, ModuleSearchPath, PathExposer};
pub use manager::{EnvironmentDescriptor, EnvironmentManager};
pub use store::EnvironmentStore;
pub use tool::{EnvironmentTool, PythonVenvTool};

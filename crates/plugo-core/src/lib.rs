pub mod config;
pub mod key;

pub use key::{build_key, sanitize_segment, EnvironmentKey, PluginIdentity, RequirementSet};

//! Plugo unified config layer.
//!
//! All environment-variable reads live here; the rest of the workspace reads
//! structured config instead of calling `std::env::var` directly.
//!
//! - `loader`: env_or, env_optional, env_bool, env_u64 helpers
//! - `schema`: VenvConfig, ObservabilityConfig
//! - `env_keys`: key constants (with legacy aliases)

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{
    env_bool, env_optional, env_or, env_u64, expand_user, load_dotenv, remove_env_var,
    set_env_var,
};
pub use schema::{ObservabilityConfig, VenvConfig};

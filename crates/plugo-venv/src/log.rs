//! Progress messages for provisioning, muted by `PLUGO_QUIET`.
//!
//! Warnings and errors bypass this and go straight to `tracing`.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    plugo_core::config::ObservabilityConfig::from_env().quiet
}

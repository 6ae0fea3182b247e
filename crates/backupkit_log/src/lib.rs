//! `backupkit_log` v1:
//! Logging bootstrap shared by backupkit binaries.
//!
//! Diagnostics go to stderr through `tracing-subscriber`; `RUST_LOG` overrides
//! the level chosen by the caller.

use tracing_subscriber::EnvFilter;

/// Default level when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumLogLevel {
    /// Unrecoverable problems only.
    #[default]
    Error,
    /// Recovered failures (rules-file diagnostics, per-item copy errors).
    Warn,
    /// Run start/end summaries.
    Info,
    /// Per-directory and per-rule decisions.
    Debug,
}

impl EnumLogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

/// Build the filter: `RUST_LOG` when set and valid, otherwise `level`.
pub fn build_env_filter(level: EnumLogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_directive()))
}

/// Install the global stderr subscriber.
///
/// Returns `false` when a subscriber was already installed (e.g. by a test
/// harness); logging then keeps the existing configuration.
pub fn init_logging(level: EnumLogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

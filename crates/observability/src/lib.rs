//! Process-wide logging setup.

/// Tracing subscriber configuration.
pub mod tracing;

pub use tracing::LogFormat;

/// Initialize process-wide tracing from the environment.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}

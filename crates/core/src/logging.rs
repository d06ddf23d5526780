//! Logging initialization and configuration.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging system with tracing.
///
/// Filtering is environment-based (RUST_LOG); without it, framework crates
/// log at debug and everything else at info.
///
/// # Example
/// ```
/// vks_core::init_logging();
/// tracing::info!("Sample starting");
/// ```
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vks_rhi=debug,vks_framework=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

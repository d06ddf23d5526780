//! Error types shared across the framework.

use thiserror::Error;

/// Framework-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Vulkan errors surfaced through platform code
    #[error("Vulkan error: {0}")]
    Vulkan(String),

    /// Configuration loading or validation errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the framework's Error type.
pub type Result<T> = std::result::Result<T, Error>;

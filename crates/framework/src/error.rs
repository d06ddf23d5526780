//! Framework error type.

use thiserror::Error;

/// Errors surfaced by the framework layer.
///
/// Backend errors stay fatal: the frame driver propagates them out of the
/// event loop and the sample terminates.
#[derive(Error, Debug)]
pub enum FrameworkError {
    /// Backend (device, surface, swapchain) error
    #[error(transparent)]
    Rhi(#[from] vks_rhi::RhiError),

    /// Platform or configuration error
    #[error(transparent)]
    Core(#[from] vks_core::Error),

    /// GUI overlay error
    #[error("GUI error: {0}")]
    Gui(String),
}

/// Result type alias for framework operations.
pub type FrameworkResult<T> = std::result::Result<T, FrameworkError>;

//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
///
/// All variants are fatal to a running sample: a failed backend call leaves
/// the swapchain or device in a state the frame loop cannot recover from, so
/// errors propagate out and terminate the sample with the native error code.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error from a device or swapchain operation
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load the Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    Allocation(#[from] gpu_allocator::AllocationError),

    /// The per-frame surface capability query failed. Indicates a broken
    /// device/surface pairing; never retried.
    #[error("Surface capability query failed: {0}")]
    SurfaceQuery(ash::vk::Result),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Swapchain creation or recreation error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Shader module loading error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Buffer creation or upload error
    #[error("Buffer error: {0}")]
    Buffer(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

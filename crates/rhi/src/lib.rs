//! Vulkan abstraction layer for the sample framework.
//!
//! This crate provides a safe abstraction over Vulkan using the `ash` crate:
//! - Instance and device creation
//! - Surface capability snapshots
//! - Swapchain management with explicit pre-transform state
//! - Command buffer recording
//! - Buffers, shaders and pipelines for sample content
//! - Synchronization primitives

mod error;

pub mod buffer;
pub mod command;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need.
pub use ash::vk;

//! Sample framework.
//!
//! This crate ties the platform and RHI layers into a reusable base for
//! Vulkan samples:
//! - [`RenderContext`]: surface, swapchain and per-frame machinery
//! - [`Sample`] + [`run_sample`]: the capability set a sample implements
//!   and the frame driver that runs it
//! - [`Gui`]: immediate-mode overlay
//! - [`stats`]: frame statistics for the overlay
//! - [`graph`]: scene-state-to-visualization-node converters for debugging

mod error;

pub mod context;
pub mod graph;
pub mod gui;
pub mod sample;
pub mod stats;

pub use context::RenderContext;
pub use error::{FrameworkError, FrameworkResult};
pub use gui::Gui;
pub use sample::{run_sample, Sample};

/// Number of frames recorded concurrently by the frame driver.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

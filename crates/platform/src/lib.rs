//! Platform abstraction layer for the sample framework.
//!
//! This crate provides:
//! - Window management via winit
//! - Vulkan surface creation and ownership
//! - Keyboard and mouse state tracking

mod input;
mod window;

pub use input::{InputState, MouseButton};
pub use window::{Surface, Window};

// Re-export the winit key codes used by samples.
pub use winit::keyboard::KeyCode;

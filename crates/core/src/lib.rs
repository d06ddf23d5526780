//! Core utilities for the sample framework.
//!
//! This crate provides the foundational pieces shared by every sample:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing
//! - Sample configuration

mod config;
mod error;
mod logging;
mod timer;

pub use config::{Config, WindowConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::FrameClock;

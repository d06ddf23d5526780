//! Surface capability snapshots.
//!
//! The presentation backend reports the physical surface state (current
//! extent, current transform, supported transforms) through
//! `vkGetPhysicalDeviceSurfaceCapabilitiesKHR`. Rotation handling queries
//! this snapshot every frame: on some platforms an orientation change
//! updates `current_transform` without any accompanying window resize event,
//! so cached values would go stale.

use ash::vk;

use crate::error::{RhiError, RhiResult};

/// Read-only snapshot of the physical surface state.
///
/// Queried fresh each frame; never cached across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceProperties {
    /// Current surface extent in physical pixels.
    pub current_extent: vk::Extent2D,
    /// The transform currently applied by the presentation engine.
    pub current_transform: vk::SurfaceTransformFlagsKHR,
    /// All transforms the presentation engine supports.
    pub supported_transforms: vk::SurfaceTransformFlagsKHR,
}

impl SurfaceProperties {
    /// Queries the current surface state from the presentation backend.
    ///
    /// Safe to call every frame; has no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SurfaceQuery`] if the backend call fails. This is
    /// fatal: a failing capability query means the device/surface pairing is
    /// broken and the sample cannot continue.
    pub fn query(
        surface_loader: &ash::khr::surface::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(RhiError::SurfaceQuery)?
        };

        Ok(Self::from_capabilities(&capabilities))
    }

    /// Extracts the snapshot fields from raw surface capabilities.
    pub fn from_capabilities(capabilities: &vk::SurfaceCapabilitiesKHR) -> Self {
        Self {
            current_extent: capabilities.current_extent,
            current_transform: capabilities.current_transform,
            supported_transforms: capabilities.supported_transforms,
        }
    }

    /// Whether the presentation engine supports the given transform.
    pub fn supports(&self, transform: vk::SurfaceTransformFlagsKHR) -> bool {
        self.supported_transforms.contains(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_capabilities_copies_the_relevant_fields() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1080,
                height: 1920,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::ROTATE_90,
            supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY
                | vk::SurfaceTransformFlagsKHR::ROTATE_90
                | vk::SurfaceTransformFlagsKHR::ROTATE_180
                | vk::SurfaceTransformFlagsKHR::ROTATE_270,
            ..Default::default()
        };

        let properties = SurfaceProperties::from_capabilities(&capabilities);
        assert_eq!(properties.current_extent.width, 1080);
        assert_eq!(
            properties.current_transform,
            vk::SurfaceTransformFlagsKHR::ROTATE_90
        );
    }

    #[test]
    fn supports_checks_the_capability_mask() {
        let properties = SurfaceProperties {
            current_extent: vk::Extent2D {
                width: 640,
                height: 480,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY
                | vk::SurfaceTransformFlagsKHR::ROTATE_180,
        };

        assert!(properties.supports(vk::SurfaceTransformFlagsKHR::IDENTITY));
        assert!(properties.supports(vk::SurfaceTransformFlagsKHR::ROTATE_180));
        assert!(!properties.supports(vk::SurfaceTransformFlagsKHR::ROTATE_90));
        assert!(!properties.supports(vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR));
    }
}

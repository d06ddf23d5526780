//! Physical device selection.
//!
//! Picks a GPU that can render and present to the sample's surface.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info};

use crate::error::{RhiError, RhiResult};

/// Queue family indices required by the framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueFamilyIndices {
    /// Family supporting graphics operations.
    pub graphics: Option<u32>,
    /// Family supporting presentation to the surface.
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// True when both required families were found.
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// The distinct family indices, for queue creation.
    pub fn unique(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [self.graphics, self.present].iter().flatten().copied().collect();
        families.sort_unstable();
        families.dedup();
        families
    }
}

/// A selected physical device and its queue families.
pub struct GpuInfo {
    /// Physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, type, limits).
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue families resolved against the target surface.
    pub queue_families: QueueFamilyIndices,
}

impl GpuInfo {
    /// The device name as reported by the driver.
    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }
}

/// Selects a physical device that supports graphics, presentation to the
/// given surface and the swapchain extension.
///
/// Discrete GPUs are preferred over integrated ones.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] when no device qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<GpuInfo> {
    let devices = unsafe { instance.enumerate_physical_devices()? };
    debug!("Found {} physical device(s)", devices.len());

    let mut best: Option<(u32, GpuInfo)> = None;

    for device in devices {
        let properties = unsafe { instance.get_physical_device_properties(device) };

        let Some(queue_families) = find_queue_families(instance, device, surface, surface_loader)?
        else {
            continue;
        };

        if !supports_swapchain_extension(instance, device)? {
            continue;
        }

        let score = device_type_score(properties.device_type);
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((
                score,
                GpuInfo {
                    device,
                    properties,
                    queue_families,
                },
            ));
        }
    }

    let (_, info) = best.ok_or(RhiError::NoSuitableGpu)?;
    info!(
        "Selected GPU: {} (graphics family {}, present family {})",
        info.name(),
        info.queue_families.graphics.unwrap_or(u32::MAX),
        info.queue_families.present.unwrap_or(u32::MAX),
    );
    Ok(info)
}

fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<Option<QueueFamilyIndices>> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut indices = QueueFamilyIndices::default();

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(index);
        }

        if indices.present.is_none() {
            let supported = unsafe {
                surface_loader.get_physical_device_surface_support(device, index, surface)?
            };
            if supported {
                indices.present = Some(index);
            }
        }

        if indices.is_complete() {
            return Ok(Some(indices));
        }
    }

    Ok(None)
}

fn supports_swapchain_extension(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> RhiResult<bool> {
    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };

    Ok(extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name == ash::khr::swapchain::NAME
    }))
}

fn device_type_score(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 3,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_indices_report_incomplete() {
        let indices = QueueFamilyIndices {
            graphics: Some(0),
            present: None,
        };
        assert!(!indices.is_complete());
    }

    #[test]
    fn unique_collapses_shared_family() {
        let shared = QueueFamilyIndices {
            graphics: Some(1),
            present: Some(1),
        };
        assert_eq!(shared.unique(), vec![1]);

        let split = QueueFamilyIndices {
            graphics: Some(2),
            present: Some(0),
        };
        assert_eq!(split.unique(), vec![0, 2]);
    }

    #[test]
    fn discrete_gpus_outrank_everything_else() {
        assert!(
            device_type_score(vk::PhysicalDeviceType::DISCRETE_GPU)
                > device_type_score(vk::PhysicalDeviceType::INTEGRATED_GPU)
        );
        assert!(
            device_type_score(vk::PhysicalDeviceType::INTEGRATED_GPU)
                > device_type_score(vk::PhysicalDeviceType::CPU)
        );
    }
}

//! Swapchain management.
//!
//! The [`Swapchain`] owns the presentable images together with the two
//! attributes rotation handling cares about: the image extent and the
//! pre-transform declared to the presentation engine. Both are fixed at
//! creation and only change through [`Swapchain::rebuild`], which replaces
//! the swapchain in place.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// Everything the surface reports that influences swapchain creation.
pub struct SurfaceSupport {
    /// Surface capabilities (image counts, extents, transforms).
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Queries surface support for a physical device.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the backend queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };
        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };
        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// True when the surface can be rendered to at all.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Result of building a swapchain, before it is wrapped or swapped in.
struct SwapchainState {
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    transform: vk::SurfaceTransformFlagsKHR,
    present_mode: vk::PresentModeKHR,
}

/// Vulkan swapchain wrapper with explicit extent/transform state.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    surface_loader: ash::khr::surface::Instance,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    transform: vk::SurfaceTransformFlagsKHR,
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a swapchain for the given surface.
    ///
    /// The initial pre-transform is the surface's current transform, which
    /// is what the presentation engine applies anyway until a sample selects
    /// a policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface is unusable or creation fails.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        let state = build_swapchain(
            &device,
            &swapchain_loader,
            &surface_loader,
            surface,
            extent,
            None,
            vk::SwapchainKHR::null(),
        )?;

        Ok(Self {
            device,
            swapchain_loader,
            surface_loader,
            handle: state.handle,
            images: state.images,
            image_views: state.image_views,
            format: state.format,
            extent: state.extent,
            transform: state.transform,
            present_mode: state.present_mode,
        })
    }

    /// Rebuilds the swapchain in place with a new extent and pre-transform.
    ///
    /// The old swapchain is passed as `old_swapchain` so the driver can
    /// recycle its images, then destroyed. Rebuilding with the values the
    /// swapchain already has produces an observably identical swapchain.
    ///
    /// The caller must ensure no GPU work still references the current
    /// swapchain images (a device-idle wait) before calling this.
    ///
    /// # Errors
    ///
    /// Returns an error if recreation fails; the swapchain is left
    /// unusable in that case and the sample must terminate.
    pub fn rebuild(
        &mut self,
        surface: vk::SurfaceKHR,
        extent: vk::Extent2D,
        transform: vk::SurfaceTransformFlagsKHR,
    ) -> RhiResult<()> {
        self.destroy_image_views();

        let old_handle = self.handle;
        let state = build_swapchain(
            &self.device,
            &self.swapchain_loader,
            &self.surface_loader,
            surface,
            extent,
            Some(transform),
            old_handle,
        )?;

        unsafe {
            self.swapchain_loader.destroy_swapchain(old_handle, None);
        }

        self.handle = state.handle;
        self.images = state.images;
        self.image_views = state.image_views;
        self.format = state.format;
        self.extent = state.extent;
        self.transform = state.transform;
        self.present_mode = state.present_mode;

        info!(
            "Swapchain rebuilt: {}x{}, transform {:?}",
            self.extent.width, self.extent.height, self.transform
        );

        Ok(())
    }

    /// Acquires the next swapchain image.
    ///
    /// Returns `(image_index, suboptimal)`. An `ERROR_OUT_OF_DATE_KHR`
    /// result means the caller must rebuild before rendering.
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<(u32, bool), vk::Result> {
        unsafe {
            self.swapchain_loader.acquire_next_image(
                self.handle,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    /// Presents the given image, waiting on `wait_semaphore`.
    ///
    /// Returns true when the swapchain is suboptimal for the surface.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let swapchains = [self.handle];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }

    /// The swapchain image extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// The pre-transform declared to the presentation engine.
    #[inline]
    pub fn transform(&self) -> vk::SurfaceTransformFlagsKHR {
        self.transform
    }

    /// The swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// The present mode in use.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// The swapchain image at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image(&self, index: usize) -> vk::Image {
        self.images[index]
    }

    /// The image view at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn image_view(&self, index: usize) -> vk::ImageView {
        self.image_views[index]
    }

    fn destroy_image_views(&mut self) {
        for &view in &self.image_views {
            unsafe {
                self.device.handle().destroy_image_view(view, None);
            }
        }
        self.image_views.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();
        unsafe {
            self.swapchain_loader.destroy_swapchain(self.handle, None);
        }
        debug!(
            "Swapchain destroyed ({}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

fn build_swapchain(
    device: &Arc<Device>,
    swapchain_loader: &ash::khr::swapchain::Device,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    requested_extent: vk::Extent2D,
    requested_transform: Option<vk::SurfaceTransformFlagsKHR>,
    old_swapchain: vk::SwapchainKHR,
) -> RhiResult<SwapchainState> {
    let support = SurfaceSupport::query(device.physical_device(), surface, surface_loader)?;

    if !support.is_adequate() {
        return Err(RhiError::Swapchain(
            "surface reports no formats or present modes".to_string(),
        ));
    }

    let surface_format = choose_surface_format(&support.formats);
    let present_mode = choose_present_mode(&support.present_modes);
    let extent = resolve_extent(&support.capabilities, requested_extent);
    let transform = resolve_pre_transform(requested_transform, &support.capabilities);
    let image_count = select_image_count(&support.capabilities);

    debug!(
        "Creating swapchain: {}x{}, {:?}, {:?}, transform {:?}, {} images",
        extent.width, extent.height, surface_format.format, present_mode, transform, image_count
    );

    let queue_families = device.queue_families();
    let family_indices = queue_families.unique();
    let (sharing_mode, family_indices_slice) = if family_indices.len() > 1 {
        (vk::SharingMode::CONCURRENT, family_indices.as_slice())
    } else {
        (vk::SharingMode::EXCLUSIVE, &[][..])
    };

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(family_indices_slice)
        .pre_transform(transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let handle = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };
    let images = unsafe { swapchain_loader.get_swapchain_images(handle)? };
    let image_views = create_image_views(device, &images, surface_format.format)?;

    Ok(SwapchainState {
        handle,
        images,
        image_views,
        format: surface_format.format,
        extent,
        transform,
        present_mode,
    })
}

/// Picks B8G8R8A8_SRGB / SRGB_NONLINEAR when available, otherwise the first
/// reported format.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .copied()
        .unwrap_or_else(|| {
            warn!("Preferred surface format unavailable, using {:?}", formats[0].format);
            formats[0]
        })
}

/// Prefers MAILBOX, falling back to the always-available FIFO.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// Resolves the swapchain extent: the surface's fixed extent when it has
/// one, otherwise the requested size clamped to the surface limits.
fn resolve_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// Resolves the pre-transform for swapchain creation.
///
/// A requested transform is honored only when the presentation engine
/// supports it; otherwise the surface's current transform is used. Unknown
/// or unsupported transform bits therefore never abort rendering.
fn resolve_pre_transform(
    requested: Option<vk::SurfaceTransformFlagsKHR>,
    capabilities: &vk::SurfaceCapabilitiesKHR,
) -> vk::SurfaceTransformFlagsKHR {
    match requested {
        Some(transform) if capabilities.supported_transforms.contains(transform) => transform,
        Some(transform) => {
            warn!(
                "Transform {:?} not supported by the surface, using {:?}",
                transform, capabilities.current_transform
            );
            capabilities.current_transform
        }
        None => capabilities.current_transform,
    }
}

/// One image more than the minimum, capped by the surface maximum.
fn select_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut views = Vec::with_capacity(images.len());

    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .level_count(1)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&create_info, None)? };
        views.push(view);
    }

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities_with_transforms(
        current: vk::SurfaceTransformFlagsKHR,
        supported: vk::SurfaceTransformFlagsKHR,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_transform: current,
            supported_transforms: supported,
            ..Default::default()
        }
    }

    #[test]
    fn requested_transform_honored_when_supported() {
        let capabilities = capabilities_with_transforms(
            vk::SurfaceTransformFlagsKHR::ROTATE_90,
            vk::SurfaceTransformFlagsKHR::IDENTITY | vk::SurfaceTransformFlagsKHR::ROTATE_90,
        );

        let resolved = resolve_pre_transform(
            Some(vk::SurfaceTransformFlagsKHR::IDENTITY),
            &capabilities,
        );
        assert_eq!(resolved, vk::SurfaceTransformFlagsKHR::IDENTITY);
    }

    #[test]
    fn unsupported_transform_falls_back_to_current() {
        let capabilities = capabilities_with_transforms(
            vk::SurfaceTransformFlagsKHR::ROTATE_180,
            vk::SurfaceTransformFlagsKHR::IDENTITY | vk::SurfaceTransformFlagsKHR::ROTATE_180,
        );

        let resolved = resolve_pre_transform(
            Some(vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR),
            &capabilities,
        );
        assert_eq!(resolved, vk::SurfaceTransformFlagsKHR::ROTATE_180);
    }

    #[test]
    fn no_request_uses_current_transform() {
        let capabilities = capabilities_with_transforms(
            vk::SurfaceTransformFlagsKHR::ROTATE_270,
            vk::SurfaceTransformFlagsKHR::ROTATE_270,
        );

        let resolved = resolve_pre_transform(None, &capabilities);
        assert_eq!(resolved, vk::SurfaceTransformFlagsKHR::ROTATE_270);
    }

    #[test]
    fn resolve_pre_transform_is_deterministic() {
        let capabilities = capabilities_with_transforms(
            vk::SurfaceTransformFlagsKHR::ROTATE_90,
            vk::SurfaceTransformFlagsKHR::IDENTITY | vk::SurfaceTransformFlagsKHR::ROTATE_90,
        );

        let request = Some(vk::SurfaceTransformFlagsKHR::ROTATE_90);
        let first = resolve_pre_transform(request, &capabilities);
        let second = resolve_pre_transform(request, &capabilities);
        assert_eq!(first, second);
    }

    #[test]
    fn srgb_format_preferred() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_SRGB
        );

        let fallback_only = [vk::SurfaceFormatKHR {
            format: vk::Format::R8G8B8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert_eq!(
            choose_surface_format(&fallback_only).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);

        let with_mailbox = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&with_mailbox),
            vk::PresentModeKHR::MAILBOX
        );
    }

    #[test]
    fn fixed_surface_extent_wins_over_request() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };

        let resolved = resolve_extent(
            &capabilities,
            vk::Extent2D {
                width: 640,
                height: 480,
            },
        );
        assert_eq!(resolved.width, 1920);
        assert_eq!(resolved.height, 1080);
    }

    #[test]
    fn requested_extent_is_clamped() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 200,
                height: 200,
            },
            max_image_extent: vk::Extent2D {
                width: 1600,
                height: 1600,
            },
            ..Default::default()
        };

        let too_big = resolve_extent(
            &capabilities,
            vk::Extent2D {
                width: 4000,
                height: 4000,
            },
        );
        assert_eq!(too_big.width, 1600);

        let too_small = resolve_extent(
            &capabilities,
            vk::Extent2D {
                width: 10,
                height: 10,
            },
        );
        assert_eq!(too_small.height, 200);
    }

    #[test]
    fn image_count_respects_surface_maximum() {
        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(select_image_count(&capped), 2);

        let unlimited = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(select_image_count(&unlimited), 3);
    }
}

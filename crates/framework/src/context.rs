//! Render context: surface, swapchain and per-frame machinery.
//!
//! The context is owned exclusively by the frame driver; samples receive a
//! reference per call. It exposes the swapchain's `{extent, transform}`
//! state, the per-frame surface capability query, and the recreation entry
//! point used both by the ordinary resize path and by rotation handling.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use vks_platform::Surface;
use vks_rhi::command::{CommandBuffer, CommandPool};
use vks_rhi::device::Device;
use vks_rhi::instance::Instance;
use vks_rhi::surface::SurfaceProperties;
use vks_rhi::swapchain::Swapchain;
use vks_rhi::sync::{Fence, Semaphore};
use vks_rhi::{RhiError, RhiResult};

use crate::error::FrameworkResult;
use crate::MAX_FRAMES_IN_FLIGHT;

/// Per-frame-slot resources.
struct FrameSlot {
    command_buffer: CommandBuffer,
    /// Signaled when the acquired image is ready to be rendered to.
    image_available: Semaphore,
    /// Signaled when this slot's previous submission has completed.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>, pool: &CommandPool) -> RhiResult<Self> {
        Ok(Self {
            command_buffer: CommandBuffer::new(device.clone(), pool)?,
            image_available: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device, true)?,
        })
    }
}

/// Owns the presentation state of a running sample.
pub struct RenderContext {
    // Field order is drop order: GPU resources before the surface, the
    // device reference last.
    frames: Vec<FrameSlot>,
    /// Render-finished semaphores, one per swapchain image.
    render_finished: Vec<Semaphore>,
    command_pool: CommandPool,
    swapchain: Swapchain,
    surface: Surface,
    device: Arc<Device>,

    current_frame: usize,
    image_index: u32,
    /// Last extent the swapchain was built against. The rotation detector
    /// compares freshly queried surface extents against this value.
    surface_extent: vk::Extent2D,
    /// Pre-transform selected by the sample for the next rebuild/acquire.
    pre_transform: vk::SurfaceTransformFlagsKHR,
    /// Extent from a window resize event, consumed at the next begin_frame.
    pending_resize: Option<vk::Extent2D>,
}

impl RenderContext {
    /// Creates the render context for a surface.
    ///
    /// # Errors
    ///
    /// Returns an error if swapchain or per-frame resource creation fails.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: Surface,
        extent: vk::Extent2D,
    ) -> FrameworkResult<Self> {
        let swapchain = Swapchain::new(instance, device.clone(), surface.handle(), extent)?;

        let graphics_family = device
            .queue_families()
            .graphics
            .ok_or(RhiError::NoSuitableGpu)?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let mut frames = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            frames.push(FrameSlot::new(device.clone(), &command_pool)?);
        }

        let render_finished = Self::create_image_semaphores(&device, swapchain.image_count())?;

        let surface_extent = swapchain.extent();
        let pre_transform = swapchain.transform();

        info!(
            "Render context ready: {}x{}, {} swapchain images, {} frames in flight",
            surface_extent.width,
            surface_extent.height,
            swapchain.image_count(),
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            frames,
            render_finished,
            command_pool,
            swapchain,
            surface,
            device,
            current_frame: 0,
            image_index: 0,
            surface_extent,
            pre_transform,
            pending_resize: None,
        })
    }

    fn create_image_semaphores(device: &Arc<Device>, count: usize) -> RhiResult<Vec<Semaphore>> {
        (0..count).map(|_| Semaphore::new(device.clone())).collect()
    }

    /// The logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// The swapchain, exposing the active `{extent, transform}` state.
    #[inline]
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// The command pool frame command buffers come from.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }

    /// The last extent the swapchain was built against.
    #[inline]
    pub fn surface_extent(&self) -> vk::Extent2D {
        self.surface_extent
    }

    /// The pre-transform selected for the next rebuild.
    #[inline]
    pub fn pre_transform(&self) -> vk::SurfaceTransformFlagsKHR {
        self.pre_transform
    }

    /// Selects the pre-transform used the next time the swapchain is built
    /// (ordinary resize path or out-of-date recovery).
    ///
    /// Samples call this every frame, before the frame begins.
    pub fn set_pre_transform(&mut self, transform: vk::SurfaceTransformFlagsKHR) {
        self.pre_transform = transform;
    }

    /// Queries a fresh snapshot of the physical surface state.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SurfaceQuery`] on backend failure; fatal.
    pub fn surface_properties(&self) -> RhiResult<SurfaceProperties> {
        SurfaceProperties::query(
            self.surface.loader(),
            self.device.physical_device(),
            self.surface.handle(),
        )
    }

    /// Records a window resize; the swapchain is rebuilt at the next
    /// `begin_frame` using the stored pre-transform.
    pub fn request_resize(&mut self, extent: vk::Extent2D) {
        self.pending_resize = Some(extent);
    }

    /// Rebuilds the swapchain with the given extent and pre-transform.
    ///
    /// In strict order: waits for all in-flight GPU work (swapchain images
    /// may still be referenced by executing command buffers), then rebuilds
    /// the swapchain in place, then replaces the per-image semaphores.
    /// Viewport-dependent overlay resources are the caller's follow-up
    /// (`Gui::resize`).
    ///
    /// # Errors
    ///
    /// A failed idle wait or rebuild is fatal; no partial-state repair is
    /// attempted.
    pub fn update_swapchain(
        &mut self,
        extent: vk::Extent2D,
        transform: vk::SurfaceTransformFlagsKHR,
    ) -> FrameworkResult<()> {
        info!(
            "Updating swapchain: {}x{}, transform {:?}",
            extent.width, extent.height, transform
        );

        self.device.wait_idle()?;
        self.swapchain
            .rebuild(self.surface.handle(), extent, transform)?;

        self.render_finished =
            Self::create_image_semaphores(&self.device, self.swapchain.image_count())?;

        self.surface_extent = self.swapchain.extent();
        Ok(())
    }

    /// Begins a frame: applies any pending resize, waits for the frame
    /// slot, acquires an image and starts command recording.
    ///
    /// Returns `None` when the swapchain had to be rebuilt instead of
    /// acquiring; the caller skips rendering for this frame.
    ///
    /// # Errors
    ///
    /// Propagates backend errors; all are fatal.
    pub fn begin_frame(&mut self) -> FrameworkResult<Option<vk::CommandBuffer>> {
        if let Some(extent) = self.pending_resize.take() {
            self.update_swapchain(extent, self.pre_transform)?;
        }

        self.frames[self.current_frame].in_flight.wait(u64::MAX)?;

        let acquire_semaphore = self.frames[self.current_frame].image_available.handle();
        match self.swapchain.acquire_next_image(acquire_semaphore) {
            Ok((index, _suboptimal)) => {
                self.image_index = index;
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire, rebuilding");
                let extent = self.surface_properties()?.current_extent;
                self.update_swapchain(extent, self.pre_transform)?;
                return Ok(None);
            }
            Err(e) => return Err(RhiError::from(e).into()),
        }

        let frame = &self.frames[self.current_frame];
        frame.in_flight.reset()?;
        frame.command_buffer.reset()?;
        frame.command_buffer.begin()?;

        let cmd = frame.command_buffer.handle();
        self.transition_image(
            cmd,
            self.swapchain.image(self.image_index as usize),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );

        Ok(Some(cmd))
    }

    /// Begins the main color pass over the acquired swapchain image and
    /// sets the full-extent viewport and scissor.
    pub fn begin_main_pass(&self, cmd: vk::CommandBuffer, clear_color: [f32; 4]) {
        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(self.swapchain.image_view(self.image_index as usize))
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            });

        let extent = self.swapchain.extent();
        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment));

        unsafe {
            self.device.handle().cmd_begin_rendering(cmd, &rendering_info);

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            self.device.handle().cmd_set_viewport(cmd, 0, &[viewport]);

            let scissor = vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            };
            self.device.handle().cmd_set_scissor(cmd, 0, &[scissor]);
        }
    }

    /// Ends the main color pass.
    pub fn end_main_pass(&self, cmd: vk::CommandBuffer) {
        unsafe {
            self.device.handle().cmd_end_rendering(cmd);
        }
    }

    /// Ends the frame: transitions to present, submits and presents.
    ///
    /// # Errors
    ///
    /// Propagates backend errors; all are fatal.
    pub fn end_frame(&mut self) -> FrameworkResult<()> {
        let frame = &self.frames[self.current_frame];
        let cmd = frame.command_buffer.handle();

        self.transition_image(
            cmd,
            self.swapchain.image(self.image_index as usize),
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );

        frame.command_buffer.end()?;

        let wait_semaphores = [frame.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished[self.image_index as usize].handle()];
        let command_buffers = [cmd];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                frame.in_flight.handle(),
            )
            .map_err(RhiError::from)?;
        }

        let present_result = self.swapchain.present(
            self.device.present_queue(),
            self.image_index,
            signal_semaphores[0],
        );

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        let needs_rebuild = match present_result {
            Ok(suboptimal) => suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            Err(e) => return Err(RhiError::from(e).into()),
        };

        if needs_rebuild {
            debug!("Swapchain stale after present, rebuilding");
            let extent = self.surface_properties()?.current_extent;
            self.update_swapchain(extent, self.pre_transform)?;
        }

        Ok(())
    }

    fn transition_image(
        &self,
        cmd: vk::CommandBuffer,
        image: vk::Image,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        let (src_stage, src_access, dst_stage, dst_access) = match (old_layout, new_layout) {
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL) => (
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::AccessFlags::empty(),
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            ),
            (vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::PRESENT_SRC_KHR) => (
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::AccessFlags::empty(),
            ),
            _ => (
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
            ),
        };

        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .level_count(1)
                    .layer_count(1),
            )
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);

        unsafe {
            self.device.handle().cmd_pipeline_barrier(
                cmd,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }
}

//! Immediate-mode GUI overlay.
//!
//! Wraps Dear ImGui with its winit platform glue and the ash-based
//! renderer, drawing directly into the sample's main color pass via dynamic
//! rendering.

use ash::vk;
use imgui_rs_vulkan_renderer::{DynamicRendering, Options, Renderer};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use tracing::debug;

use crate::context::RenderContext;
use crate::error::{FrameworkError, FrameworkResult};
use crate::MAX_FRAMES_IN_FLIGHT;

/// GUI overlay state.
pub struct Gui {
    context: imgui::Context,
    platform: WinitPlatform,
    renderer: Renderer,
}

impl Gui {
    /// Creates the overlay for a window and render context.
    ///
    /// # Errors
    ///
    /// Returns an error if the GUI renderer cannot allocate its resources.
    pub fn new(window: &winit::window::Window, ctx: &RenderContext) -> FrameworkResult<Self> {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Default);

        let renderer = Renderer::with_gpu_allocator(
            ctx.device().allocator(),
            ctx.device().handle().clone(),
            ctx.device().graphics_queue(),
            ctx.command_pool().handle(),
            DynamicRendering {
                color_attachment_format: ctx.swapchain().format(),
                depth_attachment_format: None,
            },
            &mut context,
            Some(Options {
                in_flight_frames: MAX_FRAMES_IN_FLIGHT,
                ..Default::default()
            }),
        )
        .map_err(|e| FrameworkError::Gui(e.to_string()))?;

        debug!("GUI overlay initialized");

        Ok(Self {
            context,
            platform,
            renderer,
        })
    }

    /// Feeds a window event into the GUI input state.
    pub fn handle_event(&mut self, window: &winit::window::Window, event: &winit::event::Event<()>) {
        self.platform
            .handle_event(self.context.io_mut(), window, event);
    }

    /// Resizes the overlay's logical display.
    ///
    /// The swapchain recreator calls this after a rebuild. It matters for
    /// rotation-only recreation: no window resize event fires in that case,
    /// so the platform glue never sees the new extent on its own.
    pub fn resize(&mut self, extent: vk::Extent2D) {
        self.context.io_mut().display_size = [extent.width as f32, extent.height as f32];
        debug!("GUI resized to {}x{}", extent.width, extent.height);
    }

    /// Prepares the next GUI frame (delta time and platform state).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform glue fails to prepare the frame.
    pub fn prepare(&mut self, window: &winit::window::Window, delta_time: f32) -> FrameworkResult<()> {
        self.context
            .io_mut()
            .update_delta_time(std::time::Duration::from_secs_f32(delta_time.max(1e-6)));
        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .map_err(|e| FrameworkError::Gui(e.to_string()))
    }

    /// Builds the UI via `build` and records its draw commands.
    ///
    /// Must be called inside an active color pass on `cmd`.
    ///
    /// # Errors
    ///
    /// Returns an error if recording the GUI draw data fails.
    pub fn draw(
        &mut self,
        window: &winit::window::Window,
        cmd: vk::CommandBuffer,
        build: impl FnOnce(&mut imgui::Ui),
    ) -> FrameworkResult<()> {
        let ui = self.context.frame();
        build(ui);
        self.platform.prepare_render(ui, window);

        let draw_data = self.context.render();
        self.renderer
            .cmd_draw(cmd, draw_data)
            .map_err(|e| FrameworkError::Gui(e.to_string()))
    }
}

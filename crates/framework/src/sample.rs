//! The sample capability set and the frame driver that runs it.
//!
//! A sample is any type implementing [`Sample`]. The driver owns the window,
//! instance, device, render context and GUI; samples receive references per
//! call and hold no rendering state of their own between frames.

use std::ffi::CString;
use std::path::Path;

use ash::vk;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use vks_core::{Config, FrameClock};
use vks_platform::{InputState, KeyCode, Window};
use vks_rhi::device::Device;
use vks_rhi::instance::Instance;
use vks_rhi::physical_device::select_physical_device;

use crate::context::RenderContext;
use crate::error::FrameworkResult;
use crate::graph::Graph;
use crate::gui::Gui;

/// Background clear color for the main pass.
const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.08, 1.0];

/// Path the debug graph is dumped to when the user presses `G`.
const GRAPH_DUMP_PATH: &str = "scene_graph.json";

/// The customization points of a sample.
pub trait Sample {
    /// One-time setup after the device and render context exist.
    fn prepare(&mut self, ctx: &mut RenderContext) -> FrameworkResult<()>;

    /// Per-frame update, invoked before the render context begins the
    /// frame. This is where samples react to surface changes and select the
    /// pre-transform for the upcoming frame.
    fn update(&mut self, ctx: &mut RenderContext, gui: &mut Gui, delta_time: f32)
        -> FrameworkResult<()>;

    /// Records scene draw commands inside the main color pass.
    fn draw_scene(&mut self, ctx: &RenderContext, cmd: vk::CommandBuffer);

    /// Builds the sample's GUI for the current frame.
    fn draw_gui(&mut self, ui: &mut imgui::Ui, ctx: &RenderContext);

    /// Reacts to the frame's input snapshot.
    fn on_input(&mut self, _input: &InputState) {}

    /// Optional visualization graph of the sample's scene state.
    fn debug_graph(&self) -> Option<Graph> {
        None
    }
}

/// Everything the driver owns while a sample is running.
struct GfxState<S: Sample> {
    // Field order is drop order: the sample's GPU resources and the GUI
    // renderer go before the context, the instance last.
    sample: S,
    gui: Gui,
    context: RenderContext,
    input: InputState,
    clock: FrameClock,
    window: Window,
    _instance: Instance,
}

impl<S: Sample> GfxState<S> {
    fn new(mut sample: S, config: &Config, event_loop: &ActiveEventLoop) -> FrameworkResult<Self> {
        let window = Window::new(event_loop, &config.window)?;

        let app_name = CString::new(config.window.title.as_str())
            .unwrap_or_else(|_| CString::from(c"Vulkan Sample"));
        let instance = Instance::new(&app_name, config.validation)?;

        let surface = window.create_surface(instance.entry(), instance.handle())?;
        let gpu = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &gpu)?;

        let extent = vk::Extent2D {
            width: window.width(),
            height: window.height(),
        };
        let mut context = RenderContext::new(&instance, device, surface, extent)?;
        let gui = Gui::new(window.inner(), &context)?;

        sample.prepare(&mut context)?;
        info!("Sample prepared, entering main loop");

        Ok(Self {
            sample,
            gui,
            context,
            input: InputState::new(),
            clock: FrameClock::start(),
            window,
            _instance: instance,
        })
    }

    fn render_frame(&mut self) -> FrameworkResult<()> {
        let GfxState {
            sample,
            gui,
            context,
            input,
            clock,
            window,
            ..
        } = self;

        let delta_time = clock.next_frame();

        sample.on_input(input);
        if input.was_key_pressed(KeyCode::KeyG) {
            match sample.debug_graph() {
                Some(graph) => match graph.write_to_file(Path::new(GRAPH_DUMP_PATH)) {
                    Ok(()) => info!("Scene graph written to {}", GRAPH_DUMP_PATH),
                    Err(e) => warn!("Failed to write scene graph: {}", e),
                },
                None => warn!("Sample provides no debug graph"),
            }
        }

        // The sample's update runs before the frame begins: the render
        // context consults the pre-transform and extent when acquiring.
        sample.update(context, gui, delta_time)?;

        gui.prepare(window.inner(), delta_time)?;

        if let Some(cmd) = context.begin_frame()? {
            context.begin_main_pass(cmd, CLEAR_COLOR);
            sample.draw_scene(context, cmd);
            gui.draw(window.inner(), cmd, |ui| sample.draw_gui(ui, context))?;
            context.end_main_pass(cmd);
            context.end_frame()?;
        }

        input.begin_frame();
        Ok(())
    }
}

impl<S: Sample> Drop for GfxState<S> {
    fn drop(&mut self) {
        // Sample resources and the GUI renderer are torn down right after
        // this; nothing may still be executing on the GPU.
        if let Err(e) = self.context.device().wait_idle() {
            error!("Failed to wait for device idle during shutdown: {:?}", e);
        }
    }
}

struct SampleApp<S: Sample> {
    config: Config,
    pending_sample: Option<S>,
    gfx: Option<GfxState<S>>,
    result: FrameworkResult<()>,
}

impl<S: Sample> ApplicationHandler for SampleApp<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        let Some(sample) = self.pending_sample.take() else {
            return;
        };
        match GfxState::new(sample, &self.config, event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => {
                error!("Failed to initialize sample: {}", e);
                self.result = Err(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };

        // The GUI sees every event; wrap it because the platform glue
        // consumes full winit events.
        let wrapped: Event<()> = Event::WindowEvent { window_id, event };
        gfx.gui.handle_event(gfx.window.inner(), &wrapped);
        let Event::WindowEvent { event, .. } = wrapped else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gfx.window.resize(size.width, size.height);
                if size.width > 0 && size.height > 0 {
                    gfx.context.request_resize(vk::Extent2D {
                        width: size.width,
                        height: size.height,
                    });
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        if key == KeyCode::Escape {
                            event_loop.exit();
                            return;
                        }
                        gfx.input.on_key_pressed(key);
                    } else {
                        gfx.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = button.into();
                match state {
                    ElementState::Pressed => gfx.input.on_button_pressed(button),
                    ElementState::Released => gfx.input.on_button_released(button),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                gfx.input.on_cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 50.0,
                };
                gfx.input.on_scroll(amount);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = gfx.render_frame() {
                    error!("Frame failed: {}", e);
                    self.result = Err(e);
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.gfx {
            gfx.window.request_redraw();
        }
    }
}

/// Runs a sample to completion.
///
/// Builds the event loop, initializes the rendering stack on resume, drives
/// the per-frame sequence and tears everything down on exit. The first
/// backend error terminates the loop and is returned to the caller.
pub fn run_sample<S: Sample>(sample: S, config: Config) -> FrameworkResult<()> {
    let event_loop =
        EventLoop::new().map_err(|e| vks_core::Error::Window(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SampleApp {
        config,
        pending_sample: Some(sample),
        gfx: None,
        result: Ok(()),
    };
    event_loop
        .run_app(&mut app)
        .map_err(|e| vks_core::Error::Window(e.to_string()))?;

    app.result
}

//! The surface-rotation sample.
//!
//! Demonstrates swapchain pre-rotation: a checkbox switches between the
//! compositor rotating the presented image (pre-transform stays identity)
//! and the application rendering pre-rotated content (pre-transform tracks
//! the surface's current transform). Toggling the policy, or a
//! rotation-only surface change, recreates the swapchain and resizes the
//! overlay.

use std::path::Path;

use ash::vk;
use glam::{Quat, Vec3};
use tracing::info;

use vks_framework::graph::{Graph, GraphNode};
use vks_framework::stats::FrameStats;
use vks_framework::{FrameworkResult, Gui, RenderContext, Sample};
use vks_platform::{InputState, MouseButton};
use vks_rhi::buffer::{Buffer, BufferUsage};
use vks_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use vks_rhi::shader::{Shader, ShaderStage};
use vks_rhi::vertex::Vertex;
use vks_scene::{Camera, OrbitController, Transform};

use crate::geometry::{PushConstants, CUBE_INDICES, CUBE_VERTICES};
use crate::rotation;

const VERTEX_SHADER_PATH: &str = "samples/surface-rotation/shaders/cube.vert.spv";
const FRAGMENT_SHADER_PATH: &str = "samples/surface-rotation/shaders/cube.frag.spv";

/// GPU resources created in `prepare`.
struct GpuResources {
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

/// Sample state.
pub struct SurfaceRotation {
    /// The rotation policy: true when the application pre-rotates.
    /// Written only by the GUI checkbox, read once per frame.
    pre_rotate: bool,
    /// Policy value the swapchain currently reflects.
    last_pre_rotate: bool,
    camera: Camera,
    orbit: OrbitController,
    cube_transform: Transform,
    spin: f32,
    stats: FrameStats,
    gpu: Option<GpuResources>,
}

impl SurfaceRotation {
    /// Creates the sample with an initial rotation policy.
    ///
    /// `last_pre_rotate` starts false, so starting in pre-rotate mode
    /// recreates the swapchain on the first frame to satisfy the policy.
    pub fn new(pre_rotate: bool) -> Self {
        Self {
            pre_rotate,
            last_pre_rotate: false,
            camera: Camera::default(),
            orbit: OrbitController::new(Vec3::ZERO, 3.0),
            cube_transform: Transform::IDENTITY,
            spin: 0.0,
            stats: FrameStats::default(),
            gpu: None,
        }
    }

    /// Catches rotation-only surface changes that arrive without a resize
    /// event, and recreates when the detector fires.
    fn handle_no_resize_rotation(
        &mut self,
        ctx: &mut RenderContext,
        gui: &mut Gui,
    ) -> FrameworkResult<()> {
        let properties = ctx.surface_properties()?;
        if rotation::needs_recreate(
            ctx.surface_extent(),
            ctx.swapchain().transform(),
            &properties,
            self.pre_rotate,
        ) {
            self.recreate_swapchain(ctx, gui)?;
        }
        Ok(())
    }

    /// Recreates the swapchain under the current policy.
    ///
    /// In strict order: the render context waits for the device to go idle
    /// and rebuilds the swapchain with the selected pre-transform, then the
    /// overlay is resized to the new extent.
    fn recreate_swapchain(&mut self, ctx: &mut RenderContext, gui: &mut Gui) -> FrameworkResult<()> {
        info!("Recreating swapchain");

        let properties = ctx.surface_properties()?;
        let transform = rotation::select_pre_transform(self.pre_rotate, &properties);
        let extent = ctx.surface_extent();

        ctx.update_swapchain(extent, transform)?;
        gui.resize(ctx.swapchain().extent());
        Ok(())
    }
}

impl Sample for SurfaceRotation {
    fn prepare(&mut self, ctx: &mut RenderContext) -> FrameworkResult<()> {
        let device = ctx.device().clone();

        let vertex_shader =
            Shader::from_spirv_file(device.clone(), Path::new(VERTEX_SHADER_PATH), ShaderStage::Vertex)?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            Path::new(FRAGMENT_SHADER_PATH),
            ShaderStage::Fragment,
        )?;

        let push_constant_range = vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::VERTEX)
            .offset(0)
            .size(std::mem::size_of::<PushConstants>() as u32);
        let pipeline_layout = PipelineLayout::new(device.clone(), &[push_constant_range])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .color_format(ctx.swapchain().format())
            .build(device.clone(), &pipeline_layout)?;

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&CUBE_VERTICES),
        )?;
        let index_buffer = Buffer::new_with_data(
            device,
            BufferUsage::Index,
            bytemuck::cast_slice(&CUBE_INDICES),
        )?;

        let extent = ctx.swapchain().extent();
        self.camera
            .set_aspect(extent.width as f32 / extent.height as f32);

        self.gpu = Some(GpuResources {
            pipeline,
            pipeline_layout,
            vertex_buffer,
            index_buffer,
            index_count: CUBE_INDICES.len() as u32,
        });

        info!("Surface-rotation sample prepared");
        Ok(())
    }

    fn update(&mut self, ctx: &mut RenderContext, gui: &mut Gui, delta_time: f32) -> FrameworkResult<()> {
        // Rotation-only changes first, then a policy toggle from the GUI.
        self.handle_no_resize_rotation(ctx, gui)?;

        if self.pre_rotate != self.last_pre_rotate {
            self.recreate_swapchain(ctx, gui)?;
            self.last_pre_rotate = self.pre_rotate;
        }

        // The camera follows the *active* swapchain transform, not the
        // freshly queried one: applying a transform the swapchain has not
        // been rebuilt to match yet would double-rotate.
        let active_transform = ctx.swapchain().transform();
        let extent = ctx.swapchain().extent();

        self.orbit.update_camera(&mut self.camera);
        self.camera
            .set_aspect(extent.width as f32 / extent.height as f32);
        self.camera
            .set_pre_rotation(rotation::rotation_matrix(active_transform));

        // Tell the render context which pre-transform the next acquire or
        // rebuild should use.
        let properties = ctx.surface_properties()?;
        ctx.set_pre_transform(rotation::select_pre_transform(self.pre_rotate, &properties));

        self.spin += delta_time * 0.6;
        self.cube_transform.rotation = Quat::from_rotation_y(self.spin);
        self.stats.update(delta_time);

        Ok(())
    }

    fn draw_scene(&mut self, ctx: &RenderContext, cmd: vk::CommandBuffer) {
        let Some(gpu) = &self.gpu else {
            return;
        };

        let mvp = self.camera.view_projection_matrix() * self.cube_transform.matrix();
        let push_constants = PushConstants {
            mvp: mvp.to_cols_array_2d(),
        };

        let device = ctx.device().handle();
        unsafe {
            device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, gpu.pipeline.handle());
            device.cmd_push_constants(
                cmd,
                gpu.pipeline_layout.handle(),
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(&push_constants),
            );
            device.cmd_bind_vertex_buffers(cmd, 0, &[gpu.vertex_buffer.handle()], &[0]);
            device.cmd_bind_index_buffer(cmd, gpu.index_buffer.handle(), 0, vk::IndexType::UINT32);
            device.cmd_draw_indexed(cmd, gpu.index_count, 1, 0, 0, 0);
        }
    }

    fn draw_gui(&mut self, ui: &mut imgui::Ui, ctx: &RenderContext) {
        let swapchain = ctx.swapchain();
        let extent = swapchain.extent();
        let aspect = extent.width as f32 / extent.height as f32;

        let rotates_by = if self.pre_rotate { "application" } else { "compositor" };
        let checkbox_label = format!("Pre-rotate ({} rotates)", rotates_by);
        let transform = rotation::transform_name(swapchain.transform());
        let resolution = format!("Res: {}x{}", extent.width, extent.height);
        let fov = format!("FOV: {:.2}", self.camera.fov_y().to_degrees());
        let fps = format!("{:.1} fps", self.stats.fps());

        // In pre-rotate mode the aspect ratio never changes, so the rotate
        // bits decide whether the scene is currently sideways.
        let rotated = swapchain.transform().intersects(
            vk::SurfaceTransformFlagsKHR::ROTATE_90 | vk::SurfaceTransformFlagsKHR::ROTATE_270,
        );

        ui.window("Options")
            .position([10.0, 10.0], imgui::Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                ui.checkbox(&checkbox_label, &mut self.pre_rotate);
                if aspect > 1.0 || (aspect < 1.0 && rotated) {
                    // Landscape layout: everything on one line.
                    ui.text(format!("{} | {} | {} | {}", transform, resolution, fov, fps));
                } else {
                    // Portrait layout: split across two lines.
                    ui.text(transform);
                    ui.text(format!("{} | {} | {}", resolution, fov, fps));
                }
            });
    }

    fn on_input(&mut self, input: &InputState) {
        if input.is_button_pressed(MouseButton::Right) {
            let (dx, dy) = input.cursor_delta();
            self.orbit.rotate(dx, dy);
        }
        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            self.orbit.zoom(scroll);
        }
    }

    fn debug_graph(&self) -> Option<Graph> {
        let mut graph = Graph::new("surface-rotation");
        let root = graph.add_node(GraphNode::scene("surface-rotation", 2));

        let cube = graph.add_node(GraphNode::node("cube"));
        let transform = graph.add_node(GraphNode::transform("cube", &self.cube_transform));
        let mesh = graph.add_node(GraphNode::mesh(
            "cube",
            CUBE_VERTICES.len(),
            CUBE_INDICES.len(),
        ));
        graph.add_edge(root, cube);
        graph.add_edge(cube, transform);
        graph.add_edge(cube, mesh);

        let camera = graph.add_node(GraphNode::camera(&self.camera));
        graph.add_edge(root, camera);

        Some(graph)
    }
}

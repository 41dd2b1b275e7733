//! [`GraphicsDevice`] on top of wgpu.
//!
//! wgpu has no global "current framebuffer" or loose uniforms, so commands
//! are recorded first: every `bind_target` opens a pass record, uploads update
//! per-program uniform blocks, and each draw snapshots its model and normal
//! matrix into the frame's instance buffer. `present` writes the buffers once,
//! encodes the passes in the order they were recorded and submits them on a
//! single queue, which is what orders the shadow pass before the shading pass.

use std::collections::HashMap;

use cgmath::{Matrix3, Matrix4, SquareMatrix};
use futures::executor::block_on;

use crate::{
    config::RendererConfig,
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{GeometryBuffer, Mesh},
        texture::Texture,
    },
    device::{
        Clear, GeometryHandle, GraphicsDevice, Program, SamplerUnit, Target, TextureHandle,
        Uniform, Viewport,
    },
    error::RenderError,
    pipelines::{self, GlobalsUniform, ShaderSources},
    scene::SceneConfiguration,
};

const INITIAL_INSTANCE_CAPACITY: usize = 64;

#[derive(Debug)]
struct DrawRecord {
    program: Program,
    geometry: GeometryHandle,
    instance: u32,
    viewport: Option<Viewport>,
    diffuse: Option<TextureHandle>,
    shadow_map: Option<TextureHandle>,
}

#[derive(Debug)]
struct PassRecord {
    target: Target,
    clear: Clear,
    draws: Vec<DrawRecord>,
}

impl PassRecord {
    fn new(target: Target) -> Self {
        Self {
            target,
            clear: Clear {
                color: None,
                depth: None,
            },
            draws: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.draws.is_empty() && self.clear.color.is_none() && self.clear.depth.is_none()
    }
}

#[derive(Debug)]
struct RecorderState {
    program: Option<Program>,
    viewport: Option<Viewport>,
    model: Matrix4<f32>,
    normal: Matrix3<f32>,
    diffuse: Option<TextureHandle>,
    shadow_map: Option<TextureHandle>,
}

impl Default for RecorderState {
    fn default() -> Self {
        Self {
            program: None,
            viewport: None,
            model: Matrix4::identity(),
            normal: Matrix3::identity(),
            diffuse: None,
            shadow_map: None,
        }
    }
}

#[derive(Debug)]
struct ProgramGlobals {
    values: GlobalsUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl ProgramGlobals {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<GlobalsUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(label),
        });
        Self {
            values: GlobalsUniform::default(),
            buffer,
            bind_group,
        }
    }
}

fn apply_uniform(values: &mut GlobalsUniform, uniform: Uniform) {
    match uniform {
        Uniform::LightSpace(m) => values.light_space = m.into(),
        Uniform::View(m) => values.view = m.into(),
        Uniform::Projection(m) => values.projection = m.into(),
        Uniform::ViewPosition(p) => values.view_position = [p.x, p.y, p.z, 1.0],
        Uniform::LightPosition(p) => values.light_position = [p.x, p.y, p.z, 1.0],
        Uniform::LightColor(c) => values.light_color = [c.x, c.y, c.z, 1.0],
        Uniform::ShadowParams {
            bias_min,
            bias_slope,
            ambient,
        } => values.shadow_params = [bias_min, bias_slope, ambient, 0.0],
        Uniform::Attenuation(a) => {
            values.attenuation = [a.constant, a.linear, a.quadratic, 0.0]
        }
        // Per-draw values live in the instance buffer
        Uniform::Model(_) | Uniform::NormalMatrix(_) => {}
    }
}

fn compile_module(
    device: &wgpu::Device,
    label: &str,
    source: String,
) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match block_on(device.pop_error_scope()) {
        Some(e) => Err(RenderError::ShaderCompile {
            label: label.to_string(),
            message: e.to_string(),
        }),
        None => Ok(module),
    }
}

fn link_pipeline(
    device: &wgpu::Device,
    label: &str,
    build: impl FnOnce(&wgpu::Device) -> wgpu::RenderPipeline,
) -> Result<wgpu::RenderPipeline, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = build(device);
    match block_on(device.pop_error_scope()) {
        Some(e) => Err(RenderError::ShaderLink {
            label: label.to_string(),
            message: e.to_string(),
        }),
        None => Ok(pipeline),
    }
}

#[derive(Debug)]
pub struct WgpuDevice {
    ctx: Context,
    sources: ShaderSources,
    globals_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    depth_view_layout: wgpu::BindGroupLayout,
    depth_pipeline: wgpu::RenderPipeline,
    debug_pipeline: wgpu::RenderPipeline,
    shading: Option<(SceneConfiguration, wgpu::RenderPipeline)>,
    depth_globals: ProgramGlobals,
    shading_globals: ProgramGlobals,
    geometries: Vec<GeometryBuffer>,
    textures: Vec<Texture>,
    material_groups: HashMap<(TextureHandle, TextureHandle), wgpu::BindGroup>,
    depth_view_groups: HashMap<TextureHandle, wgpu::BindGroup>,
    instance_data: Vec<InstanceRaw>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    passes: Vec<PassRecord>,
    state: RecorderState,
}

impl WgpuDevice {
    /// Builds the depth and debug programs. The shading program is built by
    /// the first [`compile_shading`](GraphicsDevice::compile_shading).
    pub fn new(ctx: Context, config: &RendererConfig) -> Result<Self, RenderError> {
        let sources = ShaderSources::new(config.shader_dir.clone());
        let device = &ctx.device;
        let globals_layout = pipelines::globals_layout(device);
        let material_layout = pipelines::material_layout(device);
        let depth_view_layout = pipelines::depth_view_layout(device);

        let depth_module = compile_module(device, "depth.wgsl", sources.depth())?;
        let depth_pipeline = link_pipeline(device, "depth", |device| {
            pipelines::depth::mk_depth_pipeline(device, &globals_layout, &depth_module)
        })?;

        let debug_module = compile_module(device, "debug_depth.wgsl", sources.debug_depth())?;
        let debug_pipeline = link_pipeline(device, "debug depth", |device| {
            pipelines::debug::mk_debug_depth_pipeline(
                device,
                &depth_view_layout,
                ctx.config.format,
                &debug_module,
            )
        })?;

        let depth_globals = ProgramGlobals::new(device, &globals_layout, "depth globals");
        let shading_globals = ProgramGlobals::new(device, &globals_layout, "shading globals");
        let instance_buffer = Self::mk_instance_buffer(device, INITIAL_INSTANCE_CAPACITY);

        Ok(Self {
            sources,
            globals_layout,
            material_layout,
            depth_view_layout,
            depth_pipeline,
            debug_pipeline,
            shading: None,
            depth_globals,
            shading_globals,
            geometries: Vec::new(),
            textures: Vec::new(),
            material_groups: HashMap::new(),
            depth_view_groups: HashMap::new(),
            instance_data: Vec::new(),
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            passes: Vec::new(),
            state: RecorderState::default(),
            ctx,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn window(&self) -> &winit::window::Window {
        &self.ctx.window
    }

    /// Re-apply the surface configuration, e.g. after `SurfaceError::Lost`.
    pub fn reconfigure(&self) {
        self.ctx.reconfigure();
    }

    fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn current_pass(&mut self) -> &mut PassRecord {
        if self.passes.is_empty() {
            self.passes.push(PassRecord::new(Target::Default));
        }
        let last = self.passes.len() - 1;
        &mut self.passes[last]
    }

    fn target_size(&self, target: Target) -> (u32, u32) {
        match target {
            Target::Default => (self.ctx.config.width, self.ctx.config.height),
            Target::DepthMap(handle) => self
                .textures
                .get(handle.0 as usize)
                .map(|t| t.size())
                .unwrap_or((1, 1)),
        }
    }

    fn pipeline_for(&self, program: Program) -> Option<&wgpu::RenderPipeline> {
        match program {
            Program::Depth => Some(&self.depth_pipeline),
            Program::Shading => self.shading.as_ref().map(|(_, p)| p),
            Program::DebugDepth => Some(&self.debug_pipeline),
        }
    }

    /// Whether `program` can render into `target`: the depth program has no
    /// colour output, the others need one.
    fn fits(program: Program, target: Target) -> bool {
        matches!(
            (program, target),
            (Program::Depth, Target::DepthMap(_))
                | (Program::Shading, Target::Default)
                | (Program::DebugDepth, Target::Default)
        )
    }

    /// Create any bind group the recorded draws need but the caches lack.
    fn prepare_bind_groups(&mut self) {
        let mut wanted_materials = Vec::new();
        let mut wanted_views = Vec::new();
        for draw in self.passes.iter().flat_map(|p| p.draws.iter()) {
            match draw.program {
                Program::Shading => {
                    if let (Some(diffuse), Some(shadow)) = (draw.diffuse, draw.shadow_map) {
                        wanted_materials.push((diffuse, shadow));
                    }
                }
                Program::DebugDepth => {
                    if let Some(depth) = draw.shadow_map {
                        wanted_views.push(depth);
                    }
                }
                Program::Depth => {}
            }
        }

        for key @ (diffuse, shadow) in wanted_materials {
            if self.material_groups.contains_key(&key) {
                continue;
            }
            let (Some(diffuse), Some(shadow)) = (
                self.textures.get(diffuse.0 as usize),
                self.textures.get(shadow.0 as usize),
            ) else {
                continue;
            };
            let (Some(diffuse_sampler), Some(shadow_sampler)) =
                (diffuse.sampler.as_ref(), shadow.sampler.as_ref())
            else {
                log::warn!("Texture without sampler bound to a sampler unit");
                continue;
            };
            let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&diffuse.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(diffuse_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&shadow.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(shadow_sampler),
                    },
                ],
                label: Some("material_bind_group"),
            });
            self.material_groups.insert(key, group);
        }

        for handle in wanted_views {
            if self.depth_view_groups.contains_key(&handle) {
                continue;
            }
            let Some(texture) = self.textures.get(handle.0 as usize) else {
                continue;
            };
            let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.depth_view_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                }],
                label: Some("depth_view_bind_group"),
            });
            self.depth_view_groups.insert(handle, group);
        }
    }

    fn upload_frame_data(&mut self) {
        let queue = &self.ctx.queue;
        queue.write_buffer(
            &self.depth_globals.buffer,
            0,
            bytemuck::cast_slice(&[self.depth_globals.values]),
        );
        queue.write_buffer(
            &self.shading_globals.buffer,
            0,
            bytemuck::cast_slice(&[self.shading_globals.values]),
        );

        if self.instance_data.len() > self.instance_capacity {
            self.instance_capacity = self.instance_data.len().next_power_of_two();
            self.instance_buffer = Self::mk_instance_buffer(&self.ctx.device, self.instance_capacity);
        }
        if !self.instance_data.is_empty() {
            self.ctx.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(&self.instance_data),
            );
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
        pass: &PassRecord,
    ) {
        let depth_ops = Some(wgpu::Operations {
            load: pass
                .clear
                .depth
                .map(wgpu::LoadOp::Clear)
                .unwrap_or(wgpu::LoadOp::Load),
            store: wgpu::StoreOp::Store,
        });
        let (color_attachments, depth_view): (Vec<Option<wgpu::RenderPassColorAttachment>>, _) =
            match pass.target {
                Target::Default => (
                    vec![Some(wgpu::RenderPassColorAttachment {
                        view: surface_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: pass
                                .clear
                                .color
                                .map(wgpu::LoadOp::Clear)
                                .unwrap_or(wgpu::LoadOp::Load),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    &self.ctx.depth_texture.view,
                ),
                Target::DepthMap(handle) => match self.textures.get(handle.0 as usize) {
                    Some(texture) => (Vec::new(), &texture.view),
                    None => {
                        log::error!("Depth target {handle:?} does not exist");
                        return;
                    }
                },
            };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(match pass.target {
                Target::Default => "Shading Pass",
                Target::DepthMap(_) => "Shadow Pass",
            }),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops,
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (max_w, max_h) = self.target_size(pass.target);
        let mut current_viewport = None;
        let mut current_program = None;
        for draw in &pass.draws {
            if !Self::fits(draw.program, pass.target) {
                log::warn!("{:?} cannot draw into {:?}, skipped", draw.program, pass.target);
                continue;
            }
            let Some(pipeline) = self.pipeline_for(draw.program) else {
                log::warn!("{:?} has no compiled program, draw skipped", draw.program);
                continue;
            };
            let Some(geometry) = self.geometries.get(draw.geometry.0 as usize) else {
                continue;
            };

            let bound = match draw.program {
                Program::Depth => {
                    render_pass.set_bind_group(0, &self.depth_globals.bind_group, &[]);
                    true
                }
                Program::Shading => match draw
                    .diffuse
                    .zip(draw.shadow_map)
                    .and_then(|key| self.material_groups.get(&key))
                {
                    Some(material) => {
                        render_pass.set_bind_group(0, &self.shading_globals.bind_group, &[]);
                        render_pass.set_bind_group(1, material, &[]);
                        true
                    }
                    None => false,
                },
                Program::DebugDepth => match draw
                    .shadow_map
                    .and_then(|h| self.depth_view_groups.get(&h))
                {
                    Some(group) => {
                        render_pass.set_bind_group(0, group, &[]);
                        true
                    }
                    None => false,
                },
            };
            if !bound {
                log::warn!("{:?} draw is missing a texture on a sampler unit, skipped", draw.program);
                continue;
            }

            if current_program != Some(draw.program) {
                render_pass.set_pipeline(pipeline);
                current_program = Some(draw.program);
            }
            if draw.viewport != current_viewport {
                if let Some(v) = draw.viewport {
                    let width = v.width.min(max_w.saturating_sub(v.x)).max(1);
                    let height = v.height.min(max_h.saturating_sub(v.y)).max(1);
                    render_pass.set_viewport(
                        v.x as f32,
                        v.y as f32,
                        width as f32,
                        height as f32,
                        0.0,
                        1.0,
                    );
                }
                current_viewport = draw.viewport;
            }

            render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            if draw.program != Program::DebugDepth {
                render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            }
            render_pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(
                0..geometry.num_elements,
                0,
                draw.instance..draw.instance + 1,
            );
        }
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_geometry(&mut self, mesh: &Mesh) -> GeometryHandle {
        self.geometries.push(GeometryBuffer::new(&self.ctx.device, mesh));
        GeometryHandle(self.geometries.len() as u32 - 1)
    }

    fn create_texture(&mut self, image: &image::DynamicImage, label: &str) -> TextureHandle {
        self.textures.push(Texture::from_image(
            &self.ctx.device,
            &self.ctx.queue,
            image,
            Some(label),
        ));
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn create_depth_target(&mut self, resolution: u32) -> Result<TextureHandle, RenderError> {
        let max = self.max_texture_dimension();
        if resolution == 0 || resolution > max {
            return Err(RenderError::FramebufferIncomplete(format!(
                "{resolution}x{resolution} depth attachment, device limit is {max}"
            )));
        }
        let device = &self.ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = Texture::create_shadow_map(
            device,
            resolution,
            self.ctx.supports_border_clamp(),
            "shadow map",
        );
        if let Some(e) = block_on(device.pop_error_scope()) {
            return Err(RenderError::FramebufferIncomplete(e.to_string()));
        }
        if !self.ctx.supports_border_clamp() {
            log::info!("Border clamp unsupported, shadow sampler clamps to edge");
        }
        self.textures.push(texture);
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn max_texture_dimension(&self) -> u32 {
        self.ctx.device.limits().max_texture_dimension_2d
    }

    fn bind_target(&mut self, target: Target) {
        self.passes.push(PassRecord::new(target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.viewport = Some(viewport);
    }

    fn clear(&mut self, clear: Clear) {
        let pass = self.current_pass();
        if pass.draws.is_empty() {
            pass.clear.color = clear.color.or(pass.clear.color);
            pass.clear.depth = clear.depth.or(pass.clear.depth);
        } else {
            // Clearing after draws needs a fresh load op
            let mut next = PassRecord::new(pass.target);
            next.clear = clear;
            self.passes.push(next);
        }
    }

    fn use_program(&mut self, program: Program) {
        self.state.program = Some(program);
    }

    fn upload(&mut self, uniform: Uniform) {
        match uniform {
            Uniform::Model(m) => self.state.model = m,
            Uniform::NormalMatrix(n) => self.state.normal = n,
            other => match self.state.program {
                Some(Program::Depth) => apply_uniform(&mut self.depth_globals.values, other),
                Some(Program::Shading) => apply_uniform(&mut self.shading_globals.values, other),
                Some(Program::DebugDepth) | None => {
                    log::debug!("Uniform {other:?} has no program to go to");
                }
            },
        }
    }

    fn bind_texture(&mut self, unit: SamplerUnit, texture: TextureHandle) {
        match unit {
            SamplerUnit::Diffuse => self.state.diffuse = Some(texture),
            SamplerUnit::ShadowMap => self.state.shadow_map = Some(texture),
        }
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        let Some(program) = self.state.program else {
            log::warn!("Draw without a program, skipped");
            return;
        };
        let instance = self.instance_data.len() as u32;
        self.instance_data
            .push(InstanceRaw::new(self.state.model, self.state.normal));
        let record = DrawRecord {
            program,
            geometry,
            instance,
            viewport: self.state.viewport,
            diffuse: self.state.diffuse,
            shadow_map: self.state.shadow_map,
        };
        self.current_pass().draws.push(record);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                self.passes.clear();
                self.instance_data.clear();
                self.state = RecorderState::default();
                return Err(RenderError::Surface(e));
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare_bind_groups();
        self.upload_frame_data();

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        for pass in self.passes.iter().filter(|p| !p.is_empty()) {
            self.encode_pass(&mut encoder, &view, pass);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.ctx.window.pre_present_notify();
        output.present();

        self.passes.clear();
        self.instance_data.clear();
        self.state = RecorderState::default();
        Ok(())
    }

    fn take_errors(&mut self) -> Vec<RenderError> {
        match self.ctx.errors.lock() {
            Ok(mut errors) => errors.drain(..).map(RenderError::GraphicsApi).collect(),
            Err(_) => vec![RenderError::GraphicsApi(
                "error sink poisoned".to_string(),
            )],
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    fn compile_shading(&mut self, configuration: SceneConfiguration) -> Result<(), RenderError> {
        match self.sources.dir() {
            Some(dir) => log::debug!("Compiling {} from {dir:?}", configuration.label()),
            None => log::debug!("Compiling {} from built-in sources", configuration.label()),
        }
        let device = &self.ctx.device;
        let module = compile_module(device, "shading.wgsl", self.sources.shading())?;
        let pipeline = link_pipeline(device, configuration.label(), |device| {
            pipelines::shading::mk_shading_pipeline(
                device,
                &self.globals_layout,
                &self.material_layout,
                self.ctx.config.format,
                &module,
                configuration,
            )
        })?;
        self.shading = Some((configuration, pipeline));
        Ok(())
    }
}

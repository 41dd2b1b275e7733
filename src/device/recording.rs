//! An in-memory [`GraphicsDevice`] that records the command stream.
//!
//! Nothing is rendered. Meshes are kept on the CPU so callers can replay the
//! recorded draws, and failures (API errors, shader compilation, surface loss)
//! can be injected to drive the error paths.

use std::collections::HashSet;

use cgmath::{Matrix3, Matrix4, SquareMatrix};

use crate::{
    data_structures::model::Mesh,
    device::{
        Clear, GeometryHandle, GraphicsDevice, Program, SamplerUnit, Target, TextureHandle,
        Uniform, Viewport,
    },
    error::RenderError,
    scene::SceneConfiguration,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindTarget(Target),
    SetViewport(Viewport),
    Clear(Clear),
    UseProgram(Program),
    Upload(Uniform),
    BindTexture(SamplerUnit, TextureHandle),
    Draw(GeometryHandle),
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub depth: bool,
}

/// A draw call with the state that was current when it was issued.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub target: Target,
    pub viewport: Option<Viewport>,
    pub program: Option<Program>,
    pub geometry: GeometryHandle,
    pub model: Matrix4<f32>,
    pub normal: Matrix3<f32>,
    pub light_space: Option<Matrix4<f32>>,
    pub diffuse: Option<TextureHandle>,
    pub shadow_map: Option<TextureHandle>,
}

#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<Command>,
    meshes: Vec<Mesh>,
    textures: Vec<TextureInfo>,
    max_dimension: u32,
    size: (u32, u32),
    pending_errors: Vec<String>,
    failing: HashSet<SceneConfiguration>,
    active_configuration: Option<SceneConfiguration>,
    surface_error: Option<wgpu::SurfaceError>,
    presented: usize,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            commands: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            max_dimension: wgpu::Limits::default().max_texture_dimension_2d,
            size: (width, height),
            pending_errors: Vec::new(),
            failing: HashSet::new(),
            active_configuration: None,
            surface_error: None,
            presented: 0,
        }
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn mesh(&self, geometry: GeometryHandle) -> Option<&Mesh> {
        self.meshes.get(geometry.0 as usize)
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureInfo> {
        self.textures.get(texture.0 as usize)
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn presented(&self) -> usize {
        self.presented
    }

    pub fn active_configuration(&self) -> Option<SceneConfiguration> {
        self.active_configuration
    }

    /// Queue an error as if the API had reported it during the frame.
    pub fn inject_error(&mut self, message: impl Into<String>) {
        self.pending_errors.push(message.into());
    }

    /// Make every compilation of `configuration` fail from now on.
    pub fn fail_compilation(&mut self, configuration: SceneConfiguration) {
        self.failing.insert(configuration);
    }

    pub fn fail_next_present(&mut self, error: wgpu::SurfaceError) {
        self.surface_error = Some(error);
    }

    /// Uniforms uploaded while `program` was active, in order.
    pub fn uploads_in(&self, program: Program) -> Vec<Uniform> {
        let mut current = None;
        let mut uploads = Vec::new();
        for command in &self.commands {
            match command {
                Command::UseProgram(p) => current = Some(*p),
                Command::Upload(u) if current == Some(program) => uploads.push(*u),
                _ => {}
            }
        }
        uploads
    }

    /// Replay the stream and return every draw with its effective state.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        let mut target = Target::Default;
        let mut viewport = None;
        let mut program = None;
        let mut model = Matrix4::identity();
        let mut normal = Matrix3::identity();
        let mut light_space = None;
        let mut diffuse = None;
        let mut shadow_map = None;
        let mut draws = Vec::new();
        for command in &self.commands {
            match *command {
                Command::BindTarget(t) => target = t,
                Command::SetViewport(v) => viewport = Some(v),
                Command::UseProgram(p) => program = Some(p),
                Command::Upload(Uniform::Model(m)) => model = m,
                Command::Upload(Uniform::NormalMatrix(n)) => normal = n,
                Command::Upload(Uniform::LightSpace(m)) => light_space = Some(m),
                Command::BindTexture(SamplerUnit::Diffuse, t) => diffuse = Some(t),
                Command::BindTexture(SamplerUnit::ShadowMap, t) => shadow_map = Some(t),
                Command::Draw(geometry) => draws.push(DrawCall {
                    target,
                    viewport,
                    program,
                    geometry,
                    model,
                    normal,
                    light_space,
                    diffuse,
                    shadow_map,
                }),
                _ => {}
            }
        }
        draws
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_geometry(&mut self, mesh: &Mesh) -> GeometryHandle {
        self.meshes.push(mesh.clone());
        GeometryHandle(self.meshes.len() as u32 - 1)
    }

    fn create_texture(&mut self, image: &image::DynamicImage, label: &str) -> TextureHandle {
        self.textures.push(TextureInfo {
            label: label.to_string(),
            width: image.width(),
            height: image.height(),
            depth: false,
        });
        TextureHandle(self.textures.len() as u32 - 1)
    }

    fn create_depth_target(&mut self, resolution: u32) -> Result<TextureHandle, RenderError> {
        if resolution == 0 || resolution > self.max_dimension {
            return Err(RenderError::FramebufferIncomplete(format!(
                "cannot attach a {resolution}x{resolution} depth texture"
            )));
        }
        self.textures.push(TextureInfo {
            label: "shadow map".to_string(),
            width: resolution,
            height: resolution,
            depth: true,
        });
        Ok(TextureHandle(self.textures.len() as u32 - 1))
    }

    fn max_texture_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn bind_target(&mut self, target: Target) {
        self.commands.push(Command::BindTarget(target));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
    }

    fn clear(&mut self, clear: Clear) {
        self.commands.push(Command::Clear(clear));
    }

    fn use_program(&mut self, program: Program) {
        self.commands.push(Command::UseProgram(program));
    }

    fn upload(&mut self, uniform: Uniform) {
        self.commands.push(Command::Upload(uniform));
    }

    fn bind_texture(&mut self, unit: SamplerUnit, texture: TextureHandle) {
        self.commands.push(Command::BindTexture(unit, texture));
    }

    fn draw(&mut self, geometry: GeometryHandle) {
        self.commands.push(Command::Draw(geometry));
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.commands.push(Command::Present);
        if let Some(error) = self.surface_error.take() {
            return Err(RenderError::Surface(error));
        }
        self.presented += 1;
        Ok(())
    }

    fn take_errors(&mut self) -> Vec<RenderError> {
        self.pending_errors
            .drain(..)
            .map(RenderError::GraphicsApi)
            .collect()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }

    fn compile_shading(&mut self, configuration: SceneConfiguration) -> Result<(), RenderError> {
        if self.failing.contains(&configuration) {
            return Err(RenderError::ShaderCompile {
                label: configuration.label().to_string(),
                message: "injected compilation failure".to_string(),
            });
        }
        self.active_configuration = Some(configuration);
        Ok(())
    }
}

//! The graphics device seam.
//!
//! The passes never talk to wgpu directly. They issue a small, ordered
//! vocabulary of commands (bind a target, set the viewport, clear, select a
//! program, upload a uniform, bind a texture to a sampler unit, draw) against
//! a [`GraphicsDevice`]. [`gpu::WgpuDevice`] turns that stream into render
//! passes on a real GPU; [`recording::RecordingDevice`] keeps it in memory so
//! pass ordering and uniform contents can be asserted without one.

use cgmath::{Matrix3, Matrix4, Point3, Vector3};

use crate::{config::Attenuation, data_structures::model::Mesh, error::RenderError, scene::SceneConfiguration};

pub mod recording;
pub mod gpu;

/// Opaque reference to a texture owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) u32);

/// Opaque reference to uploaded vertex/index buffers owned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryHandle(pub(crate) u32);

/// Where subsequent draws land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The window surface with its depth buffer.
    Default,
    /// A depth-only offscreen target.
    DepthMap(TextureHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

/// Buffers to clear on the bound target. `None` keeps the previous contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clear {
    pub color: Option<wgpu::Color>,
    pub depth: Option<f32>,
}

impl Clear {
    pub fn depth_only(depth: f32) -> Self {
        Self {
            color: None,
            depth: Some(depth),
        }
    }

    pub fn color_and_depth(color: wgpu::Color, depth: f32) -> Self {
        Self {
            color: Some(color),
            depth: Some(depth),
        }
    }
}

/// The three programs the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Program {
    /// Vertex-only light-space depth program.
    Depth,
    /// The active scene configuration's lighting program.
    Shading,
    /// Full-screen quad that visualises the depth map.
    DebugDepth,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    LightSpace(Matrix4<f32>),
    View(Matrix4<f32>),
    Projection(Matrix4<f32>),
    ViewPosition(Point3<f32>),
    LightPosition(Point3<f32>),
    LightColor(Vector3<f32>),
    ShadowParams {
        bias_min: f32,
        bias_slope: f32,
        ambient: f32,
    },
    Attenuation(Attenuation),
    Model(Matrix4<f32>),
    NormalMatrix(Matrix3<f32>),
}

/// Fixed sampler units shared with the shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SamplerUnit {
    Diffuse = 0,
    ShadowMap = 1,
}

/// A GPU backend for the shadow-mapping passes.
///
/// Commands are issued in frame order and take effect in that order. State
/// set by one command (bound target, program, uniforms, textures) persists
/// until it is overwritten.
pub trait GraphicsDevice {
    /// Upload a mesh into GPU vertex/index buffers.
    fn create_geometry(&mut self, mesh: &Mesh) -> GeometryHandle;

    /// Upload a decoded image as a sampled colour texture.
    fn create_texture(&mut self, image: &image::DynamicImage, label: &str) -> TextureHandle;

    /// Create a square depth texture usable both as attachment and binding.
    ///
    /// Fails with [`RenderError::FramebufferIncomplete`] when the texture
    /// cannot serve as a depth attachment.
    fn create_depth_target(&mut self, resolution: u32) -> Result<TextureHandle, RenderError>;

    /// Largest width/height a 2D texture may have on this device.
    fn max_texture_dimension(&self) -> u32;

    fn bind_target(&mut self, target: Target);

    fn set_viewport(&mut self, viewport: Viewport);

    fn clear(&mut self, clear: Clear);

    fn use_program(&mut self, program: Program);

    fn upload(&mut self, uniform: Uniform);

    fn bind_texture(&mut self, unit: SamplerUnit, texture: TextureHandle);

    /// Draw the geometry with the current program, uniforms and textures.
    fn draw(&mut self, geometry: GeometryHandle);

    /// Submit everything recorded since the last present and show the frame.
    fn present(&mut self) -> Result<(), RenderError>;

    /// Drain graphics API errors raised since the last call.
    fn take_errors(&mut self) -> Vec<RenderError>;

    /// The window surface changed size.
    fn resize(&mut self, width: u32, height: u32);

    /// (Re)build the shading program for a scene configuration and make it
    /// the active one. On failure the previously active program is kept.
    fn compile_shading(&mut self, configuration: SceneConfiguration) -> Result<(), RenderError>;
}

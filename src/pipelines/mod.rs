//! Render pipelines of the three programs and the data they share.
//!
//! Every program reads the same [`GlobalsUniform`] block at group 0. The
//! shading program additionally reads the diffuse texture (unit 0) and the
//! shadow map (unit 1) at group 1; the debug program reads the shadow map
//! alone at group 0.

use std::path::{Path, PathBuf};

use cgmath::{Matrix4, SquareMatrix};

pub mod basic;
pub mod debug;
pub mod depth;
pub mod shading;

pub const DEPTH_SHADER: &str = include_str!("depth.wgsl");
pub const SHADING_SHADER: &str = include_str!("shading.wgsl");
pub const DEBUG_DEPTH_SHADER: &str = include_str!("debug_depth.wgsl");

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalsUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub view_position: [f32; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    /// x: minimum bias, y: slope bias, z: ambient.
    pub shadow_params: [f32; 4],
    /// x: constant, y: linear, z: quadratic.
    pub attenuation: [f32; 4],
}

impl Default for GlobalsUniform {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        Self {
            view: identity,
            projection: identity,
            light_space: identity,
            view_position: [0.0, 0.0, 0.0, 1.0],
            light_position: [0.0, 0.0, 0.0, 1.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            shadow_params: [0.005, 0.05, 0.3, 0.0],
            attenuation: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

pub fn globals_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("globals_bind_group_layout"),
    })
}

/// Diffuse texture + sampler at 0/1, shadow map + comparison sampler at 2/3.
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("material_bind_group_layout"),
    })
}

pub fn depth_view_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Depth,
            },
            count: None,
        }],
        label: Some("depth_view_bind_group_layout"),
    })
}

/// Where program sources come from: an override directory, else the
/// sources compiled into the crate.
#[derive(Debug, Clone, Default)]
pub struct ShaderSources {
    dir: Option<PathBuf>,
}

impl ShaderSources {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn read(&self, file: &str, builtin: &str) -> String {
        if let Some(dir) = &self.dir {
            let path = dir.join(file);
            match std::fs::read_to_string(&path) {
                Ok(source) => return source,
                Err(e) if path.exists() => {
                    log::warn!("Cannot read {path:?}, using the built-in source: {e}");
                }
                Err(_) => {}
            }
        }
        builtin.to_string()
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn depth(&self) -> String {
        self.read("depth.wgsl", DEPTH_SHADER)
    }

    pub fn shading(&self) -> String {
        self.read("shading.wgsl", SHADING_SHADER)
    }

    pub fn debug_depth(&self) -> String {
        self.read("debug_depth.wgsl", DEBUG_DEPTH_SHADER)
    }
}

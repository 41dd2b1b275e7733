use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{depth_state, mk_render_pipeline},
    scene::SceneConfiguration,
};

/// Lighting program of one scene configuration. All configurations share
/// the vertex stage and differ in the fragment entry point.
pub fn mk_shading_pipeline(
    device: &wgpu::Device,
    globals_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    shader: &wgpu::ShaderModule,
    configuration: SceneConfiguration,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shading Pipeline Layout"),
        bind_group_layouts: &[globals_layout, material_layout],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        &format!("Shading Pipeline ({})", configuration.label()),
        &layout,
        shader,
        Some((configuration.entry_point(), color_format)),
        Some(depth_state(true, wgpu::CompareFunction::Less)),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        Some(wgpu::Face::Back),
    )
}

use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/// Vertex-only program writing light-space depth. No colour target.
pub fn mk_depth_pipeline(
    device: &wgpu::Device,
    globals_layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Depth Pipeline Layout"),
        bind_group_layouts: &[globals_layout],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        "Depth Pipeline",
        &layout,
        shader,
        None,
        Some(depth_state(true, wgpu::CompareFunction::Less)),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        Some(wgpu::Face::Back),
    )
}

use crate::{
    data_structures::model::{ModelVertex, Vertex},
    pipelines::basic::{depth_state, mk_render_pipeline},
};

/// Full-screen quad showing the depth map. Draws over everything.
pub fn mk_debug_depth_pipeline(
    device: &wgpu::Device,
    depth_view_layout: &wgpu::BindGroupLayout,
    color_format: wgpu::TextureFormat,
    shader: &wgpu::ShaderModule,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Debug Depth Pipeline Layout"),
        bind_group_layouts: &[depth_view_layout],
        push_constant_ranges: &[],
    });
    mk_render_pipeline(
        device,
        "Debug Depth Pipeline",
        &layout,
        shader,
        Some(("fs_main", color_format)),
        Some(depth_state(false, wgpu::CompareFunction::Always)),
        &[ModelVertex::desc()],
        None,
    )
}

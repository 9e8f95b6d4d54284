//! Engine descriptor → wgpu descriptor mapping

use frost_core::gpu::{
    AddressMode, BlendComponent, BlendDesc, BlendFactor, BlendOp, CullMode, FillMode, FilterMode,
    TextureUsage, Topology, VertexElement, VertexFormat,
};

pub fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
    }
}

pub fn vertex_attributes(elements: &[VertexElement]) -> Vec<wgpu::VertexAttribute> {
    elements
        .iter()
        .map(|element| wgpu::VertexAttribute {
            format: vertex_format(element.format),
            offset: element.offset as u64,
            shader_location: element.location,
        })
        .collect()
}

pub fn topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

pub fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

pub fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
    }
}

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn blend_component(component: BlendComponent) -> wgpu::BlendComponent {
    wgpu::BlendComponent {
        src_factor: blend_factor(component.src),
        dst_factor: blend_factor(component.dst),
        operation: match component.op {
            BlendOp::Add => wgpu::BlendOperation::Add,
        },
    }
}

/// `None` when blending is disabled
pub fn blend_state(desc: &BlendDesc) -> Option<wgpu::BlendState> {
    desc.enabled.then(|| wgpu::BlendState {
        color: blend_component(desc.color),
        alpha: blend_component(desc.alpha),
    })
}

pub fn polygon_mode(fill: FillMode) -> wgpu::PolygonMode {
    match fill {
        FillMode::Solid => wgpu::PolygonMode::Fill,
        FillMode::Wireframe => wgpu::PolygonMode::Line,
    }
}

pub fn cull_mode(cull: CullMode) -> Option<wgpu::Face> {
    match cull {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut usages = wgpu::TextureUsages::empty();
    if usage.sampled {
        usages |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.render_target {
        usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    if usage.copy_dst {
        usages |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.copy_src {
        usages |= wgpu::TextureUsages::COPY_SRC;
    }
    usages
}

/// Whether a texture-to-texture copy between the two formats is allowed
///
/// wgpu only permits copies between formats that differ in their sRGB-ness.
pub fn copy_compatible(src: wgpu::TextureFormat, dst: wgpu::TextureFormat) -> bool {
    src.remove_srgb_suffix() == dst.remove_srgb_suffix()
}

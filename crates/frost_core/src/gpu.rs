//! GPU backend abstraction
//!
//! The engine never touches a native graphics API. A host exposes its device through
//! [`GpuDevice`] and the device's immediate context through [`GpuContext`]. Every
//! resource is an associated type owned by the engine and released when dropped, so
//! partial initialization unwinds on its own.

use crate::error::GpuError;
use crate::shaders::{ProgramSource, ShaderDialect};

/// Identity of a graphics device
///
/// Two device handles with equal ids refer to the same underlying device. A change of
/// id between frames makes the renderer rebuild all of its device state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u64);

// ─────────────────────────────────────────────────────────────────────────────
// Descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// Vertex attribute format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
}

impl VertexFormat {
    /// Size in bytes
    pub const fn size(self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
        }
    }
}

/// One element of an input layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// Semantic name as seen by the vertex program (`POSITION`, `TEXCOORD`)
    pub semantic: &'static str,
    /// Shader input location / semantic index
    pub location: u32,
    pub format: VertexFormat,
    /// Byte offset within one vertex
    pub offset: u32,
}

/// Primitive topology
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleStrip,
}

/// Texture filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Texture addressing outside [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub label: &'static str,
    /// Applies to minification, magnification and mip selection
    pub filter: FilterMode,
    /// Applies to all three axes
    pub address_mode: AddressMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    pub src: BlendFactor,
    pub dst: BlendFactor,
    pub op: BlendOp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendDesc {
    pub label: &'static str,
    pub enabled: bool,
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendDesc {
    /// Straight alpha blending for color, source alpha replaces destination alpha
    pub const ALPHA_BLENDING: BlendDesc = BlendDesc {
        label: "Alpha Blend State",
        enabled: true,
        color: BlendComponent {
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
            op: BlendOp::Add,
        },
        alpha: BlendComponent {
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
            op: BlendOp::Add,
        },
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RasterizerDesc {
    pub label: &'static str,
    pub fill: FillMode,
    pub cull: CullMode,
    pub depth_clip: bool,
}

/// Color texture formats the engine allocates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8 bits per channel RGBA, unsigned normalized
    Rgba8Unorm,
}

/// How a texture will be used; decides which views can be created over it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureUsage {
    /// Can be sampled through a read view
    pub sampled: bool,
    /// Can be rendered into through a write view
    pub render_target: bool,
    /// Can be the destination of a region copy
    pub copy_dst: bool,
    /// Can be the source of a copy or readback
    pub copy_src: bool,
}

impl TextureUsage {
    /// Copy destination that is only ever sampled
    pub const CAPTURE: TextureUsage = TextureUsage {
        sampled: true,
        render_target: false,
        copy_dst: true,
        copy_src: false,
    };

    /// Sampled render target whose contents can be read back
    pub const RENDER_TARGET: TextureUsage = TextureUsage {
        sampled: true,
        render_target: true,
        copy_dst: false,
        copy_src: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// Rasterizer viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering a `width × height` target from the origin
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Source rectangle of a region copy, in texels; `right`/`bottom` are exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CopyRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CopyRegion {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Traits
// ─────────────────────────────────────────────────────────────────────────────

/// A graphics device able to create the engine's resources
pub trait GpuDevice {
    type Program;
    type InputLayout;
    type Buffer;
    type Sampler;
    type BlendState;
    type RasterizerState;
    type Texture;
    /// Shader-readable view over a texture; also what the draw list composites
    type ReadView;
    /// Render-target view over a texture
    type WriteView;
    /// Immediate context derived from this device
    type Context: GpuContext<Self>;

    fn id(&self) -> DeviceId;

    /// Shading language the device compiles
    fn dialect(&self) -> ShaderDialect;

    fn immediate_context(&self) -> Self::Context;

    fn compile_program(&self, source: &ProgramSource) -> Result<Self::Program, GpuError>;

    fn create_input_layout(
        &self,
        elements: &[VertexElement],
        stride: u32,
        vertex_program: &Self::Program,
    ) -> Result<Self::InputLayout, GpuError>;

    /// Immutable vertex buffer initialized with `contents`
    fn create_vertex_buffer(&self, label: &'static str, contents: &[u8])
        -> Result<Self::Buffer, GpuError>;

    /// CPU-writable constant buffer of `size` bytes
    fn create_constant_buffer(&self, label: &'static str, size: u64)
        -> Result<Self::Buffer, GpuError>;

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler, GpuError>;

    fn create_blend_state(&self, desc: &BlendDesc) -> Result<Self::BlendState, GpuError>;

    fn create_rasterizer_state(&self, desc: &RasterizerDesc)
        -> Result<Self::RasterizerState, GpuError>;

    fn create_texture(&self, desc: &TextureDesc) -> Result<Self::Texture, GpuError>;

    fn create_read_view(&self, texture: &Self::Texture) -> Result<Self::ReadView, GpuError>;

    fn create_write_view(&self, texture: &Self::Texture) -> Result<Self::WriteView, GpuError>;
}

/// Immediate rendering context of a [`GpuDevice`]
///
/// Setters change bound state; [`GpuContext::draw`] consumes it. The color target and
/// viewport the host had bound are borrowed: the engine snapshots them with
/// [`GpuContext::save_output_state`] and puts them back with
/// [`GpuContext::restore_output_state`].
pub trait GpuContext<D: GpuDevice + ?Sized> {
    /// Host render target + viewport snapshot
    type OutputState;

    fn save_output_state(&mut self) -> Self::OutputState;

    fn restore_output_state(&mut self, state: Self::OutputState);

    /// Copy `region` of the currently bound color target into `dst` at (0, 0)
    ///
    /// Fails with [`GpuError::NoBoundTarget`] when nothing is bound.
    fn copy_from_bound_target(&mut self, dst: &D::Texture, region: CopyRegion)
        -> Result<(), GpuError>;

    /// Replace the whole contents of a constant buffer
    fn write_constants(&mut self, buffer: &D::Buffer, data: &[u8]) -> Result<(), GpuError>;

    fn set_vertex_buffer(
        &mut self,
        buffer: &D::Buffer,
        stride: u32,
        layout: &D::InputLayout,
        topology: Topology,
    );

    fn set_vertex_program(&mut self, program: &D::Program);

    fn set_fragment_program(&mut self, program: &D::Program);

    fn set_constant_buffer(&mut self, slot: u32, buffer: &D::Buffer);

    fn set_sampler(&mut self, slot: u32, sampler: &D::Sampler);

    fn set_rasterizer_state(&mut self, state: &D::RasterizerState);

    fn set_blend_state(&mut self, state: &D::BlendState);

    fn set_viewport(&mut self, viewport: Viewport);

    fn set_render_target(&mut self, target: &D::WriteView);

    /// Bind (or with `None`, unbind) the texture read by fragment programs
    fn set_shader_input(&mut self, slot: u32, view: Option<&D::ReadView>);

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<(), GpuError>;
}

//! Recording mock backend shared by the integration tests
//!
//! Every device and context call is appended to a shared log, every resource counts
//! itself live until dropped, and individual calls can be made to fail.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use frost_core::gpu::{
    BlendDesc, CopyRegion, DeviceId, GpuContext, GpuDevice, RasterizerDesc, SamplerDesc,
    TextureDesc, Topology, VertexElement, Viewport,
};
use frost_core::shaders::{ProgramSource, ShaderDialect};
use frost_core::GpuError;

/// Id of the render target the "host" keeps bound between frames
pub const HOST_TARGET: u64 = 0;

pub const CAPTURE_TEXTURE: &str = "Blur Capture Texture";
pub const INTERMEDIATE_TEXTURE: &str = "Blur Intermediate Texture";
pub const FINAL_TEXTURE: &str = "Blur Final Texture";

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ImmediateContext,
    Compile(&'static str),
    CreateInputLayout,
    CreateBuffer(&'static str),
    CreateSampler,
    CreateBlendState,
    CreateRasterizerState,
    CreateTexture {
        label: &'static str,
        width: u32,
        height: u32,
    },
    CreateReadView(&'static str),
    CreateWriteView(&'static str),
    Copy {
        dst: &'static str,
        region: CopyRegion,
    },
    WriteConstants([f32; 4]),
    SaveOutputState,
    RestoreOutputState,
    SetRenderTarget(&'static str),
    SetFragmentProgram(&'static str),
    SetShaderInput {
        slot: u32,
        view: Option<&'static str>,
    },
    SetViewport(Viewport),
    /// Any other state setter
    Bind(&'static str),
    Draw(u32),
}

/// Calls that should fail
#[derive(Clone, Debug, Default)]
pub struct Faults {
    pub compile: Option<&'static str>,
    pub texture: Option<&'static str>,
    pub read_view: Option<&'static str>,
    pub write_view: Option<&'static str>,
    pub draw: bool,
}

#[derive(Debug, Default)]
pub struct MockState {
    next_id: Cell<u64>,
    calls: RefCell<Vec<Call>>,
    live: RefCell<HashMap<&'static str, i64>>,
    faults: RefCell<Faults>,
    bound_target: Cell<Option<u64>>,
    viewport: Cell<Option<Viewport>>,
}

impl MockState {
    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn track(self: &Rc<Self>, label: &'static str) -> Resource {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        *self.live.borrow_mut().entry(label).or_insert(0) += 1;
        Resource {
            id,
            label,
            state: Rc::clone(self),
        }
    }
}

/// Any mock device object; counts as live until dropped
#[derive(Debug)]
pub struct Resource {
    pub id: u64,
    pub label: &'static str,
    state: Rc<MockState>,
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        if let Some(count) = self.state.live.borrow_mut().get_mut(self.label) {
            *count -= 1;
        }
    }
}

/// Read views are cloned into draw lists, so they share one live count
pub type MockReadView = Rc<Resource>;

#[derive(Clone, Debug)]
pub struct MockDevice {
    id: u64,
    state: Rc<MockState>,
}

impl MockDevice {
    pub fn new(id: u64) -> Self {
        let state = MockState::default();
        state.bound_target.set(Some(HOST_TARGET));
        state.viewport.set(Some(Viewport::full(1920, 1080)));
        Self {
            id,
            state: Rc::new(state),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.borrow_mut().clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.state.calls.borrow().iter().filter(|c| matches(c)).count()
    }

    /// Number of live objects created under `label`
    pub fn live(&self, label: &'static str) -> i64 {
        self.state.live.borrow().get(label).copied().unwrap_or(0)
    }

    /// Number of live objects of any kind
    pub fn live_total(&self) -> i64 {
        self.state.live.borrow().values().sum()
    }

    pub fn faults(&self) -> std::cell::RefMut<'_, Faults> {
        self.state.faults.borrow_mut()
    }

    pub fn bind_host_target(&self, target: Option<u64>) {
        self.state.bound_target.set(target);
    }

    pub fn bound_target(&self) -> Option<u64> {
        self.state.bound_target.get()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.viewport.get()
    }

    fn creation_error(what: &'static str) -> GpuError {
        GpuError::Creation {
            what,
            message: "injected failure".into(),
        }
    }
}

impl GpuDevice for MockDevice {
    type Program = Resource;
    type InputLayout = Resource;
    type Buffer = Resource;
    type Sampler = Resource;
    type BlendState = Resource;
    type RasterizerState = Resource;
    type Texture = Resource;
    type ReadView = MockReadView;
    type WriteView = Resource;
    type Context = MockContext;

    fn id(&self) -> DeviceId {
        DeviceId(self.id)
    }

    fn dialect(&self) -> ShaderDialect {
        ShaderDialect::Hlsl
    }

    fn immediate_context(&self) -> MockContext {
        self.state.record(Call::ImmediateContext);
        MockContext {
            state: Rc::clone(&self.state),
        }
    }

    fn compile_program(&self, source: &ProgramSource) -> Result<Resource, GpuError> {
        self.state.record(Call::Compile(source.label));
        if self.state.faults.borrow().compile == Some(source.label) {
            return Err(GpuError::Compile {
                label: source.label.to_string(),
                message: "injected failure".into(),
            });
        }
        Ok(self.state.track(source.label))
    }

    fn create_input_layout(
        &self,
        _elements: &[VertexElement],
        _stride: u32,
        _vertex_program: &Resource,
    ) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateInputLayout);
        Ok(self.state.track("input layout"))
    }

    fn create_vertex_buffer(
        &self,
        label: &'static str,
        _contents: &[u8],
    ) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateBuffer(label));
        Ok(self.state.track(label))
    }

    fn create_constant_buffer(&self, label: &'static str, _size: u64) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateBuffer(label));
        Ok(self.state.track(label))
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateSampler);
        Ok(self.state.track(desc.label))
    }

    fn create_blend_state(&self, desc: &BlendDesc) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateBlendState);
        Ok(self.state.track(desc.label))
    }

    fn create_rasterizer_state(&self, desc: &RasterizerDesc) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateRasterizerState);
        Ok(self.state.track(desc.label))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateTexture {
            label: desc.label,
            width: desc.width,
            height: desc.height,
        });
        if self.state.faults.borrow().texture == Some(desc.label) {
            return Err(Self::creation_error("texture"));
        }
        Ok(self.state.track(desc.label))
    }

    fn create_read_view(&self, texture: &Resource) -> Result<MockReadView, GpuError> {
        self.state.record(Call::CreateReadView(texture.label));
        if self.state.faults.borrow().read_view == Some(texture.label) {
            return Err(Self::creation_error("shader resource view"));
        }
        Ok(Rc::new(self.state.track(texture.label)))
    }

    fn create_write_view(&self, texture: &Resource) -> Result<Resource, GpuError> {
        self.state.record(Call::CreateWriteView(texture.label));
        if self.state.faults.borrow().write_view == Some(texture.label) {
            return Err(Self::creation_error("render target view"));
        }
        Ok(self.state.track(texture.label))
    }
}

#[derive(Debug)]
pub struct MockContext {
    state: Rc<MockState>,
}

/// Host binding snapshot; `None` target means nothing was bound
pub struct MockOutputState {
    target: Option<u64>,
    viewport: Option<Viewport>,
}

impl GpuContext<MockDevice> for MockContext {
    type OutputState = MockOutputState;

    fn save_output_state(&mut self) -> MockOutputState {
        self.state.record(Call::SaveOutputState);
        MockOutputState {
            target: self.state.bound_target.get(),
            viewport: self.state.viewport.get(),
        }
    }

    fn restore_output_state(&mut self, saved: MockOutputState) {
        self.state.record(Call::RestoreOutputState);
        self.state.bound_target.set(saved.target);
        self.state.viewport.set(saved.viewport);
    }

    fn copy_from_bound_target(&mut self, dst: &Resource, region: CopyRegion) -> Result<(), GpuError> {
        if self.state.bound_target.get().is_none() {
            return Err(GpuError::NoBoundTarget);
        }
        self.state.record(Call::Copy {
            dst: dst.label,
            region,
        });
        Ok(())
    }

    fn write_constants(&mut self, _buffer: &Resource, data: &[u8]) -> Result<(), GpuError> {
        let constants: [f32; 4] = bytemuck::pod_read_unaligned(&data[..16]);
        self.state.record(Call::WriteConstants(constants));
        Ok(())
    }

    fn set_vertex_buffer(
        &mut self,
        _buffer: &Resource,
        _stride: u32,
        _layout: &Resource,
        _topology: Topology,
    ) {
        self.state.record(Call::Bind("vertex buffer"));
    }

    fn set_vertex_program(&mut self, _program: &Resource) {
        self.state.record(Call::Bind("vertex program"));
    }

    fn set_fragment_program(&mut self, program: &Resource) {
        self.state.record(Call::SetFragmentProgram(program.label));
    }

    fn set_constant_buffer(&mut self, _slot: u32, _buffer: &Resource) {
        self.state.record(Call::Bind("constant buffer"));
    }

    fn set_sampler(&mut self, _slot: u32, _sampler: &Resource) {
        self.state.record(Call::Bind("sampler"));
    }

    fn set_rasterizer_state(&mut self, _state: &Resource) {
        self.state.record(Call::Bind("rasterizer state"));
    }

    fn set_blend_state(&mut self, _state: &Resource) {
        self.state.record(Call::Bind("blend state"));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.state.record(Call::SetViewport(viewport));
        self.state.viewport.set(Some(viewport));
    }

    fn set_render_target(&mut self, target: &Resource) {
        self.state.record(Call::SetRenderTarget(target.label));
        self.state.bound_target.set(Some(target.id));
    }

    fn set_shader_input(&mut self, slot: u32, view: Option<&MockReadView>) {
        self.state.record(Call::SetShaderInput {
            slot,
            view: view.map(|v| v.label),
        });
    }

    fn draw(&mut self, vertex_count: u32, _first_vertex: u32) -> Result<(), GpuError> {
        if self.state.faults.borrow().draw {
            return Err(GpuError::Backend("injected draw failure".into()));
        }
        self.state.record(Call::Draw(vertex_count));
        Ok(())
    }
}

pub fn is_capture(call: &Call) -> bool {
    matches!(call, Call::Copy { .. })
}

pub fn is_texture_allocation(call: &Call) -> bool {
    matches!(call, Call::CreateTexture { .. })
}

pub fn is_compile(call: &Call) -> bool {
    matches!(call, Call::Compile(_))
}

pub fn is_draw(call: &Call) -> bool {
    matches!(call, Call::Draw(_))
}

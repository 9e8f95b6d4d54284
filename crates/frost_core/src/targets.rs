//! Size-scoped render target pool
//!
//! Three textures of identical size back one blur:
//! - **capture**: copy of the host pixels behind the region (read view only)
//! - **intermediate**: horizontal pass output (read + write views)
//! - **final**: vertical pass output, composited by the draw list (read + write views)
//!
//! Textures are never resized in place; any dimension change releases the whole set
//! and allocates a new one.

use crate::error::{GpuError, TargetAllocError, TargetKind, ViewKind};
use crate::gpu::{GpuDevice, TextureDesc, TextureFormat, TextureUsage};

/// A texture that is both sampled and rendered into
pub struct RenderTexture<D: GpuDevice> {
    pub texture: D::Texture,
    pub read_view: D::ReadView,
    pub write_view: D::WriteView,
}

/// Capture, intermediate and final textures at one size
pub struct TextureSet<D: GpuDevice> {
    width: u32,
    height: u32,
    pub capture: D::Texture,
    pub capture_view: D::ReadView,
    pub intermediate: RenderTexture<D>,
    pub output: RenderTexture<D>,
}

impl<D: GpuDevice> TextureSet<D> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One texture and the views its usage asks for
struct AllocatedTexture<D: GpuDevice> {
    texture: D::Texture,
    read_view: Option<D::ReadView>,
    write_view: Option<D::WriteView>,
}

/// Allocate one texture plus its views
///
/// A failed view drops the texture before returning, so a caller never holds half of
/// an allocation.
fn allocate_texture<D: GpuDevice>(
    device: &D,
    target: TargetKind,
    label: &'static str,
    width: u32,
    height: u32,
    usage: TextureUsage,
) -> Result<AllocatedTexture<D>, TargetAllocError> {
    let texture = device
        .create_texture(&TextureDesc {
            label,
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            usage,
        })
        .map_err(|source| TargetAllocError::Texture { target, source })?;

    let write_view = if usage.render_target {
        let view = device
            .create_write_view(&texture)
            .map_err(|source| TargetAllocError::View {
                target,
                view: ViewKind::Write,
                source,
            })?;
        Some(view)
    } else {
        None
    };

    let read_view = if usage.sampled {
        let view = device
            .create_read_view(&texture)
            .map_err(|source| TargetAllocError::View {
                target,
                view: ViewKind::Read,
                source,
            })?;
        Some(view)
    } else {
        None
    };

    Ok(AllocatedTexture {
        texture,
        read_view,
        write_view,
    })
}

fn missing_view(target: TargetKind, view: ViewKind) -> TargetAllocError {
    TargetAllocError::View {
        target,
        view,
        source: GpuError::MissingBinding("texture usage has no such view"),
    }
}

fn allocate_render_texture<D: GpuDevice>(
    device: &D,
    target: TargetKind,
    label: &'static str,
    width: u32,
    height: u32,
) -> Result<RenderTexture<D>, TargetAllocError> {
    let allocated = allocate_texture(
        device,
        target,
        label,
        width,
        height,
        TextureUsage::RENDER_TARGET,
    )?;
    let read_view = allocated
        .read_view
        .ok_or_else(|| missing_view(target, ViewKind::Read))?;
    let write_view = allocated
        .write_view
        .ok_or_else(|| missing_view(target, ViewKind::Write))?;

    Ok(RenderTexture {
        texture: allocated.texture,
        read_view,
        write_view,
    })
}

impl<D: GpuDevice> TextureSet<D> {
    /// Allocate all three textures, or none of them
    pub fn allocate(device: &D, width: u32, height: u32) -> Result<Self, TargetAllocError> {
        let capture = allocate_texture(
            device,
            TargetKind::Capture,
            "Blur Capture Texture",
            width,
            height,
            TextureUsage::CAPTURE,
        )?;
        let capture_view = capture
            .read_view
            .ok_or_else(|| missing_view(TargetKind::Capture, ViewKind::Read))?;

        let intermediate = allocate_render_texture(
            device,
            TargetKind::Intermediate,
            "Blur Intermediate Texture",
            width,
            height,
        )?;
        let output = allocate_render_texture(
            device,
            TargetKind::Final,
            "Blur Final Texture",
            width,
            height,
        )?;

        Ok(Self {
            width,
            height,
            capture: capture.texture,
            capture_view,
            intermediate,
            output,
        })
    }
}

/// Holds at most one [`TextureSet`] sized to the blurred region
pub struct RenderTargetPool<D: GpuDevice> {
    set: Option<TextureSet<D>>,
    allocations: u64,
}

impl<D: GpuDevice> RenderTargetPool<D> {
    pub fn new() -> Self {
        Self {
            set: None,
            allocations: 0,
        }
    }

    /// Make sure a set of exactly `width × height` exists
    ///
    /// No-op when the current set already has that size. Otherwise the current set is
    /// released first, then a new one allocated; on failure the pool is left empty.
    pub fn ensure(
        &mut self,
        device: &D,
        width: u32,
        height: u32,
    ) -> Result<&TextureSet<D>, TargetAllocError> {
        let set = match self.set.take() {
            Some(set) if set.dimensions() == (width, height) => set,
            previous => {
                if let Some(previous) = previous {
                    tracing::debug!(
                        "blur render targets released: {}x{}",
                        previous.width(),
                        previous.height()
                    );
                }
                let set = TextureSet::allocate(device, width, height).map_err(|err| {
                    tracing::warn!("blur render targets {}x{} failed: {}", width, height, err);
                    err
                })?;
                tracing::debug!("blur render targets allocated: {}x{}", width, height);
                self.allocations += 1;
                set
            }
        };

        Ok(self.set.insert(set))
    }

    /// Drop the current set, if any
    pub fn release(&mut self) {
        if let Some(set) = self.set.take() {
            tracing::debug!(
                "blur render targets released: {}x{}",
                set.width(),
                set.height()
            );
        }
    }

    pub fn current(&self) -> Option<&TextureSet<D>> {
        self.set.as_ref()
    }

    /// Number of texture sets allocated over the pool's lifetime
    pub fn allocations(&self) -> u64 {
        self.allocations
    }
}

impl<D: GpuDevice> Default for RenderTargetPool<D> {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types
//!
//! Every failure here is recoverable: the worst outcome is that the overlay is not
//! shown for a frame. [`crate::BlurRenderer::render`] folds these into its boolean
//! result; [`crate::BlurRenderer::try_render`] exposes them.

use std::fmt;

use thiserror::Error;

/// Failures reported by a GPU backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuError {
    /// Program source failed to compile
    #[error("Shader compilation failed for {label}: {message}")]
    Compile { label: String, message: String },

    /// A device object could not be created
    #[error("Failed to create {what}: {message}")]
    Creation { what: &'static str, message: String },

    /// The host has no color render target bound on the context
    #[error("No render target is bound")]
    NoBoundTarget,

    /// The copy region does not overlap the bound render target
    #[error("Copy region ({left}, {top}) lies outside the {width}x{height} bound target")]
    RegionOutsideTarget {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },

    /// Source and destination of a copy have incompatible formats
    #[error("Incompatible texture format: {0}")]
    IncompatibleFormat(String),

    /// A draw was issued with a required binding missing
    #[error("Missing pipeline binding: {0}")]
    MissingBinding(&'static str),

    /// Generic backend error
    #[error("GPU backend error: {0}")]
    Backend(String),
}

/// Which texture of the render target pool an allocation was for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Capture,
    Intermediate,
    Final,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Capture => write!(f, "capture"),
            TargetKind::Intermediate => write!(f, "intermediate"),
            TargetKind::Final => write!(f, "final"),
        }
    }
}

/// Which view over a texture failed to be created
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Read,
    Write,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Read => write!(f, "read"),
            ViewKind::Write => write!(f, "write"),
        }
    }
}

/// Render target allocation failure
///
/// Distinguishes a failed texture allocation from a texture that was created but
/// whose view could not be; either way nothing of the set survives.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TargetAllocError {
    #[error("{target} texture allocation failed: {source}")]
    Texture {
        target: TargetKind,
        #[source]
        source: GpuError,
    },

    #[error("{target} texture {view} view creation failed: {source}")]
    View {
        target: TargetKind,
        view: ViewKind,
        #[source]
        source: GpuError,
    },
}

/// Renderer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlurError {
    /// No device handle in the request
    #[error("No graphics device supplied")]
    MissingDevice,

    /// No draw list in the request
    #[error("No draw list supplied")]
    MissingDrawList,

    /// Window size truncates to zero or negative pixels
    #[error("Degenerate window size {width}x{height}")]
    DegenerateSize { width: i64, height: i64 },

    /// Programs or fixed-function state could not be created
    #[error("Pipeline initialization failed: {0}")]
    PipelineInit(#[source] GpuError),

    /// Render target pool could not be (re)allocated
    #[error("Render target allocation failed: {0}")]
    TargetAllocation(#[from] TargetAllocError),

    /// Copying the background out of the host target failed
    #[error("Background capture failed: {0}")]
    Capture(#[source] GpuError),

    /// The capture rectangle has no area after clamping
    #[error("Capture region is empty after clamping")]
    EmptyCaptureRegion,

    /// One of the blur passes failed
    #[error("Blur processing failed: {0}")]
    Process(#[source] GpuError),
}

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, BlurError>;

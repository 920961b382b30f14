use std::path::PathBuf;
use thiserror::Error;

use crate::renderer::commands::ResourceState;

/// Failures while reading a model, its material, or the diffuse texture.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("{}:{line}: {kind} index {index} out of range ({len} defined so far)", path.display())]
    IndexOutOfRange {
        path: PathBuf,
        line: usize,
        kind: &'static str,
        index: i64,
        len: usize,
    },
    #[error("{}:{line}: face has {corners} corners, only triangles are supported", path.display())]
    NonTriangularFace {
        path: PathBuf,
        line: usize,
        corners: usize,
    },
    #[error("material {} has no map_Kd directive", path.display())]
    MissingDiffuseMap { path: PathBuf },
    #[error("failed to decode image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
}

/// Resource-state and ordering violations found while recording a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("command list is closed; reset it before recording")]
    ListClosed,
    #[error("command list must be closed before it is executed")]
    ListOpen,
    #[error("back buffer {index} does not exist ({count} back buffers)")]
    NoSuchBackBuffer { index: usize, count: usize },
    #[error("back buffer {index} transitioned from {expected:?} but is tracked as {actual:?}")]
    StateMismatch {
        index: usize,
        expected: ResourceState,
        actual: ResourceState,
    },
    #[error("back buffer {index} used as a render target while in {actual:?} state")]
    NotRenderTarget { index: usize, actual: ResourceState },
    #[error("back buffer {index} left in {actual:?} state at close")]
    NotPresentable { index: usize, actual: ResourceState },
    #[error("{0} issued before a render target was bound")]
    NoRenderTarget(&'static str),
    #[error("draw issued before a vertex buffer was bound")]
    NoVertexBuffer,
    #[error("draw of {requested} vertices exceeds bound vertex buffer of {available}")]
    DrawOutOfRange { requested: u32, available: u32 },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create GPU resource: {0}")]
    ResourceCreation(String),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("fence wait for value {value} returned with completed value {completed}")]
    Sync { value: u64, completed: u64 },
    #[error("present called without an acquired back buffer")]
    NothingToPresent,
    #[error("frame {pending} is still in flight (completed value {completed})")]
    FrameInFlight { pending: u64, completed: u64 },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

//! The GPU seam. The frame pipeline only talks to these traits; `WgpuContext`
//! is the real implementation and tests substitute a recording fake.

pub mod mapping;
pub mod pipeline;
pub mod wgpu_context;
#[cfg(test)]
pub(crate) mod fake;

pub use mapping::{ConstantBuffer, ConstantWriter};
pub use wgpu_context::WgpuContext;

use crate::error::RenderError;
use crate::renderer::commands::CommandList;
use crate::renderer::constants::SceneConstants;

/// Fence and back-buffer state of the presentation queue.
pub trait FrameSync {
    /// Enqueues a signal that raises the completed value to `value` once all
    /// work submitted so far has retired.
    fn signal(&mut self, value: u64) -> Result<(), RenderError>;

    /// Highest value the GPU has reported as retired.
    fn completed_value(&self) -> u64;

    /// Blocks until `completed_value() >= value`. There is no timeout.
    fn wait_for(&mut self, value: u64) -> Result<(), RenderError>;

    fn current_back_buffer_index(&self) -> usize;
}

pub trait GpuContext: FrameSync {
    fn upload_constants(&mut self, constants: &SceneConstants) -> Result<(), RenderError>;

    /// Submits a closed command list to the queue.
    fn execute(&mut self, list: &CommandList) -> Result<(), RenderError>;

    fn present(&mut self) -> Result<(), RenderError>;
}

//! Recording stand-in for a GPU, used by the frame pipeline tests.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use super::{FrameSync, GpuContext};
use crate::error::RenderError;
use crate::renderer::commands::{Command, CommandList};
use crate::renderer::constants::SceneConstants;
use crate::renderer::scheduler::FRAME_COUNT;

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    Upload,
    Execute,
    Present,
    Signal(u64),
    Wait(u64),
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub completed: u64,
    /// Signals only retire once somebody waits for them.
    pub lagging: bool,
    /// Waits return without the GPU making progress.
    pub stalled: bool,
    pub pending: u64,
    pub back_buffer: usize,
    /// Overrides the buffer the next present hands back.
    pub next_back_buffer: Option<usize>,
    pub fail_present: bool,
    pub calls: Vec<GpuCall>,
    pub uploads: Vec<SceneConstants>,
    pub lists: Vec<Vec<Command>>,
}

/// Clones share state, so a test can keep a handle after moving the fake
/// into a renderer.
#[derive(Debug, Clone, Default)]
pub struct FakeGpu {
    state: Rc<RefCell<FakeState>>,
}

impl FakeGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lagging() -> Self {
        let gpu = Self::default();
        gpu.state().lagging = true;
        gpu
    }

    pub fn state(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }
}

impl FrameSync for FakeGpu {
    fn signal(&mut self, value: u64) -> Result<(), RenderError> {
        let mut state = self.state();
        state.calls.push(GpuCall::Signal(value));
        if state.lagging {
            state.pending = state.pending.max(value);
        } else {
            state.completed = state.completed.max(value);
        }
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        self.state.borrow().completed
    }

    fn wait_for(&mut self, value: u64) -> Result<(), RenderError> {
        let mut state = self.state();
        state.calls.push(GpuCall::Wait(value));
        if !state.stalled {
            state.completed = state.completed.max(state.pending);
        }
        Ok(())
    }

    fn current_back_buffer_index(&self) -> usize {
        self.state.borrow().back_buffer
    }
}

impl GpuContext for FakeGpu {
    fn upload_constants(&mut self, constants: &SceneConstants) -> Result<(), RenderError> {
        let mut state = self.state();
        state.calls.push(GpuCall::Upload);
        state.uploads.push(*constants);
        Ok(())
    }

    fn execute(&mut self, list: &CommandList) -> Result<(), RenderError> {
        assert!(list.is_closed(), "executed an open command list");
        let mut state = self.state();
        state.calls.push(GpuCall::Execute);
        state.lists.push(list.commands().to_vec());
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let mut state = self.state();
        if state.fail_present {
            return Err(RenderError::Surface(wgpu::SurfaceError::Lost));
        }
        state.calls.push(GpuCall::Present);
        let next = (state.back_buffer + 1) % FRAME_COUNT;
        state.back_buffer = state.next_back_buffer.take().unwrap_or(next);
        Ok(())
    }
}

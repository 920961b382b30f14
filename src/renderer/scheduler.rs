use crate::error::RenderError;
use crate::gpu::FrameSync;

/// Number of back buffers in the swap chain.
pub const FRAME_COUNT: usize = 2;

/// Proof that the previous frame has retired and recording may start.
/// Only `FrameScheduler::begin_frame` creates one.
#[derive(Debug)]
pub struct FrameToken {
    frame_index: usize,
    fence_value: u64,
}

impl FrameToken {
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Value the frame will signal when it ends.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }
}

/// What `end_frame` did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub signaled: u64,
    pub waited: bool,
    pub frame_index: usize,
}

/// One fence, one frame in flight.
///
/// The fence value starts at 1 (0 means "never signaled") and every frame
/// signals the current value before incrementing it. The CPU blocks at the
/// end of each frame until the GPU has caught up, so recording for the next
/// frame never touches state the GPU is still reading.
#[derive(Debug)]
pub struct FrameScheduler {
    fence_value: u64,
    frame_index: usize,
}

impl FrameScheduler {
    pub fn new<S: FrameSync + ?Sized>(sync: &S) -> Self {
        Self {
            fence_value: 1,
            frame_index: sync.current_back_buffer_index() % FRAME_COUNT,
        }
    }

    /// Next value to be signaled.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Checks that the last signaled frame has retired and hands out the
    /// token that allows resetting the command list.
    pub fn begin_frame<S: FrameSync + ?Sized>(&self, sync: &S) -> Result<FrameToken, RenderError> {
        let last_signaled = self.fence_value - 1;
        let completed = sync.completed_value();
        if completed < last_signaled {
            return Err(RenderError::FrameInFlight {
                pending: last_signaled,
                completed,
            });
        }

        Ok(FrameToken {
            frame_index: self.frame_index,
            fence_value: self.fence_value,
        })
    }

    /// Signals the fence, waits for it if the GPU is behind, then resyncs the
    /// back-buffer index from the surface.
    pub fn end_frame<S: FrameSync + ?Sized>(&mut self, sync: &mut S) -> Result<FrameReport, RenderError> {
        let value = self.fence_value;
        sync.signal(value)?;
        self.fence_value += 1;

        let waited = sync.completed_value() < value;
        if waited {
            log::trace!("Waiting for fence value {}", value);
            sync.wait_for(value)?;
        }

        let completed = sync.completed_value();
        if completed < value {
            return Err(RenderError::Sync { value, completed });
        }

        self.frame_index = sync.current_back_buffer_index() % FRAME_COUNT;
        log::trace!(
            "Frame {} retired, next back buffer {}",
            value,
            self.frame_index
        );

        Ok(FrameReport {
            signaled: value,
            waited,
            frame_index: self.frame_index,
        })
    }

    /// Final wait before GPU resources are released. Signals a fresh value so
    /// work submitted by a frame that never reached `end_frame` is covered.
    pub fn flush<S: FrameSync + ?Sized>(&mut self, sync: &mut S) -> Result<(), RenderError> {
        let value = self.fence_value;
        sync.signal(value)?;
        self.fence_value += 1;

        if sync.completed_value() < value {
            log::debug!("Flushing GPU work up to fence value {}", value);
            sync.wait_for(value)?;
        }

        let completed = sync.completed_value();
        if completed < value {
            return Err(RenderError::Sync { value, completed });
        }
        Ok(())
    }
}

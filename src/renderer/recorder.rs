use crate::error::RecordError;
use crate::renderer::commands::{
    Command, CommandList, DescriptorTable, ResourceState, ScissorRect, Viewport,
};
use crate::renderer::scheduler::{FrameToken, FRAME_COUNT};

/// Depth the depth buffer is cleared to.
pub const FAR_DEPTH: f32 = 1.0;

/// Builds the per-frame command sequence into a list it reuses every frame.
#[derive(Debug)]
pub struct FrameRecorder {
    list: CommandList,
    width: u32,
    height: u32,
    background: [f32; 4],
}

impl FrameRecorder {
    pub fn new(width: u32, height: u32, background: [f32; 4]) -> Self {
        Self {
            list: CommandList::new(FRAME_COUNT),
            width,
            height,
            background,
        }
    }

    pub fn list(&self) -> &CommandList {
        &self.list
    }

    /// Resets the list and records one frame for the back buffer named by
    /// `token`. The token proves the previous frame has retired, which is what
    /// makes the reset safe.
    pub fn record(&mut self, token: FrameToken, vertex_count: u32) -> Result<&CommandList, RecordError> {
        let back_buffer = token.frame_index();
        self.list.reset();

        let commands = [
            Command::SetRootSignature,
            Command::SetDescriptorTable(DescriptorTable::SceneConstants),
            Command::SetDescriptorTable(DescriptorTable::Texture),
            Command::SetViewport(Viewport::full(self.width, self.height)),
            Command::SetScissor(ScissorRect::full(self.width, self.height)),
            Command::Transition {
                back_buffer,
                before: ResourceState::Present,
                after: ResourceState::RenderTarget,
            },
            Command::SetRenderTargets {
                back_buffer,
                depth: true,
            },
            Command::ClearRenderTarget {
                back_buffer,
                color: self.background,
            },
            Command::ClearDepth { depth: FAR_DEPTH },
            Command::SetVertexBuffer { vertex_count },
            Command::Draw {
                vertex_count,
                instance_count: 1,
            },
            Command::Transition {
                back_buffer,
                before: ResourceState::RenderTarget,
                after: ResourceState::Present,
            },
        ];

        for command in commands {
            self.list.push(command)?;
        }
        self.list.close()?;

        log::trace!(
            "Recorded {} commands for back buffer {} (fence value {})",
            self.list.len(),
            back_buffer,
            token.fence_value()
        );
        Ok(&self.list)
    }
}

//! Backend-neutral command lists.
//!
//! A frame is recorded as a flat, ordered list of [`Command`]s. Closing the
//! list replays it against a per-back-buffer state tracker, so a missing or
//! mismatched resource transition is caught on the CPU before any backend
//! sees the list.

use crate::error::RecordError;

/// Usage mode of a back buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Present,
    RenderTarget,
}

/// Descriptor tables bound by the root signature, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorTable {
    SceneConstants,
    Texture,
}

impl DescriptorTable {
    pub fn slot(self) -> u32 {
        match self {
            DescriptorTable::SceneConstants => 0,
            DescriptorTable::Texture => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ScissorRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRootSignature,
    SetDescriptorTable(DescriptorTable),
    SetViewport(Viewport),
    SetScissor(ScissorRect),
    Transition {
        back_buffer: usize,
        before: ResourceState,
        after: ResourceState,
    },
    SetRenderTargets { back_buffer: usize, depth: bool },
    ClearRenderTarget { back_buffer: usize, color: [f32; 4] },
    ClearDepth { depth: f32 },
    SetVertexBuffer { vertex_count: u32 },
    Draw { vertex_count: u32, instance_count: u32 },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::SetRootSignature => "SetRootSignature",
            Command::SetDescriptorTable(_) => "SetDescriptorTable",
            Command::SetViewport(_) => "SetViewport",
            Command::SetScissor(_) => "SetScissor",
            Command::Transition { .. } => "Transition",
            Command::SetRenderTargets { .. } => "SetRenderTargets",
            Command::ClearRenderTarget { .. } => "ClearRenderTarget",
            Command::ClearDepth { .. } => "ClearDepth",
            Command::SetVertexBuffer { .. } => "SetVertexBuffer",
            Command::Draw { .. } => "Draw",
        }
    }
}

/// Replays commands against the tracked state of each back buffer.
#[derive(Debug, Clone)]
pub struct ResourceStateTracker {
    states: Vec<ResourceState>,
    bound_target: Option<usize>,
    bound_vertices: Option<u32>,
}

impl ResourceStateTracker {
    /// Every back buffer starts out presentable.
    pub fn new(back_buffers: usize) -> Self {
        Self {
            states: vec![ResourceState::Present; back_buffers],
            bound_target: None,
            bound_vertices: None,
        }
    }

    pub fn state(&self, back_buffer: usize) -> Option<ResourceState> {
        self.states.get(back_buffer).copied()
    }

    fn check_index(&self, index: usize) -> Result<ResourceState, RecordError> {
        self.state(index).ok_or(RecordError::NoSuchBackBuffer {
            index,
            count: self.states.len(),
        })
    }

    fn require_render_target(&self, index: usize) -> Result<(), RecordError> {
        match self.check_index(index)? {
            ResourceState::RenderTarget => Ok(()),
            actual => Err(RecordError::NotRenderTarget { index, actual }),
        }
    }

    fn require_bound_target(&self, command: &Command) -> Result<usize, RecordError> {
        let index = self
            .bound_target
            .ok_or(RecordError::NoRenderTarget(command.name()))?;
        self.require_render_target(index)?;
        Ok(index)
    }

    pub fn apply(&mut self, command: &Command) -> Result<(), RecordError> {
        match *command {
            Command::Transition {
                back_buffer,
                before,
                after,
            } => {
                let actual = self.check_index(back_buffer)?;
                if actual != before {
                    return Err(RecordError::StateMismatch {
                        index: back_buffer,
                        expected: before,
                        actual,
                    });
                }
                self.states[back_buffer] = after;
                if after != ResourceState::RenderTarget && self.bound_target == Some(back_buffer) {
                    self.bound_target = None;
                }
            }
            Command::SetRenderTargets { back_buffer, .. } => {
                self.require_render_target(back_buffer)?;
                self.bound_target = Some(back_buffer);
            }
            Command::ClearRenderTarget { back_buffer, .. } => {
                self.require_render_target(back_buffer)?;
            }
            Command::ClearDepth { .. } => {
                self.require_bound_target(command)?;
            }
            Command::SetVertexBuffer { vertex_count } => {
                self.bound_vertices = Some(vertex_count);
            }
            Command::Draw { vertex_count, .. } => {
                self.require_bound_target(command)?;
                let available = self.bound_vertices.ok_or(RecordError::NoVertexBuffer)?;
                if vertex_count > available {
                    return Err(RecordError::DrawOutOfRange {
                        requested: vertex_count,
                        available,
                    });
                }
            }
            Command::SetRootSignature
            | Command::SetDescriptorTable(_)
            | Command::SetViewport(_)
            | Command::SetScissor(_) => {}
        }
        Ok(())
    }

    /// Every back buffer must be presentable again once the list ends.
    pub fn finish(&self) -> Result<(), RecordError> {
        for (index, state) in self.states.iter().enumerate() {
            if *state != ResourceState::Present {
                return Err(RecordError::NotPresentable {
                    index,
                    actual: *state,
                });
            }
        }
        Ok(())
    }
}

/// Ordered commands for one frame plus the open/closed state of the list.
#[derive(Debug, Clone)]
pub struct CommandList {
    commands: Vec<Command>,
    back_buffers: usize,
    closed: bool,
}

impl CommandList {
    pub fn new(back_buffers: usize) -> Self {
        Self {
            commands: Vec::new(),
            back_buffers,
            closed: false,
        }
    }

    /// Drops the previous frame's commands, keeping the allocation.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.closed = false;
    }

    pub fn push(&mut self, command: Command) -> Result<(), RecordError> {
        if self.closed {
            return Err(RecordError::ListClosed);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Validates resource states over the whole list and seals it.
    pub fn close(&mut self) -> Result<(), RecordError> {
        if self.closed {
            return Err(RecordError::ListClosed);
        }

        let mut tracker = ResourceStateTracker::new(self.back_buffers);
        for command in &self.commands {
            tracker.apply(command)?;
        }
        tracker.finish()?;

        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn back_buffers(&self) -> usize {
        self.back_buffers
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A closed list flattened into the shape of a single render pass: which back
/// buffer to target, how to clear it, and what to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub back_buffer: usize,
    pub depth: bool,
    pub tables: Vec<DescriptorTable>,
    pub viewport: Option<Viewport>,
    pub scissor: Option<ScissorRect>,
    pub clear_color: Option<[f32; 4]>,
    pub clear_depth: Option<f32>,
    pub vertex_count: u32,
    pub draws: Vec<(u32, u32)>,
}

impl PassPlan {
    pub fn from_list(list: &CommandList) -> Result<Self, RecordError> {
        if !list.is_closed() {
            return Err(RecordError::ListOpen);
        }

        let mut target = None;
        let mut plan = PassPlan {
            back_buffer: 0,
            depth: false,
            tables: Vec::new(),
            viewport: None,
            scissor: None,
            clear_color: None,
            clear_depth: None,
            vertex_count: 0,
            draws: Vec::new(),
        };

        for command in list.commands() {
            match *command {
                Command::SetDescriptorTable(table) => plan.tables.push(table),
                Command::SetViewport(viewport) => plan.viewport = Some(viewport),
                Command::SetScissor(scissor) => plan.scissor = Some(scissor),
                Command::SetRenderTargets { back_buffer, depth } => {
                    target = Some(back_buffer);
                    plan.depth = depth;
                }
                Command::ClearRenderTarget { color, .. } => plan.clear_color = Some(color),
                Command::ClearDepth { depth } => plan.clear_depth = Some(depth),
                Command::SetVertexBuffer { vertex_count } => plan.vertex_count = vertex_count,
                Command::Draw {
                    vertex_count,
                    instance_count,
                } => plan.draws.push((vertex_count, instance_count)),
                Command::SetRootSignature | Command::Transition { .. } => {}
            }
        }

        plan.back_buffer = target.ok_or(RecordError::NoRenderTarget("render pass"))?;
        Ok(plan)
    }
}

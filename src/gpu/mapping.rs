use std::num::NonZeroU64;

use crate::error::RenderError;
use crate::renderer::constants::SceneConstants;

/// The session-long uniform buffer holding `SceneConstants`.
pub struct ConstantBuffer {
    buffer: wgpu::Buffer,
}

impl ConstantBuffer {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Constants Buffer"),
            size: SceneConstants::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Maps the whole buffer for writing. The write is committed when the
    /// returned writer drops, including on early returns.
    pub fn writer<'a>(&'a self, queue: &'a wgpu::Queue) -> Result<ConstantWriter<'a>, RenderError> {
        let size = NonZeroU64::new(SceneConstants::SIZE).ok_or_else(|| {
            RenderError::ResourceCreation("constant buffer has zero size".to_string())
        })?;
        let view = queue
            .write_buffer_with(&self.buffer, 0, size)
            .ok_or_else(|| RenderError::ResourceCreation("failed to map constant buffer".to_string()))?;
        Ok(ConstantWriter { view })
    }
}

/// Scoped CPU-visible window into the constant buffer.
pub struct ConstantWriter<'a> {
    view: wgpu::QueueWriteBufferView<'a>,
}

impl ConstantWriter<'_> {
    pub fn write(&mut self, constants: &SceneConstants) {
        self.view.copy_from_slice(constants.as_bytes());
    }
}

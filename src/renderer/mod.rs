pub mod commands;
pub mod constants;
pub mod recorder;
pub mod scheduler;
#[cfg(test)]
mod tests;

pub use commands::{Command, CommandList, DescriptorTable, ResourceState, ResourceStateTracker};
pub use constants::{compute_constants, SceneConstants};
pub use recorder::FrameRecorder;
pub use scheduler::{FrameReport, FrameScheduler, FrameToken, FRAME_COUNT};

use glam::Vec3;

use crate::config::ViewerConfig;
use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::model::{MaterialRef, Mesh};
use crate::scene::{Camera, InputState, Scene, WorldTransform};

/// Refuses meshes there is nothing to draw for.
pub fn ensure_drawable(mesh: &Mesh) -> Result<(), RenderError> {
    if mesh.is_empty() {
        return Err(RenderError::ResourceCreation(format!(
            "mesh '{}' has no triangles",
            mesh.name
        )));
    }
    Ok(())
}

/// Ties the scene, the frame pipeline and the GPU together. Owns the mesh
/// and material for as long as the scene is loaded.
pub struct Renderer<G: GpuContext> {
    gpu: G,
    scheduler: FrameScheduler,
    recorder: FrameRecorder,
    scene: Scene,
    input: InputState,
    mesh: Mesh,
    material: MaterialRef,
    aspect: f32,
    constants: SceneConstants,
    frames: u64,
    shut_down: bool,
}

impl<G: GpuContext> Renderer<G> {
    pub fn new(gpu: G, mesh: Mesh, material: MaterialRef, config: &ViewerConfig) -> Result<Self, RenderError> {
        ensure_drawable(&mesh)?;

        let scheduler = FrameScheduler::new(&gpu);
        let camera = Camera::new(config.rotation_speed, config.move_speed);
        let world = WorldTransform::new(Vec3::from(config.model_offset), config.spin);

        log::info!(
            "Renderer ready: {} vertices, material '{}', {}x{}",
            mesh.vertex_count(),
            material.name,
            config.width,
            config.height
        );

        Ok(Self {
            gpu,
            scheduler,
            recorder: FrameRecorder::new(config.width, config.height, config.background),
            scene: Scene::new(camera, world),
            input: InputState::new(config.mouse_queue_capacity),
            mesh,
            material,
            aspect: config.aspect_ratio(),
            constants: SceneConstants::default(),
            frames: 0,
            shut_down: false,
        })
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Constants uploaded by the most recent tick.
    pub fn constants(&self) -> &SceneConstants {
        &self.constants
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Runs one frame: input, constants, record, submit, present, then the
    /// end-of-frame fence wait. Any error is fatal to the frame loop.
    ///
    /// The constant buffer is only written once the previous frame has retired.
    pub fn tick(&mut self) -> Result<FrameReport, RenderError> {
        let token = self.scheduler.begin_frame(&self.gpu)?;

        let input = self.input.take_frame_input();
        self.scene.update(input);

        self.constants = compute_constants(
            self.scene.world_matrix(),
            self.scene.view_matrix(),
            self.aspect,
        );
        self.gpu.upload_constants(&self.constants)?;

        let list = self.recorder.record(token, self.mesh.vertex_count())?;
        self.gpu.execute(list)?;
        self.gpu.present()?;

        let report = self.scheduler.end_frame(&mut self.gpu)?;
        self.frames += 1;
        Ok(report)
    }

    /// Waits for all submitted GPU work. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<(), RenderError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.scheduler.flush(&mut self.gpu)?;
        log::info!("Renderer shut down after {} frames", self.frames);
        Ok(())
    }
}

impl<G: GpuContext> Drop for Renderer<G> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Final GPU wait failed: {}", e);
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use winit::window::Window;

pub mod app;
pub mod config;
pub mod error;
pub mod gpu;
pub mod model;
pub mod renderer;
pub mod scene;

pub use app::{Message, MessageKind, MessageTable, Viewer};
pub use config::ViewerConfig;
pub use error::{LoadError, RecordError, RenderError};
pub use gpu::{FrameSync, GpuContext, WgpuContext};
pub use renderer::Renderer;

use model::{ImageFileDecoder, MeshOptions, SceneAssets};

/// Loads the model named by `config`, brings up the GPU on `window` and wires
/// both into a viewer. Nothing is drawn if any step fails.
pub fn create_viewer(window: Arc<Window>, config: &ViewerConfig) -> anyhow::Result<Viewer<WgpuContext>> {
    let options = MeshOptions { color: config.color };
    let assets = SceneAssets::load(&config.model, options, &ImageFileDecoder)
        .with_context(|| format!("Failed to load model {}", config.model.display()))?;
    renderer::ensure_drawable(&assets.mesh)?;

    let gpu = WgpuContext::new(window, &assets.mesh, &assets.texture, config)
        .context("Failed to initialize GPU")?;

    let SceneAssets { mesh, material, .. } = assets;
    let renderer = Renderer::new(gpu, mesh, material, config)?;
    Ok(Viewer::new(renderer))
}

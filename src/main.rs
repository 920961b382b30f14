use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use winit::{
    dpi::PhysicalSize,
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};
use wgpu_mesh_viewer::{config::parse_color, create_viewer, Message, RenderError, ViewerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to display (.obj with a material file next to it)
    #[arg(default_value = "assets/cube.obj")]
    model: PathBuf,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Milliseconds between animation ticks
    #[arg(long, default_value_t = 15)]
    tick_ms: u64,

    /// Vertex tint as r,g,b[,a]
    #[arg(long, value_parser = parse_color)]
    color: Option<[f32; 4]>,

    /// Clear color as r,g,b[,a]
    #[arg(long, value_parser = parse_color)]
    background: Option<[f32; 4]>,

    /// Spin the model
    #[arg(long)]
    spin: bool,

    /// Present as fast as possible instead of waiting for vblank
    #[arg(long)]
    no_vsync: bool,
}

impl Args {
    fn into_config(self) -> ViewerConfig {
        let defaults = ViewerConfig::default();
        ViewerConfig {
            model: self.model,
            width: self.width.max(1),
            height: self.height.max(1),
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
            color: self.color.unwrap_or(defaults.color),
            background: self.background.unwrap_or(defaults.background),
            spin: self.spin,
            vsync: !self.no_vsync,
            ..defaults
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse().into_config()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Mesh Viewer")
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(false)
            .build(&event_loop)?,
    );

    let mut viewer = create_viewer(window.clone(), &config)?;
    let tick_interval = config.tick_interval;
    let mut failure: Option<RenderError> = None;

    event_loop.run(|event, window_target| {
        match event {
            Event::NewEvents(StartCause::Init) => {
                window_target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + tick_interval));
            }
            Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
                if viewer.quit_requested() {
                    window_target.exit();
                    return;
                }
                if let Err(e) = viewer.handle(&Message::Tick) {
                    failure = Some(e);
                    window_target.exit();
                    return;
                }
                window_target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + tick_interval));
            }
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if let Some(message) = Message::from_window_event(&event) {
                    if let Err(e) = viewer.handle(&message) {
                        failure = Some(e);
                        window_target.exit();
                        return;
                    }
                }
                if viewer.quit_requested() {
                    window_target.exit();
                }
            }
            _ => {}
        }
    })?;

    // The final fence wait runs even when a tick failed.
    viewer.shutdown()?;
    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

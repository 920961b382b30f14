use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use super::mapping::ConstantBuffer;
use super::pipeline::{self, BindGroupLayouts};
use super::{FrameSync, GpuContext};
use crate::config::ViewerConfig;
use crate::error::RenderError;
use crate::model::{DecodedImage, Mesh, Texture, Vertex};
use crate::renderer::commands::{CommandList, DescriptorTable, PassPlan};
use crate::renderer::constants::SceneConstants;
use crate::renderer::scheduler::FRAME_COUNT;

/// wgpu device, surface and every GPU object the viewer draws with.
///
/// wgpu has no user-visible fence, so one is emulated: `signal` registers a
/// queue callback that raises `completed` once the work submitted so far has
/// finished, and `wait_for` drives the device until that happens.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    constants: ConstantBuffer,
    constants_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
    _texture: Texture,
    _depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    completed: Arc<AtomicU64>,
    presented: usize,
    frame: Option<wgpu::SurfaceTexture>,
}

impl WgpuContext {
    pub fn new(
        window: Arc<Window>,
        mesh: &Mesh,
        image: &DecodedImage,
        config: &ViewerConfig,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();

        log::info!("Creating WGPU instance...");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::ResourceCreation(format!("surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::ResourceCreation("no suitable adapter".to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::ResourceCreation(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::ResourceCreation("surface has no formats".to_string()))?;
        log::info!("Selected surface format: {:?}", surface_format);

        let present_mode = if config.vsync {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        };
        log::info!("Selected present mode: {:?}", present_mode);

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: FRAME_COUNT as u32,
        };
        surface.configure(&device, &surface_config);

        let layouts = BindGroupLayouts::new(&device);
        let render_pipeline = pipeline::create_render_pipeline(&device, surface_format, &layouts);

        let constants = ConstantBuffer::new(&device);
        let constants_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Constants Bind Group"),
            layout: &layouts.constants,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: constants.buffer().as_entire_binding(),
            }],
        });

        let texture = Texture::from_image(&device, &queue, image, Some("Diffuse Texture"));
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Texture Bind Group"),
            layout: &layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });
        log::info!("Uploaded {}x{} diffuse texture", image.width, image.height);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: mesh.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        log::info!(
            "Uploaded {} vertices ({} bytes, stride {})",
            mesh.vertex_count(),
            mesh.as_bytes().len(),
            Vertex::STRIDE
        );

        let (depth_texture, depth_view) =
            pipeline::create_depth_texture(&device, surface_config.width, surface_config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config: surface_config,
            render_pipeline,
            constants,
            constants_bind_group,
            texture_bind_group,
            _texture: texture,
            _depth_texture: depth_texture,
            depth_view,
            vertex_buffer,
            vertex_count: mesh.vertex_count(),
            completed: Arc::new(AtomicU64::new(0)),
            presented: 0,
            frame: None,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn bind_group(&self, table: DescriptorTable) -> &wgpu::BindGroup {
        match table {
            DescriptorTable::SceneConstants => &self.constants_bind_group,
            DescriptorTable::Texture => &self.texture_bind_group,
        }
    }
}

impl FrameSync for WgpuContext {
    fn signal(&mut self, value: u64) -> Result<(), RenderError> {
        let completed = Arc::clone(&self.completed);
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::AcqRel);
        });
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn wait_for(&mut self, value: u64) -> Result<(), RenderError> {
        // Blocks until every submission has retired and its callbacks ran.
        let result = self.device.poll(wgpu::Maintain::Wait);
        let completed = self.completed_value();
        if completed < value {
            log::error!(
                "Fence value {} not reached after wait (completed {}, queue empty: {})",
                value,
                completed,
                result.is_queue_empty()
            );
            return Err(RenderError::Sync { value, completed });
        }
        Ok(())
    }

    fn current_back_buffer_index(&self) -> usize {
        self.presented % FRAME_COUNT
    }
}

impl GpuContext for WgpuContext {
    fn upload_constants(&mut self, constants: &SceneConstants) -> Result<(), RenderError> {
        let mut writer = self.constants.writer(&self.queue)?;
        writer.write(constants);
        Ok(())
    }

    fn execute(&mut self, list: &CommandList) -> Result<(), RenderError> {
        let plan = PassPlan::from_list(list)?;
        if plan.back_buffer != self.current_back_buffer_index() {
            log::warn!(
                "Recorded for back buffer {} but the surface is at {}",
                plan.back_buffer,
                self.current_back_buffer_index()
            );
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let color_load = match plan.clear_color {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: a as f64,
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = match plan.clear_depth {
                Some(depth) => wgpu::LoadOp::Clear(depth),
                None => wgpu::LoadOp::Load,
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: plan.depth.then(|| wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            for table in &plan.tables {
                render_pass.set_bind_group(table.slot(), self.bind_group(*table), &[]);
            }
            if let Some(v) = plan.viewport {
                render_pass.set_viewport(v.x, v.y, v.width, v.height, v.min_depth, v.max_depth);
            }
            if let Some(s) = plan.scissor {
                render_pass.set_scissor_rect(s.x, s.y, s.width, s.height);
            }

            let vertex_count = plan.vertex_count.min(self.vertex_count);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            for (count, instances) in &plan.draws {
                render_pass.draw(0..(*count).min(vertex_count), 0..*instances);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        self.frame = Some(frame);
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let frame = self.frame.take().ok_or(RenderError::NothingToPresent)?;
        frame.present();
        self.presented = self.presented.wrapping_add(1);
        Ok(())
    }
}

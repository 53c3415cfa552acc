use std::sync::Arc;

use anyhow::Result;
use winit::window::Window;

use super::meshes::MeshLibrary;
use super::shaders::ShaderManager;
use super::textures::TextureLibrary;
use super::{DrawCommand, FrameContext, FrameUniforms, RenderError, RenderResult, Vertex};
use crate::config::Config;

const SCENE_SHADER: &str = include_str!("../../assets/shaders/scene.wgsl");

/// Upper bound on draw commands per frame; the object uniform buffer is
/// sized for this many dynamic-offset slots.
const MAX_DRAWS: usize = 256;
const OBJECT_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniformsRaw {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_pos: [f32; 4],
    light_ka: [f32; 4],
    light_kd: [f32; 4],
    light_ks: [f32; 4],
    watch_pos: [f32; 4],
    watch_ka: [f32; 4],
    watch_kd: [f32; 4],
    watch_ks: [f32; 4],
    fog: [f32; 4],
    flags: [f32; 4],
}

impl SceneUniformsRaw {
    fn from_frame(u: &FrameUniforms) -> Self {
        let vec4 = |v: glam::Vec3, w: f32| [v.x, v.y, v.z, w];
        let watch = u.watch_light;
        Self {
            view: u.view.to_cols_array_2d(),
            proj: u.projection.to_cols_array_2d(),
            camera_pos: vec4(u.camera_position, 1.0),
            light_pos: vec4(u.light.position, 1.0),
            light_ka: vec4(u.light.ambient, 0.0),
            light_kd: vec4(u.light.diffuse, 0.0),
            light_ks: vec4(u.light.specular, 0.0),
            watch_pos: vec4(watch.map(|l| l.position).unwrap_or_default(), 1.0),
            watch_ka: vec4(watch.map(|l| l.ambient).unwrap_or_default(), 0.0),
            watch_kd: vec4(watch.map(|l| l.diffuse).unwrap_or_default(), 0.0),
            watch_ks: vec4(watch.map(|l| l.specular).unwrap_or_default(), 0.0),
            fog: vec4(u.fog_color, u.fog_density),
            flags: [if watch.is_some() { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectUniformsRaw {
    model: [[f32; 4]; 4],
    kd: [f32; 4],
    ka: [f32; 4],
    ks_shine: [f32; 4],
    uv_window: [f32; 4],
    flags: [f32; 4],
}

impl ObjectUniformsRaw {
    fn from_command(cmd: &DrawCommand, textured: bool) -> Self {
        let m = cmd.material;
        Self {
            model: cmd.model.to_cols_array_2d(),
            kd: [m.diffuse.x, m.diffuse.y, m.diffuse.z, 0.0],
            ka: [m.ambient.x, m.ambient.y, m.ambient.z, 0.0],
            ks_shine: [m.specular.x, m.specular.y, m.specular.z, m.shininess],
            uv_window: [
                cmd.uv_offset.x,
                cmd.uv_offset.y,
                cmd.uv_scale.x,
                cmd.uv_scale.y,
            ],
            flags: [
                if textured { 1.0 } else { 0.0 },
                if cmd.fog { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// wgpu renderer: owns the device, surface, pipeline, and the mesh/texture
/// libraries. Executes the frame's draw list; it holds no simulation state.
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub shader_manager: ShaderManager,
    meshes: MeshLibrary,
    textures: TextureLibrary,

    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,

    overflow_warned: bool,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, app_config: &Config) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
                ..Default::default()
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("no suitable GPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut shader_manager = ShaderManager::new(device.clone());
        shader_manager.load_wgsl_str("scene", SCENE_SHADER)?;
        let shader = shader_manager
            .get("scene")
            .ok_or(RenderError::ShaderMissing("scene"))?;

        let meshes = MeshLibrary::build(&device, app_config);
        let textures = TextureLibrary::build(&device, &queue);

        let scene_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let object_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ObjectUniformsRaw>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene_uniforms"),
            size: std::mem::size_of::<SceneUniformsRaw>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniforms"),
            size: OBJECT_STRIDE * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &scene_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bg"),
            layout: &object_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniformsRaw>() as u64),
                }),
            }],
        });

        let depth_view = create_depth_view(&device, &config);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&scene_bgl, &object_bgl, &textures.bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Ok(Self {
            device,
            queue,
            surface,
            config,
            size,
            shader_manager,
            meshes,
            textures,
            scene_buffer,
            scene_bind_group,
            object_buffer,
            object_bind_group,
            depth_view,
            pipeline,
            overflow_warned: false,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }

    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Executes one frame's draw list. Commands naming meshes that were never
    /// built are skipped; missing textures fall back to untextured draws.
    pub fn render(&mut self, frame: &FrameContext) -> RenderResult<()> {
        let commands = if frame.commands.len() > MAX_DRAWS {
            if !self.overflow_warned {
                log::warn!(
                    "frame submitted {} draws; truncating to {}",
                    frame.commands.len(),
                    MAX_DRAWS
                );
                self.overflow_warned = true;
            }
            &frame.commands[..MAX_DRAWS]
        } else {
            &frame.commands[..]
        };

        self.queue.write_buffer(
            &self.scene_buffer,
            0,
            bytemuck::bytes_of(&SceneUniformsRaw::from_frame(&frame.uniforms)),
        );
        for (i, cmd) in commands.iter().enumerate() {
            let (_, textured) = self.textures.resolve(cmd.texture);
            self.queue.write_buffer(
                &self.object_buffer,
                i as u64 * OBJECT_STRIDE,
                bytemuck::bytes_of(&ObjectUniformsRaw::from_command(cmd, textured)),
            );
        }

        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame"),
            });
        {
            let clear = frame.uniforms.fog_color;
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.x as f64,
                            g: clear.y as f64,
                            b: clear.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.scene_bind_group, &[]);

            for (i, cmd) in commands.iter().enumerate() {
                let Some(mesh) = self.meshes.get(cmd.mesh) else {
                    continue;
                };
                let (texture_bg, _) = self.textures.resolve(cmd.texture);
                rpass.set_bind_group(
                    1,
                    &self.object_bind_group,
                    &[(i as u64 * OBJECT_STRIDE) as u32],
                );
                rpass.set_bind_group(2, texture_bg, &[]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        surface_texture.present();
        Ok(())
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

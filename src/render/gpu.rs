use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use log::{debug, warn};
use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::loading::LoadingManager;
use crate::mesh::{self, LineData, MeshData, VERTEX_STRIDE};
use crate::scene::Shape;

use super::common::{GlobalUniform, ObjectConstants, SHADER};
use super::{DrawItem, FrameSnapshot, LineSet, RenderSurface};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.03,
    g: 0.03,
    b: 0.05,
    a: 1.0,
};

/// GPU renderer backed by wgpu, shared by the native window and the web canvas.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    pipelines: Pipelines,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    meshes: HashMap<String, MeshBuffers>,
    lines: HashMap<String, LineBuffers>,
    failed: HashSet<String>,
    loading: LoadingManager,
}

struct Pipelines {
    opaque: wgpu::RenderPipeline,
    transparent: wgpu::RenderPipeline,
    wireframe: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
}

impl Renderer {
    /// Initializes the GPU renderer for a window or canvas of `size` physical pixels.
    pub async fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(anyhow!("surface has zero area"));
        }

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(target)
            .context("failed to create drawing surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let required_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            wgpu::Limits::default()
        };
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("renderer-device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                ..Default::default()
            })
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.0,
            height: size.1,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("renderer-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = uniform_layout::<GlobalUniform>(&device, "global-bind-layout");
        let object_layout = uniform_layout::<ObjectConstants>(&device, "object-bind-layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("renderer-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let builder = PipelineBuilder {
            device: &device,
            layout: &pipeline_layout,
            shader: &shader,
            format: surface_format,
        };
        let pipelines = Pipelines {
            opaque: builder.build(
                "opaque-pipeline",
                ("vs_main", "fs_main"),
                wgpu::PrimitiveTopology::TriangleList,
                true,
            ),
            transparent: builder.build(
                "transparent-pipeline",
                ("vs_main", "fs_main"),
                wgpu::PrimitiveTopology::TriangleList,
                false,
            ),
            wireframe: builder.build(
                "wireframe-pipeline",
                ("vs_main", "fs_main"),
                wgpu::PrimitiveTopology::LineList,
                true,
            ),
            lines: builder.build(
                "line-pipeline",
                ("vs_line", "fs_line"),
                wgpu::PrimitiveTopology::LineList,
                true,
            ),
        };

        debug!(
            "renderer ready: {}x{} {:?} on {:?}",
            size.0,
            size.1,
            surface_format,
            adapter.get_info().backend
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            pipelines,
            global_buffer,
            global_bind_group,
            object_layout,
            meshes: HashMap::new(),
            lines: HashMap::new(),
            failed: HashSet::new(),
            loading: LoadingManager::new(),
        })
    }

    fn ensure_mesh(&mut self, shape: &Shape) -> Option<String> {
        let key = format!("{shape:?}");
        if self.meshes.contains_key(&key) {
            return Some(key);
        }
        if self.failed.contains(&key) {
            return None;
        }
        let device = &self.device;
        match self
            .loading
            .load(&key, || MeshBuffers::upload(device, &mesh::mesh_for_shape(shape), &key))
        {
            Some(buffers) => {
                self.meshes.insert(key.clone(), buffers);
                Some(key)
            }
            None => {
                self.failed.insert(key);
                None
            }
        }
    }

    fn ensure_lines(&mut self, set: &LineSet) -> Option<String> {
        let key = set.source.cache_key();
        if self.lines.contains_key(&key) {
            return Some(key);
        }
        if self.failed.contains(&key) {
            return None;
        }
        let device = &self.device;
        match self
            .loading
            .load(&key, || LineBuffers::upload(device, &set.source.lines(), &key))
        {
            Some(buffers) => {
                self.lines.insert(key.clone(), buffers);
                Some(key)
            }
            None => {
                self.failed.insert(key);
                None
            }
        }
    }

    fn object_bind_group(&self, constants: &ObjectConstants) -> wgpu::BindGroup {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("object-uniform"),
                contents: bytes_of(constants),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object-bind-group"),
            layout: &self.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

impl RenderSurface for Renderer {
    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the swap chain; zero-area sizes are ignored.
    fn resize(&mut self, size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        self.config.width = size.0;
        self.config.height = size.1;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, size.0, size.1);
    }

    fn draw(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        // Uploads happen before the pass borrows the caches.
        let mut meshes = Vec::with_capacity(frame.items.len());
        for item in &frame.items {
            if let Some(key) = self.ensure_mesh(&item.shape) {
                meshes.push((key, item, self.object_bind_group(&ObjectConstants::for_item(item))));
            }
        }
        let mut lines = Vec::with_capacity(frame.lines.len());
        for set in &frame.lines {
            if let Some(key) = self.ensure_lines(set) {
                lines.push((key, self.object_bind_group(&ObjectConstants::for_lines(set.model))));
            }
        }

        self.queue.write_buffer(
            &self.global_buffer,
            0,
            bytes_of(&GlobalUniform::from_frame(frame)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.global_bind_group, &[]);

            pass.set_pipeline(&self.pipelines.lines);
            for (key, bind_group) in &lines {
                let Some(buffers) = self.lines.get(key) else {
                    continue;
                };
                pass.set_bind_group(1, bind_group, &[]);
                pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                pass.draw(0..buffers.vertex_count, 0..1);
            }

            for (key, item, bind_group) in &meshes {
                let Some(buffers) = self.meshes.get(key) else {
                    continue;
                };
                pass.set_bind_group(1, bind_group, &[]);
                pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                if item.material.wireframe {
                    pass.set_pipeline(&self.pipelines.wireframe);
                    pass.set_index_buffer(buffers.edges.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..buffers.edge_count, 0, 0..1);
                } else {
                    let pipeline = if is_blended(item) {
                        &self.pipelines.transparent
                    } else {
                        &self.pipelines.opaque
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..buffers.index_count, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::Lost,
            wgpu::SurfaceError::Outdated => RenderError::Outdated,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            other => {
                warn!("unexpected surface error: {other}");
                RenderError::Other
            }
        }
    }
}

fn is_blended(item: &DrawItem) -> bool {
    item.material.transparent && item.material.opacity < 1.0
}

fn uniform_layout<T>(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

struct PipelineBuilder<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineBuilder<'_> {
    fn build(
        &self,
        label: &str,
        (vertex_entry, fragment_entry): (&str, &str),
        topology: wgpu::PrimitiveTopology,
        depth_write_enabled: bool,
    ) -> wgpu::RenderPipeline {
        const FLOAT: u64 = std::mem::size_of::<f32>() as u64;
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader,
                    entry_point: Some(vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: VERTEX_STRIDE as u64 * FLOAT,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &[
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 0,
                                shader_location: 0,
                            },
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 3 * FLOAT,
                                shader_location: 1,
                            },
                        ],
                    }],
                },
                primitive: wgpu::PrimitiveState {
                    topology,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthBuffer::FORMAT,
                    depth_write_enabled,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: self.shader,
                    entry_point: Some(fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
                cache: None,
            })
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    edges: wgpu::Buffer,
    edge_count: u32,
}

impl MeshBuffers {
    fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Result<Self> {
        if mesh.indices.is_empty() {
            return Err(anyhow!("mesh {label} has no triangles"));
        }
        let edges = mesh.edge_indices();
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-edges")),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
            edges: edge_buffer,
            edge_count: edges.len() as u32,
        })
    }
}

struct LineBuffers {
    vertex: wgpu::Buffer,
    vertex_count: u32,
}

impl LineBuffers {
    fn upload(device: &wgpu::Device, lines: &LineData, label: &str) -> Result<Self> {
        if lines.vertex_count() < 2 {
            return Err(anyhow!("line set {label} has no segments"));
        }
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-lines")),
            contents: bytemuck::cast_slice(&lines.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Ok(Self {
            vertex,
            vertex_count: lines.vertex_count() as u32,
        })
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

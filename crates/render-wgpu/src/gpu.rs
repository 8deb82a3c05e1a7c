use crate::mesh::{self, MeshData};
use crate::shaders;
use crate::texture::{self, TextureData};
use crate::uniforms::{
    DrawRecord, FrameState, GLOBALS_SIZE, GlobalUniforms, OBJECT_SIZE, TextureKey, align_to,
};
use glam::{Mat4, Vec3};
use shadelab_common::{GeometryHandle, TechniqueHandle, TextureHandle};
use shadelab_render::{
    GeometryLoader, LoadError, LoadedGeometry, MatrixSlot, ScalarSlot, ShaderParamSink,
    TechniqueKind, TechniqueProvider, TextureLoader, TextureSlot, VectorSlot, VertexAttributes,
    builtin_name, requested_attributes,
};
use std::collections::BTreeMap;
use std::path::Path;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Errors from bringing up the GPU.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
}

/// Pick an adapter that can present to `surface` and open a device on it.
pub async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue), GpuError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuError::NoAdapter)?;
    tracing::info!(adapter = ?adapter.get_info().name, "GPU adapter selected");

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("shadelab_device"),
                ..Default::default()
            },
            None,
        )
        .await?;
    Ok((adapter, device, queue))
}

/// One vertex stream: which attribute it carries and where the shader reads it.
struct Stream {
    attribute: VertexAttributes,
    layout: [wgpu::VertexAttribute; 1],
    stride: u64,
}

static STREAMS: [Stream; 4] = [
    Stream {
        attribute: VertexAttributes::POSITION,
        layout: wgpu::vertex_attr_array![0 => Float32x3],
        stride: 12,
    },
    Stream {
        attribute: VertexAttributes::NORMAL,
        layout: wgpu::vertex_attr_array![1 => Float32x3],
        stride: 12,
    },
    Stream {
        attribute: VertexAttributes::UV,
        layout: wgpu::vertex_attr_array![2 => Float32x2],
        stride: 8,
    },
    Stream {
        attribute: VertexAttributes::TANGENT,
        layout: wgpu::vertex_attr_array![3 => Float32x3],
        stride: 12,
    },
];

/// Read a mesh from a `builtin:` name or an OBJ file.
pub fn read_mesh(file: &str) -> Result<MeshData, LoadError> {
    match builtin_name(file) {
        Some(name) => mesh::builtin(name).ok_or_else(|| LoadError::UnknownBuiltin(name.into())),
        None => {
            let path = Path::new(file);
            let is_obj = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
            if path.is_file() && !is_obj {
                return Err(LoadError::UnsupportedFormat(file.into()));
            }
            mesh::load_obj(path)
        }
    }
}

/// Read a texture from a `builtin:` name or an image file.
pub fn read_texture(file: &str) -> Result<TextureData, LoadError> {
    match builtin_name(file) {
        Some(name) => texture::builtin(name).ok_or_else(|| LoadError::UnknownBuiltin(name.into())),
        None => texture::load_file(Path::new(file)),
    }
}

/// Generate what the technique asks for, where the mesh allows it, and
/// return the streams that will be uploaded.
fn prepare_streams(mesh: &mut MeshData, requested: VertexAttributes) -> VertexAttributes {
    if requested.contains(VertexAttributes::TANGENT)
        && !mesh.attributes().contains(VertexAttributes::TANGENT)
    {
        mesh.generate_tangents();
    }
    mesh.attributes() & (requested | VertexAttributes::POSITION)
}

struct GpuMesh {
    streams: [Option<wgpu::Buffer>; 4],
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// wgpu backend for the scene: compiles one pipeline per technique, uploads
/// meshes and textures, and turns sink calls into a render pass per frame.
///
/// Sink calls only stage values. `present` uploads the frame's uniforms and
/// encodes every recorded draw into the view given to [`begin_frame`].
///
/// [`begin_frame`]: WgpuRenderer::begin_frame
pub struct WgpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    depth_view: wgpu::TextureView,
    pipelines: Vec<wgpu::RenderPipeline>,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    object_capacity: u64,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    default_diffuse: GpuTexture,
    default_normal: GpuTexture,
    meshes: Vec<GpuMesh>,
    textures: Vec<GpuTexture>,
    texture_groups: BTreeMap<TextureKey, wgpu::BindGroup>,
    frame: FrameState,
    target: Option<wgpu::TextureView>,
    frames: u64,
}

impl WgpuRenderer {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&GlobalUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(OBJECT_SIZE),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("technique_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("technique_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::TECHNIQUE_SHADER.into()),
        });

        let pipelines = TechniqueKind::ALL
            .iter()
            .map(|&kind| Self::create_pipeline(&device, &pipeline_layout, &shader, surface_format, kind))
            .collect();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let default_diffuse = Self::upload_texture(
            &device,
            &queue,
            &TextureData::solid([255, 255, 255, 255]),
            TextureSlot::Diffuse,
            "default_diffuse",
        );
        let default_normal = Self::upload_texture(
            &device,
            &queue,
            &TextureData::solid([128, 128, 255, 255]),
            TextureSlot::Normal,
            "default_normal",
        );

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = align_to(OBJECT_SIZE, alignment);
        let object_capacity = 64;
        let (object_buffer, object_bind_group) =
            Self::create_object_buffer(&device, &object_layout, object_stride, object_capacity);

        let depth_view = Self::create_depth_texture(&device, width, height);

        tracing::info!(
            techniques = TechniqueKind::ALL.len(),
            ?surface_format,
            object_stride,
            "wgpu renderer ready"
        );

        Self {
            device,
            queue,
            surface_format,
            depth_view,
            pipelines,
            globals_buffer,
            globals_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_stride,
            object_capacity,
            texture_layout,
            sampler,
            default_diffuse,
            default_normal,
            meshes: Vec::new(),
            textures: Vec::new(),
            texture_groups: BTreeMap::new(),
            frame: FrameState::default(),
            target: None,
            frames: 0,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        kind: TechniqueKind,
    ) -> wgpu::RenderPipeline {
        let (vs, fs) = shaders::entry_points(kind);
        let required = kind.required_attributes();
        let buffers: Vec<wgpu::VertexBufferLayout<'static>> = STREAMS
            .iter()
            .filter(|s| required.contains(s.attribute))
            .map(|s| wgpu::VertexBufferLayout {
                array_stride: s.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &s.layout,
            })
            .collect();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.name()),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_object_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_buffer"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(OBJECT_SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn upload_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &TextureData,
        slot: TextureSlot,
        label: &str,
    ) -> GpuTexture {
        // Normal maps hold vectors, not colours.
        let format = match slot {
            TextureSlot::Diffuse => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureSlot::Normal => wgpu::TextureFormat::Rgba8Unorm,
        };
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: data.width,
                    height: data.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data.rgba,
        );
        let view = texture.create_view(&Default::default());
        GpuTexture {
            _texture: texture,
            view,
        }
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_view = Self::create_depth_texture(&self.device, width, height);
    }

    /// Set the view the next `present` renders into.
    pub fn begin_frame(&mut self, target: wgpu::TextureView) {
        self.target = Some(target);
    }

    /// Take the frame's view back, e.g. to draw an overlay on top.
    pub fn end_frame(&mut self) -> Option<wgpu::TextureView> {
        self.target.take()
    }

    fn ensure_object_capacity(&mut self, draws: usize) {
        let needed = draws as u64;
        if needed <= self.object_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        let (buffer, bind_group) = Self::create_object_buffer(
            &self.device,
            &self.object_layout,
            self.object_stride,
            capacity,
        );
        self.object_buffer = buffer;
        self.object_bind_group = bind_group;
        self.object_capacity = capacity;
        tracing::debug!(capacity, "object buffer grown");
    }

    fn texture_view(&self, handle: Option<TextureHandle>, slot: TextureSlot) -> &wgpu::TextureView {
        let fallback = match slot {
            TextureSlot::Diffuse => &self.default_diffuse,
            TextureSlot::Normal => &self.default_normal,
        };
        &handle
            .and_then(|h| self.textures.get(h.0 as usize))
            .unwrap_or(fallback)
            .view
    }

    fn ensure_texture_group(&mut self, key: TextureKey) {
        if self.texture_groups.contains_key(&key) {
            return;
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture_bind_group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        self.texture_view(key.0, TextureSlot::Diffuse),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        self.texture_view(key.1, TextureSlot::Normal),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.texture_groups.insert(key, bind_group);
    }

    /// Encode and submit the recorded draws into `target`.
    fn submit(&self, target: &wgpu::TextureView, draws: &[DrawRecord]) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let [r, g, b, a] = self.frame.clear_colour.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.frame.clear_depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for (i, draw) in draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(draw.geometry.0 as usize) else {
                    tracing::warn!(geometry = draw.geometry.0, "draw of unknown geometry skipped");
                    continue;
                };
                let Some((kind, pipeline)) = TechniqueKind::ALL
                    .get(draw.technique.0 as usize)
                    .zip(self.pipelines.get(draw.technique.0 as usize))
                else {
                    tracing::warn!(technique = draw.technique.0, "draw with unknown technique skipped");
                    continue;
                };
                let Some(texture_group) = self.texture_groups.get(&draw.textures) else {
                    continue;
                };

                let required = kind.required_attributes();
                let buffers: Option<Vec<&wgpu::Buffer>> = STREAMS
                    .iter()
                    .zip(&mesh.streams)
                    .filter(|(s, _)| required.contains(s.attribute))
                    .map(|(_, buffer)| buffer.as_ref())
                    .collect();
                let Some(buffers) = buffers else {
                    tracing::warn!(technique = kind.name(), "geometry lacks streams, draw skipped");
                    continue;
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.object_bind_group, &[(i as u64 * self.object_stride) as u32]);
                pass.set_bind_group(2, texture_group, &[]);
                for (slot, buffer) in buffers.into_iter().enumerate() {
                    pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl TechniqueProvider for WgpuRenderer {
    fn lookup_technique(&self, name: &str) -> Option<TechniqueHandle> {
        TechniqueKind::ALL
            .iter()
            .position(|k| k.name() == name)
            .filter(|&i| i < self.pipelines.len())
            .map(|i| TechniqueHandle(i as u32))
    }
}

impl GeometryLoader for WgpuRenderer {
    fn load_geometry(
        &mut self,
        file: &str,
        technique: TechniqueKind,
        tangents: bool,
    ) -> Result<LoadedGeometry, LoadError> {
        let mut mesh = read_mesh(file)?;
        let attributes = prepare_streams(&mut mesh, requested_attributes(technique, tangents));

        let vertex_buffer = |label: &str, contents: &[u8]| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage: wgpu::BufferUsages::VERTEX,
                })
        };
        let pick = |attribute| attributes.contains(attribute);
        let streams = [
            pick(VertexAttributes::POSITION)
                .then(|| vertex_buffer("positions", bytemuck::cast_slice(&mesh.positions))),
            pick(VertexAttributes::NORMAL)
                .then(|| vertex_buffer("normals", bytemuck::cast_slice(&mesh.normals))),
            pick(VertexAttributes::UV).then(|| vertex_buffer("uvs", bytemuck::cast_slice(&mesh.uvs))),
            pick(VertexAttributes::TANGENT)
                .then(|| vertex_buffer("tangents", bytemuck::cast_slice(&mesh.tangents))),
        ];
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let index_count = mesh.indices.len() as u32;

        let handle = GeometryHandle(self.meshes.len() as u32);
        self.meshes.push(GpuMesh {
            streams,
            index_buffer,
            index_count,
        });
        tracing::debug!(file, ?handle, ?attributes, index_count, "geometry uploaded");
        Ok(LoadedGeometry {
            handle,
            attributes,
            index_count,
        })
    }
}

impl TextureLoader for WgpuRenderer {
    fn load_texture(&mut self, file: &str, slot: TextureSlot) -> Result<TextureHandle, LoadError> {
        let data = read_texture(file)?;
        let texture = Self::upload_texture(&self.device, &self.queue, &data, slot, file);
        let handle = TextureHandle(self.textures.len() as u32);
        self.textures.push(texture);
        tracing::debug!(file, ?handle, width = data.width, height = data.height, "texture uploaded");
        Ok(handle)
    }
}

impl ShaderParamSink for WgpuRenderer {
    fn clear(&mut self, colour: [f32; 4], depth: f32) {
        self.frame.clear(colour, depth);
    }

    fn set_matrix(&mut self, slot: MatrixSlot, value: Mat4) {
        self.frame.set_matrix(slot, value);
    }

    fn set_vector(&mut self, slot: VectorSlot, value: Vec3) {
        self.frame.set_vector(slot, value);
    }

    fn set_scalar(&mut self, slot: ScalarSlot, value: f32) {
        self.frame.set_scalar(slot, value);
    }

    fn set_texture(&mut self, slot: TextureSlot, texture: TextureHandle) {
        self.frame.set_texture(slot, texture);
    }

    fn draw(&mut self, geometry: GeometryHandle, technique: TechniqueHandle) {
        self.frame.record(geometry, technique);
    }

    fn present(&mut self) {
        let draws = self.frame.take_draws();
        if self.target.is_none() {
            tracing::warn!(draws = draws.len(), "present without a target view, frame dropped");
            return;
        }

        self.ensure_object_capacity(draws.len());
        let stride = self.object_stride as usize;
        let mut objects = vec![0u8; stride * draws.len()];
        for (i, draw) in draws.iter().enumerate() {
            let bytes = bytemuck::bytes_of(&draw.object);
            objects[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
            self.ensure_texture_group(draw.textures);
        }
        if !objects.is_empty() {
            self.queue.write_buffer(&self.object_buffer, 0, &objects);
        }
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&self.frame.globals));

        if let Some(target) = self.target.as_ref() {
            self.submit(target, &draws);
        }
        self.frames += 1;
        tracing::trace!(frame = self.frames, draws = draws.len(), "frame submitted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_streams_follow_required_attributes() {
        for kind in TechniqueKind::ALL {
            let required = kind.required_attributes();
            let locations: Vec<u32> = STREAMS
                .iter()
                .filter(|s| required.contains(s.attribute))
                .map(|s| s.layout[0].shader_location)
                .collect();
            assert_eq!(locations.len(), required.bits().count_ones() as usize);
            assert!(locations.windows(2).all(|w| w[0] < w[1]), "{kind:?}");
        }
    }

    #[test]
    fn stream_strides_match_formats() {
        for stream in &STREAMS {
            assert_eq!(stream.stride, stream.layout[0].format.size());
        }
    }

    #[test]
    fn builtin_and_file_sources_resolve() {
        assert!(read_mesh("builtin:cube").is_ok());
        assert!(matches!(read_mesh("builtin:teapot"), Err(LoadError::UnknownBuiltin(_))));
        assert!(matches!(read_mesh("/no/such/model.obj"), Err(LoadError::NotFound(_))));
        assert!(read_texture("builtin:bricks").is_ok());
        assert!(matches!(read_texture("builtin:marble"), Err(LoadError::UnknownBuiltin(_))));
    }

    #[test]
    fn non_obj_meshes_are_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.fbx");
        std::fs::write(&path, b"binary").unwrap();
        assert!(matches!(
            read_mesh(path.to_str().unwrap()),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn tangents_are_generated_on_request() {
        let mut mesh = mesh::cube(mesh::CUBE_SIZE);
        let streams = prepare_streams(
            &mut mesh,
            requested_attributes(TechniqueKind::VertexLitTex, true),
        );
        assert!(streams.contains(VertexAttributes::TANGENT));
        assert_eq!(mesh.tangents.len(), mesh.vertex_count());
    }

    #[test]
    fn only_requested_streams_upload() {
        let mut mesh = mesh::cube(mesh::CUBE_SIZE);
        let streams = prepare_streams(
            &mut mesh,
            requested_attributes(TechniqueKind::PlainColour, false),
        );
        assert_eq!(streams, VertexAttributes::POSITION);
    }

    #[test]
    fn meshes_without_uvs_cannot_get_tangents() {
        let mut mesh = mesh::cube(mesh::CUBE_SIZE);
        mesh.uvs.clear();
        let streams = prepare_streams(
            &mut mesh,
            requested_attributes(TechniqueKind::NormalMapping, false),
        );
        assert!(!streams.contains(VertexAttributes::UV));
        assert!(!streams.contains(VertexAttributes::TANGENT));
    }
}

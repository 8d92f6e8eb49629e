use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::pick::index_to_color;
use crate::render::common::{
    camera_ubo_size, uniform_bgl, CameraUniform, QuadVertex, QUAD_INDICES, QUAD_VERTICES,
};
use crate::render::RenderCtx;
use crate::scene::NodeSet;

/// Hit circle drawn for picking, relative to the node radius. Matches the
/// CPU hit-test margin so the two strategies agree away from raster edges.
const PICK_RADIUS_FACTOR: f32 = 1.2;

/// Offscreen color-id picking.
///
/// Renders every node as a hard-edged disc in a unique id color into an
/// offscreen `Rgba8Unorm` target (linear — id colors must survive exactly),
/// copies the single pixel under the cursor into a staging buffer and
/// decodes it back to a node index.
///
/// This path is self-contained: it records and submits its own command
/// encoder and blocks on the 1×1 readback, which bounds the GPU round-trip
/// the design tolerates during picking.
#[derive(Default)]
pub struct PickTarget {
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    texture: Option<wgpu::Texture>,
    texture_view: Option<wgpu::TextureView>,
    texture_size: (u32, u32),

    staging: Option<wgpu::Buffer>,
}

/// Offscreen targets are linear so id colors round-trip bit-exactly.
const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

impl PickTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the screen position to a node index via the GPU path.
    ///
    /// Returns `Ok(None)` for background hits. Errors (framebuffer or
    /// readback failures) are non-fatal to the caller — the CPU picking
    /// path remains available.
    pub fn pick_node(
        &mut self,
        ctx: &RenderCtx<'_>,
        camera: &Camera,
        nodes: &NodeSet,
        screen_x: f32,
        screen_y: f32,
    ) -> Result<Option<usize>> {
        if nodes.is_empty() {
            return Ok(None);
        }

        let (width, height) = ctx.physical_size();
        let px = ((screen_x * ctx.scale_factor) as u32).min(width.saturating_sub(1));
        let py = ((screen_y * ctx.scale_factor) as u32).min(height.saturating_sub(1));

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);
        self.ensure_target(ctx, width, height);

        // ── instances: unique id color per node ────────────────────────────
        let instances: Vec<PickInstance> = nodes
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let [r, g, b] = index_to_color(i);
                PickInstance {
                    center: [n.pos.x, n.pos.y],
                    radius: n.radius * PICK_RADIUS_FACTOR,
                    id_color: [
                        r as f32 / 255.0,
                        g as f32 / 255.0,
                        b as f32 / 255.0,
                        1.0,
                    ],
                }
            })
            .collect();

        self.ensure_instance_capacity(ctx, instances.len());

        self.write_camera_uniform(ctx, camera);

        let instance_vbo = self.instance_vbo.as_ref().context("pick instance buffer missing")?;
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&instances));

        let pipeline = self.pipeline.as_ref().context("pick pipeline missing")?;
        let bind_group = self.bind_group.as_ref().context("pick bind group missing")?;
        let quad_vbo = self.quad_vbo.as_ref().context("pick quad vbo missing")?;
        let quad_ibo = self.quad_ibo.as_ref().context("pick quad ibo missing")?;
        let view = self.texture_view.as_ref().context("pick target missing")?;
        let texture = self.texture.as_ref().context("pick target missing")?;
        let staging = self.staging.as_ref().context("pick staging buffer missing")?;

        // ── offscreen render + 1×1 copy ────────────────────────────────────
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("netview pick encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("netview pick pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Background clears to 0,0,0 = "no hit".
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, bind_group, &[]);
            rpass.set_vertex_buffer(0, quad_vbo.slice(..));
            rpass.set_vertex_buffer(1, instance_vbo.slice(..));
            rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..6, 0, 0..instances.len() as u32);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: px, y: py, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
        );

        ctx.queue.submit(std::iter::once(encoder.finish()));

        // ── blocking 4-byte readback ───────────────────────────────────────
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        ctx.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| anyhow::anyhow!("device poll failed: {e}"))?;
        rx.recv().context("pick readback callback dropped")??;

        let index = {
            let data = slice.get_mapped_range();
            crate::pick::color_to_index(data[0], data[1], data[2])
        };
        staging.unmap();

        if index < 0 {
            Ok(None)
        } else {
            Ok(Some(index as usize))
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline.is_some() {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("netview pick shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/pick.wgsl").into()),
        });

        let bind_group_layout = uniform_bgl(ctx.device, "netview pick bgl", camera_ubo_size());

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("netview pick pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("netview pick pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout(), PickInstance::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: PICK_FORMAT,
                    // Id colors must land verbatim; no blending.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() && self.staging.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview pick camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("netview pick bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);

        // One aligned row is plenty for the 1×1 readback.
        self.staging = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview pick staging buffer"),
            size: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }
        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("netview pick quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("netview pick quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    /// (Re)creates the offscreen target only when the drawable size changed.
    fn ensure_target(&mut self, ctx: &RenderCtx<'_>, width: u32, height: u32) {
        if self.texture.is_some() && self.texture_size == (width, height) {
            return;
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("netview pick target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        self.texture_view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        self.texture_size = (width, height);
    }

    fn write_camera_uniform(&mut self, ctx: &RenderCtx<'_>, camera: &Camera) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        ctx.queue
            .write_buffer(ubo, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview pick instance vbo"),
            size: (new_cap * std::mem::size_of::<PickInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// Instance data layout (28 bytes):
///
///  offset  0  center    [f32; 2]   loc 1
///  offset  8  radius    f32        loc 2
///  offset 12  id_color  [f32; 4]   loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct PickInstance {
    center: [f32; 2],
    radius: f32,
    id_color: [f32; 4],
}

impl PickInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x2, // center
        2 => Float32,   // radius
        3 => Float32x4  // id_color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PickInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

use crate::camera::Camera;
use crate::render::common::{
    camera_ubo_size, premul_alpha_blend, uniform_bgl, CameraUniform, ColorVertex,
};
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::LinkSet;

/// Renderer for link segments and direction arrows.
///
/// Two pipelines over one shader: a `LineList` pipeline for all segments
/// in a single draw, then a `TriangleList` pipeline for all arrow heads in
/// a single draw. Vertices are rebuilt from the [`LinkSet`] every frame so
/// highlight state baked into the colors is always current.
#[derive(Default)]
pub struct LinkPass {
    pipeline_format: Option<wgpu::TextureFormat>,
    line_pipeline: Option<wgpu::RenderPipeline>,
    tri_pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,

    line_vbo: Option<wgpu::Buffer>,
    line_capacity: usize,
    arrow_vbo: Option<wgpu::Buffer>,
    arrow_capacity: usize,

    // scratch, reused across frames
    scratch: Vec<[f32; 6]>,
}

impl LinkPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        camera: &Camera,
        links: &LinkSet,
    ) {
        if links.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_bindings(ctx);
        self.write_camera_uniform(ctx, camera);

        // ── line vertices ──────────────────────────────────────────────────
        self.scratch.clear();
        links.build_line_vertices(&mut self.scratch);
        let line_verts: Vec<ColorVertex> =
            self.scratch.iter().copied().map(ColorVertex::from_floats).collect();

        // ── arrow vertices ─────────────────────────────────────────────────
        self.scratch.clear();
        links.build_arrow_vertices(&mut self.scratch);
        let arrow_verts: Vec<ColorVertex> =
            self.scratch.iter().copied().map(ColorVertex::from_floats).collect();

        self.ensure_line_capacity(ctx, line_verts.len());
        self.ensure_arrow_capacity(ctx, arrow_verts.len());

        if !line_verts.is_empty()
            && let Some(vbo) = self.line_vbo.as_ref()
        {
            ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&line_verts));
        }
        if !arrow_verts.is_empty()
            && let Some(vbo) = self.arrow_vbo.as_ref()
        {
            ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&arrow_verts));
        }

        let Some(line_pipeline) = self.line_pipeline.as_ref() else { return };
        let Some(tri_pipeline) = self.tri_pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("netview link pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, bind_group, &[]);

        if !line_verts.is_empty()
            && let Some(vbo) = self.line_vbo.as_ref()
        {
            rpass.set_pipeline(line_pipeline);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.draw(0..line_verts.len() as u32, 0..1);
        }

        if !arrow_verts.is_empty()
            && let Some(vbo) = self.arrow_vbo.as_ref()
        {
            rpass.set_pipeline(tri_pipeline);
            rpass.set_vertex_buffer(0, vbo.slice(..));
            rpass.draw(0..arrow_verts.len() as u32, 0..1);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format)
            && self.line_pipeline.is_some()
            && self.tri_pipeline.is_some()
        {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("netview link shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/link.wgsl").into()),
        });

        let bind_group_layout = uniform_bgl(ctx.device, "netview link bgl", camera_ubo_size());

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("netview link pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let make_pipeline = |label: &str, topology: wgpu::PrimitiveTopology| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[ColorVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
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
            })
        };

        self.line_pipeline =
            Some(make_pipeline("netview link line pipeline", wgpu::PrimitiveTopology::LineList));
        self.tri_pipeline =
            Some(make_pipeline("netview link arrow pipeline", wgpu::PrimitiveTopology::TriangleList));

        self.pipeline_format = Some(ctx.surface_format);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.camera_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.camera_ubo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let camera_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview link camera ubo"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("netview link bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_ubo.as_entire_binding(),
            }],
        });

        self.camera_ubo = Some(camera_ubo);
        self.bind_group = Some(bind_group);
    }

    fn write_camera_uniform(&mut self, ctx: &RenderCtx<'_>, camera: &Camera) {
        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        ctx.queue
            .write_buffer(ubo, 0, bytemuck::bytes_of(&CameraUniform::from_camera(camera)));
    }

    fn ensure_line_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.line_capacity && self.line_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(128);
        self.line_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview link line vbo"),
            size: (new_cap * std::mem::size_of::<ColorVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.line_capacity = new_cap;
    }

    fn ensure_arrow_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.arrow_capacity && self.arrow_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(128);
        self.arrow_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview link arrow vbo"),
            size: (new_cap * std::mem::size_of::<ColorVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.arrow_capacity = new_cap;
    }
}

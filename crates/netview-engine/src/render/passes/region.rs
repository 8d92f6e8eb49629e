use crate::coords::Rect;
use crate::paint::Color;
use crate::render::common::{
    premul_alpha_blend, uniform_bgl, viewport_ubo_size, ColorVertex, ViewportUniform,
};
use crate::render::{RenderCtx, RenderTarget};

const FILL: Color = Color::from_premul(0.045, 0.09, 0.162, 0.18);
const BORDER: Color = Color::from_premul(0.225, 0.45, 0.81, 0.9);

/// Renderer for the rectangular-selection overlay.
///
/// Screen-space pass: a translucent fill (two triangles) plus a one-pixel
/// border (line list). Drawn last, only while a drag is in progress.
#[derive(Default)]
pub struct RegionPass {
    pipeline_format: Option<wgpu::TextureFormat>,
    fill_pipeline: Option<wgpu::RenderPipeline>,
    line_pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    viewport_ubo: Option<wgpu::Buffer>,

    vbo: Option<wgpu::Buffer>,
}

// 6 fill vertices + 8 border vertices.
const VERTEX_COUNT: usize = 14;

impl RegionPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, rect: Rect) {
        let r = rect.normalized();
        if r.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_bindings(ctx);
        self.write_viewport_uniform(ctx);
        self.write_vertices(ctx, r);

        let Some(fill_pipeline) = self.fill_pipeline.as_ref() else { return };
        let Some(line_pipeline) = self.line_pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(vbo) = self.vbo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("netview region pass"),
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
        rpass.set_vertex_buffer(0, vbo.slice(..));

        rpass.set_pipeline(fill_pipeline);
        rpass.draw(0..6, 0..1);

        rpass.set_pipeline(line_pipeline);
        rpass.draw(6..VERTEX_COUNT as u32, 0..1);
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format)
            && self.fill_pipeline.is_some()
            && self.line_pipeline.is_some()
        {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("netview region shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/region.wgsl").into()),
        });

        let bind_group_layout = uniform_bgl(ctx.device, "netview region bgl", viewport_ubo_size());

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("netview region pipeline layout"),
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

        self.fill_pipeline =
            Some(make_pipeline("netview region fill pipeline", wgpu::PrimitiveTopology::TriangleList));
        self.line_pipeline =
            Some(make_pipeline("netview region border pipeline", wgpu::PrimitiveTopology::LineList));

        self.pipeline_format = Some(ctx.surface_format);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
        self.viewport_ubo = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.viewport_ubo.is_some() && self.vbo.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let viewport_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview region viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("netview region bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        self.viewport_ubo = Some(viewport_ubo);
        self.bind_group = Some(bind_group);

        self.vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("netview region vbo"),
            size: (VERTEX_COUNT * std::mem::size_of::<ColorVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
    }

    fn write_viewport_uniform(&mut self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.viewport_ubo.as_ref() else { return };
        ctx.queue.write_buffer(
            ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                viewport: [ctx.viewport.width.max(1.0), ctx.viewport.height.max(1.0)],
                _pad: [0.0; 2],
            }),
        );
    }

    fn write_vertices(&mut self, ctx: &RenderCtx<'_>, r: Rect) {
        let Some(vbo) = self.vbo.as_ref() else { return };

        let (x0, y0) = (r.origin.x, r.origin.y);
        let (x1, y1) = (r.origin.x + r.size.x, r.origin.y + r.size.y);

        let v = |x: f32, y: f32, c: Color| ColorVertex {
            pos: [x, y],
            color: c.to_array(),
        };

        let verts: [ColorVertex; VERTEX_COUNT] = [
            // fill (two triangles)
            v(x0, y0, FILL),
            v(x1, y0, FILL),
            v(x1, y1, FILL),
            v(x0, y0, FILL),
            v(x1, y1, FILL),
            v(x0, y1, FILL),
            // border (four lines)
            v(x0, y0, BORDER),
            v(x1, y0, BORDER),
            v(x1, y0, BORDER),
            v(x1, y1, BORDER),
            v(x1, y1, BORDER),
            v(x0, y1, BORDER),
            v(x0, y1, BORDER),
            v(x0, y0, BORDER),
        ];

        ctx.queue.write_buffer(vbo, 0, bytemuck::cast_slice(&verts));
    }
}

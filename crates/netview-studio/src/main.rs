//! Netview studio: a small host application driving the engine.
//!
//! Builds a static demo topology, wires window input to the camera,
//! gesture trackers and picker, and feeds the renderer. Everything a real
//! deployment would fetch from a backend (topology, map imagery) is
//! produced inline here.

use std::collections::HashSet;
use std::sync::mpsc;

use netview_engine::camera::Camera;
use netview_engine::coords::{Rect, Viewport};
use netview_engine::core::{App, AppControl, FrameCtx};
use netview_engine::device::GpuInit;
use netview_engine::input::{
    InputEvent, Key, KeyState, MouseButton, MouseButtonState, PanGesture, RectSelect,
};
use netview_engine::logging::{init_logging, LoggingConfig};
use netview_engine::paint::Color;
use netview_engine::pick::{PickResult, Picker};
use netview_engine::render::{IconBitmap, MapImage, RenderCtx, SceneRenderer};
use netview_engine::topology::{NodeKind, Topology};
use netview_engine::window::{CursorIcon, Runtime, RuntimeConfig};

mod topology_demo;

const WORLD_W: f32 = 2000.0;
const WORLD_H: f32 = 1200.0;

const CLEAR: Color = Color::from_premul(0.051, 0.067, 0.09, 1.0);

const ICON_SPRITE_PX: u32 = 48;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let topology = topology_demo::build();
    log::info!(
        "demo topology: {} nodes, {} links, {} locations",
        topology.nodes.len(),
        topology.links.len(),
        topology.locations.len()
    );

    let viewer = Viewer::new(topology);
    Runtime::run(
        RuntimeConfig {
            title: "netview studio".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        viewer,
    )
}

struct Viewer {
    topology: Topology,
    renderer: SceneRenderer,
    camera: Camera,
    picker: Picker,
    pan: PanGesture,
    rect_select: RectSelect,

    map_rx: mpsc::Receiver<MapImage>,
    assets_installed: bool,
    topology_loaded: bool,
    labels_enabled: bool,
    icons_enabled: bool,
    last_canvas: (f32, f32),

    /// Deferred ctrl+click position for the GPU color-id pick.
    gpu_pick_request: Option<(f32, f32)>,
}

impl Viewer {
    fn new(topology: Topology) -> Self {
        // Map imagery decodes off-thread; frames before it arrives draw
        // without a background.
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let image = topology_demo::render_map_image(1024, 640);
            let _ = tx.send(image);
        });

        Self {
            topology,
            renderer: SceneRenderer::new(),
            camera: Camera::new(Viewport::new(1280.0, 800.0), Viewport::new(WORLD_W, WORLD_H)),
            picker: Picker::new(),
            pan: PanGesture::new(),
            rect_select: RectSelect::new(),
            map_rx: rx,
            assets_installed: false,
            topology_loaded: false,
            labels_enabled: true,
            icons_enabled: true,
            last_canvas: (0.0, 0.0),
            gpu_pick_request: None,
        }
    }

    fn handle_event(&mut self, ev: &InputEvent, pointer: Option<(f32, f32)>) {
        match ev {
            InputEvent::MouseWheel { delta, .. } => {
                if let Some((mx, my)) = pointer {
                    let factor = 1.0 + delta.lines_y() * 0.15;
                    self.camera.zoom_to_point(mx, my, factor.clamp(0.5, 2.0));
                    self.picker.invalidate();
                }
            }

            InputEvent::PointerButton(b)
                if b.button == MouseButton::Left && b.state == MouseButtonState::Pressed =>
            {
                if b.modifiers.ctrl {
                    self.gpu_pick_request = Some((b.x, b.y));
                } else if b.modifiers.shift {
                    self.rect_select.begin(b.x, b.y);
                } else {
                    self.click(b.x, b.y);
                }
            }

            InputEvent::PointerButton(b)
                if b.button == MouseButton::Left && b.state == MouseButtonState::Released =>
            {
                self.pan.end();
                if let Some(rect) = self.rect_select.finish() {
                    self.apply_rect_selection(rect);
                }
            }

            InputEvent::PointerMoved(m) => {
                if self.pan.is_panning() {
                    if let Some(delta) = self.pan.update(m.x, m.y) {
                        self.camera.pan(delta.x, delta.y);
                        self.picker.invalidate();
                    }
                } else if self.rect_select.is_active() {
                    self.rect_select.update(m.x, m.y);
                } else {
                    self.hover(m.x, m.y);
                }
            }

            InputEvent::PointerLeft => {
                self.pan.cancel();
                self.rect_select.cancel();
                self.renderer.nodes_mut().set_hovered(None);
                self.renderer.links_mut().set_hovered(None);
            }

            InputEvent::Key { key, state: KeyState::Pressed, repeat: false, .. } => match key {
                Key::Escape => {
                    self.pan.cancel();
                    self.rect_select.cancel();
                    self.renderer.nodes_mut().select(None);
                    self.renderer.links_mut().select(None);
                    self.renderer.reset_highlight();
                }
                Key::R => {
                    self.camera.zoom_to_bounds(Rect::new(0.0, 0.0, WORLD_W, WORLD_H), 40.0);
                    self.picker.invalidate();
                }
                Key::L => {
                    self.labels_enabled = !self.labels_enabled;
                    self.renderer.set_labels_enabled(self.labels_enabled);
                }
                Key::I => {
                    self.icons_enabled = !self.icons_enabled;
                    self.renderer.set_icons_enabled(self.icons_enabled);
                }
                _ => {}
            },

            _ => {}
        }
    }

    fn click(&mut self, x: f32, y: f32) {
        let result = self.picker.pick(
            x,
            y,
            &self.camera,
            self.renderer.nodes(),
            self.renderer.links(),
        );

        match &result {
            PickResult::Node(hit) => {
                log::info!("selected node {} ({:?}) at {:?}", hit.node_id, hit.kind, hit.pos);
                let key = hit.key.clone();
                let node_id = hit.node_id.clone();
                self.renderer.nodes_mut().select(Some(&key));
                self.renderer.links_mut().select(None);
                self.highlight_neighborhood(&node_id);
            }
            PickResult::Link(hit) => {
                log::info!(
                    "selected link {} ({} -> {}, {:?})",
                    hit.key,
                    hit.a_node,
                    hit.z_node,
                    hit.status
                );
                let key = hit.key.clone();
                self.renderer.links_mut().select(Some(&key));
                self.renderer.nodes_mut().select(None);

                let ids: HashSet<String> =
                    [hit.a_node.clone(), hit.z_node.clone()].into_iter().collect();
                self.renderer.highlight_connected(&ids);
            }
            PickResult::None => {
                // Empty space: clear selection and start panning.
                self.renderer.nodes_mut().select(None);
                self.renderer.links_mut().select(None);
                self.renderer.reset_highlight();
                self.pan.begin(x, y);
            }
        }
    }

    fn hover(&mut self, x: f32, y: f32) {
        match self.picker.pick(
            x,
            y,
            &self.camera,
            self.renderer.nodes(),
            self.renderer.links(),
        ) {
            PickResult::Node(hit) => {
                let key = hit.key;
                self.renderer.nodes_mut().set_hovered(Some(&key));
                self.renderer.links_mut().set_hovered(None);
            }
            PickResult::Link(hit) => {
                let key = hit.key;
                self.renderer.links_mut().set_hovered(Some(&key));
                self.renderer.nodes_mut().set_hovered(None);
            }
            PickResult::None => {
                self.renderer.nodes_mut().set_hovered(None);
                self.renderer.links_mut().set_hovered(None);
            }
        }
    }

    /// Highlights a node and everything one link away from it.
    fn highlight_neighborhood(&mut self, node_id: &str) {
        let mut ids: HashSet<String> = HashSet::new();
        ids.insert(node_id.to_string());
        for l in self.renderer.links().links() {
            if l.a_node == node_id || l.z_node == node_id {
                ids.insert(l.a_node.clone());
                ids.insert(l.z_node.clone());
            }
        }
        self.renderer.highlight_connected(&ids);
    }

    /// Converts the screen-space drag rect to world space and highlights
    /// the enclosed nodes.
    fn apply_rect_selection(&mut self, rect: Rect) {
        let a = self.camera.screen_to_world(rect.min().x, rect.min().y);
        let b = self.camera.screen_to_world(rect.max().x, rect.max().y);
        let world = Rect::from_corners(a, b);

        let keys: Vec<String> = self
            .renderer
            .nodes()
            .keys_in_rect(world)
            .into_iter()
            .map(String::from)
            .collect();

        let ids: HashSet<String> = keys
            .iter()
            .filter_map(|k| self.renderer.nodes().get(k))
            .map(|n| n.node_id.clone())
            .collect();

        log::info!("rectangle selection: {} node(s)", ids.len());

        if ids.is_empty() {
            self.renderer.reset_highlight();
        } else {
            self.renderer.highlight_connected(&ids);
        }
    }

    fn cursor(&self) -> CursorIcon {
        if self.pan.is_panning() {
            CursorIcon::Grabbing
        } else if self.rect_select.is_active() {
            CursorIcon::Crosshair
        } else {
            CursorIcon::Default
        }
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        // ── resize detection ───────────────────────────────────────────────
        let (w, h) = ctx.window.logical_size();
        if (w, h) != self.last_canvas && w > 0.0 && h > 0.0 {
            self.camera.set_canvas_size(w, h);
            self.picker.invalidate();
            self.last_canvas = (w, h);
        }

        // ── input ──────────────────────────────────────────────────────────
        let pointer = ctx.input.pointer_pos;
        let events: Vec<InputEvent> = ctx.input_frame.events.clone();
        for ev in &events {
            self.handle_event(ev, pointer);
        }

        // ── camera animation ───────────────────────────────────────────────
        if self.camera.update(ctx.time.dt) {
            self.picker.invalidate();
        }

        // ── one-time and asynchronous asset setup ──────────────────────────
        {
            let rctx = RenderCtx::new(
                ctx.gpu.device(),
                ctx.gpu.queue(),
                ctx.gpu.surface_format(),
                Viewport::new(w, h),
                ctx.window.window.scale_factor() as f32,
            );

            if !self.topology_loaded {
                self.renderer.set_topology(&self.topology);
                self.camera
                    .zoom_to_bounds(Rect::new(0.0, 0.0, WORLD_W, WORLD_H), 40.0);
                self.topology_loaded = true;
            }

            if !self.assets_installed {
                if let Err(e) = install_fonts(&mut self.renderer) {
                    log::warn!("no label font available: {e:#}");
                }
                self.renderer.install_icon_atlas(&rctx, &rasterize_icons());
                self.assets_installed = true;
            }

            // Map image arrives whenever its decode thread finishes.
            if let Ok(image) = self.map_rx.try_recv() {
                log::info!("map image ready ({}x{})", image.width, image.height);
                self.renderer.set_map_image(&rctx, &image);
            }

            // Deferred GPU color-id pick (ctrl+click).
            if let Some((px, py)) = self.gpu_pick_request.take() {
                match self.renderer.pick_gpu(&rctx, &self.camera, px, py) {
                    Some(hit) => {
                        log::info!("gpu pick: node {} at {:?}", hit.node_id, hit.pos);
                        self.renderer.nodes_mut().select(Some(&hit.key));
                        self.highlight_neighborhood(&hit.node_id);
                    }
                    None => log::info!("gpu pick: background"),
                }
            }
        }

        ctx.window.set_cursor(self.cursor());

        // ── draw ───────────────────────────────────────────────────────────
        let camera = &self.camera;
        let renderer = &mut self.renderer;
        let selection = self.rect_select.current_rect();

        ctx.render(CLEAR, |rctx, target| {
            renderer.render(rctx, target, camera, selection);
        })
    }
}

// ── assets ────────────────────────────────────────────────────────────────

fn install_fonts(renderer: &mut SceneRenderer) -> anyhow::Result<()> {
    let bytes = [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok())
    .ok_or_else(|| anyhow::anyhow!("no system font found"))?;

    renderer.load_label_font(&bytes)?;
    Ok(())
}

/// White-on-transparent device glyphs, rasterized with resvg so the icon
/// pass can tint them with the node color.
fn rasterize_icons() -> Vec<IconBitmap> {
    const SPRITES: &[(NodeKind, &str)] = &[
        (NodeKind::Router, topology_demo::SVG_ROUTER),
        (NodeKind::Switch, topology_demo::SVG_SWITCH),
        (NodeKind::Server, topology_demo::SVG_SERVER),
        (NodeKind::Site, topology_demo::SVG_SITE),
        (NodeKind::Unknown, topology_demo::SVG_GENERIC),
    ];

    let mut out = Vec::new();
    for (kind, svg) in SPRITES {
        match rasterize_svg(svg, ICON_SPRITE_PX) {
            Some(rgba) => out.push(IconBitmap {
                kind: *kind,
                width: ICON_SPRITE_PX,
                height: ICON_SPRITE_PX,
                rgba,
            }),
            None => log::warn!("failed to rasterize icon for {kind:?}"),
        }
    }
    out
}

fn rasterize_svg(svg: &str, size: u32) -> Option<Vec<u8>> {
    let tree = resvg::usvg::Tree::from_str(svg, &resvg::usvg::Options::default()).ok()?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)?;

    let view = tree.size();
    let transform = resvg::tiny_skia::Transform::from_scale(
        size as f32 / view.width(),
        size as f32 / view.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Some(pixmap.take())
}

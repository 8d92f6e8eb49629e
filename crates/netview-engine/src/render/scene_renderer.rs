use crate::camera::Camera;
use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::pick::NodeHit;
use crate::render::passes::icons::{IconBitmap, IconPass};
use crate::render::passes::labels::{Label, LabelPass};
use crate::render::passes::links::LinkPass;
use crate::render::passes::map::{MapImage, MapPass};
use crate::render::passes::nodes::NodePass;
use crate::render::passes::pick::PickTarget;
use crate::render::passes::region::RegionPass;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{LinkSet, NodeSet};
use crate::text::{FontId, FontLoadError, FontSystem};
use crate::topology::Topology;

const LABEL_SIZE: f32 = 12.0;
const LABEL_GAP: f32 = 4.0;
/// Labels disappear when zoomed far out; they would overlap into noise.
const LABEL_MIN_ZOOM: f32 = 0.6;
const LABEL_COLOR: Color = Color::from_premul(0.85, 0.88, 0.92, 1.0);

/// Owns the draw passes and the CPU-side scene sets, and orchestrates the
/// per-frame draw order: map background, link lines + arrows, node circles
/// (or icon sprites when an atlas is installed), labels, selection region.
///
/// All GPU resources live inside the passes and are released on drop; the
/// camera is owned by the host and passed by reference.
pub struct SceneRenderer {
    nodes: NodeSet,
    links: LinkSet,

    map: MapPass,
    link_pass: LinkPass,
    node_pass: NodePass,
    icon_pass: IconPass,
    label_pass: LabelPass,
    region_pass: RegionPass,
    pick_target: PickTarget,

    fonts: FontSystem,
    label_font: Option<FontId>,
    labels_enabled: bool,
    icons_enabled: bool,
    label_scratch: Vec<Label>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            nodes: NodeSet::new(),
            links: LinkSet::new(),
            map: MapPass::new(),
            link_pass: LinkPass::new(),
            node_pass: NodePass::new(),
            icon_pass: IconPass::new(),
            label_pass: LabelPass::new(),
            region_pass: RegionPass::new(),
            pick_target: PickTarget::new(),
            fonts: FontSystem::new(),
            label_font: None,
            labels_enabled: true,
            icons_enabled: true,
            label_scratch: Vec::new(),
        }
    }

    // ── scene data ────────────────────────────────────────────────────────

    /// Rebuilds both render sets from a topology snapshot. Nodes without a
    /// resolved location and links without two resolved endpoints are
    /// dropped here.
    pub fn set_topology(&mut self, topology: &Topology) {
        self.nodes.rebuild(topology);
        let positions = self.nodes.positions_by_node_id();
        self.links.rebuild(&topology.links, &positions);

        log::info!(
            "topology loaded: {} nodes, {} links renderable",
            self.nodes.len(),
            self.links.len()
        );
    }

    #[inline]
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    #[inline]
    pub fn nodes_mut(&mut self) -> &mut NodeSet {
        &mut self.nodes
    }

    #[inline]
    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    #[inline]
    pub fn links_mut(&mut self) -> &mut LinkSet {
        &mut self.links
    }

    /// Dims everything not connected to the given domain node ids, across
    /// both sets.
    pub fn highlight_connected(&mut self, node_ids: &std::collections::HashSet<String>) {
        self.nodes.highlight_connected(node_ids);
        self.links.highlight_connected(node_ids);
    }

    /// Restores default opacity across both sets.
    pub fn reset_highlight(&mut self) {
        self.nodes.reset_highlight();
        self.links.reset_highlight();
    }

    // ── assets ────────────────────────────────────────────────────────────

    /// Loads the font used for node labels.
    pub fn load_label_font(&mut self, bytes: &[u8]) -> Result<(), FontLoadError> {
        let id = self.fonts.load_font(bytes)?;
        self.label_font = Some(id);
        Ok(())
    }

    pub fn set_labels_enabled(&mut self, enabled: bool) {
        self.labels_enabled = enabled;
    }

    /// Toggles sprite rendering; with icons off (or no atlas installed)
    /// nodes draw as circles.
    pub fn set_icons_enabled(&mut self, enabled: bool) {
        self.icons_enabled = enabled;
    }

    /// Installs an icon atlas; from then on nodes draw as sprites instead
    /// of circles.
    pub fn install_icon_atlas(&mut self, ctx: &RenderCtx<'_>, sprites: &[IconBitmap]) {
        self.icon_pass.install_atlas(ctx, sprites);
    }

    /// Uploads the (asynchronously decoded) map background image.
    pub fn set_map_image(&mut self, ctx: &RenderCtx<'_>, image: &MapImage) {
        self.map.set_image(ctx, image);
    }

    // ── drawing ───────────────────────────────────────────────────────────

    /// Draws the full scene for one frame. `selection_rect` is the
    /// in-progress rectangle drag overlay in screen space, if any.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        camera: &Camera,
        selection_rect: Option<Rect>,
    ) {
        self.map.render(ctx, target, camera);
        self.link_pass.render(ctx, target, camera, &self.links);

        if self.icons_enabled && self.icon_pass.has_atlas() {
            self.icon_pass.render(ctx, target, camera, &self.nodes);
        } else {
            self.node_pass.render(ctx, target, camera, &self.nodes);
        }

        self.build_labels(ctx, camera);
        if let Some(font) = self.label_font
            && !self.label_scratch.is_empty()
        {
            self.label_pass
                .render(ctx, target, &self.label_scratch, &self.fonts, font);
        }

        if let Some(rect) = selection_rect {
            self.region_pass.render(ctx, target, rect);
        }
    }

    /// GPU color-id pick at a screen position. Best-effort: readback
    /// failures degrade to `None` (the CPU path is the system of record).
    pub fn pick_gpu(
        &mut self,
        ctx: &RenderCtx<'_>,
        camera: &Camera,
        screen_x: f32,
        screen_y: f32,
    ) -> Option<NodeHit> {
        let index = match self
            .pick_target
            .pick_node(ctx, camera, &self.nodes, screen_x, screen_y)
        {
            Ok(index) => index?,
            Err(e) => {
                log::warn!("GPU pick failed: {e:#}");
                return None;
            }
        };

        self.nodes.by_index(index).map(|n| NodeHit {
            key: n.key.clone(),
            node_id: n.node_id.clone(),
            kind: n.kind,
            pos: n.pos,
        })
    }

    // ── private helpers ────────────────────────────────────────────────────

    /// Projects node labels to screen space, culling offscreen ones and
    /// skipping the pass entirely when zoomed out.
    fn build_labels(&mut self, ctx: &RenderCtx<'_>, camera: &Camera) {
        self.label_scratch.clear();

        let Some(font) = self.label_font else { return };
        if !self.labels_enabled || camera.zoom() < LABEL_MIN_ZOOM {
            return;
        }

        let screen = Rect::new(0.0, 0.0, ctx.viewport.width, ctx.viewport.height).expanded(100.0);

        for n in self.nodes.nodes() {
            let anchor = camera.world_to_screen(n.pos.x, n.pos.y);
            if !screen.contains(anchor) {
                continue;
            }

            // Screen-space radius: project a point one radius below center.
            let rim = camera.world_to_screen(n.pos.x, n.pos.y + n.radius);
            let screen_radius = (rim.y - anchor.y).abs();

            let text_size = self.fonts.measure_text(&n.node_id, font, LABEL_SIZE);
            self.label_scratch.push(Label {
                text: n.node_id.clone(),
                pos: Vec2::new(
                    anchor.x - text_size.x * 0.5,
                    anchor.y + screen_radius + LABEL_GAP,
                ),
                size: LABEL_SIZE,
                color: LABEL_COLOR.scaled_alpha(n.color.a),
            });
        }
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

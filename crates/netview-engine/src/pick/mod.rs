//! Screen-coordinate picking.
//!
//! Two independent strategies:
//! - the CPU geometric path ([`Picker`]) — the system of record: camera
//!   unprojection followed by node-circle and link-segment tests;
//! - a GPU color-id path (`render::passes::pick`) — every node is drawn
//!   with a unique color into an offscreen target and the pixel under the
//!   cursor is read back and decoded with [`color_to_index`].
//!
//! The two can disagree at anti-aliased circle edges; callers treat the
//! GPU path as a best-effort refinement.

use crate::camera::Camera;
use crate::coords::Vec2;
use crate::scene::{LinkSet, NodeSet};
use crate::topology::{Direction, LinkStatus, NodeKind};

/// Widened world-space tolerance for link hit tests (links are thin
/// targets compared to node circles).
const LINK_PICK_THRESHOLD: f32 = 6.0;

/// Result of resolving a screen coordinate to a topology entity.
///
/// Owned summaries rather than borrows, so results can be cached and handed
/// to the host without tying up the scene sets.
#[derive(Debug, Clone, PartialEq)]
pub enum PickResult {
    Node(NodeHit),
    Link(LinkHit),
    None,
}

impl PickResult {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, PickResult::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeHit {
    pub key: String,
    pub node_id: String,
    pub kind: NodeKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkHit {
    pub key: String,
    pub a_node: String,
    pub z_node: String,
    pub direction: Direction,
    pub status: LinkStatus,
}

// ── color-id packing ──────────────────────────────────────────────────────

/// Packs a draw index into an RGB color. Index `i` is stored as `i + 1`
/// across the R/G/B bytes (little end first); 0 is reserved for "no hit"
/// (the cleared background).
#[inline]
pub fn index_to_color(index: usize) -> [u8; 3] {
    let v = (index + 1) as u32;
    [(v & 0xff) as u8, ((v >> 8) & 0xff) as u8, ((v >> 16) & 0xff) as u8]
}

/// Inverse of [`index_to_color`]: recovers the draw index, or -1 for the
/// background color.
#[inline]
pub fn color_to_index(r: u8, g: u8, b: u8) -> i64 {
    r as i64 + g as i64 * 256 + b as i64 * 65536 - 1
}

// ── CPU picker ────────────────────────────────────────────────────────────

/// Caching CPU picker.
///
/// The cache holds exactly the last query: repeated move events at the
/// same pixel (common with coalesced pointer streams) return the cached
/// result without re-testing.
#[derive(Debug, Default)]
pub struct Picker {
    last: Option<(f32, f32, PickResult)>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a screen coordinate against nodes first (foreground), then
    /// links with the wider tolerance.
    pub fn pick(
        &mut self,
        screen_x: f32,
        screen_y: f32,
        camera: &Camera,
        nodes: &NodeSet,
        links: &LinkSet,
    ) -> PickResult {
        if let Some((cx, cy, result)) = &self.last
            && *cx == screen_x
            && *cy == screen_y
        {
            return result.clone();
        }

        let world = camera.screen_to_world(screen_x, screen_y);
        let result = Self::pick_world(world, nodes, links);

        self.last = Some((screen_x, screen_y, result.clone()));
        result
    }

    /// Invalidates the cache. Call after the camera moves or the scene
    /// changes under a stationary cursor.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    fn pick_world(world: Vec2, nodes: &NodeSet, links: &LinkSet) -> PickResult {
        if let Some(n) = nodes.find_node_at(world) {
            return PickResult::Node(NodeHit {
                key: n.key.clone(),
                node_id: n.node_id.clone(),
                kind: n.kind,
                pos: n.pos,
            });
        }
        if let Some(l) = links.find_link_at(world, LINK_PICK_THRESHOLD) {
            return PickResult::Link(LinkHit {
                key: l.key.clone(),
                a_node: l.a_node.clone(),
                z_node: l.z_node.clone(),
                direction: l.direction,
                status: l.status,
            });
        }
        PickResult::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::topology::{Location, TopoLink, TopoNode, Topology};

    fn fixture() -> (Camera, NodeSet, LinkSet) {
        // 1:1 world-to-screen mapping: canvas and view both 1000x1000,
        // zoom 1, so screen (x, y) is world (x, y).
        let camera = Camera::new(Viewport::new(1000.0, 1000.0), Viewport::new(1000.0, 1000.0));

        let mut t = Topology::default();
        for (key, x, y) in [("a", 200.0, 500.0), ("z", 800.0, 500.0)] {
            t.locations.insert(
                key.to_string(),
                Location { latitude: 0.0, longitude: 0.0, x, y },
            );
            t.nodes.insert(
                key.to_string(),
                TopoNode {
                    node_id: format!("n-{key}"),
                    location: key.to_string(),
                    kind: NodeKind::Unknown,
                    count: 1,
                },
            );
        }
        t.links.insert(
            "az".to_string(),
            TopoLink {
                aside: "n-a".to_string(),
                zside: "n-z".to_string(),
                direction: Direction::AToZ,
                status: LinkStatus::Up,
            },
        );

        let mut nodes = NodeSet::new();
        nodes.rebuild(&t);
        let mut links = LinkSet::new();
        links.rebuild(&t.links, &nodes.positions_by_node_id());

        (camera, nodes, links)
    }

    #[test]
    fn index_color_round_trip() {
        for i in [0usize, 1, 255, 256, 65535, 65536, 1_000_000] {
            let [r, g, b] = index_to_color(i);
            assert_eq!(color_to_index(r, g, b), i as i64);
        }
    }

    #[test]
    fn background_color_decodes_to_minus_one() {
        assert_eq!(color_to_index(0, 0, 0), -1);
    }

    #[test]
    fn node_wins_over_link_at_a_node_center() {
        let (camera, nodes, links) = fixture();
        let mut picker = Picker::new();

        match picker.pick(200.0, 500.0, &camera, &nodes, &links) {
            PickResult::Node(hit) => assert_eq!(hit.key, "a"),
            other => panic!("expected node, got {other:?}"),
        }
    }

    #[test]
    fn link_midpoint_is_picked() {
        let (camera, nodes, links) = fixture();
        let mut picker = Picker::new();

        match picker.pick(500.0, 500.0, &camera, &nodes, &links) {
            PickResult::Link(hit) => assert_eq!(hit.key, "az"),
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn empty_space_picks_nothing() {
        let (camera, nodes, links) = fixture();
        let mut picker = Picker::new();
        assert!(picker.pick(500.0, 100.0, &camera, &nodes, &links).is_none());
    }

    #[test]
    fn repeated_query_at_same_pixel_uses_the_cache() {
        let (camera, mut nodes, mut links) = fixture();
        let mut picker = Picker::new();

        let first = picker.pick(200.0, 500.0, &camera, &nodes, &links);
        assert!(matches!(first, PickResult::Node(_)));

        // Emptying the scene without invalidating keeps the cached answer
        // for the identical coordinate...
        let empty = Topology::default();
        nodes.rebuild(&empty);
        links.rebuild(&empty.links, &nodes.positions_by_node_id());
        let cached = picker.pick(200.0, 500.0, &camera, &nodes, &links);
        assert_eq!(cached, first);

        // ...and invalidation forces a fresh test.
        picker.invalidate();
        let fresh = picker.pick(200.0, 500.0, &camera, &nodes, &links);
        assert!(fresh.is_none());
    }
}

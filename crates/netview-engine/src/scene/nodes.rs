use std::collections::{HashMap, HashSet};

use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::topology::{NodeKind, Topology};

/// Base radius in world units for a count of 1.
const BASE_RADIUS: f32 = 8.0;
/// Radius gained per doubling of the aggregation count.
const RADIUS_STEP: f32 = 3.0;
const MAX_RADIUS: f32 = 26.0;

/// Extra hit-test slack: clicks within 120% of the radius count as hits.
const HIT_MARGIN: f32 = 1.2;

const DEFAULT_ALPHA: f32 = 0.9;
const DIM_ALPHA: f32 = 0.15;

const NODE_FILL: Color = Color::from_premul(0.22, 0.49, 0.85, 1.0);

/// One renderable node.
///
/// `key` is the stable render identifier (the topology map key); `node_id`
/// is the domain identifier link endpoints refer to. The two may differ.
#[derive(Debug, Clone)]
pub struct RenderNode {
    pub key: String,
    pub node_id: String,
    pub kind: NodeKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Canonical fill color, independent of transient state.
    pub base_color: Color,
    /// Rendered color, recomputed from `base_color` + flags.
    pub color: Color,
    pub selected: bool,
    pub hovered: bool,
    pub dimmed: bool,
}

impl RenderNode {
    fn refresh_color(&mut self) {
        self.color = resolved_color(self.base_color, self.selected, self.hovered, self.dimmed);
    }
}

/// Rendered color from canonical color + state flags (pure).
fn resolved_color(base: Color, selected: bool, hovered: bool, dimmed: bool) -> Color {
    if selected || hovered {
        base
    } else if dimmed {
        base.scaled_alpha(DIM_ALPHA)
    } else {
        base.scaled_alpha(DEFAULT_ALPHA)
    }
}

fn radius_for_count(count: u32) -> f32 {
    (BASE_RADIUS + (count.max(1) as f32).log2() * RADIUS_STEP).min(MAX_RADIUS)
}

/// CPU-side set of visible nodes.
///
/// Entries are sorted by key so iteration (and therefore draw and reverse
/// hit-test order) is deterministic across rebuilds.
#[derive(Debug, Default)]
pub struct NodeSet {
    nodes: Vec<RenderNode>,
    hovered: Option<usize>,
    selected: Option<usize>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the full set from a topology snapshot.
    ///
    /// Nodes whose referenced location is unknown have no world position
    /// and are dropped.
    pub fn rebuild(&mut self, topology: &Topology) {
        self.nodes.clear();
        self.hovered = None;
        self.selected = None;

        let mut dropped = 0usize;
        for (key, node) in &topology.nodes {
            let Some(loc) = topology.locations.get(&node.location) else {
                dropped += 1;
                continue;
            };

            let mut entry = RenderNode {
                key: key.clone(),
                node_id: node.node_id.clone(),
                kind: node.kind,
                pos: Vec2::new(loc.x, loc.y),
                radius: radius_for_count(node.count),
                base_color: NODE_FILL,
                color: NODE_FILL,
                selected: false,
                hovered: false,
                dimmed: false,
            };
            entry.refresh_color();
            self.nodes.push(entry);
        }

        self.nodes.sort_by(|a, b| a.key.cmp(&b.key));

        if dropped > 0 {
            log::debug!("dropped {dropped} node(s) with unresolved locations");
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// Node by draw index, as recovered from a color-id pick.
    pub fn by_index(&self, index: usize) -> Option<&RenderNode> {
        self.nodes.get(index)
    }

    /// World positions keyed by domain node id, for link endpoint
    /// resolution.
    pub fn positions_by_node_id(&self) -> HashMap<String, Vec2> {
        self.nodes
            .iter()
            .map(|n| (n.node_id.clone(), n.pos))
            .collect()
    }

    /// CPU hit test. Iterates in reverse (topmost drawn first) and returns
    /// the first node within 120% of its radius.
    pub fn find_node_at(&self, world: Vec2) -> Option<&RenderNode> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.pos.distance(world) <= n.radius * HIT_MARGIN)
    }

    /// Render keys of all nodes whose center lies in the given world rect.
    pub fn keys_in_rect(&self, rect: Rect) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|n| rect.contains(n.pos))
            .map(|n| n.key.as_str())
            .collect()
    }

    /// Marks at most one node as selected; `None` clears the selection.
    pub fn select(&mut self, key: Option<&str>) {
        if let Some(prev) = self.selected.take() {
            self.nodes[prev].selected = false;
            self.nodes[prev].refresh_color();
        }
        if let Some(key) = key
            && let Some(i) = self.nodes.iter().position(|n| n.key == key)
        {
            self.nodes[i].selected = true;
            self.nodes[i].refresh_color();
            self.selected = Some(i);
        }
    }

    /// Marks at most one node as hovered; `None` clears the hover.
    pub fn set_hovered(&mut self, key: Option<&str>) {
        if let Some(prev) = self.hovered.take() {
            self.nodes[prev].hovered = false;
            self.nodes[prev].refresh_color();
        }
        if let Some(key) = key
            && let Some(i) = self.nodes.iter().position(|n| n.key == key)
        {
            self.nodes[i].hovered = true;
            self.nodes[i].refresh_color();
            self.hovered = Some(i);
        }
    }

    /// Dims every node whose domain id is not in `node_ids`.
    pub fn highlight_connected(&mut self, node_ids: &HashSet<String>) {
        for n in &mut self.nodes {
            n.dimmed = !node_ids.contains(&n.node_id);
            n.refresh_color();
        }
    }

    /// Restores default alpha on all nodes.
    pub fn reset_highlight(&mut self) {
        for n in &mut self.nodes {
            n.dimmed = false;
            n.refresh_color();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Location, TopoNode};

    fn topology(entries: &[(&str, &str, &str, u32)], locations: &[(&str, f32, f32)]) -> Topology {
        let mut t = Topology::default();
        for (key, node_id, location, count) in entries {
            t.nodes.insert(
                key.to_string(),
                TopoNode {
                    node_id: node_id.to_string(),
                    location: location.to_string(),
                    kind: NodeKind::Unknown,
                    count: *count,
                },
            );
        }
        for (name, x, y) in locations {
            t.locations.insert(
                name.to_string(),
                Location { latitude: 0.0, longitude: 0.0, x: *x, y: *y },
            );
        }
        t
    }

    fn set(entries: &[(&str, &str, &str, u32)], locations: &[(&str, f32, f32)]) -> NodeSet {
        let mut s = NodeSet::new();
        s.rebuild(&topology(entries, locations));
        s
    }

    #[test]
    fn radius_grows_with_log2_of_count_and_clamps() {
        assert_eq!(radius_for_count(1), BASE_RADIUS);
        assert_eq!(radius_for_count(0), BASE_RADIUS); // count 0 treated as 1
        assert_eq!(radius_for_count(2), BASE_RADIUS + RADIUS_STEP);
        assert_eq!(radius_for_count(1 << 20), MAX_RADIUS);
    }

    #[test]
    fn nodes_without_resolved_location_are_dropped() {
        let s = set(
            &[("a", "n-a", "paris", 1), ("b", "n-b", "nowhere", 1)],
            &[("paris", 10.0, 20.0)],
        );
        assert_eq!(s.len(), 1);
        assert_eq!(s.nodes()[0].key, "a");
    }

    #[test]
    fn hit_at_center_and_inside_margin() {
        let s = set(&[("a", "n-a", "paris", 1)], &[("paris", 100.0, 100.0)]);
        let r = s.nodes()[0].radius;

        assert!(s.find_node_at(Vec2::new(100.0, 100.0)).is_some());
        assert!(s.find_node_at(Vec2::new(100.0 + r * 1.19, 100.0)).is_some());
    }

    #[test]
    fn miss_beyond_margin() {
        let s = set(&[("a", "n-a", "paris", 1)], &[("paris", 100.0, 100.0)]);
        let r = s.nodes()[0].radius;
        assert!(s.find_node_at(Vec2::new(100.0 + r * 1.25, 100.0)).is_none());
    }

    #[test]
    fn keys_in_rect_uses_node_centers() {
        let s = set(
            &[("a", "n-a", "p", 1), ("b", "n-b", "q", 1)],
            &[("p", 10.0, 10.0), ("q", 500.0, 500.0)],
        );
        let keys = s.keys_in_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn hover_is_single_active() {
        let mut s = set(
            &[("a", "n-a", "p", 1), ("b", "n-b", "q", 1)],
            &[("p", 0.0, 0.0), ("q", 100.0, 0.0)],
        );
        s.set_hovered(Some("a"));
        s.set_hovered(Some("b"));

        assert!(!s.get("a").unwrap().hovered);
        assert!(s.get("b").unwrap().hovered);
    }

    #[test]
    fn highlight_dims_others_and_reset_restores() {
        let mut s = set(
            &[("a", "n-a", "p", 1), ("b", "n-b", "q", 1)],
            &[("p", 0.0, 0.0), ("q", 100.0, 0.0)],
        );
        let default_color = s.get("a").unwrap().color;

        let keep: HashSet<String> = ["n-a".to_string()].into();
        s.highlight_connected(&keep);
        assert_eq!(s.get("a").unwrap().color, default_color);
        assert!(s.get("b").unwrap().color.a < default_color.a);

        s.reset_highlight();
        assert_eq!(s.get("b").unwrap().color, default_color);
    }

    #[test]
    fn selection_survives_highlight_cycles() {
        let mut s = set(
            &[("a", "n-a", "p", 1), ("b", "n-b", "q", 1)],
            &[("p", 0.0, 0.0), ("q", 100.0, 0.0)],
        );
        s.select(Some("a"));
        s.highlight_connected(&HashSet::new());
        s.reset_highlight();
        // Selected node keeps full alpha through dim/restore.
        assert_eq!(s.get("a").unwrap().color, NODE_FILL);
    }
}

use std::collections::{HashMap, HashSet};

use crate::coords::Vec2;
use crate::paint::Color;
use crate::topology::{extract_node_id, Direction, LinkStatus, TopoLink};

const DEFAULT_ALPHA: f32 = 0.75;
const DIM_ALPHA: f32 = 0.12;

/// Arrow heads sit this many world units short of the endpoint they point
/// at, so they stay clear of the node circle.
const ARROW_TIP_OFFSET: f32 = 10.0;
const ARROW_LENGTH: f32 = 8.0;
const ARROW_HALF_WIDTH: f32 = 4.0;

/// One renderable link with both endpoints resolved to world positions.
#[derive(Debug, Clone)]
pub struct RenderLink {
    pub key: String,
    pub a: Vec2,
    pub z: Vec2,
    /// Extracted endpoint node ids (post [`extract_node_id`]).
    pub a_node: String,
    pub z_node: String,
    pub direction: Direction,
    pub status: LinkStatus,
    /// Rendered color; recomputed from the status color + flags.
    pub color: Color,
    pub selected: bool,
    pub hovered: bool,
    pub dimmed: bool,
}

impl RenderLink {
    fn refresh_color(&mut self) {
        let base = self.status.color();
        self.color = if self.selected || self.hovered {
            base
        } else if self.dimmed {
            base.scaled_alpha(DIM_ALPHA)
        } else {
            base.scaled_alpha(DEFAULT_ALPHA)
        };
    }
}

/// CPU-side set of renderable links.
///
/// Invariant: every entry has both endpoints resolved against the node
/// position index; links that fail to resolve are never added.
#[derive(Debug, Default)]
pub struct LinkSet {
    links: Vec<RenderLink>,
    hovered: Option<usize>,
    selected: Option<usize>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the set from topology links and a node-id → world-position
    /// index. Unresolvable links are dropped silently (logged at debug).
    pub fn rebuild(
        &mut self,
        links: &HashMap<String, TopoLink>,
        positions: &HashMap<String, Vec2>,
    ) {
        self.links.clear();
        self.hovered = None;
        self.selected = None;

        let mut dropped = 0usize;
        for (key, link) in links {
            let a_node = extract_node_id(&link.aside);
            let z_node = extract_node_id(&link.zside);

            let (Some(&a), Some(&z)) = (positions.get(a_node), positions.get(z_node)) else {
                dropped += 1;
                continue;
            };

            let mut entry = RenderLink {
                key: key.clone(),
                a,
                z,
                a_node: a_node.to_string(),
                z_node: z_node.to_string(),
                direction: link.direction,
                status: link.status,
                color: Color::transparent(),
                selected: false,
                hovered: false,
                dimmed: false,
            };
            entry.refresh_color();
            self.links.push(entry);
        }

        self.links.sort_by(|a, b| a.key.cmp(&b.key));

        if dropped > 0 {
            log::debug!("dropped {dropped} link(s) with unresolved endpoints");
        }
    }

    #[inline]
    pub fn links(&self) -> &[RenderLink] {
        &self.links
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RenderLink> {
        self.links.iter().find(|l| l.key == key)
    }

    /// CPU hit test: first link (topmost drawn first) whose segment lies
    /// within `threshold` world units of the point.
    pub fn find_link_at(&self, world: Vec2, threshold: f32) -> Option<&RenderLink> {
        self.links
            .iter()
            .rev()
            .find(|l| segment_distance(world, l.a, l.z) <= threshold)
    }

    /// Marks at most one link as selected; `None` clears the selection.
    pub fn select(&mut self, key: Option<&str>) {
        if let Some(prev) = self.selected.take() {
            self.links[prev].selected = false;
            self.links[prev].refresh_color();
        }
        if let Some(key) = key
            && let Some(i) = self.links.iter().position(|l| l.key == key)
        {
            self.links[i].selected = true;
            self.links[i].refresh_color();
            self.selected = Some(i);
        }
    }

    /// Marks at most one link as hovered; `None` clears the hover.
    pub fn set_hovered(&mut self, key: Option<&str>) {
        if let Some(prev) = self.hovered.take() {
            self.links[prev].hovered = false;
            self.links[prev].refresh_color();
        }
        if let Some(key) = key
            && let Some(i) = self.links.iter().position(|l| l.key == key)
        {
            self.links[i].hovered = true;
            self.links[i].refresh_color();
            self.hovered = Some(i);
        }
    }

    /// Keeps full opacity on links touching any of the given node ids;
    /// dims the rest.
    pub fn highlight_connected(&mut self, node_ids: &HashSet<String>) {
        for l in &mut self.links {
            l.dimmed = !(node_ids.contains(&l.a_node) || node_ids.contains(&l.z_node));
            l.refresh_color();
        }
    }

    /// Restores default alpha on all links.
    pub fn reset_highlight(&mut self) {
        for l in &mut self.links {
            l.dimmed = false;
            l.refresh_color();
        }
    }

    // ── geometry builders ─────────────────────────────────────────────────

    /// Appends line-list vertices (two per link) as `x, y, r, g, b, a`.
    pub fn build_line_vertices(&self, out: &mut Vec<[f32; 6]>) {
        for l in &self.links {
            let c = l.color;
            out.push([l.a.x, l.a.y, c.r, c.g, c.b, c.a]);
            out.push([l.z.x, l.z.y, c.r, c.g, c.b, c.a]);
        }
    }

    /// Appends triangle-list vertices for direction arrows, same layout as
    /// the line vertices. Zero-length links produce no arrows.
    pub fn build_arrow_vertices(&self, out: &mut Vec<[f32; 6]>) {
        for l in &self.links {
            let dir = (l.z - l.a).normalized_or_zero();
            if dir == Vec2::zero() {
                continue;
            }
            if l.direction.forward() {
                push_arrow(out, l.z - dir * ARROW_TIP_OFFSET, dir, l.color);
            }
            if l.direction.reverse() {
                push_arrow(out, l.a + dir * ARROW_TIP_OFFSET, -dir, l.color);
            }
        }
    }
}

/// One triangle: tip plus two base corners offset perpendicular to `dir`.
fn push_arrow(out: &mut Vec<[f32; 6]>, tip: Vec2, dir: Vec2, color: Color) {
    let base = tip - dir * ARROW_LENGTH;
    let side = dir.perp() * ARROW_HALF_WIDTH;
    let c = color;
    for p in [tip, base + side, base - side] {
        out.push([p.x, p.y, c.r, c.g, c.b, c.a]);
    }
}

/// Distance from `p` to the segment `a..z` (projection parameter clamped
/// to [0, 1]).
fn segment_distance(p: Vec2, a: Vec2, z: Vec2) -> f32 {
    let ab = z - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(aside: &str, zside: &str, direction: Direction, status: LinkStatus) -> TopoLink {
        TopoLink {
            aside: aside.to_string(),
            zside: zside.to_string(),
            direction,
            status,
        }
    }

    fn two_node_positions() -> HashMap<String, Vec2> {
        [
            ("n-a".to_string(), Vec2::new(0.0, 0.0)),
            ("n-z".to_string(), Vec2::new(100.0, 0.0)),
        ]
        .into()
    }

    fn one_link_set(direction: Direction) -> LinkSet {
        let mut links = HashMap::new();
        links.insert("l1".to_string(), link("n-a", "n-z", direction, LinkStatus::Up));
        let mut s = LinkSet::new();
        s.rebuild(&links, &two_node_positions());
        s
    }

    #[test]
    fn segment_distance_midpoint_and_perpendicular() {
        let a = Vec2::new(0.0, 0.0);
        let z = Vec2::new(100.0, 0.0);
        assert_eq!(segment_distance(Vec2::new(50.0, 0.0), a, z), 0.0);
        assert_eq!(segment_distance(Vec2::new(50.0, 7.0), a, z), 7.0);
        // Beyond the ends the distance is to the clamped endpoint.
        assert_eq!(segment_distance(Vec2::new(-3.0, 4.0), a, z), 5.0);
    }

    #[test]
    fn unresolved_endpoint_drops_the_link() {
        let mut links = HashMap::new();
        links.insert("ok".to_string(), link("n-a", "n-z", Direction::AToZ, LinkStatus::Up));
        links.insert("bad".to_string(), link("n-a", "missing", Direction::AToZ, LinkStatus::Up));

        let mut s = LinkSet::new();
        s.rebuild(&links, &two_node_positions());

        assert_eq!(s.len(), 1);
        assert!(s.get("ok").is_some());
        assert!(s.get("bad").is_none());
    }

    #[test]
    fn structured_references_resolve() {
        let mut links = HashMap::new();
        links.insert(
            "l1".to_string(),
            link("ne:n-a/1/0/3", "n-z/2/1", Direction::AToZ, LinkStatus::Up),
        );
        let mut s = LinkSet::new();
        s.rebuild(&links, &two_node_positions());

        assert_eq!(s.len(), 1);
        assert_eq!(s.links()[0].a_node, "n-a");
        assert_eq!(s.links()[0].z_node, "n-z");
    }

    #[test]
    fn midpoint_is_picked_and_offset_point_is_not() {
        let s = one_link_set(Direction::AToZ);
        assert!(s.find_link_at(Vec2::new(50.0, 0.0), 5.0).is_some());
        assert!(s.find_link_at(Vec2::new(50.0, 50.0), 5.0).is_none());
    }

    #[test]
    fn point_just_past_threshold_is_not_picked() {
        let s = one_link_set(Direction::AToZ);
        assert!(s.find_link_at(Vec2::new(50.0, 6.0), 5.0).is_none());
        assert!(s.find_link_at(Vec2::new(50.0, 5.0), 5.0).is_some());
    }

    #[test]
    fn arrow_counts_follow_direction() {
        for (dir, triangles) in [
            (Direction::Invalid, 0),
            (Direction::AToZ, 1),
            (Direction::ZToA, 1),
            (Direction::Bidirectional, 2),
        ] {
            let s = one_link_set(dir);
            let mut out = Vec::new();
            s.build_arrow_vertices(&mut out);
            assert_eq!(out.len(), triangles * 3, "direction {dir:?}");
        }
    }

    #[test]
    fn forward_arrow_points_at_the_z_side() {
        let s = one_link_set(Direction::AToZ);
        let mut out = Vec::new();
        s.build_arrow_vertices(&mut out);

        // Tip sits ARROW_TIP_OFFSET short of the z endpoint.
        assert_eq!(out[0][0], 100.0 - ARROW_TIP_OFFSET);
        assert_eq!(out[0][1], 0.0);
        // Base corners are behind the tip.
        assert!(out[1][0] < out[0][0] && out[2][0] < out[0][0]);
    }

    #[test]
    fn zero_length_link_emits_no_arrows() {
        let mut positions = HashMap::new();
        positions.insert("n-a".to_string(), Vec2::new(5.0, 5.0));
        positions.insert("n-z".to_string(), Vec2::new(5.0, 5.0));

        let mut links = HashMap::new();
        links.insert(
            "loop".to_string(),
            link("n-a", "n-z", Direction::Bidirectional, LinkStatus::Up),
        );
        let mut s = LinkSet::new();
        s.rebuild(&links, &positions);

        let mut out = Vec::new();
        s.build_arrow_vertices(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn highlight_keeps_touching_links_bright() {
        let mut positions = two_node_positions();
        positions.insert("n-c".to_string(), Vec2::new(0.0, 100.0));

        let mut links = HashMap::new();
        links.insert("az".to_string(), link("n-a", "n-z", Direction::AToZ, LinkStatus::Up));
        links.insert("cz".to_string(), link("n-c", "n-z", Direction::AToZ, LinkStatus::Up));

        let mut s = LinkSet::new();
        s.rebuild(&links, &positions);
        let bright = s.get("az").unwrap().color;

        let keep: HashSet<String> = ["n-a".to_string()].into();
        s.highlight_connected(&keep);
        assert_eq!(s.get("az").unwrap().color, bright);
        assert!(s.get("cz").unwrap().color.a < bright.a);
    }
}

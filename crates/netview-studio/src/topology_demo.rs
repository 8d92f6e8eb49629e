//! Inline demo data: a small national backbone topology and a procedural
//! map background. A real deployment receives both from its data layer.

use netview_engine::render::MapImage;
use netview_engine::topology::{
    Direction, LinkStatus, Location, NodeKind, TopoLink, TopoNode, Topology,
};

/// World extent used by the demo (matches the camera's view size).
const WORLD_W: f32 = 2000.0;
const WORLD_H: f32 = 1200.0;

pub fn build() -> Topology {
    let mut t = Topology::default();

    let locations: &[(&str, f64, f64, f32, f32)] = &[
        ("stockholm", 59.33, 18.07, 1030.0, 180.0),
        ("gothenburg", 57.71, 11.97, 620.0, 420.0),
        ("malmo", 55.60, 13.00, 700.0, 760.0),
        ("sundsvall", 62.39, 17.31, 990.0, 60.0),
        ("linkoping", 58.41, 15.62, 860.0, 400.0),
        ("karlstad", 59.38, 13.50, 720.0, 240.0),
        ("umea", 63.83, 20.26, 1220.0, 30.0),
        ("visby", 57.64, 18.30, 1180.0, 440.0),
    ];
    for (name, lat, lon, x, y) in locations {
        t.locations.insert(
            name.to_string(),
            Location { latitude: *lat, longitude: *lon, x: *x, y: *y },
        );
    }

    let nodes: &[(&str, &str, &str, NodeKind, u32)] = &[
        ("sto-core", "core-sto", "stockholm", NodeKind::Router, 24),
        ("got-core", "core-got", "gothenburg", NodeKind::Router, 12),
        ("mal-core", "core-mal", "malmo", NodeKind::Router, 9),
        ("sun-agg", "agg-sun", "sundsvall", NodeKind::Switch, 4),
        ("lin-agg", "agg-lin", "linkoping", NodeKind::Switch, 6),
        ("kar-agg", "agg-kar", "karlstad", NodeKind::Switch, 3),
        ("ume-edge", "edge-ume", "umea", NodeKind::Server, 2),
        ("vis-site", "site-vis", "visby", NodeKind::Site, 1),
        // References a location the data layer failed to resolve; the
        // renderer drops it rather than crashing.
        ("ghost", "ghost-1", "atlantis", NodeKind::Unknown, 1),
    ];
    for (key, node_id, location, kind, count) in nodes {
        t.nodes.insert(
            key.to_string(),
            TopoNode {
                node_id: node_id.to_string(),
                location: location.to_string(),
                kind: *kind,
                count: *count,
            },
        );
    }

    let links: &[(&str, &str, &str, Direction, LinkStatus)] = &[
        ("sto-got", "ne:core-sto/1/0/1", "ne:core-got/1/0/1", Direction::Bidirectional, LinkStatus::Up),
        ("sto-sun", "core-sto/2/0/1", "agg-sun/1/1/1", Direction::AToZ, LinkStatus::Up),
        ("sun-ume", "agg-sun/1/1/2", "edge-ume/0/0/1", Direction::AToZ, LinkStatus::Partial),
        ("got-mal", "core-got", "core-mal", Direction::Bidirectional, LinkStatus::Up),
        ("sto-lin", "core-sto/3/0/4", "agg-lin/1/0/1", Direction::ZToA, LinkStatus::Up),
        ("lin-mal", "agg-lin", "core-mal", Direction::AToZ, LinkStatus::Down),
        ("sto-kar", "core-sto", "agg-kar", Direction::Invalid, LinkStatus::Invalid),
        ("kar-got", "agg-kar/2/1/1", "core-got/4/0/2", Direction::AToZ, LinkStatus::Up),
        ("sto-vis", "core-sto", "site-vis", Direction::Bidirectional, LinkStatus::Partial),
        // One endpoint never resolves; exercised by the dropped-link path.
        ("sto-nowhere", "core-sto", "missing-node/1/2/3", Direction::AToZ, LinkStatus::Up),
    ];
    for (key, aside, zside, direction, status) in links {
        t.links.insert(
            key.to_string(),
            TopoLink {
                aside: aside.to_string(),
                zside: zside.to_string(),
                direction: *direction,
                status: *status,
            },
        );
    }

    t
}

/// Procedurally "decodes" a map background: dark water, a lighter land
/// band, and a faint graticule. Stands in for the tile imagery a real
/// deployment would fetch and decode off-thread.
pub fn render_map_image(width: u32, height: u32) -> MapImage {
    let mut rgba = vec![0u8; (width * height * 4) as usize];

    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;

            // Normalized world position of this texel.
            let wx = x as f32 / width as f32 * WORLD_W;
            let wy = y as f32 / height as f32 * WORLD_H;

            // A soft diagonal "landmass" band through the node area.
            let band = ((wx * 0.8 + (WORLD_H - wy)) - 900.0).abs();
            let land = (1.0 - band / 700.0).clamp(0.0, 1.0);

            let (mut r, mut g, mut b) = (
                14.0 + land * 14.0,
                20.0 + land * 22.0,
                30.0 + land * 18.0,
            );

            // Graticule every 200 world units.
            if (wx % 200.0) < 2.0 || (wy % 200.0) < 2.0 {
                r += 10.0;
                g += 12.0;
                b += 16.0;
            }

            rgba[idx] = r as u8;
            rgba[idx + 1] = g as u8;
            rgba[idx + 2] = b as u8;
            rgba[idx + 3] = 255;
        }
    }

    MapImage { width, height, rgba }
}

// ── icon sprites ──────────────────────────────────────────────────────────
// White-on-transparent; the icon pass tints them with the node color.

pub const SVG_ROUTER: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 48 48">
  <circle cx="24" cy="24" r="21" fill="none" stroke="#fff" stroke-width="4"/>
  <path d="M14 24h20M24 14v20M17 17l14 14M31 17L17 31" stroke="#fff" stroke-width="3" stroke-linecap="round"/>
</svg>"##;

pub const SVG_SWITCH: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 48 48">
  <rect x="6" y="14" width="36" height="20" rx="4" fill="none" stroke="#fff" stroke-width="4"/>
  <path d="M14 21h12l-4-4M34 27H22l4 4" stroke="#fff" stroke-width="3" stroke-linecap="round" stroke-linejoin="round" fill="none"/>
</svg>"##;

pub const SVG_SERVER: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 48 48">
  <rect x="10" y="8" width="28" height="14" rx="3" fill="none" stroke="#fff" stroke-width="4"/>
  <rect x="10" y="26" width="28" height="14" rx="3" fill="none" stroke="#fff" stroke-width="4"/>
  <circle cx="17" cy="15" r="2" fill="#fff"/>
  <circle cx="17" cy="33" r="2" fill="#fff"/>
</svg>"##;

pub const SVG_SITE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 48 48">
  <path d="M24 6L44 40H4z" fill="none" stroke="#fff" stroke-width="4" stroke-linejoin="round"/>
</svg>"##;

pub const SVG_GENERIC: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 48 48">
  <circle cx="24" cy="24" r="18" fill="#fff"/>
</svg>"##;

//! Topology snapshot types.
//!
//! The host application fetches and resolves topology data; the engine is
//! handed a ready [`Topology`] value. Locations carry pre-computed world
//! positions (no layout is performed here), and links reference nodes by
//! id or by structured endpoint reference (see [`refs`]).

mod refs;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::paint::Color;

pub use refs::extract_node_id;

/// Full topology snapshot, keyed maps as delivered by the data layer.
///
/// Map keys are the stable identifiers used on the render side; a node's
/// `node_id` field is the domain identifier links refer to, and may differ
/// from its map key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: HashMap<String, TopoNode>,
    pub links: HashMap<String, TopoLink>,
    pub locations: HashMap<String, Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoNode {
    pub node_id: String,
    /// Key into [`Topology::locations`].
    pub location: String,
    #[serde(default)]
    pub kind: NodeKind,
    /// Aggregation count (e.g. devices at this site); drives the rendered
    /// radius.
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopoLink {
    /// Endpoint references; either bare node ids or structured references
    /// (see [`extract_node_id`]).
    pub aside: String,
    pub zside: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub status: LinkStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Pre-resolved world position. Supplied by the data layer; the engine
    /// never projects coordinates itself.
    pub x: f32,
    pub y: f32,
}

/// Device class, used to select an icon sprite when an atlas is active.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Router,
    Switch,
    Server,
    Site,
    #[default]
    Unknown,
}

/// Link direction as reported by the data source.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Invalid,
    AToZ,
    ZToA,
    Bidirectional,
}

impl Direction {
    /// Whether an arrow toward the Z side is drawn.
    #[inline]
    pub fn forward(self) -> bool {
        matches!(self, Direction::AToZ | Direction::Bidirectional)
    }

    /// Whether an arrow toward the A side is drawn.
    #[inline]
    pub fn reverse(self) -> bool {
        matches!(self, Direction::ZToA | Direction::Bidirectional)
    }
}

/// Operational status of a link.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Invalid,
    Up,
    Down,
    Partial,
}

impl LinkStatus {
    /// Fixed status color table, shared by link lines and arrow heads.
    pub fn color(self) -> Color {
        match self {
            LinkStatus::Invalid => Color::from_srgb_u8(0x9e, 0x9e, 0x9e, 0xff),
            LinkStatus::Up => Color::from_srgb_u8(0x2e, 0xb8, 0x5c, 0xff),
            LinkStatus::Down => Color::from_srgb_u8(0xe5, 0x39, 0x35, 0xff),
            LinkStatus::Partial => Color::from_srgb_u8(0xf5, 0xa6, 0x23, 0xff),
        }
    }
}

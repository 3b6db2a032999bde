use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::{Direction, EdgePolarity, NodeKind};

/// Top-left corner of a node box, keyed by node id.
pub type Positions = BTreeMap<String, (f32, f32)>;

#[derive(Debug, Clone, Serialize)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub kind: NodeKind,
    pub priority: i32,
    pub band: i32,
    pub zone_id: Option<i64>,
    pub required_level: u32,
    pub completed: bool,
    pub dimmed: bool,
}

impl NodeLayout {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn overlaps(&self, other: &NodeLayout) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub polarity: EdgePolarity,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.max_y - self.min_y).max(0.0)
    }
}

/// Final node positions plus the edges to draw. Replaced wholesale on every
/// layout run.
#[derive(Debug, Clone, Serialize)]
pub struct QuestLayout {
    pub direction: Direction,
    pub solver: String,
    pub nodes: BTreeMap<String, NodeLayout>,
    /// Solver order: priority desc, id asc. Drawing and dumps follow it.
    pub order: Vec<String>,
    /// Builder order: feed order, then gates by ascending level.
    pub feed_order: Vec<String>,
    pub edges: Vec<EdgeLayout>,
    pub bounds: Bounds,
}

impl QuestLayout {
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            solver: String::new(),
            nodes: BTreeMap::new(),
            order: Vec::new(),
            feed_order: Vec::new(),
            edges: Vec::new(),
            bounds: Bounds::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ordered_nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn feed_ordered_nodes(&self) -> impl Iterator<Item = &NodeLayout> {
        self.feed_order.iter().filter_map(|id| self.nodes.get(id))
    }
}

pub(crate) fn bounds_of<'a>(nodes: impl IntoIterator<Item = &'a NodeLayout>) -> Bounds {
    let mut bounds: Option<Bounds> = None;
    for node in nodes {
        let b = bounds.get_or_insert(Bounds {
            min_x: node.x,
            min_y: node.y,
            max_x: node.right(),
            max_y: node.bottom(),
        });
        b.min_x = b.min_x.min(node.x);
        b.min_y = b.min_y.min(node.y);
        b.max_x = b.max_x.max(node.right());
        b.max_y = b.max_y.max(node.bottom());
    }
    bounds.unwrap_or_default()
}

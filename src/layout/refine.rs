use std::collections::{BTreeMap, HashMap, HashSet};

use super::types::Positions;
use crate::classify::band_stacking_order;
use crate::config::LayoutConfig;
use crate::graph::QuestGraph;

/// Read-only view of a classified graph that the refinement passes consume.
#[derive(Debug, Clone)]
pub struct RefineGraph {
    pub node_width: f32,
    pub sibling_step: f32,
    pub band_gap: f32,
    pub overlap_gap: f32,
    heights: HashMap<String, f32>,
    bands: HashMap<String, i32>,
    gates: HashSet<String>,
    /// Alignment children, sorted `(priority asc, id asc)`. Edges touching a
    /// level gate are left out.
    children: HashMap<String, Vec<String>>,
    /// In-degree over `children`, so gate edges never count.
    in_degree: HashMap<String, usize>,
    default_height: f32,
}

impl RefineGraph {
    pub fn new(graph: &QuestGraph, heights: &HashMap<String, f32>, config: &LayoutConfig) -> Self {
        let mut bands = HashMap::with_capacity(graph.nodes.len());
        let mut priorities = HashMap::with_capacity(graph.nodes.len());
        let mut gates = HashSet::new();
        for node in &graph.nodes {
            bands.insert(node.id.clone(), node.display.band);
            priorities.insert(node.id.as_str(), node.display.priority);
            if node.is_level_gate() {
                gates.insert(node.id.clone());
            }
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for edge in &graph.positive_edges {
            if !bands.contains_key(&edge.from) || !bands.contains_key(&edge.to) {
                continue;
            }
            if gates.contains(&edge.from) || gates.contains(&edge.to) {
                continue;
            }
            children
                .entry(edge.from.clone())
                .or_default()
                .push(edge.to.clone());
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| {
                let pa = priorities.get(a.as_str()).copied().unwrap_or(0);
                let pb = priorities.get(b.as_str()).copied().unwrap_or(0);
                pa.cmp(&pb).then_with(|| a.cmp(b))
            });
            list.dedup();
        }
        let mut in_degree: HashMap<String, usize> = HashMap::new();
        for child in children.values().flatten() {
            *in_degree.entry(child.clone()).or_insert(0) += 1;
        }

        Self {
            node_width: config.node_width,
            sibling_step: config.sibling_step,
            band_gap: config.band_gap,
            overlap_gap: config.overlap_gap,
            heights: heights.clone(),
            bands,
            gates,
            children,
            in_degree,
            default_height: config.height.base,
        }
    }

    pub fn height(&self, id: &str) -> f32 {
        self.heights.get(id).copied().unwrap_or(self.default_height)
    }

    pub fn band(&self, id: &str) -> Option<i32> {
        self.bands.get(id).copied()
    }

    fn in_degree(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0)
    }

    fn out_degree(&self, id: &str) -> usize {
        self.children.get(id).map_or(0, Vec::len)
    }

    fn children_in_band(&self, parent: &str, band: i32) -> Vec<&str> {
        self.children
            .get(parent)
            .into_iter()
            .flatten()
            .filter(|child| self.band(child) == Some(band) && !self.gates.contains(*child))
            .map(String::as_str)
            .collect()
    }
}

/// Node ids ordered by `(x asc, id asc)`.
fn x_order<'a>(positions: &'a Positions, keep: impl Fn(&str) -> bool) -> Vec<&'a str> {
    let mut ids: Vec<(&str, f32)> = positions
        .iter()
        .filter(|(id, _)| keep(id.as_str()))
        .map(|(id, (x, _))| (id.as_str(), *x))
        .collect();
    ids.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    ids.into_iter().map(|(id, _)| id).collect()
}

fn align_walk(
    graph: &RefineGraph,
    positions: &mut Positions,
    order: &[&str],
    seen: &mut HashSet<String>,
) {
    for start in order {
        let mut parent = start.to_string();
        // Walk the primary-child spine so it shares one line.
        while seen.insert(parent.clone()) {
            let Some(band) = graph.band(&parent) else {
                break;
            };
            let Some(&(_, parent_y)) = positions.get(&parent) else {
                break;
            };
            let kids = graph.children_in_band(&parent, band);
            if kids.is_empty() {
                break;
            }
            for (idx, child) in kids.iter().enumerate() {
                if let Some(pos) = positions.get_mut(*child) {
                    pos.1 = parent_y + idx as f32 * graph.sibling_step;
                }
            }
            parent = kids[0].to_string();
        }
    }
}

/// Pass 1: each parent's lowest-ranked same-band child takes the parent's y,
/// later siblings stack below it.
pub fn align_primary_children(graph: &RefineGraph, positions: &Positions) -> Positions {
    let mut next = positions.clone();
    let order = x_order(positions, |_| true);
    let mut seen = HashSet::new();
    align_walk(graph, &mut next, &order, &mut seen);
    next
}

/// Pass 2: snaps single-in single-out runs to their head's y while they stay
/// in the head's band.
pub fn straighten_chains(graph: &RefineGraph, positions: &Positions) -> Positions {
    let mut next = positions.clone();
    let mut visited: HashSet<&str> = HashSet::new();
    for head in positions.keys() {
        if graph.in_degree(head) == 1 || graph.out_degree(head) != 1 {
            continue;
        }
        let (Some(band), Some(&(_, head_y))) = (graph.band(head), next.get(head)) else {
            continue;
        };
        let mut current = graph.children.get(head).and_then(|list| list.first());
        while let Some(id) = current {
            if graph.in_degree(id) != 1 || graph.band(id) != Some(band) || !visited.insert(id) {
                break;
            }
            if let Some(pos) = next.get_mut(id) {
                pos.1 = head_y;
            }
            if graph.out_degree(id) != 1 {
                break;
            }
            current = graph.children.get(id).and_then(|list| list.first());
        }
    }
    next
}

/// Pass 3: stacks bands top to bottom in fixed order, re-aligns inside each
/// band and pushes overlapping boxes down until the band is clear.
pub fn restack_bands(graph: &RefineGraph, positions: &Positions) -> Positions {
    let mut next = positions.clone();
    let Some(mut cursor) = positions.values().map(|(_, y)| *y).min_by(f32::total_cmp) else {
        return next;
    };

    let mut members_by_band: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for id in positions.keys() {
        if let Some(band) = graph.band(id) {
            members_by_band.entry(band).or_default().push(id.clone());
        }
    }

    for band in band_stacking_order(members_by_band.keys().copied()) {
        let Some(members) = members_by_band.get(&band) else {
            continue;
        };
        let Some(min_y) = members
            .iter()
            .filter_map(|id| next.get(id).map(|(_, y)| *y))
            .min_by(f32::total_cmp)
        else {
            continue;
        };
        let dy = cursor - min_y;
        for id in members {
            if let Some(pos) = next.get_mut(id) {
                pos.1 += dy;
            }
        }

        let member_set: HashSet<&str> = members.iter().map(String::as_str).collect();
        let snapshot = next.clone();
        let order = x_order(&snapshot, |id| member_set.contains(id));
        let mut seen = HashSet::new();
        align_walk(graph, &mut next, &order, &mut seen);

        resolve_overlaps(graph, &mut next, members);

        let bottom = members
            .iter()
            .filter_map(|id| next.get(id).map(|(_, y)| *y + graph.height(id)))
            .fold(cursor, f32::max);
        tracing::trace!(band, members = members.len(), top = cursor, bottom, "band stacked");
        cursor = bottom + graph.band_gap;
    }
    next
}

fn resolve_overlaps(graph: &RefineGraph, positions: &mut Positions, members: &[String]) {
    if members.len() < 2 {
        return;
    }
    let mut ordered: Vec<(&str, f32, f32)> = members
        .iter()
        .filter_map(|id| positions.get(id).map(|(x, y)| (id.as_str(), *x, *y)))
        .collect();
    ordered.sort_by(|a, b| {
        a.2.total_cmp(&b.2)
            .then_with(|| a.1.total_cmp(&b.1))
            .then_with(|| a.0.cmp(b.0))
    });

    let width = graph.node_width;
    let gap = graph.overlap_gap;
    // (x, top, bottom) of boxes already settled.
    let mut placed: Vec<(f32, f32, f32)> = Vec::with_capacity(ordered.len());
    for (id, x, mut y) in ordered {
        let height = graph.height(id);
        loop {
            let blocker = placed.iter().find(|(px, top, bottom)| {
                x < px + width && *px < x + width && y < bottom + gap && *top < y + height + gap
            });
            match blocker {
                Some((_, _, bottom)) => y = bottom + gap,
                None => break,
            }
        }
        if let Some(pos) = positions.get_mut(id) {
            pos.1 = y;
        }
        placed.push((x, y, y + height));
    }
}

/// Runs the passes in order.
pub fn refine(graph: &RefineGraph, positions: &Positions) -> Positions {
    let aligned = align_primary_children(graph, positions);
    tracing::debug!(nodes = aligned.len(), "aligned primary children");
    let straightened = straighten_chains(graph, &aligned);
    tracing::debug!(nodes = straightened.len(), "straightened chains");
    let stacked = restack_bands(graph, &straightened);
    tracing::debug!(nodes = stacked.len(), "restacked bands");
    stacked
}

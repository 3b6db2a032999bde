mod error;
mod height;
mod ranking;
pub mod refine;
pub mod solver;
pub(crate) mod types;

pub use error::LayoutError;
pub use height::{HeightEstimator, HeuristicHeight, MeasuredHeight, estimator_for};
pub use refine::RefineGraph;
pub use solver::{
    LayeredSolver, RankedSolver, SolverEdge, SolverInput, SolverNode, SolverOutput, solver_for,
};
#[cfg(feature = "dagre")]
pub use solver::DagreSolver;
pub use types::*;

use crate::config::LayoutConfig;
use crate::graph::QuestGraph;
use crate::ir::{Direction, Edge};
use std::collections::{BTreeMap, HashMap};

/// Nodes sorted `(priority desc, id asc)`, the order handed to solvers.
fn solver_nodes(
    graph: &QuestGraph,
    config: &LayoutConfig,
    heights: &HashMap<String, f32>,
) -> Vec<SolverNode> {
    let mut nodes: Vec<SolverNode> = graph
        .nodes
        .iter()
        .map(|node| SolverNode {
            id: node.id.clone(),
            width: config.node_width,
            height: heights.get(&node.id).copied().unwrap_or(config.height.base),
            priority: node.display.priority,
        })
        .collect();
    nodes.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    nodes
}

/// Positive edges sorted by source priority, then by `src->dst` key.
fn solver_edges(graph: &QuestGraph) -> Vec<SolverEdge> {
    let priority: HashMap<&str, i32> = graph
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node.display.priority))
        .collect();
    let mut edges: Vec<&Edge> = graph
        .positive_edges
        .iter()
        .filter(|edge| edge.from != edge.to)
        .filter(|edge| {
            priority.contains_key(edge.from.as_str()) && priority.contains_key(edge.to.as_str())
        })
        .collect();
    edges.sort_by(|a, b| {
        let pa = priority.get(a.from.as_str()).copied().unwrap_or(0);
        let pb = priority.get(b.from.as_str()).copied().unwrap_or(0);
        pb.cmp(&pa).then_with(|| a.key().cmp(&b.key()))
    });
    edges
        .into_iter()
        .map(|edge| SolverEdge {
            from: edge.from.clone(),
            to: edge.to.clone(),
        })
        .collect()
}

/// Exit point on the source box and entry point on the target box.
fn edge_points(direction: Direction, from: &NodeLayout, to: &NodeLayout) -> Vec<(f32, f32)> {
    match direction {
        Direction::LeftRight => vec![
            (from.right(), from.y + from.height / 2.0),
            (to.x, to.y + to.height / 2.0),
        ],
        Direction::TopBottom => vec![
            (from.x + from.width / 2.0, from.bottom()),
            (to.x + to.width / 2.0, to.y),
        ],
    }
}

/// Runs solver and refiner over a classified graph. Takes its own copy of
/// everything it reads, so concurrent runs never share state.
pub fn compute_layout(
    graph: &QuestGraph,
    direction: Direction,
    config: &LayoutConfig,
    solver: &dyn LayeredSolver,
    heights: &dyn HeightEstimator,
) -> Result<QuestLayout, LayoutError> {
    if graph.is_empty() {
        let mut layout = QuestLayout::empty(direction);
        layout.solver = solver.name().to_string();
        return Ok(layout);
    }

    let node_heights: HashMap<String, f32> = graph
        .nodes
        .iter()
        .map(|node| (node.id.clone(), heights.estimate(&node.title, &node.description)))
        .collect();

    let input = SolverInput {
        direction,
        nodes: solver_nodes(graph, config, &node_heights),
        edges: solver_edges(graph),
        node_spacing: config.node_spacing,
        rank_spacing: config.rank_spacing,
        order_passes: config.order_passes,
    };
    let order: Vec<String> = input.nodes.iter().map(|node| node.id.clone()).collect();

    let output = solver.solve(&input)?;
    if output.positions.is_empty() {
        return Err(LayoutError::EmptyOutput {
            backend: solver.name(),
            expected: input.nodes.len(),
        });
    }
    tracing::debug!(
        backend = solver.name(),
        nodes = input.nodes.len(),
        edges = input.edges.len(),
        "solver finished"
    );

    let mut positions: Positions = Positions::new();
    for node in &input.nodes {
        match output.positions.get(&node.id) {
            Some(pos) => {
                positions.insert(node.id.clone(), *pos);
            }
            None => {
                tracing::debug!(id = %node.id, "solver returned no position, using origin");
                positions.insert(node.id.clone(), (0.0, 0.0));
            }
        }
    }

    let refine_graph = RefineGraph::new(graph, &node_heights, config);
    let refined = refine::refine(&refine_graph, &positions);

    let mut nodes: BTreeMap<String, NodeLayout> = BTreeMap::new();
    for node in &graph.nodes {
        let Some(&(x, y)) = refined.get(&node.id) else {
            continue;
        };
        nodes.insert(
            node.id.clone(),
            NodeLayout {
                id: node.id.clone(),
                x,
                y,
                width: config.node_width,
                height: refine_graph.height(&node.id),
                title: node.title.clone(),
                kind: node.kind,
                priority: node.display.priority,
                band: node.display.band,
                zone_id: node.zone_id,
                required_level: node.required_level,
                completed: node.display.completed,
                dimmed: node.display.dimmed,
            },
        );
    }

    let edges: Vec<EdgeLayout> = graph
        .all_edges()
        .filter_map(|edge| {
            let from = nodes.get(&edge.from)?;
            let to = nodes.get(&edge.to)?;
            Some(EdgeLayout {
                from: edge.from.clone(),
                to: edge.to.clone(),
                polarity: edge.polarity,
                points: edge_points(direction, from, to),
            })
        })
        .collect();

    let feed_order: Vec<String> = graph
        .nodes
        .iter()
        .filter(|node| nodes.contains_key(&node.id))
        .map(|node| node.id.clone())
        .collect();
    let bounds = bounds_of(nodes.values());
    Ok(QuestLayout {
        direction,
        solver: solver.name().to_string(),
        nodes,
        order,
        feed_order,
        edges,
        bounds,
    })
}

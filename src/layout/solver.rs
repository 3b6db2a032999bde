use std::collections::{BTreeMap, HashMap};

use super::error::LayoutError;
use super::ranking::{compute_ranks, order_rank_nodes};
use crate::config::{LayoutConfig, SolverKind};
use crate::ir::Direction;

#[derive(Debug, Clone)]
pub struct SolverNode {
    pub id: String,
    pub width: f32,
    pub height: f32,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverEdge {
    pub from: String,
    pub to: String,
}

/// What a layered backend receives. Nodes arrive sorted by
/// `(priority desc, id asc)` and edges by source priority, since backends
/// may be sensitive to input order.
#[derive(Debug, Clone)]
pub struct SolverInput {
    pub direction: Direction,
    pub nodes: Vec<SolverNode>,
    pub edges: Vec<SolverEdge>,
    pub node_spacing: f32,
    pub rank_spacing: f32,
    pub order_passes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SolverOutput {
    /// Top-left corner per node.
    pub positions: BTreeMap<String, (f32, f32)>,
}

/// A directed layered graph-drawing backend. Must break cycles on its own
/// and place deeper nodes further along the flow axis.
pub trait LayeredSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, input: &SolverInput) -> Result<SolverOutput, LayoutError>;
}

pub fn solver_for(config: &LayoutConfig) -> Result<Box<dyn LayeredSolver>, LayoutError> {
    match config.solver {
        SolverKind::Ranked => Ok(Box::new(RankedSolver)),
        #[cfg(feature = "dagre")]
        SolverKind::Dagre => Ok(Box::new(DagreSolver)),
        #[cfg(not(feature = "dagre"))]
        SolverKind::Dagre => Err(LayoutError::Unavailable("dagre")),
    }
}

/// Built-in backend: greedy cycle breaking, longest-path layering, median
/// crossing reduction, then stacked coordinate assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedSolver;

impl LayeredSolver for RankedSolver {
    fn name(&self) -> &'static str {
        "ranked"
    }

    fn solve(&self, input: &SolverInput) -> Result<SolverOutput, LayoutError> {
        if input.nodes.is_empty() {
            return Ok(SolverOutput::default());
        }
        let node_ids: Vec<String> = input.nodes.iter().map(|node| node.id.clone()).collect();
        let node_order: HashMap<String, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        let sizes: HashMap<&str, (f32, f32)> = input
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), (node.width, node.height)))
            .collect();

        let ranks = compute_ranks(&node_ids, &input.edges, &node_order);
        let max_rank = ranks.values().copied().max().unwrap_or(0);
        let mut rank_nodes: Vec<Vec<String>> = vec![Vec::new(); max_rank + 1];
        for id in &node_ids {
            let rank = ranks.get(id).copied().unwrap_or(0);
            rank_nodes[rank].push(id.clone());
        }

        // Only edges between adjacent-or-later ranks inform ordering.
        let forward: Vec<SolverEdge> = input
            .edges
            .iter()
            .filter(|edge| {
                let from = ranks.get(&edge.from).copied().unwrap_or(0);
                let to = ranks.get(&edge.to).copied().unwrap_or(0);
                to > from
            })
            .cloned()
            .collect();
        order_rank_nodes(&mut rank_nodes, &forward, &node_order, input.order_passes);

        let horizontal = input.direction.is_horizontal();
        // Main axis runs along the flow, cross axis stacks a layer.
        let main_extent = |id: &str| {
            let (w, h) = sizes.get(id).copied().unwrap_or((0.0, 0.0));
            if horizontal { w } else { h }
        };
        let cross_extent = |id: &str| {
            let (w, h) = sizes.get(id).copied().unwrap_or((0.0, 0.0));
            if horizontal { h } else { w }
        };

        let mut positions = BTreeMap::new();
        let mut main_cursor = 0.0f32;
        for bucket in &rank_nodes {
            let mut cross_cursor = 0.0f32;
            let mut layer_extent = 0.0f32;
            for id in bucket {
                let (main, cross) = (main_cursor, cross_cursor);
                let pos = if horizontal { (main, cross) } else { (cross, main) };
                positions.insert(id.clone(), pos);
                cross_cursor += cross_extent(id) + input.node_spacing;
                layer_extent = layer_extent.max(main_extent(id));
            }
            main_cursor += layer_extent + input.rank_spacing;
        }

        Ok(SolverOutput { positions })
    }
}

#[cfg(feature = "dagre")]
pub use dagre::DagreSolver;

#[cfg(feature = "dagre")]
mod dagre {
    use std::collections::{BTreeMap, HashSet};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use dagre_rust::{
        GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
        layout as dagre_layout,
    };
    use graphlib_rust::{Graph as DagreGraph, GraphOption};

    use super::{LayeredSolver, SolverInput, SolverOutput};
    use crate::ir::Direction;
    use crate::layout::error::LayoutError;

    /// Backend built on `dagre_rust`. Panics inside dagre are contained and
    /// reported as solver failures.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DagreSolver;

    impl LayeredSolver for DagreSolver {
        fn name(&self) -> &'static str {
            "dagre"
        }

        fn solve(&self, input: &SolverInput) -> Result<SolverOutput, LayoutError> {
            if input.nodes.is_empty() {
                return Ok(SolverOutput::default());
            }
            catch_unwind(AssertUnwindSafe(|| run_dagre(input))).map_err(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "backend panicked".to_string());
                LayoutError::Solver {
                    backend: "dagre",
                    message,
                }
            })
        }
    }

    fn rankdir(direction: Direction) -> &'static str {
        match direction {
            Direction::LeftRight => "lr",
            Direction::TopBottom => "tb",
        }
    }

    fn run_dagre(input: &SolverInput) -> SolverOutput {
        let mut graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some(rankdir(input.direction).to_string());
        graph_config.nodesep = Some(input.node_spacing);
        graph_config.ranksep = Some(input.rank_spacing);
        graph_config.marginx = Some(0.0);
        graph_config.marginy = Some(0.0);
        graph.set_graph(graph_config);

        for (order, node) in input.nodes.iter().enumerate() {
            let mut dagre_node = DagreNode::default();
            dagre_node.width = node.width;
            dagre_node.height = node.height;
            dagre_node.order = Some(order);
            graph.set_node(node.id.clone(), Some(dagre_node));
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for edge in &input.edges {
            if edge.from == edge.to || !seen.insert((edge.from.as_str(), edge.to.as_str())) {
                continue;
            }
            let _ = graph.set_edge(&edge.from, &edge.to, Some(DagreEdge::default()), None);
        }

        dagre_layout::run_layout(&mut graph);

        let mut positions = BTreeMap::new();
        for node in &input.nodes {
            if let Some(placed) = graph.node(&node.id) {
                positions.insert(
                    node.id.clone(),
                    (placed.x - node.width / 2.0, placed.y - node.height / 2.0),
                );
            }
        }
        SolverOutput { positions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(direction: Direction, nodes: &[&str], edges: &[(&str, &str)]) -> SolverInput {
        SolverInput {
            direction,
            nodes: nodes
                .iter()
                .map(|id| SolverNode {
                    id: id.to_string(),
                    width: 240.0,
                    height: 160.0,
                    priority: 0,
                })
                .collect(),
            edges: edges
                .iter()
                .map(|(from, to)| SolverEdge {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
            node_spacing: 140.0,
            rank_spacing: 160.0,
            order_passes: 4,
        }
    }

    #[test]
    fn depth_increases_along_flow_axis() {
        let out = RankedSolver
            .solve(&input(Direction::LeftRight, &["A", "B", "C"], &[("A", "B"), ("B", "C")]))
            .unwrap();
        let (ax, _) = out.positions["A"];
        let (bx, _) = out.positions["B"];
        let (cx, _) = out.positions["C"];
        assert!(ax < bx && bx < cx);
        assert_eq!(bx - ax, 240.0 + 160.0);

        let down = RankedSolver
            .solve(&input(Direction::TopBottom, &["A", "B"], &[("A", "B")]))
            .unwrap();
        assert!(down.positions["A"].1 < down.positions["B"].1);
    }

    #[test]
    fn layer_members_are_stacked_in_input_order() {
        let out = RankedSolver
            .solve(&input(Direction::LeftRight, &["HIGH", "LOW"], &[]))
            .unwrap();
        assert_eq!(out.positions["HIGH"], (0.0, 0.0));
        assert_eq!(out.positions["LOW"], (0.0, 160.0 + 140.0));
    }

    #[test]
    fn cyclic_input_places_every_node() {
        let out = RankedSolver
            .solve(&input(
                Direction::LeftRight,
                &["A", "B", "C"],
                &[("A", "B"), ("B", "C"), ("C", "A")],
            ))
            .unwrap();
        assert_eq!(out.positions.len(), 3);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = RankedSolver.solve(&input(Direction::LeftRight, &[], &[])).unwrap();
        assert!(out.positions.is_empty());
    }

    #[cfg(not(feature = "dagre"))]
    #[test]
    fn dagre_kind_reports_unavailable() {
        let config = LayoutConfig {
            solver: SolverKind::Dagre,
            ..LayoutConfig::default()
        };
        assert!(matches!(solver_for(&config), Err(LayoutError::Unavailable("dagre"))));
    }

    #[cfg(feature = "dagre")]
    #[test]
    fn dagre_places_chain_left_to_right() {
        let out = DagreSolver
            .solve(&input(Direction::LeftRight, &["A", "B"], &[("A", "B")]))
            .unwrap();
        assert!(out.positions["A"].0 < out.positions["B"].0);
    }
}

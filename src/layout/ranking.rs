use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::solver::SolverEdge;

/// Orders each layer with the median heuristic, sweeping down then up.
/// Ties keep their current slot, then fall back to `node_order`, so the
/// incoming priority ordering survives wherever crossings do not decide.
pub(super) fn order_rank_nodes(
    rank_nodes: &mut [Vec<String>],
    edges: &[SolverEdge],
    node_order: &HashMap<String, usize>,
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();

    for edge in edges {
        outgoing
            .entry(edge.from.clone())
            .or_default()
            .push(edge.to.clone());
        incoming
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());
    }

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &mut [Vec<String>],
                            positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes.iter() {
            for (idx, node_id) in bucket.iter().enumerate() {
                positions.insert(node_id.clone(), idx);
            }
        }
    };

    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<String, Vec<String>>,
                       positions: &HashMap<String, usize>| {
        let current_positions: HashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        bucket.sort_by(|a, b| {
            let a_score = median_position(a, neighbors, positions, &current_positions);
            let b_score = median_position(b, neighbors, positions, &current_positions);
            match a_score.partial_cmp(&b_score) {
                Some(std::cmp::Ordering::Equal) | None => {
                    let a_pos = current_positions.get(a).copied().unwrap_or(0);
                    let b_pos = current_positions.get(b).copied().unwrap_or(0);
                    a_pos.cmp(&b_pos).then_with(|| {
                        node_order
                            .get(a)
                            .copied()
                            .unwrap_or(usize::MAX)
                            .cmp(&node_order.get(b).copied().unwrap_or(usize::MAX))
                    })
                }
                Some(ordering) => ordering,
            }
        });
    };

    for _ in 0..passes {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len().saturating_sub(1)).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

pub(super) fn median_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current_positions: &HashMap<String, usize>,
) -> f32 {
    let own = *current_positions.get(node_id).unwrap_or(&0) as f32;
    let Some(list) = neighbors.get(node_id) else {
        return own;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|neighbor| positions.get(neighbor))
        .map(|pos| *pos as f32)
        .collect();
    if values.is_empty() {
        return own;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// Longest-path layering over a greedy topological order. When a cycle
/// blocks progress the remaining node earliest in `node_order` is released
/// and its unprocessed incoming edges count as reversed for ranking only.
pub(super) fn compute_ranks(
    node_ids: &[String],
    edges: &[SolverEdge],
    node_order: &HashMap<String, usize>,
) -> HashMap<String, usize> {
    let set: HashSet<&str> = node_ids.iter().map(|id| id.as_str()).collect();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = set.iter().map(|id| (*id, 0usize)).collect();

    for edge in edges {
        let (from, to) = (edge.from.as_str(), edge.to.as_str());
        if from == to || !set.contains(from) || !set.contains(to) {
            continue;
        }
        adj.entry(from).or_default().push(to);
        if let Some(deg) = indeg.get_mut(to) {
            *deg += 1;
        }
    }

    let order_key = |id: &str| -> usize { node_order.get(id).copied().unwrap_or(usize::MAX) };

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for (id, deg) in &indeg {
        if *deg == 0 {
            ready.push(Reverse((order_key(*id), *id)));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(set.len());
    let mut processed: HashSet<&str> = HashSet::with_capacity(set.len());
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for next in adj.get(id).into_iter().flatten() {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key(*next), *next)));
                    }
                }
            }
        }

        if processed.len() >= set.len() {
            break;
        }

        let best = set
            .iter()
            .filter(|id| !processed.contains(*id))
            .min_by(|a, b| order_key(**a).cmp(&order_key(**b)).then_with(|| a.cmp(b)));
        match best {
            Some(id) => ready.push(Reverse((order_key(*id), *id))),
            None => break,
        }
    }

    let order_index: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (*id, idx))
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::with_capacity(order.len());
    for node in &order {
        let rank = *ranks.entry(node.to_string()).or_insert(0);
        let from_idx = order_index[node];
        for next in adj.get(node).into_iter().flatten() {
            let to_idx = order_index.get(next).copied().unwrap_or(from_idx);
            if to_idx <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn edges(list: &[(&str, &str)]) -> Vec<SolverEdge> {
        list.iter()
            .map(|(from, to)| SolverEdge {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect()
    }

    fn order_of(list: &[String]) -> HashMap<String, usize> {
        list.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect()
    }

    #[test]
    fn ranks_follow_longest_path() {
        let nodes = ids(&["A", "B", "C", "D"]);
        let ranks = compute_ranks(
            &nodes,
            &edges(&[("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")]),
            &order_of(&nodes),
        );
        assert_eq!(ranks["A"], 0);
        assert_eq!(ranks["B"], 1);
        assert_eq!(ranks["C"], 2);
        assert_eq!(ranks["D"], 3);
    }

    #[test]
    fn cycles_are_broken_without_losing_nodes() {
        let nodes = ids(&["A", "B", "C"]);
        let ranks = compute_ranks(
            &nodes,
            &edges(&[("A", "B"), ("B", "C"), ("C", "A")]),
            &order_of(&nodes),
        );
        assert_eq!(ranks.len(), 3);
        assert_eq!(ranks["A"], 0);
        assert_eq!(ranks["B"], 1);
        assert_eq!(ranks["C"], 2);
    }

    #[test]
    fn median_ordering_uncrosses_simple_pair() {
        let order = order_of(&ids(&["A", "B", "X", "Y"]));
        let mut ranks = vec![ids(&["A", "B"]), ids(&["X", "Y"])];
        order_rank_nodes(&mut ranks, &edges(&[("A", "Y"), ("B", "X")]), &order, 2);
        assert_eq!(ranks[1], ids(&["Y", "X"]));
    }
}

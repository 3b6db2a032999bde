use crate::graph::QuestGraph;
use crate::ir::{QuestCategory, QuestNode};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

pub const BAND_MAIN_STORY: i32 = 100;
pub const BAND_FROM_MAIN_STORY: i32 = 95;
pub const BAND_LEVEL_GATE: i32 = 90;
pub const BAND_FROM_LEVEL_GATE: i32 = 89;

/// Fixed top-to-bottom stacking order of bands.
pub const BAND_ORDER: [i32; 13] = [100, 95, 90, 89, 80, 70, 60, 50, 40, 30, 20, 10, 0];

pub const LEVEL_GATE_PRIORITY: i32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeClass {
    pub priority: i32,
    pub band: i32,
}

pub fn category_priority(category: Option<QuestCategory>) -> i32 {
    match category {
        Some(QuestCategory::MainStory) => 10,
        Some(QuestCategory::Objective) => 9,
        Some(QuestCategory::Journey) => 8,
        Some(QuestCategory::SkillProgression) => 6,
        Some(QuestCategory::SeasonQuest) => 5,
        Some(QuestCategory::FactionStory) => 4,
        Some(QuestCategory::MountUnlock) => 3,
        Some(QuestCategory::MountRace) => 2,
        Some(QuestCategory::Event) => 1,
        None => 0,
    }
}

pub fn node_priority(node: &QuestNode) -> i32 {
    if node.is_level_gate() {
        return LEVEL_GATE_PRIORITY;
    }
    category_priority(node.category())
}

fn band_for(node: &QuestNode, priority: i32, from_main: bool, from_level: bool) -> i32 {
    if node.category() == Some(QuestCategory::MainStory) {
        BAND_MAIN_STORY
    } else if from_main {
        BAND_FROM_MAIN_STORY
    } else if node.is_level_gate() {
        BAND_LEVEL_GATE
    } else if from_level {
        BAND_FROM_LEVEL_GATE
    } else if priority > 0 {
        priority * 10 - 20
    } else {
        0
    }
}

/// Bands in stacking order: the fixed order first, then any other band value
/// present, descending.
pub fn band_stacking_order(bands: impl IntoIterator<Item = i32>) -> Vec<i32> {
    let mut extra: Vec<i32> = bands
        .into_iter()
        .filter(|band| !BAND_ORDER.contains(band))
        .collect();
    extra.sort_unstable_by(|a, b| b.cmp(a));
    extra.dedup();
    BAND_ORDER.iter().copied().chain(extra).collect()
}

/// Forward reachability over positive edges. Level gates are never entered,
/// so gate-to-gate chain edges do not carry reachability, while a root gate
/// still reaches its members.
fn reachable_from<'a>(
    roots: impl IntoIterator<Item = &'a str>,
    successors: &HashMap<&'a str, Vec<&'a str>>,
    gates: &HashSet<&'a str>,
) -> HashSet<&'a str> {
    let mut reached: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = roots.into_iter().collect();
    while let Some(current) = queue.pop_front() {
        let Some(nexts) = successors.get(current) else {
            continue;
        };
        for next in nexts {
            if gates.contains(next) || !reached.insert(*next) {
                continue;
            }
            queue.push_back(*next);
        }
    }
    reached
}

/// Computes priority and band for every node. Pure function of the graph.
pub fn classify_graph(graph: &QuestGraph) -> BTreeMap<String, NodeClass> {
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &graph.positive_edges {
        successors
            .entry(edge.from.as_str())
            .or_default()
            .push(edge.to.as_str());
    }
    let gates: HashSet<&str> = graph
        .nodes
        .iter()
        .filter(|node| node.is_level_gate())
        .map(|node| node.id.as_str())
        .collect();

    let main_roots = graph
        .nodes
        .iter()
        .filter(|node| node.category() == Some(QuestCategory::MainStory))
        .map(|node| node.id.as_str());
    let from_main = reachable_from(main_roots, &successors, &gates);
    let from_level = reachable_from(gates.iter().copied(), &successors, &gates);

    graph
        .nodes
        .iter()
        .map(|node| {
            let priority = node_priority(node);
            let id = node.id.as_str();
            let band = band_for(
                node,
                priority,
                from_main.contains(id),
                !node.is_level_gate() && from_level.contains(id),
            );
            (node.id.clone(), NodeClass { priority, band })
        })
        .collect()
}

/// Stamps priority and band onto each node's display attributes.
pub fn classify(graph: &mut QuestGraph) {
    let classes = classify_graph(graph);
    for node in &mut graph.nodes {
        if let Some(class) = classes.get(&node.id) {
            node.display.priority = class.priority;
            node.display.band = class.band;
        }
    }
}

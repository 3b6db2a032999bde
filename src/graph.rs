use crate::feed::ManualOverrides;
use crate::ir::{DisplayAttrs, Edge, NodeKind, Quest, QuestNode, level_gate_id};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneFilter {
    #[default]
    All,
    Zone(i64),
    Unzoned,
}

impl ZoneFilter {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Some(Self::All),
            "unzoned" | "none" | "null" => Some(Self::Unzoned),
            other => other.parse::<i64>().ok().map(Self::Zone),
        }
    }

    pub fn accepts(self, zone_id: Option<i64>) -> bool {
        match self {
            Self::All => true,
            Self::Zone(zone) => zone_id == Some(zone),
            Self::Unzoned => zone_id.is_none_or(|zone| zone < 0),
        }
    }
}

/// Everything besides the quest list that the builder reacts to.
#[derive(Debug, Clone, Default)]
pub struct GraphInputs<'a> {
    pub zone: ZoneFilter,
    pub hide_completed: bool,
    pub completed: Option<&'a HashSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct QuestGraph {
    pub nodes: Vec<QuestNode>,
    pub positive_edges: Vec<Edge>,
    pub negative_edges: Vec<Edge>,
    /// Gate level to member quest ids, ascending by level.
    pub level_gate_groups: BTreeMap<u32, Vec<String>>,
}

impl QuestGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&QuestNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.positive_edges.iter().chain(self.negative_edges.iter())
    }
}

/// Feed value when positive, else the manual override, else zero.
pub fn effective_required_level(quest: &Quest, overrides: &ManualOverrides) -> u32 {
    match quest.required_level {
        Some(level) if level > 0 => u32::try_from(level).unwrap_or(u32::MAX),
        _ => overrides.required_level(&quest.id).unwrap_or(0),
    }
}

/// Builds the typed node and edge sets for one state snapshot. Pure: the same
/// inputs always produce the same graph, and nothing is carried over between
/// calls.
pub fn build_graph(
    quests: &[Quest],
    overrides: &ManualOverrides,
    inputs: &GraphInputs<'_>,
) -> QuestGraph {
    let filtered: Vec<&Quest> = quests
        .iter()
        .filter(|quest| inputs.zone.accepts(quest.zone_id))
        .collect();

    let mut seen_ids: HashSet<&str> = HashSet::with_capacity(filtered.len());
    let mut nodes: Vec<QuestNode> = Vec::with_capacity(filtered.len());
    let mut level_gate_groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();

    for quest in &filtered {
        if !seen_ids.insert(quest.id.as_str()) {
            tracing::debug!(id = %quest.id, "duplicate quest id ignored");
            continue;
        }
        let required_level = effective_required_level(quest, overrides);
        if quest.prerequisites.is_empty() && quest.not_prerequisites.is_empty() && required_level > 0
        {
            level_gate_groups
                .entry(required_level)
                .or_default()
                .push(quest.id.clone());
        }
        let completed = inputs
            .completed
            .is_some_and(|done| done.contains(&quest.id));
        nodes.push(QuestNode {
            id: quest.id.clone(),
            kind: NodeKind::Quest,
            title: quest.title.clone(),
            description: quest.description.clone().unwrap_or_default(),
            quest_type: quest.quest_type.clone().unwrap_or_default(),
            required_level,
            recommended_level: quest
                .recommended_level
                .filter(|level| *level > 0)
                .and_then(|level| u32::try_from(level).ok()),
            zone_id: quest.zone_id,
            prerequisites: quest.prerequisites.clone(),
            not_prerequisites: quest.not_prerequisites.clone(),
            icon: quest.icon.clone(),
            rewards: quest.rewards.clone(),
            repeatable: quest.repeatable,
            display: DisplayAttrs {
                completed,
                dimmed: completed && inputs.hide_completed,
                ..DisplayAttrs::default()
            },
        });
    }

    let ids: HashSet<String> = nodes.iter().map(|node| node.id.clone()).collect();
    let mut positive_edges = Vec::new();
    let mut negative_edges = Vec::new();
    let mut positive_seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut negative_seen: BTreeSet<(String, String)> = BTreeSet::new();

    for node in &nodes {
        for src in &node.prerequisites {
            if src == &node.id || !ids.contains(src) {
                continue;
            }
            if positive_seen.insert((src.clone(), node.id.clone())) {
                positive_edges.push(Edge::positive(src.clone(), node.id.clone()));
            }
        }
        for src in &node.not_prerequisites {
            if src == &node.id || !ids.contains(src) {
                continue;
            }
            if negative_seen.insert((src.clone(), node.id.clone())) {
                negative_edges.push(Edge::negative(src.clone(), node.id.clone()));
            }
        }
    }

    for (level, members) in &level_gate_groups {
        let gate_id = level_gate_id(*level);
        nodes.push(QuestNode::level_gate(*level));
        for member in members {
            positive_edges.push(Edge::positive(gate_id.clone(), member.clone()));
        }
    }

    let levels: Vec<u32> = level_gate_groups.keys().copied().collect();
    for pair in levels.windows(2) {
        positive_edges.push(Edge::positive(level_gate_id(pair[0]), level_gate_id(pair[1])));
    }

    tracing::debug!(
        nodes = nodes.len(),
        positive = positive_edges.len(),
        negative = negative_edges.len(),
        gates = level_gate_groups.len(),
        "built quest graph"
    );

    QuestGraph {
        nodes,
        positive_edges,
        negative_edges,
        level_gate_groups,
    }
}

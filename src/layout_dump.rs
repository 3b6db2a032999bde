use crate::ir::{EdgePolarity, NodeKind};
use crate::layout::QuestLayout;
use crate::zones::zone_by_id_prefix;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub direction: String,
    pub solver: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub title: String,
    pub level_gate: Option<u32>,
    pub zone: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub priority: i32,
    pub band: i32,
    pub completed: bool,
    pub dimmed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub negative: bool,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &QuestLayout) -> Self {
        let nodes = layout
            .ordered_nodes()
            .map(|node| NodeDump {
                id: node.id.clone(),
                title: node.title.clone(),
                level_gate: match node.kind {
                    NodeKind::LevelGate { level } => Some(level),
                    NodeKind::Quest => None,
                },
                zone: zone_by_id_prefix(&node.id).name.to_string(),
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                priority: node.priority,
                band: node.band,
                completed: node.completed,
                dimmed: node.dimmed,
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                negative: edge.polarity == EdgePolarity::Negative,
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        LayoutDump {
            direction: layout.direction.token().to_string(),
            solver: layout.solver.clone(),
            width: layout.bounds.width(),
            height: layout.bounds.height(),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &QuestLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::config::LayoutConfig;
    use crate::feed::ManualOverrides;
    use crate::graph::{GraphInputs, build_graph};
    use crate::ir::{Direction, Quest};
    use crate::layout::{HeuristicHeight, RankedSolver, compute_layout};

    #[test]
    fn dump_lists_nodes_in_layout_order() {
        let quests = vec![
            Quest {
                id: "A".to_string(),
                title: "Alpha".to_string(),
                required_level: Some(3),
                ..Quest::default()
            },
            Quest {
                id: "B".to_string(),
                title: "Beta".to_string(),
                quest_type: Some("Main Story".to_string()),
                ..Quest::default()
            },
        ];
        let mut graph = build_graph(&quests, &ManualOverrides::default(), &GraphInputs::default());
        classify(&mut graph);
        let layout = compute_layout(
            &graph,
            Direction::TopBottom,
            &LayoutConfig::default(),
            &RankedSolver,
            &HeuristicHeight::default(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        write_layout_dump(&path, &layout).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["direction"], "TB");
        assert_eq!(value["nodes"][0]["id"], "B");
        assert_eq!(value["nodes"][1]["levelGate"], 3);
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(1));
    }
}

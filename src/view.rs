use tokio::sync::mpsc;
use uuid::Uuid;

use crate::graph::ZoneFilter;
use crate::ir::Direction;
use crate::layout::{Bounds, NodeLayout, QuestLayout};

pub const FOCUS_PADDING: f32 = 0.2;
pub const FOCUS_MIN_ZOOM: f32 = 0.5;
pub const FOCUS_MAX_ZOOM: f32 = 1.5;
pub const RESET_MARGIN: f32 = 40.0;

/// Screen transform: `screen = world * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, point: (f32, f32)) -> (f32, f32) {
        (point.0 * self.zoom + self.x, point.1 * self.zoom + self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    SetDirection(Direction),
    ToggleDirection,
    SetZone(ZoneFilter),
    SetHideCompleted(bool),
    Focus(String),
    ResetViewport,
    ToggleQuest(String),
    SetActiveCharacter(Uuid),
}

/// What applying a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    Unchanged,
    ViewportMoved,
    Relayout { generation: u64 },
}

/// Fire-and-forget focus request from a search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusCommand {
    pub query: String,
}

pub type FocusSender = mpsc::UnboundedSender<FocusCommand>;
pub type FocusReceiver = mpsc::UnboundedReceiver<FocusCommand>;

pub fn focus_channel() -> (FocusSender, FocusReceiver) {
    mpsc::unbounded_channel()
}

/// Exact id match first (case-insensitive), then the first node in feed
/// order whose id or title contains the query.
pub fn resolve_focus(layout: &QuestLayout, query: &str) -> Option<String> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(node) = layout
        .feed_ordered_nodes()
        .find(|node| node.id.to_lowercase() == needle)
    {
        return Some(node.id.clone());
    }
    layout
        .feed_ordered_nodes()
        .find(|node| {
            node.id.to_lowercase().contains(&needle) || node.title.to_lowercase().contains(&needle)
        })
        .map(|node| node.id.clone())
}

/// Centres `node` on screen with some padding around it.
pub fn fit_node(node: &NodeLayout, screen: (f32, f32)) -> Viewport {
    let padded_w = (node.width * (1.0 + FOCUS_PADDING)).max(1.0);
    let padded_h = (node.height * (1.0 + FOCUS_PADDING)).max(1.0);
    let zoom = (screen.0 / padded_w)
        .min(screen.1 / padded_h)
        .clamp(FOCUS_MIN_ZOOM, FOCUS_MAX_ZOOM);
    let (cx, cy) = node.center();
    Viewport {
        x: screen.0 / 2.0 - cx * zoom,
        y: screen.1 / 2.0 - cy * zoom,
        zoom,
    }
}

/// Puts the layout's top-left corner at the screen origin plus a margin.
pub fn reset_to_top_left(bounds: &Bounds) -> Viewport {
    Viewport {
        x: RESET_MARGIN - bounds.min_x,
        y: RESET_MARGIN - bounds.min_y,
        zoom: 1.0,
    }
}

/// Inputs the pipeline reads plus the viewport. Setters report whether the
/// value actually changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub direction: Direction,
    pub zone: ZoneFilter,
    pub hide_completed: bool,
    pub viewport: Viewport,
    pub focused: Option<String>,
    pub screen: (f32, f32),
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            zone: ZoneFilter::All,
            hide_completed: false,
            viewport: Viewport::default(),
            focused: None,
            screen: (1600.0, 1000.0),
        }
    }
}

impl ViewState {
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        let changed = self.direction != direction;
        self.direction = direction;
        changed
    }

    pub fn set_zone(&mut self, zone: ZoneFilter) -> bool {
        let changed = self.zone != zone;
        self.zone = zone;
        changed
    }

    pub fn set_hide_completed(&mut self, hide: bool) -> bool {
        let changed = self.hide_completed != hide;
        self.hide_completed = hide;
        changed
    }

    /// Moves the viewport onto the node matching `query`. No match leaves the
    /// view untouched.
    pub fn focus(&mut self, layout: &QuestLayout, query: &str) -> bool {
        let Some(id) = resolve_focus(layout, query) else {
            tracing::debug!(query, "focus query matched nothing");
            return false;
        };
        let Some(node) = layout.nodes.get(&id) else {
            return false;
        };
        self.viewport = fit_node(node, self.screen);
        self.focused = Some(id);
        true
    }

    pub fn reset_viewport(&mut self, layout: &QuestLayout) -> bool {
        let next = reset_to_top_left(&layout.bounds);
        let changed = next != self.viewport;
        self.viewport = next;
        self.focused = None;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::NodeKind;
    use std::collections::BTreeMap;

    fn node(id: &str, title: &str, x: f32, y: f32) -> NodeLayout {
        NodeLayout {
            id: id.to_string(),
            x,
            y,
            width: 240.0,
            height: 160.0,
            title: title.to_string(),
            kind: NodeKind::Quest,
            priority: 0,
            band: 0,
            zone_id: None,
            required_level: 0,
            completed: false,
            dimmed: false,
        }
    }

    fn layout(nodes: Vec<NodeLayout>) -> QuestLayout {
        let order: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let map: BTreeMap<String, NodeLayout> =
            nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        let bounds = crate::layout::bounds_of(map.values());
        QuestLayout {
            direction: Direction::LeftRight,
            solver: "test".to_string(),
            nodes: map,
            feed_order: order.clone(),
            order,
            edges: Vec::new(),
            bounds,
        }
    }

    fn sword_and_shield() -> QuestLayout {
        layout(vec![
            node("Q1", "Find the Sword", 0.0, 0.0),
            node("Q2", "Find the Shield", 400.0, 0.0),
        ])
    }

    #[test]
    fn focus_matches_title_substring() {
        assert_eq!(resolve_focus(&sword_and_shield(), "sword").as_deref(), Some("Q1"));
    }

    #[test]
    fn focus_prefers_exact_id_case_insensitive() {
        let layout = layout(vec![
            node("Q2X", "Q2 prelude", 0.0, 0.0),
            node("Q2", "Find the Shield", 400.0, 0.0),
        ]);
        assert_eq!(resolve_focus(&layout, "q2").as_deref(), Some("Q2"));
        assert_eq!(resolve_focus(&sword_and_shield(), "q2").as_deref(), Some("Q2"));
    }

    #[test]
    fn substring_focus_follows_feed_order_not_priority() {
        use crate::classify::classify;
        use crate::config::LayoutConfig;
        use crate::feed::ManualOverrides;
        use crate::graph::{GraphInputs, build_graph};
        use crate::ir::Quest;
        use crate::layout::{HeuristicHeight, RankedSolver, compute_layout};

        let quests = vec![
            Quest {
                id: "Q10".to_string(),
                title: "Find the Sword".to_string(),
                quest_type: Some("Side".to_string()),
                ..Quest::default()
            },
            Quest {
                id: "Q20".to_string(),
                title: "Sword of Kings".to_string(),
                quest_type: Some("Main Story".to_string()),
                ..Quest::default()
            },
        ];
        let mut graph = build_graph(&quests, &ManualOverrides::default(), &GraphInputs::default());
        classify(&mut graph);
        let layout = compute_layout(
            &graph,
            Direction::LeftRight,
            &LayoutConfig::default(),
            &RankedSolver,
            &HeuristicHeight::default(),
        )
        .unwrap();
        assert_eq!(layout.order.first().map(String::as_str), Some("Q20"));
        assert_eq!(layout.feed_order, vec!["Q10".to_string(), "Q20".to_string()]);
        assert_eq!(resolve_focus(&layout, "sword").as_deref(), Some("Q10"));
        assert_eq!(resolve_focus(&layout, "q20").as_deref(), Some("Q20"));
    }

    #[test]
    fn unmatched_focus_leaves_view_unchanged() {
        let layout = sword_and_shield();
        let mut view = ViewState::default();
        let before = view.clone();
        assert!(!view.focus(&layout, "nonexistent"));
        assert!(!view.focus(&layout, "   "));
        assert_eq!(view, before);
    }

    #[test]
    fn focus_centres_node_with_clamped_zoom() {
        let layout = sword_and_shield();
        let mut view = ViewState::default();
        assert!(view.focus(&layout, "shield"));
        assert_eq!(view.focused.as_deref(), Some("Q2"));
        assert_eq!(view.viewport.zoom, FOCUS_MAX_ZOOM);
        let centre = view.viewport.to_screen(layout.nodes["Q2"].center());
        assert!((centre.0 - 800.0).abs() < 1e-3);
        assert!((centre.1 - 500.0).abs() < 1e-3);

        let tiny = fit_node(&layout.nodes["Q1"], (100.0, 100.0));
        assert_eq!(tiny.zoom, FOCUS_MIN_ZOOM);
    }

    #[test]
    fn reset_puts_top_left_at_margin() {
        let bounds = Bounds {
            min_x: -100.0,
            min_y: 250.0,
            max_x: 800.0,
            max_y: 900.0,
        };
        let viewport = reset_to_top_left(&bounds);
        assert_eq!(viewport.to_screen((-100.0, 250.0)), (40.0, 40.0));
        assert_eq!(viewport.zoom, 1.0);
    }

    #[tokio::test]
    async fn focus_channel_delivers_in_order() {
        let (tx, mut rx) = focus_channel();
        tx.send(FocusCommand { query: "sword".into() }).unwrap();
        tx.send(FocusCommand { query: "q2".into() }).unwrap();
        drop(tx);
        assert_eq!(rx.recv().await.unwrap().query, "sword");
        assert_eq!(rx.recv().await.unwrap().query, "q2");
        assert!(rx.recv().await.is_none());
    }
}

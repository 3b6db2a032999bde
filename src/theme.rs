use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub node_fill: String,
    pub node_text_color: String,
    pub node_muted_text_color: String,
    pub gate_fill: String,
    pub gate_border: String,
    pub positive_edge_color: String,
    pub negative_edge_color: String,
    pub dimmed_opacity: f32,
}

impl Theme {
    pub fn night() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#0b0f14".to_string(),
            node_fill: "#111827".to_string(),
            node_text_color: "#e5e7eb".to_string(),
            node_muted_text_color: "#94a3b8".to_string(),
            gate_fill: "#1e293b".to_string(),
            gate_border: "#e2e8f0".to_string(),
            positive_edge_color: "#ffffff".to_string(),
            negative_edge_color: "#f87171".to_string(),
            dimmed_opacity: 0.35,
        }
    }

    pub fn paper() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#ffffff".to_string(),
            node_fill: "#f8faff".to_string(),
            node_text_color: "#1c2430".to_string(),
            node_muted_text_color: "#5b6576".to_string(),
            gate_fill: "#eef2f8".to_string(),
            gate_border: "#334155".to_string(),
            positive_edge_color: "#7a8aa6".to_string(),
            negative_edge_color: "#dc2626".to_string(),
            dimmed_opacity: 0.35,
        }
    }
}

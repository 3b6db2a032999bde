use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Ranked,
    Dagre,
}

impl SolverKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "ranked" | "rank" => Some(Self::Ranked),
            "dagre" => Some(Self::Dagre),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightConfig {
    pub base: f32,
    pub max: f32,
    pub line_height: f32,
    pub title_free_chars: usize,
    pub title_char_height: f32,
    pub description_chars_per_line: usize,
    pub font_family: String,
    pub font_size: f32,
    pub text_padding_x: f32,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            base: 160.0,
            max: 360.0,
            line_height: 16.0,
            title_free_chars: 28,
            title_char_height: 0.6,
            description_chars_per_line: 90,
            font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            font_size: 12.0,
            text_padding_x: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    /// Gap between consecutive layers (columns in LR).
    pub rank_spacing: f32,
    /// Gap between nodes inside one layer.
    pub node_spacing: f32,
    pub order_passes: usize,
    pub sibling_step: f32,
    pub band_gap: f32,
    pub overlap_gap: f32,
    pub solver: SolverKind,
    pub measured_heights: bool,
    pub height: HeightConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            rank_spacing: 160.0,
            node_spacing: 140.0,
            order_passes: 4,
            sibling_step: 180.0,
            band_gap: 100.0,
            overlap_gap: 20.0,
            solver: SolverKind::Ranked,
            measured_heights: false,
            height: HeightConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1600.0,
            height: 1000.0,
            padding: 40.0,
            background: "#0b0f14".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::night();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    node_fill: Option<String>,
    node_text_color: Option<String>,
    gate_fill: Option<String>,
    positive_edge_color: Option<String>,
    negative_edge_color: Option<String>,
    dimmed_opacity: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    rank_spacing: Option<f32>,
    node_spacing: Option<f32>,
    order_passes: Option<usize>,
    sibling_step: Option<f32>,
    band_gap: Option<f32>,
    overlap_gap: Option<f32>,
    solver: Option<SolverKind>,
    measured_heights: Option<bool>,
    min_node_height: Option<f32>,
    max_node_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "night" | "dark" | "default" => config.theme = Theme::night(),
            "paper" | "light" => config.theme = Theme::paper(),
            other => tracing::warn!(theme = other, "unknown theme, keeping default"),
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v.clone();
            config.render.background = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_text_color {
            config.theme.node_text_color = v;
        }
        if let Some(v) = vars.gate_fill {
            config.theme.gate_fill = v;
        }
        if let Some(v) = vars.positive_edge_color {
            config.theme.positive_edge_color = v;
        }
        if let Some(v) = vars.negative_edge_color {
            config.theme.negative_edge_color = v;
        }
        if let Some(v) = vars.dimmed_opacity {
            config.theme.dimmed_opacity = v.clamp(0.0, 1.0);
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.node_width {
            target.node_width = v.max(1.0);
        }
        if let Some(v) = layout.rank_spacing {
            target.rank_spacing = v.max(0.0);
        }
        if let Some(v) = layout.node_spacing {
            target.node_spacing = v.max(0.0);
        }
        if let Some(v) = layout.order_passes {
            target.order_passes = v;
        }
        if let Some(v) = layout.sibling_step {
            target.sibling_step = v.max(0.0);
        }
        if let Some(v) = layout.band_gap {
            target.band_gap = v.max(0.0);
        }
        if let Some(v) = layout.overlap_gap {
            target.overlap_gap = v.max(0.0);
        }
        if let Some(v) = layout.solver {
            target.solver = v;
        }
        if let Some(v) = layout.measured_heights {
            target.measured_heights = v;
        }
        if let Some(v) = layout.min_node_height {
            target.height.base = v.max(1.0);
        }
        if let Some(v) = layout.max_node_height {
            target.height.max = v;
        }
        if target.height.max < target.height.base {
            target.height.max = target.height.base;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v.max(0.0);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlays_present_fields_only() {
        let config = parse_config(
            r##"{
                "theme": "paper",
                "themeVariables": { "negativeEdgeColor": "#ff0000", "dimmedOpacity": 4.0 },
                "layout": { "bandGap": 60, "solver": "dagre", "minNodeHeight": 400 }
            }"##,
        )
        .unwrap();
        assert_eq!(config.theme.background, Theme::paper().background);
        assert_eq!(config.theme.negative_edge_color, "#ff0000");
        assert_eq!(config.theme.dimmed_opacity, 1.0);
        assert_eq!(config.layout.band_gap, 60.0);
        assert_eq!(config.layout.sibling_step, 180.0);
        assert_eq!(config.layout.solver, SolverKind::Dagre);
        assert_eq!(config.layout.height.max, 400.0);
    }

    #[test]
    fn missing_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.node_width, 240.0);
        assert_eq!(config.render.background, config.theme.background);
    }
}
